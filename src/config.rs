use anyhow::{Context, Result};
use arena_core::{Vec2, ENTITY_RADIUS};
use arena_net::PredictionConfig;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/arena.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ArenaConfig {
    pub prediction: PredictionConfig,
    pub walls: WallsConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WallsConfig {
    /// Coarse-box expansion applied when building wall snapshots.
    pub entity_radius: f32,
}

impl Default for WallsConfig {
    fn default() -> Self {
        Self {
            entity_radius: ENTITY_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed ticks to run.
    pub ticks: u64,
    /// Ticks between the server receiving an input and applying it.
    pub latency_ticks: u64,
    /// Deliver only every Nth server snapshot to the client.
    pub snapshot_every: u64,
    /// Player spawn point.
    pub spawn: Vec2,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 600,
            latency_ticks: 6,
            snapshot_every: 1,
            spawn: Vec2::new(200.0, 200.0),
        }
    }
}

impl ArenaConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ArenaConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    ArenaConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Arena config not found at {}. Using defaults", path.display());
                }
                ArenaConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self).context("Failed to serialize arena config")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}
