#![warn(missing_docs)]
//! Deterministic testing surfaces (mirror server, wall fixtures, telemetry sink).

pub mod fixtures;
mod mirror;

use anyhow::{Context, Result};
use arena_core::Tick;
use arena_net::PredictionDebug;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use mirror::MirrorServer;

/// Per-tick prediction record captured by headless runs.
#[derive(Debug, Serialize)]
pub struct TelemetryRecord<'a> {
    /// Client tick the record was taken at.
    pub tick: Tick,
    /// Event label (`tick`, or a reconcile outcome label).
    pub kind: &'a str,
    /// Engine state after the event.
    pub prediction: PredictionDebug,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self { file })
    }

    /// Append a record to the log.
    pub fn write(&mut self, record: &TelemetryRecord<'_>) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }

    /// Flush buffered records.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}
