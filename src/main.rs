//! arena - headless harness for client-side prediction in a top-down shooter
//!
//! Drives a scripted client session against an in-process authoritative
//! server with simulated latency and destructible walls.

mod config;
mod headless;
mod scripted_input;

use anyhow::Result;
use config::ArenaConfig;
use headless::HeadlessConfig;
use std::{env, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting arena v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    let mut arena = match &cli.config {
        Some(path) => ArenaConfig::load_from_path(path),
        None => ArenaConfig::load(),
    };
    if let Some(ticks) = cli.ticks {
        arena.simulation.ticks = ticks;
    }
    if let Some(latency) = cli.latency {
        arena.simulation.latency_ticks = latency;
    }

    if let Some(path) = &cli.write_config {
        arena.save_to_path(path)?;
        info!("Wrote effective config to {}", path.display());
        return Ok(());
    }

    headless::run(HeadlessConfig {
        arena,
        scripted_input: cli.scripted_input,
        telemetry: cli.telemetry,
        destroy_at: cli.destroy_at,
    })?;
    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    scripted_input: Option<PathBuf>,
    telemetry: Option<PathBuf>,
    write_config: Option<PathBuf>,
    ticks: Option<u64>,
    latency: Option<u64>,
    destroy_at: Option<u64>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => opts.config = next_path(&mut args, "--config"),
                "--script" => opts.scripted_input = next_path(&mut args, "--script"),
                "--telemetry" => opts.telemetry = next_path(&mut args, "--telemetry"),
                "--write-config" => opts.write_config = next_path(&mut args, "--write-config"),
                "--ticks" => opts.ticks = next_u64(&mut args, "--ticks"),
                "--latency" => opts.latency = next_u64(&mut args, "--latency"),
                "--destroy-at" => opts.destroy_at = next_u64(&mut args, "--destroy-at"),
                other => tracing::warn!("Ignoring unknown argument {other}"),
            }
        }

        opts
    }
}

fn next_path<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Option<PathBuf> {
    let path = args.next().map(PathBuf::from);
    if path.is_none() {
        tracing::error!("{flag} requires a path");
    }
    path
}

fn next_u64<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Option<u64> {
    let Some(raw) = args.next() else {
        tracing::error!("{flag} requires an integer");
        return None;
    };
    match raw.parse::<u64>() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(%err, value = %raw, "{flag} must be an integer");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_flags() {
        let opts = parse(&[
            "--ticks",
            "240",
            "--latency",
            "3",
            "--script",
            "route.json",
            "--telemetry",
            "out/run.jsonl",
            "--destroy-at",
            "90",
        ]);

        assert_eq!(opts.ticks, Some(240));
        assert_eq!(opts.latency, Some(3));
        assert_eq!(opts.scripted_input, Some(PathBuf::from("route.json")));
        assert_eq!(opts.telemetry, Some(PathBuf::from("out/run.jsonl")));
        assert_eq!(opts.destroy_at, Some(90));
        assert!(opts.config.is_none());
    }

    #[test]
    fn test_bad_integer_is_ignored() {
        let opts = parse(&["--ticks", "lots", "--latency"]);
        assert_eq!(opts.ticks, None);
        assert_eq!(opts.latency, None);
    }
}
