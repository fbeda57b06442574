use crate::config::ArenaConfig;
use crate::scripted_input::ScriptedInputPlayer;
use anyhow::{Context, Result};
use arena_client::{ClientSession, FrameInputSink, WallSnapshotCell, WallSource};
use arena_core::{Tick, Vec2, TICK_DT};
use arena_net::{PredictionEngine, PredictionMetrics, ReconcileOutcome, SharedPredictionEngine};
use arena_physics::WallCollisionModel;
use arena_testkit::fixtures::{arena_walls, destroyed};
use arena_testkit::{JsonlSink, MirrorServer, TelemetryRecord};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub struct HeadlessConfig {
    pub arena: ArenaConfig,
    pub scripted_input: Option<PathBuf>,
    pub telemetry: Option<PathBuf>,
    pub destroy_at: Option<u64>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub ticks: u64,
    pub metrics: PredictionMetrics,
    pub predicted: Vec2,
    pub server: Vec2,
}

pub fn run(cfg: HeadlessConfig) -> Result<RunSummary> {
    let sim = &cfg.arena.simulation;
    let radius = cfg.arena.walls.entity_radius;
    let mut script = match &cfg.scripted_input {
        Some(path) => ScriptedInputPlayer::from_path(path)
            .with_context(|| format!("Failed to load scripted input {}", path.display()))?,
        None => ScriptedInputPlayer::default_route(),
    };
    let mut telemetry = cfg
        .telemetry
        .as_ref()
        .map(JsonlSink::create)
        .transpose()
        .context("Failed to open telemetry sink")?;

    let layout = arena_walls();
    let walls = Arc::new(WallSnapshotCell::new(WallCollisionModel::with_radius(
        layout.clone(),
        radius,
    )));
    let (tx, mut frames) = mpsc::unbounded_channel();
    let engine = SharedPredictionEngine::new(PredictionEngine::new(
        cfg.arena.prediction.clone(),
        sim.spawn,
    ));
    let mut session = ClientSession::new(
        engine.clone(),
        walls.clone(),
        Box::new(FrameInputSink::new(tx)),
    );
    let mut server = MirrorServer::new(cfg.arena.prediction.clone(), sim.spawn)
        .with_latency(sim.latency_ticks)
        .rotating_shapes();
    let snapshot_every = sim.snapshot_every.max(1);

    info!(
        ticks = sim.ticks,
        latency = sim.latency_ticks,
        walls = layout.len(),
        "Starting headless prediction run"
    );

    let mut tick = Tick::ZERO;
    while tick.0 < sim.ticks {
        if cfg.destroy_at == Some(tick.0) {
            let mut broken = layout.clone();
            if let Some(first) = broken.first_mut() {
                *first = destroyed(first.clone());
                info!(wall = first.id, tick = tick.0, "Destroying wall");
            }
            walls.replace(WallCollisionModel::with_radius(broken, radius));
        }

        let input = script.advance(TICK_DT);
        session.tick(input, tick.as_millis());

        while let Ok(frame) = frames.try_recv() {
            if let Err(err) = server.receive_frame(&frame) {
                warn!("Dropping input frame: {:#}", err);
            }
        }

        let outcome = server
            .tick(&walls.current())
            .filter(|_| tick.0 % snapshot_every == 0)
            .map(|payload| session.handle_server_payload(&payload));

        if let Some(sink) = telemetry.as_mut() {
            let kind = outcome.as_ref().map_or("tick", ReconcileOutcome::label);
            sink.write(&TelemetryRecord {
                tick,
                kind,
                prediction: session.debug(),
            })?;
        }

        tick = tick.advance(1);
    }

    if let Some(sink) = telemetry.as_mut() {
        sink.flush()?;
    }

    let summary = RunSummary {
        ticks: tick.0,
        metrics: engine.metrics(),
        predicted: session.debug().predicted_position,
        server: server.position(),
    };
    info!(
        ticks = summary.ticks,
        predictions = summary.metrics.total_predictions,
        reconciliations = summary.metrics.total_reconciliations,
        mismatches = summary.metrics.total_mismatches,
        snaps = summary.metrics.total_snaps,
        avg_error = summary.metrics.avg_error_distance,
        max_error = summary.metrics.max_error_distance,
        "Headless run finished"
    );
    info!(
        predicted_x = summary.predicted.x,
        predicted_y = summary.predicted.y,
        server_x = summary.server.x,
        server_y = summary.server.y,
        script_finished = script.is_finished(),
        "Final positions"
    );

    Ok(summary)
}
