//! Client session driven against the mirror server over the frame codec.

use arena_client::{ClientSession, FrameInputSink, WallSnapshotCell, WallSource};
use arena_core::{InputState, Vec2};
use arena_net::{
    CorrectionKind, PredictionConfig, PredictionEngine, ReconcileOutcome, SharedPredictionEngine,
};
use arena_physics::WallCollisionModel;
use arena_testkit::fixtures::{arena_model, destroyed, vertical_wall};
use arena_testkit::MirrorServer;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};

struct Loop {
    session: ClientSession,
    server: MirrorServer,
    walls: Arc<WallSnapshotCell>,
    frames: UnboundedReceiver<Vec<u8>>,
    now_ms: u64,
}

impl Loop {
    fn new(walls: WallCollisionModel, spawn: Vec2, latency: u64) -> Self {
        let config = PredictionConfig::default();
        let walls = Arc::new(WallSnapshotCell::new(walls));
        let (tx, frames) = mpsc::unbounded_channel();
        let engine =
            SharedPredictionEngine::new(PredictionEngine::new(config.clone(), spawn));
        let session = ClientSession::new(engine, walls.clone(), Box::new(FrameInputSink::new(tx)));
        let server = MirrorServer::new(config, spawn)
            .with_latency(latency)
            .rotating_shapes();
        Self {
            session,
            server,
            walls,
            frames,
            now_ms: 0,
        }
    }

    fn step(&mut self, input: InputState) -> Option<ReconcileOutcome> {
        self.session.tick(input, self.now_ms);
        self.now_ms += 16;
        while let Ok(frame) = self.frames.try_recv() {
            self.server.receive_frame(&frame).expect("valid frame");
        }
        let payload = self.server.tick(&self.walls.current())?;
        Some(self.session.handle_server_payload(&payload))
    }

    fn run(&mut self, input: InputState, ticks: usize) {
        for _ in 0..ticks {
            self.step(input);
        }
    }
}

fn dir(x: f32, y: f32) -> InputState {
    InputState::from_axes(x, y, false)
}

#[test]
fn test_agreeing_server_never_corrects() {
    let mut game = Loop::new(arena_model(), Vec2::new(200.0, 200.0), 6);

    game.run(dir(1.0, 0.0), 60);
    game.run(dir(1.0, 1.0), 60);
    game.run(dir(0.0, -1.0), 60);
    game.run(InputState::IDLE, 30);

    let debug = game.session.debug();
    let metrics = game.session.engine().metrics();
    assert_eq!(metrics.total_mismatches, 0);
    assert_eq!(metrics.total_snaps, 0);
    assert_eq!(debug.predicted_position, game.server.position());
    assert_eq!(debug.render_position, debug.predicted_position);
    assert!(!debug.has_active_correction);
}

#[test]
fn test_wall_destroyed_in_flight_converges() {
    let wall = vertical_wall(1, 300.0, 100.0, 200.0);
    let mut game = Loop::new(WallCollisionModel::new([wall.clone()]), Vec2::new(280.0, 200.0), 6);

    game.run(dir(1.0, 0.0), 30);
    assert!(game.session.debug().predicted_position.x < 300.0);

    game.walls.replace(WallCollisionModel::new([destroyed(wall)]));
    game.run(dir(1.0, 0.0), 20);
    game.run(InputState::IDLE, 90);

    let debug = game.session.debug();
    assert!(game.session.engine().metrics().total_mismatches > 0);
    assert!(debug.predicted_position.x > 310.0);
    assert_eq!(debug.predicted_position, game.server.position());
    assert_eq!(debug.buffer_size, 0);
    assert!(!debug.has_active_correction);
    assert_eq!(debug.render_position, debug.predicted_position);
}

#[test]
fn test_teleport_snaps() {
    let mut game = Loop::new(WallCollisionModel::empty(), Vec2::new(800.0, 800.0), 0);
    game.run(dir(1.0, 0.0), 10);

    game.server.teleport(Vec2::new(100.0, 100.0));
    let outcome = game.step(dir(1.0, 0.0)).expect("snapshot after teleport");

    assert_eq!(outcome.correction(), Some(CorrectionKind::Snapped));
    let debug = game.session.debug();
    assert_eq!(debug.render_position, debug.predicted_position);
    assert_eq!(debug.predicted_position, game.server.position());
    assert!(debug.predicted_position.distance(Vec2::new(100.0, 100.0)) < 5.0);
}

#[test]
fn test_nudge_smooths() {
    let mut game = Loop::new(WallCollisionModel::empty(), Vec2::new(800.0, 800.0), 0);
    game.run(InputState::IDLE, 5);
    let before = game.session.debug().render_position;

    game.server.nudge(Vec2::new(0.0, 4.0));
    let outcome = game.step(InputState::IDLE).expect("snapshot after nudge");

    assert_eq!(outcome.correction(), Some(CorrectionKind::Smoothed));
    let debug = game.session.debug();
    assert!(debug.has_active_correction);
    assert_eq!(debug.render_position, before);

    game.run(InputState::IDLE, 60);
    let debug = game.session.debug();
    assert!(!debug.has_active_correction);
    assert_eq!(debug.render_position, Vec2::new(800.0, 804.0));
}
