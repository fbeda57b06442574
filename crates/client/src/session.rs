//! Client session with prediction and reconciliation.

use crate::pacer::InputPacer;
use crate::sources::{InputSink, WallSource};
use arena_core::{InputSequence, InputState, Tick, Vec2};
use arena_net::{InputMessage, PredictionDebug, ReconcileOutcome, SharedPredictionEngine};
use arena_physics::WallCollisionModel;
use std::sync::Arc;
use tracing::{debug, warn};

/// Local player session: paces input, predicts, sends, and reconciles.
pub struct ClientSession {
    /// Prediction engine, shared with any snapshot pump.
    engine: SharedPredictionEngine,

    /// Latest wall geometry.
    walls: Arc<dyn WallSource>,

    /// Outbound input path.
    sink: Box<dyn InputSink>,

    /// Fixed-rate tick pacing.
    pacer: InputPacer,

    /// Sequence for the next applied input.
    next_sequence: InputSequence,

    /// Fixed ticks run so far.
    tick: Tick,

    /// Inputs the sink failed to deliver.
    send_failures: u64,
}

impl ClientSession {
    /// Create a session from its collaborators.
    pub fn new(
        engine: SharedPredictionEngine,
        walls: Arc<dyn WallSource>,
        sink: Box<dyn InputSink>,
    ) -> Self {
        Self {
            engine,
            walls,
            sink,
            pacer: InputPacer::new(),
            next_sequence: 1,
            tick: Tick::ZERO,
            send_failures: 0,
        }
    }

    /// Run every fixed tick due after `dt` seconds and return the render position.
    pub fn frame(&mut self, dt: f32, input: InputState, now_ms: u64) -> Vec2 {
        let due = self.pacer.accumulate(dt);
        if due > 0 {
            let walls = self.walls.current();
            for _ in 0..due {
                self.step(input, now_ms, &walls);
            }
        }
        self.engine.render_position()
    }

    /// Run exactly one fixed tick.
    pub fn tick(&mut self, input: InputState, now_ms: u64) -> Vec2 {
        let walls = self.walls.current();
        self.step(input, now_ms, &walls);
        self.engine.render_position()
    }

    /// Reconcile against a raw server payload using the latest walls.
    pub fn handle_server_payload(&self, payload: &str) -> ReconcileOutcome {
        let walls = self.walls.current();
        let outcome = self.engine.reconcile_str(payload, &walls);
        debug!(outcome = outcome.label(), "server snapshot handled");
        outcome
    }

    /// Respawn at `position`.
    pub fn reset(&mut self, position: Vec2) {
        self.engine.reset(position);
        self.pacer.reset();
    }

    /// Shared engine handle.
    pub fn engine(&self) -> &SharedPredictionEngine {
        &self.engine
    }

    /// Debug overlay snapshot.
    pub fn debug(&self) -> PredictionDebug {
        self.engine.debug()
    }

    /// Fixed ticks run so far.
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Sequence the next input will carry.
    pub fn next_sequence(&self) -> InputSequence {
        self.next_sequence
    }

    /// Inputs the sink failed to deliver.
    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }

    fn step(&mut self, input: InputState, now_ms: u64, walls: &WallCollisionModel) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);

        self.engine.apply_input(input, sequence, now_ms, walls);

        let message = InputMessage {
            sequence,
            input,
            timestamp_ms: now_ms,
        };
        if let Err(err) = self.sink.send(&message) {
            self.send_failures += 1;
            warn!(sequence, "Failed to send input: {:#}", err);
        }

        self.tick = self.tick.advance(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FrameInputSink, WallSnapshotCell};
    use arena_net::{decode_input_frame, PredictionConfig, PredictionEngine};
    use arena_physics::WallSegment;
    use tokio::sync::mpsc;

    fn session(
        walls: Arc<WallSnapshotCell>,
    ) -> (ClientSession, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let engine = SharedPredictionEngine::new(PredictionEngine::new(
            PredictionConfig::default(),
            Vec2::new(100.0, 100.0),
        ));
        let session = ClientSession::new(engine, walls, Box::new(FrameInputSink::new(tx)));
        (session, rx)
    }

    #[test]
    fn test_frame_sends_one_message_per_tick() {
        let (mut session, mut rx) = session(Arc::new(WallSnapshotCell::default()));
        let right = InputState::from_axes(1.0, 0.0, false);

        for frame in 0..30 {
            session.frame(1.0 / 30.0, right, frame * 33);
        }

        let mut sequences = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            sequences.push(decode_input_frame(&frame).unwrap().sequence);
        }
        assert!((59..=60).contains(&sequences.len()));
        assert!(sequences.windows(2).all(|pair| pair[1] == pair[0] + 1));
        assert_eq!(sequences[0], 1);
        assert_eq!(session.next_sequence() as usize, sequences.len() + 1);
    }

    #[test]
    fn test_short_frame_sends_nothing() {
        let (mut session, mut rx) = session(Arc::new(WallSnapshotCell::default()));

        let render = session.frame(0.001, InputState::from_axes(1.0, 0.0, false), 0);

        assert_eq!(render, Vec2::new(100.0, 100.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_server_payload_reconciles() {
        let (mut session, _rx) = session(Arc::new(WallSnapshotCell::default()));
        for seq in 0..5 {
            session.tick(InputState::from_axes(0.0, 1.0, false), seq * 16);
        }

        let outcome =
            session.handle_server_payload(r#"{"position": {"x": 50, "y": 50}, "lastProcessedInput": 5}"#);

        assert!(matches!(outcome, ReconcileOutcome::Synced { .. }));
        assert_eq!(session.debug().predicted_position, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_wall_replacement_applies_next_tick() {
        let walls = Arc::new(WallSnapshotCell::new(WallCollisionModel::new([
            WallSegment::vertical(1, 110.0, 80.0, 10.0, 50.0),
        ])));
        let (mut session, _rx) = session(Arc::clone(&walls));
        let right = InputState::from_axes(1.0, 0.0, false);

        for seq in 0..10 {
            session.tick(right, seq * 16);
        }
        let stuck = session.debug().predicted_position;
        assert!(stuck.x < 105.0);

        walls.replace(WallCollisionModel::new([
            WallSegment::vertical(1, 110.0, 80.0, 10.0, 50.0).with_mask([true; 5]),
        ]));
        for seq in 10..20 {
            session.tick(right, seq * 16);
        }

        assert!(session.debug().predicted_position.x > stuck.x);
    }

    #[test]
    fn test_send_failure_is_counted() {
        let (mut session, rx) = session(Arc::new(WallSnapshotCell::default()));
        drop(rx);

        session.tick(InputState::IDLE, 0);

        assert_eq!(session.send_failures(), 1);
        assert_eq!(session.current_tick(), Tick(1));
    }
}
