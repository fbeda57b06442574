//! Thread-safe handle around a [`PredictionEngine`].
//!
//! The local tick loop and the network receiver may run on different threads.
//! Every operation takes the lock for its whole duration, so input application
//! and reconciliation never interleave.

use crate::prediction::{PredictionDebug, PredictionEngine, PredictionMetrics, ReconcileOutcome};
use crate::protocol::ServerSnapshot;
use arena_core::{InputSequence, InputState, Vec2};
use arena_physics::WallCollisionModel;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, lock-guarded prediction engine.
#[derive(Debug, Clone)]
pub struct SharedPredictionEngine {
    inner: Arc<Mutex<PredictionEngine>>,
}

impl SharedPredictionEngine {
    /// Wrap an engine.
    pub fn new(engine: PredictionEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// See [`PredictionEngine::apply_input`].
    pub fn apply_input(
        &self,
        input: InputState,
        sequence: InputSequence,
        timestamp_ms: u64,
        walls: &WallCollisionModel,
    ) -> Vec2 {
        self.inner.lock().apply_input(input, sequence, timestamp_ms, walls)
    }

    /// See [`PredictionEngine::reconcile`].
    pub fn reconcile(&self, snapshot: &ServerSnapshot, walls: &WallCollisionModel) -> ReconcileOutcome {
        self.inner.lock().reconcile(snapshot, walls)
    }

    /// See [`PredictionEngine::reconcile_str`].
    pub fn reconcile_str(&self, text: &str, walls: &WallCollisionModel) -> ReconcileOutcome {
        self.inner.lock().reconcile_str(text, walls)
    }

    /// See [`PredictionEngine::advance_render`].
    pub fn advance_render(&self) -> Vec2 {
        self.inner.lock().advance_render()
    }

    /// See [`PredictionEngine::reset`].
    pub fn reset(&self, position: Vec2) {
        self.inner.lock().reset(position);
    }

    /// Position to draw this frame.
    pub fn render_position(&self) -> Vec2 {
        self.inner.lock().render_position()
    }

    /// Debug overlay snapshot.
    pub fn debug(&self) -> PredictionDebug {
        self.inner.lock().debug()
    }

    /// Copy of the accuracy counters.
    pub fn metrics(&self) -> PredictionMetrics {
        self.inner.lock().metrics().clone()
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut PredictionEngine) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<PredictionEngine> for SharedPredictionEngine {
    fn from(engine: PredictionEngine) -> Self {
        Self::new(engine)
    }
}
