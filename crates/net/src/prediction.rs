//! Client-side prediction and server reconciliation.
//!
//! Local input is applied the moment it is sampled and recorded in an
//! [`InputSnapshotBuffer`]. When an authoritative snapshot arrives, inputs the
//! server has processed are discarded and the rest are replayed from the server
//! position through the same collision step used for prediction. Any resulting
//! jump is handed to the [`SmoothingCorrector`].
//!
//! Invariant: `predicted_position` is always `server_position` with every
//! buffered input replayed on top of it.

use crate::input_buffer::{InputSnapshot, InputSnapshotBuffer, DEFAULT_INPUT_CAPACITY};
use crate::protocol::{ServerSnapshot, SnapshotError};
use crate::smoothing::{CorrectionKind, SmoothingConfig, SmoothingCorrector};
use arena_core::{InputSequence, InputState, MovementTuning, Vec2, WorldBounds};
use arena_physics::{simulate_step, WallCollisionModel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Maximum number of unacknowledged inputs kept for replay.
    pub buffer_capacity: usize,
    /// Movement speeds.
    pub tuning: MovementTuning,
    /// Playable area; every resolved position is clamped into it.
    pub bounds: WorldBounds,
    /// Visual correction tuning.
    pub smoothing: SmoothingConfig,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_INPUT_CAPACITY,
            tuning: MovementTuning::default(),
            bounds: WorldBounds::default(),
            smoothing: SmoothingConfig::default(),
        }
    }
}

/// Positions tracked for the local player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionState {
    /// Last position confirmed by the server.
    pub server_position: Vec2,
    /// Server position plus every unacknowledged input.
    pub predicted_position: Vec2,
    /// Position handed to rendering; trails predicted while a correction runs.
    pub render_position: Vec2,
    /// Highest sequence the server has acknowledged, if any.
    pub last_acknowledged: Option<InputSequence>,
}

impl PredictionState {
    fn at(position: Vec2) -> Self {
        Self {
            server_position: position,
            predicted_position: position,
            render_position: position,
            last_acknowledged: None,
        }
    }
}

/// Whether local state is ahead of the last acknowledged server state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No unacknowledged input; predicted equals server position.
    InSync,
    /// Inputs applied locally that the server has not yet confirmed.
    Predicting {
        /// Number of buffered inputs.
        pending: usize,
    },
}

/// Why a snapshot did not change any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Position or acknowledgment could not be extracted.
    Malformed,
    /// Acknowledges an older sequence than one already processed.
    Stale,
}

/// Result of a reconciliation attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReconcileOutcome {
    /// Nothing left to replay; predicted position set to the server position.
    Synced {
        /// How the render position absorbed the change.
        correction: CorrectionKind,
    },
    /// Unacknowledged inputs were replayed from the server position.
    Replayed {
        /// Number of inputs replayed.
        inputs: usize,
        /// How the render position absorbed the change.
        correction: CorrectionKind,
    },
    /// Snapshot rejected; state untouched.
    Ignored {
        /// Rejection reason.
        reason: IgnoreReason,
    },
}

impl ReconcileOutcome {
    /// Correction applied, if the snapshot was accepted.
    pub fn correction(&self) -> Option<CorrectionKind> {
        match self {
            ReconcileOutcome::Synced { correction }
            | ReconcileOutcome::Replayed { correction, .. } => Some(*correction),
            ReconcileOutcome::Ignored { .. } => None,
        }
    }

    /// Short label for logs and telemetry.
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Synced { .. } => "synced",
            ReconcileOutcome::Replayed { .. } => "replayed",
            ReconcileOutcome::Ignored {
                reason: IgnoreReason::Malformed,
            } => "ignored_malformed",
            ReconcileOutcome::Ignored {
                reason: IgnoreReason::Stale,
            } => "ignored_stale",
        }
    }
}

/// Metrics for tracking prediction accuracy.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionMetrics {
    /// Inputs applied locally.
    pub total_predictions: u64,
    /// Snapshots accepted.
    pub total_reconciliations: u64,
    /// Reconciliations that replayed at least one input.
    pub total_replays: u64,
    /// Inputs replayed across all reconciliations.
    pub replayed_inputs: u64,
    /// Corrections that snapped instead of smoothing.
    pub total_snaps: u64,
    /// Snapshots rejected as malformed or stale.
    pub ignored_snapshots: u64,
    /// Inputs evicted by buffer overflow.
    pub dropped_inputs: u64,
    /// Acknowledged inputs whose prediction differed from the server.
    pub total_mismatches: u64,
    /// Average distance between prediction and server at the acknowledged input.
    pub avg_error_distance: f32,
    /// Maximum distance between prediction and server at the acknowledged input.
    pub max_error_distance: f32,
    #[serde(skip)]
    error_samples: u64,
}

impl PredictionMetrics {
    fn record_error(&mut self, error: f32) {
        self.error_samples += 1;
        self.avg_error_distance +=
            (error - self.avg_error_distance) / self.error_samples as f32;
        if error > self.max_error_distance {
            self.max_error_distance = error;
        }
    }
}

/// Introspection view for rendering and debug overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDebug {
    /// Last server-confirmed position.
    pub server_position: Vec2,
    /// Locally predicted position.
    pub predicted_position: Vec2,
    /// Position to draw.
    pub render_position: Vec2,
    /// Unacknowledged inputs held for replay.
    pub buffer_size: usize,
    /// True while a smoothing correction is running.
    pub has_active_correction: bool,
}

/// Replay `inputs` from `start`, rewriting each snapshot's predicted position.
///
/// Returns the final position. Pure with respect to its arguments.
pub fn replay_inputs<'a>(
    start: Vec2,
    inputs: impl IntoIterator<Item = &'a mut InputSnapshot>,
    tuning: &MovementTuning,
    bounds: &WorldBounds,
    walls: &WallCollisionModel,
) -> Vec2 {
    let mut position = start;
    for snapshot in inputs {
        position = simulate_step(position, &snapshot.input, tuning, bounds, walls);
        snapshot.predicted_position = position;
    }
    position
}

/// Client-side predictor for the local player.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    config: PredictionConfig,
    state: PredictionState,
    buffer: InputSnapshotBuffer,
    smoother: SmoothingCorrector,
    metrics: PredictionMetrics,
}

impl PredictionEngine {
    /// Create an engine with every tracked position at `spawn`.
    pub fn new(config: PredictionConfig, spawn: Vec2) -> Self {
        let spawn = config.bounds.clamp(spawn);
        Self {
            buffer: InputSnapshotBuffer::with_capacity(config.buffer_capacity),
            smoother: SmoothingCorrector::new(config.smoothing),
            state: PredictionState::at(spawn),
            metrics: PredictionMetrics::default(),
            config,
        }
    }

    /// Apply one tick of local input immediately and record it for replay.
    ///
    /// `walls` is the latest snapshot; it is not retained past this call.
    /// Returns the new predicted position.
    pub fn apply_input(
        &mut self,
        input: InputState,
        sequence: InputSequence,
        timestamp_ms: u64,
        walls: &WallCollisionModel,
    ) -> Vec2 {
        if let Some(latest) = self.buffer.latest() {
            if sequence <= latest.sequence {
                warn!(
                    sequence,
                    latest = latest.sequence,
                    "input sequence is not increasing, replay order may be wrong"
                );
            }
        }

        let next = simulate_step(
            self.state.predicted_position,
            &input,
            &self.config.tuning,
            &self.config.bounds,
            walls,
        );
        self.state.predicted_position = next;

        let snapshot = InputSnapshot::new(sequence, input, timestamp_ms, next);
        if self.buffer.push(snapshot).is_some() {
            self.metrics.dropped_inputs += 1;
        }

        self.state.render_position = self.smoother.advance(next);
        self.metrics.total_predictions += 1;
        trace!(sequence, x = next.x, y = next.y, "applied local input");
        next
    }

    /// Decay any active correction on a tick where no input was applied.
    pub fn advance_render(&mut self) -> Vec2 {
        self.state.render_position = self.smoother.advance(self.state.predicted_position);
        self.state.render_position
    }

    /// Reconcile against a raw JSON snapshot; malformed payloads are ignored.
    pub fn reconcile_json(&mut self, payload: &Value, walls: &WallCollisionModel) -> ReconcileOutcome {
        match ServerSnapshot::from_json(payload) {
            Ok(snapshot) => self.reconcile(&snapshot, walls),
            Err(err) => self.ignore_malformed(&err),
        }
    }

    /// Reconcile against raw JSON text; malformed payloads are ignored.
    pub fn reconcile_str(&mut self, text: &str, walls: &WallCollisionModel) -> ReconcileOutcome {
        match text.parse::<ServerSnapshot>() {
            Ok(snapshot) => self.reconcile(&snapshot, walls),
            Err(err) => self.ignore_malformed(&err),
        }
    }

    /// Adopt the server position, drop acknowledged inputs, replay the rest.
    pub fn reconcile(
        &mut self,
        snapshot: &ServerSnapshot,
        walls: &WallCollisionModel,
    ) -> ReconcileOutcome {
        let ack = snapshot.last_processed_input;
        if let Some(last) = self.state.last_acknowledged {
            if ack < last {
                debug!(ack, last, "ignoring stale server snapshot");
                self.metrics.ignored_snapshots += 1;
                return ReconcileOutcome::Ignored {
                    reason: IgnoreReason::Stale,
                };
            }
        }

        let previous_render = self.state.render_position;
        self.state.server_position = snapshot.position;
        self.state.last_acknowledged = Some(ack);

        let acknowledged = self.buffer.prune_up_to(ack);
        self.record_prediction_error(&acknowledged, snapshot);
        self.metrics.total_reconciliations += 1;

        let replayed = if self.buffer.is_empty() {
            self.state.predicted_position = self.state.server_position;
            0
        } else {
            let pending = self.buffer.len();
            self.state.predicted_position = replay_inputs(
                self.state.server_position,
                self.buffer.iter_mut(),
                &self.config.tuning,
                &self.config.bounds,
                walls,
            );
            self.metrics.total_replays += 1;
            self.metrics.replayed_inputs += pending as u64;
            pending
        };

        let correction = self
            .smoother
            .correct(previous_render, self.state.predicted_position);
        if correction == CorrectionKind::Snapped {
            self.metrics.total_snaps += 1;
        }
        self.state.render_position = self.smoother.render_position(self.state.predicted_position);

        trace!(ack, replayed, ?correction, "reconciled with server snapshot");
        if replayed == 0 {
            ReconcileOutcome::Synced { correction }
        } else {
            ReconcileOutcome::Replayed {
                inputs: replayed,
                correction,
            }
        }
    }

    /// Put every tracked position at `position` and forget buffered input.
    ///
    /// Used on respawn and scene changes. The last acknowledged sequence is kept
    /// so snapshots from before the reset are still recognized as stale.
    pub fn reset(&mut self, position: Vec2) {
        let last_acknowledged = self.state.last_acknowledged;
        self.buffer.clear();
        self.smoother.clear();
        self.state = PredictionState {
            last_acknowledged,
            ..PredictionState::at(position)
        };
        debug!(x = position.x, y = position.y, "prediction state reset");
    }

    /// Position to draw this frame.
    pub fn render_position(&self) -> Vec2 {
        self.state.render_position
    }

    /// Locally predicted position.
    pub fn predicted_position(&self) -> Vec2 {
        self.state.predicted_position
    }

    /// Last server-confirmed position.
    pub fn server_position(&self) -> Vec2 {
        self.state.server_position
    }

    /// Highest acknowledged sequence.
    pub fn last_acknowledged(&self) -> Option<InputSequence> {
        self.state.last_acknowledged
    }

    /// All tracked positions.
    pub fn state(&self) -> &PredictionState {
        &self.state
    }

    /// Whether inputs are awaiting acknowledgment.
    pub fn sync_state(&self) -> SyncState {
        if self.buffer.is_empty() {
            SyncState::InSync
        } else {
            SyncState::Predicting {
                pending: self.buffer.len(),
            }
        }
    }

    /// Buffered inputs.
    pub fn buffer(&self) -> &InputSnapshotBuffer {
        &self.buffer
    }

    /// Visual correction state.
    pub fn smoother(&self) -> &SmoothingCorrector {
        &self.smoother
    }

    /// Accuracy counters.
    pub fn metrics(&self) -> &PredictionMetrics {
        &self.metrics
    }

    /// Active configuration.
    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Snapshot for debug overlays.
    pub fn debug(&self) -> PredictionDebug {
        PredictionDebug {
            server_position: self.state.server_position,
            predicted_position: self.state.predicted_position,
            render_position: self.state.render_position,
            buffer_size: self.buffer.len(),
            has_active_correction: self.smoother.is_active(),
        }
    }

    fn ignore_malformed(&mut self, err: &SnapshotError) -> ReconcileOutcome {
        warn!(%err, "ignoring malformed server snapshot");
        self.metrics.ignored_snapshots += 1;
        ReconcileOutcome::Ignored {
            reason: IgnoreReason::Malformed,
        }
    }

    fn record_prediction_error(&mut self, acknowledged: &[InputSnapshot], snapshot: &ServerSnapshot) {
        let Some(last) = acknowledged.last() else {
            return;
        };
        if last.sequence != snapshot.last_processed_input {
            return;
        }

        let error = last.predicted_position.distance(snapshot.position);
        if error > self.config.smoothing.epsilon {
            self.metrics.total_mismatches += 1;
        }
        self.metrics.record_error(error);
    }
}
