#![warn(missing_docs)]
//! Client-side prediction, reconciliation, and the client/server message layer.

pub mod codec;
mod input_buffer;
mod prediction;
pub mod protocol;
mod shared;
mod smoothing;

pub use codec::{decode_input_frame, encode_input_frame};
pub use input_buffer::{InputSnapshot, InputSnapshotBuffer, DEFAULT_INPUT_CAPACITY};
pub use prediction::{
    replay_inputs, IgnoreReason, PredictionConfig, PredictionDebug, PredictionEngine,
    PredictionMetrics, PredictionState, ReconcileOutcome, SyncState,
};
pub use protocol::{InputMessage, ServerSnapshot, SnapshotError, SnapshotShape};
pub use shared::SharedPredictionEngine;
pub use smoothing::{
    Correction, CorrectionKind, SmoothingConfig, SmoothingCorrector, DEFAULT_CORRECTION_EPSILON,
    DEFAULT_CORRECTION_SPEED, DEFAULT_SNAP_THRESHOLD,
};
