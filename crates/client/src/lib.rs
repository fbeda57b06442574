#![warn(missing_docs)]
//! Client session glue: fixed-rate input, outbound messages, inbound snapshots.

mod pacer;
mod pump;
mod session;
mod sources;

pub use pacer::{InputPacer, MAX_CATCHUP_TICKS, MAX_FRAME_DT};
pub use pump::{spawn_snapshot_pump, PumpStats};
pub use session::ClientSession;
pub use sources::{FrameInputSink, InputSink, WallSnapshotCell, WallSource};
