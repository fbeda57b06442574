//! Injected collaborators: where walls come from and where input goes.

use anyhow::{anyhow, Result};
use arena_net::{encode_input_frame, InputMessage};
use arena_physics::WallCollisionModel;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Supplies the most recent wall snapshot.
///
/// Callers take one snapshot per resolve cycle and use it for every step in
/// that cycle, so a replay never mixes two destruction states.
pub trait WallSource: Send + Sync {
    /// Latest immutable wall snapshot.
    fn current(&self) -> Arc<WallCollisionModel>;
}

/// Outbound path for per-tick input messages.
pub trait InputSink: Send {
    /// Deliver one input message.
    fn send(&mut self, message: &InputMessage) -> Result<()>;
}

/// Latest wall snapshot, swapped whole when the world reports destruction.
#[derive(Debug)]
pub struct WallSnapshotCell {
    current: RwLock<Arc<WallCollisionModel>>,
    radius: f32,
}

impl WallSnapshotCell {
    /// Cell holding `model`.
    pub fn new(model: WallCollisionModel) -> Self {
        let radius = model.radius();
        Self {
            current: RwLock::new(Arc::new(model)),
            radius,
        }
    }

    /// Replace the snapshot.
    pub fn replace(&self, model: WallCollisionModel) {
        debug!(walls = model.len(), "wall snapshot replaced");
        *self.current.write() = Arc::new(model);
    }

    /// Replace the snapshot from a raw JSON wall collection.
    pub fn replace_json(&self, value: &Value) {
        self.replace(WallCollisionModel::from_json_with_radius(value, self.radius));
    }
}

impl Default for WallSnapshotCell {
    fn default() -> Self {
        Self::new(WallCollisionModel::empty())
    }
}

impl WallSource for WallSnapshotCell {
    fn current(&self) -> Arc<WallCollisionModel> {
        Arc::clone(&self.current.read())
    }
}

/// Sends each input as a postcard frame over an unbounded channel.
#[derive(Debug, Clone)]
pub struct FrameInputSink {
    tx: UnboundedSender<Vec<u8>>,
}

impl FrameInputSink {
    /// Sink writing to `tx`.
    pub fn new(tx: UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl InputSink for FrameInputSink {
    fn send(&mut self, message: &InputMessage) -> Result<()> {
        let frame = encode_input_frame(message)?;
        self.tx
            .send(frame)
            .map_err(|_| anyhow!("input channel closed at sequence {}", message.sequence))
    }
}
