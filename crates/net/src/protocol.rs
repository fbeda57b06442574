//! Message shapes exchanged with the authoritative server.
//!
//! Outbound input travels as postcard frames (see [`crate::codec`]). Inbound
//! snapshots arrive as JSON and may carry the player position in one of several
//! shapes; [`ServerSnapshot::from_json`] tries each accepted shape in order.

use arena_core::{InputSequence, InputState, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use thiserror::Error;

/// Input sent to the server once per local tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputMessage {
    /// Sequence number assigned by the client.
    pub sequence: InputSequence,
    /// Raw control state applied this tick.
    pub input: InputState,
    /// Client clock when the input was sampled.
    pub timestamp_ms: u64,
}

/// Authoritative state for the local player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServerSnapshot {
    /// Server position of the player.
    pub position: Vec2,
    /// Highest input sequence the server has applied.
    pub last_processed_input: InputSequence,
}

/// Why an inbound snapshot could not be interpreted.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Not JSON, or a field had the wrong type.
    #[error("snapshot payload is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// None of the accepted position shapes matched.
    #[error("snapshot has no transform.position, position, or x/y fields")]
    MissingPosition,

    /// The acknowledgment field is absent.
    #[error("snapshot has no lastProcessedInput field")]
    MissingAck,

    /// Position decoded to NaN or infinity.
    #[error("snapshot position ({x}, {y}) is not finite")]
    NonFinite {
        /// Decoded x.
        x: f32,
        /// Decoded y.
        y: f32,
    },
}

/// Accepted layouts for the position inside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotShape {
    /// `{ "transform": { "position": { "x", "y" } } }`
    Transform,
    /// `{ "position": { "x", "y" } }`
    Position,
    /// `{ "x", "y" }`
    Flat,
}

impl SnapshotShape {
    /// All shapes in the order they are tried when parsing.
    pub const ALL: [SnapshotShape; 3] = [
        SnapshotShape::Transform,
        SnapshotShape::Position,
        SnapshotShape::Flat,
    ];
}

#[derive(Debug, Deserialize)]
struct Point {
    x: f32,
    y: f32,
}

#[derive(Debug, Deserialize)]
struct TransformBody {
    position: Point,
}

/// Untagged variants are attempted top to bottom.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PositionPayload {
    Transform { transform: TransformBody },
    Position { position: Point },
    Flat { x: f32, y: f32 },
}

impl PositionPayload {
    fn into_parts(self) -> (Vec2, SnapshotShape) {
        match self {
            PositionPayload::Transform { transform } => (
                Vec2::new(transform.position.x, transform.position.y),
                SnapshotShape::Transform,
            ),
            PositionPayload::Position { position } => {
                (Vec2::new(position.x, position.y), SnapshotShape::Position)
            }
            PositionPayload::Flat { x, y } => (Vec2::new(x, y), SnapshotShape::Flat),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AckPayload {
    #[serde(rename = "lastProcessedInput", alias = "last_processed_input")]
    last_processed_input: Option<InputSequence>,
}

impl FromStr for ServerSnapshot {
    type Err = SnapshotError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

impl ServerSnapshot {
    /// Parse a snapshot from a JSON value.
    pub fn from_json(value: &Value) -> Result<Self, SnapshotError> {
        Self::from_json_with_shape(value).map(|(snapshot, _)| snapshot)
    }

    /// Parse a snapshot and report which position shape matched.
    pub fn from_json_with_shape(value: &Value) -> Result<(Self, SnapshotShape), SnapshotError> {
        let (position, shape) = PositionPayload::deserialize(value)
            .map_err(|_| SnapshotError::MissingPosition)?
            .into_parts();

        if !arena_core::is_finite(position) {
            return Err(SnapshotError::NonFinite {
                x: position.x,
                y: position.y,
            });
        }

        let last_processed_input = AckPayload::deserialize(value)?
            .last_processed_input
            .ok_or(SnapshotError::MissingAck)?;

        Ok((
            Self {
                position,
                last_processed_input,
            },
            shape,
        ))
    }

    /// Render this snapshot as JSON in the requested shape.
    pub fn to_json(&self, shape: SnapshotShape) -> Value {
        let Vec2 { x, y } = self.position;
        let ack = self.last_processed_input;
        match shape {
            SnapshotShape::Transform => json!({
                "transform": { "position": { "x": x, "y": y } },
                "lastProcessedInput": ack,
            }),
            SnapshotShape::Position => json!({
                "position": { "x": x, "y": y },
                "lastProcessedInput": ack,
            }),
            SnapshotShape::Flat => json!({
                "x": x,
                "y": y,
                "lastProcessedInput": ack,
            }),
        }
    }
}
