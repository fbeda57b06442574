//! Destructible wall geometry.
//!
//! Every wall is cut into [`SLICE_COUNT`] equal slices along its long axis, or,
//! for the 10x10 pillar shape, into equal-height horizontal bands. A destroyed
//! slice contributes no collision.
//!
//! [`WallCollisionModel`] is a read-only snapshot. The world collaborator replaces
//! it wholesale on every update; nothing in the collision path mutates it.

use crate::Rect;
use arena_core::ENTITY_RADIUS;
use glam::Vec2;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Number of independently destructible slices per wall.
pub const SLICE_COUNT: usize = 5;

const _: () = assert!(SLICE_COUNT > 0, "walls need at least one slice");

/// Width and height of the special pillar shape.
pub const PILLAR_SIZE: f32 = 10.0;

/// Height of one pillar band.
pub const PILLAR_BAND_HEIGHT: f32 = PILLAR_SIZE / SLICE_COUNT as f32;

/// Wall identifier assigned by the server.
pub type WallId = u64;

/// Long axis of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallOrientation {
    /// Long axis along x; slices are vertical strips.
    Horizontal,
    /// Long axis along y; slices are horizontal strips.
    Vertical,
}

/// Reason a wall was disqualified from blocking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WallDataError {
    /// The destruction mask does not have one entry per slice.
    #[error("destruction mask has {found} entries, expected {SLICE_COUNT}")]
    MaskLength {
        /// Number of entries received.
        found: usize,
    },

    /// Width or height is zero or negative.
    #[error("wall size {width}x{height} is not positive")]
    NonPositiveSize {
        /// Received width.
        width: f32,
        /// Received height.
        height: f32,
    },

    /// Position or size is NaN or infinite.
    #[error("wall geometry is not finite")]
    NonFinite,
}

/// One wall as described by the world collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallSegment {
    /// Server-assigned identifier.
    #[serde(default)]
    pub id: WallId,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Extent along x.
    pub width: f32,
    /// Extent along y.
    pub height: f32,
    /// Long axis.
    pub orientation: WallOrientation,
    /// Per-slice destruction flags; `true` means destroyed.
    #[serde(default, deserialize_with = "lenient_mask")]
    pub destruction_mask: Vec<bool>,
}

impl WallSegment {
    /// Intact horizontal wall.
    pub fn horizontal(id: WallId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::intact(id, x, y, width, height, WallOrientation::Horizontal)
    }

    /// Intact vertical wall.
    pub fn vertical(id: WallId, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::intact(id, x, y, width, height, WallOrientation::Vertical)
    }

    /// Intact 10x10 pillar.
    pub fn pillar(id: WallId, x: f32, y: f32) -> Self {
        Self::intact(
            id,
            x,
            y,
            PILLAR_SIZE,
            PILLAR_SIZE,
            WallOrientation::Vertical,
        )
    }

    fn intact(
        id: WallId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        orientation: WallOrientation,
    ) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            orientation,
            destruction_mask: vec![false; SLICE_COUNT],
        }
    }

    /// Copy of this wall with one slice marked destroyed.
    pub fn with_slice_destroyed(mut self, slice: usize) -> Self {
        if let Some(flag) = self.destruction_mask.get_mut(slice) {
            *flag = true;
        }
        self
    }

    /// Copy of this wall with the given mask.
    pub fn with_mask(mut self, mask: [bool; SLICE_COUNT]) -> Self {
        self.destruction_mask = mask.to_vec();
        self
    }

    /// Top-left corner.
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Visual footprint of the wall. Negative sizes are normalized rather than rejected.
    pub fn bounds(&self) -> Rect {
        let origin = self.position();
        Rect::from_corners(origin, origin + Vec2::new(self.width, self.height))
    }

    /// True for the 10x10 shape that is sliced into horizontal bands.
    pub fn is_pillar(&self) -> bool {
        self.width == PILLAR_SIZE && self.height == PILLAR_SIZE
    }

    /// Slice a point maps to, or `None` when it falls outside `[0, SLICE_COUNT)`.
    ///
    /// Only the slicing axis is considered; callers bound-check the other axis.
    pub fn slice_index(&self, point: Vec2) -> Option<usize> {
        let raw = if self.is_pillar() {
            ((point.y - self.y) / PILLAR_BAND_HEIGHT).floor()
        } else {
            match self.orientation {
                WallOrientation::Horizontal => {
                    ((point.x - self.x) / (self.width / SLICE_COUNT as f32)).floor()
                }
                WallOrientation::Vertical => {
                    ((point.y - self.y) / (self.height / SLICE_COUNT as f32)).floor()
                }
            }
        };

        // NaN fails both comparisons.
        if raw >= 0.0 && raw < SLICE_COUNT as f32 {
            Some(raw as usize)
        } else {
            None
        }
    }

    /// World rectangle covered by slice `slice`, or `None` for an invalid wall.
    pub fn slice_rect(&self, slice: usize) -> Option<Rect> {
        if slice >= SLICE_COUNT || self.validate().is_err() {
            return None;
        }
        let i = slice as f32;
        let rect = if self.is_pillar() {
            Rect::from_origin_size(
                Vec2::new(self.x, self.y + i * PILLAR_BAND_HEIGHT),
                Vec2::new(self.width, PILLAR_BAND_HEIGHT),
            )
        } else {
            match self.orientation {
                WallOrientation::Horizontal => {
                    let step = self.width / SLICE_COUNT as f32;
                    Rect::from_origin_size(
                        Vec2::new(self.x + i * step, self.y),
                        Vec2::new(step, self.height),
                    )
                }
                WallOrientation::Vertical => {
                    let step = self.height / SLICE_COUNT as f32;
                    Rect::from_origin_size(
                        Vec2::new(self.x, self.y + i * step),
                        Vec2::new(self.width, step),
                    )
                }
            }
        };
        Some(rect)
    }

    /// Check the wall is usable for collision and return its destruction flags.
    pub fn validate(&self) -> Result<[bool; SLICE_COUNT], WallDataError> {
        if ![self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(WallDataError::NonFinite);
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(WallDataError::NonPositiveSize {
                width: self.width,
                height: self.height,
            });
        }
        <[bool; SLICE_COUNT]>::try_from(self.destruction_mask.as_slice()).map_err(|_| {
            WallDataError::MaskLength {
                found: self.destruction_mask.len(),
            }
        })
    }
}

/// Accept `true`/`false` or numbers (non-zero = destroyed) for mask entries.
fn lenient_mask<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    raw.unwrap_or_default()
        .into_iter()
        .map(|entry| match entry {
            Value::Bool(flag) => Ok(flag),
            Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
            other => Err(D::Error::custom(format!(
                "unsupported destruction mask entry: {other}"
            ))),
        })
        .collect()
}

#[derive(Debug, Clone)]
struct BlockingWall {
    segment: WallSegment,
    destroyed: [bool; SLICE_COUNT],
    coarse: Rect,
}

impl BlockingWall {
    fn blocks(&self, point: Vec2) -> bool {
        self.coarse.contains(point)
            && self
                .segment
                .slice_index(point)
                .is_some_and(|slice| !self.destroyed[slice])
    }
}

/// Immutable per-tick snapshot of wall geometry and destruction state.
#[derive(Debug, Clone)]
pub struct WallCollisionModel {
    walls: Vec<BlockingWall>,
    rejected: usize,
    radius: f32,
}

impl Default for WallCollisionModel {
    fn default() -> Self {
        Self::empty()
    }
}

impl WallCollisionModel {
    /// Model with no walls.
    pub fn empty() -> Self {
        Self {
            walls: Vec::new(),
            rejected: 0,
            radius: ENTITY_RADIUS,
        }
    }

    /// Build a model using the default entity radius.
    pub fn new(walls: impl IntoIterator<Item = WallSegment>) -> Self {
        Self::with_radius(walls, ENTITY_RADIUS)
    }

    /// Build a model whose coarse boxes are expanded by `radius`.
    ///
    /// Malformed walls are logged and left out, so they never block.
    pub fn with_radius(walls: impl IntoIterator<Item = WallSegment>, radius: f32) -> Self {
        let radius = if radius.is_finite() { radius.max(0.0) } else { 0.0 };
        let mut model = Self {
            walls: Vec::new(),
            rejected: 0,
            radius,
        };

        for segment in walls {
            match segment.validate() {
                Ok(destroyed) => {
                    let coarse = segment.bounds().expand(radius);
                    model.walls.push(BlockingWall {
                        segment,
                        destroyed,
                        coarse,
                    });
                }
                Err(err) => {
                    warn!(wall = segment.id, %err, "malformed wall data, treating wall as non-blocking");
                    model.rejected += 1;
                }
            }
        }

        model
    }

    /// Build a model from a JSON array of walls or an id-to-wall map.
    ///
    /// Each wall is decoded on its own; one bad entry does not discard the rest.
    pub fn from_json(value: &Value) -> Self {
        Self::from_json_with_radius(value, ENTITY_RADIUS)
    }

    /// Same as [`WallCollisionModel::from_json`] with an explicit radius.
    pub fn from_json_with_radius(value: &Value, radius: f32) -> Self {
        let entries: Vec<(Option<&str>, &Value)> = match value {
            Value::Array(items) => items.iter().map(|item| (None, item)).collect(),
            Value::Object(map) => map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
            _ => {
                warn!("wall payload is neither an array nor a map, no walls loaded");
                return Self::with_radius(Vec::new(), radius);
            }
        };

        let mut undecodable = 0;
        let mut segments = Vec::with_capacity(entries.len());
        for (key, entry) in entries {
            match WallSegment::deserialize(entry) {
                Ok(mut segment) => {
                    if segment.id == 0 {
                        if let Some(id) = key.and_then(|k| k.parse().ok()) {
                            segment.id = id;
                        }
                    }
                    segments.push(segment);
                }
                Err(err) => {
                    warn!(key, %err, "undecodable wall entry, treating wall as non-blocking");
                    undecodable += 1;
                }
            }
        }

        let mut model = Self::with_radius(segments, radius);
        model.rejected += undecodable;
        debug!(
            walls = model.len(),
            rejected = model.rejected,
            "wall snapshot loaded"
        );
        model
    }

    /// True if a point collides with any intact slice.
    pub fn is_blocked(&self, point: Vec2) -> bool {
        self.walls.iter().any(|wall| wall.blocks(point))
    }

    /// Wall and slice a point maps to, regardless of destruction state.
    pub fn slice_at(&self, point: Vec2) -> Option<(WallId, usize)> {
        self.walls.iter().find_map(|wall| {
            if !wall.coarse.contains(point) {
                return None;
            }
            wall.segment
                .slice_index(point)
                .map(|slice| (wall.segment.id, slice))
        })
    }

    /// Walls that passed validation.
    pub fn segments(&self) -> impl Iterator<Item = &WallSegment> {
        self.walls.iter().map(|wall| &wall.segment)
    }

    /// Number of walls that can block.
    pub fn len(&self) -> usize {
        self.walls.len()
    }

    /// True when no wall can block.
    pub fn is_empty(&self) -> bool {
        self.walls.is_empty()
    }

    /// Number of walls dropped as malformed.
    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    /// Coarse-box expansion in pixels.
    pub fn radius(&self) -> f32 {
        self.radius
    }
}
