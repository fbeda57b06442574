#![warn(missing_docs)]
//! Collision primitives: destructible walls and sliding movement resolution.

pub mod resolver;
pub mod walls;

use glam::Vec2;

pub use resolver::{resolve, resolve_with_outcome, simulate_step, ResolveOutcome};
pub use walls::{
    WallCollisionModel, WallDataError, WallId, WallOrientation, WallSegment, PILLAR_BAND_HEIGHT,
    PILLAR_SIZE, SLICE_COUNT,
};

/// Axis-aligned rectangle in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Minimum corner (top-left).
    pub min: Vec2,
    /// Maximum corner (bottom-right).
    pub max: Vec2,
}

impl Rect {
    /// Create a new rectangle ensuring min <= max per axis.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        debug_assert!(min.x <= max.x && min.y <= max.y);
        Self { min, max }
    }

    /// Rectangle from a top-left origin and a size.
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::new(origin, origin + size)
    }

    /// Grow the rectangle outward by `margin` on all four sides.
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            max: self.max + Vec2::splat(margin),
        }
    }

    /// Inclusive point containment.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Rectangle spanning two arbitrary corners, in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Width and height.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}
