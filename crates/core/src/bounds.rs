//! Playable world rectangle.

use crate::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned playable area; positions are clamped into it after collision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(2000.0, 2000.0),
        }
    }
}

impl WorldBounds {
    /// Create bounds from two corners, ordering them per axis.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Clamp a position into the bounds.
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.max(self.min.x).min(self.max.x),
            pos.y.max(self.min.y).min(self.max.y),
        )
    }

    /// Check whether a position lies inside (inclusive).
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }
}
