#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod bounds;
pub mod input;

use serde::{Deserialize, Serialize};

pub use bounds::WorldBounds;
pub use glam::Vec2;
pub use input::{movement_delta, InputState, MovementTuning};

/// Fixed simulation rate of the local tick loop.
pub const TICK_RATE_HZ: u32 = 60;

/// Duration of one fixed tick in seconds.
pub const TICK_DT: f32 = 1.0 / TICK_RATE_HZ as f32;

/// Collision radius of a player entity in world pixels.
pub const ENTITY_RADIUS: f32 = 5.0;

/// Monotonic identifier correlating a local input with the server's acknowledgment.
pub type InputSequence = u32;

/// Fixed tick counter for the local loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    /// First tick of a session.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }

    /// Wall-clock milliseconds elapsed at this tick, assuming the fixed rate.
    pub fn as_millis(self) -> u64 {
        self.0 * 1000 / TICK_RATE_HZ as u64
    }
}

/// True when both components are finite numbers.
pub fn is_finite(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
