//! Sliding movement resolution via axis separation.
//!
//! The X-only candidate is always tried before the Y-only candidate. Prediction
//! and replay both go through [`simulate_step`], so the same input from the same
//! start position against the same snapshot always lands on the same position.

use crate::walls::WallCollisionModel;
use arena_core::{movement_delta, InputState, MovementTuning, WorldBounds};
use glam::Vec2;

/// Which candidate position [`resolve_with_outcome`] settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Desired position was free.
    Free,
    /// Kept the x component only (sliding along a horizontal surface).
    SlideX,
    /// Kept the y component only (sliding along a vertical surface).
    SlideY,
    /// Every candidate was blocked; no movement.
    Blocked,
}

/// Resolve a move from `current` toward `desired`.
pub fn resolve(current: Vec2, desired: Vec2, model: &WallCollisionModel) -> Vec2 {
    resolve_with_outcome(current, desired, model).0
}

/// Resolve a move and report which candidate was taken.
pub fn resolve_with_outcome(
    current: Vec2,
    desired: Vec2,
    model: &WallCollisionModel,
) -> (Vec2, ResolveOutcome) {
    if !model.is_blocked(desired) {
        return (desired, ResolveOutcome::Free);
    }

    let x_only = Vec2::new(desired.x, current.y);
    if !model.is_blocked(x_only) {
        return (x_only, ResolveOutcome::SlideX);
    }

    let y_only = Vec2::new(current.x, desired.y);
    if !model.is_blocked(y_only) {
        return (y_only, ResolveOutcome::SlideY);
    }

    (current, ResolveOutcome::Blocked)
}

/// Apply one fixed tick of `input`: move, resolve against walls, clamp to bounds.
pub fn simulate_step(
    current: Vec2,
    input: &InputState,
    tuning: &MovementTuning,
    bounds: &WorldBounds,
    model: &WallCollisionModel,
) -> Vec2 {
    let desired = current + movement_delta(input, tuning);
    bounds.clamp(resolve(current, desired, model))
}
