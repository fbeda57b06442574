//! Raw control state and the movement rule shared by prediction and replay.

use crate::{Vec2, TICK_DT};
use serde::{Deserialize, Serialize};

/// Raw directional control state sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    /// Move toward -y.
    pub up: bool,
    /// Move toward +y.
    pub down: bool,
    /// Move toward -x.
    pub left: bool,
    /// Move toward +x.
    pub right: bool,
    /// Apply the sprint multiplier.
    pub sprint: bool,
}

impl InputState {
    /// No keys held.
    pub const IDLE: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
        sprint: false,
    };

    /// Build an input from signed axis values (`-1`, `0`, `1` after sign).
    pub fn from_axes(move_x: f32, move_y: f32, sprint: bool) -> Self {
        Self {
            up: move_y < 0.0,
            down: move_y > 0.0,
            left: move_x < 0.0,
            right: move_x > 0.0,
            sprint,
        }
    }

    /// Unit direction of travel; zero when no key is held or opposing keys cancel.
    pub fn direction(&self) -> Vec2 {
        let x = axis(self.left, self.right);
        let y = axis(self.up, self.down);
        Vec2::new(x, y).normalize_or_zero()
    }

    /// True when the input produces no movement.
    pub fn is_idle(&self) -> bool {
        self.direction() == Vec2::ZERO
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

/// Speed parameters for local movement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Walking speed in pixels per second.
    pub base_speed: f32,
    /// Multiplier applied while sprinting.
    pub sprint_multiplier: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            base_speed: 200.0,
            sprint_multiplier: 1.5,
        }
    }
}

impl MovementTuning {
    /// Speed multiplier for the given input.
    pub fn multiplier(&self, input: &InputState) -> f32 {
        if input.sprint {
            self.sprint_multiplier
        } else {
            1.0
        }
    }
}

/// Displacement produced by one fixed tick of `input`.
pub fn movement_delta(input: &InputState, tuning: &MovementTuning) -> Vec2 {
    input.direction() * tuning.base_speed * tuning.multiplier(input) * TICK_DT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_has_no_delta() {
        let delta = movement_delta(&InputState::IDLE, &MovementTuning::default());
        assert_eq!(delta, Vec2::ZERO);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let input = InputState {
            left: true,
            right: true,
            ..InputState::IDLE
        };
        assert!(input.is_idle());
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let input = InputState {
            down: true,
            right: true,
            ..InputState::IDLE
        };
        assert!((input.direction().length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sprint_scales_delta() {
        let tuning = MovementTuning::default();
        let walk = InputState::from_axes(1.0, 0.0, false);
        let sprint = InputState::from_axes(1.0, 0.0, true);

        let walk_delta = movement_delta(&walk, &tuning);
        let sprint_delta = movement_delta(&sprint, &tuning);

        assert!((walk_delta.x - tuning.base_speed / 60.0).abs() < 1e-4);
        assert!((sprint_delta.x - walk_delta.x * tuning.sprint_multiplier).abs() < 1e-4);
        assert_eq!(walk_delta.y, 0.0);
    }
}
