//! Visual correction layer between predicted and rendered position.
//!
//! The correction is a render-only offset from the predicted position. Small
//! errors decay by a fixed fraction per tick; large errors snap at once, since
//! easing a big jump over several frames reads as rubber-banding.

use arena_core::{Vec2, TICK_DT};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Errors larger than this (pixels) snap instead of smoothing.
pub const DEFAULT_SNAP_THRESHOLD: f32 = 20.0;

/// Fraction of the remaining offset removed per second.
pub const DEFAULT_CORRECTION_SPEED: f32 = 10.0;

/// Per-axis offset (pixels) below which a correction is considered finished.
pub const DEFAULT_CORRECTION_EPSILON: f32 = 0.1;

/// Tuning for [`SmoothingCorrector`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Error magnitude above which corrections snap.
    pub snap_threshold: f32,
    /// Decay rate; each tick removes `correction_speed * TICK_DT` of the offset.
    pub correction_speed: f32,
    /// Per-axis offset treated as converged.
    pub epsilon: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            correction_speed: DEFAULT_CORRECTION_SPEED,
            epsilon: DEFAULT_CORRECTION_EPSILON,
        }
    }
}

/// Current correction state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Render position equals predicted position.
    Idle,
    /// Render position is `predicted + remaining`.
    Smoothing {
        /// Offset still to be absorbed.
        remaining: Vec2,
    },
}

/// How a correction request was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// Render already matched the target closely enough.
    None,
    /// Error is being absorbed over subsequent ticks.
    Smoothed,
    /// Error exceeded the threshold; render jumped to the target.
    Snapped,
}

/// Converts render/predicted divergence into a bounded-rate correction.
#[derive(Debug, Clone)]
pub struct SmoothingCorrector {
    config: SmoothingConfig,
    correction: Correction,
}

impl SmoothingCorrector {
    /// Create a corrector with no active correction.
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            correction: Correction::Idle,
        }
    }

    /// Start correcting from `render` toward `target`, or snap if the gap is too large.
    pub fn correct(&mut self, render: Vec2, target: Vec2) -> CorrectionKind {
        let error = render - target;
        let magnitude = error.length();

        if magnitude > self.config.snap_threshold {
            debug!(
                error = magnitude,
                threshold = self.config.snap_threshold,
                "prediction error above snap threshold, snapping"
            );
            self.correction = Correction::Idle;
            return CorrectionKind::Snapped;
        }

        if self.is_settled(error) {
            self.correction = Correction::Idle;
            return CorrectionKind::None;
        }

        self.correction = Correction::Smoothing { remaining: error };
        CorrectionKind::Smoothed
    }

    /// Decay the active correction by one tick and return the render position.
    pub fn advance(&mut self, target: Vec2) -> Vec2 {
        let Correction::Smoothing { remaining } = self.correction else {
            return target;
        };

        let keep = 1.0 - (self.config.correction_speed * TICK_DT).clamp(0.0, 1.0);
        let next = remaining * keep;
        if self.is_settled(next) {
            self.correction = Correction::Idle;
            target
        } else {
            self.correction = Correction::Smoothing { remaining: next };
            target + next
        }
    }

    /// Render position for `target` without advancing the correction.
    pub fn render_position(&self, target: Vec2) -> Vec2 {
        match self.correction {
            Correction::Idle => target,
            Correction::Smoothing { remaining } => target + remaining,
        }
    }

    /// Current correction state.
    pub fn correction(&self) -> Correction {
        self.correction
    }

    /// Offset still to be absorbed, if any.
    pub fn remaining(&self) -> Option<Vec2> {
        match self.correction {
            Correction::Idle => None,
            Correction::Smoothing { remaining } => Some(remaining),
        }
    }

    /// True while a correction is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.correction, Correction::Smoothing { .. })
    }

    /// Drop any active correction.
    pub fn clear(&mut self) {
        self.correction = Correction::Idle;
    }

    /// Active configuration.
    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    fn is_settled(&self, offset: Vec2) -> bool {
        offset.x.abs() < self.config.epsilon && offset.y.abs() < self.config.epsilon
    }
}

impl Default for SmoothingCorrector {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_error_snaps() {
        let mut smoother = SmoothingCorrector::default();
        let target = Vec2::new(100.0, 100.0);

        let kind = smoother.correct(Vec2::new(130.0, 100.0), target);

        assert_eq!(kind, CorrectionKind::Snapped);
        assert!(!smoother.is_active());
        assert_eq!(smoother.render_position(target), target);
    }

    #[test]
    fn test_small_error_smooths_without_jump() {
        let mut smoother = SmoothingCorrector::default();
        let render = Vec2::new(110.0, 100.0);
        let target = Vec2::new(100.0, 100.0);

        assert_eq!(smoother.correct(render, target), CorrectionKind::Smoothed);
        assert_eq!(smoother.render_position(target), render);
        assert_eq!(smoother.remaining(), Some(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn test_correction_decays_to_idle() {
        let mut smoother = SmoothingCorrector::default();
        let target = Vec2::new(100.0, 100.0);
        smoother.correct(Vec2::new(110.0, 95.0), target);

        let mut previous = smoother.remaining().unwrap().length();
        let mut ticks = 0;
        while smoother.is_active() && ticks < 120 {
            smoother.advance(target);
            if let Some(remaining) = smoother.remaining() {
                assert!(remaining.length() < previous);
                previous = remaining.length();
            }
            ticks += 1;
        }

        assert!(!smoother.is_active());
        assert!(ticks < 60);
        assert_eq!(smoother.advance(target), target);
    }

    #[test]
    fn test_decay_rate_is_speed_times_dt() {
        let mut smoother = SmoothingCorrector::default();
        smoother.correct(Vec2::new(12.0, 0.0), Vec2::ZERO);

        let render = smoother.advance(Vec2::ZERO);
        let expected = 12.0 * (1.0 - DEFAULT_CORRECTION_SPEED * TICK_DT);
        assert!((render.x - expected).abs() < 1e-4);
    }

    #[test]
    fn test_tiny_error_is_ignored() {
        let mut smoother = SmoothingCorrector::default();
        let kind = smoother.correct(Vec2::new(0.05, -0.05), Vec2::ZERO);

        assert_eq!(kind, CorrectionKind::None);
        assert_eq!(smoother.correction(), Correction::Idle);
    }

    #[test]
    fn test_error_at_threshold_still_smooths() {
        let mut smoother = SmoothingCorrector::default();
        let kind = smoother.correct(Vec2::new(DEFAULT_SNAP_THRESHOLD, 0.0), Vec2::ZERO);
        assert_eq!(kind, CorrectionKind::Smoothed);
    }

    #[test]
    fn test_render_follows_moving_target() {
        let mut smoother = SmoothingCorrector::default();
        smoother.correct(Vec2::new(5.0, 0.0), Vec2::ZERO);

        let render = smoother.advance(Vec2::new(50.0, 0.0));
        assert!(render.x > 50.0 && render.x < 55.0);
    }
}
