//! Converts variable frame time into whole fixed ticks.

use arena_core::TICK_DT;

/// Upper bound on ticks run in one frame after a stall.
pub const MAX_CATCHUP_TICKS: u32 = 8;

/// Longest frame time (seconds) accepted into the accumulator.
pub const MAX_FRAME_DT: f32 = 0.25;

/// Fixed-step accumulator; outbound input is limited to one message per tick.
#[derive(Debug, Clone)]
pub struct InputPacer {
    accumulator: f32,
    step: f32,
    max_catchup: u32,
}

impl InputPacer {
    /// Pacer at the simulation tick rate.
    pub fn new() -> Self {
        Self::with_step(TICK_DT, MAX_CATCHUP_TICKS)
    }

    /// Pacer with a custom step and catch-up cap.
    pub fn with_step(step: f32, max_catchup: u32) -> Self {
        Self {
            accumulator: 0.0,
            step: if step > 0.0 { step } else { TICK_DT },
            max_catchup: max_catchup.max(1),
        }
    }

    /// Add a frame's elapsed time and return how many ticks are due.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        let elapsed = if dt.is_finite() {
            dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_catchup {
            self.accumulator -= self.step;
            ticks += 1;
        }

        // Drop any remaining backlog instead of spiralling.
        if ticks == self.max_catchup && self.accumulator >= self.step {
            self.accumulator = 0.0;
        }
        ticks
    }

    /// Fraction of a tick carried into the next frame.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    /// Forget any carried time.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Default for InputPacer {
    fn default() -> Self {
        Self::new()
    }
}
