//! In-process authoritative server stand-in.
//!
//! Applies the exact movement, resolve, and clamp rules the client predicts
//! with, after a configurable delay, and answers with JSON snapshots.

use anyhow::{Context, Result};
use arena_core::{InputSequence, Tick, Vec2};
use arena_net::{decode_input_frame, InputMessage, PredictionConfig, ServerSnapshot, SnapshotShape};
use arena_physics::{simulate_step, WallCollisionModel};
use std::collections::VecDeque;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
enum ShapeMode {
    Fixed(SnapshotShape),
    Rotating(usize),
}

/// Deterministic authoritative server for a single player.
#[derive(Debug, Clone)]
pub struct MirrorServer {
    config: PredictionConfig,
    position: Vec2,
    last_processed: InputSequence,
    latency_ticks: u64,
    pending: VecDeque<(Tick, InputMessage)>,
    tick: Tick,
    shape: ShapeMode,
    dirty: bool,
}

impl MirrorServer {
    /// Server with the player at `spawn` and no latency.
    pub fn new(config: PredictionConfig, spawn: Vec2) -> Self {
        let position = config.bounds.clamp(spawn);
        Self {
            config,
            position,
            last_processed: 0,
            latency_ticks: 0,
            pending: VecDeque::new(),
            tick: Tick::ZERO,
            shape: ShapeMode::Fixed(SnapshotShape::Transform),
            dirty: false,
        }
    }

    /// Delay, in server ticks, between receiving an input and applying it.
    pub fn with_latency(mut self, ticks: u64) -> Self {
        self.latency_ticks = ticks;
        self
    }

    /// Emit every snapshot in `shape`.
    pub fn with_shape(mut self, shape: SnapshotShape) -> Self {
        self.shape = ShapeMode::Fixed(shape);
        self
    }

    /// Cycle through every accepted snapshot shape.
    pub fn rotating_shapes(mut self) -> Self {
        self.shape = ShapeMode::Rotating(0);
        self
    }

    /// Queue an input for processing after the configured latency.
    pub fn receive(&mut self, message: InputMessage) {
        let due = self.tick.advance(self.latency_ticks);
        self.pending.push_back((due, message));
    }

    /// Decode and queue a postcard input frame.
    pub fn receive_frame(&mut self, frame: &[u8]) -> Result<()> {
        let message = decode_input_frame(frame).context("Mirror server rejected input frame")?;
        self.receive(message);
        Ok(())
    }

    /// Apply every due input against `walls`, then advance one tick.
    ///
    /// Returns a snapshot payload when state changed this tick.
    pub fn tick(&mut self, walls: &WallCollisionModel) -> Option<String> {
        while let Some((due, _)) = self.pending.front() {
            if *due > self.tick {
                break;
            }
            let Some((_, message)) = self.pending.pop_front() else {
                break;
            };
            if message.sequence <= self.last_processed {
                debug!(sequence = message.sequence, "duplicate input dropped");
                continue;
            }
            self.position = simulate_step(
                self.position,
                &message.input,
                &self.config.tuning,
                &self.config.bounds,
                walls,
            );
            self.last_processed = message.sequence;
            self.dirty = true;
        }

        self.tick = self.tick.advance(1);
        if !self.dirty {
            return None;
        }
        self.dirty = false;

        let payload = self.snapshot().to_json(self.next_shape()).to_string();
        trace!(tick = self.tick.0, %payload, "mirror snapshot");
        Some(payload)
    }

    /// Current authoritative snapshot.
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            position: self.position,
            last_processed_input: self.last_processed,
        }
    }

    /// Move the player to `position` without input (respawn, knockback).
    pub fn teleport(&mut self, position: Vec2) {
        self.position = self.config.bounds.clamp(position);
        self.dirty = true;
    }

    /// Offset the player by a small server-side correction.
    pub fn nudge(&mut self, offset: Vec2) {
        self.teleport(self.position + offset);
    }

    /// Authoritative position.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Highest processed sequence.
    pub fn last_processed(&self) -> InputSequence {
        self.last_processed
    }

    /// Inputs waiting for their latency to elapse.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn next_shape(&mut self) -> SnapshotShape {
        match &mut self.shape {
            ShapeMode::Fixed(shape) => *shape,
            ShapeMode::Rotating(index) => {
                let shape = SnapshotShape::ALL[*index % SnapshotShape::ALL.len()];
                *index += 1;
                shape
            }
        }
    }
}
