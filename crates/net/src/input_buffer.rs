//! Sequence-ordered record of locally applied inputs awaiting acknowledgment.
//!
//! The producer assigns strictly increasing sequence numbers; the buffer keeps
//! insertion order and does not re-sort. Replay correctness relies on that order.

use arena_core::{InputSequence, InputState, Vec2};
use std::collections::VecDeque;
use tracing::debug;

/// Default window: two seconds of input at 60 Hz.
pub const DEFAULT_INPUT_CAPACITY: usize = 120;

/// One applied input and the position prediction produced for it.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSnapshot {
    /// Sequence number sent to the server with this input.
    pub sequence: InputSequence,
    /// Raw control state.
    pub input: InputState,
    /// Client clock when the input was applied.
    pub timestamp_ms: u64,
    /// Predicted position after applying this input; rewritten during replay.
    pub predicted_position: Vec2,
    /// Set once the server reports having processed this sequence.
    pub acknowledged: bool,
}

impl InputSnapshot {
    /// New, unacknowledged snapshot.
    pub fn new(
        sequence: InputSequence,
        input: InputState,
        timestamp_ms: u64,
        predicted_position: Vec2,
    ) -> Self {
        Self {
            sequence,
            input,
            timestamp_ms,
            predicted_position,
            acknowledged: false,
        }
    }
}

/// Bounded FIFO of unacknowledged inputs.
#[derive(Debug, Clone)]
pub struct InputSnapshotBuffer {
    entries: VecDeque<InputSnapshot>,
    capacity: usize,
    dropped: u64,
}

impl InputSnapshotBuffer {
    /// Create a buffer with the default window.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INPUT_CAPACITY)
    }

    /// Create a buffer holding at most `capacity` entries (minimum one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append a snapshot, evicting the oldest entry when the window is full.
    ///
    /// Returns the evicted entry, if any. Evicted inputs are never replayed.
    pub fn push(&mut self, snapshot: InputSnapshot) -> Option<InputSnapshot> {
        self.entries.push_back(snapshot);
        if self.entries.len() <= self.capacity {
            return None;
        }

        let evicted = self.entries.pop_front();
        if let Some(old) = &evicted {
            self.dropped += 1;
            debug!(
                sequence = old.sequence,
                capacity = self.capacity,
                "input window full, dropping oldest unacknowledged input"
            );
        }
        evicted
    }

    /// Remove every entry with `sequence <= ack`, returning them marked acknowledged.
    pub fn prune_up_to(&mut self, ack: InputSequence) -> Vec<InputSnapshot> {
        let (acked, pending): (VecDeque<_>, VecDeque<_>) = self
            .entries
            .drain(..)
            .partition(|entry| entry.sequence <= ack);
        self.entries = pending;

        acked
            .into_iter()
            .map(|mut entry| {
                entry.acknowledged = true;
                entry
            })
            .collect()
    }

    /// Oldest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = &InputSnapshot> {
        self.entries.iter()
    }

    /// Oldest-first mutable iteration, used by replay.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InputSnapshot> {
        self.entries.iter_mut()
    }

    /// Oldest buffered entry.
    pub fn oldest(&self) -> Option<&InputSnapshot> {
        self.entries.front()
    }

    /// Newest buffered entry.
    pub fn latest(&self) -> Option<&InputSnapshot> {
        self.entries.back()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing awaits acknowledgment.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total entries evicted by overflow since creation.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

impl Default for InputSnapshotBuffer {
    fn default() -> Self {
        Self::new()
    }
}
