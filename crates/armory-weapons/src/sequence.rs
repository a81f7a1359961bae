//! Timed sequences.
//!
//! Long-running weapon operations (reload, burst spacing, charge hold, scope
//! blend, timed abilities) are plain state advanced once per tick against the
//! frame clock. A [`SequenceSlot`] holds at most one in-flight sequence;
//! cancelling only clears the slot, so any compensation is up to the owner.

use serde::{Deserialize, Serialize};

/// A span of time that started at a known instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedSequence {
    started_at: f32,
    duration: f32,
}

impl TimedSequence {
    /// Creates a sequence starting at `now`. Negative durations become zero.
    #[must_use]
    pub fn new(now: f32, duration: f32) -> Self {
        Self {
            started_at: now,
            duration: duration.max(0.0),
        }
    }

    /// When the sequence started.
    #[must_use]
    pub const fn started_at(&self) -> f32 {
        self.started_at
    }

    /// Nominal length.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// When the sequence completes.
    #[must_use]
    pub fn finishes_at(&self) -> f32 {
        self.started_at + self.duration
    }

    /// Seconds since the start, never negative.
    #[must_use]
    pub fn elapsed(&self, now: f32) -> f32 {
        (now - self.started_at).max(0.0)
    }

    /// Normalized progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, now: f32) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed(now) / self.duration).min(1.0)
    }

    /// Whether `now` has reached the end.
    #[must_use]
    pub fn is_complete(&self, now: f32) -> bool {
        now >= self.finishes_at()
    }
}

/// Holder for the single in-flight sequence of one module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceSlot {
    current: Option<TimedSequence>,
}

impl SequenceSlot {
    /// Creates an empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Starts a sequence, returning the one it replaced (if any).
    pub fn start(&mut self, now: f32, duration: f32) -> Option<TimedSequence> {
        self.current.replace(TimedSequence::new(now, duration))
    }

    /// Cancels the in-flight sequence. Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Whether a sequence is in flight.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// The in-flight sequence.
    #[must_use]
    pub const fn get(&self) -> Option<&TimedSequence> {
        self.current.as_ref()
    }

    /// Removes and returns the sequence if it has completed by `now`.
    pub fn take_if_complete(&mut self, now: f32) -> Option<TimedSequence> {
        if self.current.is_some_and(|seq| seq.is_complete(now)) {
            self.current.take()
        } else {
            None
        }
    }

    /// Progress of the in-flight sequence, or `None` when idle.
    #[must_use]
    pub fn progress(&self, now: f32) -> Option<f32> {
        self.current.map(|seq| seq.progress(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_progress() {
        let seq = TimedSequence::new(1.0, 2.0);
        assert_eq!(seq.progress(1.0), 0.0);
        assert_eq!(seq.progress(2.0), 0.5);
        assert_eq!(seq.progress(5.0), 1.0);
        assert!(!seq.is_complete(2.5));
        assert!(seq.is_complete(3.0));
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let seq = TimedSequence::new(4.0, 0.0);
        assert!(seq.is_complete(4.0));
        assert_eq!(seq.progress(4.0), 1.0);
    }

    #[test]
    fn test_slot_start_replaces_running() {
        let mut slot = SequenceSlot::new();
        assert!(slot.start(0.0, 1.0).is_none());
        let replaced = slot.start(0.5, 1.0);
        assert_eq!(replaced.map(|s| s.started_at()), Some(0.0));
        assert_eq!(slot.get().map(|s| s.started_at()), Some(0.5));
    }

    #[test]
    fn test_slot_take_if_complete() {
        let mut slot = SequenceSlot::new();
        slot.start(0.0, 1.0);
        assert!(slot.take_if_complete(0.5).is_none());
        assert!(slot.is_running());
        assert!(slot.take_if_complete(1.0).is_some());
        assert!(!slot.is_running());
    }

    #[test]
    fn test_slot_cancel() {
        let mut slot = SequenceSlot::new();
        assert!(!slot.cancel());
        slot.start(0.0, 3.0);
        assert!(slot.cancel());
        assert!(slot.progress(1.0).is_none());
    }
}
