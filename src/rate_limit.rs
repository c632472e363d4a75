//! Fixed-interval write coalescing for stroke growth.
//!
//! DESIGN
//! ======
//! A stroke grows on every accepted pointer move, far faster than it should
//! be written. The coalescer tracks one dirty flag and the time of the last
//! flush; a flush is due when the record is dirty and at least `interval` has
//! passed. Callers always write the latest state, so skipped intermediate
//! states are never lost, only merged.
//!
//! The coalescer has no timer of its own. Callers pass `now` explicitly,
//! which keeps it independent of the transport and deterministic in tests.

use std::time::{Duration, Instant};

use crate::consts::DEFAULT_PUBLISH_INTERVAL_MS;

#[derive(Debug, Clone)]
pub struct Coalescer {
    interval: Duration,
    last_flush: Option<Instant>,
    dirty: bool,
}

impl Coalescer {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_flush: None, dirty: false }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Note that the record changed since the last flush.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether a flush is due at `now`.
    #[must_use]
    pub fn should_flush_at(&self, now: Instant) -> bool {
        self.dirty && self.last_flush.is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Time left until a pending flush becomes due; `None` when nothing is pending.
    #[must_use]
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        if !self.dirty {
            return None;
        }
        let Some(last) = self.last_flush else {
            return Some(Duration::ZERO);
        };
        Some(self.interval.saturating_sub(now.saturating_duration_since(last)))
    }

    /// Record that the latest state was written at `now`.
    pub fn record_flush_at(&mut self, now: Instant) {
        self.last_flush = Some(now);
        self.dirty = false;
    }

    /// Forget all timing state.
    pub fn reset(&mut self) {
        self.last_flush = None;
        self.dirty = false;
    }
}

impl Default for Coalescer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_PUBLISH_INTERVAL_MS))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
