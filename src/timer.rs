//! Fixed-rate repaint timer.
//!
//! Counts whole periods between calls so the needle keeps its speed even when
//! the display refreshes slower than the update rate.

use std::time::{Duration, Instant};

/// Upper bound on the periods replayed after a stall (window drag, suspend).
pub const MAX_CATCH_UP: u32 = 200;

/// Longest period the timer keeps; longer requests are shortened to this.
pub const MAX_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct FixedRate {
    period: Duration,
    next: Instant,
}

impl FixedRate {
    /// The first period is due immediately.
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period: period.clamp(Duration::from_millis(1), MAX_PERIOD),
            next: now,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    /// Number of periods that fell due up to `now`.
    pub fn due(&mut self, now: Instant) -> u32 {
        if now < self.next {
            return 0;
        }
        let behind = now.duration_since(self.next);
        let periods = behind.as_nanos() / self.period.as_nanos() + 1;
        if periods > u128::from(MAX_CATCH_UP) {
            self.next = now.checked_add(self.period).unwrap_or(now);
            return MAX_CATCH_UP;
        }
        // periods <= MAX_CATCH_UP, so the conversion is lossless
        let periods = periods as u32;
        self.next = self
            .next
            .checked_add(self.period * periods)
            .unwrap_or(now);
        periods
    }
}
