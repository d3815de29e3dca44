//! Bounded exponential backoff for enrichment retries.

use std::time::Duration;

/// `max_retries` retries follow the first attempt; retry `n` (0-based) waits
/// `base * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max_retries: u32) -> Self {
        Self { base, max_retries }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before retry `retry`. Saturates instead of overflowing.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }

    /// The full schedule, one entry per retry.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(move |retry| self.delay_for(retry))
    }

    /// Sum of every delay, i.e. the minimum time before a final failure.
    pub fn total_delay(&self) -> Duration {
        self.schedule().fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), 5)
    }
}
