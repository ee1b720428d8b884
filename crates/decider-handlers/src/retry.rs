//! Retry policy for the optimistic append loop.

use std::num::NonZeroU32;
use std::time::Duration;

use rand::Rng;

/// Default ceiling of the first backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1);

/// Default ceiling of any backoff.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(50);

/// Caps the exponent so the delay computation cannot overflow.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// How many times a handler re-decides after losing an append race, and how
/// long it waits in between.
///
/// Delays use full jitter: a random duration between zero and
/// `min(max_delay, base_delay * 2^(attempt - 1))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of append attempts, `None` for no limit.
    pub max_attempts: Option<NonZeroU32>,
    /// Ceiling of the first backoff. Zero disables backoff.
    pub base_delay: Duration,
    /// Ceiling of any backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Retries forever without waiting.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            max_attempts: None,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Limits the number of append attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: NonZeroU32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Sets the backoff bounds.
    #[must_use]
    pub fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Whether `attempts` appends used up the allowed attempts.
    #[must_use]
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts
            .is_some_and(|max_attempts| attempts >= max_attempts.get())
    }

    /// Jittered delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        let ceiling = self
            .base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay);
        let ceiling = u64::try_from(ceiling.as_micros()).unwrap_or(u64::MAX);
        Duration::from_micros(rand::rng().random_range(0..=ceiling))
    }
}
