//! Backoff arithmetic for the attempt loop.

use std::time::Duration;

use rand::Rng;

use crate::ClientOptions;

/// Retry budget and delays derived from [`ClientOptions`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: usize,
    /// Delay before the first retry; doubles on every later one.
    pub base_delay: Duration,
    /// Upper bound of the jitter added to rate-limit delays.
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            base_delay: Duration::from_millis(options.retry_backoff_ms),
            max_jitter: Duration::from_millis(options.max_jitter_ms),
        }
    }

    /// Total number of requests the loop may send.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Whether a retry is still allowed after the zero-based `attempt` failed.
    pub fn can_retry(&self, attempt: usize) -> bool {
        attempt < self.max_retries
    }

    /// `base_delay * 2^attempt`, used after transport failures.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = attempt.min(16) as u32;
        let multiplier = 1u32 << exp;
        self.base_delay.saturating_mul(multiplier)
    }

    /// [`backoff`](Self::backoff) plus uniform jitter in `0..=max_jitter`, used after HTTP 429.
    pub fn rate_limit_backoff(&self, attempt: usize) -> Duration {
        self.backoff(attempt).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}
