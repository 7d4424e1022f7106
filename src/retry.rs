/*!
 * Retry policy shared by the upload and translation paths.
 *
 * Both PartUploader and the translation backends retry transient failures
 * with exponential backoff. The policy is an explicit value injected into
 * the component that retries, so the schedule can be tuned per call site
 * and collapsed to zero delay in tests.
 */

use std::time::Duration;

/// Retry schedule: a fixed attempt budget with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,

    /// Base backoff time in milliseconds for exponential backoff
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// Create a new policy
    pub fn new(max_attempts: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base_ms,
        }
    }

    /// Delay to wait after the n-th failure (0-based): `base * 2^n`
    pub fn delay_for(&self, failure_index: u32) -> Duration {
        // Cap the shift so a large attempt budget cannot overflow the shift
        let shift = failure_index.min(31);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << shift))
    }

    /// Whether another attempt is allowed after `attempts_made` attempts
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1000,
        }
    }
}
