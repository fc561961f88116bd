//! Retry backoff policies.

use std::fmt;
use std::time::Duration;

/// Initial backoff delay for retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Maximum backoff delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Computes the wait before the next attempt.
///
/// Implementations must be monotonically non-decreasing in `attempt`.
pub trait Backoff: Send + Sync + fmt::Debug {
    /// Delay to wait after failed attempt number `attempt`, counting from 1.
    fn delay(&self, attempt: u32) -> Duration;
}

/// Doubling backoff: `initial`, `2 * initial`, `4 * initial`, ... capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
}

impl ExponentialBackoff {
    /// Create a policy. `max` is raised to `initial` if smaller.
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF)
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.initial.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}
