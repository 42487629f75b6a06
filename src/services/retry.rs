//! Retry with exponential backoff
//!
//! Only transient failures (`Connection`, `Timeout`) are retried; every other
//! kind is returned after the first attempt.

use crate::utils::error::{AppResult, OllamaError};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Wait before retry number `attempt` (0-based): `base_delay * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Attempts actually made; a zero budget still runs the operation once
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Run `operation` under this policy
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<OllamaError>,
    {
        retry_operation(operation, self).await
    }
}

/// Execute an operation, retrying transient failures with exponential backoff
///
/// Success short-circuits. When the last attempt fails its error is returned
/// as is, details included.
pub async fn retry_operation<T, E, F, Fut>(mut operation: F, policy: &RetryPolicy) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<OllamaError>,
{
    let attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        let error: OllamaError = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e.into(),
        };

        if !error.is_retryable() {
            debug!("Not retrying {} error: {}", error.kind, error.message);
            return Err(error);
        }

        if attempt + 1 >= attempts {
            warn!("Giving up after {} attempts: {}", attempts, error);
            return Err(error);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "Attempt {}/{} failed, retrying in {:?}: {}",
            attempt + 1,
            attempts,
            delay,
            error
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay_for(64), Duration::from_secs(u32::MAX as u64));

        let huge = RetryPolicy::new(100, Duration::MAX);
        assert_eq!(huge.delay_for(3), Duration::MAX);
    }

    #[test]
    fn test_zero_budget_still_attempts_once() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
    }
}
