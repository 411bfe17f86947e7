//! Bounded retry with exponential backoff for shard requests.

use std::future::Future;
use std::time::Duration;

use super::TransportError;

/// How often and how patiently a failed shard request is re-sent.
///
/// Only [`TransportError::is_retryable`] errors are retried; a shard that
/// answered with an error fails on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. `0` is treated as `1`.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each one after.
    pub backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(25),
            max_backoff: Duration::from_secs(1),
        }
    }
}

/// A request that failed on every attempt it was allowed.
#[derive(Debug, Clone, PartialEq)]
pub struct Exhausted {
    pub attempts: u32,
    pub error: TransportError,
}

impl RetryPolicy {
    /// Delay after the failed attempt number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.backoff.saturating_mul(factor).min(self.max_backoff)
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, Exhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.delay(attempt);
                    crate::debug!("retry"; "attempt {} failed: {}, waiting {:?}", attempt + 1, error, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(Exhausted {
                        attempts: attempt + 1,
                        error,
                    });
                }
            }
        }
    }
}
