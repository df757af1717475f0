//! Retry-on-transient-failure wrapper around backend calls

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{ConnectorError, Result};

/// Re-invokes a backend call when it fails with a transient error.
///
/// The initial try plus `max_retries` re-attempts, strictly sequential.
/// Attempts are immediate by default; bounded exponential backoff is
/// opt-in via [`with_backoff`](RetryPolicy::with_backoff).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    backoff_multiplier: f64,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::ZERO,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(10),
        }
    }

    /// Sleep between attempts, doubling up to `max`.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `operation`, retrying transient failures up to the bound.
    ///
    /// Non-transient errors propagate on first occurrence. Once all
    /// attempts are spent, the last cause is wrapped in
    /// [`ConnectorError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt > self.max_retries => {
                    return Err(ConnectorError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Transient backend failure, retrying");
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                        backoff = backoff.mul_f64(self.backoff_multiplier).min(self.max_backoff);
                    }
                }
            }
        }
    }
}
