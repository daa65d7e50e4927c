//! Bounded retry with exponential backoff.
//!
//! One combinator shared by catalog reads and correction writes, instead of
//! each call site carrying its own retry loop.

use std::future::Future;
use std::time::Duration;

use crate::transport::TransportError;

/// Retry shape: how many retries after the first attempt, and the base delay
/// that doubles per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
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

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `op`, retrying transport-class failures up to the policy's bound.
///
/// Semantic failures ([`TransportError::Api`], [`TransportError::Malformed`],
/// 4xx statuses) are definitive and returned immediately.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < policy.max_retries && err.is_retryable() => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "retry attempt {} after {:?} delay for error: {}",
                    attempt + 1,
                    delay,
                    err
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
