//! Self-imposed request pacing.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval pacing state owned by one transport instance.
///
/// This is blind pacing to stay under the remote's rate limit, not adaptive
/// backoff: each request start is spaced at least `min_interval` after the
/// previous one on the same store.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Pacer allowing roughly `rps` requests per second.
    pub fn from_requests_per_second(rps: u32) -> Self {
        let rps = rps.max(1);
        Self::new(Duration::from_millis(1_000 / u64::from(rps)))
    }

    /// Wait until the next request may start, then claim the slot.
    ///
    /// The lock is held across the sleep on purpose: concurrent callers on the
    /// same store queue up behind it, which is exactly the serialization the
    /// rate limit needs.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
