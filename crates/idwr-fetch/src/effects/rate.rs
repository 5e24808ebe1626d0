use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between consecutive requests.
///
/// The first [`wait`](RateLimiter::wait) returns immediately; each later call
/// sleeps until the interval since the previous one has elapsed.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last:     Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Allow at most `per_minute` requests per minute (minimum 1).
    pub fn per_minute(per_minute: u32) -> Self {
        Self::with_interval(Duration::from_secs(60) / per_minute.max(1))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration { self.interval }

    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}
