//! Plain data types shared by the fetch operations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for HTTP fetching operations.
///
/// # Examples
///
/// ```
/// use idwr_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .timeout(Duration::from_secs(30))
///     .max_retries(5)
///     .retry_backoff(Duration::from_millis(200))
///     .header("Accept", "application/octet-stream");
/// assert_eq!(options.max_retries, 5);
/// ```
#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Upper bound on a single attempt, connection through last body byte.
    ///
    /// Default: 60s
    pub timeout: Duration,

    /// Retries after the initial attempt for transient failures.
    ///
    /// - Network errors, timeouts, 5xx and 429 are retried
    /// - 404 and other 4xx are returned immediately
    /// - Total attempts = 1 + max_retries
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Base delay for exponential backoff; retry N waits `retry_backoff * 2^N`.
    ///
    /// Default: 250ms
    pub retry_backoff: Duration,

    /// Sent as the `User-Agent` header by clients that honour it.
    pub user_agent: String,

    /// Extra headers sent with every request.
    pub headers: Arc<[(String, String)]>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout:       Duration::from_secs(60),
            max_retries:   3,
            retry_backoff: Duration::from_millis(250),
            user_agent:    concat!("idwr/", env!("CARGO_PKG_VERSION")).to_string(),
            headers:       Arc::new([]),
        }
    }
}

impl FetchOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers = self.headers.to_vec();
        headers.push((name.into(), value.into()));
        self.headers = headers.into();
        self
    }
}

/// A file placed at its destination by a completed download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Downloaded {
    pub path:   PathBuf,
    pub bytes:  u64,
    /// Lowercase hex SHA-256 of the bytes written.
    pub sha256: String,
}

/// Outcome of an existence probe.
///
/// Only a definitive answer from the server becomes [`Probe::Absent`]; a
/// request that failed is an `Err`, never a negative probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    Present { content_length: Option<u64> },
    Absent,
}

impl Probe {
    /// Present with a known, non-zero body.
    pub fn has_content(&self) -> bool {
        matches!(self, Probe::Present { content_length: Some(n) } if *n > 0)
    }
}
