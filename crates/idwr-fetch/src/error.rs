//! Error types for idwr-fetch.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found (HTTP 404): {url}")]
    NotFound { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("request timed out after {timeout:?}: {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("giving up on {url} after {attempts} attempts")]
    RetriesExhausted {
        url:      String,
        attempts: u32,
        #[source]
        source:   Box<Error>,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("cache metadata for {url} is unreadable: {source}")]
    CacheMeta {
        url:    String,
        source: serde_json::Error,
    },

    #[error("I/O error on '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Fs(#[from] idwr_fs::Error),
}

impl Error {
    /// Whether the remote confirmed the resource does not exist.
    pub fn is_not_found(&self) -> bool { matches!(self, Error::NotFound { .. }) }

    /// Whether retrying the same request may succeed.
    ///
    /// Network failures, timeouts, 5xx and 429 are transient; a 404 or any
    /// other 4xx is a definitive answer from the server.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network { .. } | Error::Timeout { .. } | Error::RetriesExhausted { .. } => true,
            Error::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound { .. } => Some(404),
            Error::Status { status, .. } => Some(*status),
            Error::RetriesExhausted { source, .. } => source.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> Error {
        Error::Status {
            url: "https://example.invalid/a".into(),
            status,
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(403).is_transient());
        assert!(!Error::NotFound { url: "u".into() }.is_transient());
        assert!(
            Error::Network {
                url:     "u".into(),
                message: "reset".into(),
            }
            .is_transient()
        );
    }

    #[test]
    fn test_status_through_retries_exhausted() {
        let err = Error::RetriesExhausted {
            url:      "u".into(),
            attempts: 4,
            source:   Box::new(status(502)),
        };
        assert_eq!(err.status(), Some(502));
        assert!(!err.is_not_found());
    }
}
