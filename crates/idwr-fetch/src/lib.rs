//! HTTP downloading with retry, staged placement and conditional caching.
//!
//! # Architecture
//!
//! - [`data`] - Options and plain result types
//! - [`core`] - Pure helpers (backoff, status classification)
//! - [`effects`] - I/O: the [`HttpClient`] seam, [`Fetcher`], disk cache, rate limiting
//! - `mock` - In-memory [`HttpClient`] for tests, behind the `mock` feature
//!
//! # Key Features
//!
//! - **Staged placement**: bodies stream into a sibling file that is renamed
//!   over the destination only after the transfer completes
//! - **Single pass hashing**: the SHA-256 of every download is computed while
//!   streaming
//! - **Explicit absence**: a 404 is [`Error::NotFound`] and a probe returns
//!   [`Probe::Absent`]; transport failures stay errors
//! - **Bounded retry**: transient failures back off exponentially, see [`retry_delay`]

pub mod core;
pub mod data;
pub mod effects;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

mod error;

pub use crate::core::{StatusClass, classify_status, retry_delay};
pub use data::{Downloaded, FetchOptions, Probe};
pub use effects::{BoxStream, CacheEntry, CacheMeta, Fetcher, HttpCache, HttpClient, RateLimiter, Response, ResponseMeta};
pub use error::{Error, Result};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
