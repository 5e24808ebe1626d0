//! I/O operations: the HTTP client seam and everything built on it.

mod cache;
mod fetcher;
mod http;
mod rate;

pub use cache::{CacheEntry, CacheMeta, HttpCache};
pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient, Response, ResponseMeta};
pub use rate::RateLimiter;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
