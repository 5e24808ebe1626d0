use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

use crate::error::Result;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Status line and the caching headers of a response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status:         u16,
    pub etag:           Option<String>,
    pub last_modified:  Option<String>,
    pub content_length: Option<u64>,
}

/// A response whose body has not been read yet.
pub struct Response {
    pub meta: ResponseMeta,
    pub body: BoxStream<'static, Result<Bytes>>,
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects and report every status they receive;
/// interpreting the status is left to [`Fetcher`](crate::Fetcher). An `Err`
/// means the request itself failed (DNS, connection, TLS, body transfer).
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - `MockClient` (behind the `mock` feature): in-memory routes for tests
pub trait HttpClient: Send + Sync {
    /// Issue a GET and return the response with a streaming body.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Issue a HEAD and return the response metadata.
    fn head(&self, url: &str) -> impl Future<Output = Result<ResponseMeta>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;
    use reqwest::header::{ETAG, LAST_MODIFIED};

    use super::*;
    use crate::data::FetchOptions;
    use crate::error::Error;

    /// Production HTTP client implementation using reqwest.
    #[derive(Clone, Debug)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Build a client honouring the timeout and user agent in `options`.
        pub fn new(options: &FetchOptions) -> Result<Self> {
            let client = reqwest::Client::builder()
                .user_agent(options.user_agent.clone())
                .connect_timeout(options.timeout)
                .build()
                .map_err(|e| Error::Client(e.to_string()))?;
            Ok(Self { client })
        }
    }

    fn map_error(url: &str, err: reqwest::Error) -> Error {
        Error::Network {
            url:     url.to_string(),
            message: err.to_string(),
        }
    }

    fn meta_of(response: &reqwest::Response) -> ResponseMeta {
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        ResponseMeta {
            status:         response.status().as_u16(),
            etag:           header(ETAG),
            last_modified:  header(LAST_MODIFIED),
            content_length: response.content_length(),
        }
    }

    impl HttpClient for ReqwestClient {
        async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<Response> {
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request.send().await.map_err(|e| map_error(url, e))?;
            let meta = meta_of(&response);
            let owned_url = url.to_string();
            let body = response
                .bytes_stream()
                .map(move |chunk| chunk.map_err(|e| map_error(&owned_url, e)));

            Ok(Response {
                meta,
                body: Box::pin(body),
            })
        }

        async fn head(&self, url: &str) -> Result<ResponseMeta> {
            let response = self
                .client
                .head(url)
                .send()
                .await
                .map_err(|e| map_error(url, e))?;
            Ok(meta_of(&response))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
