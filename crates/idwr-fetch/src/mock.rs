//! In-memory [`HttpClient`] for tests.
//!
//! Routes are keyed by exact URL. Unknown URLs answer 404, which makes
//! "resource absent" the default and lets tests opt in to every asset they
//! publish. Clones share state, so a test can keep a handle after moving the
//! client into a [`Fetcher`](crate::Fetcher) and inspect the requests made.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use futures_util::stream;

use crate::effects::{HttpClient, Response, ResponseMeta};
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockRequest {
    pub method:  &'static str,
    pub url:     String,
    pub headers: Vec<(String, String)>,
}

#[derive(Clone, Debug)]
enum Route {
    Body { body: Bytes, etag: Option<String> },
    Status(u16),
    Flaky { failures: u32, body: Bytes },
    Stall,
}

#[derive(Debug, Default)]
struct MockState {
    routes:   HashMap<String, Route>,
    requests: Vec<MockRequest>,
}

enum Outcome {
    Respond { status: u16, body: Bytes, etag: Option<String> },
    Fail,
    Stall,
}

#[derive(Clone, Debug, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub fn new() -> Self { Self::default() }

    fn state(&self) -> MutexGuard<'_, MockState> { self.state.lock().unwrap_or_else(|e| e.into_inner()) }

    fn route(&self, url: impl Into<String>, route: Route) -> &Self {
        self.state().routes.insert(url.into(), route);
        self
    }

    /// Answer 200 with `body`.
    pub fn serve(&self, url: impl Into<String>, body: impl Into<Bytes>) -> &Self {
        self.route(url, Route::Body {
            body: body.into(),
            etag: None,
        })
    }

    /// Answer 200 with `body` and an `ETag`; a matching `If-None-Match` gets 304.
    pub fn serve_with_etag(&self, url: impl Into<String>, body: impl Into<Bytes>, etag: impl Into<String>) -> &Self {
        self.route(url, Route::Body {
            body: body.into(),
            etag: Some(etag.into()),
        })
    }

    /// Answer with a bare status code and an empty body.
    pub fn respond_status(&self, url: impl Into<String>, status: u16) -> &Self {
        self.route(url, Route::Status(status))
    }

    /// Fail with a network error `failures` times, then serve `body`.
    pub fn fail_times(&self, url: impl Into<String>, failures: u32, body: impl Into<Bytes>) -> &Self {
        self.route(url, Route::Flaky {
            failures,
            body: body.into(),
        })
    }

    /// Never answer.
    pub fn stall(&self, url: impl Into<String>) -> &Self { self.route(url, Route::Stall) }

    pub fn remove(&self, url: &str) -> &Self {
        self.state().routes.remove(url);
        self
    }

    pub fn requests(&self) -> Vec<MockRequest> { self.state().requests.clone() }

    pub fn requested_urls(&self) -> Vec<String> { self.state().requests.iter().map(|r| r.url.clone()).collect() }

    pub fn request_count(&self) -> usize { self.state().requests.len() }

    pub fn clear_requests(&self) { self.state().requests.clear(); }

    fn record(&self, method: &'static str, url: &str, headers: &[(String, String)]) -> Outcome {
        let mut state = self.state();
        state.requests.push(MockRequest {
            method,
            url: url.to_string(),
            headers: headers.to_vec(),
        });

        let if_none_match = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("if-none-match"))
            .map(|(_, value)| value.clone());

        match state.routes.get_mut(url) {
            None => Outcome::Respond {
                status: 404,
                body:   Bytes::new(),
                etag:   None,
            },
            Some(Route::Body { body, etag }) => {
                let status = match (&if_none_match, etag.as_ref()) {
                    (Some(sent), Some(current)) if sent == current => 304,
                    _ => 200,
                };
                Outcome::Respond {
                    status,
                    body: if status == 304 { Bytes::new() } else { body.clone() },
                    etag: etag.clone(),
                }
            }
            Some(Route::Status(status)) => Outcome::Respond {
                status: *status,
                body:   Bytes::new(),
                etag:   None,
            },
            Some(Route::Flaky { failures, body }) => {
                if *failures > 0 {
                    *failures -= 1;
                    Outcome::Fail
                } else {
                    Outcome::Respond {
                        status: 200,
                        body:   body.clone(),
                        etag:   None,
                    }
                }
            }
            Some(Route::Stall) => Outcome::Stall,
        }
    }
}

fn network_error(url: &str) -> Error {
    Error::Network {
        url:     url.to_string(),
        message: "connection reset by mock".to_string(),
    }
}

impl HttpClient for MockClient {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<Response> {
        match self.record("GET", url, headers) {
            Outcome::Respond { status, body, etag } => {
                let meta = ResponseMeta {
                    status,
                    etag,
                    last_modified: None,
                    content_length: Some(body.len() as u64),
                };
                let chunks: Vec<Result<Bytes>> = if body.is_empty() { Vec::new() } else { vec![Ok(body)] };
                Ok(Response {
                    meta,
                    body: Box::pin(stream::iter(chunks)),
                })
            }
            Outcome::Fail => Err(network_error(url)),
            Outcome::Stall => std::future::pending::<Result<Response>>().await,
        }
    }

    async fn head(&self, url: &str) -> Result<ResponseMeta> {
        match self.record("HEAD", url, &[]) {
            Outcome::Respond { status, body, etag } => Ok(ResponseMeta {
                status,
                etag,
                last_modified: None,
                content_length: Some(body.len() as u64),
            }),
            Outcome::Fail => Err(network_error(url)),
            Outcome::Stall => std::future::pending::<Result<ResponseMeta>>().await,
        }
    }
}
