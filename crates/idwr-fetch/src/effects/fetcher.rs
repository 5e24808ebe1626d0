use std::future::Future;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use idwr_fs::StagedFile;
use idwr_verify::{Hasher, Sha256Hasher};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::{StatusClass, classify_status, retry_delay};
use crate::data::{Downloaded, FetchOptions, Probe};
use crate::effects::http::{BoxStream, HttpClient, ResponseMeta};
use crate::error::{Error, Result};

/// Result of one GET that may be conditional.
pub(crate) enum Transfer {
    Written {
        downloaded: Downloaded,
        meta:       ResponseMeta,
    },
    NotModified,
}

/// Downloads files through an [`HttpClient`] with timeouts, bounded retry
/// and staged placement.
pub struct Fetcher<C: HttpClient> {
    client:  C,
    options: FetchOptions,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C, options: FetchOptions) -> Self { Self { client, options } }

    pub fn client(&self) -> &C { &self.client }

    pub fn options(&self) -> &FetchOptions { &self.options }

    /// Download `url` to `destination`, replacing any existing file.
    ///
    /// The body streams into a staged sibling that is renamed over
    /// `destination` only once the transfer finished, so an interrupted
    /// download never leaves a truncated file under the final name. A 404
    /// yields [`Error::NotFound`] without retrying.
    pub async fn download(&self, url: &str, destination: &Path) -> Result<Downloaded> {
        let transfer = self
            .retrying(url, || {
                self.timed(url, self.transfer(url, &self.options.headers, destination))
            })
            .await?;

        match transfer {
            Transfer::Written { downloaded, .. } => Ok(downloaded),
            Transfer::NotModified => Err(Error::Status {
                url:    url.to_string(),
                status: 304,
            }),
        }
    }

    /// Ask the server whether `url` exists without downloading it.
    pub async fn probe(&self, url: &str) -> Result<Probe> {
        self.retrying(url, || {
            self.timed(url, async {
                let meta = self.client.head(url).await?;
                match classify_status(meta.status) {
                    StatusClass::Success => Ok(Probe::Present {
                        content_length: meta.content_length,
                    }),
                    StatusClass::NotFound => Ok(Probe::Absent),
                    _ => Err(Error::Status {
                        url:    url.to_string(),
                        status: meta.status,
                    }),
                }
            })
        })
        .await
    }

    /// One GET, streamed to `destination` on success.
    pub(crate) async fn transfer(
        &self,
        url: &str,
        headers: &[(String, String)],
        destination: &Path,
    ) -> Result<Transfer> {
        debug!(url, destination = %destination.display(), "GET");
        let response = self.client.get(url, headers).await?;
        let meta = response.meta;

        match classify_status(meta.status) {
            StatusClass::Success => {}
            StatusClass::NotModified => return Ok(Transfer::NotModified),
            StatusClass::NotFound => {
                return Err(Error::NotFound {
                    url: url.to_string(),
                });
            }
            _ => {
                return Err(Error::Status {
                    url:    url.to_string(),
                    status: meta.status,
                });
            }
        }

        let downloaded = write_body(response.body, destination).await?;
        debug!(url, bytes = downloaded.bytes, sha256 = %downloaded.sha256, "download complete");
        Ok(Transfer::Written { downloaded, meta })
    }

    /// Bound a single attempt by the configured timeout.
    pub(crate) async fn timed<T>(&self, url: &str, attempt: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.options.timeout, attempt)
            .await
            .map_err(|_| Error::Timeout {
                url:     url.to_string(),
                timeout: self.options.timeout,
            })?
    }

    /// Re-run `attempt` on transient failures with exponential backoff.
    pub(crate) async fn retrying<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0u32;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && retries < self.options.max_retries => {
                    let delay = retry_delay(retries, self.options.retry_backoff);
                    warn!(
                        url,
                        retry = retries + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient fetch failure; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
                Err(err) if err.is_transient() && retries > 0 => {
                    return Err(Error::RetriesExhausted {
                        url:      url.to_string(),
                        attempts: retries + 1,
                        source:   Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn write_body(mut body: BoxStream<'static, Result<bytes::Bytes>>, destination: &Path) -> Result<Downloaded> {
    if let Some(parent) = destination.parent() {
        idwr_fs::ensure_dir(parent)?;
    }

    let staged = StagedFile::new(destination)?;
    let mut file = tokio::fs::File::create(staged.path())
        .await
        .map_err(|e| io_error(staged.path(), e))?;

    let mut hasher = Sha256Hasher::new();
    let mut bytes = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        hasher.update(&chunk);
        file.write_all(&chunk)
            .await
            .map_err(|e| io_error(staged.path(), e))?;
        bytes += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| io_error(staged.path(), e))?;
    file.sync_all().await.map_err(|e| io_error(staged.path(), e))?;
    drop(file);

    let path: PathBuf = staged.commit()?;
    Ok(Downloaded {
        path,
        bytes,
        sha256: hex::encode(hasher.finalize()),
    })
}
