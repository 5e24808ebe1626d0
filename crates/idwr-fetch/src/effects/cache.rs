use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use idwr_fs::{AtomicWriteOptions, atomic_write};
use idwr_verify::Sha256Hasher;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::effects::fetcher::{Fetcher, Transfer};
use crate::effects::http::HttpClient;
use crate::effects::rate::RateLimiter;
use crate::error::{Error, Result};

/// Validators remembered for a cached URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    #[serde(default)]
    pub etag:          Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    pub url:           String,
}

/// Body and sidecar paths of one cached URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub path:      PathBuf,
    pub meta_path: PathBuf,
}

/// Disk cache for ad hoc downloads, keyed by the SHA-256 of the URL.
#[derive(Clone, Debug)]
pub struct HttpCache {
    root: PathBuf,
}

impl HttpCache {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        idwr_fs::ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn entry(&self, url: &str) -> CacheEntry {
        let key = Sha256Hasher::hex_digest(url.as_bytes());
        CacheEntry {
            path:      self.root.join(&key),
            meta_path: self.root.join(format!("{key}.json")),
        }
    }

    pub fn read_meta(&self, url: &str) -> Result<Option<CacheMeta>> {
        let entry = self.entry(url);
        match std::fs::read(&entry.meta_path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| Error::CacheMeta {
                    url: url.to_string(),
                    source,
                }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Io {
                path: entry.meta_path,
                source,
            }),
        }
    }

    pub fn write_meta(&self, url: &str, meta: &CacheMeta) -> Result<()> {
        let entry = self.entry(url);
        let bytes = serde_json::to_vec_pretty(meta).map_err(|source| Error::CacheMeta {
            url: url.to_string(),
            source,
        })?;
        atomic_write(&entry.meta_path, &bytes, AtomicWriteOptions::new())?;
        Ok(())
    }
}

fn conditional_headers(base: &[(String, String)], meta: Option<&CacheMeta>) -> Vec<(String, String)> {
    let mut headers = base.to_vec();
    if let Some(meta) = meta {
        if let Some(etag) = meta.etag.as_deref().filter(|v| !v.is_empty()) {
            headers.push(("If-None-Match".to_string(), etag.to_string()));
        }
        if let Some(modified) = meta.last_modified.as_deref().filter(|v| !v.is_empty()) {
            headers.push(("If-Modified-Since".to_string(), modified.to_string()));
        }
    }
    headers
}

/// Last path segment of `url`, used as the local file name.
fn file_name_of(url: &str) -> Result<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name),
        _ => Err(Error::InvalidUrl(url.to_string())),
    }
}

impl<C: HttpClient> Fetcher<C> {
    /// Fetch `url` through `cache`, revalidating with `If-None-Match` /
    /// `If-Modified-Since` when a cached body exists.
    pub async fn cached_get(&self, cache: &HttpCache, url: &str) -> Result<PathBuf> {
        let entry = cache.entry(url);
        let known = cache.read_meta(url)?.filter(|_| entry.path.exists());
        let headers = conditional_headers(&self.options().headers, known.as_ref());

        let transfer = self
            .retrying(url, || self.timed(url, self.transfer(url, &headers, &entry.path)))
            .await?;

        let meta = match transfer {
            Transfer::Written { meta, .. } => meta,
            Transfer::NotModified if entry.path.exists() => {
                debug!(url, "not modified; serving cached body");
                return Ok(entry.path);
            }
            Transfer::NotModified => {
                let retry = self
                    .retrying(url, || {
                        self.timed(url, self.transfer(url, &self.options().headers, &entry.path))
                    })
                    .await?;
                match retry {
                    Transfer::Written { meta, .. } => meta,
                    Transfer::NotModified => {
                        return Err(Error::Status {
                            url:    url.to_string(),
                            status: 304,
                        });
                    }
                }
            }
        };

        cache.write_meta(url, &CacheMeta {
            etag:          meta.etag,
            last_modified: meta.last_modified,
            url:           url.to_string(),
        })?;
        Ok(entry.path)
    }

    /// Fetch every URL through `cache`, spaced by `limiter`, and copy each
    /// body into `dest_dir` under the URL's last path segment.
    pub async fn download_all(
        &self,
        cache: &HttpCache,
        limiter: &RateLimiter,
        urls: &[String],
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        idwr_fs::ensure_dir(dest_dir)?;
        let mut placed = Vec::with_capacity(urls.len());
        for url in urls {
            let name = file_name_of(url)?;
            limiter.wait().await;
            let cached = self.cached_get(cache, url).await?;
            let dest = dest_dir.join(name);
            tokio::fs::copy(&cached, &dest)
                .await
                .map_err(|source| Error::Io {
                    path: dest.clone(),
                    source,
                })?;
            placed.push(dest);
        }
        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_is_stable_per_url() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HttpCache::new(dir.path()).unwrap();

        let a = cache.entry("https://example.invalid/a.csv");
        let b = cache.entry("https://example.invalid/b.csv");
        assert_eq!(a, cache.entry("https://example.invalid/a.csv"));
        assert_ne!(a.path, b.path);
        assert_eq!(a.meta_path.extension().unwrap(), "json");
    }

    #[test]
    fn test_meta_roundtrip_and_absence() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HttpCache::new(dir.path()).unwrap();
        let url = "https://example.invalid/a.csv";

        assert_eq!(cache.read_meta(url).unwrap(), None);
        let meta = CacheMeta {
            etag:          Some("\"abc\"".into()),
            last_modified: None,
            url:           url.into(),
        };
        cache.write_meta(url, &meta).unwrap();
        assert_eq!(cache.read_meta(url).unwrap(), Some(meta));
    }

    #[test]
    fn test_conditional_headers_skip_empty_validators() {
        let meta = CacheMeta {
            etag:          Some(String::new()),
            last_modified: Some("Wed, 01 Jan 2025 00:00:00 GMT".into()),
            url:           "u".into(),
        };
        let headers = conditional_headers(&[], Some(&meta));
        assert_eq!(headers, vec![(
            "If-Modified-Since".to_string(),
            "Wed, 01 Jan 2025 00:00:00 GMT".to_string()
        )]);
    }

    #[test]
    fn test_file_name_of() {
        assert_eq!(file_name_of("https://h/x/2024/01/zensu01.csv").unwrap(), "zensu01.csv");
        assert_eq!(file_name_of("https://h/x/a.csv?download=1").unwrap(), "a.csv");
        assert!(file_name_of("https://h/x/").is_err());
    }
}
