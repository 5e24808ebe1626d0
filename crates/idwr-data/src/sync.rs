//! Download and verify the assets named by a manifest.

use std::path::Path;

use idwr_archive::{ExtractOptions, extract_zip};
use idwr_fetch::{Downloaded, Fetcher, HttpClient};
use idwr_verify::{digest_file, digest_matches};
use tracing::{debug, info};

use crate::datasets::expected_file_names;
use crate::error::{Error, Result};
use crate::manifest::{CurrentManifest, LegacyManifest, Manifest, safe_relative};

/// One verified file placed in the data directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncedFile {
    pub name:   String,
    pub sha256: String,
}

/// Populate `dir` from `manifest`, downloading from `base_url`.
pub async fn sync<C: HttpClient>(
    fetcher: &Fetcher<C>,
    base_url: &str,
    dir: &Path,
    manifest: &Manifest,
) -> Result<Vec<SyncedFile>> {
    match manifest {
        Manifest::Current(current) => sync_current(fetcher, base_url, dir, current).await,
        Manifest::Legacy(legacy) => sync_legacy(fetcher, base_url, dir, legacy).await,
    }
}

/// Download each expected dataset listed as a parquet table, in sorted
/// order, checking digest then size.
pub async fn sync_current<C: HttpClient>(
    fetcher: &Fetcher<C>,
    base_url: &str,
    dir: &Path,
    manifest: &CurrentManifest,
) -> Result<Vec<SyncedFile>> {
    let tables = manifest.parquet_tables();
    let expected = expected_file_names();

    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !tables.contains_key(*name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingDatasetInManifest { names: missing });
    }

    let mut synced = Vec::with_capacity(expected.len());
    for name in expected {
        let entry = tables[name];
        let downloaded = download_asset(fetcher, base_url, dir, name).await?;

        if !digest_matches(&downloaded.sha256, &entry.sha256) {
            return Err(Error::ChecksumMismatch {
                file:     name.to_string(),
                expected: entry.sha256.clone(),
                actual:   downloaded.sha256,
            });
        }
        if downloaded.bytes != entry.size_bytes {
            return Err(Error::SizeMismatch {
                file:     name.to_string(),
                expected: entry.size_bytes,
                actual:   downloaded.bytes,
            });
        }

        debug!(file = name, bytes = downloaded.bytes, "verified");
        synced.push(SyncedFile {
            name:   name.to_string(),
            sha256: downloaded.sha256,
        });
    }
    Ok(synced)
}

/// Download the release archive, check its digest, unpack it into `dir`
/// and check the digest of every file the manifest lists.
pub async fn sync_legacy<C: HttpClient>(
    fetcher: &Fetcher<C>,
    base_url: &str,
    dir: &Path,
    manifest: &LegacyManifest,
) -> Result<Vec<SyncedFile>> {
    safe_relative(&manifest.archive)?;
    let archive = download_asset(fetcher, base_url, dir, &manifest.archive).await?;

    if !digest_matches(&archive.sha256, &manifest.archive_sha256) {
        return Err(Error::ArchiveChecksumMismatch {
            archive:  manifest.archive.clone(),
            expected: manifest.archive_sha256.clone(),
            actual:   archive.sha256,
        });
    }

    let report = extract_zip(&archive.path, dir, &ExtractOptions::default())?;
    info!("extracted {} entries ({} bytes) from {}", report.entry_count, report.total_bytes, manifest.archive);

    let mut synced = Vec::with_capacity(manifest.files.len());
    for (name, entry) in &manifest.files {
        let path = dir.join(safe_relative(name)?);
        if !path.is_file() {
            return Err(Error::MissingExtractedFile { file: name.clone() });
        }

        let actual = digest_file(&path)?;
        if !digest_matches(&actual, &entry.sha256) {
            return Err(Error::ChecksumMismatch {
                file:     name.clone(),
                expected: entry.sha256.clone(),
                actual,
            });
        }

        debug!(file = %name, "verified");
        synced.push(SyncedFile {
            name:   name.clone(),
            sha256: actual,
        });
    }
    Ok(synced)
}

async fn download_asset<C: HttpClient>(
    fetcher: &Fetcher<C>,
    base_url: &str,
    dir: &Path,
    name: &str,
) -> Result<Downloaded> {
    let url = format!("{base_url}/{name}");
    fetcher
        .download(&url, &dir.join(name))
        .await
        .map_err(|source| Error::AssetDownload { url, source })
}
