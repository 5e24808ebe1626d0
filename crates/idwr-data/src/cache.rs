//! The cache coordinator.
//!
//! Layout: `<cache_root>/data/<version>/` holds the six dataset files, the
//! manifest they were verified against, and the [`COMPLETE_MARKER`]. The
//! marker is written last and only after every dataset verified, so its
//! presence is the single signal that a directory can be trusted.

use std::path::{Path, PathBuf};

use idwr_fetch::{Fetcher, HttpClient};
use idwr_fs::{AtomicWriteOptions, atomic_write};
use idwr_verify::{digest_file, digest_matches};
use tracing::{debug, info};

use crate::config::Settings;
use crate::datasets::{Dataset, expected_file_names};
use crate::error::{Error, Result};
use crate::manifest::{Manifest, ManifestKind, fetch_manifest, safe_relative};
use crate::sync::sync;
use crate::version::DataVersion;

pub const COMPLETE_MARKER: &str = ".complete";

const DATA_DIR: &str = "data";

/// Snapshot of one version directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStatus {
    pub version:  DataVersion,
    pub dir:      PathBuf,
    pub complete: bool,
    pub present:  Vec<Dataset>,
    pub missing:  Vec<Dataset>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileOutcome {
    Ok,
    Missing,
    ChecksumMismatch { expected: String, actual: String },
    SizeMismatch { expected: u64, actual: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileCheck {
    pub name:    String,
    pub outcome: FileOutcome,
}

/// Result of re-hashing a cached version against its stored manifest.
#[derive(Clone, Debug)]
pub struct VerifyReport {
    pub version:  DataVersion,
    pub dir:      PathBuf,
    pub manifest: ManifestKind,
    pub files:    Vec<FileCheck>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool { self.files.iter().all(|f| f.outcome == FileOutcome::Ok) }
}

pub struct DataCache<C: HttpClient> {
    settings: Settings,
    root:     PathBuf,
    fetcher:  Fetcher<C>,
}

#[cfg(feature = "reqwest")]
impl DataCache<idwr_fetch::ReqwestClient> {
    /// A cache that downloads over HTTPS with the settings' fetch options.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client = idwr_fetch::ReqwestClient::new(&settings.fetch_options())?;
        Self::new(settings, client)
    }
}

impl<C: HttpClient> DataCache<C> {
    pub fn new(settings: Settings, client: C) -> Result<Self> {
        let root = settings.cache_root()?;
        let fetcher = Fetcher::new(client, settings.fetch_options());
        Ok(Self {
            settings,
            root,
            fetcher,
        })
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn root(&self) -> &Path { &self.root }

    pub fn fetcher(&self) -> &Fetcher<C> { &self.fetcher }

    pub fn resolve_version(&self, version: Option<&str>) -> DataVersion {
        DataVersion::resolve(version, self.settings.data_version.as_deref())
    }

    /// `<cache_root>/data/<version>`.
    pub fn data_dir(&self, version: &DataVersion) -> Result<PathBuf> {
        Ok(self.root.join(DATA_DIR).join(version.checked()?))
    }

    /// Make sure every dataset of `version` is present and verified, and
    /// return the directory holding them.
    ///
    /// A directory with the completion marker is returned without touching
    /// the network. `force` deletes the directory and rebuilds it. Any error
    /// leaves the marker absent, so a later call starts over.
    pub async fn ensure_data(&self, version: Option<&str>, force: bool) -> Result<PathBuf> {
        let version = self.resolve_version(version);
        let dir = self.data_dir(&version)?;
        let marker = dir.join(COMPLETE_MARKER);

        if !force && marker.is_file() {
            debug!(dir = %dir.display(), "data cache hit");
            return Ok(dir);
        }

        if force && idwr_fs::remove_dir_all_if_exists(&dir)? {
            debug!(dir = %dir.display(), "removed previous cache");
        }
        idwr_fs::ensure_dir(&dir)?;

        let action = if force { "Refreshing" } else { "Building" };
        info!("{action} local data cache for {version} at {}", dir.display());

        let base_url = self.settings.base_url(&version);
        let (manifest_path, kind) = fetch_manifest(&self.fetcher, &base_url, &dir).await?;
        let manifest = Manifest::load(&manifest_path, kind)?;
        let synced = sync(&self.fetcher, &base_url, &dir, &manifest).await?;
        debug!(files = synced.len(), manifest = %kind, "sync finished");

        let missing = missing_datasets(&dir);
        if !missing.is_empty() {
            return Err(Error::MissingExpectedDatasets { names: missing });
        }

        atomic_write(&marker, b"", AtomicWriteOptions::new().sync(true))?;
        info!("Data cache ready");
        Ok(dir)
    }

    /// Path of one dataset file, populating the cache first if needed.
    pub async fn dataset_path(&self, dataset: Dataset, version: Option<&str>, force: bool) -> Result<PathBuf> {
        let dir = self.ensure_data(version, force).await?;
        Ok(dir.join(dataset.file_name()))
    }

    pub fn status(&self, version: Option<&str>) -> Result<CacheStatus> {
        let version = self.resolve_version(version);
        let dir = self.data_dir(&version)?;
        Ok(status_of(version, dir))
    }

    /// Status of every version directory, sorted by version label.
    pub fn list(&self) -> Result<Vec<CacheStatus>> {
        let data_root = self.root.join(DATA_DIR);
        let entries = match std::fs::read_dir(&data_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(Error::Io {
                    path: data_root,
                    source,
                });
            }
        };

        let mut statuses = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::Io {
                path: data_root.clone(),
                source,
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            statuses.push(status_of(DataVersion::new(name), entry.path()));
        }
        statuses.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(statuses)
    }

    /// Re-hash the cached files of `version` against the manifest stored
    /// beside them. Never touches the network.
    pub fn verify(&self, version: Option<&str>) -> Result<VerifyReport> {
        let version = self.resolve_version(version);
        let dir = self.data_dir(&version)?;

        let kind = [ManifestKind::Current, ManifestKind::Legacy]
            .into_iter()
            .find(|kind| dir.join(kind.file_name()).is_file())
            .ok_or_else(|| Error::NoStoredManifest { dir: dir.clone() })?;
        let manifest = Manifest::load(&dir.join(kind.file_name()), kind)?;

        let files = match &manifest {
            Manifest::Current(current) => {
                let tables = current.parquet_tables();
                let mut files = Vec::new();
                for name in expected_file_names() {
                    let outcome = match tables.get(name) {
                        Some(entry) => check_file(&dir.join(name), &entry.sha256, Some(entry.size_bytes))?,
                        None => FileOutcome::Missing,
                    };
                    files.push(FileCheck {
                        name: name.to_string(),
                        outcome,
                    });
                }
                files
            }
            Manifest::Legacy(legacy) => {
                let mut files = Vec::new();
                for (name, entry) in &legacy.files {
                    let path = dir.join(safe_relative(name)?);
                    files.push(FileCheck {
                        name:    name.clone(),
                        outcome: check_file(&path, &entry.sha256, None)?,
                    });
                }
                files
            }
        };

        Ok(VerifyReport {
            version,
            dir,
            manifest: kind,
            files,
        })
    }
}

fn status_of(version: DataVersion, dir: PathBuf) -> CacheStatus {
    let (present, missing): (Vec<Dataset>, Vec<Dataset>) = Dataset::ALL
        .into_iter()
        .partition(|d| dir.join(d.file_name()).is_file());
    CacheStatus {
        complete: dir.join(COMPLETE_MARKER).is_file(),
        version,
        dir,
        present,
        missing,
    }
}

fn missing_datasets(dir: &Path) -> Vec<String> {
    expected_file_names()
        .into_iter()
        .filter(|name| !dir.join(name).is_file())
        .map(str::to_string)
        .collect()
}

fn check_file(path: &Path, sha256: &str, size: Option<u64>) -> Result<FileOutcome> {
    if !path.is_file() {
        return Ok(FileOutcome::Missing);
    }

    let actual = digest_file(path)?;
    if !digest_matches(&actual, sha256) {
        return Ok(FileOutcome::ChecksumMismatch {
            expected: sha256.to_string(),
            actual,
        });
    }

    if let Some(expected) = size {
        let actual = std::fs::metadata(path)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if actual != expected {
            return Ok(FileOutcome::SizeMismatch { expected, actual });
        }
    }
    Ok(FileOutcome::Ok)
}
