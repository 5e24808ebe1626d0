use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::manifest::ManifestKind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to fetch manifest {url}")]
    ManifestFetch {
        url:    String,
        #[source]
        source: idwr_fetch::Error,
    },

    #[error("manifest '{path}' is not valid JSON")]
    ManifestParse {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind} manifest: {}", problems.join("; "))]
    ManifestStructure {
        kind:     ManifestKind,
        problems: Vec<String>,
    },

    #[error("archive checksum mismatch for {archive}: expected {expected}, got {actual}")]
    ArchiveChecksumMismatch {
        archive:  String,
        expected: String,
        actual:   String,
    },

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file:     String,
        expected: String,
        actual:   String,
    },

    #[error("size mismatch for {file}: expected {expected} bytes, got {actual}")]
    SizeMismatch { file: String, expected: u64, actual: u64 },

    #[error("missing extracted data file: {file}")]
    MissingExtractedFile { file: String },

    #[error("missing required parquet datasets in manifest: {}", names.join(", "))]
    MissingDatasetInManifest { names: Vec<String> },

    #[error("missing required datasets in cache: {}", names.join(", "))]
    MissingExpectedDatasets { names: Vec<String> },

    #[error("no stored manifest in '{dir}'; download the data first")]
    NoStoredManifest { dir: PathBuf },

    #[error("failed to download {url}")]
    AssetDownload {
        url:    String,
        #[source]
        source: idwr_fetch::Error,
    },

    #[error(transparent)]
    Fetch(#[from] idwr_fetch::Error),

    #[error(transparent)]
    Extract(#[from] idwr_archive::Error),

    #[error(transparent)]
    Hash(#[from] idwr_verify::VerifyError),

    #[error(transparent)]
    Fs(#[from] idwr_fs::Error),

    #[error("I/O error on '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid configuration: {0}")]
    Config(Box<figment::Error>),

    #[error("configuration file '{0}' does not exist")]
    ConfigNotFound(PathBuf),

    #[error("no cache directory could be determined; set JPINFECT_CACHE_DIR")]
    NoCacheRoot,

    #[error("refusing unsafe file name '{name}'")]
    UnsafeFileName { name: String },

    #[error("unknown dataset '{name}'")]
    UnknownDataset { name: String },

    #[error("invalid year {year}: {reason}")]
    InvalidYear { year: u16, reason: &'static str },

    #[error("week must be between 1 and 53")]
    InvalidWeek,

    #[error("no URL rule for year {year} and kind {kind}")]
    NoUrlRule { year: u16, kind: &'static str },
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self { Error::Config(Box::new(err)) }
}

pub type Result<T> = std::result::Result<T, Error>;
