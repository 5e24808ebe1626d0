//! Versioned local cache of the jp-idwr-db release assets.
//!
//! [`DataCache::ensure_data`] resolves a [`DataVersion`], and unless the
//! version directory already carries a completion marker, fetches the
//! release manifest, downloads every asset it lists, verifies each one and
//! only then marks the directory ready. Two manifest schemas are understood:
//! the per-table [`CurrentManifest`] and the archive based [`LegacyManifest`].
//!
//! # Architecture
//!
//! - [`config`] - Layered [`Settings`] (defaults, TOML file, environment)
//! - [`version`] - Data version resolution
//! - [`manifest`] - Manifest model, validation and fetching
//! - [`sync`] - Per-schema asset synchronization
//! - [`cache`] - The cache coordinator and inspection
//! - [`datasets`] - The six canonical datasets
//! - [`sources`] - URL rules for the historical upstream files

pub mod cache;
pub mod config;
pub mod datasets;
pub mod manifest;
pub mod sources;
pub mod sync;
pub mod version;

mod error;

pub use cache::{COMPLETE_MARKER, CacheStatus, DataCache, FileCheck, FileOutcome, VerifyReport};
pub use config::Settings;
pub use datasets::Dataset;
pub use error::{Error, Result};
pub use manifest::{CurrentManifest, LegacyFileEntry, LegacyManifest, Manifest, ManifestKind, TableEntry};
pub use version::DataVersion;
