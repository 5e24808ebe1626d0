//! Release manifests.
//!
//! A release publishes either a current-schema `manifest.json` listing every
//! table with its own checksum and size, or, for releases made before the
//! schema change, a legacy manifest describing one zip archive. Documents
//! are checked structurally on the raw JSON first so that every missing key
//! is reported at once, then decoded into [`Manifest`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use idwr_fetch::{Fetcher, HttpClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const CURRENT_MANIFEST: &str = "manifest.json";
pub const LEGACY_MANIFEST: &str = "jp_idwr_db-manifest.json";
pub const LEGACY_ARCHIVE: &str = "jp_idwr_db-parquet.zip";

const CURRENT_KEYS: [&str; 9] = [
    "spec_version",
    "dataset_id",
    "data_version",
    "release_tag",
    "published_at",
    "license",
    "homepage",
    "assets_base_url",
    "tables",
];
const TABLE_KEYS: [&str; 5] = ["name", "file", "format", "size_bytes", "sha256"];
const LEGACY_KEYS: [&str; 3] = ["archive", "archive_sha256", "files"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    Current,
    Legacy,
}

impl ManifestKind {
    pub fn file_name(self) -> &'static str {
        match self {
            ManifestKind::Current => CURRENT_MANIFEST,
            ManifestKind::Legacy => LEGACY_MANIFEST,
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ManifestKind::Current => "current",
            ManifestKind::Legacy => "legacy",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurrentManifest {
    pub spec_version:    Value,
    pub dataset_id:      String,
    pub data_version:    String,
    pub release_tag:     String,
    pub published_at:    String,
    pub license:         String,
    pub homepage:        String,
    pub assets_base_url: String,
    pub tables:          Vec<TableEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name:       String,
    pub file:       String,
    pub format:     String,
    pub size_bytes: u64,
    pub sha256:     String,
    #[serde(default)]
    pub schema:     Value,
    #[serde(default)]
    pub stats:      Value,
}

impl CurrentManifest {
    /// Parquet tables keyed by file name; later duplicates win.
    pub fn parquet_tables(&self) -> BTreeMap<&str, &TableEntry> {
        self.tables
            .iter()
            .filter(|t| t.format == "parquet")
            .map(|t| (t.file.as_str(), t))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyManifest {
    pub archive:        String,
    pub archive_sha256: String,
    pub files:          BTreeMap<String, LegacyFileEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegacyFileEntry {
    pub sha256:     String,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

/// A decoded manifest of either schema.
#[derive(Clone, Debug, PartialEq)]
pub enum Manifest {
    Current(CurrentManifest),
    Legacy(LegacyManifest),
}

impl Manifest {
    pub fn kind(&self) -> ManifestKind {
        match self {
            Manifest::Current(_) => ManifestKind::Current,
            Manifest::Legacy(_) => ManifestKind::Legacy,
        }
    }

    /// Validate `value` as a `kind` manifest and decode it.
    pub fn classify(kind: ManifestKind, value: Value) -> Result<Self> {
        let problems = match kind {
            ManifestKind::Current => validate_current(&value),
            ManifestKind::Legacy => validate_legacy(&value),
        };
        if !problems.is_empty() {
            return Err(Error::ManifestStructure { kind, problems });
        }

        let decoded = match kind {
            ManifestKind::Current => serde_json::from_value(value).map(Manifest::Current),
            ManifestKind::Legacy => serde_json::from_value(value).map(Manifest::Legacy),
        };
        decoded.map_err(|e| Error::ManifestStructure {
            kind,
            problems: vec![e.to_string()],
        })
    }

    /// Read, validate and decode the manifest stored at `path`.
    pub fn load(path: &Path, kind: ManifestKind) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value = serde_json::from_str(&text).map_err(|source| Error::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::classify(kind, value)
    }
}

/// Structural problems of a current-schema document; empty when valid.
pub fn validate_current(value: &Value) -> Vec<String> {
    let Some(object) = value.as_object() else {
        return vec!["manifest must be a JSON object".to_string()];
    };

    let mut problems = missing_keys(object, &CURRENT_KEYS, "");
    match object.get("tables") {
        None => {}
        Some(Value::Array(tables)) if !tables.is_empty() => {
            for (index, table) in tables.iter().enumerate() {
                match table.as_object() {
                    Some(entry) => problems.extend(missing_keys(entry, &TABLE_KEYS, &format!("tables[{index}]."))),
                    None => problems.push(format!("tables[{index}] must be an object")),
                }
            }
        }
        Some(_) => problems.push("'tables' must be a non-empty list".to_string()),
    }
    problems
}

/// Structural problems of a legacy document; empty when valid.
pub fn validate_legacy(value: &Value) -> Vec<String> {
    let Some(object) = value.as_object() else {
        return vec!["manifest must be a JSON object".to_string()];
    };

    let mut problems = missing_keys(object, &LEGACY_KEYS, "");
    match object.get("files") {
        None => {}
        Some(Value::Object(files)) if !files.is_empty() => {}
        Some(_) => problems.push("'files' must be a non-empty object".to_string()),
    }
    problems
}

fn missing_keys(object: &serde_json::Map<String, Value>, required: &[&str], prefix: &str) -> Vec<String> {
    let mut missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect();
    missing.sort_unstable();
    missing
        .into_iter()
        .map(|key| format!("missing key '{prefix}{key}'"))
        .collect()
}

/// Download the release manifest into `dest_dir`.
///
/// The current schema is tried first; the legacy manifest is requested only
/// when the server answers 404. Any other failure is returned as
/// [`Error::ManifestFetch`].
pub async fn fetch_manifest<C: HttpClient>(
    fetcher: &Fetcher<C>,
    base_url: &str,
    dest_dir: &Path,
) -> Result<(PathBuf, ManifestKind)> {
    let url = format!("{base_url}/{CURRENT_MANIFEST}");
    match fetcher.download(&url, &dest_dir.join(CURRENT_MANIFEST)).await {
        Ok(downloaded) => return Ok((downloaded.path, ManifestKind::Current)),
        Err(err) if err.is_not_found() => {
            debug!(url, "current manifest absent");
        }
        Err(source) => return Err(Error::ManifestFetch { url, source }),
    }

    let url = format!("{base_url}/{LEGACY_MANIFEST}");
    info!("falling back to legacy manifest {url}");
    let downloaded = fetcher
        .download(&url, &dest_dir.join(LEGACY_MANIFEST))
        .await
        .map_err(|source| Error::ManifestFetch { url, source })?;
    Ok((downloaded.path, ManifestKind::Legacy))
}

/// `name` as a relative path that stays inside its directory.
pub(crate) fn safe_relative(name: &str) -> Result<&Path> {
    let path = Path::new(name);
    let plain = !name.is_empty()
        && !name.contains('\\')
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(Error::UnsafeFileName { name: name.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn current() -> Value {
        json!({
            "spec_version": "1.0.0",
            "dataset_id": "jp_idwr_db",
            "data_version": "test",
            "release_tag": "v-test",
            "published_at": "2025-01-01T00:00:00Z",
            "license": "GPL-3.0-or-later",
            "homepage": "https://example.invalid",
            "assets_base_url": "https://example.invalid/download/v-test",
            "tables": [{
                "name": "bullet",
                "file": "bullet.parquet",
                "format": "parquet",
                "size_bytes": 1,
                "sha256": "00",
                "schema": [],
                "stats": {"rows": 1}
            }]
        })
    }

    #[test]
    fn current_manifest_classifies() {
        let manifest = Manifest::classify(ManifestKind::Current, current()).unwrap();
        let Manifest::Current(manifest) = manifest else {
            panic!("expected current manifest");
        };
        assert_eq!(manifest.tables.len(), 1);
        assert!(manifest.parquet_tables().contains_key("bullet.parquet"));
    }

    #[test]
    fn current_validation_names_every_missing_key() {
        let mut value = current();
        let object = value.as_object_mut().unwrap();
        object.remove("license");
        object.remove("homepage");
        object["tables"][0].as_object_mut().unwrap().remove("sha256");

        let problems = validate_current(&value);
        assert_eq!(problems, vec![
            "missing key 'homepage'".to_string(),
            "missing key 'license'".to_string(),
            "missing key 'tables[0].sha256'".to_string(),
        ]);
    }

    #[test]
    fn current_validation_rejects_empty_tables() {
        let mut value = current();
        value["tables"] = json!([]);
        assert_eq!(validate_current(&value), vec!["'tables' must be a non-empty list".to_string()]);

        value["tables"] = json!(["bullet.parquet"]);
        assert_eq!(validate_current(&value), vec!["tables[0] must be an object".to_string()]);
    }

    #[test]
    fn legacy_validation() {
        let valid = json!({
            "archive": LEGACY_ARCHIVE,
            "archive_sha256": "ab",
            "files": {"bullet.parquet": {"sha256": "cd", "size_bytes": 1}}
        });
        assert!(validate_legacy(&valid).is_empty());
        assert!(matches!(
            Manifest::classify(ManifestKind::Legacy, valid).unwrap(),
            Manifest::Legacy(_)
        ));

        let problems = validate_legacy(&json!({"archive": "a.zip", "files": {}}));
        assert_eq!(problems, vec![
            "missing key 'archive_sha256'".to_string(),
            "'files' must be a non-empty object".to_string(),
        ]);
    }

    #[test]
    fn wrong_field_types_are_structure_errors() {
        let mut value = current();
        value["tables"][0]["size_bytes"] = json!("one");
        let err = Manifest::classify(ManifestKind::Current, value).unwrap_err();
        assert!(matches!(err, Error::ManifestStructure { kind: ManifestKind::Current, .. }));
    }

    #[test]
    fn safe_relative_names() {
        assert!(safe_relative("bullet.parquet").is_ok());
        assert!(safe_relative("sub/bullet.parquet").is_ok());
        for name in ["", "../x", "/etc/passwd", "a/../../b", "a\\b", "./x"] {
            assert!(safe_relative(name).is_err(), "{name}");
        }
    }
}
