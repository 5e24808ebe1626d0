use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Label of one data release, e.g. `v0.3.1`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataVersion(String);

impl DataVersion {
    pub fn new(label: impl Into<String>) -> Self { Self(label.into()) }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Pick the version for one call.
    ///
    /// Order: `explicit`, then `configured` (settings or environment), then
    /// the version of this package. Empty strings count as absent.
    pub fn resolve(explicit: Option<&str>, configured: Option<&str>) -> Self {
        fn given(v: Option<&str>) -> Option<&str> { v.map(str::trim).filter(|v| !v.is_empty()) }

        given(explicit)
            .or_else(|| given(configured))
            .map(Self::new)
            .unwrap_or_else(|| Self::from_package(Some(env!("CARGO_PKG_VERSION"))))
    }

    /// `v`-prefixed package version, `v0.0.0` when unknown.
    pub fn from_package(version: Option<&str>) -> Self {
        let version = version.filter(|v| !v.is_empty()).unwrap_or("0.0.0");
        if version.starts_with('v') {
            Self::new(version)
        } else {
            Self(format!("v{version}"))
        }
    }

    /// Reject labels that are not a single plain directory name.
    pub(crate) fn checked(&self) -> Result<&str> {
        let mut components = Path::new(&self.0).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !self.0.contains(['/', '\\']) => Ok(&self.0),
            _ => Err(Error::UnsafeFileName { name: self.0.clone() }),
        }
    }
}

impl fmt::Display for DataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_beats_configured() {
        assert_eq!(DataVersion::resolve(Some("v1"), Some("v2")).as_str(), "v1");
        assert_eq!(DataVersion::resolve(None, Some("v2")).as_str(), "v2");
    }

    #[test]
    fn blank_explicit_defers_to_configured() {
        assert_eq!(DataVersion::resolve(Some(""), Some("v2")).as_str(), "v2");
        assert_eq!(DataVersion::resolve(Some("  "), Some(" v2 ")).as_str(), "v2");
        assert_eq!(DataVersion::resolve(Some(""), Some("")).as_str(), concat!("v", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn falls_back_to_package_version() {
        let resolved = DataVersion::resolve(None, None);
        assert_eq!(resolved.as_str(), concat!("v", env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn package_version_prefix() {
        assert_eq!(DataVersion::from_package(Some("0.3.1")).as_str(), "v0.3.1");
        assert_eq!(DataVersion::from_package(Some("v0.3.1")).as_str(), "v0.3.1");
        assert_eq!(DataVersion::from_package(None).as_str(), "v0.0.0");
    }

    #[test]
    fn unsafe_labels_are_rejected() {
        assert!(DataVersion::new("v0.3.1").checked().is_ok());
        for label in ["..", "a/b", "/abs", ".", "a\\b"] {
            assert!(DataVersion::new(label).checked().is_err(), "{label}");
        }
    }
}
