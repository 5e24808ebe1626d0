//! Layered settings: built-in defaults, an optional TOML file, then the
//! `JPINFECT_*` environment overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Format, Serialized, Toml};
use idwr_fetch::{FetchOptions, RateLimiter};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::version::DataVersion;

pub const ENV_CACHE_DIR: &str = "JPINFECT_CACHE_DIR";
pub const ENV_DATA_VERSION: &str = "JPINFECT_DATA_VERSION";
pub const ENV_DATA_BASE_URL: &str = "JPINFECT_DATA_BASE_URL";

/// Directory name under the user cache directory.
const CACHE_DIR_NAME: &str = "jp_idwr_db";

const ENV_OVERRIDES: [(&str, &str); 3] = [
    (ENV_CACHE_DIR, "cache_dir"),
    (ENV_DATA_VERSION, "data_version"),
    (ENV_DATA_BASE_URL, "data_base_url"),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cache root; `<cache_dir>/data/<version>` holds one release.
    pub cache_dir:             Option<PathBuf>,
    pub data_version:          Option<String>,
    /// Replaces the whole `<host>/<repo>/releases/download/<version>` prefix.
    pub data_base_url:         Option<String>,
    pub release_host:          String,
    pub repository:            String,
    pub timeout_seconds:       u64,
    pub retries:               u32,
    pub retry_backoff_ms:      u64,
    pub rate_limit_per_minute: u32,
    pub user_agent:            String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir:             None,
            data_version:          None,
            data_base_url:         None,
            release_host:          "https://github.com".to_string(),
            repository:            "AlFontal/jp-idwr-db".to_string(),
            timeout_seconds:       60,
            retries:               3,
            retry_backoff_ms:      250,
            rate_limit_per_minute: 20,
            user_agent:            concat!("idwr/", env!("CARGO_PKG_VERSION"), " (+https://github.com/AlFontal/jp-idwr-db)")
                .to_string(),
        }
    }
}

impl Settings {
    /// Load settings reading overrides from the process environment.
    pub fn load(file: Option<&Path>) -> Result<Self> { Self::load_with(file, |key| env::var(key).ok()) }

    /// Load settings with `lookup` standing in for the environment.
    ///
    /// Empty override values are ignored.
    pub fn load_with(file: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        if let Some(path) = file {
            if !path.is_file() {
                return Err(Error::ConfigNotFound(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }

        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                figment = figment.merge(Serialized::default(key, value));
            }
        }

        let mut settings: Settings = figment.extract()?;
        settings.cache_dir = settings.cache_dir.map(|dir| expand_home(&dir));
        Ok(settings)
    }

    /// Cache root in effect: the configured directory or the platform default.
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_root().ok_or(Error::NoCacheRoot),
        }
    }

    /// Where the assets of `version` are downloaded from, without a trailing `/`.
    pub fn base_url(&self, version: &DataVersion) -> String {
        match self.data_base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!(
                "{}/{}/releases/download/{}",
                self.release_host.trim_end_matches('/'),
                self.repository.trim_matches('/'),
                version
            ),
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .max_retries(self.retries)
            .retry_backoff(Duration::from_millis(self.retry_backoff_ms))
            .user_agent(self.user_agent.clone())
    }

    pub fn rate_limiter(&self) -> RateLimiter { RateLimiter::per_minute(self.rate_limit_per_minute) }
}

/// `<user cache dir>/jp_idwr_db`.
pub fn default_cache_root() -> Option<PathBuf> { user_cache().map(|dir| dir.join(CACHE_DIR_NAME)) }

fn user_cache() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var_os("LOCALAPPDATA").map(PathBuf::from)
    }
    #[cfg(target_os = "macos")]
    {
        home::home_dir().map(|p| p.join("Library/Caches"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| home::home_dir().map(|p| p.join(".cache")))
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match home::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let settings = Settings::load_with(None, lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.retries, 3);
        assert_eq!(settings.fetch_options().timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("idwr.toml");
        std::fs::write(&file, "data_version = \"v0.1.0\"\nretries = 5\ncache_dir = \"/from/file\"\n").unwrap();

        let settings = Settings::load_with(
            Some(&file),
            lookup(&[(ENV_DATA_VERSION, "v9.9.9"), (ENV_CACHE_DIR, "")]),
        )
        .unwrap();

        assert_eq!(settings.data_version.as_deref(), Some("v9.9.9"));
        assert_eq!(settings.retries, 5);
        assert_eq!(settings.cache_dir, Some(PathBuf::from("/from/file")));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = Settings::load_with(Some(Path::new("/nonexistent/idwr.toml")), lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_base_url_default_and_override() {
        let version = DataVersion::new("v0.3.1");
        let mut settings = Settings::default();
        assert_eq!(
            settings.base_url(&version),
            "https://github.com/AlFontal/jp-idwr-db/releases/download/v0.3.1"
        );

        settings.data_base_url = Some("http://mirror.invalid/assets///".into());
        assert_eq!(settings.base_url(&version), "http://mirror.invalid/assets");
    }

    #[test]
    fn test_cache_root_prefers_configured_dir() {
        let settings = Settings {
            cache_dir: Some(PathBuf::from("/tmp/idwr-cache")),
            ..Settings::default()
        };
        assert_eq!(settings.cache_root().unwrap(), PathBuf::from("/tmp/idwr-cache"));
    }

    #[test]
    fn test_default_cache_root_ends_with_package_dir() {
        if let Some(root) = default_cache_root() {
            assert!(root.ends_with(CACHE_DIR_NAME));
        }
    }
}
