//! Persisted session settings stored as TOML under the app root.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::dataset::FormulaMatch;

/// Default filename used to store the session configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that may occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        /// Directory path that failed to create.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to write a config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML serialization error.
        source: toml::ser::Error,
    },
    /// The configured server URL cannot be used.
    #[error("Invalid server URL {url:?}: {reason}")]
    InvalidServerUrl {
        /// Offending URL text.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Everything the session controller and HTTP gateway read at startup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

/// Where the training service lives and how patient the client is with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path segment prepended to every endpoint, e.g. `/api`.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Upper bound for any single response body.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

/// Fixed settling delays inserted between protocol phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Pause between upload and the dataset fetch used for id resolution.
    #[serde(default = "default_upload_settle_ms")]
    pub upload_settle_ms: u64,
    /// Pause before reconciling dataset and model status after training.
    #[serde(default = "default_reconcile_delay_ms")]
    pub reconcile_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchingSettings {
    #[serde(default)]
    pub formula: FormulaMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Oldest notifications are dropped past this count.
    #[serde(default = "default_max_log")]
    pub max_log: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            upload_settle_ms: default_upload_settle_ms(),
            reconcile_delay_ms: default_reconcile_delay_ms(),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            max_log: default_max_log(),
        }
    }
}

impl ServerSettings {
    /// Join base URL and API prefix into the root every endpoint hangs off.
    pub fn endpoint_root(&self) -> Result<String, ConfigError> {
        let parsed = url::Url::parse(self.base_url.trim()).map_err(|err| {
            ConfigError::InvalidServerUrl {
                url: self.base_url.clone(),
                reason: err.to_string(),
            }
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidServerUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        let base = parsed.as_str().trim_end_matches('/');
        let prefix = self.api_prefix.trim().trim_matches('/');
        if prefix.is_empty() {
            Ok(base.to_string())
        } else {
            Ok(format!("{base}/{prefix}"))
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl TimingSettings {
    pub fn upload_settle(&self) -> Duration {
        Duration::from_millis(self.upload_settle_ms)
    }

    pub fn reconcile_delay(&self) -> Duration {
        Duration::from_millis(self.reconcile_delay_ms)
    }

    /// Settings with every delay removed, for tests and scripted hosts.
    pub fn immediate() -> Self {
        Self {
            upload_settle_ms: 0,
            reconcile_delay_ms: 0,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_read_timeout_secs() -> u64 {
    120
}

fn default_max_response_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_upload_settle_ms() -> u64 {
    500
}

fn default_reconcile_delay_ms() -> u64 {
    1000
}

fn default_max_log() -> usize {
    200
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load settings from the app root, returning defaults if the file is missing.
pub fn load_or_default() -> Result<SessionSettings, ConfigError> {
    load_from(&config_path()?)
}

/// Load settings from a specific path, returning defaults if it does not exist.
pub fn load_from(path: &Path) -> Result<SessionSettings, ConfigError> {
    if !path.exists() {
        return Ok(SessionSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: SessionSettings =
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
    settings.server.endpoint_root()?;
    Ok(settings)
}

/// Persist settings to the app root, overwriting any previous contents.
pub fn save(settings: &SessionSettings) -> Result<(), ConfigError> {
    save_to_path(settings, &config_path()?)
}

/// Save settings to a specific path, creating parent directories as needed.
pub fn save_to_path(settings: &SessionSettings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, SessionSettings::default());
        assert_eq!(settings.timing.upload_settle(), Duration::from_millis(500));
        assert_eq!(settings.matching.formula, FormulaMatch::Exact);
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[server]\nbase_url = \"http://trainer.local:9000\"\n\n[matching]\nformula = \"canonical\"\n",
        )
        .unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.server.base_url, "http://trainer.local:9000");
        assert_eq!(settings.server.api_prefix, "/api");
        assert_eq!(settings.matching.formula, FormulaMatch::Canonical);
        assert_eq!(settings.timing.reconcile_delay_ms, 1000);
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let mut settings = SessionSettings::default();
        settings.timing = TimingSettings::immediate();
        settings.notifications.max_log = 5;
        save_to_path(&settings, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), settings);
    }

    #[test]
    fn rejects_unparseable_server_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server]\nbase_url = \"not a url\"\n").unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidServerUrl { .. }));
    }

    #[test]
    fn endpoint_root_joins_prefix_without_double_slashes() {
        let mut server = ServerSettings::default();
        server.base_url = "http://127.0.0.1:8000/".to_string();
        server.api_prefix = "/api/".to_string();
        assert_eq!(server.endpoint_root().unwrap(), "http://127.0.0.1:8000/api");
        server.api_prefix = String::new();
        assert_eq!(server.endpoint_root().unwrap(), "http://127.0.0.1:8000");
    }

    #[test]
    fn endpoint_root_rejects_non_http_scheme() {
        let mut server = ServerSettings::default();
        server.base_url = "ftp://example.invalid".to_string();
        assert!(server.endpoint_root().is_err());
    }
}
