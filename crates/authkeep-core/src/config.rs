//! Client configuration management.
//!
//! Holds the identity provider URL, extra request headers (such as the
//! project `apikey`), and where / how sessions are stored.
//!
//! Configuration is stored at `~/.config/authkeep/config.json` by default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{SessionConfig, DEFAULT_REFRESH_TIMEOUT_SECS, DEFAULT_STORAGE_KEY};
use crate::store::keychain::DEFAULT_SERVICE_NAME;

/// Application name used for config/data directory paths
const APP_NAME: &str = "authkeep";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the auth API, e.g. `https://project.example.co/auth/v1`.
    pub url: String,
    pub headers: HashMap<String, String>,
    pub keychain_service: String,
    /// Keychain / collection to use instead of the platform default.
    pub keychain_target: Option<String>,
    pub storage_key: String,
    /// `null` disables the refresh timeout.
    pub refresh_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            headers: HashMap::new(),
            keychain_service: DEFAULT_SERVICE_NAME.to_string(),
            keychain_target: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            refresh_timeout_secs: Some(DEFAULT_REFRESH_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Default directory for an `EncryptedFileStore`.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            storage_key: self.storage_key.clone(),
            refresh_timeout: self.refresh_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = ClientConfig::new("https://auth.example.com/auth/v1").with_header("apikey", "anon");

        config.save_to(&path).unwrap();
        assert_eq!(ClientConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"url": "https://auth.example.com", "refresh_timeout_secs": null}"#).unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.url, "https://auth.example.com");
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.session_config().refresh_timeout, None);
    }

    #[test]
    fn test_session_config_defaults() {
        let session = ClientConfig::default().session_config();
        assert_eq!(session.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(session.refresh_timeout, Some(Duration::from_secs(30)));
    }
}
