//! steamdata configuration file handling
//!
//! Loads and manages the ~/.config/steamdata/config.yaml file.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `steam.developer_key`
pub const DEVELOPER_KEY_ENV: &str = "STEAM_API_KEY";

/// Local store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (the store's connection string)
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Enable WAL journal mode
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

fn config_dir() -> PathBuf {
    // Always use ~/.config for consistency across platforms (macOS, Linux)
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("steamdata");
    path
}

fn default_database_path() -> PathBuf {
    config_dir().join("steamdata.db")
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            wal_mode: true,
        }
    }
}

/// Steam Web API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteamConfig {
    /// Developer key from https://steamcommunity.com/dev
    #[serde(default)]
    pub developer_key: Option<String>,

    /// API host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    steamapi::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            developer_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Avatar download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    /// Download avatar images when a profile is first fetched
    #[serde(default = "default_true")]
    pub fetch: bool,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self { fetch: true }
    }
}

/// steamdata configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SteamDataConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub steam: SteamConfig,

    #[serde(default)]
    pub avatars: AvatarConfig,
}

impl SteamDataConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default path (~/.config/steamdata/config.yaml)
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::SteamDataError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading steamdata configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            database = %config.database.path.display(),
            base_url = %config.steam.base_url,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving steamdata configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/steamdata/config.yaml)
    pub fn default_path() -> PathBuf {
        config_dir().join("config.yaml")
    }

    /// Developer key, preferring the STEAM_API_KEY environment variable
    pub fn developer_key(&self) -> Option<String> {
        std::env::var(DEVELOPER_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.steam
                    .developer_key
                    .clone()
                    .filter(|k| !k.trim().is_empty())
            })
    }

    /// Check the settings needed to reach the remote API
    pub fn validate(&self) -> Result<()> {
        if self.steam.base_url.trim().is_empty() {
            return Err(crate::SteamDataError::Config(
                "steam.base_url must not be empty".to_string(),
            ));
        }
        if self.steam.timeout_secs == 0 {
            return Err(crate::SteamDataError::Config(
                "steam.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.developer_key().is_none() {
            return Err(crate::SteamDataError::Config(format!(
                "No Steam developer key: set steam.developer_key or {}",
                DEVELOPER_KEY_ENV
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SteamDataConfig::new();
        assert!(config.database.wal_mode);
        assert!(config.database.path.ends_with("steamdata/steamdata.db"));
        assert_eq!(config.steam.base_url, steamapi::DEFAULT_BASE_URL);
        assert_eq!(config.steam.timeout_secs, 30);
        assert!(config.avatars.fetch);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.yaml");

        let mut config = SteamDataConfig::new();
        config.database.path = temp_dir.path().join("profiles.db");
        config.steam.developer_key = Some("ABC123".to_string());
        config.avatars.fetch = false;
        config.save(&path).unwrap();

        let loaded = SteamDataConfig::load(&path).unwrap();
        assert_eq!(loaded.database.path, temp_dir.path().join("profiles.db"));
        assert_eq!(loaded.steam.developer_key.as_deref(), Some("ABC123"));
        assert!(!loaded.avatars.fetch);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: SteamDataConfig = serde_yaml::from_str("avatars:\n  fetch: false\n").unwrap();
        assert!(!config.avatars.fetch);
        assert_eq!(config.steam.timeout_secs, 30);
        assert!(config.database.wal_mode);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SteamDataConfig::load("/nonexistent/steamdata/config.yaml");
        assert!(matches!(result, Err(crate::SteamDataError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = SteamDataConfig::new();
        config.steam.developer_key = Some("key".to_string());

        config.steam.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.steam.timeout_secs = 5;
        config.steam.base_url = " ".to_string();
        assert!(config.validate().is_err());
    }
}
