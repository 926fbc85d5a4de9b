//! Configuration management for Viento

pub mod schema;

pub use schema::Config;

use crate::error::{VientoError, VientoResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable that overrides `upstream.api_key`
pub const API_KEY_ENV: &str = "WIND_API_KEY";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("viento")
            .join("config.toml")
    }

    /// Load configuration, using defaults if the file does not exist
    ///
    /// `WIND_API_KEY`, when set and non-empty, replaces `upstream.api_key`.
    pub async fn load(&self) -> VientoResult<Config> {
        let mut config = if self.config_path.exists() {
            self.load_from_file(&self.config_path).await?
        } else {
            debug!("Config file not found, using defaults");
            Config::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                debug!("Using API key from {}", API_KEY_ENV);
                config.upstream.api_key = key;
            }
        }

        Ok(config)
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> VientoResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| VientoError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| VientoError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> VientoResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            VientoError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> VientoResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| VientoError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    #[serial]
    async fn load_default_when_missing() {
        std::env::remove_var(API_KEY_ENV);
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.cache.ttl_secs, 600);
        assert!(config.upstream.api_key.is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn save_and_load_roundtrip() {
        std::env::remove_var(API_KEY_ENV);
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.lock.wait_budget = 3;
        config.cache.path = temp.path().join("cache.json");

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.lock.wait_budget, 3);
        assert_eq!(loaded.cache.path, temp.path().join("cache.json"));
    }

    #[tokio::test]
    #[serial]
    async fn env_overrides_api_key() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        std::env::set_var(API_KEY_ENV, "from-env");
        let config = manager.load().await.unwrap();
        std::env::remove_var(API_KEY_ENV);

        assert_eq!(config.upstream.api_key, "from-env");
    }

    #[tokio::test]
    async fn invalid_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[lock]\nwait_budget = \"many\"\n").unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(matches!(err, VientoError::ConfigInvalid { .. }));
    }
}
