//! Configuration schema for Viento
//!
//! Configuration is stored at `~/.config/viento/config.toml`

use crate::cache::{CACHE_FILE_NAME, DEFAULT_TTL};
use crate::fetch::http::DEFAULT_BASE_URL;
use crate::lock::{RetryPolicy, DEFAULT_RETRY_UNIT, DEFAULT_WAIT_BUDGET};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Response cache settings
    pub cache: CacheConfig,

    /// File locking settings
    pub lock: LockConfig,

    /// Weather API settings
    pub upstream: UpstreamConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log sink name: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache file; relative paths resolve against the working directory
    pub path: PathBuf,

    /// Maximum entry age in seconds
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(CACHE_FILE_NAME),
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

/// File locking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Locker registry name: "native", "posix" or "windows"
    pub backend: String,

    /// Length of one backoff time unit in milliseconds
    pub retry_unit_ms: u64,

    /// Cumulative backoff, in units, before giving up
    pub wait_budget: u32,
}

impl LockConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.retry_unit_ms), self.wait_budget)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            backend: "native".to_string(),
            retry_unit_ms: DEFAULT_RETRY_UNIT.as_millis() as u64,
            wait_budget: DEFAULT_WAIT_BUDGET,
        }
    }
}

/// Weather API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL endpoints are resolved against
    pub base_url: String,

    /// API key sent as `appid`; `WIND_API_KEY` overrides it
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[lock]"));
        assert!(toml.contains("[upstream]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.path, PathBuf::from("response_cache.json"));
        assert_eq!(config.cache.ttl(), Duration::from_secs(600));
        assert_eq!(config.lock.backend, "native");
        assert_eq!(config.lock.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [lock]
            retry_unit_ms = 50
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.lock.retry_policy().unit, Duration::from_millis(50));
        assert_eq!(config.lock.wait_budget, 10); // default preserved
        assert_eq!(config.general.log_format, "text");
    }
}
