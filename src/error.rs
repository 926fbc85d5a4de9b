//! Error types for Viento
//!
//! All modules use `VientoResult<T>` as their return type. Platform specific
//! lock failures are normalized into the lock variants below before they
//! leave the `lock` module, so callers never see raw OS error numbers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Viento operations
pub type VientoResult<T> = Result<T, VientoError>;

/// All errors that can occur in Viento
#[derive(Error, Debug)]
pub enum VientoError {
    // Lock errors
    #[error("Lock is held elsewhere and could not be acquired")]
    LockWouldBlock,

    #[error("Lock is not held by this handle or cannot be released")]
    LockNotHeld,

    #[error("Unsupported platform: {0}. Viento supports POSIX and Windows NT kernels.")]
    UnsupportedPlatform(String),

    #[error("Unknown {kind} backend: {name}")]
    UnknownBackend { kind: &'static str, name: String },

    // Cache errors
    #[error("Cache file {path} is corrupt: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    // Upstream errors
    #[error("Upstream rate limit exceeded for {endpoint}")]
    UpstreamRateLimited { endpoint: String },

    #[error("Upstream transport error: {0}")]
    UpstreamTransport(String),

    #[error("Upstream returned unexpected status {status} for {endpoint}")]
    UpstreamUnexpectedStatus { endpoint: String, status: u16 },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VientoError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a corrupt cache error
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CacheCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// Only lock contention is retried, and only by the lock layer itself.
    /// Upstream failures are surfaced to the caller untouched.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockWouldBlock)
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::LockWouldBlock => {
                Some("Another process is holding the cache file. Retry, or raise lock.wait_budget")
            }
            Self::UnsupportedPlatform(_) => Some("Set lock.backend to a locker available on this host"),
            Self::UpstreamRateLimited { .. } => {
                Some("The weather API rate limit was reached. Wait before querying again")
            }
            Self::UpstreamUnexpectedStatus { status: 401, .. } => {
                Some("Set upstream.api_key or the WIND_API_KEY environment variable")
            }
            _ => None,
        }
    }
}
