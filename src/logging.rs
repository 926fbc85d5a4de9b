//! Tracing setup
//!
//! Verbosity maps to a level filter (0 = warn, 1 = info, 2+ = debug) unless
//! `RUST_LOG` is set. The output format is a named sink resolved from
//! [`LogSinkRegistry`]. Logs go to stderr so stdout stays clean for payloads.

use crate::error::{VientoError, VientoResult};
use crate::registry::FactoryRegistry;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Sink used when the configuration names none
pub const DEFAULT_SINK: &str = "text";

/// Registry of log output formats
pub type LogSinkRegistry = FactoryRegistry<dyn Layer<Registry> + Send + Sync>;

impl LogSinkRegistry {
    /// Registry with the built-in sinks
    ///
    /// - `text`: compact human-readable lines
    /// - `json`: one JSON object per event
    pub fn builtin() -> Self {
        let mut registry = Self::new("log sink");
        registry
            .register("text", || {
                Ok(fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time()
                    .boxed())
            })
            .register("json", || {
                Ok(fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .boxed())
            });
        registry
    }
}

/// Level filter for a `-v` count, overridden by `RUST_LOG` when set
pub fn filter_for(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        EnvFilter::new(format!("viento={}", level))
    })
}

/// Install the global subscriber
pub fn init(sink: &str, verbosity: u8) -> VientoResult<()> {
    let layer = LogSinkRegistry::builtin().resolve(sink)?;

    tracing_subscriber::registry()
        .with(layer)
        .with(filter_for(verbosity))
        .try_init()
        .map_err(|e| VientoError::Internal(format!("installing log subscriber: {}", e)))
}
