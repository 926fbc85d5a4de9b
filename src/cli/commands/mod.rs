//! CLI command implementations

pub mod cache;
pub mod config;
pub mod forecast;

pub use cache::execute as cache;
pub use config::execute as config;
pub use forecast::execute as forecast;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::VientoResult;
use crate::lock::max_wait;
use crate::registry::LockerRegistry;
use tracing::debug;

/// Build the cache store described by `config`
pub(crate) fn open_store(config: &Config) -> VientoResult<CacheStore> {
    let policy = config.lock.retry_policy();
    let locker = LockerRegistry::builtin().locker(&config.lock.backend, policy)?;
    debug!(
        "Using {} locker, lock waits capped at {:?}",
        locker.backend_name(),
        max_wait(&policy)
    );
    Ok(CacheStore::new(config.cache.path.clone(), locker).with_ttl(config.cache.ttl()))
}
