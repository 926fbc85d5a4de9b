//! Get-or-fetch over the response cache
//!
//! Per request: check the cache, return on a fresh hit, otherwise fetch
//! from upstream, store the payload and return it. Fetch failures are
//! returned as-is and never answered with stale data.
//!
//! Concurrent misses on the same key may each fetch; the exclusive lock
//! only serializes the writes. Whichever payload lands last wins, and the
//! TTL bounds its age either way.

use crate::cache::{CacheKey, CacheStore};
use crate::error::VientoResult;
use crate::fetch::{AsyncFetcher, Fetcher};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// Where a resolved payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Fresh entry in the cache file
    Cache,
    /// Fetched from upstream and written to the cache
    Upstream,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Upstream => write!(f, "upstream"),
        }
    }
}

/// Result of one get-or-fetch
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub payload: Value,
    pub source: Source,
}

/// Composes a cache store with an injected fetch capability
#[derive(Debug)]
pub struct Orchestrator<F> {
    store: CacheStore,
    fetcher: F,
}

impl<F> Orchestrator<F> {
    pub fn new(store: CacheStore, fetcher: F) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

impl<F: Fetcher> Orchestrator<F> {
    /// Serve from cache or fetch and populate, blocking the calling thread
    pub fn get_or_fetch(
        &self,
        endpoint: &str,
        latitude: &str,
        longitude: &str,
    ) -> VientoResult<Resolved> {
        let key = CacheKey::derive(endpoint, latitude, longitude)?;

        if let Some(entry) = self.store.get(&key)? {
            debug!("Serving {} from cache", key);
            return Ok(Resolved {
                payload: entry.data,
                source: Source::Cache,
            });
        }

        let payload = self.fetcher.fetch(endpoint, latitude, longitude)?;
        self.store.put(&key, payload.clone())?;
        info!("Fetched and cached {}", key);

        Ok(Resolved {
            payload,
            source: Source::Upstream,
        })
    }
}

impl<F: AsyncFetcher> Orchestrator<F> {
    /// Serve from cache or fetch and populate, yielding while waiting
    pub async fn get_or_fetch_async(
        &self,
        endpoint: &str,
        latitude: &str,
        longitude: &str,
    ) -> VientoResult<Resolved> {
        let key = CacheKey::derive(endpoint, latitude, longitude)?;

        if let Some(entry) = self.store.get_async(&key).await? {
            debug!("Serving {} from cache", key);
            return Ok(Resolved {
                payload: entry.data,
                source: Source::Cache,
            });
        }

        let payload = self.fetcher.fetch(endpoint, latitude, longitude).await?;
        self.store.put_async(&key, payload.clone()).await?;
        info!("Fetched and cached {}", key);

        Ok(Resolved {
            payload,
            source: Source::Upstream,
        })
    }
}
