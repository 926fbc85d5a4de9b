//! Upstream fetch capability
//!
//! The cache never talks to the network itself. Callers inject something
//! implementing [`Fetcher`] (blocking) or [`AsyncFetcher`] (cooperative),
//! and failures come back as `UpstreamRateLimited`, `UpstreamTransport` or
//! `UpstreamUnexpectedStatus`.

pub mod http;

pub use http::HttpFetcher;

use crate::error::VientoResult;
use async_trait::async_trait;
use serde_json::Value;

/// Blocking fetch of one upstream response
pub trait Fetcher {
    /// Fetch `endpoint` for the given, unquantized coordinates
    fn fetch(&self, endpoint: &str, latitude: &str, longitude: &str) -> VientoResult<Value>;
}

/// Async fetch of one upstream response
#[async_trait]
pub trait AsyncFetcher: Send + Sync {
    /// Fetch `endpoint` for the given, unquantized coordinates
    async fn fetch(&self, endpoint: &str, latitude: &str, longitude: &str) -> VientoResult<Value>;
}
