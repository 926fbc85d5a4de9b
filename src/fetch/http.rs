//! Weather API client over HTTP
//!
//! Only status handling lives here; the payload is passed through as
//! opaque JSON.

use crate::error::{VientoError, VientoResult};
use crate::fetch::{AsyncFetcher, Fetcher};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default upstream base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// HTTP 429
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Blocking HTTP client for the weather API
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
}

impl HttpFetcher {
    /// Create a client for `base_url` with a request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Send `appid=<key>` with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }

    /// Full URL for an endpoint identity
    ///
    /// Absolute `http(s)://` endpoints are used as given, anything else is
    /// appended to the base URL.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            )
        }
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, endpoint: &str, latitude: &str, longitude: &str) -> VientoResult<Value> {
        let url = self.endpoint_url(endpoint);
        debug!("Fetching {} for lat={}, lon={}", url, latitude, longitude);

        let mut request = self
            .agent
            .get(&url)
            .query("lat", latitude)
            .query("lon", longitude);
        if let Some(ref key) = self.api_key {
            request = request.query("appid", key);
        }

        let mut response = request
            .call()
            .map_err(|e| VientoError::UpstreamTransport(e.to_string()))?;

        let status = response.status().as_u16();
        match status {
            200 => {
                let body = response
                    .body_mut()
                    .read_to_string()
                    .map_err(|e| VientoError::UpstreamTransport(e.to_string()))?;
                serde_json::from_str(&body).map_err(|e| {
                    VientoError::UpstreamTransport(format!("invalid JSON from {}: {}", url, e))
                })
            }
            STATUS_TOO_MANY_REQUESTS => {
                warn!("Rate limited by {}", url);
                Err(VientoError::UpstreamRateLimited {
                    endpoint: endpoint.to_string(),
                })
            }
            status => Err(VientoError::UpstreamUnexpectedStatus {
                endpoint: endpoint.to_string(),
                status,
            }),
        }
    }
}

#[async_trait]
impl AsyncFetcher for HttpFetcher {
    async fn fetch(&self, endpoint: &str, latitude: &str, longitude: &str) -> VientoResult<Value> {
        let fetcher = self.clone();
        let (endpoint, latitude, longitude) =
            (endpoint.to_string(), latitude.to_string(), longitude.to_string());

        tokio::task::spawn_blocking(move || {
            Fetcher::fetch(&fetcher, &endpoint, &latitude, &longitude)
        })
        .await
        .map_err(|e| VientoError::Internal(format!("fetch task failed: {}", e)))?
    }
}
