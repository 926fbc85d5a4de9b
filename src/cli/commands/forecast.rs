//! Forecast command - get-or-fetch one coordinate

use crate::cli::args::ForecastArgs;
use crate::cli::commands::open_store;
use crate::config::{Config, API_KEY_ENV};
use crate::error::VientoResult;
use crate::fetch::HttpFetcher;
use crate::orchestrator::Orchestrator;
use console::style;
use std::time::Duration;
use tracing::warn;

/// Execute the forecast command
pub async fn execute(args: ForecastArgs, config: &Config) -> VientoResult<()> {
    let store = open_store(config)?;

    if config.upstream.api_key.is_empty() {
        warn!("No API key configured; set upstream.api_key or {}", API_KEY_ENV);
    }
    let fetcher = HttpFetcher::new(
        config.upstream.base_url.clone(),
        Duration::from_secs(config.upstream.timeout_secs),
    )
    .with_api_key(config.upstream.api_key.clone());

    let orchestrator = Orchestrator::new(store, fetcher);
    let resolved = orchestrator
        .get_or_fetch_async(&args.endpoint, &args.lat, &args.lon)
        .await?;

    let body = if args.compact {
        serde_json::to_string(&resolved.payload)?
    } else {
        serde_json::to_string_pretty(&resolved.payload)?
    };
    println!("{}", body);
    eprintln!("{} {}", style("source:").dim(), resolved.source);

    Ok(())
}
