//! Viento - cached weather lookups
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing::debug;
use viento::cli::{Cli, Commands};
use viento::config::ConfigManager;
use viento::error::VientoResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> VientoResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    viento::logging::init(&config.general.log_format, cli.verbose)?;
    debug!("Loaded configuration from {}", config_manager.path().display());

    // Dispatch to command
    match cli.command {
        Commands::Forecast(args) => viento::cli::commands::forecast(args, &config).await,
        Commands::Cache(args) => viento::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            viento::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
