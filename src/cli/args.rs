//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Viento - cached weather lookups
///
/// Serves weather API responses from a lock-protected cache file shared by
/// every process on the host.
#[derive(Parser, Debug)]
#[command(name = "viento")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "VIENTO_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up weather for a coordinate, served from cache when fresh
    Forecast(ForecastArgs),

    /// Inspect or maintain the response cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the forecast command
#[derive(Parser, Debug)]
pub struct ForecastArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: String,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: String,

    /// Upstream endpoint, relative to upstream.base_url
    #[arg(short, long, default_value = "forecast")]
    pub endpoint: String,

    /// Print the payload on a single line
    #[arg(long)]
    pub compact: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listings
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the cache file path
    Path,

    /// List cached entries with their age
    Show {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove entries older than the TTL
    Purge,

    /// Remove every entry
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn about_comes_from_doc_comment() {
        let about = Cli::command().get_about().unwrap().to_string();
        assert!(about.contains("cached weather lookups"));
    }

    #[test]
    fn negative_coordinates_parse() {
        let cli = Cli::try_parse_from([
            "viento", "forecast", "--lat", "-34.15611", "--lon", "-118.13194",
        ])
        .unwrap();
        match cli.command {
            Commands::Forecast(args) => {
                assert_eq!(args.lat, "-34.15611");
                assert_eq!(args.lon, "-118.13194");
                assert_eq!(args.endpoint, "forecast");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["viento", "-vv", "cache", "path"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Commands::Cache(CacheArgs {
                action: CacheAction::Path
            })
        ));
    }
}
