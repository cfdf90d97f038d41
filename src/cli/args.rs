//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// storefront-sw - Offline caching worker for the storefront
///
/// Pre-caches the storefront shell, evicts caches left by older versions,
/// and routes requests through network-first and cache-first strategies.
#[derive(Parser, Debug)]
#[command(name = "storefront-sw")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "STOREFRONT_SW_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pre-cache every seed asset for the configured version
    Install,

    /// Evict caches of older versions and take control of pages
    Activate,

    /// Route one request through the worker
    Fetch(FetchArgs),

    /// Show worker state and cache partitions
    Status,

    /// Inspect or clear cache partitions
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// URL or origin-relative path to request
    pub url: String,

    /// Request method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Treat the request as a top-level navigation
    #[arg(long)]
    pub navigate: bool,

    /// Accept header value
    #[arg(long)]
    pub accept: Option<String>,

    /// Request destination (style, script, image, font, document)
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Extra request headers (Name: value)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Simulate a device without network access
    #[arg(long)]
    pub offline: bool,

    /// Print the response body
    #[arg(short, long)]
    pub body: bool,
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

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., worker.version)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
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
    /// List cache partitions
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the entries of one partition
    Show {
        /// Partition name (e.g., static-v2)
        partition: String,

        /// Output format
        #[arg(short, long, default_value = "plain")]
        format: OutputFormat,
    },

    /// Delete every cache partition
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Parse a header in `Name: value` format
fn parse_header(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find(':')
        .ok_or_else(|| format!("invalid header '{s}': expected 'Name: value'"))?;
    let name = s[..pos].trim();
    if name.is_empty() {
        return Err(format!("invalid header '{s}': empty name"));
    }
    Ok((name.to_string(), s[pos + 1..].trim().to_string()))
}
