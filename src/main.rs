//! storefront-sw - offline caching worker for the storefront
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use storefront_sw::cli::{Cli, Commands};
use storefront_sw::config::ConfigManager;
use storefront_sw::error::SwResult;
use tracing_subscriber::EnvFilter;

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

async fn run() -> SwResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("storefront_sw=warn"),
        1 => EnvFilter::new("storefront_sw=info"),
        _ => EnvFilter::new("storefront_sw=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Install => storefront_sw::cli::commands::install(&config).await,
        Commands::Activate => storefront_sw::cli::commands::activate(&config).await,
        Commands::Fetch(args) => storefront_sw::cli::commands::fetch(args, &config).await,
        Commands::Status => storefront_sw::cli::commands::status(&config).await,
        Commands::Cache(args) => storefront_sw::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            storefront_sw::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
