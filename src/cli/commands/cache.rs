//! Cache command - inspect or clear cache partitions

use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::HostContext;
use crate::config::Config;
use crate::error::SwResult;
use crate::registry::CacheRegistry;
use crate::storage::CacheStorage;
use console::style;
use serde::Serialize;
use std::io::{self, Write};
use tracing::debug;

/// Partition summary used by `cache list`
#[derive(Debug, Serialize)]
struct PartitionSummary {
    name: String,
    live: bool,
    entries: usize,
}

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> SwResult<()> {
    let host = HostContext::open(config).await?;
    let storage = host.storage.as_ref();

    match args.action {
        CacheAction::List { format } => list_partitions(storage, &host.registry, format).await,
        CacheAction::Show { partition, format } => {
            show_partition(storage, &partition, format).await
        }
        CacheAction::Clear { yes } => clear_partitions(storage, yes).await,
    }
}

async fn summarize(
    storage: &dyn CacheStorage,
    registry: &CacheRegistry,
) -> SwResult<Vec<PartitionSummary>> {
    let mut summaries = Vec::new();
    for name in storage.keys().await? {
        let entries = storage.entries(&name).await?.len();
        summaries.push(PartitionSummary {
            live: registry.is_live(&name),
            name,
            entries,
        });
    }
    Ok(summaries)
}

/// List all partitions
async fn list_partitions(
    storage: &dyn CacheStorage,
    registry: &CacheRegistry,
    format: OutputFormat,
) -> SwResult<()> {
    let summaries = summarize(storage, registry).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            for s in &summaries {
                println!("{}", s.name);
            }
        }
        OutputFormat::Table => {
            if summaries.is_empty() {
                println!("No cache partitions found.");
                return Ok(());
            }
            println!("{:<24} {:<8} {:<8}", "PARTITION", "STATE", "ENTRIES");
            println!("{}", "-".repeat(42));
            for s in &summaries {
                let state = if s.live {
                    style("live").green()
                } else {
                    style("stale").yellow()
                };
                println!("{:<24} {:<8} {:<8}", s.name, state, s.entries);
            }
            println!();
            println!("Total: {} partition(s)", summaries.len());
        }
    }
    Ok(())
}

/// List the entries of one partition
async fn show_partition(
    storage: &dyn CacheStorage,
    partition: &str,
    format: OutputFormat,
) -> SwResult<()> {
    let urls = storage.entries(partition).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&urls)?),
        OutputFormat::Plain => {
            for url in &urls {
                println!("{}", url);
            }
        }
        OutputFormat::Table => {
            println!("{} ({} entries)", style(partition).bold(), urls.len());
            for url in &urls {
                println!("  {} {}", style("•").cyan(), url);
            }
        }
    }
    Ok(())
}

/// Delete every partition
async fn clear_partitions(storage: &dyn CacheStorage, skip_confirm: bool) -> SwResult<()> {
    let names = storage.keys().await?;

    if names.is_empty() {
        println!("No cache partitions to clear.");
        return Ok(());
    }

    println!("This will remove {} cache partition(s):", names.len());
    for name in &names {
        println!("  {} {}", style("•").red(), name);
    }
    println!();

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut removed = 0;
    for name in names {
        debug!("Removing partition: {}", name);
        if storage.delete(&name).await? {
            removed += 1;
        }
    }

    println!("{} cleared {} partition(s)", style("✓").green(), removed);
    Ok(())
}
