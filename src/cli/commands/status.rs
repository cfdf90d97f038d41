//! Status command - worker state and cache partitions

use crate::cli::HostContext;
use crate::config::{Config, ConfigManager};
use crate::error::SwResult;
use crate::storage::CacheStorage;
use console::style;

/// Execute the status command
pub async fn execute(config: &Config) -> SwResult<()> {
    let host = HostContext::open(config).await?;
    let version = host.registry.version();
    let state = host.record.state_for(version);

    println!("{}", style("storefront-sw status").bold());
    println!();
    println!("  {:<12} {}", "origin", host.config.worker.origin);
    println!("  {:<12} {}", "version", version);
    println!("  {:<12} {}", "state", state);
    if let Some(at) = host.record.installed_at {
        println!("  {:<12} {}", "installed", at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(at) = host.record.activated_at {
        println!("  {:<12} {}", "activated", at.format("%Y-%m-%d %H:%M"));
    }
    println!(
        "  {:<12} {}",
        "storage",
        ConfigManager::storage_dir(config).display()
    );
    println!();

    let names = host.storage.keys().await?;
    if names.is_empty() {
        println!("No cache partitions.");
        return Ok(());
    }

    println!("Partitions:");
    for name in &names {
        let count = host.storage.entries(name).await?.len();
        let marker = if host.registry.is_live(name) {
            style("live").green()
        } else {
            style("stale").yellow()
        };
        println!("  {:<20} {:<6} {} entries", name, marker, count);
    }

    let seeded = host
        .storage
        .entries(host.registry.static_partition())
        .await
        .unwrap_or_default();
    let missing: Vec<&String> = host
        .registry
        .seed_urls()
        .iter()
        .filter(|url| !seeded.contains(*url))
        .collect();
    if !missing.is_empty() {
        println!();
        println!(
            "{} {} seed asset(s) not cached; run: storefront-sw install",
            style("!").yellow(),
            missing.len()
        );
    }

    Ok(())
}
