//! Activate command - evict stale caches

use crate::cli::HostContext;
use crate::config::Config;
use crate::error::SwResult;
use crate::worker::WorkerState;
use console::style;

/// Execute the activate command
pub async fn execute(config: &Config) -> SwResult<()> {
    let mut host = HostContext::open(config).await?;
    let worker = host.worker(false);

    let report = worker.activate().await?;
    host.record_state(WorkerState::Activated).await?;

    for name in &report.kept {
        println!("  {} {} (live)", style("•").green(), name);
    }
    for name in &report.deleted {
        println!("  {} {} (evicted)", style("✗").red(), name);
    }
    for (name, reason) in &report.failed {
        println!(
            "  {} {} (eviction failed: {})",
            style("!").yellow(),
            name,
            reason
        );
    }

    println!();
    println!(
        "{} worker {} active, {} stale partition(s) evicted",
        style("✓").green(),
        host.registry.version(),
        report.deleted.len()
    );
    Ok(())
}
