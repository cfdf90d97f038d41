//! Install command - pre-cache the seed assets

use crate::cli::HostContext;
use crate::config::Config;
use crate::error::SwResult;
use crate::worker::WorkerState;
use console::style;

/// Execute the install command
pub async fn execute(config: &Config) -> SwResult<()> {
    let mut host = HostContext::open(config).await?;
    let version = host.registry.version().to_string();

    if host.record.state_for(&version) != WorkerState::Parsed {
        println!(
            "Worker {} is already {}; reinstalling.",
            version, host.record.state
        );
    }

    // A fresh worker every time: install always starts from the parsed state
    let worker = host.worker(false).resume(WorkerState::Parsed);
    println!(
        "Installing worker {} from {}",
        style(&version).cyan().bold(),
        host.config.worker.origin
    );

    match worker.install().await {
        Ok(report) => {
            host.record_state(WorkerState::Installed).await?;
            for url in &report.seeded {
                println!("  {} {}", style("✓").green(), url);
            }
            println!();
            println!(
                "{} seeded {} asset(s) into {}",
                style("✓").green(),
                report.seeded.len(),
                report.partition
            );
            Ok(())
        }
        Err(e) => {
            host.record_state(WorkerState::Redundant).await?;
            Err(e)
        }
    }
}
