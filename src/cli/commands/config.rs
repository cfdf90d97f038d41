//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{SwError, SwResult};
use console::style;
use std::path::PathBuf;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> SwResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config),
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) {
    let toml =
        toml::to_string_pretty(config).unwrap_or_else(|_| "Error serializing config".to_string());
    println!("{}", toml);
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> SwResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        return Err(SwError::ConfigExists(path.to_path_buf()));
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized at {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> SwResult<()> {
    let mut config = config.clone();
    apply_value(&mut config, key, value)?;

    manager.save(&config).await?;
    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

/// Apply a dot-separated key to a config
fn apply_value(config: &mut Config, key: &str, value: &str) -> SwResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(SwError::User(format!(
                    "log_format must be 'text' or 'json', got '{value}'"
                )))
            }
        },

        ["worker", "origin"] => config.worker.origin = value.to_string(),
        ["worker", "version"] => config.worker.version = value.to_string(),

        ["cache", "static_prefix"] => config.cache.static_prefix = value.to_string(),
        ["cache", "pages_prefix"] => config.cache.pages_prefix = value.to_string(),
        ["cache", "offline_url"] => config.cache.offline_url = value.to_string(),
        ["cache", "seed_assets"] => {
            config.cache.seed_assets = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        ["storage", "dir"] => config.storage.dir = Some(PathBuf::from(value)),

        ["network", "timeout_secs"] => {
            config.network.timeout_secs = value.parse().map_err(|_| {
                SwError::User(format!("timeout_secs must be a number, got '{value}'"))
            })?
        }
        ["network", "user_agent"] => config.network.user_agent = value.to_string(),

        _ => {
            return Err(SwError::User(format!(
                "Unknown config key '{key}'. Valid keys: {}",
                VALID_KEYS.join(", ")
            )))
        }
    }
    Ok(())
}

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "worker.origin",
    "worker.version",
    "cache.static_prefix",
    "cache.pages_prefix",
    "cache.offline_url",
    "cache.seed_assets",
    "storage.dir",
    "network.timeout_secs",
    "network.user_agent",
];
