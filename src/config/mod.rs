//! Worker configuration on disk
//!
//! One TOML file names the origin and deployed version, the partition
//! prefixes and seed assets, where cache partitions live and how the
//! network client behaves. A missing file means "all defaults"; the CLI
//! only creates it on `config init` or `config set`.

pub mod schema;

pub use schema::Config;

use crate::error::{SwError, SwResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const APP_DIR: &str = "storefront-sw";

/// Reads and writes the worker config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for `~/.config/storefront-sw/config.toml`
    pub fn new() -> Self {
        Self::with_path(
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("config.toml"),
        )
    }

    /// Manager for an explicit file (`--config` / `STOREFRONT_SW_CONFIG`)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Directory holding cache partitions and `worker.json`.
    /// `[storage].dir` wins; otherwise `<state dir>/storefront-sw/caches`.
    pub fn storage_dir(config: &Config) -> PathBuf {
        config.storage.dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("caches")
        })
    }

    /// Load the config, or defaults when the file does not exist yet
    pub async fn load(&self) -> SwResult<Config> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "No config at {}, using defaults",
                    self.config_path.display()
                );
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(SwError::io(
                    format!("reading config from {}", self.config_path.display()),
                    e,
                ))
            }
        };

        let config: Config = toml::from_str(&content).map_err(|e| self.invalid(e.to_string()))?;
        check_settings(&config).map_err(|reason| self.invalid(reason))?;
        Ok(config)
    }

    /// Write the config, creating its directory on first use
    pub async fn save(&self, config: &Config) -> SwResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SwError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SwError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Worker config saved to {}", self.config_path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    fn invalid(&self, reason: String) -> SwError {
        SwError::ConfigInvalid {
            path: self.config_path.clone(),
            reason,
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings that are not about the cache registry (that one is checked by
/// `CacheRegistry::from_config` when a worker is built)
fn check_settings(config: &Config) -> Result<(), String> {
    match config.general.log_format.as_str() {
        "text" | "json" => Ok(()),
        other => Err(format!(
            "[general].log_format must be \"text\" or \"json\", got \"{other}\""
        )),
    }
}
