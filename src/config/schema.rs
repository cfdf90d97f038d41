//! Configuration schema for storefront-sw
//!
//! Configuration is stored at `~/.config/storefront-sw/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Worker identity (origin and deployed version)
    pub worker: WorkerConfig,

    /// Cache partitions and seed assets
    pub cache: CacheConfig,

    /// Cache storage location
    pub storage: StorageConfig,

    /// Network client settings
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Worker identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Origin the worker is registered for (scheme, host, port)
    pub origin: String,

    /// Version token suffixed to every partition name.
    /// Bump it whenever the seed list or routing logic changes.
    pub version: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000".to_string(),
            version: "v2".to_string(),
        }
    }
}

/// Cache partition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Name prefix of the static asset partition
    pub static_prefix: String,

    /// Name prefix of the pages partition
    pub pages_prefix: String,

    /// Path of the offline fallback document (must be a seed asset)
    pub offline_url: String,

    /// Paths pre-cached at install time
    pub seed_assets: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            static_prefix: "static".to_string(),
            pages_prefix: "pages".to_string(),
            offline_url: "/offline/".to_string(),
            seed_assets: vec![
                "/".to_string(),
                "/offline/".to_string(),
                "/static/css/style.css".to_string(),
                "/static/css/theme.css".to_string(),
            ],
        }
    }
}

/// Cache storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding cache partitions (defaults to the state dir)
    pub dir: Option<PathBuf>,
}

/// Network client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Overall per-request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("storefront-sw/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
