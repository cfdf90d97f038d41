//! Cache namespace registry
//!
//! Declares the live cache partitions and the seed assets for one deployed
//! worker version. Partition names are `<prefix>-<version>`; any stored
//! partition whose name is not live is garbage and gets evicted on activate.

use crate::config::Config;
use crate::error::{SwError, SwResult};
use std::collections::HashSet;
use std::fmt;
use url::{Origin, Url};

/// Logical purpose of a cache partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionPurpose {
    /// Stylesheets, scripts, images, fonts and the seed assets
    StaticAssets,
    /// Navigated documents
    Pages,
}

impl PartitionPurpose {
    pub const ALL: [PartitionPurpose; 2] = [Self::StaticAssets, Self::Pages];
}

impl fmt::Display for PartitionPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticAssets => write!(f, "static"),
            Self::Pages => write!(f, "pages"),
        }
    }
}

/// Live partition names and seed assets for one worker version
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    base: Url,
    origin: Origin,
    version: String,
    static_name: String,
    pages_name: String,
    offline_url: String,
    seed_urls: Vec<String>,
}

impl CacheRegistry {
    /// Build and validate the registry declared by a config
    pub fn from_config(config: &Config) -> SwResult<Self> {
        let version = config.worker.version.trim();
        if version.is_empty() {
            return Err(SwError::RegistryInvalid(
                "worker version must not be empty".to_string(),
            ));
        }

        let base = Url::parse(&config.worker.origin).map_err(|e| {
            SwError::RegistryInvalid(format!(
                "worker origin '{}' is not a URL: {}",
                config.worker.origin, e
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") || base.host().is_none() {
            return Err(SwError::RegistryInvalid(format!(
                "worker origin '{}' must be an http(s) URL with a host",
                config.worker.origin
            )));
        }

        let cache = &config.cache;
        if cache.static_prefix.is_empty() || cache.pages_prefix.is_empty() {
            return Err(SwError::RegistryInvalid(
                "partition prefixes must not be empty".to_string(),
            ));
        }
        if cache.static_prefix == cache.pages_prefix {
            return Err(SwError::RegistryInvalid(format!(
                "static and pages partitions share the prefix '{}'",
                cache.static_prefix
            )));
        }

        let resolve = |path: &str| -> SwResult<String> {
            base.join(path).map(String::from).map_err(|e| {
                SwError::RegistryInvalid(format!("cannot resolve '{path}': {e}"))
            })
        };

        // The cache API rejects a bulk add containing the same request twice
        let mut seen = HashSet::new();
        let mut seed_urls = Vec::with_capacity(cache.seed_assets.len());
        for path in &cache.seed_assets {
            let url = resolve(path)?;
            if !seen.insert(url.clone()) {
                return Err(SwError::RegistryInvalid(format!(
                    "seed asset '{path}' is listed twice"
                )));
            }
            seed_urls.push(url);
        }

        let offline_url = resolve(&cache.offline_url)?;
        if !seen.contains(&offline_url) {
            return Err(SwError::RegistryInvalid(format!(
                "offline fallback '{}' must be one of the seed assets",
                cache.offline_url
            )));
        }

        Ok(Self {
            origin: base.origin(),
            base,
            version: version.to_string(),
            static_name: format!("{}-{}", cache.static_prefix, version),
            pages_name: format!("{}-{}", cache.pages_prefix, version),
            offline_url,
            seed_urls,
        })
    }

    /// Name of the live partition for a purpose
    pub fn partition(&self, purpose: PartitionPurpose) -> &str {
        match purpose {
            PartitionPurpose::StaticAssets => &self.static_name,
            PartitionPurpose::Pages => &self.pages_name,
        }
    }

    pub fn static_partition(&self) -> &str {
        &self.static_name
    }

    pub fn pages_partition(&self) -> &str {
        &self.pages_name
    }

    /// Every live partition name
    pub fn live_names(&self) -> Vec<&str> {
        PartitionPurpose::ALL
            .iter()
            .map(|p| self.partition(*p))
            .collect()
    }

    pub fn is_live(&self, name: &str) -> bool {
        name == self.static_name || name == self.pages_name
    }

    /// Absolute seed asset URLs, in declaration order
    pub fn seed_urls(&self) -> &[String] {
        &self.seed_urls
    }

    /// Absolute URL of the offline fallback document
    pub fn offline_url(&self) -> &str {
        &self.offline_url
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Origin the worker is registered for
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Resolve a path or URL against the worker origin
    pub fn resolve(&self, input: &str) -> SwResult<String> {
        self.base
            .join(input)
            .map(String::from)
            .map_err(|e| SwError::InvalidUrl {
                url: input.to_string(),
                reason: e.to_string(),
            })
    }
}
