//! Error types for storefront-sw
//!
//! All modules use `SwResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storefront-sw operations
pub type SwResult<T> = Result<T, SwError>;

/// All errors that can occur in storefront-sw
#[derive(Error, Debug)]
pub enum SwError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file already exists: {0}")]
    ConfigExists(PathBuf),

    // Registry errors
    #[error("Invalid cache registry: {0}")]
    RegistryInvalid(String),

    // Network errors
    #[error("Invalid request URL: {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Network request failed: {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Unsupported request method for network fetch: {0}")]
    UnsupportedMethod(String),

    // Lifecycle errors
    #[error("Install failed: seed asset {url} could not be cached: {reason}")]
    InstallFailed { url: String, reason: String },

    #[error("Worker is {state}, expected {expected}")]
    WorkerState { state: String, expected: String },

    // Storage errors
    #[error("Cache partition not found: {0}")]
    PartitionNotFound(String),

    #[error("Response for {url} is not cacheable: {reason}")]
    Uncacheable { url: String, reason: String },

    #[error("Corrupt cache entry {path}: {reason}")]
    CorruptEntry { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SwError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// The host retries installation later when a seed asset could not be
    /// fetched, so both install and network failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InstallFailed { .. } | Self::Network { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InstallFailed { .. } => {
                Some("Check that every seed asset is served by the origin, then run: storefront-sw install")
            }
            Self::Network { .. } => Some("Check that [worker].origin points at a running server"),
            Self::RegistryInvalid(_) => Some("Review the [cache] section of your config"),
            Self::WorkerState { .. } => Some("Run: storefront-sw install && storefront-sw activate"),
            Self::ConfigExists(_) => Some("Pass --force to overwrite"),
            _ => None,
        }
    }
}
