//! Caching strategies
//!
//! Each strategy is a fixed decision procedure for one class of request:
//!
//! | Strategy | Used for | Order |
//! |----------|----------|-------|
//! | [`Strategy::NetworkFirstWithFallback`] | navigations | network → any cache → offline page → synthesized page |
//! | [`Strategy::CacheFirstWithRefresh`] | same-origin styles, images, fonts | static cache → network |
//! | [`Strategy::ScriptNetworkFirst`] | same-origin scripts | network → static cache |
//!
//! Successful network responses are cloned and written back in the
//! background; the caller's response never waits on the write.

mod assets;
mod navigation;
mod write_behind;

pub use write_behind::WriteBehind;

use crate::http::{Request, Response};
use crate::network::Fetcher;
use crate::registry::CacheRegistry;
use crate::storage::CacheStorage;
use std::fmt;
use std::sync::Arc;

/// Where a served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Network,
    Cache,
    /// The pre-cached offline document
    OfflineFallback,
    /// Built locally because nothing else was available
    Synthesized,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
            Self::OfflineFallback => write!(f, "offline-fallback"),
            Self::Synthesized => write!(f, "synthesized"),
        }
    }
}

/// A response together with its origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: Source,
}

impl Served {
    pub fn new(response: Response, source: Source) -> Self {
        Self { response, source }
    }
}

/// The strategies a request can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirstWithFallback,
    CacheFirstWithRefresh,
    ScriptNetworkFirst,
}

impl Strategy {
    /// Run the strategy. Only navigation is guaranteed to produce a response;
    /// the asset strategies resolve to `None` when offline with a cold cache.
    pub async fn execute(self, ctx: &StrategyContext, request: &Request) -> Option<Served> {
        match self {
            Self::NetworkFirstWithFallback => {
                Some(navigation::network_first_with_fallback(ctx, request).await)
            }
            Self::CacheFirstWithRefresh => assets::cache_first_with_refresh(ctx, request).await,
            Self::ScriptNetworkFirst => assets::script_network_first(ctx, request).await,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkFirstWithFallback => write!(f, "network-first-with-fallback"),
            Self::CacheFirstWithRefresh => write!(f, "cache-first-with-refresh"),
            Self::ScriptNetworkFirst => write!(f, "script-network-first"),
        }
    }
}

/// Dependencies shared by every strategy invocation
#[derive(Clone)]
pub struct StrategyContext {
    pub registry: Arc<CacheRegistry>,
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Fetcher>,
    pub writes: WriteBehind,
}

impl StrategyContext {
    pub fn new(
        registry: Arc<CacheRegistry>,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            registry,
            storage,
            network,
            writes: WriteBehind::new(),
        }
    }

    /// Queue a background write of a response copy
    fn store_copy(&self, partition: &str, request: &Request, response: &Response) {
        self.writes.put(
            self.storage.clone(),
            partition,
            request.clone(),
            response.clone(),
        );
    }
}
