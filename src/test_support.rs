//! Shared fixtures for unit tests

use crate::config::Config;
use crate::error::{SwError, SwResult};
use crate::http::{Request, Response};
use crate::network::Fetcher;
use crate::registry::CacheRegistry;
use crate::storage::MemoryCacheStorage;
use crate::strategy::StrategyContext;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Network that answers only the URLs it was given; everything else fails
/// as if the device were offline
#[derive(Clone, Default)]
pub struct ScriptedNetwork {
    responses: Arc<Mutex<HashMap<String, Response>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.set(url, Response::new(status, body));
        self
    }

    pub fn set(&self, url: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> SwResult<Response> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(request.url.clone())
            .or_default() += 1;
        self.responses
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| SwError::network(&request.url, "offline"))
    }
}

pub fn registry() -> Arc<CacheRegistry> {
    Arc::new(CacheRegistry::from_config(&Config::default()).unwrap())
}

/// Strategy context over the default registry and empty memory storage
pub fn context(network: ScriptedNetwork) -> StrategyContext {
    StrategyContext::new(
        registry(),
        Arc::new(MemoryCacheStorage::new()),
        Arc::new(network),
    )
}
