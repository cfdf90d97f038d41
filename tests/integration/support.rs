//! Fakes shared by the integration tests

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use storefront_sw::config::Config;
use storefront_sw::error::{SwError, SwResult};
use storefront_sw::http::{Request, Response};
use storefront_sw::network::Fetcher;
use storefront_sw::registry::CacheRegistry;
use storefront_sw::storage::{CacheStorage, MemoryCacheStorage};

pub const ORIGIN: &str = "http://localhost:8000";

pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

/// Network with a fixed set of reachable URLs and a kill switch
#[derive(Clone, Default)]
pub struct FakeNetwork {
    responses: Arc<Mutex<HashMap<String, Response>>>,
    calls: Arc<Mutex<Vec<String>>>,
    down: Arc<Mutex<bool>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, path_or_url: &str, body: &str) {
        let key = if path_or_url.starts_with('/') {
            url(path_or_url)
        } else {
            path_or_url.to_string()
        };
        self.responses
            .lock()
            .unwrap()
            .insert(key, Response::new(200, body));
    }

    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> SwResult<Response> {
        self.calls.lock().unwrap().push(request.url.clone());
        if *self.down.lock().unwrap() {
            return Err(SwError::network(&request.url, "offline"));
        }
        self.responses
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| SwError::network(&request.url, "connection refused"))
    }
}

/// Storage wrapper that records every access and can refuse deletions
#[derive(Default)]
pub struct ObservedStorage {
    inner: MemoryCacheStorage,
    reads: Mutex<usize>,
    writes: Mutex<usize>,
    undeletable: Mutex<HashSet<String>>,
}

impl ObservedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse_delete(&self, name: &str) {
        self.undeletable.lock().unwrap().insert(name.to_string());
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

#[async_trait]
impl CacheStorage for ObservedStorage {
    async fn open(&self, name: &str) -> SwResult<()> {
        self.inner.open(name).await
    }

    async fn has(&self, name: &str) -> SwResult<bool> {
        self.inner.has(name).await
    }

    async fn keys(&self) -> SwResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, name: &str) -> SwResult<bool> {
        if self.undeletable.lock().unwrap().contains(name) {
            return Err(SwError::Internal(format!("{name} is locked")));
        }
        self.inner.delete(name).await
    }

    async fn match_request(&self, request: &Request) -> SwResult<Option<Response>> {
        *self.reads.lock().unwrap() += 1;
        self.inner.match_request(request).await
    }

    async fn match_in(&self, partition: &str, request: &Request) -> SwResult<Option<Response>> {
        *self.reads.lock().unwrap() += 1;
        self.inner.match_in(partition, request).await
    }

    async fn put(&self, partition: &str, request: &Request, response: Response) -> SwResult<()> {
        *self.writes.lock().unwrap() += 1;
        self.inner.put(partition, request, response).await
    }

    async fn entries(&self, partition: &str) -> SwResult<Vec<String>> {
        self.inner.entries(partition).await
    }

    fn backend_name(&self) -> &'static str {
        "observed"
    }
}

pub fn registry(version: &str, seeds: &[&str]) -> CacheRegistry {
    let mut config = Config::default();
    config.worker.origin = ORIGIN.to_string();
    config.worker.version = version.to_string();
    config.cache.seed_assets = seeds.iter().map(|s| s.to_string()).collect();
    CacheRegistry::from_config(&config).unwrap()
}
