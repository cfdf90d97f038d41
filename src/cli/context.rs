//! Shared setup for commands that drive the worker
//!
//! Each CLI invocation is a short-lived host process. The worker's
//! lifecycle state lives next to the caches in `worker.json`, so `install`,
//! `activate` and `fetch` run as separate commands agree on what is live.

use crate::config::{Config, ConfigManager};
use crate::error::SwResult;
use crate::host::LocalHost;
use crate::network::{Fetcher, HttpFetcher, Offline};
use crate::registry::CacheRegistry;
use crate::storage::DiskCacheStorage;
use crate::worker::{ServiceWorker, WorkerRecord, WorkerState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

const RECORD_FILE: &str = "worker.json";

/// Storage, registry and persisted state for one command
pub struct HostContext {
    pub config: Config,
    pub registry: CacheRegistry,
    pub storage: Arc<DiskCacheStorage>,
    pub record: WorkerRecord,
    record_path: PathBuf,
}

impl HostContext {
    /// Validate the config and open its cache storage
    pub async fn open(config: &Config) -> SwResult<Self> {
        let registry = CacheRegistry::from_config(config)?;
        let dir = ConfigManager::storage_dir(config);
        debug!("Using cache storage at {}", dir.display());
        let storage = Arc::new(DiskCacheStorage::new(&dir).await?);

        let record_path = dir.join(RECORD_FILE);
        let record = match WorkerRecord::load(&record_path).await? {
            Some(record) if record.version == registry.version() => record,
            _ => WorkerRecord::new(registry.version()),
        };

        Ok(Self {
            config: config.clone(),
            registry,
            storage,
            record,
            record_path,
        })
    }

    /// Build a worker resumed at the recorded state
    pub fn worker(&self, offline: bool) -> ServiceWorker {
        let network: Arc<dyn Fetcher> = if offline {
            Arc::new(Offline)
        } else {
            Arc::new(HttpFetcher::new(&self.config.network))
        };
        ServiceWorker::new(
            self.registry.clone(),
            self.storage.clone(),
            network,
            Arc::new(LocalHost::new()),
        )
        .resume(self.record.state_for(self.registry.version()))
    }

    /// Persist a new lifecycle state
    pub async fn record_state(&mut self, state: WorkerState) -> SwResult<()> {
        self.record.transition(state);
        self.record.save(&self.record_path).await
    }
}
