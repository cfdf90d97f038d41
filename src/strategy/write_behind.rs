//! Detached cache writes
//!
//! A strategy hands the caller its response straight away and stores a
//! copy in the background. The write's outcome never reaches the caller:
//! failures are logged and dropped. Handles are kept so a host can wait
//! for outstanding writes before it tears the worker down.

use crate::http::{Request, Response};
use crate::storage::CacheStorage;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Tracker for background cache writes
#[derive(Clone, Default)]
pub struct WriteBehind {
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl WriteBehind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `response` for `request` without blocking the caller
    pub fn put(
        &self,
        storage: Arc<dyn CacheStorage>,
        partition: &str,
        request: Request,
        response: Response,
    ) {
        let partition = partition.to_string();
        let handle = tokio::spawn(async move {
            match storage.put(&partition, &request, response).await {
                Ok(()) => debug!("Cached {} in {}", request.url, partition),
                Err(e) => warn!("Background cache write to {} failed: {}", partition, e),
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Number of writes that have not finished yet
    pub fn in_flight(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Wait until every write spawned so far (and any spawned meanwhile) settles
    pub async fn settle(&self) {
        loop {
            let handles = std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("Background cache write task aborted: {}", e);
                }
            }
        }
    }
}
