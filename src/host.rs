//! Host integration
//!
//! The worker asks its host for two things during its lifecycle: promotion
//! past the waiting phase, and control over already-open pages.

use crate::error::SwResult;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::info;

/// Runtime hosting a worker
#[async_trait]
pub trait WorkerHost: Send + Sync {
    /// Activate as soon as installed instead of waiting for old pages to close
    async fn skip_waiting(&self) -> SwResult<()>;

    /// Take control of every open page. Returns how many pages were claimed.
    async fn claim_clients(&self, version: &str) -> SwResult<usize>;
}

/// An open page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: String,
    pub url: String,
    /// Version of the worker controlling this page, if any
    pub controller: Option<String>,
}

/// In-process host with a simulated set of open pages
#[derive(Debug, Default)]
pub struct LocalHost {
    clients: RwLock<Vec<Client>>,
    next_id: AtomicUsize,
    skip_waiting: AtomicBool,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a page, optionally already controlled by an older worker
    pub async fn open_client(&self, url: &str, controller: Option<&str>) -> String {
        let id = format!("client-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.clients.write().await.push(Client {
            id: id.clone(),
            url: url.to_string(),
            controller: controller.map(str::to_string),
        });
        id
    }

    pub async fn clients(&self) -> Vec<Client> {
        self.clients.read().await.clone()
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerHost for LocalHost {
    async fn skip_waiting(&self) -> SwResult<()> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn claim_clients(&self, version: &str) -> SwResult<usize> {
        let mut clients = self.clients.write().await;
        for client in clients.iter_mut() {
            client.controller = Some(version.to_string());
        }
        info!("Worker {} now controls {} page(s)", version, clients.len());
        Ok(clients.len())
    }
}
