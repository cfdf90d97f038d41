//! The service worker as seen by its host
//!
//! Ties the lifecycle steps, the router and the host together behind a
//! small state machine:
//!
//! ```text
//! Parsed → Installing → Installed → Activating → Activated
//!              └──(seed failure)──→ Redundant
//! ```
//!
//! Lifecycle steps are serialized per worker. Fetches are handled
//! concurrently and only intercepted once the worker is activated.

pub mod state;

pub use state::{WorkerRecord, WorkerState};

use crate::error::{SwError, SwResult};
use crate::host::WorkerHost;
use crate::http::{Request, Response};
use crate::lifecycle::{self, ActivationReport, InstallReport};
use crate::network::Fetcher;
use crate::registry::CacheRegistry;
use crate::router::{Dispatch, PassReason, Router};
use crate::storage::CacheStorage;
use crate::strategy::{Served, Source, Strategy, StrategyContext};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Who produced the response to a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    PassThrough(PassReason),
    Strategy(Strategy),
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassThrough(reason) => write!(f, "pass-through ({reason})"),
            Self::Strategy(strategy) => write!(f, "{strategy}"),
        }
    }
}

/// Final answer to one fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub handler: Handler,
    pub response: Response,
    pub source: Source,
}

/// A service worker instance for one deployed version
pub struct ServiceWorker {
    router: Router,
    host: Arc<dyn WorkerHost>,
    state: RwLock<WorkerState>,
    lifecycle: Mutex<()>,
}

impl ServiceWorker {
    pub fn new(
        registry: CacheRegistry,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Fetcher>,
        host: Arc<dyn WorkerHost>,
    ) -> Self {
        let ctx = StrategyContext::new(Arc::new(registry), storage, network);
        Self {
            router: Router::new(ctx),
            host,
            state: RwLock::new(WorkerState::Parsed),
            lifecycle: Mutex::new(()),
        }
    }

    /// Resume a worker whose earlier lifecycle steps ran in another process
    pub fn resume(mut self, state: WorkerState) -> Self {
        self.state = RwLock::new(state);
        self
    }

    pub fn registry(&self) -> &CacheRegistry {
        &self.router.context().registry
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }

    async fn expect_state(&self, allowed: &[WorkerState], expected: &str) -> SwResult<()> {
        let current = self.state().await;
        if allowed.contains(&current) {
            Ok(())
        } else {
            Err(SwError::WorkerState {
                state: current.to_string(),
                expected: expected.to_string(),
            })
        }
    }

    /// Seed the static partition, then ask the host to skip waiting.
    /// A failed install makes this worker redundant.
    pub async fn install(&self) -> SwResult<InstallReport> {
        let _guard = self.lifecycle.lock().await;
        self.expect_state(&[WorkerState::Parsed], "parsed").await?;
        self.set_state(WorkerState::Installing).await;

        let ctx = self.router.context();
        let result =
            lifecycle::install(&ctx.registry, ctx.storage.as_ref(), ctx.network.as_ref()).await;
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!("Install of {} failed: {}", ctx.registry.version(), e);
                self.set_state(WorkerState::Redundant).await;
                return Err(e);
            }
        };

        self.host.skip_waiting().await?;
        self.set_state(WorkerState::Installed).await;
        info!("Worker {} installed", ctx.registry.version());
        Ok(report)
    }

    /// Evict stale partitions and take control of open pages.
    /// Running it again on an active worker is harmless.
    pub async fn activate(&self) -> SwResult<ActivationReport> {
        let _guard = self.lifecycle.lock().await;
        self.expect_state(
            &[WorkerState::Installed, WorkerState::Activated],
            "installed",
        )
        .await?;
        let previous = self.state().await;
        self.set_state(WorkerState::Activating).await;

        let ctx = self.router.context();
        let mut report = match lifecycle::evict_stale(&ctx.registry, ctx.storage.as_ref()).await {
            Ok(report) => report,
            Err(e) => {
                self.set_state(previous).await;
                return Err(e);
            }
        };
        report.clients_claimed = match self.host.claim_clients(ctx.registry.version()).await {
            Ok(n) => n,
            Err(e) => {
                self.set_state(previous).await;
                return Err(e);
            }
        };

        self.set_state(WorkerState::Activated).await;
        info!(
            "Worker {} activated ({} stale partition(s) evicted)",
            ctx.registry.version(),
            report.deleted.len()
        );
        Ok(report)
    }

    /// Install and activate in one go
    pub async fn start(&self) -> SwResult<ActivationReport> {
        self.install().await?;
        self.activate().await
    }

    /// Answer one fetch from a controlled page.
    ///
    /// Intercepted requests always resolve; an error can only come from the
    /// network on a pass-through, exactly as it would without a worker.
    pub async fn handle_fetch(&self, request: Request) -> SwResult<FetchOutcome> {
        let dispatch = if self.state().await.controls_fetches() {
            self.router.route(request.clone())
        } else {
            Dispatch::PassThrough(PassReason::NotControlled)
        };

        match dispatch {
            Dispatch::PassThrough(reason) => {
                let response = self.router.context().network.fetch(&request).await?;
                Ok(FetchOutcome {
                    handler: Handler::PassThrough(reason),
                    response,
                    source: Source::Network,
                })
            }
            Dispatch::Respond { strategy, response } => {
                let Served { response, source } = response.await.unwrap_or_else(|| {
                    // Cold cache and no network: answer explicitly rather than hang
                    Served::new(Response::gateway_timeout(), Source::Synthesized)
                });
                Ok(FetchOutcome {
                    handler: Handler::Strategy(strategy),
                    response,
                    source,
                })
            }
        }
    }

    /// Wait for background cache writes before the worker goes away
    pub async fn settle(&self) {
        self.router.context().writes.settle().await;
    }
}
