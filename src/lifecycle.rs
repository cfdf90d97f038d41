//! Install and activate steps of the worker lifecycle
//!
//! Install pre-populates the static partition with every seed asset, all or
//! nothing. Activate evicts every partition that is not live for this
//! version; eviction is partition-granular and there is no per-entry expiry.

use crate::error::{SwError, SwResult};
use crate::http::Request;
use crate::network::Fetcher;
use crate::registry::CacheRegistry;
use crate::storage::CacheStorage;
use futures_util::future::join_all;
use tracing::{debug, info, warn};

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub partition: String,
    pub seeded: Vec<String>,
}

/// Result of an activation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Live partitions left in place
    pub kept: Vec<String>,
    /// Stale partitions removed
    pub deleted: Vec<String>,
    /// Stale partitions whose deletion failed, with the reason
    pub failed: Vec<(String, String)>,
    /// Pages taken over by this version
    pub clients_claimed: usize,
}

/// Fetch every seed asset and store them in the static partition.
///
/// Nothing is written unless every seed answered with a 2xx status.
pub async fn install(
    registry: &CacheRegistry,
    storage: &dyn CacheStorage,
    network: &dyn Fetcher,
) -> SwResult<InstallReport> {
    let requests: Vec<Request> = registry.seed_urls().iter().map(Request::get).collect();
    let results = join_all(requests.iter().map(|r| network.fetch(r))).await;

    let mut entries = Vec::with_capacity(requests.len());
    for (request, result) in requests.into_iter().zip(results) {
        let response = result.map_err(|e| SwError::InstallFailed {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;
        if !response.ok() {
            return Err(SwError::InstallFailed {
                url: request.url.clone(),
                reason: format!("status {}", response.status),
            });
        }
        debug!("Seed asset {} fetched", request.url);
        entries.push((request, response));
    }

    let partition = registry.static_partition();
    let existed = storage.has(partition).await?;
    let seeded: Vec<String> = entries.iter().map(|(r, _)| r.cache_key()).collect();
    if let Err(e) = storage.put_all(partition, entries).await {
        if !existed {
            // Leave no half-filled partition behind
            if let Err(cleanup) = storage.delete(partition).await {
                warn!("Could not remove partial partition {}: {}", partition, cleanup);
            }
        }
        return Err(e);
    }

    info!("Installed {} seed assets into {}", seeded.len(), partition);
    Ok(InstallReport {
        partition: partition.to_string(),
        seeded,
    })
}

/// Delete every partition that is not live. A failed deletion is recorded
/// and the remaining deletions still run.
pub async fn evict_stale(
    registry: &CacheRegistry,
    storage: &dyn CacheStorage,
) -> SwResult<ActivationReport> {
    let (kept, stale): (Vec<String>, Vec<String>) = storage
        .keys()
        .await?
        .into_iter()
        .partition(|name| registry.is_live(name));

    let outcomes = join_all(stale.iter().map(|name| storage.delete(name))).await;

    let mut report = ActivationReport {
        kept,
        ..Default::default()
    };
    for (name, outcome) in stale.into_iter().zip(outcomes) {
        match outcome {
            Ok(true) => {
                info!("Evicted stale partition {}", name);
                report.deleted.push(name);
            }
            // Already gone, e.g. a concurrent eviction got there first
            Ok(false) => debug!("Stale partition {} already removed", name),
            Err(e) => {
                warn!("Failed to evict stale partition {}: {}", name, e);
                report.failed.push((name, e.to_string()));
            }
        }
    }
    Ok(report)
}
