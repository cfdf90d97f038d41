//! Strategies for same-origin static assets

use super::{Served, Source, StrategyContext};
use crate::http::Request;
use tracing::{debug, warn};

/// Serve from the static partition, falling back to the network on a miss
pub(super) async fn cache_first_with_refresh(
    ctx: &StrategyContext,
    request: &Request,
) -> Option<Served> {
    let partition = ctx.registry.static_partition();
    match ctx.storage.match_in(partition, request).await {
        Ok(Some(cached)) => {
            debug!("Cache hit for {}", request.url);
            return Some(Served::new(cached, Source::Cache));
        }
        Ok(None) => {}
        Err(e) => warn!("Cache lookup for {} failed: {}", request.url, e),
    }

    match ctx.network.fetch(request).await {
        Ok(response) => {
            ctx.store_copy(partition, request, &response);
            Some(Served::new(response, Source::Network))
        }
        Err(e) => {
            debug!("{} is neither cached nor reachable: {}", request.url, e);
            None
        }
    }
}

/// Prefer a fresh script from the network, keeping the static copy current
pub(super) async fn script_network_first(
    ctx: &StrategyContext,
    request: &Request,
) -> Option<Served> {
    let partition = ctx.registry.static_partition();
    let err = match ctx.network.fetch(request).await {
        Ok(response) => {
            ctx.store_copy(partition, request, &response);
            return Some(Served::new(response, Source::Network));
        }
        Err(e) => e,
    };
    debug!("Script {} fell back to cache: {}", request.url, err);

    match ctx.storage.match_in(partition, request).await {
        Ok(cached) => cached.map(|r| Served::new(r, Source::Cache)),
        Err(e) => {
            warn!("Cache lookup for {} failed: {}", request.url, e);
            None
        }
    }
}
