//! Network-first navigation with offline fallback

use super::{Served, Source, StrategyContext};
use crate::http::{Request, Response};
use tracing::{debug, warn};

/// Serve a navigation. Never fails: the last resort is a synthesized page.
pub(super) async fn network_first_with_fallback(ctx: &StrategyContext, request: &Request) -> Served {
    let err = match ctx.network.fetch(request).await {
        Ok(response) => {
            ctx.store_copy(ctx.registry.pages_partition(), request, &response);
            return Served::new(response, Source::Network);
        }
        Err(e) => e,
    };
    debug!("Navigation to {} fell back to cache: {}", request.url, err);

    match ctx.storage.match_request(request).await {
        Ok(Some(cached)) => return Served::new(cached, Source::Cache),
        Ok(None) => {}
        Err(e) => warn!("Cache lookup for {} failed: {}", request.url, e),
    }

    let offline = Request::get(ctx.registry.offline_url());
    match ctx.storage.match_request(&offline).await {
        Ok(Some(cached)) => return Served::new(cached, Source::OfflineFallback),
        Ok(None) => warn!("Offline document {} is not cached", offline.url),
        Err(e) => warn!("Cache lookup for {} failed: {}", offline.url, e),
    }

    Served::new(Response::offline_page(), Source::Synthesized)
}
