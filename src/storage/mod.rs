//! Cache storage backends
//!
//! The worker never talks to a concrete store. Everything goes through
//! [`CacheStorage`], a host-wide keyed set of named partitions holding
//! request → response pairs:
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`MemoryCacheStorage`] | tests, embedding in another host |
//! | [`DiskCacheStorage`] | the command-line host, survives restarts |
//!
//! Entries are keyed by [`Request::cache_key`] and only GET requests take
//! part in matching, like the browser cache API.

mod disk;
mod memory;

pub use disk::DiskCacheStorage;
pub use memory::MemoryCacheStorage;

use crate::error::{SwError, SwResult};
use crate::http::{Method, Request, Response};
use async_trait::async_trait;

/// Host-wide cache storage
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a partition, creating it if it does not exist
    async fn open(&self, name: &str) -> SwResult<()>;

    /// Check whether a partition exists
    async fn has(&self, name: &str) -> SwResult<bool>;

    /// List partition names in creation order
    async fn keys(&self) -> SwResult<Vec<String>>;

    /// Delete a partition and every entry in it.
    /// Returns whether the partition existed.
    async fn delete(&self, name: &str) -> SwResult<bool>;

    /// Find a response in any partition, searching in creation order
    async fn match_request(&self, request: &Request) -> SwResult<Option<Response>>;

    /// Find a response in one partition. A missing partition is a miss.
    async fn match_in(&self, partition: &str, request: &Request) -> SwResult<Option<Response>>;

    /// Store a response, replacing any previous entry for the request.
    /// The partition is created if needed.
    async fn put(&self, partition: &str, request: &Request, response: Response) -> SwResult<()>;

    /// Store several entries at once
    async fn put_all(&self, partition: &str, entries: Vec<(Request, Response)>) -> SwResult<()> {
        for (request, response) in entries {
            self.put(partition, &request, response).await?;
        }
        Ok(())
    }

    /// List the cache keys stored in a partition
    async fn entries(&self, partition: &str) -> SwResult<Vec<String>>;

    /// Short backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Whether a request takes part in cache matching
pub(crate) fn matchable(request: &Request) -> bool {
    request.method == Method::Get
}

/// Reject entries the browser cache API would refuse to store
pub(crate) fn check_storable(request: &Request, response: &Response) -> SwResult<()> {
    if !matchable(request) {
        return Err(SwError::Uncacheable {
            url: request.url.clone(),
            reason: format!("{} requests are never cached", request.method),
        });
    }
    response.is_cacheable().map_err(|reason| SwError::Uncacheable {
        url: request.url.clone(),
        reason,
    })
}
