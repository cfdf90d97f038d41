//! In-memory cache storage

use super::{check_storable, matchable, CacheStorage};
use crate::error::{SwError, SwResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug)]
struct Partition {
    name: String,
    entries: BTreeMap<String, Response>,
}

impl Partition {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: BTreeMap::new(),
        }
    }
}

/// Cache storage held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    // Vec keeps creation order, which `keys` and `match_request` expose
    partitions: RwLock<Vec<Partition>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all partitions
    pub async fn len(&self) -> usize {
        self.partitions
            .read()
            .await
            .iter()
            .map(|p| p.entries.len())
            .sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn position(partitions: &[Partition], name: &str) -> Option<usize> {
    partitions.iter().position(|p| p.name == name)
}

fn partition_mut<'a>(partitions: &'a mut Vec<Partition>, name: &str) -> &'a mut Partition {
    let idx = match position(partitions, name) {
        Some(idx) => idx,
        None => {
            partitions.push(Partition::new(name));
            partitions.len() - 1
        }
    };
    &mut partitions[idx]
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> SwResult<()> {
        let mut partitions = self.partitions.write().await;
        partition_mut(&mut partitions, name);
        Ok(())
    }

    async fn has(&self, name: &str) -> SwResult<bool> {
        Ok(position(&self.partitions.read().await, name).is_some())
    }

    async fn keys(&self) -> SwResult<Vec<String>> {
        Ok(self
            .partitions
            .read()
            .await
            .iter()
            .map(|p| p.name.clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> SwResult<bool> {
        let mut partitions = self.partitions.write().await;
        match position(&partitions, name) {
            Some(idx) => {
                partitions.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn match_request(&self, request: &Request) -> SwResult<Option<Response>> {
        if !matchable(request) {
            return Ok(None);
        }
        let key = request.cache_key();
        Ok(self
            .partitions
            .read()
            .await
            .iter()
            .find_map(|p| p.entries.get(&key).cloned()))
    }

    async fn match_in(&self, partition: &str, request: &Request) -> SwResult<Option<Response>> {
        if !matchable(request) {
            return Ok(None);
        }
        let partitions = self.partitions.read().await;
        Ok(position(&partitions, partition)
            .and_then(|idx| partitions[idx].entries.get(&request.cache_key()).cloned()))
    }

    async fn put(&self, partition: &str, request: &Request, response: Response) -> SwResult<()> {
        check_storable(request, &response)?;
        let mut partitions = self.partitions.write().await;
        partition_mut(&mut partitions, partition)
            .entries
            .insert(request.cache_key(), response);
        Ok(())
    }

    async fn put_all(&self, partition: &str, entries: Vec<(Request, Response)>) -> SwResult<()> {
        for (request, response) in &entries {
            check_storable(request, response)?;
        }
        // Single write lock: readers see all of the batch or none of it
        let mut partitions = self.partitions.write().await;
        let target = partition_mut(&mut partitions, partition);
        for (request, response) in entries {
            target.entries.insert(request.cache_key(), response);
        }
        Ok(())
    }

    async fn entries(&self, partition: &str) -> SwResult<Vec<String>> {
        let partitions = self.partitions.read().await;
        position(&partitions, partition)
            .map(|idx| partitions[idx].entries.keys().cloned().collect())
            .ok_or_else(|| SwError::PartitionNotFound(partition.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
