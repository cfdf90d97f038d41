//! On-disk cache storage
//!
//! Layout under the storage root:
//!
//! ```text
//! partitions.json              creation-ordered partition list
//! <sha256(name)[..16]>/        one directory per partition
//!     <sha256(key)>.entry      JSON metadata line, '\n', raw body
//! ```
//!
//! Every file is written to a temporary sibling and renamed into place, so
//! an entry is either the old one or the new one, never a mix. A batch
//! keeps the replaced files until every rename succeeded and puts them back
//! otherwise. Deleted partitions are renamed to `<dir>.trash-*` before they
//! leave the manifest; leftovers are swept when storage is opened.

use super::{check_storable, matchable, CacheStorage};
use crate::error::{SwError, SwResult};
use crate::http::{Headers, Request, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const MANIFEST_FILE: &str = "partitions.json";
const ENTRY_EXT: &str = "entry";
const TRASH_MARKER: &str = ".trash-";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One partition as recorded in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PartitionRecord {
    name: String,
    dir: String,
    created_at: DateTime<Utc>,
}

/// Metadata line stored ahead of an entry's body
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    status_text: String,
    headers: Headers,
    cached_at: DateTime<Utc>,
    body_len: usize,
}

/// Cache storage persisted under a directory
pub struct DiskCacheStorage {
    root: PathBuf,
    // Serializes manifest read-modify-write cycles within this process
    manifest_lock: Mutex<()>,
}

impl DiskCacheStorage {
    /// Open (or create) storage rooted at `root`
    pub async fn new(root: impl Into<PathBuf>) -> SwResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| SwError::io(format!("creating cache root {}", root.display()), e))?;
        sweep_trash(&root).await;
        Ok(Self {
            root,
            manifest_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn entry_path(&self, record: &PartitionRecord, key: &str) -> PathBuf {
        self.root
            .join(&record.dir)
            .join(format!("{}.{}", digest(key), ENTRY_EXT))
    }

    async fn read_manifest(&self) -> SwResult<Vec<PartitionRecord>> {
        let path = self.manifest_path();
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| SwError::CorruptEntry {
                path,
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(SwError::io(format!("reading {}", path.display()), e)),
        }
    }

    async fn write_manifest(&self, records: &[PartitionRecord]) -> SwResult<()> {
        let bytes = serde_json::to_vec_pretty(records)?;
        write_atomic(&self.manifest_path(), &bytes).await
    }

    async fn find(&self, name: &str) -> SwResult<Option<PartitionRecord>> {
        Ok(self
            .read_manifest()
            .await?
            .into_iter()
            .find(|r| r.name == name))
    }

    /// Look up a partition, creating it when missing
    async fn ensure(&self, name: &str) -> SwResult<PartitionRecord> {
        let _guard = self.manifest_lock.lock().await;
        let mut records = self.read_manifest().await?;
        if let Some(record) = records.iter().find(|r| r.name == name) {
            return Ok(record.clone());
        }

        let record = PartitionRecord {
            name: name.to_string(),
            dir: digest(name)[..16].to_string(),
            created_at: Utc::now(),
        };
        let dir = self.root.join(&record.dir);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SwError::io(format!("creating partition dir {}", dir.display()), e))?;
        records.push(record.clone());
        self.write_manifest(&records).await?;
        debug!("Created cache partition {} at {}", name, dir.display());
        Ok(record)
    }

    async fn read_entry(&self, path: &Path) -> SwResult<Option<Response>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SwError::io(format!("reading {}", path.display()), e)),
        };
        decode_entry(path, &bytes).map(|(_, response)| Some(response))
    }

    async fn write_entry(
        &self,
        record: &PartitionRecord,
        request: &Request,
        response: &Response,
    ) -> SwResult<()> {
        let key = request.cache_key();
        let bytes = encode_entry(&key, response)?;
        write_atomic(&self.entry_path(record, &key), &bytes).await
    }

    /// Write a batch of entries so that either all of them land or none do
    async fn write_batch(
        &self,
        record: &PartitionRecord,
        entries: &[(Request, Response)],
    ) -> SwResult<()> {
        let encoded = entries
            .iter()
            .map(|(request, response)| {
                let key = request.cache_key();
                Ok((self.entry_path(record, &key), encode_entry(&key, response)?))
            })
            .collect::<SwResult<Vec<_>>>()?;

        let mut staged = Vec::with_capacity(encoded.len());
        for (path, bytes) in &encoded {
            match stage(path, bytes).await {
                Ok(tmp) => staged.push((tmp, path.clone())),
                Err(e) => {
                    discard(staged.iter().map(|(tmp, _)| tmp).collect::<Vec<_>>()).await;
                    return Err(e);
                }
            }
        }

        let mut committed: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(staged.len());
        for (idx, (tmp, path)) in staged.iter().enumerate() {
            match swap_in(tmp, path).await {
                Ok(backup) => committed.push((path.clone(), backup)),
                Err(e) => {
                    discard(staged[idx..].iter().map(|(tmp, _)| tmp).collect::<Vec<_>>()).await;
                    roll_back(committed).await;
                    return Err(e);
                }
            }
        }

        discard(committed.iter().filter_map(|(_, backup)| backup.as_ref()).collect::<Vec<_>>()).await;
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> SwResult<()> {
        self.ensure(name).await.map(|_| ())
    }

    async fn has(&self, name: &str) -> SwResult<bool> {
        Ok(self.find(name).await?.is_some())
    }

    async fn keys(&self) -> SwResult<Vec<String>> {
        Ok(self
            .read_manifest()
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    async fn delete(&self, name: &str) -> SwResult<bool> {
        let _guard = self.manifest_lock.lock().await;
        let mut records = self.read_manifest().await?;
        let Some(idx) = records.iter().position(|r| r.name == name) else {
            return Ok(false);
        };
        let record = records.remove(idx);

        // Move the directory out of the way while the partition is still
        // listed, so a failure leaves it both visible and intact
        let dir = self.root.join(&record.dir);
        let trash = sibling(&dir, "trash");
        let moved = match fs::rename(&dir, &trash).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                return Err(SwError::io(
                    format!("removing partition dir {}", dir.display()),
                    e,
                ))
            }
        };

        if let Err(e) = self.write_manifest(&records).await {
            if moved {
                if let Err(restore) = fs::rename(&trash, &dir).await {
                    warn!("Could not restore {}: {}", dir.display(), restore);
                }
            }
            return Err(e);
        }

        if moved {
            if let Err(e) = fs::remove_dir_all(&trash).await {
                // Unreachable by name now; swept on next open
                warn!("Could not remove {}: {}", trash.display(), e);
            }
        }
        Ok(true)
    }

    async fn match_request(&self, request: &Request) -> SwResult<Option<Response>> {
        if !matchable(request) {
            return Ok(None);
        }
        let key = request.cache_key();
        for record in self.read_manifest().await? {
            if let Some(response) = self.read_entry(&self.entry_path(&record, &key)).await? {
                return Ok(Some(response));
            }
        }
        Ok(None)
    }

    async fn match_in(&self, partition: &str, request: &Request) -> SwResult<Option<Response>> {
        if !matchable(request) {
            return Ok(None);
        }
        match self.find(partition).await? {
            Some(record) => {
                self.read_entry(&self.entry_path(&record, &request.cache_key()))
                    .await
            }
            None => Ok(None),
        }
    }

    async fn put(&self, partition: &str, request: &Request, response: Response) -> SwResult<()> {
        check_storable(request, &response)?;
        let record = self.ensure(partition).await?;
        self.write_entry(&record, request, &response).await
    }

    async fn put_all(&self, partition: &str, entries: Vec<(Request, Response)>) -> SwResult<()> {
        for (request, response) in &entries {
            check_storable(request, response)?;
        }
        let record = self.ensure(partition).await?;
        self.write_batch(&record, &entries).await
    }

    async fn entries(&self, partition: &str) -> SwResult<Vec<String>> {
        let record = self
            .find(partition)
            .await?
            .ok_or_else(|| SwError::PartitionNotFound(partition.to_string()))?;
        let dir = self.root.join(&record.dir);

        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SwError::io(format!("listing {}", dir.display()), e)),
        };

        let mut urls = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| SwError::io(format!("listing {}", dir.display()), e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            let bytes = fs::read(&path)
                .await
                .map_err(|e| SwError::io(format!("reading {}", path.display()), e))?;
            let (url, _) = decode_entry(&path, &bytes)?;
            urls.push(url);
        }
        urls.sort();
        Ok(urls)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}

fn digest(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

fn encode_entry(key: &str, response: &Response) -> SwResult<Vec<u8>> {
    let meta = EntryMeta {
        url: key.to_string(),
        status: response.status,
        status_text: response.status_text.clone(),
        headers: response.headers.clone(),
        cached_at: Utc::now(),
        body_len: response.body.len(),
    };
    // Compact JSON escapes newlines, so the first '\n' ends the metadata
    let mut bytes = serde_json::to_vec(&meta)?;
    bytes.push(b'\n');
    bytes.extend_from_slice(&response.body);
    Ok(bytes)
}

fn decode_entry(path: &Path, bytes: &[u8]) -> SwResult<(String, Response)> {
    let corrupt = |reason: String| SwError::CorruptEntry {
        path: path.to_path_buf(),
        reason,
    };

    let split = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| corrupt("missing metadata line".to_string()))?;
    let meta: EntryMeta =
        serde_json::from_slice(&bytes[..split]).map_err(|e| corrupt(e.to_string()))?;
    let body = &bytes[split + 1..];
    if body.len() != meta.body_len {
        return Err(corrupt(format!(
            "body is {} bytes, expected {}",
            body.len(),
            meta.body_len
        )));
    }

    Ok((
        meta.url,
        Response {
            status: meta.status,
            status_text: meta.status_text,
            headers: meta.headers,
            body: body.to_vec(),
        },
    ))
}

/// Unique sibling path such as `<name>.tmp-<pid>-<n>`
fn sibling(path: &Path, kind: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(
        ".{}-{}-{}",
        kind,
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    PathBuf::from(name)
}

/// Write `bytes` next to `path` and return the temporary file
async fn stage(path: &Path, bytes: &[u8]) -> SwResult<PathBuf> {
    let tmp = sibling(path, "tmp");
    if let Err(e) = fs::write(&tmp, bytes).await {
        discard([&tmp]).await;
        return Err(SwError::io(format!("writing {}", tmp.display()), e));
    }
    Ok(tmp)
}

/// Rename a staged file over `path`, keeping any previous file as a backup
async fn swap_in(tmp: &Path, path: &Path) -> SwResult<Option<PathBuf>> {
    let backup = match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {
            let backup = sibling(path, "bak");
            fs::rename(path, &backup)
                .await
                .map_err(|e| SwError::io(format!("backing up {}", path.display()), e))?;
            Some(backup)
        }
        _ => None,
    };

    if let Err(e) = fs::rename(tmp, path).await {
        if let Some(backup) = &backup {
            if let Err(restore) = fs::rename(backup, path).await {
                warn!("Could not restore {}: {}", path.display(), restore);
            }
        }
        return Err(SwError::io(format!("replacing {}", path.display()), e));
    }
    Ok(backup)
}

/// Undo committed renames, newest first
async fn roll_back(committed: Vec<(PathBuf, Option<PathBuf>)>) {
    for (path, backup) in committed.into_iter().rev() {
        let result = match &backup {
            Some(backup) => fs::rename(backup, &path).await,
            None => fs::remove_file(&path).await,
        };
        if let Err(e) = result {
            warn!("Could not roll back {}: {}", path.display(), e);
        }
    }
}

/// Best-effort removal of temporary files
async fn discard<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) {
    for path in paths {
        let _ = fs::remove_file(path).await;
    }
}

/// Remove partition directories left behind by interrupted deletes
async fn sweep_trash(root: &Path) {
    let Ok(mut read_dir) = fs::read_dir(root).await else {
        return;
    };
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let is_trash = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.contains(TRASH_MARKER));
        if !is_trash {
            continue;
        }
        match fs::remove_dir_all(entry.path()).await {
            Ok(()) => debug!("Swept {}", entry.path().display()),
            Err(e) => warn!("Could not sweep {}: {}", entry.path().display(), e),
        }
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> SwResult<()> {
    let tmp = stage(path, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        discard([&tmp]).await;
        return Err(SwError::io(format!("replacing {}", path.display()), e));
    }
    Ok(())
}
