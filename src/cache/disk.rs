//! On-disk bucket store
//!
//! Layout under the store root:
//!
//! ```text
//! buckets/
//!   logotip-static-v1/
//!     3f2a9c0d1e4b5a6c.json   entry metadata (key, status, headers, body length)
//!     3f2a9c0d1e4b5a6c.body   raw body bytes
//! ```
//!
//! Entry files are named by the first 16 hex chars of the SHA-256 of the
//! request key. Both files are written to a temp name and renamed into
//! place; a reader that sees metadata whose `body_len` disagrees with the
//! body file treats the entry as a miss.

use crate::cache::store::CacheStore;
use crate::error::{KioskError, KioskResult};
use crate::http::{RequestKey, Response, ResponseType};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, warn};

/// Metadata persisted next to each body file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub key: RequestKey,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub kind: ResponseType,
    pub body_len: u64,
    pub stored_at: DateTime<Utc>,
}

/// Bucket store persisted under a directory
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn buckets_dir(&self) -> PathBuf {
        self.root.join("buckets")
    }

    fn bucket_dir(&self, bucket: &str) -> KioskResult<PathBuf> {
        if bucket.is_empty()
            || bucket.starts_with('.')
            || bucket.contains(['/', '\\'])
        {
            return Err(KioskError::bucket(bucket, "invalid bucket name"));
        }
        Ok(self.buckets_dir().join(bucket))
    }

    /// Read the metadata of every entry in a bucket
    pub async fn entries(&self, bucket: &str) -> KioskResult<Vec<StoredEntry>> {
        let dir = self.bucket_dir(bucket)?;
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut entries = vec![];
        let mut read_dir = fs::read_dir(&dir)
            .await
            .map_err(|e| KioskError::io(format!("reading bucket {}", dir.display()), e))?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| KioskError::io("reading bucket entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match read_meta(&path).await {
                    Ok(meta) => entries.push(meta),
                    Err(e) => warn!("Skipping unreadable entry {}: {}", path.display(), e),
                }
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

/// File stem for a key: first 8 bytes of its SHA-256 as hex
fn entry_stem(key: &RequestKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.to_string().as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..8])
}

async fn read_meta(path: &Path) -> KioskResult<StoredEntry> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| KioskError::io(format!("reading entry {}", path.display()), e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Distinguishes temp files of concurrent writers within this process
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write to a temp file unique to this call, then rename over `path`.
/// Concurrent writers of the same entry end up last-write-wins.
async fn write_atomic(path: &Path, contents: &[u8]) -> KioskResult<()> {
    let tmp = path.with_extension(format!(
        "{}.{}-{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or("entry"),
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    fs::write(&tmp, contents)
        .await
        .map_err(|e| KioskError::io(format!("writing {}", tmp.display()), e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| KioskError::io(format!("renaming {}", tmp.display()), e))
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn open(&self, bucket: &str) -> KioskResult<()> {
        let dir = self.bucket_dir(bucket)?;
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| KioskError::io(format!("creating bucket {}", dir.display()), e))
    }

    async fn get(&self, bucket: &str, key: &RequestKey) -> KioskResult<Option<Response>> {
        let dir = self.bucket_dir(bucket)?;
        let stem = entry_stem(key);
        let meta_path = dir.join(format!("{}.json", stem));

        if !meta_path.exists() {
            return Ok(None);
        }

        let meta = read_meta(&meta_path).await?;
        if meta.key != *key {
            // Stem collision: a different key owns this slot
            debug!("Entry {} in {} belongs to {}", stem, bucket, meta.key);
            return Ok(None);
        }

        let body = match fs::read(dir.join(format!("{}.body", stem))).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KioskError::io(format!("reading body of {}", key), e)),
        };

        if body.len() as u64 != meta.body_len {
            debug!("Entry {} in {} is mid-write, treating as miss", key, bucket);
            return Ok(None);
        }

        Ok(Some(Response {
            status: meta.status,
            status_text: meta.status_text,
            headers: meta.headers,
            body: Bytes::from(body),
            kind: meta.kind,
        }))
    }

    async fn put(&self, bucket: &str, key: &RequestKey, response: &Response) -> KioskResult<()> {
        self.open(bucket).await?;
        let dir = self.bucket_dir(bucket)?;
        let stem = entry_stem(key);

        let meta = StoredEntry {
            key: key.clone(),
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            kind: response.kind,
            body_len: response.body.len() as u64,
            stored_at: Utc::now(),
        };

        write_atomic(&dir.join(format!("{}.body", stem)), &response.body).await?;
        write_atomic(
            &dir.join(format!("{}.json", stem)),
            serde_json::to_string_pretty(&meta)?.as_bytes(),
        )
        .await?;

        debug!("Stored {} in {}", key, bucket);
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> KioskResult<bool> {
        let dir = self.bucket_dir(bucket)?;
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| KioskError::io(format!("deleting bucket {}", dir.display()), e))?;
        Ok(true)
    }

    async fn bucket_names(&self) -> KioskResult<Vec<String>> {
        let dir = self.buckets_dir();
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut read_dir = fs::read_dir(&dir)
            .await
            .map_err(|e| KioskError::StoreUnavailable(format!("{}: {}", dir.display(), e)))?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| KioskError::io("reading buckets directory", e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        names.sort();
        Ok(names)
    }

    async fn keys(&self, bucket: &str) -> KioskResult<Vec<RequestKey>> {
        Ok(self
            .entries(bucket)
            .await?
            .into_iter()
            .map(|e| e.key)
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(&Url::parse("http://kiosk.local").unwrap().join(path).unwrap())
    }

    #[test]
    fn stem_is_stable() {
        let a = entry_stem(&key("/fonts/FuturaPT-Bold.ttf"));
        let b = entry_stem(&key("/fonts/FuturaPT-Bold.ttf"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a, entry_stem(&key("/fonts/FuturaPT-Book.ttf")));
    }

    #[tokio::test]
    async fn put_and_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());

        let resp = Response::new(200, "<html>offline</html>").with_header("Content-Type", "text/html");
        store.put("logotip-static-v1", &key("/offline"), &resp).await.unwrap();

        let hit = store
            .get("logotip-static-v1", &key("/offline"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit, resp);
    }

    #[tokio::test]
    async fn buckets_listed_and_deleted() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());

        store.open("logotip-static-v1").await.unwrap();
        store.put("logotip-dynamic-v1", &key("/"), &Response::new(200, "home")).await.unwrap();

        assert_eq!(
            store.bucket_names().await.unwrap(),
            vec!["logotip-dynamic-v1", "logotip-static-v1"]
        );

        assert!(store.delete_bucket("logotip-static-v1").await.unwrap());
        assert!(!store.delete_bucket("logotip-static-v1").await.unwrap());
        assert_eq!(store.bucket_names().await.unwrap(), vec!["logotip-dynamic-v1"]);
    }

    #[tokio::test]
    async fn overwrite_keeps_single_entry() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());

        store.put("b", &key("/mugs"), &Response::new(200, "v1")).await.unwrap();
        store.put("b", &key("/mugs"), &Response::new(200, "second")).await.unwrap();

        let keys = store.keys("b").await.unwrap();
        assert_eq!(keys, vec![key("/mugs")]);
        let hit = store.get("b", &key("/mugs")).await.unwrap().unwrap();
        assert_eq!(&hit.body[..], b"second");
    }

    #[tokio::test]
    async fn concurrent_puts_of_one_key_all_succeed() {
        let temp = TempDir::new().unwrap();
        let store = DiskStore::new(temp.path());
        let key = key("/mugs");

        let bodies: Vec<String> = (0..8).map(|i| format!("mugs-{}", i)).collect();
        let responses: Vec<Response> =
            bodies.iter().map(|body| Response::new(200, body.clone())).collect();
        let results = futures_util::future::join_all(
            responses
                .iter()
                .map(|response| store.put("b", &key, response)),
        )
        .await;
        assert!(results.iter().all(|r| r.is_ok()));

        let stored = store.get("b", &key).await.unwrap().unwrap();
        assert!(bodies.iter().any(|b| b.as_bytes() == &stored.body[..]));

        let leftovers = std::fs::read_dir(temp.path().join("buckets").join("b"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
        assert_eq!(store.entries("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn truncated_body_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());
        store.put("b", &key("/logo.svg"), &Response::new(200, "<svg/>")).await.unwrap();

        let body_path = dir
            .path()
            .join("buckets/b")
            .join(format!("{}.body", entry_stem(&key("/logo.svg"))));
        std::fs::write(&body_path, b"<sv").unwrap();

        assert!(store.get("b", &key("/logo.svg")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_traversal_bucket() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path());
        assert!(store.open("../escape").await.is_err());
    }

    #[tokio::test]
    async fn empty_root_has_no_buckets() {
        let dir = TempDir::new().unwrap();
        let store = DiskStore::new(dir.path().join("missing"));
        assert!(store.bucket_names().await.unwrap().is_empty());
    }
}
