//! In-memory bucket store

use crate::cache::store::CacheStore;
use crate::error::KioskResult;
use crate::http::{RequestKey, Response};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

type Bucket = BTreeMap<RequestKey, Response>;

/// Bucket store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<BTreeMap<String, Bucket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a bucket (0 if missing)
    pub async fn len(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map(|b| b.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, bucket: &str) -> KioskResult<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &RequestKey) -> KioskResult<Option<Response>> {
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .and_then(|b| b.get(key))
            .cloned())
    }

    async fn put(&self, bucket: &str, key: &RequestKey, response: &Response) -> KioskResult<()> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(key.clone(), response.clone());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> KioskResult<bool> {
        Ok(self.buckets.write().await.remove(bucket).is_some())
    }

    async fn bucket_names(&self) -> KioskResult<Vec<String>> {
        Ok(self.buckets.read().await.keys().cloned().collect())
    }

    async fn keys(&self, bucket: &str) -> KioskResult<Vec<RequestKey>> {
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
