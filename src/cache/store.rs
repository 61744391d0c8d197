//! Cache store abstraction
//!
//! Provides a trait for bucketed request/response storage that can be
//! implemented by different backends (in-memory for tests and embedded
//! hosts, on-disk for the CLI host).

use crate::error::KioskResult;
use crate::http::{RequestKey, Response};
use async_trait::async_trait;

/// Abstract bucket store interface
///
/// Writes to the same key are last-write-wins. Entries are idempotent
/// (same key, equivalent response), so no further coordination is needed.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the bucket if it does not exist yet
    async fn open(&self, bucket: &str) -> KioskResult<()>;

    /// Get the entry stored under `key`, if any. A missing bucket is a miss.
    async fn get(&self, bucket: &str, key: &RequestKey) -> KioskResult<Option<Response>>;

    /// Store `response` under `key`, creating the bucket if needed
    async fn put(&self, bucket: &str, key: &RequestKey, response: &Response) -> KioskResult<()>;

    /// Delete a bucket and all its entries. Returns false if it did not exist.
    async fn delete_bucket(&self, bucket: &str) -> KioskResult<bool>;

    /// Names of all existing buckets
    async fn bucket_names(&self) -> KioskResult<Vec<String>>;

    /// Keys stored in a bucket
    async fn keys(&self, bucket: &str) -> KioskResult<Vec<RequestKey>>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;

    /// Look `key` up in each bucket in order, returning the first hit
    /// together with the bucket it came from
    async fn match_any(
        &self,
        buckets: &[&str],
        key: &RequestKey,
    ) -> KioskResult<Option<(String, Response)>> {
        for bucket in buckets {
            if let Some(response) = self.get(bucket, key).await? {
                return Ok(Some((bucket.to_string(), response)));
            }
        }
        Ok(None)
    }
}
