//! Outcome reports for install, activation and warming

use crate::cache::CacheStore;
use crate::error::KioskResult;
use crate::fetch::Fetcher;
use crate::http::Request;
use serde::Serialize;

/// One item that could not be cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub path: String,
    pub reason: String,
}

/// Per-item results of a batch of fetch-and-store operations on one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub bucket: String,
    pub stored: Vec<String>,
    /// Not fetched: already cached, cross-origin or not cacheable
    pub skipped: Vec<String>,
    pub failed: Vec<ItemFailure>,
    /// The bucket itself could not be opened
    pub unavailable: bool,
}

impl BatchReport {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Report for a bucket that could not be opened; every item failed
    pub fn unavailable(bucket: impl Into<String>, paths: &[String], reason: &str) -> Self {
        let mut report = Self::new(bucket);
        report.unavailable = true;
        report.failed = paths
            .iter()
            .map(|p| ItemFailure {
                path: p.clone(),
                reason: reason.to_string(),
            })
            .collect();
        report
    }

    pub fn record(&mut self, path: &str, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Stored => self.stored.push(path.to_string()),
            ItemOutcome::Skipped => self.skipped.push(path.to_string()),
            ItemOutcome::Failed(reason) => self.failed.push(ItemFailure {
                path: path.to_string(),
                reason,
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.stored.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.unavailable
    }
}

/// Result of install: both seeding operations, settled independently
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub static_assets: BatchReport,
    pub pages: BatchReport,
}

impl InstallReport {
    /// Neither bucket could be opened
    pub fn store_unavailable(&self) -> bool {
        self.static_assets.unavailable && self.pages.unavailable
    }
}

/// Result of activation cleanup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub version: String,
    pub deleted: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

/// Outcome of one item in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Stored,
    Skipped,
    Failed(String),
}

/// Fetch `request` and store it in `bucket` if the response is storable.
/// Never fails: every error becomes an `ItemOutcome::Failed`.
pub(crate) async fn fetch_and_store(
    fetcher: &dyn Fetcher,
    store: &dyn CacheStore,
    bucket: &str,
    request: &Request,
) -> ItemOutcome {
    match try_fetch_and_store(fetcher, store, bucket, request).await {
        Ok(outcome) => outcome,
        Err(e) => ItemOutcome::Failed(e.to_string()),
    }
}

async fn try_fetch_and_store(
    fetcher: &dyn Fetcher,
    store: &dyn CacheStore,
    bucket: &str,
    request: &Request,
) -> KioskResult<ItemOutcome> {
    let response = fetcher.fetch(request).await?;
    if !response.is_storable() {
        return Ok(ItemOutcome::Failed(format!(
            "status {} ({:?})",
            response.status, response.kind
        )));
    }
    store.put(bucket, &request.cache_key(), &response).await?;
    Ok(ItemOutcome::Stored)
}
