//! Activation-time cleanup of buckets from other versions

use super::report::{ActivationReport, ItemFailure};
use crate::cache::{CacheNames, CacheStore};
use crate::error::{KioskError, KioskResult};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

pub struct VersionManager {
    version: String,
    names: CacheNames,
    store: Arc<dyn CacheStore>,
}

impl VersionManager {
    pub fn new(version: impl Into<String>, names: CacheNames, store: Arc<dyn CacheStore>) -> Self {
        Self {
            version: version.into(),
            names,
            store,
        }
    }

    /// Delete every bucket that is not one of the current version's.
    ///
    /// Deletions run concurrently and are best effort: a failed delete is
    /// reported but does not fail activation. Only an unreadable store does.
    pub async fn activate(&self) -> KioskResult<ActivationReport> {
        let existing = self
            .store
            .bucket_names()
            .await
            .map_err(|e| KioskError::StoreUnavailable(e.to_string()))?;

        let stale: Vec<String> = existing
            .into_iter()
            .filter(|name| !self.names.is_current(name))
            .collect();

        let results = join_all(stale.iter().map(|name| async move {
            info!("Deleting old cache: {}", name);
            (name, self.store.delete_bucket(name).await)
        }))
        .await;

        let mut report = ActivationReport {
            version: self.version.clone(),
            ..Default::default()
        };
        for (name, result) in results {
            match result {
                Ok(_) => report.deleted.push(name.clone()),
                Err(e) => {
                    warn!("Failed to delete cache {}: {}", name, e);
                    report.failed.push(ItemFailure {
                        path: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Activated {} ({} old buckets removed)",
            self.version,
            report.deleted.len()
        );
        Ok(report)
    }
}
