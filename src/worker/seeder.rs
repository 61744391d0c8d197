//! Install-time seeding of the static and dynamic buckets

use super::config::WorkerConfig;
use super::report::{fetch_and_store, BatchReport, InstallReport, ItemOutcome};
use crate::cache::CacheStore;
use crate::fetch::Fetcher;
use crate::http::Request;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Seeds a version's buckets from its manifests
pub struct Seeder {
    config: Arc<WorkerConfig>,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl Seeder {
    pub fn new(
        config: Arc<WorkerConfig>,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
        }
    }

    /// Seed static assets and page routes concurrently.
    ///
    /// The two operations are independent: a failure in one never aborts
    /// the other, and each item inside them settles on its own.
    pub async fn seed(&self) -> InstallReport {
        let names = &self.config.names;
        let (static_assets, pages) = tokio::join!(
            self.seed_bucket(&names.static_bucket, &self.config.static_assets, Request::get),
            self.seed_bucket(&names.dynamic_bucket, &self.config.page_routes, Request::navigate),
        );

        if static_assets.is_complete() {
            info!("Static assets cached ({})", static_assets.stored.len());
        } else {
            warn!(
                "Static asset caching failed for {} of {} items",
                static_assets.failed.len(),
                static_assets.total()
            );
        }
        if pages.is_complete() {
            info!("Pre-cached {} pages", pages.stored.len());
        } else {
            warn!(
                "Page pre-caching failed for {} of {} routes",
                pages.failed.len(),
                pages.total()
            );
        }

        InstallReport {
            version: self.config.version.clone(),
            static_assets,
            pages,
        }
    }

    async fn seed_bucket(
        &self,
        bucket: &str,
        paths: &[String],
        make_request: fn(Url) -> Request,
    ) -> BatchReport {
        if let Err(e) = self.store.open(bucket).await {
            warn!("Cannot open bucket {}: {}", bucket, e);
            return BatchReport::unavailable(bucket, paths, &e.to_string());
        }

        let outcomes = join_all(paths.iter().map(|path| async move {
            let outcome = match self.config.resolve(path) {
                Ok(url) => {
                    fetch_and_store(
                        self.fetcher.as_ref(),
                        self.store.as_ref(),
                        bucket,
                        &make_request(url),
                    )
                    .await
                }
                Err(e) => ItemOutcome::Failed(e.to_string()),
            };
            debug!("Seed {} -> {:?}", path, outcome);
            (path, outcome)
        }))
        .await;

        let mut report = BatchReport::new(bucket);
        for (path, outcome) in outcomes {
            report.record(path, outcome);
        }
        report
    }
}
