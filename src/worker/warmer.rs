//! On-demand warming of the dynamic bucket
//!
//! `warm_all` re-fetches the page routes and warm-up assets; `cache_urls`
//! stores arbitrary same-origin URLs the page reports (visible images).

use super::config::WorkerConfig;
use super::report::{fetch_and_store, BatchReport, ItemOutcome};
use crate::cache::CacheStore;
use crate::fetch::Fetcher;
use crate::http::{Request, RequestKey};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub struct Warmer {
    config: Arc<WorkerConfig>,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
}

/// What to do with one requested URL
enum Target {
    Fetch(Request),
    Skip(&'static str),
}

impl Warmer {
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

    /// Fetch every page route and warm-up asset into the dynamic bucket.
    /// Entries already present are refreshed.
    pub async fn warm_all(&self) -> BatchReport {
        let bucket = self.config.names.dynamic_bucket.as_str();

        let mut targets: Vec<(String, Result<Request, String>)> = Vec::new();
        for path in &self.config.page_routes {
            targets.push((path.clone(), self.request_for(path, Request::navigate)));
        }
        for path in &self.config.warm_assets {
            if self.config.page_routes.contains(path) {
                continue;
            }
            targets.push((path.clone(), self.request_for(path, Request::get)));
        }

        let outcomes = join_all(targets.iter().map(|(path, request)| async move {
            let outcome = match request {
                Ok(request) => {
                    fetch_and_store(self.fetcher.as_ref(), self.store.as_ref(), bucket, request)
                        .await
                }
                Err(reason) => ItemOutcome::Failed(reason.clone()),
            };
            (path, outcome)
        }))
        .await;

        let mut report = BatchReport::new(bucket);
        for (path, outcome) in outcomes {
            if let ItemOutcome::Failed(reason) = &outcome {
                debug!("Warm-up failed for {}: {}", path, reason);
            }
            report.record(path, outcome);
        }

        if report.failed.is_empty() {
            info!("All pages cached ({})", report.stored.len());
        } else {
            warn!(
                "Warm-up cached {} of {} items",
                report.stored.len(),
                report.total()
            );
        }
        report
    }

    /// Store each URL not already cached. `data:` URLs, non-http schemes
    /// and other origins are skipped.
    pub async fn cache_urls(&self, urls: &[String]) -> BatchReport {
        let bucket = self.config.names.dynamic_bucket.as_str();

        let outcomes = join_all(urls.iter().map(|raw| async move {
            let outcome = match self.classify(raw).await {
                Target::Fetch(request) => {
                    fetch_and_store(self.fetcher.as_ref(), self.store.as_ref(), bucket, &request)
                        .await
                }
                Target::Skip(why) => {
                    debug!("Skipping {}: {}", raw, why);
                    ItemOutcome::Skipped
                }
            };
            (raw, outcome)
        }))
        .await;

        let mut report = BatchReport::new(bucket);
        for (raw, outcome) in outcomes {
            report.record(raw, outcome);
        }

        debug!(
            "Cached {} of {} reported URLs",
            report.stored.len(),
            report.total()
        );
        report
    }

    fn request_for(&self, path: &str, make: fn(Url) -> Request) -> Result<Request, String> {
        self.config.resolve(path).map(make).map_err(|e| e.to_string())
    }

    async fn classify(&self, raw: &str) -> Target {
        if raw.starts_with("data:") {
            return Target::Skip("inline data");
        }
        let url = match self.config.resolve(raw) {
            Ok(url) => url,
            Err(_) => return Target::Skip("unparseable"),
        };
        if !matches!(url.scheme(), "http" | "https") {
            return Target::Skip("not http");
        }
        if !self.config.is_same_origin(&url) {
            return Target::Skip("cross-origin");
        }

        let key = RequestKey::get(&url);
        match self
            .store
            .match_any(&self.config.names.current(), &key)
            .await
        {
            Ok(Some(_)) => Target::Skip("already cached"),
            Ok(None) => Target::Fetch(Request::get(url)),
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", key, e);
                Target::Fetch(Request::get(url))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::http::Response;
    use crate::testing::{test_config, url, ScriptedFetcher};

    fn warmer(fetcher: Arc<ScriptedFetcher>, store: Arc<MemoryStore>) -> Warmer {
        Warmer::new(Arc::new(test_config("v1")), store, fetcher)
    }

    #[tokio::test]
    async fn warm_all_covers_routes_and_assets() {
        let fetcher = Arc::new(ScriptedFetcher::site());
        let store = Arc::new(MemoryStore::new());

        let report = warmer(fetcher.clone(), store.clone()).warm_all().await;

        assert!(report.failed.is_empty());
        assert_eq!(report.stored.len(), 5);
        assert_eq!(store.len("kiosk-dynamic-v1").await, 5);
        assert_eq!(fetcher.call_count("/"), 1);
    }

    #[tokio::test]
    async fn warm_all_isolates_failures() {
        let fetcher = Arc::new(ScriptedFetcher::site());
        fetcher.fail("/mugs");
        let store = Arc::new(MemoryStore::new());

        let report = warmer(fetcher, store.clone()).warm_all().await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, "/mugs");
        assert_eq!(report.stored.len(), 4);
    }

    #[tokio::test]
    async fn one_failed_page_of_ten_leaves_the_rest_cached() {
        let routes: Vec<String> = (1..=10).map(|i| format!("/page-{}", i)).collect();
        let fetcher = Arc::new(ScriptedFetcher::new());
        for route in &routes {
            fetcher.serve(route, Response::new(200, format!("body of {}", route)));
        }
        fetcher.fail("/page-3");
        let store = Arc::new(MemoryStore::new());
        let config = WorkerConfig {
            page_routes: routes.clone(),
            warm_assets: Vec::new(),
            ..test_config("v1")
        };

        let report = Warmer::new(Arc::new(config), store.clone(), fetcher)
            .warm_all()
            .await;

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, "/page-3");
        assert_eq!(report.stored.len(), 9);
        assert_eq!(store.len("kiosk-dynamic-v1").await, 9);
        let page_4 = store
            .get("kiosk-dynamic-v1", &RequestKey::get(&url("/page-4")))
            .await
            .unwrap();
        assert!(page_4.is_some());
    }

    #[tokio::test]
    async fn warm_all_refreshes_existing_entries() {
        let fetcher = Arc::new(ScriptedFetcher::site());
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                "kiosk-dynamic-v1",
                &RequestKey::get(&url("/mugs")),
                &Response::new(200, "old mugs"),
            )
            .await
            .unwrap();

        warmer(fetcher, store.clone()).warm_all().await;

        let mugs = store
            .get("kiosk-dynamic-v1", &RequestKey::get(&url("/mugs")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&mugs.body[..], b"body of /mugs");
    }

    #[tokio::test]
    async fn cache_urls_filters_and_dedupes() {
        let fetcher = Arc::new(ScriptedFetcher::site());
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                "kiosk-static-v1",
                &RequestKey::get(&url("/logo.svg")),
                &Response::new(200, "logo"),
            )
            .await
            .unwrap();

        let urls: Vec<String> = [
            "data:image/png;base64,AAAA",
            "/logo.svg",
            "http://kiosk.local/assets/mugs/a.jpg",
            "/assets/mugs/b.jpg",
            "https://cdn.example.com/x.jpg",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let report = warmer(fetcher.clone(), store.clone()).cache_urls(&urls).await;

        assert_eq!(
            report.stored,
            vec!["http://kiosk.local/assets/mugs/a.jpg", "/assets/mugs/b.jpg"]
        );
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(fetcher.calls().len(), 2);
        assert_eq!(store.len("kiosk-dynamic-v1").await, 2);
    }

    #[tokio::test]
    async fn cache_urls_offline_reports_failures() {
        let fetcher = Arc::new(ScriptedFetcher::site());
        fetcher.set_offline(true);
        let store = Arc::new(MemoryStore::new());

        let report = warmer(fetcher, store)
            .cache_urls(&["/assets/mugs/b.jpg".to_string()])
            .await;

        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("network unreachable"));
    }
}
