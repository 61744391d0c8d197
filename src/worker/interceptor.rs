//! Cache-first request resolution with offline fallbacks
//!
//! Resolution order for an in-scope GET:
//!
//! 1. Cached entry in any current bucket (static first)
//! 2. Network; a storable, cacheable response is written to the dynamic
//!    bucket in the background
//! 3. On network failure, navigations get the cached page, then the
//!    offline page; everything else gets a synthetic 503

use super::config::WorkerConfig;
use super::tasks::BackgroundTasks;
use crate::cache::{should_cache, CacheStore};
use crate::fetch::Fetcher;
use crate::http::{Method, Request, RequestKey, Response};
use std::sync::Arc;
use tracing::{debug, warn};

/// How an intercepted request was answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Not handled; the host applies default network handling
    Passthrough,
    Respond {
        response: Response,
        source: ResponseSource,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Hit in a current bucket
    Cache { bucket: String },
    /// Fresh from the network; `stored` when a background write was scheduled
    Network { stored: bool },
    /// Network failed; the cached copy of the page was served
    CachedPage,
    /// Network failed; the offline page was served
    OfflinePage,
    /// Network failed and nothing cached applies
    Synthetic,
    /// Default handling by the host, outside the worker
    Passthrough,
}

impl Resolution {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Passthrough => None,
            Self::Respond { response, .. } => Some(response),
        }
    }
}

pub struct Interceptor {
    config: Arc<WorkerConfig>,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    tasks: Arc<BackgroundTasks>,
}

impl Interceptor {
    pub fn new(
        config: Arc<WorkerConfig>,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        tasks: Arc<BackgroundTasks>,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
            tasks,
        }
    }

    /// Resolve one intercepted request. Never fails: every path ends in a
    /// response or a passthrough.
    pub async fn resolve(&self, request: &Request) -> Resolution {
        if request.method != Method::Get || !request.is_http() {
            debug!("Passing through {} {}", request.method, request.url);
            return Resolution::Passthrough;
        }

        let key = request.cache_key();
        if let Some((bucket, response)) = self.lookup(&key).await {
            debug!("Cache hit for {} in {}", key, bucket);
            return Resolution::Respond {
                response,
                source: ResponseSource::Cache { bucket },
            };
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => self.on_network_response(request, key, response),
            Err(e) => {
                debug!("Network failed for {}: {}", key, e);
                self.fallback(request, &key).await
            }
        }
    }

    /// Lookup across current buckets. A failing store is treated as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<(String, Response)> {
        match self.store.match_any(&self.config.names.current(), key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    fn on_network_response(
        &self,
        request: &Request,
        key: RequestKey,
        response: Response,
    ) -> Resolution {
        if !response.is_storable() || !should_cache(request) {
            return Resolution::Respond {
                response,
                source: ResponseSource::Network { stored: false },
            };
        }

        let store = self.store.clone();
        let bucket = self.config.names.dynamic_bucket.clone();
        let copy = response.clone();
        self.tasks.spawn(async move {
            if let Err(e) = store.put(&bucket, &key, &copy).await {
                warn!("Failed to cache {}: {}", key, e);
            }
        });

        Resolution::Respond {
            response,
            source: ResponseSource::Network { stored: true },
        }
    }

    async fn fallback(&self, request: &Request, key: &RequestKey) -> Resolution {
        if request.is_navigation() {
            // A concurrent write may have landed since the first lookup
            if let Some((_, response)) = self.lookup(key).await {
                return Resolution::Respond {
                    response,
                    source: ResponseSource::CachedPage,
                };
            }
            if let Some(response) = self.offline_page().await {
                return Resolution::Respond {
                    response,
                    source: ResponseSource::OfflinePage,
                };
            }
            warn!(
                "Offline page missing from {}",
                self.config.names.static_bucket
            );
        }

        Resolution::Respond {
            response: Response::offline(),
            source: ResponseSource::Synthetic,
        }
    }

    async fn offline_page(&self) -> Option<Response> {
        let url = self.config.offline_url().ok()?;
        match self
            .store
            .get(&self.config.names.static_bucket, &RequestKey::get(&url))
            .await
        {
            Ok(page) => page,
            Err(e) => {
                warn!("Offline page lookup failed: {}", e);
                None
            }
        }
    }
}
