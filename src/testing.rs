//! Shared fixtures for unit tests

use crate::cache::{CacheNames, CacheStore, MemoryStore};
use crate::error::{KioskError, KioskResult};
use crate::fetch::{response_type, Fetcher};
use crate::http::{Request, RequestKey, Response};
use crate::worker::WorkerConfig;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;
use url::Url;

pub(crate) const ORIGIN: &str = "http://kiosk.local";

pub(crate) fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

/// Absolute URL for a path on the test origin
pub(crate) fn url(path: &str) -> Url {
    origin().join(path).unwrap()
}

pub(crate) fn test_config(version: &str) -> WorkerConfig {
    WorkerConfig {
        version: version.to_string(),
        origin: origin(),
        names: CacheNames::new("kiosk", version).unwrap(),
        offline_path: "/offline".to_string(),
        static_assets: strings(&["/", "/offline", "/logo.svg", "/fonts/FuturaPT-Book.woff2"]),
        page_routes: strings(&["/", "/mugs", "/tricouri"]),
        warm_assets: strings(&["/logo.svg", "/assets/mugs/a.jpg"]),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// In-process network: scripted responses, failing paths and a call log.
///
/// Same-origin requests are keyed by path plus query; anything else by the
/// full URL. Unknown requests get a 404.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    responses: Mutex<HashMap<String, Response>>,
    failing: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: Mutex<Vec<String>>,
    held: Mutex<HashSet<String>>,
    released: Notify,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path `test_config` references, served with 200
    pub fn site() -> Self {
        let fetcher = Self::new();
        for path in [
            "/",
            "/offline",
            "/logo.svg",
            "/fonts/FuturaPT-Book.woff2",
            "/mugs",
            "/tricouri",
            "/assets/mugs/a.jpg",
            "/assets/mugs/b.jpg",
        ] {
            fetcher.serve(path, Response::new(200, format!("body of {}", path)));
        }
        fetcher
    }

    pub fn serve(&self, target: &str, response: Response) {
        self.responses
            .lock()
            .unwrap()
            .insert(target.to_string(), response);
    }

    pub fn fail(&self, target: &str) {
        self.failing.lock().unwrap().insert(target.to_string());
    }

    /// Requests for `target` hang until `release` is called
    pub fn hold(&self, target: &str) {
        self.held.lock().unwrap().insert(target.to_string());
    }

    pub fn release(&self, target: &str) {
        self.held.lock().unwrap().remove(target);
        self.released.notify_waiters();
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, target: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == target).count()
    }

    fn target(url: &Url) -> String {
        if url.origin() == origin().origin() {
            match url.query() {
                Some(q) => format!("{}?{}", url.path(), q),
                None => url.path().to_string(),
            }
        } else {
            url.to_string()
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> KioskResult<Response> {
        let target = Self::target(&request.url);
        self.calls.lock().unwrap().push(target.clone());

        loop {
            let released = self.released.notified();
            let held = self.held.lock().unwrap().contains(&target);
            if !held {
                break;
            }
            released.await;
        }

        if self.offline.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&target) {
            return Err(KioskError::network(request.url.as_str(), "network unreachable"));
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&target)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "Not Found"));

        let kind = response_type(&origin(), &request.url, request.mode);
        Ok(response.with_kind(kind))
    }
}

/// `MemoryStore` with switchable faults
#[derive(Default)]
pub(crate) struct FailingStore {
    inner: MemoryStore,
    failing_gets: AtomicBool,
    failing_puts: AtomicBool,
    failing_listing: AtomicBool,
    undeletable: Mutex<HashSet<String>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn fail_gets(&self, fail: bool) {
        self.failing_gets.store(fail, Ordering::SeqCst);
    }

    pub fn fail_puts(&self, fail: bool) {
        self.failing_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_listing(&self, fail: bool) {
        self.failing_listing.store(fail, Ordering::SeqCst);
    }

    pub fn refuse_delete(&self, bucket: &str) {
        self.undeletable.lock().unwrap().insert(bucket.to_string());
    }

    fn check(flag: &AtomicBool, bucket: &str, op: &str) -> KioskResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(KioskError::bucket(bucket, format!("{} failed", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FailingStore {
    async fn open(&self, bucket: &str) -> KioskResult<()> {
        Self::check(&self.failing_puts, bucket, "open")?;
        self.inner.open(bucket).await
    }

    async fn get(&self, bucket: &str, key: &RequestKey) -> KioskResult<Option<Response>> {
        Self::check(&self.failing_gets, bucket, "read")?;
        self.inner.get(bucket, key).await
    }

    async fn put(&self, bucket: &str, key: &RequestKey, response: &Response) -> KioskResult<()> {
        Self::check(&self.failing_puts, bucket, "write")?;
        self.inner.put(bucket, key, response).await
    }

    async fn delete_bucket(&self, bucket: &str) -> KioskResult<bool> {
        let refused = self.undeletable.lock().unwrap().contains(bucket);
        if refused {
            return Err(KioskError::bucket(bucket, "delete failed"));
        }
        self.inner.delete_bucket(bucket).await
    }

    async fn bucket_names(&self) -> KioskResult<Vec<String>> {
        if self.failing_listing.load(Ordering::SeqCst) {
            return Err(KioskError::StoreUnavailable("listing failed".to_string()));
        }
        self.inner.bucket_names().await
    }

    async fn keys(&self, bucket: &str) -> KioskResult<Vec<RequestKey>> {
        self.inner.keys(bucket).await
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
