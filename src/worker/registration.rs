//! Scope registration: which worker version controls the pages
//!
//! Holds at most one active and one waiting worker. A new version is
//! installed next to the active one, then promoted: the old worker becomes
//! redundant and the new one activates, deleting the old buckets and taking
//! control of every page without a reload.

use super::config::WorkerConfig;
use super::interceptor::{Resolution, ResponseSource};
use super::messages::{MessageOutcome, WorkerMessage};
use super::report::{ActivationReport, InstallReport};
use super::service::ServiceWorker;
use crate::cache::CacheStore;
use crate::error::{KioskError, KioskResult};
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

/// Lifecycle notifications delivered to the page side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// A version finished installing and is waiting to activate
    Installed { version: String, report: InstallReport },
    InstallFailed { version: String, reason: String },
    Activated { version: String, report: ActivationReport },
    ActivationFailed { version: String, reason: String },
    /// Pages are now controlled by `version`
    ControllerChanged { version: String },
    /// The offered version is already installed
    UpToDate { version: String },
}

/// A response delivered to the page, with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

/// Snapshot of the registration for serving requests and messages away from
/// the lifecycle. Holds the worker that was active when it was taken.
#[derive(Clone)]
pub struct Dispatcher {
    scope: Url,
    fetcher: Arc<dyn Fetcher>,
    active: Option<Arc<ServiceWorker>>,
}

impl Dispatcher {
    /// Dispatch a page request. Requests the active worker does not handle
    /// get default network handling, whose failures are returned as errors.
    pub async fn fetch(&self, request: &Request) -> KioskResult<Served> {
        let resolution = match &self.active {
            Some(worker) if contains(&self.scope, &request.url) => {
                worker.handle_fetch(request).await
            }
            _ => Resolution::Passthrough,
        };

        match resolution {
            Resolution::Respond { response, source } => Ok(Served { response, source }),
            Resolution::Passthrough => {
                let response = self.fetcher.fetch(request).await?;
                Ok(Served {
                    response,
                    source: ResponseSource::Passthrough,
                })
            }
        }
    }

    /// Deliver a message to the active worker
    pub async fn post(&self, message: WorkerMessage) -> KioskResult<MessageOutcome> {
        let worker = self.active.as_ref().ok_or(KioskError::NoActiveWorker)?;
        worker.handle_message(message).await
    }
}

pub struct Registration {
    scope: Url,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    active: Option<Arc<ServiceWorker>>,
    waiting: Option<Arc<ServiceWorker>>,
    events: Option<mpsc::UnboundedSender<RegistrationEvent>>,
}

impl Registration {
    /// Registration at the root of `origin`
    pub fn new(origin: &Url, store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        let mut scope = origin.clone();
        scope.set_path("/");
        scope.set_query(None);
        scope.set_fragment(None);

        Self {
            scope,
            store,
            fetcher,
            active: None,
            waiting: None,
            events: None,
        }
    }

    /// Receive lifecycle events from now on. Replaces any earlier subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<RegistrationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub fn active(&self) -> Option<&Arc<ServiceWorker>> {
        self.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&Arc<ServiceWorker>> {
        self.waiting.as_ref()
    }

    /// Restore a version that was activated in an earlier run
    pub fn resume(&mut self, config: WorkerConfig) {
        info!("Resuming worker {}", config.version);
        let worker = ServiceWorker::resume(config, self.store.clone(), self.fetcher.clone());
        self.active = Some(Arc::new(worker));
    }

    pub fn in_scope(&self, url: &Url) -> bool {
        contains(&self.scope, url)
    }

    /// Register `config`'s version, or update to it.
    ///
    /// Installs the version unless it is already active or waiting, then
    /// promotes it when nothing is active yet or it asked to skip waiting.
    pub async fn update(&mut self, config: WorkerConfig) {
        let version = config.version.clone();
        let current = self
            .active
            .iter()
            .chain(self.waiting.iter())
            .any(|w| w.version() == version);
        if current {
            debug!("Worker {} is up to date", version);
            self.emit(RegistrationEvent::UpToDate { version });
            return;
        }

        info!("Installing worker {}", version);
        let worker = Arc::new(ServiceWorker::new(
            config,
            self.store.clone(),
            self.fetcher.clone(),
        ));

        match worker.install().await {
            Ok(report) => self.emit(RegistrationEvent::Installed {
                version: version.clone(),
                report,
            }),
            Err(e) => {
                warn!("Install of {} failed: {}", version, e);
                self.emit(RegistrationEvent::InstallFailed {
                    version,
                    reason: e.to_string(),
                });
                return;
            }
        }

        if let Some(previous) = self.waiting.replace(worker.clone()) {
            previous.supersede();
        }
        if self.active.is_none() || worker.wants_skip_waiting() {
            self.promote().await;
        }
    }

    /// Activate the waiting worker now, if there is one
    pub async fn skip_waiting(&mut self) {
        match &self.waiting {
            Some(waiting) => waiting.skip_waiting(),
            None => {
                debug!("No waiting worker to activate");
                return;
            }
        }
        self.promote().await;
    }

    async fn promote(&mut self) {
        let Some(next) = self.waiting.take() else {
            return;
        };
        let version = next.version().to_string();

        if let Some(previous) = self.active.take() {
            previous.settle().await;
            previous.supersede();
        }

        match next.activate().await {
            Ok(report) => {
                self.active = Some(next);
                self.emit(RegistrationEvent::Activated {
                    version: version.clone(),
                    report,
                });
                self.emit(RegistrationEvent::ControllerChanged { version });
            }
            Err(e) => {
                // Nothing controls the scope; requests go straight to the network
                warn!("Activation of {} failed: {}", version, e);
                self.emit(RegistrationEvent::ActivationFailed {
                    version,
                    reason: e.to_string(),
                });
            }
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            scope: self.scope.clone(),
            fetcher: self.fetcher.clone(),
            active: self.active.clone(),
        }
    }

    /// Serve a page request through the active worker
    pub async fn fetch(&self, request: &Request) -> KioskResult<Served> {
        self.dispatcher().fetch(request).await
    }

    /// Deliver a page message. `SKIP_WAITING` acts on the waiting worker;
    /// everything else goes to the active one.
    pub async fn post_message(&mut self, message: WorkerMessage) -> KioskResult<MessageOutcome> {
        if message == WorkerMessage::SkipWaiting {
            self.skip_waiting().await;
            return Ok(MessageOutcome::SkipWaiting);
        }

        self.dispatcher().post(message).await
    }

    /// Wait for background work of the active worker
    pub async fn settle(&self) {
        if let Some(active) = &self.active {
            active.settle().await;
        }
    }

    fn emit(&self, event: RegistrationEvent) {
        if let Some(tx) = &self.events {
            // Subscriber gone: the page went away, nothing to notify
            let _ = tx.send(event);
        }
    }
}

fn contains(scope: &Url, url: &Url) -> bool {
    url.origin() == scope.origin() && url.path().starts_with(scope.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::testing::{origin, test_config, url, FailingStore, ScriptedFetcher};
    use crate::worker::state::WorkerState;

    fn registration() -> (Registration, Arc<MemoryStore>, Arc<ScriptedFetcher>) {
        let store = Arc::new(MemoryStore::new());
        let fetcher = Arc::new(ScriptedFetcher::site());
        let reg = Registration::new(&origin(), store.clone(), fetcher.clone());
        (reg, store, fetcher)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<RegistrationEvent>) -> Vec<RegistrationEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn first_registration_activates() {
        let (mut reg, _, _) = registration();
        let mut rx = reg.subscribe();

        reg.update(test_config("v1")).await;

        let events = drain(&mut rx);
        assert!(matches!(events[0], RegistrationEvent::Installed { .. }));
        assert!(matches!(events[1], RegistrationEvent::Activated { .. }));
        assert_eq!(
            events[2],
            RegistrationEvent::ControllerChanged {
                version: "v1".to_string()
            }
        );
        assert_eq!(reg.active().unwrap().state(), WorkerState::Activated);
        assert!(reg.waiting().is_none());
    }

    #[tokio::test]
    async fn same_version_is_up_to_date() {
        let (mut reg, _, fetcher) = registration();
        reg.update(test_config("v1")).await;
        let calls = fetcher.calls().len();
        let mut rx = reg.subscribe();

        reg.update(test_config("v1")).await;

        assert_eq!(
            drain(&mut rx),
            vec![RegistrationEvent::UpToDate {
                version: "v1".to_string()
            }]
        );
        assert_eq!(fetcher.calls().len(), calls);
    }

    #[tokio::test]
    async fn update_supersedes_and_sweeps() {
        let (mut reg, store, _) = registration();
        reg.update(test_config("v1")).await;
        let old = reg.active().unwrap().clone();

        reg.update(test_config("v2")).await;

        assert_eq!(old.state(), WorkerState::Redundant);
        assert_eq!(reg.active().unwrap().version(), "v2");
        assert_eq!(
            store.bucket_names().await.unwrap(),
            vec!["kiosk-dynamic-v2", "kiosk-static-v2"]
        );
    }

    #[tokio::test]
    async fn fetch_without_worker_goes_to_network() {
        let (reg, _, fetcher) = registration();
        fetcher.set_offline(true);

        let err = reg.fetch(&Request::navigate(url("/"))).await.unwrap_err();
        assert!(matches!(err, KioskError::Network { .. }));
    }

    #[tokio::test]
    async fn fetch_through_active_worker() {
        let (mut reg, _, fetcher) = registration();
        reg.update(test_config("v1")).await;
        fetcher.set_offline(true);

        let served = reg.fetch(&Request::navigate(url("/tricouri"))).await.unwrap();
        assert!(matches!(served.source, ResponseSource::Cache { .. }));

        let served = reg
            .fetch(&Request::get(url("/assets/mugs/b.jpg")))
            .await
            .unwrap();
        assert_eq!(served.response.status, 503);
    }

    #[tokio::test]
    async fn out_of_scope_passes_through() {
        let (mut reg, _, fetcher) = registration();
        reg.update(test_config("v1")).await;
        let cdn = "https://cdn.example.com/x.css";
        fetcher.serve(cdn, Response::new(200, "css"));

        let served = reg
            .fetch(&Request::get(Url::parse(cdn).unwrap()))
            .await
            .unwrap();
        assert_eq!(served.source, ResponseSource::Passthrough);
    }

    #[tokio::test]
    async fn messages_need_an_active_worker() {
        let (mut reg, _, _) = registration();
        let err = reg.post_message(WorkerMessage::CacheAll).await.unwrap_err();
        assert!(matches!(err, KioskError::NoActiveWorker));

        let outcome = reg.post_message(WorkerMessage::SkipWaiting).await.unwrap();
        assert_eq!(outcome, MessageOutcome::SkipWaiting);
    }

    #[tokio::test]
    async fn resumed_worker_serves_cache() {
        let (mut reg, _, fetcher) = registration();
        reg.update(test_config("v1")).await;
        let store = reg.store.clone();

        let mut restarted = Registration::new(&origin(), store, fetcher.clone());
        restarted.resume(test_config("v1"));
        fetcher.set_offline(true);

        let served = restarted.fetch(&Request::get(url("/logo.svg"))).await.unwrap();
        assert_eq!(served.response.status, 200);
    }

    #[tokio::test]
    async fn failed_activation_leaves_scope_uncontrolled() {
        let store = Arc::new(FailingStore::new());
        let fetcher = Arc::new(ScriptedFetcher::site());
        let mut reg = Registration::new(&origin(), store.clone(), fetcher.clone());
        let mut rx = reg.subscribe();
        store.fail_listing(true);

        reg.update(test_config("v1")).await;

        let events = drain(&mut rx);
        assert!(matches!(events[0], RegistrationEvent::Installed { .. }));
        assert!(matches!(events[1], RegistrationEvent::ActivationFailed { .. }));
        assert_eq!(events.len(), 2);
        assert!(reg.active().is_none());

        let before = fetcher.call_count("/mugs");
        let served = reg.fetch(&Request::navigate(url("/mugs"))).await.unwrap();
        assert_eq!(served.source, ResponseSource::Passthrough);
        assert_eq!(fetcher.call_count("/mugs"), before + 1);
    }
}
