//! One worker version: lifecycle handlers over shared store and fetcher

use super::config::WorkerConfig;
use super::interceptor::{Interceptor, Resolution};
use super::messages::{MessageOutcome, WorkerMessage};
use super::report::{ActivationReport, InstallReport};
use super::seeder::Seeder;
use super::state::{LifecycleEvent, WorkerState};
use super::tasks::BackgroundTasks;
use super::versions::VersionManager;
use super::warmer::Warmer;
use crate::cache::CacheStore;
use crate::error::{KioskError, KioskResult};
use crate::fetch::Fetcher;
use crate::http::Request;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// A worker for one deployment version.
///
/// Handlers are async fns; the host awaits each one, then `settle` for any
/// background work it spawned, before tearing the worker down.
pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    state: Mutex<WorkerState>,
    skip_waiting: AtomicBool,
    tasks: Arc<BackgroundTasks>,
    seeder: Seeder,
    versions: VersionManager,
    interceptor: Interceptor,
    warmer: Warmer,
}

impl ServiceWorker {
    /// A freshly registered worker, in `Installing`
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self::with_state(config, store, fetcher, WorkerState::Installing)
    }

    /// A worker that was activated in an earlier run and is being started
    /// again to handle events
    pub fn resume(
        config: WorkerConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self::with_state(config, store, fetcher, WorkerState::Activated)
    }

    fn with_state(
        config: WorkerConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        state: WorkerState,
    ) -> Self {
        let config = Arc::new(config);
        let tasks = Arc::new(BackgroundTasks::new());

        Self {
            seeder: Seeder::new(config.clone(), store.clone(), fetcher.clone()),
            versions: VersionManager::new(
                config.version.clone(),
                config.names.clone(),
                store.clone(),
            ),
            interceptor: Interceptor::new(
                config.clone(),
                store.clone(),
                fetcher.clone(),
                tasks.clone(),
            ),
            warmer: Warmer::new(config.clone(), store, fetcher),
            state: Mutex::new(state),
            skip_waiting: AtomicBool::new(false),
            tasks,
            config,
        }
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, event: LifecycleEvent) -> KioskResult<WorkerState> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let next = state.on(event)?;
        debug!("Worker {}: {} -> {}", self.config.version, *state, next);
        *state = next;
        Ok(next)
    }

    /// Request activation without waiting for pages of the old version to close
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn wants_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Seed both buckets. Per-item failures are reported, not raised; only a
    /// completely unavailable store fails the install.
    pub async fn install(&self) -> KioskResult<InstallReport> {
        if self.state() != WorkerState::Installing {
            return Err(KioskError::InvalidTransition {
                state: self.state(),
                event: LifecycleEvent::InstallSettled,
            });
        }

        let report = self.seeder.seed().await;

        if report.store_unavailable() {
            self.transition(LifecycleEvent::InstallFailed)?;
            return Err(KioskError::StoreUnavailable(format!(
                "cannot open {} or {}",
                self.config.names.static_bucket, self.config.names.dynamic_bucket
            )));
        }

        self.transition(LifecycleEvent::InstallSettled)?;
        self.skip_waiting();
        info!("Worker {} installed", self.config.version);
        Ok(report)
    }

    /// Remove stale buckets and start intercepting
    pub async fn activate(&self) -> KioskResult<ActivationReport> {
        self.transition(LifecycleEvent::Activate)?;

        match self.versions.activate().await {
            Ok(report) => {
                self.transition(LifecycleEvent::ActivationSettled)?;
                Ok(report)
            }
            Err(e) => {
                self.transition(LifecycleEvent::ActivationFailed)?;
                Err(e)
            }
        }
    }

    /// Mark this version as replaced. Already-redundant workers stay as they are.
    pub fn supersede(&self) {
        if !self.state().is_terminal() {
            let _ = self.transition(LifecycleEvent::Superseded);
            info!("Worker {} is now redundant", self.config.version);
        }
    }

    /// Resolve an intercepted request. Workers that are not activated
    /// leave every request to the host.
    pub async fn handle_fetch(&self, request: &Request) -> Resolution {
        if !self.state().can_intercept() {
            return Resolution::Passthrough;
        }
        self.interceptor.resolve(request).await
    }

    /// Handle a message from the page
    pub async fn handle_message(&self, message: WorkerMessage) -> KioskResult<MessageOutcome> {
        match message {
            WorkerMessage::CacheAll => Ok(MessageOutcome::Warmed(self.warmer.warm_all().await)),
            WorkerMessage::CacheUrls { urls } => Ok(MessageOutcome::Warmed(
                self.warmer.cache_urls(&urls).await,
            )),
            WorkerMessage::SkipWaiting => {
                self.skip_waiting();
                Ok(MessageOutcome::SkipWaiting)
            }
        }
    }

    /// Wait for background work spawned by earlier handlers
    pub async fn settle(&self) {
        self.tasks.settle().await;
    }
}
