//! Foreground cache controller
//!
//! Runs in the page context. Registers the worker, polls for updates,
//! reloads onto a newly installed version, reports visible images for
//! opportunistic caching and asks for a full warm-up once the page is
//! controlled and online. It talks to the worker only through a
//! `WorkerHandle` and registration events.

pub mod connectivity;
pub mod throttle;
pub mod visibility;

pub use connectivity::ReachabilityMonitor;
pub use throttle::Throttle;
pub use visibility::{ImageElement, ImageObserver, PageSnapshot, Rect};

use crate::config::schema::ControllerConfig;
use crate::error::KioskResult;
use crate::worker::{RegistrationEvent, WorkerHandle, WorkerMessage};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

/// The page the controller runs in
pub trait PageHost: Send + Sync {
    /// Full reload, so the page runs under the newly active version
    fn reload(&self);
}

/// Things the page reports to its controller
#[derive(Debug, Clone, PartialEq)]
pub enum PageSignal {
    Online(bool),
    /// Viewport moved; intersections are re-evaluated immediately
    Scrolled(PageSnapshot),
    /// DOM changed; the rescan is throttled
    Mutated(PageSnapshot),
}

pub struct CacheController {
    page_url: Url,
    worker: WorkerHandle,
    page: Arc<dyn PageHost>,
    update_interval: Duration,
    observer: ImageObserver,
    throttle: Throttle,
    pending_scan: Option<PageSnapshot>,
    /// Latest layout reported by the page; survives reloads
    last_snapshot: Option<PageSnapshot>,
    /// Resolved URLs already posted during this page load
    posted: HashSet<String>,
    /// Version controlling the page, if any
    controller: Option<String>,
    online: bool,
    cache_all_sent: bool,
}

impl CacheController {
    pub fn new(
        config: &ControllerConfig,
        page_url: Url,
        worker: WorkerHandle,
        page: Arc<dyn PageHost>,
    ) -> Self {
        Self {
            page_url,
            worker,
            page,
            update_interval: Duration::from_secs(config.update_interval_secs.max(1)),
            observer: ImageObserver::new(config.root_margin_px),
            throttle: Throttle::new(Duration::from_millis(config.rescan_throttle_ms)),
            pending_scan: None,
            last_snapshot: None,
            posted: HashSet::new(),
            controller: None,
            online: true,
            cache_all_sent: false,
        }
    }

    /// Initial connectivity as reported at page load
    pub fn starting_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Version already controlling the page when it loaded
    pub fn controlled_by(mut self, version: Option<String>) -> Self {
        self.controller = version;
        self
    }

    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    /// Register the worker (page load). A page that loads controlled and
    /// online asks for the warm-up right away.
    pub async fn start(&mut self) -> KioskResult<()> {
        info!("Registering worker for {}", self.page_url);
        self.worker.update().await?;
        self.maybe_cache_all().await
    }

    pub async fn on_event(&mut self, event: RegistrationEvent) -> KioskResult<()> {
        match event {
            RegistrationEvent::Installed { version, .. } => {
                if let Some(current) = &self.controller {
                    info!("Version {} installed over {}, reloading", version, current);
                    self.worker.post(WorkerMessage::SkipWaiting).await?;
                    self.reload();
                } else {
                    debug!("Version {} installed", version);
                }
            }
            RegistrationEvent::ControllerChanged { version } => {
                info!("Page now controlled by {}", version);
                self.controller = Some(version);
                self.maybe_cache_all().await?;
                self.rescan_visible().await?;
            }
            RegistrationEvent::InstallFailed { version, reason }
            | RegistrationEvent::ActivationFailed { version, reason } => {
                warn!("Worker {} not usable: {}", version, reason);
            }
            RegistrationEvent::Activated { version, .. } => debug!("Worker {} activated", version),
            RegistrationEvent::UpToDate { .. } => {}
        }
        Ok(())
    }

    pub async fn on_signal(&mut self, signal: PageSignal, now: Instant) -> KioskResult<()> {
        match signal {
            PageSignal::Online(online) => {
                self.online = online;
                self.maybe_cache_all().await
            }
            PageSignal::Scrolled(snapshot) => self.scan(&snapshot).await,
            PageSignal::Mutated(snapshot) => {
                if self.throttle.attempt(now) {
                    self.pending_scan = None;
                    self.scan(&snapshot).await
                } else {
                    self.pending_scan = Some(snapshot);
                    Ok(())
                }
            }
        }
    }

    /// When the throttled trailing rescan is due
    pub fn rescan_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    pub async fn on_rescan_due(&mut self, now: Instant) -> KioskResult<()> {
        if self.throttle.fire(now) {
            if let Some(snapshot) = self.pending_scan.take() {
                return self.scan(&snapshot).await;
            }
        }
        Ok(())
    }

    /// Drive the controller until either channel closes
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<RegistrationEvent>,
        mut signals: mpsc::Receiver<PageSignal>,
    ) -> KioskResult<()> {
        self.start().await?;

        let mut poll = tokio::time::interval(self.update_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; registration already covers it
        poll.tick().await;

        loop {
            let rescan = self.rescan_deadline();
            tokio::select! {
                _ = poll.tick() => {
                    debug!("Checking for worker update");
                    self.worker.update().await?;
                }
                event = events.recv() => match event {
                    Some(event) => self.on_event(event).await?,
                    None => break,
                },
                signal = signals.recv() => match signal {
                    Some(signal) => self.on_signal(signal, Instant::now()).await?,
                    None => break,
                },
                _ = sleep_until(rescan) => self.on_rescan_due(Instant::now()).await?,
            }
        }

        debug!("Controller stopped");
        Ok(())
    }

    async fn scan(&mut self, snapshot: &PageSnapshot) -> KioskResult<()> {
        self.last_snapshot = Some(snapshot.clone());
        // Uncontrolled pages leave visibility untracked until a worker takes over
        if self.controller.is_none() {
            return Ok(());
        }
        let entered = self.observer.observe(snapshot);
        if entered.is_empty() {
            return Ok(());
        }

        let mut urls = Vec::new();
        for src in entered {
            if src.starts_with("data:") {
                continue;
            }
            let resolved = match self.page_url.join(&src) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    debug!("Ignoring image {}: {}", src, e);
                    continue;
                }
            };
            if self.posted.insert(resolved.clone()) {
                urls.push(resolved);
            }
        }

        if urls.is_empty() {
            return Ok(());
        }
        debug!("Posting {} visible images", urls.len());
        self.worker.post(WorkerMessage::CacheUrls { urls }).await
    }

    /// Re-evaluate every image of the latest layout, as if newly observed
    async fn rescan_visible(&mut self) -> KioskResult<()> {
        self.observer.reset();
        match self.last_snapshot.clone() {
            Some(snapshot) => self.scan(&snapshot).await,
            None => Ok(()),
        }
    }

    async fn maybe_cache_all(&mut self) -> KioskResult<()> {
        if self.cache_all_sent || !self.online || self.controller.is_none() {
            return Ok(());
        }
        info!("Requesting full cache warm-up");
        self.cache_all_sent = true;
        self.worker.post(WorkerMessage::CacheAll).await
    }

    /// Page reload: per-page state starts over
    fn reload(&mut self) {
        self.page.reload();
        self.observer.reset();
        self.throttle.reset();
        self.pending_scan = None;
        self.posted.clear();
        self.cache_all_sent = false;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
