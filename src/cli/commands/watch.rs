//! Watch command - run the worker and the page controller until Ctrl-C
//!
//! The config file is re-read on every update poll, so bumping
//! `cache.version` rolls the kiosk over to a new version while it runs.

use crate::catalogue::Catalogue;
use crate::cli::args::WatchArgs;
use crate::cli::{HostContext, LifecycleRecorder};
use crate::config::ConfigManager;
use crate::controller::{CacheController, PageHost, ReachabilityMonitor};
use crate::error::{KioskError, KioskResult};
use crate::ui::{self, UiContext};
use crate::worker::{RegistrationEvent, UpdateSource, WorkerConfig, WorkerHost};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Execute the watch command
pub async fn execute(args: WatchArgs, host: &HostContext) -> KioskResult<()> {
    let ctx = UiContext::detect();
    host.paths.ensure().await?;

    let source = Arc::new(ConfigSource::new(host.config_manager()));
    let config = source.latest().await?;
    let fetcher = host.fetcher(false)?;
    let mut registration = host.registration(&config, fetcher.clone()).await?;
    let worker_events = registration.subscribe();
    let controlled_by = registration.active().map(|w| w.version().to_string());

    ui::intro(&ctx, "kiosk-cache watch");
    ui::key_value(&ctx, "origin", config.origin.as_str());
    ui::key_value(
        &ctx,
        "controller",
        controlled_by.as_deref().unwrap_or("none"),
    );
    ui::remark(&ctx, "Press Ctrl-C to stop");

    let (handle, worker_task) = WorkerHost::spawn(registration, source.clone());

    let (page_tx, page_events) = mpsc::unbounded_channel();
    let recorder = LifecycleRecorder::load(host).await?;
    let relay = tokio::spawn(relay_events(
        ctx.clone(),
        recorder,
        source.clone(),
        worker_events,
        page_tx,
    ));

    let (signals_tx, signals) = mpsc::channel(16);
    let online = !args.offline_start;
    let monitor = ReachabilityMonitor::new(
        fetcher,
        config.origin.clone(),
        Duration::from_secs(host.config.controller.connectivity_check_secs),
        online,
    );
    let monitor = tokio::spawn(monitor.run(signals_tx.clone()));
    let interrupt = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
        info!("Interrupted, stopping controller");
        // Every sender must go for the controller to stop
        monitor.abort();
        drop(signals_tx);
    });

    let page = Arc::new(LoggingPage { ctx: ctx.clone() });
    let controller = CacheController::new(
        &host.config.controller,
        config.origin.clone(),
        handle,
        page,
    )
    .starting_online(online)
    .controlled_by(controlled_by);
    let result = controller.run(page_events, signals).await;
    interrupt.abort();

    // The controller held the last handle; the host settles and exits
    let registration = worker_task
        .await
        .map_err(|e| KioskError::Internal(format!("worker task failed: {}", e)))?;
    drop(registration);
    relay
        .await
        .map_err(|e| KioskError::Internal(format!("event relay failed: {}", e)))?;

    result?;
    ui::outro_success(&ctx, "Stopped");
    Ok(())
}

/// Latest worker version as described by the config file on disk
struct ConfigSource {
    manager: ConfigManager,
    current: Mutex<Option<WorkerConfig>>,
}

impl ConfigSource {
    fn new(manager: ConfigManager) -> Self {
        Self {
            manager,
            current: Mutex::new(None),
        }
    }

    /// The config most recently handed to the worker
    fn current(&self) -> Option<WorkerConfig> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl UpdateSource for ConfigSource {
    async fn latest(&self) -> KioskResult<WorkerConfig> {
        let config = self.manager.load().await?;
        let catalogue = match &config.catalogue.path {
            Some(path) => Some(Catalogue::load(path).await?),
            None => None,
        };
        let worker = WorkerConfig::from_config(&config, catalogue.as_ref())?;

        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(worker.clone());
        Ok(worker)
    }
}

/// Page stand-in for a headless host: reloads are reported, not performed
struct LoggingPage {
    ctx: UiContext,
}

impl PageHost for LoggingPage {
    fn reload(&self) {
        ui::step_info(&self.ctx, "Page reloaded onto the new version");
    }
}

/// Persist and report each registration event, then hand it to the
/// controller
async fn relay_events(
    ctx: UiContext,
    mut recorder: LifecycleRecorder,
    source: Arc<ConfigSource>,
    mut events: mpsc::UnboundedReceiver<RegistrationEvent>,
    page: mpsc::UnboundedSender<RegistrationEvent>,
) {
    while let Some(event) = events.recv().await {
        if let Some(config) = source.current() {
            if let Err(e) = recorder.observe(&event, &config).await {
                warn!("Failed to record {:?}: {}", event, e);
            }
        }
        report(&ctx, &event);

        if page.send(event).is_err() {
            break;
        }
    }
}

fn report(ctx: &UiContext, event: &RegistrationEvent) {
    match event {
        RegistrationEvent::Installed { version, report } => {
            ui::step_ok(ctx, &format!("Installed {}", version));
            ui::batch_summary(ctx, "Static assets", &report.static_assets);
            ui::batch_summary(ctx, "Pages", &report.pages);
        }
        RegistrationEvent::InstallFailed { version, reason } => {
            ui::step_error_detail(ctx, &format!("Install of {} failed", version), reason);
        }
        RegistrationEvent::Activated { version, report } => {
            ui::step_ok_detail(
                ctx,
                &format!("Activated {}", version),
                &format!("{} old bucket(s) deleted", report.deleted.len()),
            );
        }
        RegistrationEvent::ActivationFailed { version, reason } => {
            ui::step_error_detail(ctx, &format!("Activation of {} failed", version), reason);
        }
        RegistrationEvent::ControllerChanged { version } => {
            ui::step_info(ctx, &format!("Pages controlled by {}", version));
        }
        RegistrationEvent::UpToDate { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn config_source_tracks_version_bumps() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[cache]\nversion = \"v4\"\n").unwrap();

        let source = ConfigSource::new(ConfigManager::with_path(path.clone()));
        assert!(source.current().is_none());

        let first = source.latest().await.unwrap();
        assert_eq!(first.version, "v4");
        assert_eq!(first.names.static_bucket, "logotip-static-v4");

        std::fs::write(&path, "[cache]\nversion = \"v5\"\n").unwrap();
        source.latest().await.unwrap();
        assert_eq!(source.current().unwrap().version, "v5");
    }
}
