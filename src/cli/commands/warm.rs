//! Warm command - cache every page route and catalogue image

use crate::cli::{HostContext, LifecycleRecorder};
use crate::error::{KioskError, KioskResult};
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::{MessageOutcome, WorkerMessage};

/// Execute the warm command
pub async fn execute(host: &HostContext) -> KioskResult<()> {
    let ctx = UiContext::detect();
    let config = host.worker_config().await?;
    let fetcher = host.fetcher(false)?;
    let mut registration = host.registration(&config, fetcher).await?;
    if registration.active().is_none() {
        return Err(KioskError::NoActiveWorker);
    }

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!(
        "Warming {} routes and {} assets...",
        config.page_routes.len(),
        config.warm_assets.len()
    ));

    let outcome = registration.post_message(WorkerMessage::CacheAll).await?;
    registration.settle().await;

    let MessageOutcome::Warmed(report) = outcome else {
        spinner.stop_warn("Nothing warmed");
        return Ok(());
    };

    if report.is_complete() {
        spinner.stop(&format!("Warmed {}", report.bucket));
    } else {
        spinner.stop_warn(&format!("Warmed {} with failures", report.bucket));
    }
    ui::batch_summary(&ctx, "Warm-up", &report);

    let mut recorder = LifecycleRecorder::load(host).await?;
    recorder.warmed(&report).await?;
    Ok(())
}
