//! Install command - install and activate the configured cache version

use crate::cli::{HostContext, LifecycleRecorder};
use crate::error::{KioskError, KioskResult};
use crate::ui::{self, TaskSpinner, UiContext};
use crate::worker::RegistrationEvent;

/// Execute the install command
pub async fn execute(host: &HostContext) -> KioskResult<()> {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "kiosk-cache install");

    host.paths.ensure().await?;
    let config = host.worker_config().await?;
    let fetcher = host.fetcher(false)?;
    let mut registration = host.registration(&config, fetcher).await?;
    let mut events = registration.subscribe();
    let mut recorder = LifecycleRecorder::load(host).await?;

    ui::key_value(&ctx, "origin", config.origin.as_str());
    ui::key_value(&ctx, "static bucket", &config.names.static_bucket);
    ui::key_value(&ctx, "dynamic bucket", &config.names.dynamic_bucket);

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Installing {}...", config.version));
    registration.update(config.clone()).await;
    registration.settle().await;

    let mut failure = None;
    let mut incomplete = false;
    while let Ok(event) = events.try_recv() {
        recorder.observe(&event, &config).await?;
        match event {
            RegistrationEvent::UpToDate { version } => {
                spinner.stop(&format!("{} is already active", version));
            }
            RegistrationEvent::Installed { version, report } => {
                incomplete = !(report.static_assets.is_complete() && report.pages.is_complete());
                if incomplete {
                    spinner.stop_warn(&format!("Installed {} with failures", version));
                } else {
                    spinner.stop(&format!("Installed {}", version));
                }
                ui::batch_summary(&ctx, "Static assets", &report.static_assets);
                ui::batch_summary(&ctx, "Pages", &report.pages);
            }
            RegistrationEvent::InstallFailed { version, reason } => {
                spinner.stop_error(&format!("Install of {} failed", version));
                failure = Some(KioskError::StoreUnavailable(reason));
            }
            RegistrationEvent::Activated { version, report } => {
                ui::step_ok(&ctx, &format!("Activated {}", version));
                for bucket in &report.deleted {
                    ui::remark(&ctx, &format!("deleted {}", bucket));
                }
                for failed in &report.failed {
                    ui::step_warn_hint(
                        &ctx,
                        &format!("Could not delete {}", failed.path),
                        &failed.reason,
                    );
                }
            }
            RegistrationEvent::ActivationFailed { version, reason } => {
                ui::step_error_detail(&ctx, &format!("Activation of {} failed", version), &reason);
                failure = Some(KioskError::StoreUnavailable(reason));
            }
            RegistrationEvent::ControllerChanged { .. } => {}
        }
    }

    if let Some(err) = failure {
        return Err(err);
    }

    let summary = format!("Serving {} from {}", config.version, config.origin);
    if incomplete {
        ui::outro_warn(
            &ctx,
            &format!("{}; run `kiosk-cache warm` once it is reachable", summary),
        );
    } else {
        ui::outro_success(&ctx, &summary);
    }
    Ok(())
}
