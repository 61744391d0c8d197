//! Persists registration events: the worker record and the activity log

use super::context::HostContext;
use crate::activity::{events, ActivityLog};
use crate::error::KioskResult;
use crate::record::WorkerRecord;
use crate::worker::{BatchReport, RegistrationEvent, WorkerConfig};
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct LifecycleRecorder {
    path: PathBuf,
    activity: ActivityLog,
    record: Option<WorkerRecord>,
}

impl LifecycleRecorder {
    pub async fn load(host: &HostContext) -> KioskResult<Self> {
        Ok(Self {
            path: host.paths.record_path(),
            activity: host.activity(),
            record: host.record().await?,
        })
    }

    pub fn record(&self) -> Option<&WorkerRecord> {
        self.record.as_ref()
    }

    /// Update the record for `event`. `config` is the version being installed.
    pub async fn observe(
        &mut self,
        event: &RegistrationEvent,
        config: &WorkerConfig,
    ) -> KioskResult<()> {
        match event {
            RegistrationEvent::Installed { version, report } => {
                if *version != config.version {
                    warn!("Installed {} but expected {}", version, config.version);
                    return Ok(());
                }
                let record = WorkerRecord::installed(config);
                record.save(&self.path).await?;
                self.record = Some(record);

                let failed = report.static_assets.failed.len() + report.pages.failed.len();
                self.activity
                    .log(
                        events::WORKER_INSTALLED,
                        &json!({
                            "version": version,
                            "static_stored": report.static_assets.stored.len(),
                            "pages_stored": report.pages.stored.len(),
                            "failed": failed,
                        }),
                    )
                    .await;
            }
            RegistrationEvent::Activated { version, report } => {
                match self.record.as_mut() {
                    Some(record) if record.version == *version => {
                        record.mark_activated();
                        record.save(&self.path).await?;
                    }
                    _ => warn!("Activated {} without an install record", version),
                }
                self.activity
                    .log(
                        events::WORKER_ACTIVATED,
                        &json!({ "version": version, "deleted": report.deleted }),
                    )
                    .await;
            }
            other => debug!("Not recorded: {:?}", other),
        }
        Ok(())
    }

    pub async fn warmed(&mut self, report: &BatchReport) -> KioskResult<()> {
        if let Some(record) = self.record.as_mut() {
            record.mark_warmed();
            record.save(&self.path).await?;
        }
        self.activity
            .log(
                events::CACHE_WARMED,
                &json!({
                    "bucket": report.bucket,
                    "stored": report.stored.len(),
                    "skipped": report.skipped.len(),
                    "failed": report.failed.len(),
                }),
            )
            .await;
        Ok(())
    }
}
