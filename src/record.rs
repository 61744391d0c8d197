//! Persisted worker registration record
//!
//! The CLI host is short-lived, so which version is active survives
//! between runs in `<state dir>/worker.json`.

use crate::error::{KioskError, KioskResult};
use crate::worker::WorkerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    /// Version controlling the scope
    pub version: String,

    pub state: WorkerState,

    /// Origin the worker was installed for
    pub origin: String,

    pub static_bucket: String,

    pub dynamic_bucket: String,

    pub installed_at: DateTime<Utc>,

    pub activated_at: Option<DateTime<Utc>>,

    /// Last successful CACHE_ALL run
    #[serde(default)]
    pub warmed_at: Option<DateTime<Utc>>,
}

impl WorkerRecord {
    /// Record for a version that just finished installing
    pub fn installed(config: &crate::worker::WorkerConfig) -> Self {
        Self {
            version: config.version.clone(),
            state: WorkerState::Waiting,
            origin: config.origin.to_string(),
            static_bucket: config.names.static_bucket.clone(),
            dynamic_bucket: config.names.dynamic_bucket.clone(),
            installed_at: Utc::now(),
            activated_at: None,
            warmed_at: None,
        }
    }

    pub fn mark_activated(&mut self) {
        self.state = WorkerState::Activated;
        self.activated_at = Some(Utc::now());
    }

    pub fn mark_warmed(&mut self) {
        self.warmed_at = Some(Utc::now());
    }

    /// Whether this record describes an activated worker for `version`
    pub fn is_active(&self, version: &str) -> bool {
        self.state == WorkerState::Activated && self.version == version
    }

    /// Load the record, `None` if nothing was ever installed
    pub async fn load(path: &Path) -> KioskResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| KioskError::io(format!("reading worker record {}", path.display()), e))?;

        Ok(Some(serde_json::from_str(&content)?))
    }

    pub async fn save(&self, path: &Path) -> KioskResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| KioskError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| KioskError::io(format!("writing worker record {}", path.display()), e))?;

        Ok(())
    }

    /// Remove the record, if present
    pub async fn delete(path: &Path) -> KioskResult<()> {
        if path.exists() {
            fs::remove_file(path).await.map_err(|e| {
                KioskError::io(format!("deleting worker record {}", path.display()), e)
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_config;
    use tempfile::TempDir;

    #[test]
    fn lifecycle_marks() {
        let mut record = WorkerRecord::installed(&test_config("v3"));
        assert_eq!(record.state, WorkerState::Waiting);
        assert!(!record.is_active("v3"));

        record.mark_activated();
        assert!(record.is_active("v3"));
        assert!(!record.is_active("v4"));
        assert!(record.activated_at.is_some());
    }

    #[tokio::test]
    async fn save_load_delete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/worker.json");

        assert!(WorkerRecord::load(&path).await.unwrap().is_none());

        let mut record = WorkerRecord::installed(&test_config("v1"));
        record.mark_activated();
        record.save(&path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"activated\""));
        assert!(content.contains("kiosk-static-v1"));

        let loaded = WorkerRecord::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, record);

        WorkerRecord::delete(&path).await.unwrap();
        assert!(!path.exists());
    }
}
