//! Activity log for worker lifecycle and cache maintenance
//!
//! Appends JSON lines to `<state dir>/activity.log`. On by default; turned
//! off with `general.activity_log = false`.

use crate::config::{schema::Config, StatePaths};
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Event names written to the log
pub mod events {
    pub const WORKER_INSTALLED: &str = "worker.installed";
    pub const WORKER_ACTIVATED: &str = "worker.activated";
    pub const CACHE_WARMED: &str = "cache.warmed";
    pub const CACHE_CLEARED: &str = "cache.cleared";
}

pub struct ActivityLog {
    enabled: bool,
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(config: &Config, paths: &StatePaths) -> Self {
        Self {
            enabled: config.general.activity_log,
            path: paths.activity_log_path(),
        }
    }

    /// Append one event.
    ///
    /// IO and serialization failures are logged and dropped; the activity
    /// log never fails the command that produced the event.
    pub async fn log(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize activity event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write activity log {}: {}", self.path.display(), e);
        }
    }

    /// Last `limit` entries, oldest first. A missing log reads as empty.
    pub async fn tail(&self, limit: usize) -> Vec<serde_json::Value> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };

        let entries: Vec<serde_json::Value> = content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        let skip = entries.len().saturating_sub(limit);
        entries.into_iter().skip(skip).collect()
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
