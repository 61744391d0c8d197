//! Shared state for CLI commands: configuration, state paths and the
//! bucket store on disk

use crate::activity::ActivityLog;
use crate::cache::DiskStore;
use crate::catalogue::Catalogue;
use crate::config::{Config, ConfigManager, StatePaths};
use crate::error::{KioskError, KioskResult};
use crate::fetch::{Fetcher, HttpFetcher, OfflineFetcher};
use crate::record::WorkerRecord;
use crate::worker::{Registration, WorkerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub struct HostContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub paths: StatePaths,
    store: Arc<DiskStore>,
}

impl HostContext {
    pub fn new(config: Config, manager: &ConfigManager, paths: StatePaths) -> Self {
        let store = Arc::new(DiskStore::new(paths.store_dir()));
        Self {
            config,
            config_path: manager.path().to_path_buf(),
            paths,
            store,
        }
    }

    pub fn config_manager(&self) -> ConfigManager {
        ConfigManager::with_path(self.config_path.clone())
    }

    pub fn store(&self) -> Arc<DiskStore> {
        self.store.clone()
    }

    pub fn activity(&self) -> ActivityLog {
        ActivityLog::new(&self.config, &self.paths)
    }

    pub fn origin(&self) -> KioskResult<Url> {
        crate::worker::config::parse_origin(&self.config.site.origin)
    }

    /// The configured catalogue, `None` when `catalogue.path` is unset
    pub async fn catalogue(&self) -> KioskResult<Option<Catalogue>> {
        match &self.config.catalogue.path {
            Some(path) => Ok(Some(Catalogue::load(path).await?)),
            None => Ok(None),
        }
    }

    /// The configured catalogue, or an error naming the missing setting
    pub async fn require_catalogue(&self) -> KioskResult<Catalogue> {
        self.catalogue().await?.ok_or_else(|| {
            KioskError::User(format!(
                "No catalogue configured; set catalogue.path in {}",
                self.config_path.display()
            ))
        })
    }

    pub async fn worker_config(&self) -> KioskResult<WorkerConfig> {
        let catalogue = self.catalogue().await?;
        WorkerConfig::from_config(&self.config, catalogue.as_ref())
    }

    pub fn fetcher(&self, offline: bool) -> KioskResult<Arc<dyn Fetcher>> {
        if offline {
            return Ok(Arc::new(OfflineFetcher));
        }
        Ok(Arc::new(HttpFetcher::new(self.origin()?, &self.config.fetch)))
    }

    pub async fn record(&self) -> KioskResult<Option<WorkerRecord>> {
        WorkerRecord::load(&self.paths.record_path()).await
    }

    /// Registration over the disk store, resuming the recorded worker when
    /// it was activated for `config`'s version
    pub async fn registration(
        &self,
        config: &WorkerConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> KioskResult<Registration> {
        let mut registration = Registration::new(&config.origin, self.store.clone(), fetcher);
        match self.record().await? {
            Some(record) if record.is_active(&config.version) => {
                registration.resume(config.clone());
            }
            Some(record) => debug!(
                "Recorded worker {} ({}) does not match {}",
                record.version, record.state, config.version
            ),
            None => debug!("No worker installed yet"),
        }
        Ok(registration)
    }
}
