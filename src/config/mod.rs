//! Configuration management for kiosk-cache

pub mod schema;

pub use schema::Config;

use crate::error::{KioskError, KioskResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kiosk-cache")
            .join("config.toml")
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> KioskResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> KioskResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| KioskError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| KioskError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> KioskResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            KioskError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> KioskResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| KioskError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Locations of host state: bucket store, worker record, activity log
#[derive(Debug, Clone)]
pub struct StatePaths {
    root: PathBuf,
}

impl StatePaths {
    /// Use `root` if given, otherwise the platform state directory
    pub fn resolve(root: Option<PathBuf>) -> Self {
        let root = root.unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("kiosk-cache")
        });
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root of the on-disk bucket store
    pub fn store_dir(&self) -> PathBuf {
        self.root.join("store")
    }

    /// Persisted worker registration record
    pub fn record_path(&self) -> PathBuf {
        self.root.join("worker.json")
    }

    /// Append-only activity log
    pub fn activity_log_path(&self) -> PathBuf {
        self.root.join("activity.log")
    }

    /// Ensure the state directories exist
    pub async fn ensure(&self) -> KioskResult<()> {
        for dir in [self.root.clone(), self.store_dir()] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| KioskError::io(format!("creating directory {}", dir.display()), e))?;
        }
        Ok(())
    }
}
