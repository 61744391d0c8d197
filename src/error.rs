//! Error types for kiosk-cache
//!
//! All modules use `KioskResult<T>` as their return type.

use crate::worker::state::{LifecycleEvent, WorkerState};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for kiosk-cache operations
pub type KioskResult<T> = Result<T, KioskError>;

/// All errors that can occur in kiosk-cache
#[derive(Error, Debug)]
pub enum KioskError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    // Cache store errors
    #[error("Cache store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Cache bucket error in {bucket}: {reason}")]
    Bucket { bucket: String, reason: String },

    #[error("Cache bucket not found: {0}")]
    BucketNotFound(String),

    // Fetch errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // Worker lifecycle errors
    #[error("Invalid worker transition: {event:?} while {state}")]
    InvalidTransition {
        state: WorkerState,
        event: LifecycleEvent,
    },

    #[error("No active worker for this scope")]
    NoActiveWorker,

    #[error("Worker channel closed")]
    ChannelClosed,

    // Catalogue errors
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Design not found: {0}")]
    DesignNotFound(String),

    #[error("Failed to read catalogue {path}: {reason}")]
    CatalogueRead { path: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl KioskError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a bucket error
    pub fn bucket(bucket: impl Into<String>, reason: impl ToString) -> Self {
        Self::Bucket {
            bucket: bucket.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a network error
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::StoreUnavailable(_) | Self::Bucket { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Network { .. } => Some("Check that the kiosk origin is reachable (site.origin)"),
            Self::NoActiveWorker => Some("Run: kiosk-cache install"),
            Self::BucketNotFound(_) => Some("Run: kiosk-cache cache list"),
            Self::CategoryNotFound(_) => Some("Run: kiosk-cache catalogue categories"),
            Self::DesignNotFound(_) => Some("Run: kiosk-cache catalogue designs <category>"),
            Self::InvalidOrigin { .. } => Some("Run: kiosk-cache config show"),
            _ => None,
        }
    }
}
