//! Versioned bucket names

use crate::error::{KioskError, KioskResult};
use serde::Serialize;
use std::fmt;

/// Bucket names for one deployment version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheNames {
    /// Install-time assets (shell, fonts, icons, offline page)
    pub static_bucket: String,
    /// Pages and assets accumulated at runtime
    pub dynamic_bucket: String,
}

impl CacheNames {
    /// Build the names for `prefix` and version tag `version`
    pub fn new(prefix: &str, version: &str) -> KioskResult<Self> {
        validate_component("prefix", prefix)?;
        validate_component("version", version)?;
        Ok(Self {
            static_bucket: format!("{}-static-{}", prefix, version),
            dynamic_bucket: format!("{}-dynamic-{}", prefix, version),
        })
    }

    /// Name of the retired single-bucket layout for a version
    pub fn legacy(prefix: &str, version: &str) -> String {
        format!("{}-kiosk-{}", prefix, version)
    }

    /// Buckets that survive activation, in lookup order
    pub fn current(&self) -> [&str; 2] {
        [&self.static_bucket, &self.dynamic_bucket]
    }

    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_bucket || name == self.dynamic_bucket
    }
}

impl fmt::Display for CacheNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.static_bucket, self.dynamic_bucket)
    }
}

/// Bucket names double as directory names in the disk store
fn validate_component(what: &str, value: &str) -> KioskResult<()> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !value.starts_with('.');

    if valid {
        Ok(())
    } else {
        Err(KioskError::User(format!(
            "Invalid cache {} '{}': use letters, digits, '-', '_' or '.'",
            what, value
        )))
    }
}
