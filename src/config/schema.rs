//! Configuration schema for kiosk-cache
//!
//! Configuration is stored at `~/.config/kiosk-cache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Kiosk site settings
    pub site: SiteConfig,

    /// Bucket naming and manifests
    pub cache: CacheConfig,

    /// Network fetch settings
    pub fetch: FetchConfig,

    /// Foreground controller settings
    pub controller: ControllerConfig,

    /// Catalogue data
    pub catalogue: CatalogueConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record lifecycle events to the activity log
    pub activity_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            activity_log: true,
        }
    }
}

/// Kiosk site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin the kiosk app is served from
    pub origin: String,

    /// Path of the offline fallback page
    pub offline_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000".to_string(),
            offline_path: "/offline".to_string(),
        }
    }
}

/// Bucket naming and manifest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Bucket name prefix
    pub prefix: String,

    /// Deployment version tag; bump to roll every bucket over
    pub version: String,

    /// Assets stored in the static bucket at install
    pub static_assets: Vec<String>,

    /// Page routes stored in the dynamic bucket at install and on warm
    pub page_routes: Vec<String>,

    /// Representative assets fetched on warm
    pub warm_assets: Vec<String>,

    /// Merge routes derived from the catalogue into `page_routes`
    pub derive_page_routes: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: "logotip".to_string(),
            version: "v1".to_string(),
            static_assets: default_static_assets(),
            page_routes: default_page_routes(),
            warm_assets: default_warm_assets(),
            derive_page_routes: true,
        }
    }
}

const FONT_WEIGHTS: &[&str] = &["Book", "Medium", "Demi", "Bold", "ExtraBold", "Heavy"];

fn default_static_assets() -> Vec<String> {
    let mut assets: Vec<String> = [
        "/",
        "/manifest.json",
        "/favicon.ico",
        "/logo.svg",
        "/back.svg",
        "/logotip-bg.svg",
        "/offline",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for weight in FONT_WEIGHTS {
        assets.push(format!("/fonts/FuturaPT-{}.ttf", weight));
        assets.push(format!("/fonts/FuturaPT-{}Obl.ttf", weight));
    }
    assets
}

fn default_page_routes() -> Vec<String> {
    [
        "/",
        "/mugs",
        "/tricouri",
        "/cutii-etichete-vin",
        "/ceasuri",
        "/tocatoare-si-sorturi",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_warm_assets() -> Vec<String> {
    [
        "/logo.svg",
        "/back.svg",
        "/logotip-bg.svg",
        "/fonts/FuturaPT-Book.ttf",
        "/fonts/FuturaPT-Medium.ttf",
        "/fonts/FuturaPT-Demi.ttf",
        "/fonts/FuturaPT-Bold.ttf",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Network fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Largest body accepted, in MB
    pub max_body_mb: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_body_mb: 32,
        }
    }
}

/// Foreground controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Interval between update checks in seconds
    pub update_interval_secs: u64,

    /// Margin around the viewport at which images start caching, in px
    pub root_margin_px: f64,

    /// Minimum time between DOM rescans in milliseconds
    pub rescan_throttle_ms: u64,

    /// Interval between origin reachability checks in seconds
    pub connectivity_check_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 60,
            root_margin_px: 200.0,
            rescan_throttle_ms: 500,
            connectivity_check_secs: 15,
        }
    }
}

/// Catalogue data configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogueConfig {
    /// Path to the generated catalogue JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[controller]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.prefix, "logotip");
        assert_eq!(config.cache.version, "v1");
        assert_eq!(config.site.offline_path, "/offline");
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [cache]
            version = "v2"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.version, "v2");
        assert_eq!(config.cache.prefix, "logotip"); // default preserved
        assert_eq!(config.controller.update_interval_secs, 60);
    }

    #[test]
    fn static_manifest_contents() {
        let assets = default_static_assets();
        assert_eq!(assets[0], "/");
        assert!(assets.contains(&"/offline".to_string()));
        assert!(assets.contains(&"/fonts/FuturaPT-HeavyObl.ttf".to_string()));
        assert_eq!(assets.iter().filter(|a| a.starts_with("/fonts/")).count(), 12);
    }
}
