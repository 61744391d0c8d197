//! Resolved per-version worker configuration

use crate::cache::CacheNames;
use crate::catalogue::Catalogue;
use crate::config::Config;
use crate::error::{KioskError, KioskResult};
use url::Url;

/// Everything one worker version needs, resolved from `Config`
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Deployment version tag
    pub version: String,
    /// Origin the worker serves; also its scope
    pub origin: Url,
    pub names: CacheNames,
    /// Path of the offline fallback page
    pub offline_path: String,
    /// Seeded into the static bucket at install
    pub static_assets: Vec<String>,
    /// Seeded into the dynamic bucket at install and re-warmed on CACHE_ALL
    pub page_routes: Vec<String>,
    /// Warmed into the dynamic bucket on CACHE_ALL
    pub warm_assets: Vec<String>,
}

impl WorkerConfig {
    /// Resolve from the host config, merging catalogue-derived routes and
    /// cover images when a catalogue is available
    pub fn from_config(config: &Config, catalogue: Option<&Catalogue>) -> KioskResult<Self> {
        let origin = parse_origin(&config.site.origin)?;
        let names = CacheNames::new(&config.cache.prefix, &config.cache.version)?;

        let mut page_routes = Vec::new();
        merge_unique(&mut page_routes, config.cache.page_routes.iter().cloned());

        let mut warm_assets = Vec::new();
        merge_unique(&mut warm_assets, config.cache.warm_assets.iter().cloned());

        if let Some(catalogue) = catalogue {
            if config.cache.derive_page_routes {
                merge_unique(&mut page_routes, catalogue.page_routes());
            }
            merge_unique(&mut warm_assets, catalogue.cover_images());
        }

        let mut static_assets = Vec::new();
        merge_unique(&mut static_assets, config.cache.static_assets.iter().cloned());

        Ok(Self {
            version: config.cache.version.clone(),
            origin,
            names,
            offline_path: config.site.offline_path.clone(),
            static_assets,
            page_routes,
            warm_assets,
        })
    }

    /// Resolve a site-relative path (or absolute URL) against the origin
    pub fn resolve(&self, path: &str) -> KioskResult<Url> {
        self.origin.join(path).map_err(|e| KioskError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn offline_url(&self) -> KioskResult<Url> {
        self.resolve(&self.offline_path)
    }

    /// Whether `url` belongs to this worker's origin
    pub fn is_same_origin(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }
}

/// Parse and validate the kiosk origin
pub fn parse_origin(origin: &str) -> KioskResult<Url> {
    let url = Url::parse(origin).map_err(|e| KioskError::InvalidOrigin {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(KioskError::InvalidOrigin {
            origin: origin.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(KioskError::InvalidOrigin {
            origin: origin.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

fn merge_unique(target: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    for item in extra {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
