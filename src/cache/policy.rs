//! Cacheability classification
//!
//! Decides whether a successful response may be written to the dynamic
//! bucket. Classes are additive: any match makes a request cacheable.
//! Requests that match nothing are still served from the network.

use crate::http::Request;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "ico"];
const FONT_EXTENSIONS: &[&str] = &["ttf", "woff", "woff2", "eot"];
const CODE_EXTENSIONS: &[&str] = &["css", "js"];

/// Why a request was considered cacheable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheClass {
    Navigation,
    Image,
    Font,
    StyleOrScript,
    /// Catalogue or API data
    Data,
    /// Bundler-emitted static chunk
    BuildAsset,
    /// Anything under `/assets/`
    Asset,
}

/// Classify a request, returning the first matching class
pub fn classify(request: &Request) -> Option<CacheClass> {
    if request.is_navigation() {
        return Some(CacheClass::Navigation);
    }

    let path = request.url.path();

    if let Some(ext) = extension(path) {
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Some(CacheClass::Image);
        }
        if FONT_EXTENSIONS.contains(&ext.as_str()) {
            return Some(CacheClass::Font);
        }
        if CODE_EXTENSIONS.contains(&ext.as_str()) {
            return Some(CacheClass::StyleOrScript);
        }
    }

    if path.contains("/api/") || path.contains("/catalogue") {
        return Some(CacheClass::Data);
    }

    if path.starts_with("/_next/static/") {
        return Some(CacheClass::BuildAsset);
    }

    if path.starts_with("/assets/") {
        return Some(CacheClass::Asset);
    }

    None
}

/// Whether a successful response to `request` may be stored
pub fn should_cache(request: &Request) -> bool {
    classify(request).is_some()
}

/// Lowercased extension of the last path segment
fn extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
