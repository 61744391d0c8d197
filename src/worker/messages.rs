//! Page-to-worker messages
//!
//! Wire shape matches what the page posts:
//! `{"type":"CACHE_ALL"}`, `{"type":"CACHE_URLS","urls":[...]}`,
//! `{"type":"SKIP_WAITING"}`.

use super::report::BatchReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Warm every page route and warm-up asset
    CacheAll,
    /// Cache specific URLs (relative or absolute)
    CacheUrls { urls: Vec<String> },
    /// Activate the waiting version immediately
    SkipWaiting,
}

/// What handling a message produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Warmed(BatchReport),
    SkipWaiting,
}
