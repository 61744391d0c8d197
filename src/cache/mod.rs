//! Named-bucket response cache
//!
//! Responses are stored per bucket, keyed by method plus absolute URL.
//! Bucket names carry the deployment version tag so a new version starts
//! with fresh buckets and the old ones can be swept on activation.
//!
//! # Buckets
//!
//! | Bucket | Name | Written by |
//! |--------|------|------------|
//! | Static | `{prefix}-static-{version}` | install-time seeder |
//! | Dynamic | `{prefix}-dynamic-{version}` | interceptor, warmer, seeder (pages) |
//! | Legacy | `{prefix}-kiosk-{version}` | nobody, swept on activation |

pub mod disk;
pub mod memory;
pub mod names;
pub mod policy;
pub mod store;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use names::CacheNames;
pub use policy::should_cache;
pub use store::CacheStore;
