//! kiosk-cache - offline caching for the kiosk storefront
//!
//! A service-worker style cache for a kiosk web app: versioned buckets
//! seeded at install, cache-first request handling with offline fallbacks,
//! background warming of catalogue imagery and a foreground controller
//! that keeps the page on the newest version.

pub mod activity;
pub mod cache;
pub mod catalogue;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod http;
pub mod record;
pub mod ui;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{KioskError, KioskResult};
