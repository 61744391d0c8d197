//! The offline worker
//!
//! A worker version seeds its buckets at install, sweeps older versions'
//! buckets at activation, then answers every in-scope GET cache-first with
//! offline fallbacks. Page messages trigger bulk or opportunistic warming.
//!
//! ```text
//! page ──WorkerHandle──► WorkerHost ──► Registration ──► ServiceWorker
//!   ▲                                        │             ├─ Seeder
//!   └──────── RegistrationEvent ◄────────────┘             ├─ VersionManager
//!                                                          ├─ Interceptor
//!                                                          └─ Warmer
//! ```

pub mod config;
pub mod host;
pub mod interceptor;
pub mod messages;
pub mod registration;
pub mod report;
pub mod seeder;
pub mod service;
pub mod state;
pub mod tasks;
pub mod versions;
pub mod warmer;

pub use config::WorkerConfig;
pub use host::{StaticSource, UpdateSource, WorkerHandle, WorkerHost};
pub use interceptor::{Resolution, ResponseSource};
pub use messages::{MessageOutcome, WorkerMessage};
pub use registration::{Dispatcher, Registration, RegistrationEvent, Served};
pub use report::{ActivationReport, BatchReport, InstallReport};
pub use service::ServiceWorker;
pub use state::{LifecycleEvent, WorkerState};
