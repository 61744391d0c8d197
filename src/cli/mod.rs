//! Command-line interface

pub mod args;
pub mod commands;
mod context;
mod recorder;

pub use args::{Cli, Commands};
pub use context::HostContext;
pub(crate) use recorder::LifecycleRecorder;
