//! CLI command implementations

pub mod cache;
pub mod catalogue;
pub mod config;
pub mod fetch;
pub mod install;
pub mod status;
pub mod warm;
pub mod watch;

pub use cache::execute as cache;
pub use catalogue::execute as catalogue;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use status::execute as status;
pub use warm::execute as warm;
pub use watch::execute as watch;
