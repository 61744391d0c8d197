//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// kiosk-cache - offline caching for the kiosk storefront
///
/// Installs versioned cache buckets for the kiosk site, answers requests
/// cache-first and keeps the catalogue imagery warm for offline use.
#[derive(Parser, Debug)]
#[command(name = "kiosk-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KIOSK_CACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding buckets, the worker record and the activity log
    #[arg(long, global = true, env = "KIOSK_CACHE_STATE_DIR")]
    pub state_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install and activate the configured cache version
    Install,

    /// Cache every page route and catalogue image
    Warm,

    /// Resolve one request through the worker
    Fetch(FetchArgs),

    /// Inspect or clear cache buckets
    Cache(CacheArgs),

    /// Browse the product catalogue
    Catalogue(CatalogueArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Show the worker registration and bucket contents
    Status,

    /// Run the worker and the page controller until Ctrl-C
    Watch(WatchArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL, or a path on the configured origin
    pub url: String,

    /// Treat the request as a page navigation
    #[arg(short, long)]
    pub navigate: bool,

    /// Simulate a network outage
    #[arg(long)]
    pub offline: bool,
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List buckets in the store
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List entries stored in a bucket
    Entries {
        /// Bucket name (e.g. logotip-static-v1)
        bucket: String,
    },

    /// Delete every bucket and forget the installed worker
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the catalogue command
#[derive(Parser, Debug)]
pub struct CatalogueArgs {
    /// Subcommand for catalogue
    #[command(subcommand)]
    pub action: CatalogueAction,
}

/// Catalogue subcommands
#[derive(Subcommand, Debug)]
pub enum CatalogueAction {
    /// List categories and their subcategories
    Categories,

    /// List designs of a category
    Designs {
        /// Category slug
        category: String,

        /// Subcategory slug
        subcategory: Option<String>,
    },

    /// Show one design
    Design {
        /// Design id
        id: String,
    },

    /// Page routes derived from the catalogue
    Routes,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Start as if the page loaded without connectivity
    #[arg(long)]
    pub offline_start: bool,
}
