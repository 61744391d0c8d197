//! kiosk-cache - offline caching for the kiosk storefront
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use kiosk_cache::cli::{Cli, Commands, HostContext};
use kiosk_cache::config::{ConfigManager, StatePaths};
use kiosk_cache::error::KioskResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> KioskResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("kiosk_cache=warn"),
        1 => EnvFilter::new("kiosk_cache=info"),
        _ => EnvFilter::new("kiosk_cache=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }

    debug!("Using config {}", config_manager.path().display());
    let paths = StatePaths::resolve(cli.state_dir);
    let host = HostContext::new(config, &config_manager, paths);

    match cli.command {
        Commands::Install => kiosk_cache::cli::commands::install(&host).await,
        Commands::Warm => kiosk_cache::cli::commands::warm(&host).await,
        Commands::Fetch(args) => kiosk_cache::cli::commands::fetch(args, &host).await,
        Commands::Cache(args) => kiosk_cache::cli::commands::cache(args, &host).await,
        Commands::Catalogue(args) => kiosk_cache::cli::commands::catalogue(args, &host).await,
        Commands::Config(args) => kiosk_cache::cli::commands::config(args, &host).await,
        Commands::Status => kiosk_cache::cli::commands::status(&host).await,
        Commands::Watch(args) => kiosk_cache::cli::commands::watch(args, &host).await,
    }
}
