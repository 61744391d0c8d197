//! Cache command - inspect or clear the bucket store

use crate::activity::events;
use crate::cache::{CacheNames, CacheStore, DiskStore};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::cli::HostContext;
use crate::error::{KioskError, KioskResult};
use crate::record::WorkerRecord;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use serde_json::json;

/// Execute the cache command
pub async fn execute(args: CacheArgs, host: &HostContext) -> KioskResult<()> {
    let store = host.store();
    let names = CacheNames::new(&host.config.cache.prefix, &host.config.cache.version)?;

    match args.action {
        CacheAction::List { format } => list_buckets(&store, &names, format).await,
        CacheAction::Entries { bucket } => list_entries(&store, &bucket).await,
        CacheAction::Clear { yes } => clear_buckets(host, &store, yes).await,
    }
}

#[derive(Debug, Serialize)]
struct BucketSummary {
    name: String,
    entries: usize,
    bytes: u64,
    current: bool,
}

async fn summarize(store: &DiskStore, names: &CacheNames) -> KioskResult<Vec<BucketSummary>> {
    let mut summaries = Vec::new();
    for name in store.bucket_names().await? {
        let entries = store.entries(&name).await?;
        summaries.push(BucketSummary {
            current: names.is_current(&name),
            entries: entries.len(),
            bytes: entries.iter().map(|e| e.body_len).sum(),
            name,
        });
    }
    Ok(summaries)
}

/// List buckets with entry counts
async fn list_buckets(
    store: &DiskStore,
    names: &CacheNames,
    format: OutputFormat,
) -> KioskResult<()> {
    let buckets = summarize(store, names).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&buckets)?),
        OutputFormat::Plain => {
            for bucket in &buckets {
                println!("{}", bucket.name);
            }
        }
        OutputFormat::Table => {
            if buckets.is_empty() {
                println!("No cache buckets found.");
                return Ok(());
            }
            print_bucket_table(&buckets);
        }
    }

    Ok(())
}

fn print_bucket_table(buckets: &[BucketSummary]) {
    println!("{:<32} {:>8} {:>12} {:<8}", "BUCKET", "ENTRIES", "SIZE", "STATE");
    println!("{}", "-".repeat(64));

    for bucket in buckets {
        let state = if bucket.current {
            style("current").green().to_string()
        } else {
            style("stale").yellow().to_string()
        };
        println!(
            "{:<32} {:>8} {:>12} {:<8}",
            bucket.name,
            bucket.entries,
            format_size(bucket.bytes),
            state
        );
    }

    println!();
    println!("Total: {} bucket(s)", buckets.len());
}

/// List the entries of one bucket
async fn list_entries(store: &DiskStore, bucket: &str) -> KioskResult<()> {
    if !store.bucket_names().await?.iter().any(|b| b == bucket) {
        return Err(KioskError::BucketNotFound(bucket.to_string()));
    }

    let entries = store.entries(bucket).await?;
    if entries.is_empty() {
        println!("Bucket {} is empty.", bucket);
        return Ok(());
    }

    println!(
        "{:<56} {:>6} {:<6} {:>10} {:<16}",
        "REQUEST", "STATUS", "TYPE", "SIZE", "STORED"
    );
    println!("{}", "-".repeat(98));
    for entry in &entries {
        println!(
            "{:<56} {:>6} {:<6} {:>10} {:<16}",
            entry.key.to_string(),
            entry.status,
            format!("{:?}", entry.kind).to_lowercase(),
            format_size(entry.body_len),
            entry.stored_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!();
    println!("Total: {} entr{}", entries.len(), if entries.len() == 1 { "y" } else { "ies" });

    Ok(())
}

/// Delete every bucket and forget the installed worker
async fn clear_buckets(host: &HostContext, store: &DiskStore, yes: bool) -> KioskResult<()> {
    let ctx = UiContext::detect().with_auto_yes(yes);
    let buckets = store.bucket_names().await?;

    if buckets.is_empty() {
        ui::step_info(&ctx, "No cache buckets to clear");
        return Ok(());
    }

    let message = format!("Delete {} bucket(s) and the worker registration?", buckets.len());
    if !ui::confirm(&ctx, &message, false).await? {
        ui::step_warn_hint(&ctx, "Nothing deleted", "Use --yes to skip the prompt");
        return Ok(());
    }

    let mut deleted = Vec::new();
    for bucket in &buckets {
        match store.delete_bucket(bucket).await {
            Ok(_) => {
                ui::step_ok(&ctx, &format!("Deleted {}", bucket));
                deleted.push(bucket.clone());
            }
            Err(e) => ui::step_error_detail(
                &ctx,
                &format!("Could not delete {}", bucket),
                &e.to_string(),
            ),
        }
    }

    WorkerRecord::delete(&host.paths.record_path()).await?;
    host.activity()
        .log(events::CACHE_CLEARED, &json!({ "deleted": deleted }))
        .await;

    ui::outro_success(&ctx, &format!("Cleared {} bucket(s)", deleted.len()));
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
