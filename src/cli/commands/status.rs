//! Status command - worker registration and bucket contents

use crate::cache::{CacheNames, CacheStore};
use crate::cli::HostContext;
use crate::error::KioskResult;
use crate::record::WorkerRecord;
use crate::ui::{self, UiContext};

/// Execute the status command
pub async fn execute(host: &HostContext) -> KioskResult<()> {
    let ctx = UiContext::detect();
    let config = &host.config;
    let names = CacheNames::new(&config.cache.prefix, &config.cache.version)?;

    ui::intro(&ctx, "kiosk-cache status");

    ui::section(&ctx, "Configuration");
    ui::key_value(&ctx, "origin", &config.site.origin);
    ui::key_value(&ctx, "version", &config.cache.version);
    ui::key_value(&ctx, "buckets", &names.to_string());
    ui::key_value(&ctx, "state dir", &host.paths.root().display().to_string());

    ui::section(&ctx, "Worker");
    let record = host.record().await?;
    show_record(&ctx, record.as_ref(), &config.cache.version);

    ui::section(&ctx, "Buckets");
    let store = host.store();
    let buckets = store.bucket_names().await?;
    for bucket in names.current() {
        let count = if buckets.iter().any(|b| b == bucket) {
            store.keys(bucket).await?.len()
        } else {
            0
        };
        ui::key_value_status(&ctx, bucket, &format!("{} entries", count), count > 0);
    }
    for stale in buckets.iter().filter(|b| !names.is_current(b)) {
        ui::step_warn_hint(
            &ctx,
            &format!("Stale bucket {}", stale),
            "Removed on the next activation",
        );
    }

    let recent = host.activity().tail(5).await;
    if !recent.is_empty() {
        ui::section(&ctx, "Recent activity");
        for entry in &recent {
            let timestamp = entry["timestamp"].as_str().unwrap_or("-");
            let event = entry["event"].as_str().unwrap_or("-");
            ui::remark(&ctx, &format!("{} {} {}", timestamp, event, entry["data"]));
        }
    }

    Ok(())
}

fn show_record(ctx: &UiContext, record: Option<&WorkerRecord>, version: &str) {
    let Some(record) = record else {
        ui::step_warn_hint(ctx, "No worker installed", "Run: kiosk-cache install");
        return;
    };

    ui::key_value_status(
        ctx,
        "version",
        &record.version,
        record.version == version,
    );
    ui::key_value_status(
        ctx,
        "state",
        &record.state.to_string(),
        record.is_active(&record.version),
    );
    ui::key_value(
        ctx,
        "installed",
        &record.installed_at.format("%Y-%m-%d %H:%M").to_string(),
    );
    if let Some(activated) = record.activated_at {
        ui::key_value(ctx, "activated", &activated.format("%Y-%m-%d %H:%M").to_string());
    }
    match record.warmed_at {
        Some(warmed) => ui::key_value(ctx, "warmed", &warmed.format("%Y-%m-%d %H:%M").to_string()),
        None => ui::remark(ctx, "Not warmed yet; run: kiosk-cache warm"),
    }
    if record.version != version {
        ui::step_warn_hint(
            ctx,
            &format!("Configured version {} is not installed", version),
            "Run: kiosk-cache install",
        );
    }
}
