//! Fetch command - resolve one request the way a page would

use crate::cli::args::FetchArgs;
use crate::cli::HostContext;
use crate::error::KioskResult;
use crate::http::Request;
use crate::ui::{self, UiContext};
use crate::worker::ResponseSource;
use console::style;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, host: &HostContext) -> KioskResult<()> {
    let ctx = UiContext::detect();
    let config = host.worker_config().await?;
    let url = config.resolve(&args.url)?;
    let request = if args.navigate {
        Request::navigate(url)
    } else {
        Request::get(url)
    };

    let fetcher = host.fetcher(args.offline)?;
    let registration = host.registration(&config, fetcher).await?;
    if registration.active().is_none() {
        ui::step_warn_hint(
            &ctx,
            &format!("No active worker for {}", config.version),
            "Request goes straight to the network",
        );
    }

    let served = registration.fetch(&request).await?;
    registration.settle().await;

    let response = &served.response;
    let status = format!("{} {}", response.status, response.status_text);
    let status = if response.is_ok() {
        style(status).green()
    } else {
        style(status).yellow()
    };

    println!("{} {}", style("Request:").bold(), request.cache_key());
    println!("{} {}", style("Status:").bold(), status);
    println!("{} {}", style("Source:").bold(), describe(&served.source));
    if let Some(content_type) = response.header("content-type") {
        println!("{} {}", style("Type:").bold(), content_type);
    }
    println!("{} {} bytes", style("Body:").bold(), response.body.len());

    Ok(())
}

fn describe(source: &ResponseSource) -> String {
    match source {
        ResponseSource::Cache { bucket } => format!("cache ({})", bucket),
        ResponseSource::Network { stored: true } => "network (stored)".to_string(),
        ResponseSource::Network { stored: false } => "network".to_string(),
        ResponseSource::CachedPage => "cached page (offline)".to_string(),
        ResponseSource::OfflinePage => "offline page".to_string(),
        ResponseSource::Synthetic => "offline fallback".to_string(),
        ResponseSource::Passthrough => "network (no worker)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_sources() {
        let cache = ResponseSource::Cache {
            bucket: "logotip-static-v1".to_string(),
        };
        assert_eq!(describe(&cache), "cache (logotip-static-v1)");
        assert_eq!(
            describe(&ResponseSource::Network { stored: true }),
            "network (stored)"
        );
        assert_eq!(describe(&ResponseSource::Synthetic), "offline fallback");
    }
}
