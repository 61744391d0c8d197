//! Network fetchers
//!
//! The worker never talks to the network directly; it goes through a
//! `Fetcher` so hosts can plug in a live client, a simulated outage or a
//! scripted network in tests.

use crate::config::schema::FetchConfig;
use crate::error::{KioskError, KioskResult};
use crate::http::{status_text, Method, Request, RequestMode, Response, ResponseType};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;
use ureq::ResponseExt;
use url::Url;

/// Abstract network interface
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a request. Only transport failures are errors; any HTTP
    /// status (including 4xx/5xx) is a successful fetch.
    async fn fetch(&self, request: &Request) -> KioskResult<Response>;
}

/// Live HTTP fetcher backed by `ureq`
pub struct HttpFetcher {
    agent: ureq::Agent,
    origin: Url,
    max_body_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher for the kiosk served at `origin`
    pub fn new(origin: Url, config: &FetchConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            origin,
            max_body_bytes: u64::from(config.max_body_mb) * 1024 * 1024,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> KioskResult<Response> {
        let agent = self.agent.clone();
        let origin = self.origin.clone();
        let request = request.clone();
        let limit = self.max_body_bytes;

        // ureq is blocking; keep it off the async workers
        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &origin, &request, limit))
            .await
            .map_err(|e| KioskError::Internal(format!("fetch task failed: {}", e)))?
    }
}

fn fetch_blocking(
    agent: &ureq::Agent,
    origin: &Url,
    request: &Request,
    limit: u64,
) -> KioskResult<Response> {
    let url = request.url.as_str();
    debug!("Fetching {} {}", request.method, url);

    let result = match request.method {
        Method::Get => agent.get(url).call(),
        Method::Head => agent.head(url).call(),
        other => {
            return Err(KioskError::network(
                url,
                format!("method {} is not supported by the kiosk fetcher", other),
            ))
        }
    };
    let mut response = result.map_err(|e| KioskError::network(url, e))?;

    let status = response.status().as_u16();
    let reason = response
        .status()
        .canonical_reason()
        .unwrap_or_else(|| status_text(status))
        .to_string();

    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    // Redirects may land on another origin
    let final_url =
        Url::parse(&response.get_uri().to_string()).unwrap_or_else(|_| request.url.clone());
    let kind = response_type(origin, &final_url, request.mode);

    let body = response
        .body_mut()
        .with_config()
        .limit(limit)
        .read_to_vec()
        .map_err(|e| KioskError::network(url, e))?;

    Ok(Response {
        status,
        status_text: reason,
        headers,
        body: Bytes::from(body),
        kind,
    })
}

/// Browser-style response type for a response served from `url`
pub fn response_type(origin: &Url, url: &Url, mode: RequestMode) -> ResponseType {
    if url.origin() == origin.origin() {
        ResponseType::Basic
    } else if mode == RequestMode::NoCors {
        ResponseType::Opaque
    } else {
        ResponseType::Cors
    }
}

/// Fetcher for a host with no connectivity: every request fails
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, request: &Request) -> KioskResult<Response> {
        Err(KioskError::network(request.url.as_str(), "network unreachable"))
    }
}
