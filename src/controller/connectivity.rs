//! Origin reachability as online/offline page signals
//!
//! A headless host has no browser telling it when the network comes back.
//! `ReachabilityMonitor` sends a HEAD to the origin on an interval and reports
//! each transition as `PageSignal::Online`.

use super::PageSignal;
use crate::fetch::Fetcher;
use crate::http::{Method, Request};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use url::Url;

pub struct ReachabilityMonitor {
    fetcher: Arc<dyn Fetcher>,
    origin: Url,
    interval: Duration,
    online: bool,
}

impl ReachabilityMonitor {
    /// `online` is the state the page already knows about
    pub fn new(fetcher: Arc<dyn Fetcher>, origin: Url, interval: Duration, online: bool) -> Self {
        Self {
            fetcher,
            origin,
            interval: interval.max(Duration::from_millis(10)),
            online,
        }
    }

    /// Any HTTP answer counts as reachable
    pub async fn check(&self) -> bool {
        let request = Request::get(self.origin.clone()).with_method(Method::Head);
        match self.fetcher.fetch(&request).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Origin unreachable: {}", e);
                false
            }
        }
    }

    /// Check until the receiving side goes away
    pub async fn run(mut self, signals: mpsc::Sender<PageSignal>) {
        let mut ticks = tokio::time::interval(self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticks.tick() => {}
                _ = signals.closed() => break,
            }

            let online = self.check().await;
            if online == self.online {
                continue;
            }
            info!(
                "Origin {} is {}",
                self.origin,
                if online { "reachable" } else { "unreachable" }
            );
            self.online = online;
            if signals.send(PageSignal::Online(online)).await.is_err() {
                break;
            }
        }
    }
}
