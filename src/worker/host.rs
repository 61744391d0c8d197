//! Worker context: a task that owns the registration
//!
//! The page side holds a cloneable `WorkerHandle`. Commands are delivered
//! FIFO over a bounded channel; fetches get their answer over a oneshot.
//! Lifecycle commands run one at a time on the registration. Fetches and
//! warm-up messages run as tasks against the worker active when they
//! arrived, so a slow network fetch only holds up its own caller.

use super::config::WorkerConfig;
use super::messages::{MessageOutcome, WorkerMessage};
use super::registration::{Dispatcher, Registration, Served};
use super::tasks::BackgroundTasks;
use crate::error::{KioskError, KioskResult};
use crate::http::Request;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 64;

/// Where the latest worker version comes from
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn latest(&self) -> KioskResult<WorkerConfig>;
}

/// A fixed version; useful for embedding and tests
pub struct StaticSource(pub WorkerConfig);

#[async_trait]
impl UpdateSource for StaticSource {
    async fn latest(&self) -> KioskResult<WorkerConfig> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
pub(crate) enum HostCommand {
    /// Check for a new version and install it if there is one
    Update,
    Post(WorkerMessage),
    Fetch {
        request: Request,
        reply: oneshot::Sender<KioskResult<Served>>,
    },
}

/// Page-side handle to the worker context
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<HostCommand>,
}

impl WorkerHandle {
    /// A handle whose commands land in the returned receiver
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::Receiver<HostCommand>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        (Self { tx }, rx)
    }

    /// Register on first call, update afterwards
    pub async fn update(&self) -> KioskResult<()> {
        self.send(HostCommand::Update).await
    }

    /// Post a message; the outcome is only logged in the worker context
    pub async fn post(&self, message: WorkerMessage) -> KioskResult<()> {
        self.send(HostCommand::Post(message)).await
    }

    pub async fn fetch(&self, request: Request) -> KioskResult<Served> {
        let (reply, rx) = oneshot::channel();
        self.send(HostCommand::Fetch { request, reply }).await?;
        rx.await.map_err(|_| KioskError::ChannelClosed)?
    }

    async fn send(&self, command: HostCommand) -> KioskResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| KioskError::ChannelClosed)
    }
}

pub struct WorkerHost {
    registration: Registration,
    source: Arc<dyn UpdateSource>,
    commands: mpsc::Receiver<HostCommand>,
    in_flight: BackgroundTasks,
}

impl WorkerHost {
    /// Spawn the worker context. It runs until every handle is dropped,
    /// settles outstanding background work and hands the registration back.
    pub fn spawn(
        registration: Registration,
        source: Arc<dyn UpdateSource>,
    ) -> (WorkerHandle, JoinHandle<Registration>) {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let host = Self {
            registration,
            source,
            commands,
            in_flight: BackgroundTasks::new(),
        };
        (WorkerHandle { tx }, tokio::spawn(host.run()))
    }

    async fn run(mut self) -> Registration {
        while let Some(command) = self.commands.recv().await {
            self.handle(command).await;
        }
        debug!("Worker host shutting down");
        self.in_flight.settle().await;
        self.registration.settle().await;
        self.registration
    }

    async fn handle(&mut self, command: HostCommand) {
        match command {
            HostCommand::Update => match self.source.latest().await {
                Ok(config) => self.registration.update(config).await,
                Err(e) => warn!("Update check failed: {}", e),
            },
            HostCommand::Post(WorkerMessage::SkipWaiting) => {
                self.registration.skip_waiting().await;
            }
            HostCommand::Post(message) => {
                let dispatcher = self.registration.dispatcher();
                self.in_flight.spawn(deliver(dispatcher, message));
            }
            HostCommand::Fetch { request, reply } => {
                let dispatcher = self.registration.dispatcher();
                self.in_flight.spawn(async move {
                    let result = dispatcher.fetch(&request).await;
                    // Requester gave up; nothing to deliver
                    let _ = reply.send(result);
                });
            }
        }
    }
}

async fn deliver(dispatcher: Dispatcher, message: WorkerMessage) {
    match dispatcher.post(message).await {
        Ok(MessageOutcome::Warmed(report)) => info!(
            "Warmed {}: {} stored, {} skipped, {} failed",
            report.bucket,
            report.stored.len(),
            report.skipped.len(),
            report.failed.len()
        ),
        Ok(MessageOutcome::SkipWaiting) => {}
        Err(e) => warn!("Message not handled: {}", e),
    }
}
