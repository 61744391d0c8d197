//! Lifetime extension for fire-and-forget work
//!
//! Background cache writes are spawned so they never delay a response,
//! but the host must not tear the worker down while they are in flight.
//! `BackgroundTasks::settle` waits for everything spawned so far.

use std::future::Future;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

/// Tracks spawned tasks until they settle
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` without awaiting it
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tasks not yet finished
    pub fn pending(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Wait for every task spawned so far, including ones spawned while waiting
    pub async fn settle(&self) {
        loop {
            let pending = {
                let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
                std::mem::take(&mut *handles)
            };
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    warn!("Background task failed: {}", e);
                }
            }
        }
    }
}
