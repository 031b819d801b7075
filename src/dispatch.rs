//! Action side effects, decoupled from the frame path.
//!
//! The debounce engine produces [`TriggerEvent`]s synchronously; actually
//! sending a message or playing a sound can be slow or fail, so events go
//! through a [`DispatchQueue`] and are consumed by a worker task. A failing
//! dispatcher is logged and never reaches back into matching or debouncing.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::debounce::TriggerEvent;
use crate::error::Result;

/// Effect to perform when a label sustains long enough to trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Send a notification message.
    Message { text: String },
    /// Play an audio file.
    Sound { path: PathBuf },
    /// Only log the detection.
    Log,
}

/// External effect executor. Implementations own their transport (messaging
/// service, audio device, display) and may block; they run on the queue
/// worker, never on the frame path.
pub trait ActionDispatcher: Send + Sync + 'static {
    fn dispatch(&self, event: &TriggerEvent) -> Result<()>;
}

/// Dispatcher that records detections in the log and performs no I/O.
pub struct LogDispatcher;

impl ActionDispatcher for LogDispatcher {
    fn dispatch(&self, event: &TriggerEvent) -> Result<()> {
        match &event.action {
            Action::Message { text } => {
                info!(entity = event.entity, label = %event.label, "alert: {}", text)
            }
            Action::Sound { path } => {
                info!(entity = event.entity, label = %event.label, "play {}", path.display())
            }
            Action::Log => info!(entity = event.entity, label = %event.label, "detected"),
        }
        Ok(())
    }
}

/// Hand-off channel between the debounce engine and a dispatcher.
///
/// `send` enqueues and returns immediately. Dispatch failures are logged;
/// the originating latch stays set, so a failed action is not retried.
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<TriggerEvent>,
    worker: JoinHandle<()>,
}

impl DispatchQueue {
    /// Spawn the consuming worker on the current tokio runtime.
    pub fn spawn(dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<TriggerEvent>();
        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = dispatcher.dispatch(&event) {
                    warn!(label = %event.label, "action dispatch failed: {}", e);
                }
            }
        });
        Self { tx, worker }
    }

    /// Enqueue an event without blocking. Events offered after shutdown are
    /// dropped silently.
    pub fn send(&self, event: TriggerEvent) {
        if self.tx.send(event).is_err() {
            debug!("dispatch queue closed, dropping event");
        }
    }

    /// Stop intake, let the worker drain what was already queued, and wait
    /// for it to finish.
    pub async fn close(self) {
        drop(self.tx);
        let _ = self.worker.await;
    }
}
