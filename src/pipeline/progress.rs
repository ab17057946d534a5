//! Fire-and-forget progress notifications.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::models::{ProgressEvent, ProgressStatus, ProgressStep};

/// Sink for progress events. `report` runs on the blocking pool, one event at a
/// time per request, so it may block without delaying the pipeline.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn report(&self, event: ProgressEvent) {
        info!(
            request_id = %event.request_id,
            status = ?event.status,
            step = ?event.step,
            "{}",
            event.message
        );
    }
}

/// Forwards events over a bounded channel, dropping them when the channel is
/// full or the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelReporter {
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, event: ProgressEvent) {
        if let Err(e) = self.tx.try_send(event) {
            debug!("Dropping progress event: {}", e);
        }
    }
}

/// Per-request wrapper that keeps events monotonic and delivers them off the
/// request path.
///
/// Events go onto an unbounded queue drained by one spawned task, which hands
/// each event to the sink on the blocking pool in emission order. A slow or
/// panicking sink therefore never stalls or fails the pipeline. The drain
/// task ends once the tracker is dropped and the queue is empty.
///
/// Must be created inside a Tokio runtime.
pub struct ProgressTracker {
    request_id: String,
    tx: mpsc::UnboundedSender<ProgressEvent>,
    last: Mutex<Option<(ProgressStatus, ProgressStep)>>,
}

impl ProgressTracker {
    pub fn new(request_id: impl Into<String>, sink: Arc<dyn ProgressReporter>) -> Self {
        let request_id = request_id.into();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain(request_id.clone(), sink, rx));
        Self {
            request_id,
            tx,
            last: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Queue an event unless it would move backwards or follow a terminal event.
    /// Returns whether the event was accepted.
    pub fn emit(&self, status: ProgressStatus, step: ProgressStep, detail: Option<&str>) -> bool {
        {
            let mut last = self
                .last
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some((prev_status, prev_step)) = *last
                && (prev_status.is_terminal() || status < prev_status || step < prev_step)
            {
                debug!(
                    request_id = %self.request_id,
                    ?status,
                    ?step,
                    "Suppressing out-of-order progress event"
                );
                return false;
            }
            *last = Some((status, step));
        }

        let message = match detail {
            Some(d) => format!("{}: {d}", step.label()),
            None => step.label().to_string(),
        };
        let event = ProgressEvent {
            request_id: self.request_id.clone(),
            status,
            step,
            message,
        };

        if self.tx.send(event).is_err() {
            debug!(request_id = %self.request_id, "Progress drain has stopped; dropping event");
        }
        true
    }
}

async fn drain(
    request_id: String,
    sink: Arc<dyn ProgressReporter>,
    mut rx: mpsc::UnboundedReceiver<ProgressEvent>,
) {
    while let Some(event) = rx.recv().await {
        let sink = Arc::clone(&sink);
        if let Err(e) = tokio::task::spawn_blocking(move || sink.report(event)).await {
            warn!(request_id = %request_id, "Progress reporter failed; continuing: {}", e);
        }
    }
}
