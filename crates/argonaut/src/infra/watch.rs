//! Watch-pipeline plumbing: event taxonomy, bounded queue, and the
//! batch-window consumer.
//!
//! The subscribe task owns the upstream stream; a forwarder copies events
//! into a bounded queue that never blocks the producer (drops are logged);
//! the consume task coalesces bursts into one batch per window. Teardown
//! cancels the forwarder, which drops the queue sender; in-flight
//! consumes observe the close and finish promptly without touching the
//! upstream stream (that is owned by the subscribe task).

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, timeout_at};
use tracing::warn;

use crate::domain::app::App;

/// Capacity of the internal app-watch queue.
pub const WATCH_QUEUE_CAPACITY: usize = 100;

/// Capacity of the per-app tree stream channel.
pub const TREE_STREAM_CAPACITY: usize = 64;

/// Length of one batch window.
pub const BATCH_WINDOW: Duration = Duration::from_millis(500);

/// Number of accumulated events that closes a window early.
pub const BATCH_MAX_EVENTS: usize = 3;

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

/// One event read from the upstream application stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    AppUpdated(App),
    AppDeleted(String),
    AuthError(String),
    StatusChange(String),
    ApiError(String),
}

/// An event that must be delivered out-of-batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImmediateEvent {
    AuthError(String),
    StatusChange(String),
    ApiError(String),
}

enum Classified {
    Batchable(BatchableEvent),
    Immediate(ImmediateEvent),
}

enum BatchableEvent {
    Updated(App),
    Deleted(String),
}

fn classify(event: WatchEvent) -> Classified {
    match event {
        WatchEvent::AppUpdated(app) => Classified::Batchable(BatchableEvent::Updated(app)),
        WatchEvent::AppDeleted(name) => Classified::Batchable(BatchableEvent::Deleted(name)),
        WatchEvent::AuthError(err) => Classified::Immediate(ImmediateEvent::AuthError(err)),
        WatchEvent::StatusChange(text) => Classified::Immediate(ImmediateEvent::StatusChange(text)),
        WatchEvent::ApiError(msg) => Classified::Immediate(ImmediateEvent::ApiError(msg)),
    }
}

/// One coalesced delivery from the watch pipeline.
///
/// Within a batch each app name appears at most once across
/// `updates ∪ deletes`; last write wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppsBatch {
    pub updates: Vec<App>,
    pub deletes: Vec<String>,
    pub immediate: Option<ImmediateEvent>,
}

impl AppsBatch {
    fn apply(&mut self, event: BatchableEvent) {
        match event {
            BatchableEvent::Updated(app) => {
                self.deletes.retain(|name| name != &app.name);
                if let Some(existing) = self.updates.iter_mut().find(|u| u.name == app.name) {
                    *existing = app;
                } else {
                    self.updates.push(app);
                }
            }
            BatchableEvent::Deleted(name) => {
                self.updates.retain(|app| app.name != name);
                if !self.deletes.contains(&name) {
                    self.deletes.push(name);
                }
            }
        }
    }

    fn event_count(&self) -> usize {
        self.updates.len() + self.deletes.len()
    }
}

/// Shared handle to the internal watch queue.
///
/// The receiver sits behind a mutex so the consume task can be re-armed
/// from the loop without moving ownership; at most one consume holds the
/// lock at a time, which also preserves FIFO across batches.
pub type WatchQueue = Arc<Mutex<mpsc::Receiver<WatchEvent>>>;

/// Creates the bounded app-watch queue.
pub fn watch_queue() -> (mpsc::Sender<WatchEvent>, WatchQueue) {
    let (tx, rx) = mpsc::channel(WATCH_QUEUE_CAPACITY);

    (tx, Arc::new(Mutex::new(rx)))
}

/// Offers an event to the bounded queue without ever blocking the producer.
///
/// Returns `false` when the queue is closed. Drops on a full queue are
/// logged and counted as delivered.
pub fn offer(tx: &mpsc::Sender<WatchEvent>, event: WatchEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(event)) => {
            warn!(?event, "watch queue full, dropping event");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Result of one consume pass over the watch queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Consumed {
    /// A coalesced batch, possibly carrying an immediate tail event.
    Batch(AppsBatch),
    /// The first pending event was immediate; delivered out-of-batch.
    Immediate(ImmediateEvent),
    /// The queue closed and drained.
    Closed,
}

/// Pulls one delivery from the queue, coalescing a burst into a batch.
///
/// Waits for the first event, then collects more until an immediate event
/// arrives (attached and the window closes), [`BATCH_MAX_EVENTS`] have
/// accumulated, or the [`BATCH_WINDOW`] timer fires. FIFO order across
/// batches follows from holding the receiver for the whole pass.
pub async fn consume(queue: &WatchQueue) -> Consumed {
    let mut receiver = queue.lock().await;
    let Some(first) = receiver.recv().await else {
        return Consumed::Closed;
    };

    let mut batch = AppsBatch::default();
    match classify(first) {
        Classified::Immediate(event) => return Consumed::Immediate(event),
        Classified::Batchable(event) => batch.apply(event),
    }

    let deadline = Instant::now() + BATCH_WINDOW;
    while batch.event_count() < BATCH_MAX_EVENTS {
        match timeout_at(deadline, receiver.recv()).await {
            Ok(Some(event)) => match classify(event) {
                Classified::Immediate(immediate) => {
                    batch.immediate = Some(immediate);
                    break;
                }
                Classified::Batchable(batchable) => batch.apply(batchable),
            },
            // Queue closed mid-window: deliver what accumulated.
            Ok(None) => break,
            // Window elapsed.
            Err(_) => break,
        }
    }

    Consumed::Batch(batch)
}

/// Capped exponential backoff with ±20 % jitter for stream reconnects.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE.saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1).min(16)));
    let base = exp.min(BACKOFF_CAP);
    let jitter = rand::rng().random_range(0.8..1.2);

    base.mul_f64(jitter)
}
