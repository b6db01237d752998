//! App side of the watch pipeline: subscribe supervision, batch
//! application, and consume re-arming.
//!
//! The supervisor owns the upstream stream and reconnects with capped
//! backoff; the forwarder copies events into the bounded queue; the
//! consume task turns queue contents into loop messages. At most one
//! subscription and one forwarder are live per epoch.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::msg::{Msg, Task, task};
use crate::app::{Model, StatusLevel};
use crate::domain::mode::Mode;
use crate::infra::watch::{
    AppsBatch, Consumed, ImmediateEvent, WatchEvent, backoff_delay, consume, offer, watch_queue,
};

/// Starts the subscribe/forward tasks for the current epoch.
pub fn start_watch_pipeline(model: &mut Model) -> Vec<Task> {
    let Some(api) = model.api.clone() else {
        return Vec::new();
    };
    let forward_cancel = CancellationToken::new();
    let subscribe_cancel = CancellationToken::new();
    model.watch_forward_cancel = Some(forward_cancel.clone());
    model.watch_subscribe_cancel = Some(subscribe_cancel.clone());

    let msg_tx = model.msg_tx.clone();
    let epoch = model.epoch;
    let start_generation = model.watch_generation;

    vec![task(async move {
        supervise(api, msg_tx, forward_cancel, subscribe_cancel, epoch, start_generation).await;
        None
    })]
}

async fn supervise(
    api: std::sync::Arc<dyn crate::infra::api::ApiClient>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    forward_cancel: CancellationToken,
    subscribe_cancel: CancellationToken,
    epoch: u64,
    start_generation: u64,
) {
    let mut generation = start_generation;
    let mut attempt: u32 = 0;
    loop {
        if subscribe_cancel.is_cancelled() {
            return;
        }
        let connect = tokio::select! {
            () = subscribe_cancel.cancelled() => return,
            result = api.watch_applications() => result,
        };
        match connect {
            Ok(stream) => {
                attempt = 0;
                // The generation advances only when a queue goes live, so
                // failure immediates below always stamp the generation the
                // model currently holds.
                generation += 1;
                let (queue_tx, queue) = watch_queue();
                if msg_tx
                    .send(Msg::WatchStarted {
                        queue,
                        epoch,
                        generation,
                    })
                    .is_err()
                {
                    return;
                }
                match forward(stream, &queue_tx, &forward_cancel, &subscribe_cancel).await {
                    ForwardEnd::Cancelled | ForwardEnd::QueueClosed | ForwardEnd::AuthSeen => {
                        return;
                    }
                    ForwardEnd::StreamEnded(reason) => {
                        debug!(%reason, "watch stream dropped, reconnecting");
                        let _ = msg_tx.send(Msg::WatchImmediate {
                            event: ImmediateEvent::StatusChange("Reconnecting…".to_string()),
                            epoch,
                            generation,
                        });
                    }
                }
            }
            Err(error) if error.is_auth() => {
                let _ = msg_tx.send(Msg::WatchImmediate {
                    event: ImmediateEvent::AuthError(error.to_string()),
                    epoch,
                    generation,
                });
                return;
            }
            Err(error) => {
                let _ = msg_tx.send(Msg::WatchImmediate {
                    event: ImmediateEvent::ApiError(error.to_string()),
                    epoch,
                    generation,
                });
            }
        }

        attempt = attempt.saturating_add(1);
        let delay = backoff_delay(attempt);
        tokio::select! {
            () = subscribe_cancel.cancelled() => return,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

enum ForwardEnd {
    Cancelled,
    QueueClosed,
    AuthSeen,
    StreamEnded(String),
}

async fn forward(
    stream: crate::infra::api::AppEventStream,
    queue_tx: &mpsc::Sender<WatchEvent>,
    forward_cancel: &CancellationToken,
    subscribe_cancel: &CancellationToken,
) -> ForwardEnd {
    let mut stream = stream;
    loop {
        let item = tokio::select! {
            () = forward_cancel.cancelled() => return ForwardEnd::Cancelled,
            () = subscribe_cancel.cancelled() => return ForwardEnd::Cancelled,
            item = stream.next() => item,
        };
        match item {
            None => return ForwardEnd::StreamEnded("stream closed".to_string()),
            Some(Err(error)) => return ForwardEnd::StreamEnded(error.to_string()),
            Some(Ok(event)) => {
                let auth = matches!(event, WatchEvent::AuthError(_));
                if !offer(queue_tx, event) {
                    return ForwardEnd::QueueClosed;
                }
                if auth {
                    return ForwardEnd::AuthSeen;
                }
            }
        }
    }
}

/// Follow-up pulling the next coalesced delivery from the queue.
///
/// Stamped with the epoch/generation pair current at dispatch; the
/// dispatcher drops the result if either moved on.
pub fn consume_watch_task(model: &Model) -> Task {
    let Some(queue) = model.watch_queue.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;
    let generation = model.watch_generation;

    task(async move {
        match consume(&queue).await {
            Consumed::Batch(batch) => Some(Msg::AppsBatchUpdate {
                batch,
                epoch,
                generation,
            }),
            Consumed::Immediate(event) => Some(Msg::WatchImmediate {
                event,
                epoch,
                generation,
            }),
            Consumed::Closed => Some(Msg::WatchClosed { epoch, generation }),
        }
    })
}

/// Handler for a live queue after (re)connection.
pub fn apply_watch_started(model: &mut Model, queue: crate::infra::watch::WatchQueue, generation: u64) -> Vec<Task> {
    model.watch_queue = Some(queue);
    model.watch_generation = generation;
    if generation > 1 {
        model.set_status(StatusLevel::Info, "Reconnected");
    }

    vec![consume_watch_task(model)]
}

/// Handler for one coalesced batch.
///
/// Updates apply in receipt order, deletes last. An attached immediate
/// event is re-dispatched as a fresh top-level message, and the consume
/// task is always re-armed while the epoch/generation pair still matches.
pub fn apply_batch(model: &mut Model, batch: AppsBatch) -> Vec<Task> {
    for app in batch.updates {
        model
            .tree
            .set_app_meta(&app.name, Some(app.health.label().to_string()), Some(app.sync.label().to_string()));
        model.upsert_app(app);
    }
    for name in batch.deletes {
        model.remove_app(&name);
    }
    model.clamp_selection();

    let mut follow_ups = Vec::new();
    if let Some(immediate) = batch.immediate {
        let epoch = model.epoch;
        let generation = model.watch_generation;
        follow_ups.push(task(async move {
            Some(Msg::WatchImmediate {
                event: immediate,
                epoch,
                generation,
            })
        }));
    }
    follow_ups.push(consume_watch_task(model));

    follow_ups
}

/// Handler for an out-of-batch event.
pub fn apply_immediate(model: &mut Model, event: ImmediateEvent) -> Vec<Task> {
    match event {
        ImmediateEvent::AuthError(error) => {
            info!(%error, "auth error from watch pipeline");
            // Stop the pipeline: forwarder first, then tree, then stream.
            if let Some(token) = model.watch_forward_cancel.take() {
                token.cancel();
            }
            if let Some(token) = model.tree_cancel.take() {
                token.cancel();
            }
            if let Some(token) = model.watch_subscribe_cancel.take() {
                token.cancel();
            }
            model.watch_queue = None;
            model.enter_mode(Mode::AuthRequired);
            model.set_status(StatusLevel::Error, error);
            Vec::new()
        }
        ImmediateEvent::StatusChange(text) => {
            model.set_status(StatusLevel::Info, text);
            vec![consume_watch_task(model)]
        }
        ImmediateEvent::ApiError(message) => {
            if model.mode == Mode::Loading {
                model.enter_mode(Mode::ConnectionError);
            }
            model.set_status(StatusLevel::Error, message);
            vec![consume_watch_task(model)]
        }
    }
}

/// Handler for a closed queue: the consume chain for this generation ends.
pub fn apply_watch_closed(model: &mut Model, generation: u64) -> Vec<Task> {
    if model.watch_generation == generation {
        model.watch_queue = None;
    }

    Vec::new()
}
