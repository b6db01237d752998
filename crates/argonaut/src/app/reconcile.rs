//! Reconcilers: diff, sync, rollback, and delete requests plus the tree
//! loaders.
//!
//! Each builder captures the epoch (and a request id for the logs) at
//! dispatch and resolves to exactly one result message. No retries happen
//! here; the operator retries, and the HTTP client only retries idempotent
//! transport failures internally.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app::msg::{ExternalRequest, Msg, TargetOutcome, Task, task};
use crate::app::{Model, StatusLevel};
use crate::domain::diff::DiffState;
use crate::domain::mode::Mode;
use crate::domain::navigation::View;
use crate::domain::rollback::{RollbackPhase, RollbackState};
use crate::errors::AppError;
use crate::infra::api::{DeleteOptions, RollbackOptions, SyncOptions};
use crate::infra::diff;
use crate::infra::watch::TREE_STREAM_CAPACITY;

/// Number of history rows whose revision metadata is preloaded.
const ROLLBACK_META_PRELOAD: usize = 10;

// ---------------------------------------------------------------------------
// Diff

/// Loads manifests, formats the diff, and either opens the inline viewer
/// or hands off to the configured external viewer.
pub fn diff_task(model: &Model, app_name: String) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;
    let request_id = Uuid::new_v4().to_string();

    task(async move {
        debug!(app = %app_name, %request_id, "loading diff");
        let manifests = match api.get_managed_manifests(app_name.clone()).await {
            Ok(manifests) => manifests,
            Err(error) => {
                return Some(Msg::DiffFailed {
                    app_name,
                    error,
                    epoch,
                    request_id,
                });
            }
        };

        if let Ok(viewer) = std::env::var(diff::DIFF_VIEWER_ENV) {
            let (left, right) =
                match diff::write_manifest_files(&manifests.live, &manifests.desired) {
                    Ok(paths) => paths,
                    Err(e) => {
                        return Some(Msg::DiffFailed {
                            app_name,
                            error: AppError::Fatal(format!("write manifests: {e}")),
                            epoch,
                            request_id,
                        });
                    }
                };
            return Some(Msg::RunExternal(ExternalRequest::Viewer {
                command: viewer,
                left,
                right,
            }));
        }

        let lines = match std::env::var(diff::DIFF_FORMATTER_ENV) {
            Ok(formatter) => {
                let (left, right) =
                    match diff::write_manifest_files(&manifests.live, &manifests.desired) {
                        Ok(paths) => paths,
                        Err(e) => {
                            return Some(Msg::DiffFailed {
                                app_name,
                                error: AppError::Fatal(format!("write manifests: {e}")),
                                epoch,
                                request_id,
                            });
                        }
                    };
                let result = diff::external_diff(&formatter, &left, &right).await;
                let _ = std::fs::remove_file(&left);
                let _ = std::fs::remove_file(&right);
                match result {
                    Ok(lines) => lines,
                    Err(message) => {
                        return Some(Msg::DiffFailed {
                            app_name,
                            error: AppError::Api(message),
                            epoch,
                            request_id,
                        });
                    }
                }
            }
            Err(_) => diff::unified_diff(&manifests.live, &manifests.desired),
        };

        Some(Msg::DiffLoaded {
            app_name,
            lines,
            epoch,
            request_id,
        })
    })
}

/// Handler for a loaded diff: empty means no drift.
pub fn apply_diff_loaded(model: &mut Model, app_name: &str, lines: Vec<String>) -> Vec<Task> {
    if lines.is_empty() {
        model.set_status(StatusLevel::Info, "No differences");
        model.diff = Some(DiffState {
            title: app_name.to_string(),
            ..DiffState::default()
        });
        model.enter_mode(Mode::NoDiff);
        return Vec::new();
    }
    model.diff = Some(DiffState {
        title: app_name.to_string(),
        content: lines,
        ..DiffState::default()
    });
    model.enter_mode(Mode::Diff);

    Vec::new()
}

// ---------------------------------------------------------------------------
// Sync

/// Runs sync calls for the targets in sequence.
pub fn sync_task(model: &Model, targets: Vec<String>, prune: bool, watch_after: bool) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;
    let request_id = Uuid::new_v4().to_string();

    task(async move {
        let mut outcomes = Vec::with_capacity(targets.len());
        for app_name in targets {
            let result = api
                .sync(app_name.clone(), SyncOptions { prune })
                .await
                .map_err(|e| e.to_string());
            outcomes.push(TargetOutcome { app_name, result });
        }

        Some(Msg::SyncCompleted {
            outcomes,
            watch_after,
            epoch,
            request_id,
        })
    })
}

/// Handler for finished sync calls.
pub fn apply_sync_completed(
    model: &mut Model,
    outcomes: Vec<TargetOutcome>,
    watch_after: bool,
) -> Vec<Task> {
    let failures: Vec<&TargetOutcome> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    if !failures.is_empty() {
        let summary = failures
            .iter()
            .map(|o| o.app_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        model.enter_mode(Mode::Normal);
        model.set_status(
            StatusLevel::Error,
            format!("Sync failed for {summary}"),
        );
        return Vec::new();
    }

    if watch_after {
        if let Some(first) = outcomes.first().map(|o| o.app_name.clone()) {
            model.enter_mode(Mode::Normal);
            return open_tree_view(model, first);
        }
    }
    model.enter_mode(Mode::Normal);
    model.set_status(
        StatusLevel::Info,
        format!("Synced {} app(s)", outcomes.len()),
    );

    Vec::new()
}

// ---------------------------------------------------------------------------
// Rollback

/// Loads deployment history for the rollback overlay.
pub fn rollback_history_task(model: &Model, app_name: String) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;

    task(async move {
        match api.get_deployment_history(app_name.clone()).await {
            Ok(history) => Some(Msg::RollbackHistoryLoaded {
                app_name,
                rows: history.rows,
                current_revision: history.current_revision,
                epoch,
            }),
            Err(error) => Some(Msg::RollbackHistoryFailed {
                app_name,
                error,
                epoch,
            }),
        }
    })
}

/// Handler for loaded history: fill the overlay and preload metadata for
/// the first rows.
pub fn apply_rollback_history(
    model: &mut Model,
    app_name: &str,
    rows: Vec<crate::domain::rollback::RollbackRow>,
    current_revision: Option<String>,
) -> Vec<Task> {
    let Some(rollback) = &mut model.rollback else {
        return Vec::new();
    };
    if rollback.app_name != app_name {
        return Vec::new();
    }
    rollback.loading = false;
    rollback.current_revision = current_revision;
    rollback.rows = rows;

    let preload: Vec<(i64, String)> = rollback
        .rows
        .iter()
        .take(ROLLBACK_META_PRELOAD)
        .filter(|row| !row.revision.is_empty())
        .map(|row| (row.id, row.revision.clone()))
        .collect();

    preload
        .into_iter()
        .map(|(id, revision)| rollback_meta_task(model, app_name.to_string(), id, revision))
        .collect()
}

/// Loads commit metadata for one history row.
pub fn rollback_meta_task(model: &Model, app_name: String, id: i64, revision: String) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;

    task(async move {
        match api.get_revision_metadata(app_name.clone(), revision).await {
            Ok(meta) => Some(Msg::RollbackMetaLoaded {
                app_name,
                id,
                author: meta.author,
                date: meta.date,
                message: meta.message,
                epoch,
            }),
            Err(error) => Some(Msg::RollbackMetaFailed {
                app_name,
                id,
                error: error.to_string(),
                epoch,
            }),
        }
    })
}

/// Executes the confirmed rollback.
pub fn rollback_task(
    model: &Model,
    app_name: String,
    id: i64,
    options: RollbackOptions,
    watch_after: bool,
) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;
    let request_id = Uuid::new_v4().to_string();
    let dry_run = options.dry_run;

    task(async move {
        let result = api
            .rollback(app_name.clone(), id, options)
            .await
            .map_err(|e| e.to_string());

        Some(Msg::RollbackCompleted {
            app_name,
            result,
            watch_after,
            dry_run,
            epoch,
            request_id,
        })
    })
}

/// Handler for the rollback result.
pub fn apply_rollback_completed(
    model: &mut Model,
    app_name: String,
    result: Result<(), String>,
    watch_after: bool,
    dry_run: bool,
) -> Vec<Task> {
    match result {
        Ok(()) => {
            if dry_run {
                // Keep the overlay open so the operator can run it for real.
                if let Some(rollback) = &mut model.rollback {
                    rollback.phase = RollbackPhase::List;
                }
                model.set_status(StatusLevel::Info, format!("Dry run complete for {app_name}"));
                return Vec::new();
            }
            model.enter_mode(Mode::Normal);
            if watch_after {
                return open_tree_view(model, app_name);
            }
            model.set_status(StatusLevel::Info, format!("Rolled back {app_name}"));
            Vec::new()
        }
        Err(error) => {
            if let Some(rollback) = &mut model.rollback {
                rollback.error = Some(error.clone());
                rollback.phase = RollbackPhase::List;
            }
            model.set_status(StatusLevel::Error, format!("Rollback failed: {error}"));
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Delete

/// Deletes the targets in sequence, collecting per-app outcomes.
pub fn delete_task(
    model: &Model,
    targets: Vec<String>,
    cascade: bool,
    propagation: String,
) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;
    let request_id = Uuid::new_v4().to_string();

    task(async move {
        let mut outcomes = Vec::with_capacity(targets.len());
        for app_name in targets {
            let result = api
                .delete_application(
                    app_name.clone(),
                    DeleteOptions {
                        cascade,
                        propagation: propagation.clone(),
                    },
                )
                .await
                .map_err(|e| e.to_string());
            outcomes.push(TargetOutcome { app_name, result });
        }

        Some(Msg::DeleteCompleted {
            outcomes,
            epoch,
            request_id,
        })
    })
}

/// Handler for finished deletes: partial failure is reported per app.
pub fn apply_delete_completed(model: &mut Model, outcomes: Vec<TargetOutcome>) -> Vec<Task> {
    let mut failed = Vec::new();
    let mut deleted = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => deleted += 1,
            Err(error) => {
                warn!(app = %outcome.app_name, %error, "delete failed");
                failed.push(outcome.app_name.clone());
            }
        }
    }
    model.selections.selected_apps.clear();
    model.enter_mode(Mode::Normal);
    if failed.is_empty() {
        model.set_status(StatusLevel::Info, format!("Deleted {deleted} app(s)"));
    } else {
        model.set_status(
            StatusLevel::Error,
            format!("Deleted {deleted}, failed: {}", failed.join(", ")),
        );
    }

    Vec::new()
}

// ---------------------------------------------------------------------------
// Resource tree

/// Switches to the tree view for `app_name`, loading and then streaming
/// its resource forest.
pub fn open_tree_view(model: &mut Model, app_name: String) -> Vec<Task> {
    // Restart the stream when retargeting.
    if let Some(token) = model.tree_cancel.take() {
        token.cancel();
    }
    model.tree.clear();
    model.tree_app = Some(app_name.clone());
    model.navigation.go_to(View::Tree);

    let mut follow_ups = vec![load_tree_task(model, app_name.clone())];
    follow_ups.extend(start_tree_watch(model, app_name));

    follow_ups
}

/// One-shot resource forest fetch.
pub fn load_tree_task(model: &Model, app_name: String) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;

    task(async move {
        match api.get_resource_tree(app_name.clone()).await {
            Ok(nodes) => Some(Msg::ResourceTreeLoaded {
                app_name,
                nodes,
                epoch,
            }),
            Err(error) => Some(Msg::ResourceTreeFailed {
                app_name,
                error,
                epoch,
            }),
        }
    })
}

/// Streams forest snapshots through a bounded hop into the loop.
pub fn start_tree_watch(model: &mut Model, app_name: String) -> Vec<Task> {
    let Some(api) = model.api.clone() else {
        return Vec::new();
    };
    let cancel = CancellationToken::new();
    model.tree_cancel = Some(cancel.clone());
    let msg_tx = model.msg_tx.clone();
    let epoch = model.epoch;

    vec![task(async move {
        let stream = tokio::select! {
            () = cancel.cancelled() => return None,
            result = api.watch_resource_tree(app_name.clone()) => result,
        };
        let mut stream = match stream {
            Ok(stream) => stream,
            Err(error) => {
                return Some(Msg::ResourceTreeFailed {
                    app_name,
                    error,
                    epoch,
                });
            }
        };

        // Bounded hop: a slow loop drops snapshots instead of blocking the
        // reader; only the newest forest matters.
        let (hop_tx, mut hop_rx) =
            tokio::sync::mpsc::channel::<Vec<crate::domain::tree::ResourceNode>>(
                TREE_STREAM_CAPACITY,
            );
        let reader_cancel = cancel.clone();
        let reader_app = app_name.clone();
        tokio::spawn(async move {
            loop {
                let item = tokio::select! {
                    () = reader_cancel.cancelled() => return,
                    item = stream.next() => item,
                };
                match item {
                    Some(Ok(nodes)) => {
                        if let Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) =
                            hop_tx.try_send(nodes)
                        {
                            return;
                        }
                    }
                    Some(Err(error)) => {
                        debug!(app = %reader_app, %error, "tree stream error");
                    }
                    None => return,
                }
            }
        });

        loop {
            let nodes = tokio::select! {
                () = cancel.cancelled() => return None,
                nodes = hop_rx.recv() => nodes,
            };
            let Some(nodes) = nodes else {
                return None;
            };
            if msg_tx
                .send(Msg::ResourceTreeLoaded {
                    app_name: app_name.clone(),
                    nodes,
                    epoch,
                })
                .is_err()
            {
                return None;
            }
        }
    })]
}

/// Handler for a fresh forest snapshot.
///
/// Snapshots for an app the view no longer targets are dropped; the
/// stream that produced them is already cancelled.
pub fn apply_tree_loaded(
    model: &mut Model,
    app_name: &str,
    nodes: Vec<crate::domain::tree::ResourceNode>,
) -> Vec<Task> {
    if model.tree_app.as_deref() != Some(app_name) {
        return Vec::new();
    }
    model.tree.upsert_app_tree(app_name, nodes);
    if let Some(app) = model.apps.iter().find(|a| a.name == app_name) {
        model.tree.set_app_meta(
            app_name,
            Some(app.health.label().to_string()),
            Some(app.sync.label().to_string()),
        );
    }
    model.clamp_selection();

    Vec::new()
}

// ---------------------------------------------------------------------------
// Confirmation gates

/// Dispatches the confirmed sync modal.
pub fn confirm_sync(model: &mut Model) -> Vec<Task> {
    let Some(modal) = model.modals.sync.clone() else {
        return Vec::new();
    };
    let targets = model.resolve_target(&modal.target);
    if targets.is_empty() {
        model.enter_mode(Mode::Normal);
        model.set_status(StatusLevel::Warn, "Nothing to sync");
        return Vec::new();
    }
    model.set_status(StatusLevel::Info, format!("Syncing {} app(s)…", targets.len()));

    vec![sync_task(model, targets, modal.prune, modal.watch)]
}

/// Dispatches the confirmed delete modal after its `y` gate passed.
pub fn confirm_delete(model: &mut Model) -> Vec<Task> {
    let Some(modal) = model.modals.delete.clone() else {
        return Vec::new();
    };
    let targets = model.resolve_target(&modal.target);
    if targets.is_empty() {
        model.enter_mode(Mode::Normal);
        model.set_status(StatusLevel::Warn, "Nothing to delete");
        return Vec::new();
    }
    model.set_status(
        StatusLevel::Info,
        format!("Deleting {} app(s)…", targets.len()),
    );

    vec![delete_task(
        model,
        targets,
        modal.cascade,
        modal.propagation.label().to_string(),
    )]
}

/// Dispatches the confirmed rollback.
pub fn confirm_rollback(model: &mut Model) -> Vec<Task> {
    let Some(rollback) = &model.rollback else {
        return Vec::new();
    };
    let Some(row) = rollback.selected_row() else {
        return Vec::new();
    };
    let app_name = rollback.app_name.clone();
    let options = RollbackOptions {
        prune: rollback.prune,
        dry_run: rollback.dry_run,
    };
    let watch_after = rollback.watch;
    let id = row.id;
    model.set_status(StatusLevel::Info, format!("Rolling back {app_name}…"));

    vec![rollback_task(model, app_name, id, options, watch_after)]
}

/// Opens the rollback overlay for the app under the cursor.
pub fn open_rollback(model: &mut Model, app_name: String) -> Vec<Task> {
    model.rollback = Some(RollbackState::loading_for(app_name.clone()));
    model.enter_mode(Mode::Rollback);

    vec![rollback_history_task(model, app_name)]
}
