//! The exhaustive message dispatcher.
//!
//! One message in, zero or more follow-up tasks out. The epoch and
//! generation guards run once here, before any handler: a stale result
//! leaves the model untouched and emits nothing. Handlers never block;
//! anything that might is returned as a follow-up task.

use tracing::debug;

use crate::app::msg::{Msg, Task};
use crate::app::{Model, StatusLevel, command, context, reconcile, watch};
use crate::domain::mode::Mode;
use crate::domain::navigation::View;
use crate::infra::version::is_newer_than_current_version;

/// Dispatches one message to its handler.
pub fn update(model: &mut Model, msg: Msg) -> Vec<Task> {
    if let Some(epoch) = msg.epoch() {
        if epoch != model.epoch {
            debug!(epoch, current = model.epoch, "discarding stale message");
            return Vec::new();
        }
    }
    if let Some(generation) = msg.generation() {
        if generation != model.watch_generation {
            debug!(
                generation,
                current = model.watch_generation,
                "discarding stale watch message"
            );
            return Vec::new();
        }
    }

    match msg {
        Msg::Key(key) => crate::runtime::mode::handle_key(model, key),
        Msg::Resize(cols, rows) => {
            model.terminal_size = (cols, rows);
            model.ready = true;
            model.clamp_selection();
            Vec::new()
        }
        Msg::Tick => {
            if !model.in_pager {
                model.spinner_frame = model.spinner_frame.wrapping_add(1);
            }
            Vec::new()
        }
        // Quit and RunExternal are consumed by the runtime loop before
        // dispatch; reaching here is a no-op.
        Msg::Quit | Msg::RunExternal(_) => Vec::new(),

        Msg::AppsLoaded { apps, .. } => apply_apps_loaded(model, apps),
        Msg::AppsLoadFailed { error, .. } => apply_apps_load_failed(model, &error),

        Msg::WatchStarted {
            queue, generation, ..
        } => watch::apply_watch_started(model, queue, generation),
        Msg::AppsBatchUpdate { batch, .. } => watch::apply_batch(model, batch),
        Msg::WatchImmediate { event, .. } => watch::apply_immediate(model, event),
        Msg::WatchClosed { generation, .. } => watch::apply_watch_closed(model, generation),

        Msg::AuthValidated { result, .. } => context::apply_auth_validated(model, result),

        Msg::ResourceTreeLoaded {
            app_name, nodes, ..
        } => reconcile::apply_tree_loaded(model, &app_name, nodes),
        Msg::ResourceTreeFailed {
            app_name, error, ..
        } => {
            model.set_status(
                StatusLevel::Error,
                format!("Resource tree for {app_name}: {error}"),
            );
            Vec::new()
        }

        Msg::DiffLoaded {
            app_name, lines, ..
        } => reconcile::apply_diff_loaded(model, &app_name, lines),
        Msg::DiffFailed {
            app_name, error, ..
        } => {
            if let Some(diff) = &mut model.diff {
                diff.loading = false;
            }
            if model.mode == Mode::Loading {
                model.enter_mode(Mode::Normal);
            }
            model.set_status(StatusLevel::Error, format!("Diff for {app_name}: {error}"));
            Vec::new()
        }

        Msg::SyncCompleted {
            outcomes,
            watch_after,
            ..
        } => reconcile::apply_sync_completed(model, outcomes, watch_after),

        Msg::RollbackHistoryLoaded {
            app_name,
            rows,
            current_revision,
            ..
        } => reconcile::apply_rollback_history(model, &app_name, rows, current_revision),
        Msg::RollbackHistoryFailed {
            app_name, error, ..
        } => {
            if let Some(rollback) = &mut model.rollback {
                rollback.loading = false;
                rollback.error = Some(error.to_string());
            }
            model.set_status(
                StatusLevel::Error,
                format!("History for {app_name}: {error}"),
            );
            Vec::new()
        }
        Msg::RollbackMetaLoaded {
            app_name,
            id,
            author,
            date,
            message,
            ..
        } => {
            if let Some(rollback) = &mut model.rollback {
                if rollback.app_name == app_name {
                    rollback.apply_revision_meta(id, author, date, message);
                }
            }
            Vec::new()
        }
        Msg::RollbackMetaFailed {
            app_name, id, error, ..
        } => {
            if let Some(rollback) = &mut model.rollback {
                if rollback.app_name == app_name {
                    rollback.apply_revision_meta_error(id, error);
                }
            }
            Vec::new()
        }
        Msg::RollbackCompleted {
            app_name,
            result,
            watch_after,
            dry_run,
            ..
        } => reconcile::apply_rollback_completed(model, app_name, result, watch_after, dry_run),

        Msg::DeleteCompleted { outcomes, .. } => reconcile::apply_delete_completed(model, outcomes),

        Msg::ContextSwitchResolved {
            context_name,
            server,
            context_names,
            preferences,
        } => context::apply_context_switch(model, context_name, server, context_names, preferences),
        Msg::ContextSwitchRejected { reason, core } => {
            context::apply_context_rejected(model, reason, core)
        }

        Msg::UpgradeCheckCompleted { latest_version, .. } => {
            apply_upgrade_check(model, latest_version)
        }
        Msg::UpgradeFinished { result, .. } => apply_upgrade_finished(model, result),

        Msg::PauseRendering => {
            model.in_pager = true;
            Vec::new()
        }
        Msg::ResumeRendering => {
            model.in_pager = false;
            Vec::new()
        }
        Msg::ExternalFinished { result } => {
            model.in_pager = false;
            if let Some(diff) = &mut model.diff {
                diff.loading = false;
            }
            // The external viewer path enters through Loading mode.
            if model.mode == Mode::Loading {
                model.enter_mode(Mode::Normal);
            }
            if let Err(error) = result {
                model.set_status(StatusLevel::Error, error);
            }
            Vec::new()
        }
    }
}

fn apply_apps_loaded(model: &mut Model, apps: Vec<crate::domain::app::App>) -> Vec<Task> {
    let first_load = model.modals.initial_loading;
    model.replace_apps(apps);
    model.modals.initial_loading = false;
    if model.mode == Mode::Loading {
        model.enter_mode(Mode::Normal);
    }

    let mut follow_ups = Vec::new();
    if first_load {
        apply_default_view(model);
        follow_ups.extend(check_whats_new(model));
    }
    model.set_status(StatusLevel::Info, format!("Loaded {} app(s)", model.apps.len()));

    follow_ups
}

fn apply_apps_load_failed(model: &mut Model, error: &crate::errors::AppError) -> Vec<Task> {
    if error.is_auth() {
        model.enter_mode(Mode::AuthRequired);
    } else if error.is_connection() || model.modals.initial_loading {
        model.enter_mode(Mode::ConnectionError);
    }
    model.set_status(StatusLevel::Error, error.to_string());

    Vec::new()
}

/// Applies the persisted default view and scope once per context.
fn apply_default_view(model: &mut Model) {
    let Some(view_name) = model.prefs.default_view.clone() else {
        return;
    };
    let view = match view_name.as_str() {
        "clusters" => View::Clusters,
        "namespaces" => View::Namespaces,
        "projects" => View::Projects,
        "applicationsets" => View::ApplicationSets,
        "apps" => View::Apps,
        other => {
            model.modals.default_view_warning =
                Some(format!("Unknown default view: {other}"));
            return;
        }
    };
    if let Some(scope) = model.prefs.default_scope.clone() {
        let known = match view {
            View::Clusters => model.index.clusters.contains(&scope),
            View::Namespaces => model.index.namespaces.contains(&scope),
            View::Projects => model.index.projects.contains(&scope),
            View::ApplicationSets => model.index.application_sets.contains(&scope),
            View::Apps | View::Tree => true,
        };
        if known {
            match view {
                View::Clusters => {
                    model.selections.scope_clusters.insert(scope);
                }
                View::Namespaces => {
                    model.selections.scope_namespaces.insert(scope);
                }
                View::Projects => {
                    model.selections.scope_projects.insert(scope);
                }
                View::ApplicationSets => {
                    model.selections.scope_application_sets.insert(scope);
                }
                View::Apps | View::Tree => {}
            }
        } else {
            model.modals.default_view_warning = Some(format!(
                "Default scope {scope} no longer exists in this context"
            ));
        }
    }
    model.navigation.go_to(view);
    model.clamp_selection();
}

/// Arms the one-shot "what's new" banner after an upgrade.
fn check_whats_new(model: &mut Model) -> Vec<Task> {
    let current = env!("CARGO_PKG_VERSION");
    let seen = model.prefs.last_seen_version.clone();
    let newer = seen
        .as_deref()
        .is_none_or(|seen| is_newer_than_current_version(seen, current));
    if !newer || seen.is_none() {
        // First run: record the version quietly, no banner.
        if seen.is_none() {
            model.prefs.last_seen_version = Some(current.to_string());
            return vec![command::persist_prefs_task(model)];
        }
        return Vec::new();
    }
    model.modals.whats_new = Some(format!("argonaut {current}: see :help for what changed"));
    model.prefs.last_seen_version = Some(current.to_string());

    vec![command::persist_prefs_task(model)]
}

fn apply_upgrade_check(model: &mut Model, latest_version: Option<String>) -> Vec<Task> {
    let Some(upgrade) = &mut model.modals.upgrade else {
        return Vec::new();
    };
    upgrade.loading = false;
    match latest_version {
        None => {
            upgrade.error = Some("Could not reach the release feed".to_string());
            model.enter_mode(Mode::UpgradeError);
        }
        Some(latest) => {
            if is_newer_than_current_version(env!("CARGO_PKG_VERSION"), &latest) {
                upgrade.latest_version = latest;
            } else {
                model.enter_mode(Mode::Normal);
                model.set_status(StatusLevel::Info, "Already up to date");
            }
        }
    }

    Vec::new()
}

fn apply_upgrade_finished(model: &mut Model, result: Result<String, String>) -> Vec<Task> {
    let modal = model.modals.upgrade.get_or_insert_default();
    modal.loading = false;
    match result {
        Ok(changelog) => {
            modal.changelog = Some(changelog);
            model.enter_mode(Mode::UpgradeSuccess);
        }
        Err(error) => {
            modal.error = Some(error);
            model.enter_mode(Mode::UpgradeError);
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::app::App;
    use crate::errors::AppError;

    #[test]
    fn test_stale_epoch_message_leaves_model_untouched() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.epoch = 5;

        // Act
        let follow_ups = update(
            &mut model,
            Msg::AppsLoaded {
                apps: vec![App::named("stale")],
                epoch: 3,
            },
        );

        // Assert
        assert!(follow_ups.is_empty());
        assert!(model.apps.is_empty());
    }

    #[test]
    fn test_stale_generation_batch_is_discarded() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.epoch = 1;
        model.watch_generation = 4;
        model.replace_apps(vec![App::named("keep")]);

        // Act
        let follow_ups = update(
            &mut model,
            Msg::AppsBatchUpdate {
                batch: crate::infra::watch::AppsBatch {
                    updates: Vec::new(),
                    deletes: vec!["keep".to_string()],
                    immediate: None,
                },
                epoch: 1,
                generation: 3,
            },
        );

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.apps.len(), 1);
    }

    #[test]
    fn test_apps_loaded_replaces_list_and_leaves_loading() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.epoch = 1;
        model.mode = Mode::Loading;
        model.modals.initial_loading = true;

        // Act
        let _ = update(
            &mut model,
            Msg::AppsLoaded {
                apps: vec![App::named("web")],
                epoch: 1,
            },
        );

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(!model.modals.initial_loading);
        assert_eq!(model.apps.len(), 1);
    }

    #[test]
    fn test_default_view_warning_when_scope_vanished() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.epoch = 1;
        model.modals.initial_loading = true;
        model.prefs.default_view = Some("clusters".to_string());
        model.prefs.default_scope = Some("retired-cluster".to_string());

        // Act
        let _ = update(
            &mut model,
            Msg::AppsLoaded {
                apps: vec![App::named("web")],
                epoch: 1,
            },
        );

        // Assert
        assert_eq!(model.navigation.view, View::Clusters);
        assert!(
            model
                .modals
                .default_view_warning
                .as_deref()
                .is_some_and(|w| w.contains("retired-cluster"))
        );
    }

    #[test]
    fn test_initial_load_failure_enters_connection_error() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.epoch = 1;
        model.modals.initial_loading = true;
        model.mode = Mode::Loading;

        // Act
        let _ = update(
            &mut model,
            Msg::AppsLoadFailed {
                error: AppError::Connection("refused".to_string()),
                epoch: 1,
            },
        );

        // Assert
        assert_eq!(model.mode, Mode::ConnectionError);
    }

    #[test]
    fn test_resize_updates_terminal_and_marks_ready() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.ready = false;

        // Act
        let _ = update(&mut model, Msg::Resize(120, 40));

        // Assert
        assert_eq!(model.terminal_size, (120, 40));
        assert!(model.ready);
    }

    #[test]
    fn test_tick_freezes_spinner_while_in_pager() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.in_pager = true;
        let before = model.spinner_frame;

        // Act
        let _ = update(&mut model, Msg::Tick);

        // Assert
        assert_eq!(model.spinner_frame, before);
    }

    #[test]
    fn test_upgrade_check_up_to_date_returns_to_normal() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.epoch = 1;
        model.mode = Mode::UpgradeConfirm;
        model.modals.upgrade = Some(crate::domain::modals::UpgradeModal {
            loading: true,
            ..Default::default()
        });

        // Act
        let _ = update(
            &mut model,
            Msg::UpgradeCheckCompleted {
                latest_version: Some(env!("CARGO_PKG_VERSION").to_string()),
                epoch: 1,
            },
        );

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert_eq!(
            model.status.current().map(|s| s.text.as_str()),
            Some("Already up to date")
        );
    }

    #[test]
    fn test_upgrade_finished_error_enters_upgrade_error() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.epoch = 1;
        model.mode = Mode::UpgradeConfirm;

        // Act
        let _ = update(
            &mut model,
            Msg::UpgradeFinished {
                result: Err("download failed".to_string()),
                epoch: 1,
            },
        );

        // Assert
        assert_eq!(model.mode, Mode::UpgradeError);
        assert_eq!(
            model
                .modals
                .upgrade
                .as_ref()
                .and_then(|u| u.error.as_deref()),
            Some("download failed")
        );
    }
}
