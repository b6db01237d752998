//! `:`-command parsing and dispatch.
//!
//! Commands are split on whitespace, aliases normalize to canonical
//! names, and arguments are validated against live suggestions: a proper
//! prefix of a suggestion is accepted implicitly on Enter, and navigation
//! commands require the resolved value to exist.

use std::collections::BTreeSet;

use crate::app::autocomplete::{ArgPolicy, CommandSpec};
use crate::app::msg::{ExternalRequest, Msg, Task, task};
use crate::app::{Model, StatusLevel, autocomplete, context, reconcile};
use crate::domain::app::{SortDirection, SortField, SortPreference};
use crate::domain::modals::{DeleteModal, SyncModal, UpgradeModal};
use crate::domain::mode::Mode;
use crate::domain::navigation::View;

/// Executes one committed command line.
pub fn execute(model: &mut Model, input: &str) -> Vec<Task> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        model.enter_mode(Mode::Normal);
        return Vec::new();
    }

    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };
    let Some(spec) = autocomplete::resolve(word) else {
        model.set_status(StatusLevel::Warn, format!("Unknown command: {word}"));
        return Vec::new();
    };

    match spec.takes_arg {
        ArgPolicy::None => dispatch(model, spec, None),
        ArgPolicy::Optional if rest.is_empty() => dispatch(model, spec, None),
        ArgPolicy::Required if rest.is_empty() => {
            model.set_status(
                StatusLevel::Warn,
                format!("{} requires an argument", spec.name),
            );
            Vec::new()
        }
        ArgPolicy::RequiredPair => dispatch_sort(model, rest),
        ArgPolicy::Optional | ArgPolicy::Required => {
            match resolve_argument(model, spec, rest) {
                Some(argument) => dispatch(model, spec, Some(argument)),
                None => {
                    model.set_status(
                        StatusLevel::Warn,
                        format!("Unknown {}: {rest}", spec.name),
                    );
                    Vec::new()
                }
            }
        }
    }
}

/// Validates an argument against live suggestions.
///
/// An exact (case-insensitive) match wins; otherwise the first
/// prefix-matched suggestion is accepted implicitly. Commands without the
/// exact-argument requirement pass free-form values through.
fn resolve_argument(model: &Model, spec: &CommandSpec, raw: &str) -> Option<String> {
    let values = autocomplete::source_values(spec.arg_source, model);
    let lowered = raw.to_lowercase();
    if let Some(exact) = values.iter().find(|v| v.to_lowercase() == lowered) {
        return Some(exact.clone());
    }
    if let Some(prefixed) = values.iter().find(|v| v.to_lowercase().starts_with(&lowered)) {
        return Some(prefixed.clone());
    }
    if spec.exact_arg {
        return None;
    }

    Some(raw.to_string())
}

fn dispatch(model: &mut Model, spec: &CommandSpec, argument: Option<String>) -> Vec<Task> {
    match spec.name {
        "cluster" => scope_command(model, View::Clusters, argument),
        "namespace" => scope_command(model, View::Namespaces, argument),
        "project" => scope_command(model, View::Projects, argument),
        "appset" => scope_command(model, View::ApplicationSets, argument),
        "app" => {
            model.enter_mode(Mode::Normal);
            model.navigation.go_to(View::Apps);
            if let Some(name) = argument {
                let position = model
                    .visible_apps()
                    .iter()
                    .position(|app| app.name == name);
                if let Some(position) = position {
                    model.navigation.selected_idx = position;
                }
            }
            Vec::new()
        }
        "resources" => {
            let Some(target) = argument.or_else(|| model.selected_app_name()) else {
                model.set_status(StatusLevel::Warn, "No application selected");
                return Vec::new();
            };
            model.enter_mode(Mode::Normal);
            reconcile::open_tree_view(model, target)
        }
        "diff" => {
            let Some(target) = argument.or_else(|| model.selected_app_name()) else {
                model.set_status(StatusLevel::Warn, "No application selected");
                return Vec::new();
            };
            model.diff = Some(crate::domain::diff::DiffState::loading_for(target.clone()));
            model.enter_mode(Mode::Loading);
            model.set_status(StatusLevel::Info, format!("Loading diff for {target}…"));
            vec![reconcile::diff_task(model, target)]
        }
        "sync" => {
            let target = argument.or_else(|| model.destructive_target());
            let Some(target) = target else {
                model.set_status(StatusLevel::Warn, "No application selected");
                return Vec::new();
            };
            model.modals.sync = Some(SyncModal::for_target(target));
            model.enter_mode(Mode::ConfirmSync);
            Vec::new()
        }
        "rollback" => {
            let Some(target) = argument.or_else(|| model.selected_app_name()) else {
                model.set_status(StatusLevel::Warn, "No application selected");
                return Vec::new();
            };
            reconcile::open_rollback(model, target)
        }
        "delete" => {
            let target = argument.or_else(|| model.destructive_target());
            let Some(target) = target else {
                model.set_status(StatusLevel::Warn, "No application selected");
                return Vec::new();
            };
            model.modals.delete = Some(DeleteModal::for_target(target));
            model.enter_mode(Mode::ConfirmAppDelete);
            Vec::new()
        }
        "context" => {
            let Some(name) = argument else {
                return Vec::new();
            };
            model.enter_mode(Mode::Normal);
            model.set_status(StatusLevel::Info, format!("Switching to context {name}…"));
            vec![context::resolve_context_task(model, Some(name))]
        }
        "theme" => match argument {
            Some(name) => {
                model.enter_mode(Mode::Normal);
                crate::ui::theme::apply_theme(model, &name)
            }
            None => {
                model.enter_mode(Mode::Theme);
                Vec::new()
            }
        },
        "help" => {
            model.enter_mode(Mode::Help);
            Vec::new()
        }
        "logs" => {
            model.enter_mode(Mode::Normal);
            let log_path = model.startup.log_path.clone();
            vec![task(async move {
                let content = tokio::fs::read_to_string(&log_path)
                    .await
                    .unwrap_or_else(|e| format!("cannot read {}: {e}", log_path.display()));
                Some(Msg::RunExternal(ExternalRequest::Pager {
                    title: "argonaut logs".to_string(),
                    content,
                }))
            })]
        }
        "k9s" => {
            model.enter_mode(Mode::Normal);
            let status_text = format!(
                " argonaut │ {} │ ctrl-c to exit ",
                model.context_name.as_deref().unwrap_or("k9s")
            );
            vec![task(async move {
                Some(Msg::RunExternal(ExternalRequest::Embedded {
                    command: crate::infra::embedded::embedded_command(),
                    status_text,
                }))
            })]
        }
        "upgrade" => {
            model.modals.upgrade = Some(UpgradeModal {
                loading: true,
                ..UpgradeModal::default()
            });
            model.enter_mode(Mode::UpgradeConfirm);
            let epoch = model.epoch;
            vec![task(async move {
                let latest_version = crate::infra::version::latest_release_tag().await;
                Some(Msg::UpgradeCheckCompleted {
                    latest_version,
                    epoch,
                })
            })]
        }
        "quit" => vec![task(async { Some(Msg::Quit) })],
        _ => Vec::new(),
    }
}

/// Scope commands: no argument jumps to the scope's view, an argument
/// replaces that scope (clearing deeper ones) and drills down.
fn scope_command(model: &mut Model, view: View, argument: Option<String>) -> Vec<Task> {
    model.enter_mode(Mode::Normal);
    let Some(value) = argument else {
        model.navigation.go_to(view);
        model.clamp_selection();
        return Vec::new();
    };

    let selections = &mut model.selections;
    let next_view = match view {
        View::Clusters => {
            selections.scope_clusters = BTreeSet::from([value]);
            selections.scope_namespaces.clear();
            selections.scope_projects.clear();
            selections.scope_application_sets.clear();
            View::Namespaces
        }
        View::Namespaces => {
            selections.scope_namespaces = BTreeSet::from([value]);
            selections.scope_projects.clear();
            selections.scope_application_sets.clear();
            View::Projects
        }
        View::Projects => {
            selections.scope_projects = BTreeSet::from([value]);
            View::Apps
        }
        View::ApplicationSets => {
            selections.scope_application_sets = BTreeSet::from([value]);
            View::Apps
        }
        View::Apps | View::Tree => View::Apps,
    };
    model.navigation.go_to(next_view);
    model.clamp_selection();

    Vec::new()
}

fn dispatch_sort(model: &mut Model, rest: &str) -> Vec<Task> {
    let mut parts = rest.split_whitespace();
    let (Some(field), Some(direction)) = (parts.next(), parts.next()) else {
        model.set_status(StatusLevel::Warn, "Usage: sort <name|sync|health> <asc|desc>");
        return Vec::new();
    };
    let (Ok(field), Ok(direction)) = (
        field.parse::<SortField>(),
        direction.parse::<SortDirection>(),
    ) else {
        model.set_status(StatusLevel::Warn, "Usage: sort <name|sync|health> <asc|desc>");
        return Vec::new();
    };

    let preference = SortPreference { field, direction };
    model.sort = preference;
    model.prefs.set_sort_preference(preference);
    let apps = std::mem::take(&mut model.apps);
    model.replace_apps(apps);
    model.enter_mode(Mode::Normal);
    model.set_status(
        StatusLevel::Info,
        format!("Sorted by {} {}", field.label(), direction.label()),
    );

    vec![persist_prefs_task(model)]
}

/// Persists current preferences off the loop.
pub fn persist_prefs_task(model: &Model) -> Task {
    let path = model.startup.prefs_path.clone();
    let prefs = model.prefs.clone();

    task(async move {
        let result =
            tokio::task::spawn_blocking(move || crate::infra::prefs::save(&path, &prefs)).await;
        if let Ok(Err(e)) = result {
            tracing::warn!(error = %e, "failed to persist preferences");
        }
        None
    })
}
