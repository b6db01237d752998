//! Context switching and the epoch guard.
//!
//! A context switch replaces the per-server world atomically from the
//! loop's point of view. Teardown order is load-bearing: the forwarder
//! stops first (closing the internal queue), then tree watchers, then the
//! upstream subscription. Every asynchronous result carries the epoch in
//! force when its task started; the dispatcher discards mismatches.

use std::sync::Arc;

use tracing::info;

use crate::app::msg::{Msg, Task, task};
use crate::app::{Model, StatusLevel, watch};
use crate::domain::app::AppIndex;
use crate::domain::mode::Mode;
use crate::domain::navigation::Navigation;
use crate::domain::selection::Selections;
use crate::domain::server::Server;
use crate::domain::tree::TreeModel;
use crate::errors::AppError;
use crate::infra::api::{ApiClient, ArgoClient};
use crate::infra::prefs::Preferences;
use crate::infra::{argocd_config, prefs};

/// Resolves a context (named, or the config default) into a switch message.
///
/// Config reads happen here, off the loop, and only at startup or on an
/// explicit switch.
pub fn resolve_context_task(model: &Model, name: Option<String>) -> Task {
    let config_path = model.startup.config_path.clone();
    let prefs_path = model.startup.prefs_path.clone();

    task(async move {
        let loaded = tokio::task::spawn_blocking(move || {
            let config = argocd_config::load(&config_path)?;
            let preferences = prefs::load(&prefs_path);
            Ok::<_, AppError>((config, preferences))
        })
        .await;
        let (config, preferences) = match loaded {
            Ok(Ok(pair)) => pair,
            Ok(Err(error)) => {
                return Some(Msg::ContextSwitchRejected {
                    reason: error.to_string(),
                    core: false,
                });
            }
            Err(join_error) => {
                return Some(Msg::ContextSwitchRejected {
                    reason: join_error.to_string(),
                    core: false,
                });
            }
        };

        let context = match &name {
            Some(name) => config.context(name),
            None => config.default_context(),
        };
        let Some(context) = context else {
            let reason = name.map_or_else(
                || "no contexts configured".to_string(),
                |name| format!("unknown context: {name}"),
            );
            return Some(Msg::ContextSwitchRejected {
                reason,
                core: false,
            });
        };
        if !context.drivable() {
            let kind = if context.core { "core" } else { "port-forward" };
            return Some(Msg::ContextSwitchRejected {
                reason: format!("context {} runs in {kind} mode", context.name),
                core: context.core,
            });
        }

        Some(Msg::ContextSwitchResolved {
            context_name: context.name.clone(),
            server: context.server.clone(),
            context_names: config.context_names(),
            preferences,
        })
    })
}

/// Applies a resolved context switch: teardown, rebuild, epoch bump, and
/// fresh loading kick-off.
pub fn apply_context_switch(
    model: &mut Model,
    context_name: String,
    server: Server,
    context_names: Vec<String>,
    preferences: Preferences,
) -> Vec<Task> {
    // Teardown order matters: forwarder, tree watchers, subscription.
    if let Some(token) = model.watch_forward_cancel.take() {
        token.cancel();
    }
    if let Some(token) = model.tree_cancel.take() {
        token.cancel();
    }
    if let Some(token) = model.watch_subscribe_cancel.take() {
        token.cancel();
    }

    let epoch = model.epoch + 1;
    info!(context = %context_name, epoch, "switching context");

    let api: Option<Arc<dyn ApiClient>> = match ArgoClient::new(&server, &model.startup.tls) {
        Ok(client) => Some(Arc::new(client)),
        Err(error) => {
            model.modals.error_message = Some(error.to_string());
            model.enter_mode(Mode::Error);
            return Vec::new();
        }
    };

    let sort = preferences.sort_preference();
    let theme_name = model
        .startup
        .theme_override
        .clone()
        .or_else(|| preferences.theme.clone())
        .unwrap_or_else(|| model.theme_name.clone());

    *model = Model {
        // The carry-over whitelist: startup config, terminal size, ready
        // flag, context names, and the loop sender. Everything else is
        // rebuilt fresh.
        startup: model.startup.clone(),
        terminal_size: model.terminal_size,
        ready: model.ready,
        context_names,
        msg_tx: model.msg_tx.clone(),

        context_name: Some(context_name),
        server: Some(server),
        api,
        epoch,
        watch_generation: 0,
        watch_queue: None,
        watch_forward_cancel: None,
        watch_subscribe_cancel: None,
        tree_cancel: None,
        apps: Vec::new(),
        index: AppIndex::default(),
        selections: Selections::default(),
        navigation: Navigation::default(),
        mode: Mode::Loading,
        modals: crate::domain::modals::Modals::default(),
        diff: None,
        rollback: None,
        tree: TreeModel::default(),
        tree_app: None,
        search_query: String::new(),
        command_input: String::new(),
        status: crate::app::StatusService::default(),
        prefs: preferences,
        sort,
        theme_name,
        in_pager: false,
        spinner_frame: 0,
    };
    model.modals.initial_loading = true;

    vec![validate_auth_task(model)]
}

/// Follow-up validating the token for the current epoch.
fn validate_auth_task(model: &Model) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;

    task(async move {
        let result = api.get_user_info().await;
        Some(Msg::AuthValidated { result, epoch })
    })
}

/// Handler for the auth validation result.
pub fn apply_auth_validated(model: &mut Model, result: Result<(), AppError>) -> Vec<Task> {
    match result {
        Ok(()) => {
            model.enter_mode(Mode::Loading);
            let mut follow_ups = vec![load_apps_task(model)];
            follow_ups.extend(watch::start_watch_pipeline(model));

            follow_ups
        }
        Err(error) if error.is_auth() => {
            model.enter_mode(Mode::AuthRequired);
            model.set_status(StatusLevel::Error, error.to_string());
            Vec::new()
        }
        Err(error) if error.is_connection() => {
            model.enter_mode(Mode::ConnectionError);
            model.set_status(StatusLevel::Error, error.to_string());
            Vec::new()
        }
        Err(error) => {
            model.modals.error_message = Some(error.to_string());
            model.enter_mode(Mode::Error);
            Vec::new()
        }
    }
}

/// Follow-up loading the full app list for the current epoch.
pub fn load_apps_task(model: &Model) -> Task {
    let Some(api) = model.api.clone() else {
        return task(async { None });
    };
    let epoch = model.epoch;

    task(async move {
        match api.list_applications().await {
            Ok(apps) => Some(Msg::AppsLoaded { apps, epoch }),
            Err(error) => Some(Msg::AppsLoadFailed { error, epoch }),
        }
    })
}

/// Handler for a context-switch rejection.
pub fn apply_context_rejected(model: &mut Model, reason: String, core: bool) -> Vec<Task> {
    if core && model.server.is_none() {
        // Nothing loaded yet; the dedicated mode explains the situation.
        model.enter_mode(Mode::CoreDetected);
        model.modals.error_message = Some(reason);
    } else {
        model.set_status(StatusLevel::Warn, reason);
        if model.mode == Mode::Loading {
            model.enter_mode(Mode::Normal);
        }
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::app::App;

    #[test]
    fn test_context_switch_preserves_only_the_whitelist() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.epoch = 3;
        model.terminal_size = (80, 24);
        model.replace_apps(vec![App::named("x")]);
        model.search_query = "foo".to_string();
        let old_forward = CancellationToken::new();
        model.watch_forward_cancel = Some(old_forward.clone());

        // Act
        let _ = apply_context_switch(
            &mut model,
            "new".to_string(),
            Server::new("argocd.new.example.com"),
            vec!["a".to_string(), "b".to_string()],
            Preferences::default(),
        );

        // Assert: carried fields
        assert_eq!(model.terminal_size, (80, 24));
        assert!(model.ready);
        assert_eq!(model.context_names, vec!["a".to_string(), "b".to_string()]);
        // Assert: rebuilt fields
        assert_eq!(model.epoch, 4);
        assert!(model.apps.is_empty());
        assert!(model.watch_queue.is_none());
        assert!(model.watch_forward_cancel.is_none());
        assert!(model.search_query.is_empty());
        assert_eq!(model.context_name.as_deref(), Some("new"));
        assert_eq!(
            model.server.as_ref().map(|s| s.base_url.as_str()),
            Some("argocd.new.example.com")
        );
        assert_eq!(model.mode, Mode::Loading);
        assert!(model.modals.initial_loading);
        // Assert: the old forwarder was cancelled during teardown
        assert!(old_forward.is_cancelled());
    }

    #[test]
    fn test_auth_failure_enters_auth_required_mode() {
        // Arrange
        let (mut model, _rx) = test_model();

        // Act
        let follow_ups = apply_auth_validated(
            &mut model,
            Err(AppError::AuthRequired("token expired".to_string())),
        );

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.mode, Mode::AuthRequired);
        assert!(model.status.current().is_some());
    }

    #[test]
    fn test_connection_failure_enters_connection_error_mode() {
        // Arrange
        let (mut model, _rx) = test_model();

        // Act
        let follow_ups = apply_auth_validated(
            &mut model,
            Err(AppError::Connection("refused".to_string())),
        );

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.mode, Mode::ConnectionError);
    }

    #[test]
    fn test_core_rejection_before_first_server_enters_core_detected() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.server = None;

        // Act
        let _ = apply_context_rejected(&mut model, "core mode".to_string(), true);

        // Assert
        assert_eq!(model.mode, Mode::CoreDetected);
    }

    #[test]
    fn test_rejection_with_live_server_is_a_status_only() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.server = Some(Server::new("argocd.example.com"));

        // Act
        let _ = apply_context_rejected(&mut model, "unknown context: nope".to_string(), false);

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.status.current().is_some());
    }
}
