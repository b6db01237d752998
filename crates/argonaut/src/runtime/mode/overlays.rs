//! Key handling for the informational overlays: help, loading, and the
//! error family (auth, connection, fatal, core-detected).

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::msg::{ExternalRequest, Msg, Task, task};
use crate::app::{Model, context};
use crate::domain::mode::Mode;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match model.mode {
        Mode::Help => {
            // Dismiss on any key.
            model.enter_mode(Mode::Normal);
            Vec::new()
        }
        Mode::Loading => Vec::new(),
        Mode::AuthRequired => handle_auth_required(model, key),
        Mode::ConnectionError => handle_connection_error(model, key),
        Mode::Error => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                if model.server.is_some() {
                    model.enter_mode(Mode::Normal);
                    Vec::new()
                } else {
                    vec![task(async { Some(Msg::Quit) })]
                }
            }
            _ => Vec::new(),
        },
        Mode::CoreDetected => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                vec![task(async { Some(Msg::Quit) })]
            }
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn handle_auth_required(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match key.code {
        // Retry validation after the operator refreshed the token.
        KeyCode::Char('r') => {
            model.enter_mode(Mode::Loading);
            vec![context::resolve_context_task(
                model,
                model.context_name.clone(),
            )]
        }
        KeyCode::Char('l') => view_logs(model),
        KeyCode::Char('q') | KeyCode::Esc => vec![task(async { Some(Msg::Quit) })],
        _ => Vec::new(),
    }
}

fn handle_connection_error(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match key.code {
        KeyCode::Char('r') => {
            model.enter_mode(Mode::Loading);
            vec![context::resolve_context_task(
                model,
                model.context_name.clone(),
            )]
        }
        KeyCode::Char('l') => view_logs(model),
        KeyCode::Char('q') | KeyCode::Esc => vec![task(async { Some(Msg::Quit) })],
        _ => Vec::new(),
    }
}

fn view_logs(model: &Model) -> Vec<Task> {
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

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::server::Server;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_help_dismisses_on_any_key() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::Help;

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('x')));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
    }

    #[test]
    fn test_auth_required_r_retries_validation() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::AuthRequired;
        model.context_name = Some("prod".to_string());

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Char('r')));

        // Assert
        assert_eq!(follow_ups.len(), 1);
        assert_eq!(model.mode, Mode::Loading);
    }

    #[test]
    fn test_error_with_live_server_dismisses_to_normal() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::Error;
        model.server = Some(Server::new("argocd.example.com"));
        model.modals.error_message = Some("boom".to_string());

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Esc));

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.modals.error_message.is_none());
    }

    #[test]
    fn test_error_without_server_requests_quit() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::Error;
        model.server = None;

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert_eq!(follow_ups.len(), 1);
    }

    #[test]
    fn test_core_detected_quits_on_enter() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::CoreDetected;

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert_eq!(follow_ups.len(), 1);
    }
}
