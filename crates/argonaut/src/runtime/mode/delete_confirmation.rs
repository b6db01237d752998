//! Key handling for the delete confirmation modal.
//!
//! The destructive gate: only an explicit `y`/`Y` fires the delete; any
//! other keystroke is buffered and holds the modal open with an inline
//! error.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::msg::Task;
use crate::app::{Model, reconcile};
use crate::domain::mode::Mode;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    let Some(modal) = &mut model.modals.delete else {
        model.enter_mode(Mode::Normal);
        return Vec::new();
    };

    match key.code {
        KeyCode::Esc => {
            model.enter_mode(Mode::Normal);
        }
        KeyCode::Tab => {
            modal.cascade = !modal.cascade;
        }
        KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            modal.propagation = modal.propagation.next();
        }
        KeyCode::Backspace => {
            modal.confirmation_key.clear();
            modal.error = None;
        }
        KeyCode::Char('y' | 'Y') => {
            modal.confirmation_key.clear();
            return reconcile::confirm_delete(model);
        }
        KeyCode::Char(c) => {
            modal.confirmation_key = c.to_string();
            modal.error = Some("Press y to confirm deletion".to_string());
        }
        _ => {}
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::app::App;
    use crate::domain::modals::{DeleteModal, Propagation};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn armed_model() -> (
        crate::app::Model,
        tokio::sync::mpsc::UnboundedReceiver<crate::app::msg::Msg>,
    ) {
        let (mut model, rx) = test_model();
        model.api = Some(std::sync::Arc::new(crate::infra::api::MockApiClient::new()));
        model.replace_apps(vec![App::named("web")]);
        model.modals.delete = Some(DeleteModal::for_target("web"));
        model.mode = Mode::ConfirmAppDelete;

        (model, rx)
    }

    #[test]
    fn test_wrong_key_holds_modal_open_with_buffer() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Char('x')));

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.mode, Mode::ConfirmAppDelete);
        let modal = model.modals.delete.as_ref().expect("modal gone");
        assert_eq!(modal.confirmation_key, "x");
        assert!(modal.error.is_some());
    }

    #[test]
    fn test_backspace_clears_the_buffer() {
        // Arrange
        let (mut model, _rx) = armed_model();
        let _ = handle(&mut model, key(KeyCode::Char('x')));

        // Act
        let _ = handle(&mut model, key(KeyCode::Backspace));

        // Assert
        let modal = model.modals.delete.as_ref().expect("modal gone");
        assert!(modal.confirmation_key.is_empty());
        assert!(modal.error.is_none());
    }

    #[test]
    fn test_y_fires_the_delete_reconciler() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Char('y')));

        // Assert
        assert_eq!(follow_ups.len(), 1);
    }

    #[test]
    fn test_enter_does_not_bypass_the_gate() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.mode, Mode::ConfirmAppDelete);
    }

    #[test]
    fn test_tab_toggles_cascade_and_ctrl_p_cycles_propagation() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Tab));
        let _ = handle(
            &mut model,
            KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL),
        );

        // Assert
        let modal = model.modals.delete.as_ref().expect("modal gone");
        assert!(!modal.cascade);
        assert_eq!(modal.propagation, Propagation::Background);
    }

    #[test]
    fn test_esc_cancels_and_clears_scratch() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Esc));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.modals.delete.is_none());
    }
}
