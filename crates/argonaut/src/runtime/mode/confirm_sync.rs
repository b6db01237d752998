//! Key handling for the sync confirmation modal.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::msg::Task;
use crate::app::{Model, reconcile};
use crate::domain::modals::SyncButton;
use crate::domain::mode::Mode;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    let Some(modal) = &mut model.modals.sync else {
        model.enter_mode(Mode::Normal);
        return Vec::new();
    };

    match key.code {
        KeyCode::Char('p') => {
            modal.prune = !modal.prune;
        }
        KeyCode::Char('w') => {
            modal.watch = !modal.watch;
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            modal.selected = match modal.selected {
                SyncButton::Sync => SyncButton::Cancel,
                SyncButton::Cancel => SyncButton::Sync,
            };
        }
        KeyCode::Char('y' | 'Y') => return reconcile::confirm_sync(model),
        KeyCode::Enter => {
            if modal.selected == SyncButton::Sync {
                return reconcile::confirm_sync(model);
            }
            model.enter_mode(Mode::Normal);
        }
        KeyCode::Esc | KeyCode::Char('n' | 'q') => {
            model.enter_mode(Mode::Normal);
        }
        _ => {}
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::app::App;
    use crate::domain::modals::SyncModal;

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
        model.modals.sync = Some(SyncModal::for_target("web"));
        model.mode = Mode::ConfirmSync;

        (model, rx)
    }

    #[test]
    fn test_p_and_w_toggle_options() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('p')));
        let _ = handle(&mut model, key(KeyCode::Char('w')));

        // Assert
        let modal = model.modals.sync.as_ref().expect("modal gone");
        assert!(modal.prune);
        assert!(modal.watch);
    }

    #[test]
    fn test_enter_on_sync_button_dispatches_reconciler() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert_eq!(follow_ups.len(), 1);
    }

    #[test]
    fn test_enter_on_cancel_button_closes_without_dispatch() {
        // Arrange
        let (mut model, _rx) = armed_model();
        let _ = handle(&mut model, key(KeyCode::Tab));

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.modals.sync.is_none());
    }

    #[test]
    fn test_esc_cancels_and_clears_scratch() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Esc));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.modals.sync.is_none());
    }
}
