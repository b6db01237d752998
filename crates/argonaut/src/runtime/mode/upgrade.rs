//! Key handling for the upgrade confirm/error/success overlays.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::Model;
use crate::app::msg::{Msg, Task, task};
use crate::domain::mode::Mode;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match model.mode {
        Mode::UpgradeConfirm => handle_confirm(model, key),
        // Error and success screens dismiss on any key.
        _ => {
            model.enter_mode(Mode::Normal);
            Vec::new()
        }
    }
}

fn handle_confirm(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    let ready = model
        .modals
        .upgrade
        .as_ref()
        .is_some_and(|u| !u.loading && !u.latest_version.is_empty());

    match key.code {
        KeyCode::Char('y' | 'Y') | KeyCode::Enter if ready => {
            if let Some(upgrade) = &mut model.modals.upgrade {
                upgrade.loading = true;
            }
            let epoch = model.epoch;
            vec![task(async move {
                let result = crate::infra::version::run_upgrade().await;
                Some(Msg::UpgradeFinished { result, epoch })
            })]
        }
        KeyCode::Esc | KeyCode::Char('n' | 'q') => {
            model.enter_mode(Mode::Normal);
            Vec::new()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::modals::UpgradeModal;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_confirm_while_loading_does_nothing() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::UpgradeConfirm;
        model.modals.upgrade = Some(UpgradeModal {
            loading: true,
            ..UpgradeModal::default()
        });

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Char('y')));

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.mode, Mode::UpgradeConfirm);
    }

    #[test]
    fn test_confirm_with_known_version_starts_upgrade() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::UpgradeConfirm;
        model.modals.upgrade = Some(UpgradeModal {
            latest_version: "v9.9.9".to_string(),
            ..UpgradeModal::default()
        });

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert_eq!(follow_ups.len(), 1);
        assert!(model.modals.upgrade.as_ref().is_some_and(|u| u.loading));
    }

    #[test]
    fn test_success_screen_dismisses_on_any_key() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::UpgradeSuccess;
        model.modals.upgrade = Some(UpgradeModal {
            changelog: Some("notes".to_string()),
            ..UpgradeModal::default()
        });

        // Act
        let _ = handle(&mut model, key(KeyCode::Char(' ')));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.modals.upgrade.is_none());
    }
}
