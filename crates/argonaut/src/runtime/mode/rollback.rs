//! Key handling for the rollback overlay: history list then confirmation.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::msg::Task;
use crate::app::{Model, reconcile};
use crate::domain::mode::Mode;
use crate::domain::rollback::RollbackPhase;
use crate::ui::navigator::Navigator;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    let Some(rollback) = &mut model.rollback else {
        model.enter_mode(Mode::Normal);
        return Vec::new();
    };

    match rollback.phase {
        RollbackPhase::List => handle_list(model, key),
        RollbackPhase::Confirm => handle_confirm(model, key),
    }
}

fn handle_list(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    let viewport = model.viewport_height();
    let Some(rollback) = &mut model.rollback else {
        return Vec::new();
    };
    let navigator = Navigator::new(rollback.rows.len(), viewport);

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            model.enter_mode(Mode::Normal);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            navigator.move_down(&mut rollback.selected_idx);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            navigator.move_up(&mut rollback.selected_idx);
        }
        KeyCode::Char('g') => {
            navigator.go_to_top(&mut rollback.selected_idx);
        }
        KeyCode::Char('G') => {
            navigator.go_to_bottom(&mut rollback.selected_idx);
        }
        KeyCode::Char('p') => {
            rollback.prune = !rollback.prune;
        }
        KeyCode::Char('w') => {
            rollback.watch = !rollback.watch;
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            rollback.dry_run = !rollback.dry_run;
        }
        KeyCode::Enter => {
            if rollback.selected_row().is_some() {
                rollback.error = None;
                rollback.confirm_selected = true;
                rollback.phase = RollbackPhase::Confirm;
            }
        }
        _ => {}
    }

    Vec::new()
}

/// Second confirmation: only `y`/`Y` executes; any other key holds the
/// overlay open.
fn handle_confirm(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match key.code {
        KeyCode::Char('y' | 'Y') => reconcile::confirm_rollback(model),
        KeyCode::Esc | KeyCode::Char('n') => {
            if let Some(rollback) = &mut model.rollback {
                rollback.phase = RollbackPhase::List;
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::rollback::{RollbackRow, RollbackState};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn armed_model() -> (
        crate::app::Model,
        tokio::sync::mpsc::UnboundedReceiver<crate::app::msg::Msg>,
    ) {
        let (mut model, rx) = test_model();
        model.api = Some(std::sync::Arc::new(crate::infra::api::MockApiClient::new()));
        let mut state = RollbackState::loading_for("web");
        state.loading = false;
        state.rows = (0..3)
            .map(|i| RollbackRow {
                id: i,
                revision: format!("rev-{i}"),
                ..RollbackRow::default()
            })
            .collect();
        model.rollback = Some(state);
        model.mode = Mode::Rollback;

        (model, rx)
    }

    #[test]
    fn test_enter_moves_to_confirmation_phase() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('j')));
        let _ = handle(&mut model, key(KeyCode::Enter));

        // Assert
        let rollback = model.rollback.as_ref().expect("state gone");
        assert_eq!(rollback.phase, RollbackPhase::Confirm);
        assert_eq!(rollback.selected_idx, 1);
    }

    #[test]
    fn test_confirmation_requires_explicit_y() {
        // Arrange
        let (mut model, _rx) = armed_model();
        let _ = handle(&mut model, key(KeyCode::Enter));

        // Act: Enter again must not execute
        let follow_ups = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(
            model.rollback.as_ref().expect("state gone").phase,
            RollbackPhase::Confirm
        );

        // Act: y executes
        let follow_ups = handle(&mut model, key(KeyCode::Char('y')));

        // Assert
        assert_eq!(follow_ups.len(), 1);
    }

    #[test]
    fn test_esc_in_confirmation_returns_to_list() {
        // Arrange
        let (mut model, _rx) = armed_model();
        let _ = handle(&mut model, key(KeyCode::Enter));

        // Act
        let _ = handle(&mut model, key(KeyCode::Esc));

        // Assert
        assert_eq!(
            model.rollback.as_ref().expect("state gone").phase,
            RollbackPhase::List
        );
        assert_eq!(model.mode, Mode::Rollback);
    }

    #[test]
    fn test_esc_in_list_closes_overlay_and_clears_state() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Esc));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.rollback.is_none());
    }

    #[test]
    fn test_option_toggles() {
        // Arrange
        let (mut model, _rx) = armed_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('p')));
        let _ = handle(&mut model, key(KeyCode::Char('w')));
        let _ = handle(
            &mut model,
            KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL),
        );

        // Assert
        let rollback = model.rollback.as_ref().expect("state gone");
        assert!(rollback.prune);
        assert!(rollback.watch);
        assert!(rollback.dry_run);
    }
}
