//! Key handling for the theme picker, with live preview.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::Model;
use crate::app::msg::Task;
use crate::domain::mode::Mode;
use crate::ui::navigator::Navigator;
use crate::ui::theme::{THEME_NAMES, apply_theme};

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    if model.modals.theme_revert.is_none() {
        model.modals.theme_revert = Some(model.theme_name.clone());
        model.modals.theme_selected = THEME_NAMES
            .iter()
            .position(|name| *name == model.theme_name)
            .unwrap_or(0);
    }
    let navigator = Navigator::new(THEME_NAMES.len(), THEME_NAMES.len());

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            navigator.move_down(&mut model.modals.theme_selected);
            preview(model);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            navigator.move_up(&mut model.modals.theme_selected);
            preview(model);
        }
        KeyCode::Enter => {
            let name = THEME_NAMES
                .get(model.modals.theme_selected)
                .copied()
                .unwrap_or(crate::ui::theme::DEFAULT_THEME);
            model.modals.theme_revert = None;
            model.enter_mode(Mode::Normal);
            return apply_theme(model, name);
        }
        KeyCode::Esc | KeyCode::Char('q') => {
            if let Some(previous) = model.modals.theme_revert.take() {
                model.theme_name = previous;
            }
            model.enter_mode(Mode::Normal);
        }
        _ => {}
    }

    Vec::new()
}

fn preview(model: &mut Model) {
    if let Some(name) = THEME_NAMES.get(model.modals.theme_selected) {
        model.theme_name = (*name).to_string();
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::app::test_support::test_model;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_j_previews_the_next_theme() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::Theme;

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('j')));

        // Assert
        assert_eq!(model.theme_name, THEME_NAMES[1]);
    }

    #[test]
    fn test_esc_reverts_the_preview() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::Theme;
        let original = model.theme_name.clone();
        let _ = handle(&mut model, key(KeyCode::Char('j')));

        // Act
        let _ = handle(&mut model, key(KeyCode::Esc));

        // Assert
        assert_eq!(model.theme_name, original);
        assert_eq!(model.mode, Mode::Normal);
    }

    #[test]
    fn test_enter_commits_and_persists_selection() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::Theme;
        let _ = handle(&mut model, key(KeyCode::Char('j')));

        // Act
        let follow_ups = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert_eq!(follow_ups.len(), 1);
        assert_eq!(model.theme_name, THEME_NAMES[1]);
        assert_eq!(model.prefs.theme.as_deref(), Some(THEME_NAMES[1]));
        assert_eq!(model.mode, Mode::Normal);
    }
}
