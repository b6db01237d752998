//! Key handling for Search mode: live incremental re-filter.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::Model;
use crate::app::msg::Task;
use crate::domain::mode::Mode;
use crate::domain::navigation::View;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => {
            model.enter_mode(Mode::Normal);
        }
        KeyCode::Char(c) => {
            model.search_query.push(c);
            refilter(model);
        }
        KeyCode::Backspace => {
            model.search_query.pop();
            refilter(model);
        }
        _ => {}
    }

    Vec::new()
}

/// Re-applies the filter after every edit.
///
/// In the tree view the filter delegates to the tree model, which reveals
/// matches and reports where the cursor should jump.
fn refilter(model: &mut Model) {
    if model.navigation.view == View::Tree {
        let query = model.search_query.clone();
        if let Some(first_match) = model.tree.set_filter(&query) {
            model.navigation.selected_idx = first_match;
        }
        model.clamp_selection();
        return;
    }
    model.navigation.reset_cursor();
    model.clamp_selection();
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::app::App;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_filters_incrementally() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.replace_apps(vec![App::named("web"), App::named("api")]);
        model.mode = Mode::Search;
        model.navigation.selected_idx = 1;

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('w')));

        // Assert: cursor reset, list narrowed live
        assert_eq!(model.search_query, "w");
        assert_eq!(model.navigation.selected_idx, 0);
        assert_eq!(model.visible_apps().len(), 1);
    }

    #[test]
    fn test_backspace_widens_the_filter_again() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.replace_apps(vec![App::named("web"), App::named("api")]);
        model.mode = Mode::Search;
        model.search_query = "we".to_string();

        // Act
        let _ = handle(&mut model, key(KeyCode::Backspace));
        let _ = handle(&mut model, key(KeyCode::Backspace));

        // Assert
        assert!(model.search_query.is_empty());
        assert_eq!(model.visible_apps().len(), 2);
    }

    #[test]
    fn test_enter_commits_and_returns_to_normal_keeping_query() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.replace_apps(vec![App::named("web")]);
        model.mode = Mode::Search;
        model.search_query = "we".to_string();

        // Act
        let _ = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert_eq!(model.search_query, "we");
    }
}
