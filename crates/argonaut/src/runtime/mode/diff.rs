//! Key handling for the inline diff viewer and the no-drift notice.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::Model;
use crate::app::msg::Task;
use crate::domain::mode::Mode;
use crate::ui::navigator::Navigator;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    // The no-drift notice dismisses on any key.
    if model.mode == Mode::NoDiff {
        model.enter_mode(Mode::Normal);
        return Vec::new();
    }

    let viewport = model.viewport_height();
    let Some(diff) = &mut model.diff else {
        model.enter_mode(Mode::Normal);
        return Vec::new();
    };

    if diff.searching {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                diff.searching = false;
                diff.jump_to_first_match();
            }
            KeyCode::Char(c) => {
                diff.search_query.push(c);
            }
            KeyCode::Backspace => {
                diff.search_query.pop();
            }
            _ => {}
        }
        return Vec::new();
    }

    let navigator = Navigator::new(diff.content.len(), viewport);
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            model.enter_mode(Mode::Normal);
        }
        KeyCode::Char('j') | KeyCode::Down => {
            navigator.move_down(&mut diff.offset);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            navigator.move_up(&mut diff.offset);
        }
        KeyCode::PageDown | KeyCode::Char('f') => {
            navigator.page_down(&mut diff.offset);
        }
        KeyCode::PageUp | KeyCode::Char('b') => {
            navigator.page_up(&mut diff.offset);
        }
        KeyCode::Char('g') => {
            navigator.go_to_top(&mut diff.offset);
        }
        KeyCode::Char('G') => {
            navigator.go_to_bottom(&mut diff.offset);
        }
        KeyCode::Char('/') => {
            diff.search_query.clear();
            diff.searching = true;
        }
        KeyCode::Char('n') => {
            let matches = diff.matching_lines();
            if let Some(next) = matches.iter().find(|&&line| line > diff.offset) {
                diff.offset = *next;
            }
        }
        KeyCode::Char('N') => {
            let matches = diff.matching_lines();
            if let Some(prev) = matches.iter().rev().find(|&&line| line < diff.offset) {
                diff.offset = *prev;
            }
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
    use crate::domain::diff::DiffState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn diff_model() -> (
        crate::app::Model,
        tokio::sync::mpsc::UnboundedReceiver<crate::app::msg::Msg>,
    ) {
        let (mut model, rx) = test_model();
        model.diff = Some(DiffState {
            title: "web".to_string(),
            content: (0..50).map(|i| format!("line {i}")).collect(),
            ..DiffState::default()
        });
        model.mode = Mode::Diff;

        (model, rx)
    }

    #[test]
    fn test_no_diff_dismisses_on_any_key() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.diff = Some(DiffState::default());
        model.mode = Mode::NoDiff;

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('x')));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.diff.is_none());
    }

    #[test]
    fn test_scroll_keys_move_the_offset() {
        // Arrange
        let (mut model, _rx) = diff_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('j')));
        let _ = handle(&mut model, key(KeyCode::Char('j')));
        let _ = handle(&mut model, key(KeyCode::Char('k')));

        // Assert
        assert_eq!(model.diff.as_ref().expect("gone").offset, 1);
    }

    #[test]
    fn test_search_jumps_to_first_match() {
        // Arrange
        let (mut model, _rx) = diff_model();

        // Act: type "/line 42" then Enter
        let _ = handle(&mut model, key(KeyCode::Char('/')));
        for c in "line 42".chars() {
            let _ = handle(&mut model, key(KeyCode::Char(c)));
        }
        let _ = handle(&mut model, key(KeyCode::Enter));

        // Assert
        let diff = model.diff.as_ref().expect("gone");
        assert!(!diff.searching);
        assert_eq!(diff.offset, 42);
    }

    #[test]
    fn test_q_closes_the_viewer() {
        // Arrange
        let (mut model, _rx) = diff_model();

        // Act
        let _ = handle(&mut model, key(KeyCode::Char('q')));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.diff.is_none());
    }
}
