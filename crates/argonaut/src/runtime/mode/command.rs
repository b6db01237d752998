//! Key handling for Command mode: the `:` prompt.

use crossterm::event::{KeyCode, KeyEvent};

use crate::app::msg::Task;
use crate::app::{Model, autocomplete, command};
use crate::domain::mode::Mode;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match key.code {
        KeyCode::Esc => {
            model.enter_mode(Mode::Normal);
            Vec::new()
        }
        KeyCode::Enter => {
            let input = model.command_input.clone();
            command::execute(model, &input)
        }
        KeyCode::Tab => {
            let suggestions = autocomplete::command_autocomplete(&model.command_input, model);
            if let Some(first) = suggestions.first() {
                model.command_input = first.clone();
            }
            Vec::new()
        }
        KeyCode::Char(c) => {
            model.command_input.push(c);
            Vec::new()
        }
        KeyCode::Backspace => {
            model.command_input.pop();
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
    use crate::domain::app::App;
    use crate::domain::navigation::View;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_line(model: &mut Model, line: &str) {
        for c in line.chars() {
            let _ = handle(model, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_tab_replaces_input_with_first_suggestion() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::Command;
        type_line(&mut model, "sy");

        // Act
        let _ = handle(&mut model, key(KeyCode::Tab));

        // Assert
        assert_eq!(model.command_input, "sync");
    }

    #[test]
    fn test_enter_dispatches_the_typed_command() {
        // Arrange
        let (mut model, _rx) = test_model();
        let mut app = App::named("web");
        app.project = Some("platform".to_string());
        model.replace_apps(vec![app]);
        model.mode = Mode::Command;
        type_line(&mut model, "project platform");

        // Act
        let _ = handle(&mut model, key(KeyCode::Enter));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.selections.scope_projects.contains("platform"));
        assert_eq!(model.navigation.view, View::Apps);
    }

    #[test]
    fn test_esc_abandons_the_prompt_and_clears_input() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.mode = Mode::Command;
        type_line(&mut model, "del");

        // Act
        let _ = handle(&mut model, key(KeyCode::Esc));

        // Assert
        assert_eq!(model.mode, Mode::Normal);
        assert!(model.command_input.is_empty());
    }
}
