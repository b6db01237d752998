//! Named color themes and the live theme switch.

use ratatui::style::Color;

use crate::app::msg::Task;
use crate::app::{Model, StatusLevel, command};

/// Theme applied when nothing is configured.
pub const DEFAULT_THEME: &str = "argonaut-dark";

/// Picker order.
pub const THEME_NAMES: &[&str] = &["argonaut-dark", "argonaut-light", "solarized", "dracula"];

/// Colors consumed by the render layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub accent: Color,
    pub border: Color,
    pub cursor_bg: Color,
    pub cursor_fg: Color,
    pub muted: Color,
    pub status_error: Color,
    pub status_info: Color,
    pub status_warn: Color,
    pub synced: Color,
    pub out_of_sync: Color,
    pub healthy: Color,
    pub degraded: Color,
    pub progressing: Color,
}

/// Resolves a theme by name, falling back to the default palette.
pub fn theme_by_name(name: &str) -> Theme {
    match name {
        "argonaut-light" => Theme {
            accent: Color::Blue,
            border: Color::DarkGray,
            cursor_bg: Color::LightBlue,
            cursor_fg: Color::Black,
            muted: Color::Gray,
            status_error: Color::Red,
            status_info: Color::Black,
            status_warn: Color::Yellow,
            synced: Color::Green,
            out_of_sync: Color::Red,
            healthy: Color::Green,
            degraded: Color::Red,
            progressing: Color::Yellow,
        },
        "solarized" => Theme {
            accent: Color::Rgb(38, 139, 210),
            border: Color::Rgb(88, 110, 117),
            cursor_bg: Color::Rgb(7, 54, 66),
            cursor_fg: Color::Rgb(253, 246, 227),
            muted: Color::Rgb(101, 123, 131),
            status_error: Color::Rgb(220, 50, 47),
            status_info: Color::Rgb(131, 148, 150),
            status_warn: Color::Rgb(181, 137, 0),
            synced: Color::Rgb(133, 153, 0),
            out_of_sync: Color::Rgb(203, 75, 22),
            healthy: Color::Rgb(133, 153, 0),
            degraded: Color::Rgb(220, 50, 47),
            progressing: Color::Rgb(181, 137, 0),
        },
        "dracula" => Theme {
            accent: Color::Rgb(189, 147, 249),
            border: Color::Rgb(68, 71, 90),
            cursor_bg: Color::Rgb(68, 71, 90),
            cursor_fg: Color::Rgb(248, 248, 242),
            muted: Color::Rgb(98, 114, 164),
            status_error: Color::Rgb(255, 85, 85),
            status_info: Color::Rgb(248, 248, 242),
            status_warn: Color::Rgb(241, 250, 140),
            synced: Color::Rgb(80, 250, 123),
            out_of_sync: Color::Rgb(255, 85, 85),
            healthy: Color::Rgb(80, 250, 123),
            degraded: Color::Rgb(255, 85, 85),
            progressing: Color::Rgb(241, 250, 140),
        },
        _ => Theme {
            accent: Color::Cyan,
            border: Color::DarkGray,
            cursor_bg: Color::DarkGray,
            cursor_fg: Color::White,
            muted: Color::Gray,
            status_error: Color::Red,
            status_info: Color::White,
            status_warn: Color::Yellow,
            synced: Color::Green,
            out_of_sync: Color::Red,
            healthy: Color::Green,
            degraded: Color::Red,
            progressing: Color::Yellow,
        },
    }
}

/// Applies and persists a theme selection.
pub fn apply_theme(model: &mut Model, name: &str) -> Vec<Task> {
    if !THEME_NAMES.contains(&name) {
        model.set_status(StatusLevel::Warn, format!("Unknown theme: {name}"));
        return Vec::new();
    }
    model.theme_name = name.to_string();
    model.prefs.theme = Some(name.to_string());
    model.set_status(StatusLevel::Info, format!("Theme set to {name}"));

    vec![command::persist_prefs_task(model)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::test_model;

    #[test]
    fn test_unknown_theme_falls_back_to_default_palette() {
        // Assert
        assert_eq!(theme_by_name("nope"), theme_by_name(DEFAULT_THEME));
    }

    #[test]
    fn test_apply_theme_sets_and_persists() {
        // Arrange
        let (mut model, _rx) = test_model();

        // Act
        let follow_ups = apply_theme(&mut model, "dracula");

        // Assert
        assert_eq!(follow_ups.len(), 1);
        assert_eq!(model.theme_name, "dracula");
        assert_eq!(model.prefs.theme.as_deref(), Some("dracula"));
    }

    #[test]
    fn test_apply_unknown_theme_warns_and_keeps_current() {
        // Arrange
        let (mut model, _rx) = test_model();
        let before = model.theme_name.clone();

        // Act
        let follow_ups = apply_theme(&mut model, "hotdog-stand");

        // Assert
        assert!(follow_ups.is_empty());
        assert_eq!(model.theme_name, before);
    }
}
