//! Frame rendering: status bar, content area, footer, and modal overlays.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::app::Model;
use crate::domain::mode::Mode;
use crate::domain::navigation::View;
use crate::ui::theme::theme_by_name;

mod components;
pub mod navigator;
pub mod theme;

/// Renders a complete frame.
pub fn render(frame: &mut Frame, model: &mut Model) {
    let palette = theme_by_name(&model.theme_name);
    let area = frame.area();
    let chunks = Layout::default()
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    components::status_bar::render(frame, chunks[0], model, &palette);
    render_content(frame, chunks[1], model, &palette);
    components::footer_bar::render(frame, chunks[2], model, &palette);
    render_overlay(frame, area, model, &palette);
}

fn render_content(frame: &mut Frame, area: Rect, model: &mut Model, palette: &theme::Theme) {
    match model.navigation.view {
        View::Apps => components::lists::render_app_table(frame, area, model, palette),
        View::Tree => components::tree_view::render(frame, area, model, palette),
        view => components::lists::render_scope_list(frame, area, model, view, palette),
    }
}

fn render_overlay(frame: &mut Frame, area: Rect, model: &mut Model, palette: &theme::Theme) {
    match model.mode {
        Mode::Normal | Mode::Search => {
            components::overlays::render_banners(frame, area, model, palette);
        }
        Mode::Command => components::overlays::render_command_prompt(frame, area, model, palette),
        Mode::Help => components::overlays::render_help(frame, area, palette),
        Mode::ConfirmSync => components::overlays::render_sync_confirm(frame, area, model, palette),
        Mode::ConfirmAppDelete => {
            components::overlays::render_delete_confirm(frame, area, model, palette);
        }
        Mode::Rollback => components::rollback_view::render(frame, area, model, palette),
        Mode::Diff => components::diff_view::render(frame, area, model, palette),
        Mode::NoDiff => components::overlays::render_no_diff(frame, area, model, palette),
        Mode::Loading => components::overlays::render_loading(frame, area, model, palette),
        Mode::AuthRequired | Mode::ConnectionError | Mode::Error | Mode::CoreDetected => {
            components::overlays::render_error(frame, area, model, palette);
        }
        Mode::UpgradeConfirm | Mode::UpgradeError | Mode::UpgradeSuccess => {
            components::overlays::render_upgrade(frame, area, model, palette);
        }
        Mode::Theme => components::overlays::render_theme_picker(frame, area, model, palette),
    }
}
