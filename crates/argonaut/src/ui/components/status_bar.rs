use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::Model;
use crate::ui::theme::Theme;

const SPINNER_FRAMES: [char; 4] = ['|', '/', '-', '\\'];

/// Top bar: app version, active context, server, and a spinner while a
/// load is in flight.
pub(crate) fn render(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let mut spans = vec![
        Span::styled(
            format!(" argonaut v{} ", env!("CARGO_PKG_VERSION")),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(context) = &model.context_name {
        spans.push(Span::styled(
            format!(" {context} "),
            Style::default().fg(palette.status_info),
        ));
    }
    if let Some(server) = &model.server {
        spans.push(Span::styled(
            format!("({server}) "),
            Style::default().fg(palette.muted),
        ));
    }
    if model.modals.initial_loading || model.diff.as_ref().is_some_and(|d| d.loading) {
        let spinner = SPINNER_FRAMES[model.spinner_frame % SPINNER_FRAMES.len()];
        spans.push(Span::styled(
            format!(" {spinner} "),
            Style::default().fg(palette.progressing),
        ));
    }
    if !model.selections.selected_apps.is_empty() {
        spans.push(Span::styled(
            format!(" [{} selected] ", model.selections.selected_apps.len()),
            Style::default().fg(palette.accent),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
