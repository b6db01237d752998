use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{Model, StatusLevel};
use crate::domain::mode::Mode;
use crate::domain::navigation::View;
use crate::ui::theme::Theme;

/// Bottom bar: the live search input or the transient status message,
/// with key hints on the right.
pub(crate) fn render(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let left = if model.mode == Mode::Search {
        Span::styled(
            format!(" /{}", model.search_query),
            Style::default().fg(palette.accent),
        )
    } else if !model.search_query.is_empty() {
        Span::styled(
            format!(" filter: {} ", model.search_query),
            Style::default().fg(palette.muted),
        )
    } else if let Some(status) = model.status.current() {
        let color = match status.level {
            StatusLevel::Info => palette.status_info,
            StatusLevel::Warn => palette.status_warn,
            StatusLevel::Error => palette.status_error,
        };
        Span::styled(format!(" {} ", status.text), Style::default().fg(color))
    } else {
        Span::raw(" ")
    };

    let hints = hints_for(model);
    let right = Span::styled(hints, Style::default().fg(palette.muted));
    let padding = area
        .width
        .saturating_sub(u16::try_from(left.width() + right.width()).unwrap_or(u16::MAX));
    let line = Line::from(vec![left, Span::raw(" ".repeat(padding.into())), right]);

    frame.render_widget(Paragraph::new(line), area);
}

fn hints_for(model: &Model) -> String {
    match model.mode {
        Mode::Normal => match model.navigation.view {
            View::Apps => {
                "s sync  d diff  R rollback  ^d delete  / filter  : cmd  ? help".to_string()
            }
            View::Tree => "j/k move  h/l fold  / filter  esc back".to_string(),
            _ => "j/k move  enter drill down  space select  esc up".to_string(),
        },
        Mode::Search => "enter commit  esc close".to_string(),
        Mode::Command => String::new(),
        _ => "esc close".to_string(),
    }
}
