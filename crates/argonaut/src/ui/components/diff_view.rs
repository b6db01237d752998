use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem};

use crate::app::Model;
use crate::ui::theme::Theme;

/// Inline unified-diff viewer.
pub(crate) fn render(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let Some(diff) = &model.diff else {
        return;
    };
    let height = usize::from(area.height.saturating_sub(2));

    let items: Vec<ListItem> = diff
        .content
        .iter()
        .skip(diff.offset)
        .take(height)
        .map(|line| {
            let style = if line.starts_with('+') && !line.starts_with("+++") {
                Style::default().fg(palette.synced)
            } else if line.starts_with('-') && !line.starts_with("---") {
                Style::default().fg(palette.out_of_sync)
            } else if line.starts_with("@@") {
                Style::default().fg(palette.accent)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(line.clone(), style)))
        })
        .collect();

    let title = if diff.searching {
        format!(" diff: {} /{} ", diff.title, diff.search_query)
    } else {
        format!(
            " diff: {} ({}/{}) ",
            diff.title,
            diff.offset + 1,
            diff.content.len().max(1)
        )
    };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(title),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(list, area);
}
