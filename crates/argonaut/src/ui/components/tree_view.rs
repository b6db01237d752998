use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};

use crate::app::Model;
use crate::domain::app::{HealthStatus, SyncStatus};
use crate::domain::tree::TreeLine;
use crate::ui::components::lists::{health_color, sync_color};
use crate::ui::theme::Theme;

/// The live resource forest, rendered from the flat projection.
pub(crate) fn render(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let cursor_line = model.tree.line_index_of(model.navigation.selected_idx);
    let offset = model.navigation.scroll_offset;
    let height = usize::from(area.height.saturating_sub(2));

    let items: Vec<ListItem> = model
        .tree
        .lines()
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(line_index, line)| match line {
            TreeLine::Blank => ListItem::new(Line::raw("")),
            TreeLine::Node(uid) => {
                let Some(node) = model.tree.node(uid) else {
                    return ListItem::new(Line::raw(""));
                };
                let indent = "  ".repeat(node.depth);
                let fold = if node.children_uids.is_empty() {
                    "  "
                } else if node.expanded {
                    "▾ "
                } else {
                    "▸ "
                };
                let mut spans = vec![
                    Span::raw(format!("{indent}{fold}")),
                    Span::styled(
                        format!("{}/", node.kind),
                        Style::default().fg(palette.muted),
                    ),
                    Span::raw(node.name.clone()),
                ];
                if let Some(health) = &node.health {
                    spans.push(Span::styled(
                        format!("  {health}"),
                        Style::default()
                            .fg(health_color(palette, HealthStatus::parse(health))),
                    ));
                }
                if let Some(status) = &node.status {
                    spans.push(Span::styled(
                        format!("  {status}"),
                        Style::default().fg(sync_color(palette, SyncStatus::parse(status))),
                    ));
                }
                let mut line = Line::from(spans);
                if line_index == cursor_line {
                    line = line.style(
                        Style::default()
                            .bg(palette.cursor_bg)
                            .fg(palette.cursor_fg)
                            .add_modifier(Modifier::BOLD),
                    );
                }
                ListItem::new(line)
            }
        })
        .collect();

    let mut title = match &model.tree_app {
        Some(app) => format!(" Resources: {app} "),
        None => " Resources ".to_string(),
    };
    if !model.tree.filter().is_empty() {
        title.push_str(&format!("/{} ", model.tree.filter()));
    }
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(title),
    );

    frame.render_widget(list, area);
}
