use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, Row, Table};

use crate::app::Model;
use crate::domain::app::{App, HealthStatus, SyncStatus};
use crate::domain::navigation::View;
use crate::ui::theme::Theme;

pub(crate) fn sync_color(palette: &Theme, sync: SyncStatus) -> ratatui::style::Color {
    match sync {
        SyncStatus::Synced => palette.synced,
        SyncStatus::OutOfSync => palette.out_of_sync,
        SyncStatus::Unknown => palette.muted,
    }
}

pub(crate) fn health_color(palette: &Theme, health: HealthStatus) -> ratatui::style::Color {
    match health {
        HealthStatus::Healthy => palette.healthy,
        HealthStatus::Degraded | HealthStatus::Missing => palette.degraded,
        HealthStatus::Progressing => palette.progressing,
        HealthStatus::Unknown => palette.muted,
    }
}

/// The main application table.
pub(crate) fn render_app_table(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let visible = model.visible_apps();
    let cursor = model.navigation.selected_idx;
    let offset = model.navigation.scroll_offset;
    let height = usize::from(area.height.saturating_sub(2));
    let window: Vec<(usize, &&App)> = visible.iter().enumerate().skip(offset).take(height).collect();

    let rows: Vec<Row> = window
        .into_iter()
        .map(|(index, app)| {
            let marker = if model.selections.selected_apps.contains(&app.name) {
                "●"
            } else {
                " "
            };
            let mut row = Row::new(vec![
                Cell::from(format!("{marker} {}", app.name)),
                Cell::from(Span::styled(
                    app.sync.label(),
                    Style::default().fg(sync_color(palette, app.sync)),
                )),
                Cell::from(Span::styled(
                    app.health.label(),
                    Style::default().fg(health_color(palette, app.health)),
                )),
                Cell::from(app.project.clone().unwrap_or_default()),
                Cell::from(app.cluster.clone().unwrap_or_default()),
            ]);
            if index == cursor {
                row = row.style(
                    Style::default()
                        .bg(palette.cursor_bg)
                        .fg(palette.cursor_fg)
                        .add_modifier(Modifier::BOLD),
                );
            }
            row
        })
        .collect();

    let title = format!(" Applications ({}) ", visible.len());
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
        ],
    )
    .header(
        Row::new(vec!["  Name", "Sync", "Health", "Project", "Cluster"])
            .style(Style::default().fg(palette.muted).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(title),
    );

    frame.render_widget(table, area);
}

/// The cluster/namespace/project/appset lists.
pub(crate) fn render_scope_list(
    frame: &mut Frame,
    area: Rect,
    model: &Model,
    view: View,
    palette: &Theme,
) {
    let items = model.scope_items(view);
    let cursor = model.navigation.selected_idx;
    let offset = model.navigation.scroll_offset;
    let height = usize::from(area.height.saturating_sub(2));
    let scope_set = match view {
        View::Clusters => &model.selections.scope_clusters,
        View::Namespaces => &model.selections.scope_namespaces,
        View::Projects => &model.selections.scope_projects,
        View::ApplicationSets => &model.selections.scope_application_sets,
        View::Apps | View::Tree => return,
    };

    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(index, item)| {
            let marker = if scope_set.contains(item) { "●" } else { " " };
            let mut style = Style::default();
            if index == cursor {
                style = style
                    .bg(palette.cursor_bg)
                    .fg(palette.cursor_fg)
                    .add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(Span::styled(
                format!("{marker} {item}"),
                style,
            )))
        })
        .collect();

    let title = format!(" {} ({}) ", view.title(), items.len());
    let list = List::new(list_items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(title),
    );

    frame.render_widget(list, area);
}
