use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use crate::app::Model;
use crate::domain::rollback::RollbackPhase;
use crate::ui::components::centered_rect;
use crate::ui::theme::Theme;

fn check(value: bool) -> &'static str {
    if value { "[x]" } else { "[ ]" }
}

/// Deployment-history overlay with its second-stage confirmation.
pub(crate) fn render(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let Some(rollback) = &model.rollback else {
        return;
    };
    let overlay = centered_rect(area, area.width.saturating_sub(8), area.height.saturating_sub(4));
    frame.render_widget(Clear, overlay);

    if rollback.phase == RollbackPhase::Confirm {
        render_confirm(frame, overlay, model, palette);
        return;
    }

    let rows: Vec<Row> = rollback
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let current = rollback
                .current_revision
                .as_deref()
                .is_some_and(|rev| rev == row.revision);
            let marker = if current { "→" } else { " " };
            let meta = row.meta_error.clone().unwrap_or_else(|| {
                match (&row.author, &row.message) {
                    (Some(author), Some(message)) => format!("{author}: {message}"),
                    (Some(author), None) => author.clone(),
                    (None, Some(message)) => message.clone(),
                    (None, None) => String::new(),
                }
            });
            let mut table_row = Row::new(vec![
                Cell::from(format!("{marker} {}", row.id)),
                Cell::from(short_revision(&row.revision)),
                Cell::from(row.deployed_at.clone()),
                Cell::from(meta),
            ]);
            if index == rollback.selected_idx {
                table_row = table_row.style(
                    Style::default()
                        .bg(palette.cursor_bg)
                        .fg(palette.cursor_fg)
                        .add_modifier(Modifier::BOLD),
                );
            }
            table_row
        })
        .collect();

    let mut title = format!(" Rollback {} ", rollback.app_name);
    if rollback.loading {
        title.push_str("(loading…) ");
    }
    let options = Line::from(vec![
        Span::styled(
            format!(
                " {} prune  {} watch  {} dry-run ",
                check(rollback.prune),
                check(rollback.watch),
                check(rollback.dry_run)
            ),
            Style::default().fg(palette.muted),
        ),
        Span::styled(
            rollback.error.clone().unwrap_or_default(),
            Style::default().fg(palette.status_error),
        ),
    ]);

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(22),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["  ID", "Revision", "Deployed", "Commit"])
            .style(Style::default().fg(palette.muted).add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.border))
            .title(title)
            .title_bottom(options),
    );

    frame.render_widget(table, overlay);
}

fn render_confirm(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let Some(rollback) = &model.rollback else {
        return;
    };
    let revision = rollback
        .selected_row()
        .map(|row| short_revision(&row.revision))
        .unwrap_or_default();
    let text = vec![
        Line::from(format!(
            "Roll back {} to revision {revision}?",
            rollback.app_name
        )),
        Line::raw(""),
        Line::from(Span::styled(
            format!(
                "{} prune   {} watch   {} dry-run",
                check(rollback.prune),
                check(rollback.watch),
                check(rollback.dry_run)
            ),
            Style::default().fg(palette.muted),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "press y to confirm, esc to go back",
            Style::default().fg(palette.status_warn),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.out_of_sync))
        .title(" Confirm rollback ");
    let dialog = centered_rect(area, 56, 9);
    frame.render_widget(Clear, dialog);
    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }).block(block),
        dialog,
    );
}

fn short_revision(revision: &str) -> String {
    revision.chars().take(8).collect()
}
