use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

use crate::app::{Model, autocomplete};
use crate::domain::modals::{MULTI_TARGET, SyncButton};
use crate::domain::mode::Mode;
use crate::ui::components::centered_rect;
use crate::ui::theme::{THEME_NAMES, Theme};

fn check(value: bool) -> &'static str {
    if value { "[x]" } else { "[ ]" }
}

fn target_label(model: &Model, target: &str) -> String {
    if target == MULTI_TARGET {
        format!("{} selected apps", model.selections.selected_apps.len())
    } else {
        target.to_string()
    }
}

fn dialog<'a>(title: &'a str, palette: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(format!(" {title} "))
}

/// One-shot banners shown over the normal view.
pub(crate) fn render_banners(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let banner = model
        .modals
        .whats_new
        .as_deref()
        .or(model.modals.default_view_warning.as_deref());
    let Some(text) = banner else {
        return;
    };
    let rect = centered_rect(area, (text.len() as u16).saturating_add(4).min(area.width), 3);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(palette.status_warn),
        )))
        .block(dialog("notice", palette)),
        rect,
    );
}

/// The `:` prompt with live suggestions.
pub(crate) fn render_command_prompt(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let suggestions = autocomplete::command_autocomplete(&model.command_input, model);
    let height = u16::try_from(suggestions.len().min(8) + 3).unwrap_or(11);
    let rect = centered_rect(area, area.width.saturating_sub(10).min(70), height);
    frame.render_widget(Clear, rect);

    let mut lines = vec![Line::from(vec![
        Span::styled(":", Style::default().fg(palette.accent)),
        Span::raw(model.command_input.clone()),
        Span::styled("█", Style::default().fg(palette.accent)),
    ])];
    for suggestion in suggestions.iter().take(8) {
        lines.push(Line::from(Span::styled(
            format!("  {suggestion}"),
            Style::default().fg(palette.muted),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(dialog("command", palette)),
        rect,
    );
}

pub(crate) fn render_help(frame: &mut Frame, area: Rect, palette: &Theme) {
    let entries = [
        ("j / k", "move cursor"),
        ("enter", "drill down / toggle tree node"),
        ("esc", "clear filter, drill up, close overlays"),
        ("space", "multi-select"),
        ("/", "live filter"),
        (":", "command prompt (cluster, ns, proj, sync, sort …)"),
        ("s", "sync selected app(s)"),
        ("d", "diff desired vs live"),
        ("R", "rollback from deployment history"),
        ("ctrl-d", "delete app(s)"),
        ("r", "resource tree"),
        ("gg / G", "top / bottom"),
        ("ZZ / ZQ", "quit"),
    ];
    let rect = centered_rect(area, 64, u16::try_from(entries.len() + 2).unwrap_or(16));
    frame.render_widget(Clear, rect);

    let lines: Vec<Line> = entries
        .iter()
        .map(|(keys, description)| {
            Line::from(vec![
                Span::styled(
                    format!(" {keys:<8} "),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(*description),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(dialog("help", palette)), rect);
}

pub(crate) fn render_sync_confirm(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let Some(modal) = &model.modals.sync else {
        return;
    };
    let rect = centered_rect(area, 56, 9);
    frame.render_widget(Clear, rect);

    let button = |label: &str, active: bool| {
        let style = if active {
            Style::default()
                .bg(palette.accent)
                .fg(palette.cursor_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        Span::styled(format!("  {label}  "), style)
    };
    let lines = vec![
        Line::from(format!("Sync {}?", target_label(model, &modal.target))),
        Line::raw(""),
        Line::from(Span::styled(
            format!("{} prune   {} watch after sync", check(modal.prune), check(modal.watch)),
            Style::default().fg(palette.muted),
        )),
        Line::raw(""),
        Line::from(vec![
            button("Sync", modal.selected == SyncButton::Sync),
            Span::raw("   "),
            button("Cancel", modal.selected == SyncButton::Cancel),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(dialog("sync", palette)), rect);
}

pub(crate) fn render_delete_confirm(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let Some(modal) = &model.modals.delete else {
        return;
    };
    let rect = centered_rect(area, 60, 10);
    frame.render_widget(Clear, rect);

    let lines = vec![
        Line::from(Span::styled(
            format!("Delete {}?", target_label(model, &modal.target)),
            Style::default().fg(palette.out_of_sync),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            format!(
                "{} cascade (tab)   propagation: {} (ctrl-p)",
                check(modal.cascade),
                modal.propagation.label()
            ),
            Style::default().fg(palette.muted),
        )),
        Line::raw(""),
        Line::from(vec![
            Span::raw("type "),
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to confirm: "),
            Span::styled(
                modal.confirmation_key.clone(),
                Style::default().fg(palette.status_warn),
            ),
        ]),
        Line::from(Span::styled(
            modal.error.clone().unwrap_or_default(),
            Style::default().fg(palette.status_error),
        )),
    ];

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(dialog("delete", palette)),
        rect,
    );
}

pub(crate) fn render_no_diff(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let title = model
        .diff
        .as_ref()
        .map(|d| d.title.clone())
        .unwrap_or_default();
    let rect = centered_rect(area, 44, 5);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(format!("{title} has no drift")),
            Line::raw(""),
            Line::from(Span::styled(
                "press any key",
                Style::default().fg(palette.muted),
            )),
        ])
        .block(dialog("no differences", palette)),
        rect,
    );
}

pub(crate) fn render_loading(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let rect = centered_rect(area, 36, 3);
    frame.render_widget(Clear, rect);
    let label = model
        .status
        .current()
        .map_or("Loading…".to_string(), |s| s.text.clone());
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            label,
            Style::default().fg(palette.progressing),
        )))
        .block(dialog("loading", palette)),
        rect,
    );
}

pub(crate) fn render_error(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let (title, body, hint) = match model.mode {
        Mode::AuthRequired => (
            "authentication required",
            "The server rejected the current token.".to_string(),
            "r retry after `argocd login`   l logs   q quit",
        ),
        Mode::ConnectionError => (
            "connection error",
            model
                .status
                .current()
                .map_or("The server is unreachable.".to_string(), |s| s.text.clone()),
            "r retry   l logs   q quit",
        ),
        Mode::CoreDetected => (
            "core context",
            model
                .modals
                .error_message
                .clone()
                .unwrap_or_else(|| "This context runs in core mode; the UI needs the API server.".to_string()),
            "enter quit",
        ),
        _ => (
            "error",
            model
                .modals
                .error_message
                .clone()
                .unwrap_or_else(|| "Unexpected failure; see logs.".to_string()),
            "esc dismiss",
        ),
    };
    let rect = centered_rect(area, 64, 8);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(body, Style::default().fg(palette.status_error))),
            Line::raw(""),
            Line::from(Span::styled(hint, Style::default().fg(palette.muted))),
        ])
        .wrap(Wrap { trim: false })
        .block(dialog(title, palette)),
        rect,
    );
}

pub(crate) fn render_upgrade(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let Some(upgrade) = &model.modals.upgrade else {
        return;
    };
    let rect = centered_rect(area, 64, 12);
    frame.render_widget(Clear, rect);

    let (title, lines) = match model.mode {
        Mode::UpgradeError => (
            "upgrade failed",
            vec![
                Line::from(Span::styled(
                    upgrade.error.clone().unwrap_or_default(),
                    Style::default().fg(palette.status_error),
                )),
                Line::raw(""),
                Line::from(Span::styled(
                    "press any key",
                    Style::default().fg(palette.muted),
                )),
            ],
        ),
        Mode::UpgradeSuccess => {
            let mut lines = vec![Line::from("Upgrade complete. What changed:"), Line::raw("")];
            for entry in upgrade
                .changelog
                .as_deref()
                .unwrap_or("")
                .lines()
                .take(6)
            {
                lines.push(Line::from(Span::styled(
                    entry.to_string(),
                    Style::default().fg(palette.muted),
                )));
            }
            ("upgraded", lines)
        }
        _ => {
            let body = if upgrade.loading {
                "Checking for a newer release…".to_string()
            } else {
                format!(
                    "Upgrade from v{} to {}?",
                    env!("CARGO_PKG_VERSION"),
                    upgrade.latest_version
                )
            };
            (
                "upgrade",
                vec![
                    Line::from(body),
                    Line::raw(""),
                    Line::from(Span::styled(
                        "y confirm   esc cancel",
                        Style::default().fg(palette.muted),
                    )),
                ],
            )
        }
    };

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(dialog(title, palette)),
        rect,
    );
}

pub(crate) fn render_theme_picker(frame: &mut Frame, area: Rect, model: &Model, palette: &Theme) {
    let rect = centered_rect(area, 36, u16::try_from(THEME_NAMES.len() + 2).unwrap_or(8));
    frame.render_widget(Clear, rect);

    let items: Vec<ListItem> = THEME_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let mut style = Style::default();
            if index == model.modals.theme_selected {
                style = style
                    .bg(palette.cursor_bg)
                    .fg(palette.cursor_fg)
                    .add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(Span::styled(format!(" {name}"), style)))
        })
        .collect();

    frame.render_widget(
        List::new(items).block(dialog("theme", palette)),
        rect,
    );
}
