//! Per-mode key handlers.
//!
//! Key routing is dispatched on the active mode first, then (inside
//! Normal) on the active view. Handlers mutate the model and return
//! follow-up tasks; they never block.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::Model;
use crate::app::msg::{Msg, Task, task};
use crate::domain::mode::Mode;

mod command;
mod confirm_sync;
mod delete_confirmation;
mod diff;
mod normal;
mod overlays;
mod rollback;
mod search;
mod theme;
mod upgrade;

/// Routes one key event to the handler for the active mode.
pub fn handle_key(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    // Ctrl+C always requests a quit, regardless of mode.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return vec![task(async { Some(Msg::Quit) })];
    }

    match model.mode {
        Mode::Normal => normal::handle(model, key),
        Mode::Search => search::handle(model, key),
        Mode::Command => command::handle(model, key),
        Mode::ConfirmSync => confirm_sync::handle(model, key),
        Mode::Rollback => rollback::handle(model, key),
        Mode::ConfirmAppDelete => delete_confirmation::handle(model, key),
        Mode::Diff | Mode::NoDiff => diff::handle(model, key),
        Mode::Theme => theme::handle(model, key),
        Mode::UpgradeConfirm | Mode::UpgradeError | Mode::UpgradeSuccess => {
            upgrade::handle(model, key)
        }
        Mode::Help
        | Mode::Loading
        | Mode::AuthRequired
        | Mode::ConnectionError
        | Mode::Error
        | Mode::CoreDetected => overlays::handle(model, key),
    }
}
