//! Key handling for Normal mode, dispatched on the active view.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::msg::{Msg, Task, task};
use crate::app::{Model, StatusLevel, reconcile};
use crate::domain::modals::{DeleteModal, SyncModal};
use crate::domain::mode::Mode;
use crate::domain::navigation::{View, now_unix_ms};
use crate::domain::selection::Selections;
use crate::ui::navigator::Navigator;

pub(crate) fn handle(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    // One-shot banners dismiss on the next keypress.
    model.modals.whats_new = None;
    model.modals.default_view_warning = None;

    match key.code {
        KeyCode::Esc => return handle_esc(model, now_unix_ms()),
        KeyCode::Char('/') => {
            model.enter_mode(Mode::Search);
            return Vec::new();
        }
        KeyCode::Char(':') => {
            model.command_input.clear();
            model.enter_mode(Mode::Command);
            return Vec::new();
        }
        KeyCode::Char('?') => {
            model.enter_mode(Mode::Help);
            return Vec::new();
        }
        KeyCode::Char('Z') => {
            if model.navigation.register_z(now_unix_ms()) {
                return vec![task(async { Some(Msg::Quit) })];
            }
            return Vec::new();
        }
        KeyCode::Char('Q') => {
            // The second half of ZQ; alone it does nothing.
            if now_unix_ms().saturating_sub(model.navigation.last_z_pressed)
                <= crate::domain::navigation::DOUBLE_KEY_WINDOW_MS
                && model.navigation.last_z_pressed != 0
            {
                return vec![task(async { Some(Msg::Quit) })];
            }
            return Vec::new();
        }
        _ => {}
    }

    if model.navigation.view == View::Tree {
        return handle_tree_keys(model, key);
    }

    handle_list_keys(model, key)
}

fn navigator(model: &Model) -> Navigator {
    Navigator::new(model.visible_item_count(), model.viewport_height())
}

fn sync_scroll(model: &mut Model) {
    let nav = navigator(model);
    let cursor = model.navigation.selected_idx;
    nav.ensure_visible(cursor, &mut model.navigation.scroll_offset);
}

fn handle_list_keys(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            navigator(model).move_down(&mut model.navigation.selected_idx);
            sync_scroll(model);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            navigator(model).move_up(&mut model.navigation.selected_idx);
            sync_scroll(model);
        }
        KeyCode::Char('f') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            navigator(model).page_down(&mut model.navigation.selected_idx);
            sync_scroll(model);
        }
        KeyCode::Char('b') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            navigator(model).page_up(&mut model.navigation.selected_idx);
            sync_scroll(model);
        }
        KeyCode::Char('g') => {
            if model.navigation.register_g(now_unix_ms()) {
                navigator(model).go_to_top(&mut model.navigation.selected_idx);
                sync_scroll(model);
            }
        }
        KeyCode::Char('G') => {
            navigator(model).go_to_bottom(&mut model.navigation.selected_idx);
            sync_scroll(model);
        }
        KeyCode::Enter => return drill_down(model),
        KeyCode::Char(' ') => toggle_selection(model),
        KeyCode::Char('s') if model.navigation.view == View::Apps => {
            if let Some(target) = model.destructive_target() {
                model.modals.sync = Some(SyncModal::for_target(target));
                model.enter_mode(Mode::ConfirmSync);
            }
        }
        KeyCode::Char('r') if model.navigation.view == View::Apps => {
            if let Some(app_name) = model.selected_app_name() {
                return reconcile::open_tree_view(model, app_name);
            }
        }
        KeyCode::Char('d')
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && model.navigation.view == View::Apps =>
        {
            if let Some(target) = model.destructive_target() {
                model.modals.delete = Some(DeleteModal::for_target(target));
                model.enter_mode(Mode::ConfirmAppDelete);
            }
        }
        KeyCode::Char('d') if model.navigation.view == View::Apps => {
            if let Some(app_name) = model.selected_app_name() {
                model.diff = Some(crate::domain::diff::DiffState::loading_for(app_name.clone()));
                model.enter_mode(Mode::Loading);
                model.set_status(StatusLevel::Info, format!("Loading diff for {app_name}…"));
                return vec![reconcile::diff_task(model, app_name)];
            }
        }
        KeyCode::Char('R') if model.navigation.view == View::Apps => {
            if let Some(app_name) = model.selected_app_name() {
                return reconcile::open_rollback(model, app_name);
            }
        }
        KeyCode::Char('c') if model.navigation.view == View::Apps => {
            return copy_selected_app(model);
        }
        _ => {}
    }

    Vec::new()
}

/// Copies the selected app name through the configured clipboard command.
fn copy_selected_app(model: &mut Model) -> Vec<Task> {
    let Some(app_name) = model.selected_app_name() else {
        return Vec::new();
    };
    let Some(command) = model.prefs.clipboard_command.clone() else {
        model.set_status(StatusLevel::Warn, "No clipboard command configured");
        return Vec::new();
    };
    model.set_status(StatusLevel::Info, format!("Copied {app_name}"));

    vec![task(async move {
        if let Err(error) =
            crate::infra::pager::pipe_to_clipboard(&command, &app_name).await
        {
            tracing::warn!(%error, "clipboard copy failed");
        }
        None
    })]
}

fn handle_tree_keys(model: &mut Model, key: KeyEvent) -> Vec<Task> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            navigator(model).move_down(&mut model.navigation.selected_idx);
            sync_tree_scroll(model);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            navigator(model).move_up(&mut model.navigation.selected_idx);
            sync_tree_scroll(model);
        }
        KeyCode::Char('g') => {
            if model.navigation.register_g(now_unix_ms()) {
                navigator(model).go_to_top(&mut model.navigation.selected_idx);
                sync_tree_scroll(model);
            }
        }
        KeyCode::Char('G') => {
            navigator(model).go_to_bottom(&mut model.navigation.selected_idx);
            sync_tree_scroll(model);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            model.tree.collapse(model.navigation.selected_idx);
            model.clamp_selection();
            sync_tree_scroll(model);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            model.tree.expand(model.navigation.selected_idx);
            sync_tree_scroll(model);
        }
        KeyCode::Enter => {
            model.tree.toggle(model.navigation.selected_idx);
            model.clamp_selection();
            sync_tree_scroll(model);
        }
        _ => {}
    }

    Vec::new()
}

/// Scroll math for the tree uses rendered line indices, which include the
/// blank separators between app roots.
fn sync_tree_scroll(model: &mut Model) {
    let nav = Navigator::new(model.tree.line_count(), model.viewport_height());
    let line = model.tree.line_index_of(model.navigation.selected_idx);
    nav.ensure_visible(line, &mut model.navigation.scroll_offset);
}

fn toggle_selection(model: &mut Model) {
    match model.navigation.view {
        View::Apps => {
            if let Some(name) = model.selected_app_name() {
                model.selections.toggle_app(&name);
            }
        }
        view => {
            let items = model.scope_items(view);
            let Some(item) = items.get(model.navigation.selected_idx) else {
                return;
            };
            let set = match view {
                View::Clusters => &mut model.selections.scope_clusters,
                View::Namespaces => &mut model.selections.scope_namespaces,
                View::Projects => &mut model.selections.scope_projects,
                View::ApplicationSets => &mut model.selections.scope_application_sets,
                View::Apps | View::Tree => return,
            };
            Selections::toggle_scope(set, item);
        }
    }
}

fn drill_down(model: &mut Model) -> Vec<Task> {
    match model.navigation.view {
        View::Apps => {
            if let Some(app_name) = model.selected_app_name() {
                return reconcile::open_tree_view(model, app_name);
            }
        }
        View::Tree => {}
        view => {
            let items = model.scope_items(view);
            if let Some(item) = items.get(model.navigation.selected_idx).cloned() {
                let next = match view {
                    View::Clusters => {
                        model.selections.scope_clusters.insert(item);
                        View::Namespaces
                    }
                    View::Namespaces => {
                        model.selections.scope_namespaces.insert(item);
                        View::Projects
                    }
                    View::Projects => {
                        model.selections.scope_projects.insert(item);
                        View::Apps
                    }
                    View::ApplicationSets => {
                        model.selections.scope_application_sets.insert(item);
                        View::Apps
                    }
                    View::Apps | View::Tree => View::Apps,
                };
                model.navigation.go_to(next);
                model.clamp_selection();
            }
        }
    }

    Vec::new()
}

/// Esc semantics in Normal mode: clear the filter first; otherwise drill
/// up one scope level; at clusters clear the cluster scope only.
fn handle_esc(model: &mut Model, now_ms: u64) -> Vec<Task> {
    if !model.navigation.register_esc(now_ms) {
        return Vec::new();
    }
    if !model.search_query.is_empty() {
        model.search_query.clear();
        if model.navigation.view == View::Tree {
            model.tree.set_filter("");
        }
        model.clamp_selection();
        return Vec::new();
    }

    match model.navigation.view {
        View::Tree => {
            if let Some(token) = model.tree_cancel.take() {
                token.cancel();
            }
            model.tree_app = None;
            model.navigation.go_to(View::Apps);
        }
        View::Apps => {
            model.selections.scope_projects.clear();
            model.selections.scope_application_sets.clear();
            model.navigation.go_to(View::Projects);
        }
        View::Projects | View::ApplicationSets => {
            model.selections.scope_namespaces.clear();
            model.navigation.go_to(View::Namespaces);
        }
        View::Namespaces => {
            model.navigation.go_to(View::Clusters);
        }
        View::Clusters => {
            model.selections.scope_clusters.clear();
        }
    }
    model.clamp_selection();

    Vec::new()
}
