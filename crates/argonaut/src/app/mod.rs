//! App-layer composition root: the single state aggregate and its
//! update/dispatch machinery.
//!
//! Only the loop task mutates [`Model`]; background tasks communicate
//! exclusively through [`msg::Msg`] values sent on the loop channel.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::app::{App, AppIndex, SortPreference, sort_apps};
use crate::domain::diff::DiffState;
use crate::domain::modals::Modals;
use crate::domain::mode::Mode;
use crate::domain::navigation::{Navigation, View};
use crate::domain::rollback::RollbackState;
use crate::domain::selection::{Selections, visible_apps};
use crate::domain::server::Server;
use crate::domain::tree::TreeModel;
use crate::infra::api::{ApiClient, TlsOptions};
use crate::infra::prefs::Preferences;
use crate::infra::watch::WatchQueue;

pub mod autocomplete;
pub mod command;
pub mod context;
pub mod msg;
pub mod reconcile;
pub mod status;
pub mod update;
pub mod watch;

pub use status::{StatusLevel, StatusService};

/// Process-wide configuration fixed at startup.
///
/// Carried whole across context switches together with the terminal size,
/// ready flag, context names, and the loop sender.
#[derive(Clone, Debug)]
pub struct Startup {
    pub config_path: PathBuf,
    pub prefs_path: PathBuf,
    pub tls: TlsOptions,
    pub theme_override: Option<String>,
    pub log_path: PathBuf,
}

/// The single mutable world threaded through the update loop.
pub struct Model {
    // Carried over on context switch.
    pub startup: Startup,
    pub terminal_size: (u16, u16),
    pub ready: bool,
    pub context_names: Vec<String>,
    pub msg_tx: mpsc::UnboundedSender<msg::Msg>,

    // Per-context world, reset on switch.
    pub context_name: Option<String>,
    pub server: Option<Server>,
    pub api: Option<Arc<dyn ApiClient>>,
    pub epoch: u64,
    pub watch_generation: u64,
    pub watch_queue: Option<WatchQueue>,
    /// Stops the forwarder, closing the internal queue.
    pub watch_forward_cancel: Option<CancellationToken>,
    /// Stops the subscribe task, closing the upstream stream.
    pub watch_subscribe_cancel: Option<CancellationToken>,
    pub tree_cancel: Option<CancellationToken>,

    pub apps: Vec<App>,
    pub index: AppIndex,
    pub selections: Selections,
    pub navigation: Navigation,
    pub mode: Mode,
    pub modals: Modals,
    pub diff: Option<DiffState>,
    pub rollback: Option<RollbackState>,
    pub tree: TreeModel,
    /// App whose resource tree is being streamed while the tree view is up.
    pub tree_app: Option<String>,
    /// Committed search filter; updated live while Search mode is active.
    pub search_query: String,
    pub command_input: String,
    pub status: StatusService,
    pub prefs: Preferences,
    pub sort: SortPreference,
    pub theme_name: String,
    pub in_pager: bool,
    pub spinner_frame: usize,
}

impl Model {
    /// Builds the initial world before any context is selected.
    pub fn new(startup: Startup, msg_tx: mpsc::UnboundedSender<msg::Msg>) -> Self {
        let prefs = crate::infra::prefs::load(&startup.prefs_path);
        let sort = prefs.sort_preference();
        let theme_name = startup
            .theme_override
            .clone()
            .or_else(|| prefs.theme.clone())
            .unwrap_or_else(|| crate::ui::theme::DEFAULT_THEME.to_string());

        let mut model = Self {
            startup,
            terminal_size: (0, 0),
            ready: false,
            context_names: Vec::new(),
            msg_tx,
            context_name: None,
            server: None,
            api: None,
            epoch: 0,
            watch_generation: 0,
            watch_queue: None,
            watch_forward_cancel: None,
            watch_subscribe_cancel: None,
            tree_cancel: None,
            apps: Vec::new(),
            index: AppIndex::default(),
            selections: Selections::default(),
            navigation: Navigation::default(),
            mode: Mode::Loading,
            modals: Modals::default(),
            diff: None,
            rollback: None,
            tree: TreeModel::default(),
            tree_app: None,
            search_query: String::new(),
            command_input: String::new(),
            status: StatusService::default(),
            prefs,
            sort,
            theme_name,
            in_pager: false,
            spinner_frame: 0,
        };
        model.modals.initial_loading = true;

        model
    }

    /// Replaces the app list wholesale, rebuilding the derived index.
    pub fn replace_apps(&mut self, mut apps: Vec<App>) {
        sort_apps(&mut apps, self.sort);
        self.apps = apps;
        self.index = AppIndex::build(&self.apps);
        self.clamp_selection();
    }

    /// Upserts a single app and rebuilds the index.
    pub fn upsert_app(&mut self, app: App) {
        if let Some(existing) = self.apps.iter_mut().find(|a| a.name == app.name) {
            *existing = app;
        } else {
            self.apps.push(app);
        }
        sort_apps(&mut self.apps, self.sort);
        self.index = AppIndex::build(&self.apps);
    }

    /// Removes an app by name and rebuilds the index.
    pub fn remove_app(&mut self, name: &str) {
        self.apps.retain(|app| app.name != name);
        self.selections.selected_apps.remove(name);
        self.index = AppIndex::build(&self.apps);
        self.tree.remove_app(name);
        self.clamp_selection();
    }

    /// The visible app list under current scopes and search filter.
    pub fn visible_apps(&self) -> Vec<&App> {
        visible_apps(&self.apps, &self.selections, &self.search_query)
    }

    /// Items shown by the scope views, narrowed by the live filter.
    pub fn scope_items(&self, view: View) -> Vec<String> {
        let source = match view {
            View::Clusters => &self.index.clusters,
            View::Namespaces => &self.index.namespaces,
            View::Projects => &self.index.projects,
            View::ApplicationSets => &self.index.application_sets,
            View::Apps | View::Tree => return Vec::new(),
        };
        let query = self.search_query.to_lowercase();

        source
            .iter()
            .filter(|item| query.is_empty() || item.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Item count backing the main viewport for the active view.
    pub fn visible_item_count(&self) -> usize {
        match self.navigation.view {
            View::Apps => self.visible_apps().len(),
            View::Tree => self.tree.visible_node_count(),
            view => self.scope_items(view).len(),
        }
    }

    /// Clamps the cursor into the current item range.
    pub fn clamp_selection(&mut self) {
        let count = self.visible_item_count();
        if count == 0 {
            self.navigation.selected_idx = 0;
            self.navigation.scroll_offset = 0;
        } else if self.navigation.selected_idx >= count {
            self.navigation.selected_idx = count - 1;
        }
    }

    /// Name of the app under the cursor in the apps view.
    pub fn selected_app_name(&self) -> Option<String> {
        if self.navigation.view != View::Apps {
            return None;
        }

        self.visible_apps()
            .get(self.navigation.selected_idx)
            .map(|app| app.name.clone())
    }

    /// Target for a destructive action: the multi-select sentinel when a
    /// multi-selection exists, else the app under the cursor.
    pub fn destructive_target(&self) -> Option<String> {
        if !self.selections.selected_apps.is_empty() {
            return Some(crate::domain::modals::MULTI_TARGET.to_string());
        }

        self.selected_app_name()
    }

    /// Resolves a destructive target into concrete app names.
    pub fn resolve_target(&self, target: &str) -> Vec<String> {
        if target == crate::domain::modals::MULTI_TARGET {
            return self.selections.selected_apps.iter().cloned().collect();
        }

        vec![target.to_string()]
    }

    /// Switches the active mode, clearing the scratch state of the mode
    /// being left.
    pub fn enter_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }
        match self.mode {
            Mode::ConfirmSync => self.modals.sync = None,
            Mode::ConfirmAppDelete => self.modals.delete = None,
            Mode::Rollback => self.rollback = None,
            Mode::Diff | Mode::NoDiff => self.diff = None,
            Mode::Command => self.command_input.clear(),
            Mode::UpgradeConfirm | Mode::UpgradeError | Mode::UpgradeSuccess => {
                self.modals.upgrade = None;
            }
            Mode::Error => self.modals.error_message = None,
            _ => {}
        }
        self.mode = mode;
    }

    /// Sets the status line.
    ///
    /// The "no drift" messages double as a completion signal for the diff
    /// loader, so they also clear its loading flag.
    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        let text = text.into();
        if text == "No diffs" || text == "No differences" {
            if let Some(diff) = &mut self.diff {
                diff.loading = false;
            }
        }
        self.status.set(level, text);
    }

    /// Viewport height available to the main list, given current chrome.
    ///
    /// Status bar (1) + footer (1) + block borders (2) + table header (1)
    /// leave five rows of overhead.
    pub fn viewport_height(&self) -> usize {
        usize::from(self.terminal_size.1.saturating_sub(5)).max(1)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a model wired to a fresh channel for handler tests.
    pub(crate) fn test_model() -> (Model, mpsc::UnboundedReceiver<msg::Msg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let startup = Startup {
            config_path: PathBuf::from("/tmp/argonaut-test/config"),
            prefs_path: PathBuf::from("/tmp/argonaut-test/prefs.yaml"),
            tls: TlsOptions::default(),
            theme_override: None,
            log_path: PathBuf::from("/tmp/argonaut-test/log"),
        };
        let mut model = Model::new(startup, tx);
        model.terminal_size = (80, 24);
        model.ready = true;
        model.mode = Mode::Normal;
        model.modals.initial_loading = false;

        (model, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::test_model;
    use super::*;
    use crate::domain::modals::{MULTI_TARGET, SyncModal};

    #[test]
    fn test_replace_apps_rebuilds_index_and_clamps_cursor() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.navigation.selected_idx = 5;
        let mut app = App::named("web");
        app.cluster = Some("prod".to_string());

        // Act
        model.replace_apps(vec![app]);

        // Assert
        assert_eq!(model.index.clusters.len(), 1);
        assert_eq!(model.navigation.selected_idx, 0);
    }

    #[test]
    fn test_destructive_target_prefers_multi_selection() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.replace_apps(vec![App::named("web"), App::named("api")]);
        model.selections.toggle_app("web");
        model.selections.toggle_app("api");

        // Act
        let target = model.destructive_target();

        // Assert
        assert_eq!(target.as_deref(), Some(MULTI_TARGET));
        let mut resolved = model.resolve_target(MULTI_TARGET);
        resolved.sort();
        assert_eq!(resolved, vec!["api".to_string(), "web".to_string()]);
    }

    #[test]
    fn test_enter_mode_clears_scratch_of_left_modal() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.modals.sync = Some(SyncModal::for_target("web"));
        model.mode = Mode::ConfirmSync;

        // Act
        model.enter_mode(Mode::Normal);

        // Assert
        assert!(model.modals.sync.is_none());
        assert_eq!(model.mode, Mode::Normal);
    }

    #[test]
    fn test_no_diffs_status_clears_diff_loading() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.diff = Some(DiffState::loading_for("web"));

        // Act
        model.set_status(StatusLevel::Info, "No diffs");

        // Assert
        assert!(!model.diff.as_ref().expect("diff cleared").loading);
    }

    #[test]
    fn test_remove_app_drops_selection_and_forest() {
        // Arrange
        let (mut model, _rx) = test_model();
        model.replace_apps(vec![App::named("web")]);
        model.selections.toggle_app("web");
        model
            .tree
            .upsert_app_tree("web", vec![]);

        // Act
        model.remove_app("web");

        // Assert
        assert!(model.apps.is_empty());
        assert!(model.selections.selected_apps.is_empty());
        assert!(model.tree.is_empty());
    }
}
