//! Scratch state for transient modal overlays.
//!
//! Each record is created when its modal opens and cleared when the modal
//! is left, so stale options never leak into the next invocation.

/// Target literal meaning "apply to all currently selected apps".
pub const MULTI_TARGET: &str = "__MULTI__";

/// Propagation policy offered by the delete confirmation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Propagation {
    #[default]
    Foreground,
    Background,
    Orphan,
}

impl Propagation {
    /// Returns the wire label sent to the server.
    pub fn label(self) -> &'static str {
        match self {
            Propagation::Foreground => "foreground",
            Propagation::Background => "background",
            Propagation::Orphan => "orphan",
        }
    }

    /// Cycles to the next policy.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Propagation::Foreground => Propagation::Background,
            Propagation::Background => Propagation::Orphan,
            Propagation::Orphan => Propagation::Foreground,
        }
    }
}

/// Button focus inside the sync confirmation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SyncButton {
    #[default]
    Sync,
    Cancel,
}

/// Options captured while the sync confirmation is open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncModal {
    pub target: String,
    pub prune: bool,
    pub watch: bool,
    pub selected: SyncButton,
}

impl SyncModal {
    /// Opens the modal for the given target with default options.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            prune: false,
            watch: false,
            selected: SyncButton::Sync,
        }
    }
}

/// Options captured while the delete confirmation is open.
///
/// `confirmation_key` buffers the keystroke gate: the destructive action
/// fires only on an explicit `y`/`Y`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteModal {
    pub target: String,
    pub cascade: bool,
    pub propagation: Propagation,
    pub confirmation_key: String,
    pub error: Option<String>,
}

impl DeleteModal {
    /// Opens the modal for the given target with cascade enabled.
    pub fn for_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            cascade: true,
            propagation: Propagation::default(),
            confirmation_key: String::new(),
            error: None,
        }
    }
}

/// Upgrade flow state shown by the UpgradeConfirm/Error/Success modes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpgradeModal {
    pub latest_version: String,
    pub loading: bool,
    pub error: Option<String>,
    pub changelog: Option<String>,
}

/// Transient flags and one-shot messages that are not tied to one modal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Modals {
    pub sync: Option<SyncModal>,
    pub delete: Option<DeleteModal>,
    pub upgrade: Option<UpgradeModal>,
    pub initial_loading: bool,
    pub default_view_warning: Option<String>,
    pub whats_new: Option<String>,
    pub error_message: Option<String>,
    /// Theme picker cursor.
    pub theme_selected: usize,
    /// Theme active before the picker opened, restored on Esc.
    pub theme_revert: Option<String>,
}
