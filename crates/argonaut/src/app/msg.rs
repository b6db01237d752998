//! The tagged message sum dispatched by the update loop.
//!
//! Every external stimulus (keyboard, resize, server stream, reconciler
//! completion, timer) enters the loop as exactly one [`Msg`] case.
//! Asynchronous results carry the epoch (and, for watch traffic, the
//! generation) in force when their task was dispatched; the update
//! dispatcher discards mismatches before any handler runs.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crossterm::event::KeyEvent;

use crate::domain::app::App;
use crate::domain::rollback::RollbackRow;
use crate::domain::server::Server;
use crate::domain::tree::ResourceNode;
use crate::errors::AppError;
use crate::infra::prefs::Preferences;
use crate::infra::watch::{AppsBatch, ImmediateEvent, WatchQueue};

/// Boxed follow-up task resolving to zero or one further message.
///
/// Long-running producers (watch pipeline, tree stream) capture a sender
/// clone instead and resolve to `None` when they end.
pub type Task = Pin<Box<dyn Future<Output = Option<Msg>> + Send + 'static>>;

/// Wraps a future as a follow-up task.
pub fn task<F>(future: F) -> Task
where
    F: Future<Output = Option<Msg>> + Send + 'static,
{
    Box::pin(future)
}

/// External process the runtime must hand the terminal to.
#[derive(Debug)]
pub enum ExternalRequest {
    /// Page static text through the configured pager.
    Pager { title: String, content: String },
    /// Open the diff viewer with `{left}`/`{right}` expanded to file paths.
    Viewer {
        command: String,
        left: PathBuf,
        right: PathBuf,
    },
    /// Run the PTY-embedded sub-UI with an injected status bar.
    Embedded {
        command: Vec<String>,
        status_text: String,
    },
}

/// Outcome of one reconciler request, per target app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetOutcome {
    pub app_name: String,
    pub result: Result<(), String>,
}

/// A message consumed by one tick of the update loop.
#[derive(Debug)]
pub enum Msg {
    /// A key event routed to the active mode handler.
    Key(KeyEvent),
    /// Terminal resized to (cols, rows).
    Resize(u16, u16),
    /// Spinner/housekeeping tick.
    Tick,
    /// Request to leave the main loop.
    Quit,

    /// Initial or refreshed full app list.
    AppsLoaded { apps: Vec<App>, epoch: u64 },
    /// Full app list load failed.
    AppsLoadFailed { error: AppError, epoch: u64 },

    /// The watch subscription connected and its queue is live.
    WatchStarted {
        queue: WatchQueue,
        epoch: u64,
        generation: u64,
    },
    /// One coalesced batch from the watch pipeline.
    AppsBatchUpdate {
        batch: AppsBatch,
        epoch: u64,
        generation: u64,
    },
    /// An out-of-batch event (auth error, status change, API error).
    WatchImmediate {
        event: ImmediateEvent,
        epoch: u64,
        generation: u64,
    },
    /// The watch queue closed; the consume task is done.
    WatchClosed { epoch: u64, generation: u64 },

    /// Authentication validation finished.
    AuthValidated {
        result: Result<(), AppError>,
        epoch: u64,
    },

    /// A fresh resource forest for one application.
    ResourceTreeLoaded {
        app_name: String,
        nodes: Vec<ResourceNode>,
        epoch: u64,
    },
    /// Resource tree load or stream failure.
    ResourceTreeFailed {
        app_name: String,
        error: AppError,
        epoch: u64,
    },

    /// Diff text ready for the inline viewer; empty lines mean no drift.
    DiffLoaded {
        app_name: String,
        lines: Vec<String>,
        epoch: u64,
        request_id: String,
    },
    DiffFailed {
        app_name: String,
        error: AppError,
        epoch: u64,
        request_id: String,
    },

    /// Sync requests finished for the targeted apps.
    SyncCompleted {
        outcomes: Vec<TargetOutcome>,
        watch_after: bool,
        epoch: u64,
        request_id: String,
    },

    /// Deployment history rows loaded for the rollback overlay.
    RollbackHistoryLoaded {
        app_name: String,
        rows: Vec<RollbackRow>,
        current_revision: Option<String>,
        epoch: u64,
    },
    RollbackHistoryFailed {
        app_name: String,
        error: AppError,
        epoch: u64,
    },
    /// Revision metadata for one history row.
    RollbackMetaLoaded {
        app_name: String,
        id: i64,
        author: Option<String>,
        date: Option<String>,
        message: Option<String>,
        epoch: u64,
    },
    RollbackMetaFailed {
        app_name: String,
        id: i64,
        error: String,
        epoch: u64,
    },
    /// The rollback request finished.
    RollbackCompleted {
        app_name: String,
        result: Result<(), String>,
        watch_after: bool,
        dry_run: bool,
        epoch: u64,
        request_id: String,
    },

    /// Delete requests finished for the targeted apps.
    DeleteCompleted {
        outcomes: Vec<TargetOutcome>,
        epoch: u64,
        request_id: String,
    },

    /// A context switch resolved its new server and config snapshot.
    ContextSwitchResolved {
        context_name: String,
        server: Server,
        context_names: Vec<String>,
        preferences: Preferences,
    },
    /// The requested context cannot be driven or was not found.
    ContextSwitchRejected { reason: String, core: bool },

    /// Latest released version discovered by the upgrade checker.
    UpgradeCheckCompleted {
        latest_version: Option<String>,
        epoch: u64,
    },
    /// The upgrade command finished.
    UpgradeFinished {
        result: Result<String, String>,
        epoch: u64,
    },

    /// The loop must stop drawing; the terminal belongs to a child.
    PauseRendering,
    /// The terminal is back; drawing resumes.
    ResumeRendering,
    /// Hand the terminal to an external process.
    RunExternal(ExternalRequest),
    /// The external process exited.
    ExternalFinished { result: Result<(), String> },
}

impl Msg {
    /// Returns the epoch stamped on this message, when it carries one.
    ///
    /// Messages without an epoch (input, ticks, rendering control, context
    /// switching) are never stale.
    pub fn epoch(&self) -> Option<u64> {
        match self {
            Msg::AppsLoaded { epoch, .. }
            | Msg::AppsLoadFailed { epoch, .. }
            | Msg::WatchStarted { epoch, .. }
            | Msg::AppsBatchUpdate { epoch, .. }
            | Msg::WatchImmediate { epoch, .. }
            | Msg::WatchClosed { epoch, .. }
            | Msg::AuthValidated { epoch, .. }
            | Msg::ResourceTreeLoaded { epoch, .. }
            | Msg::ResourceTreeFailed { epoch, .. }
            | Msg::DiffLoaded { epoch, .. }
            | Msg::DiffFailed { epoch, .. }
            | Msg::SyncCompleted { epoch, .. }
            | Msg::RollbackHistoryLoaded { epoch, .. }
            | Msg::RollbackHistoryFailed { epoch, .. }
            | Msg::RollbackMetaLoaded { epoch, .. }
            | Msg::RollbackMetaFailed { epoch, .. }
            | Msg::RollbackCompleted { epoch, .. }
            | Msg::DeleteCompleted { epoch, .. }
            | Msg::UpgradeCheckCompleted { epoch, .. }
            | Msg::UpgradeFinished { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }

    /// Returns the watch generation stamped on this message, if any.
    pub fn generation(&self) -> Option<u64> {
        match self {
            Msg::AppsBatchUpdate { generation, .. }
            | Msg::WatchImmediate { generation, .. }
            | Msg::WatchClosed { generation, .. } => Some(*generation),
            _ => None,
        }
    }
}
