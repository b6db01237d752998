use thiserror::Error;

/// Failure taxonomy surfaced through the status line and mode machine.
///
/// Reconcilers and watchers convert every failure into one of these at
/// their task boundary; nothing crosses the loop boundary as a panic.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// Token missing or invalid; stops watchers and offers the logs view.
    #[error("authentication required: {0}")]
    AuthRequired(String),

    /// Transport failure: refused, DNS, TLS, timeout, unreachable.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server answered with an error status.
    #[error("server error: {0}")]
    Api(String),

    /// User-visible invalid input; surfaced via status, no mode change.
    #[error("{0}")]
    Validation(String),

    /// Stream dropped; the watcher reconnects with backoff.
    #[error("stream interrupted: {0}")]
    TransientStream(String),

    /// Unrecoverable setup failure or handler panic.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl AppError {
    /// Returns `true` for failures that demand the auth-required mode.
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::AuthRequired(_))
    }

    /// Returns `true` for failures that demand the connection-error mode.
    pub fn is_connection(&self) -> bool {
        matches!(self, AppError::Connection(_))
    }
}
