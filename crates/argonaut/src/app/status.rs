use tracing::{error, info, warn};

/// Severity of a transient status-line message.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

/// The current single-line status message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

/// Single-slot status service with a log sink.
///
/// Every `set` also writes to the tracing sink so the status history
/// survives in the runtime log after the line is replaced on screen.
#[derive(Debug, Default)]
pub struct StatusService {
    current: Option<StatusMessage>,
}

impl StatusService {
    /// Replaces the current status message.
    pub fn set(&mut self, level: StatusLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            StatusLevel::Info => info!(status = %text),
            StatusLevel::Warn => warn!(status = %text),
            StatusLevel::Error => error!(status = %text),
        }
        self.current = Some(StatusMessage { level, text });
    }

    /// Returns the current status message, if any.
    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    /// Clears the status line.
    pub fn clear(&mut self) {
        self.current = None;
    }
}
