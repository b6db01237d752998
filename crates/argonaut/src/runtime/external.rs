//! Terminal hand-off around external processes.
//!
//! Sequence: pause rendering, suspend the input reader, release the
//! terminal, run the child to completion, clear, give the TTY driver a
//! moment to settle, reacquire, resume rendering.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::app::msg::{ExternalRequest, Msg};
use crate::app::{Model, update};
use crate::infra::{embedded, pager};
use crate::runtime::TuiTerminal;

/// Delay after the child exits, letting the TTY driver settle before the
/// alternate screen comes back.
const TTY_SETTLE: Duration = Duration::from_millis(150);

pub(crate) async fn run(
    model: &mut Model,
    terminal: &mut TuiTerminal,
    suspend_input: &Arc<AtomicBool>,
    request: ExternalRequest,
) -> io::Result<()> {
    let _ = update::update(model, Msg::PauseRendering);
    suspend_input.store(true, Ordering::Relaxed);
    crate::runtime::terminal::release(terminal)?;

    let result = tokio::task::spawn_blocking(move || match request {
        ExternalRequest::Pager { content, .. } => pager::run_pager(&content),
        ExternalRequest::Viewer {
            command,
            left,
            right,
        } => pager::run_viewer(&command, &left, &right),
        ExternalRequest::Embedded {
            command,
            status_text,
        } => embedded::run_embedded(&command, &status_text),
    })
    .await
    .unwrap_or_else(|join_error| Err(join_error.to_string()));

    tokio::time::sleep(TTY_SETTLE).await;
    crate::runtime::terminal::reacquire(terminal)?;
    suspend_input.store(false, Ordering::Relaxed);
    let _ = update::update(model, Msg::ResumeRendering);
    let _ = update::update(model, Msg::ExternalFinished { result });

    Ok(())
}
