//! The update/render loop.
//!
//! One dedicated loop task owns the terminal and is the sole mutator of
//! the model. Input arrives from a reader thread, background results from
//! spawned follow-up tasks; both converge on one message channel.

use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tracing::error;

use crate::app::msg::{Msg, Task};
use crate::app::{Model, update};
use crate::domain::mode::Mode;
use crate::ui;

mod event;
mod external;
pub mod mode;
mod terminal;

pub(crate) type TuiTerminal = Terminal<CrosstermBackend<io::Stdout>>;

/// Runs the TUI loop until the user quits.
///
/// # Errors
/// Returns an error if terminal setup, rendering, or event processing
/// fails.
pub async fn run(model: &mut Model, msg_rx: &mut mpsc::UnboundedReceiver<Msg>) -> io::Result<()> {
    let _terminal_guard = terminal::TerminalGuard;
    let mut terminal = terminal::setup_terminal()?;
    if let Ok(size) = terminal.size() {
        model.terminal_size = (size.width, size.height);
        model.ready = true;
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let suspend_input = Arc::new(AtomicBool::new(false));
    event::spawn_event_reader(
        model.msg_tx.clone(),
        Arc::clone(&shutdown),
        Arc::clone(&suspend_input),
    );

    let mut tick = tokio::time::interval(Duration::from_millis(100));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let run_result = run_main_loop(model, &mut terminal, msg_rx, &mut tick, &suspend_input).await;

    shutdown.store(true, std::sync::atomic::Ordering::Relaxed);
    terminal.show_cursor()?;

    run_result
}

async fn run_main_loop(
    model: &mut Model,
    terminal: &mut TuiTerminal,
    msg_rx: &mut mpsc::UnboundedReceiver<Msg>,
    tick: &mut tokio::time::Interval,
    suspend_input: &Arc<AtomicBool>,
) -> io::Result<()> {
    loop {
        render_frame(model, terminal)?;

        let msg = tokio::select! {
            biased;
            msg = msg_rx.recv() => match msg {
                Some(msg) => msg,
                None => return Ok(()),
            },
            _ = tick.tick() => Msg::Tick,
        };
        if process(model, terminal, suspend_input, msg).await? {
            return Ok(());
        }

        // Drain queued messages before re-rendering so rapid key presses
        // and bursty results are processed immediately, one frame.
        while let Ok(msg) = msg_rx.try_recv() {
            if process(model, terminal, suspend_input, msg).await? {
                return Ok(());
            }
        }
    }
}

/// Handles one message; returns `true` when the loop should exit.
async fn process(
    model: &mut Model,
    terminal: &mut TuiTerminal,
    suspend_input: &Arc<AtomicBool>,
    msg: Msg,
) -> io::Result<bool> {
    match msg {
        Msg::Quit => return Ok(true),
        // The terminal hand-off needs the terminal itself, which only the
        // loop owns, so it is handled here instead of in the dispatcher.
        Msg::RunExternal(request) => {
            external::run(model, terminal, suspend_input, request).await?;
        }
        msg => {
            let tasks = dispatch_fenced(model, msg);
            spawn_tasks(model, tasks);
        }
    }

    Ok(false)
}

/// Dispatches with a panic fence: a panicking handler becomes a fatal
/// Error mode instead of tearing down the terminal mid-frame.
fn dispatch_fenced(model: &mut Model, msg: Msg) -> Vec<Task> {
    let outcome =
        std::panic::catch_unwind(AssertUnwindSafe(|| update::update(model, msg)));
    match outcome {
        Ok(tasks) => tasks,
        Err(panic) => {
            let text = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            error!(panic = %text, "handler panic caught at loop boundary");
            model.modals.error_message = Some(text);
            model.enter_mode(Mode::Error);
            Vec::new()
        }
    }
}

fn spawn_tasks(model: &Model, tasks: Vec<Task>) {
    for task in tasks {
        let msg_tx = model.msg_tx.clone();
        tokio::spawn(async move {
            if let Some(msg) = task.await {
                let _ = msg_tx.send(msg);
            }
        });
    }
}

fn render_frame(model: &mut Model, terminal: &mut TuiTerminal) -> io::Result<()> {
    if model.in_pager || !model.ready {
        return Ok(());
    }
    terminal.draw(|frame| ui::render(frame, model))?;

    Ok(())
}
