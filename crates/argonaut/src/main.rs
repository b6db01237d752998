use std::io::{self, Write};
use std::process::ExitCode;

use argonaut::app::{Model, Startup, context};
use argonaut::cli::Cli;
use argonaut::{logging, runtime};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // Flag parse errors exit with code 2 via clap.
    let cli = Cli::parse();

    let (log_path, _log_guard) = match logging::init() {
        Ok(initialised) => initialised,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                let _ = writeln!(io::stderr(), "Error: cannot open log file: {e}");
            }
            return ExitCode::FAILURE;
        }
    };

    let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
    let startup = Startup {
        config_path: cli.config_path(),
        prefs_path: argonaut::infra::prefs::prefs_path(),
        tls: cli.tls(),
        theme_override: cli.theme.clone(),
        log_path,
    };
    let mut model = Model::new(startup, msg_tx.clone());

    // Startup is a context switch from nothing: resolve the default
    // context off the loop and let the result enter through the bus.
    let boot = context::resolve_context_task(&model, None);
    tokio::spawn(async move {
        if let Some(msg) = boot.await {
            let _ = msg_tx.send(msg);
        }
    });

    match runtime::run(&mut model, &mut msg_rx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal runtime error");
            #[allow(clippy::print_stderr)]
            {
                let _ = writeln!(io::stderr(), "Error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}
