//! External pager and diff-viewer processes.
//!
//! These run with inherited stdio while the loop has released the
//! terminal; callers serialize the hand-off through the pause/resume
//! messages.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Returns the pager command line (`$PAGER`, else `less -R`).
pub fn pager_command() -> (String, Vec<String>) {
    pager_command_from(std::env::var("PAGER").ok())
}

fn pager_command_from(configured: Option<String>) -> (String, Vec<String>) {
    match configured {
        Some(pager) if !pager.trim().is_empty() => {
            let mut parts = pager.split_whitespace().map(str::to_string);
            let program = parts.next().unwrap_or_else(|| "less".to_string());
            (program, parts.collect())
        }
        _ => ("less".to_string(), vec!["-R".to_string()]),
    }
}

/// Pages static content through the external pager. Blocking.
///
/// # Errors
/// Returns the spawn/wait error text.
pub fn run_pager(content: &str) -> Result<(), String> {
    let (program, args) = pager_command();
    let mut child = Command::new(&program)
        .args(&args)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| format!("spawn {program}: {e}"))?;
    if let Some(stdin) = child.stdin.as_mut() {
        // The pager may exit before consuming everything; that is fine.
        let _ = stdin.write_all(content.as_bytes());
    }
    child.wait().map_err(|e| format!("wait {program}: {e}"))?;

    Ok(())
}

/// Runs the external diff viewer over the two manifest files. Blocking.
///
/// The command line is shell-expanded so `{left}`/`{right}` templates with
/// pipes or flags work as configured. Both files are removed afterwards.
///
/// # Errors
/// Returns the spawn/wait error text.
pub fn run_viewer(command: &str, left: &Path, right: &Path) -> Result<(), String> {
    let expanded = crate::infra::diff::expand_viewer_command(
        command,
        &left.display().to_string(),
        &right.display().to_string(),
    );
    let result = Command::new("sh")
        .arg("-c")
        .arg(&expanded)
        .status()
        .map_err(|e| format!("spawn viewer: {e}"));
    let _ = std::fs::remove_file(left);
    let _ = std::fs::remove_file(right);
    result.map(|_| ())
}

/// Pipes text into the configured clipboard command (e.g. `pbcopy`,
/// `xclip -selection clipboard`).
///
/// # Errors
/// Returns the spawn/wait error text.
pub async fn pipe_to_clipboard(command: &str, input: &str) -> Result<(), String> {
    let mut child = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("spawn {command}: {e}"))?;
    if let Some(mut stdin) = child.stdin.take() {
        use tokio::io::AsyncWriteExt;
        stdin
            .write_all(input.as_bytes())
            .await
            .map_err(|e| e.to_string())?;
    }
    let status = child.wait().await.map_err(|e| e.to_string())?;
    if !status.success() {
        return Err(format!("{command} exited with {status}"));
    }

    Ok(())
}
