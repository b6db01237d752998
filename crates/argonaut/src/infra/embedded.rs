//! PTY-hosted sub-UI with an injected status bar.
//!
//! The child runs in a PTY one row shorter than the real terminal; its
//! output streams to the host stdout through a transformer that paints a
//! persistent status bar on the bottom row at frame boundaries. Frame
//! boundaries are clear-screen (`CSI 2J`, bar written after) and
//! cursor-home (`CSI H` / `CSI ;H` / `CSI 1;1H`, bar written before).
//! Host resizes reach the child as SIGWINCH with rows−1 through the PTY
//! resize ioctl; the host size is watched rather than signal-handled
//! because crossterm owns the process's SIGWINCH handler.

use std::io::{Read, Write};

use portable_pty::{CommandBuilder, PtySize, native_pty_system};
use tracing::debug;

/// Environment variable overriding the embedded sub-UI command.
pub const K9S_COMMAND_ENV: &str = "ARGONAUT_K9S_COMMAND";

/// Environment variable naming the kube context passed to the sub-UI.
pub const K9S_CONTEXT_ENV: &str = "ARGONAUT_K9S_CONTEXT";

const ESC: u8 = 0x1b;

/// Rewrites a PTY output stream, injecting the status bar at frame
/// boundaries.
///
/// Sequences split across read chunks are carried over between calls, so
/// the injector can be fed arbitrarily sized chunks.
pub struct StatusBarInjector {
    rows: u16,
    status_text: String,
    carry: Vec<u8>,
}

impl StatusBarInjector {
    /// Creates an injector for a terminal with `rows` total rows.
    pub fn new(rows: u16, status_text: impl Into<String>) -> Self {
        Self {
            rows,
            status_text: status_text.into(),
            carry: Vec::new(),
        }
    }

    /// Updates the row count after a resize.
    pub fn set_rows(&mut self, rows: u16) {
        self.rows = rows;
    }

    fn injection(&self) -> Vec<u8> {
        // Save cursor, paint the bottom row, restore cursor.
        let mut bytes = Vec::with_capacity(self.status_text.len() + 24);
        bytes.extend_from_slice(b"\x1b7");
        bytes.extend_from_slice(format!("\x1b[{};1H", self.rows).as_bytes());
        bytes.extend_from_slice(b"\x1b[2K");
        bytes.extend_from_slice(self.status_text.as_bytes());
        bytes.extend_from_slice(b"\x1b8");

        bytes
    }

    /// Transforms one output chunk.
    pub fn transform(&mut self, chunk: &[u8]) -> Vec<u8> {
        let mut input = std::mem::take(&mut self.carry);
        input.extend_from_slice(chunk);

        let mut output = Vec::with_capacity(input.len() + 64);
        let mut position = 0;
        while position < input.len() {
            let byte = input[position];
            if byte != ESC {
                output.push(byte);
                position += 1;
                continue;
            }
            match classify_sequence(&input[position..]) {
                Classified::ClearScreen(len) => {
                    output.extend_from_slice(&input[position..position + len]);
                    output.extend_from_slice(&self.injection());
                    position += len;
                }
                Classified::CursorHome(len) => {
                    output.extend_from_slice(&self.injection());
                    output.extend_from_slice(&input[position..position + len]);
                    position += len;
                }
                Classified::Other(len) => {
                    output.extend_from_slice(&input[position..position + len]);
                    position += len;
                }
                Classified::Incomplete => {
                    // Keep the partial sequence for the next chunk.
                    self.carry = input[position..].to_vec();
                    return output;
                }
            }
        }

        output
    }

    /// Flushes any trailing partial sequence unchanged.
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.carry)
    }
}

enum Classified {
    ClearScreen(usize),
    CursorHome(usize),
    Other(usize),
    Incomplete,
}

/// Classifies the escape sequence starting at `bytes[0] == ESC`.
fn classify_sequence(bytes: &[u8]) -> Classified {
    if bytes.len() < 2 {
        return Classified::Incomplete;
    }
    if bytes[1] != b'[' {
        // Two-byte escape (ESC 7, ESC 8, ESC c, …).
        return Classified::Other(2);
    }
    // CSI: parameters then a final byte in 0x40..=0x7e.
    let mut index = 2;
    while index < bytes.len() {
        let byte = bytes[index];
        if (0x40..=0x7e).contains(&byte) {
            let params = &bytes[2..index];
            let len = index + 1;
            return match byte {
                b'J' if params == b"2" => Classified::ClearScreen(len),
                b'H' if params.is_empty() || params == b";" || params == b"1;1" => {
                    Classified::CursorHome(len)
                }
                _ => Classified::Other(len),
            };
        }
        index += 1;
    }

    Classified::Incomplete
}

/// Resolves the sub-UI command line from the environment.
pub fn embedded_command() -> Vec<String> {
    let mut command: Vec<String> = std::env::var(K9S_COMMAND_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map_or_else(
            || vec!["k9s".to_string()],
            |value| value.split_whitespace().map(str::to_string).collect(),
        );
    if let Ok(context) = std::env::var(K9S_CONTEXT_ENV) {
        if !context.trim().is_empty() {
            command.push("--context".to_string());
            command.push(context);
        }
    }

    command
}

/// Runs the embedded sub-UI until it exits. Blocking; the caller has
/// already released the terminal and suspended its own input reader.
///
/// The stdin forwarder thread cannot be interrupted while blocked on a
/// read; it exits on the first keystroke after the child terminates,
/// which is harmless because it only writes into a dead PTY.
///
/// # Errors
/// Returns an error description when the PTY or child cannot be set up.
pub fn run_embedded(command: &[String], status_text: &str) -> Result<(), String> {
    let (cols, rows) = crossterm::terminal::size().map_err(|e| format!("terminal size: {e}"))?;
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: rows.saturating_sub(1),
            cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| format!("open pty: {e}"))?;

    let Some((program, args)) = command.split_first() else {
        return Err("empty embedded command".to_string());
    };
    let mut builder = CommandBuilder::new(program);
    builder.args(args);
    let mut child = pair
        .slave
        .spawn_command(builder)
        .map_err(|e| format!("spawn {program}: {e}"))?;
    drop(pair.slave);

    let mut pty_writer = pair
        .master
        .take_writer()
        .map_err(|e| format!("pty writer: {e}"))?;
    let mut pty_reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| format!("pty reader: {e}"))?;

    // Forward host stdin to the child.
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin();
        let mut buffer = [0u8; 1024];
        loop {
            match stdin.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(read) => {
                    if pty_writer.write_all(&buffer[..read]).is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Forward resizes to the child with one row held back for the bar.
    let master = pair.master;
    let resize_done = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let resize_flag = std::sync::Arc::clone(&resize_done);
    let resize_thread = std::thread::spawn(move || {
        let mut last = (cols, rows);
        while !resize_flag.load(std::sync::atomic::Ordering::Relaxed) {
            std::thread::sleep(std::time::Duration::from_millis(250));
            let Ok(current) = crossterm::terminal::size() else {
                continue;
            };
            if current != last {
                last = current;
                let _ = master.resize(PtySize {
                    rows: current.1.saturating_sub(1),
                    cols: current.0,
                    pixel_width: 0,
                    pixel_height: 0,
                });
            }
        }
    });

    // Pump child output to the host, injecting the bar at frame
    // boundaries.
    let mut injector = StatusBarInjector::new(rows, status_text);
    let mut stdout = std::io::stdout();
    let mut buffer = [0u8; 4096];
    loop {
        match pty_reader.read(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(read) => {
                if let Ok(current) = crossterm::terminal::size() {
                    injector.set_rows(current.1);
                }
                let transformed = injector.transform(&buffer[..read]);
                if stdout.write_all(&transformed).is_err() {
                    break;
                }
                let _ = stdout.flush();
            }
        }
    }
    let _ = stdout.write_all(&injector.finish());
    let _ = stdout.flush();

    resize_done.store(true, std::sync::atomic::Ordering::Relaxed);
    let _ = resize_thread.join();
    match child.wait() {
        Ok(status) => debug!(?status, "embedded sub-UI exited"),
        Err(e) => debug!(error = %e, "embedded sub-UI wait failed"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn injection_for(rows: u16, text: &str) -> Vec<u8> {
        StatusBarInjector::new(rows, text).injection()
    }

    #[test]
    fn test_status_bar_written_after_clear_screen() {
        // Arrange
        let mut injector = StatusBarInjector::new(24, "argonaut | k9s");

        // Act
        let output = injector.transform(b"\x1b[2Jhello");

        // Assert
        let mut expected = b"\x1b[2J".to_vec();
        expected.extend_from_slice(&injection_for(24, "argonaut | k9s"));
        expected.extend_from_slice(b"hello");
        assert_eq!(output, expected);
    }

    #[test]
    fn test_status_bar_written_before_cursor_home() {
        // Arrange
        let mut injector = StatusBarInjector::new(24, "bar");

        // Act
        for home in [b"\x1b[H".as_slice(), b"\x1b[;H", b"\x1b[1;1H"] {
            let output = injector.transform(home);

            // Assert
            let mut expected = injection_for(24, "bar");
            expected.extend_from_slice(home);
            assert_eq!(output, expected);
        }
    }

    #[test]
    fn test_cursor_moves_elsewhere_pass_through_untouched() {
        // Arrange
        let mut injector = StatusBarInjector::new(24, "bar");

        // Act: an absolute move that is not home, plus colors
        let input = b"\x1b[10;5H\x1b[31mred\x1b[0m";
        let output = injector.transform(input);

        // Assert
        assert_eq!(output, input.to_vec());
    }

    #[test]
    fn test_sequence_split_across_chunks_is_reassembled() {
        // Arrange
        let mut injector = StatusBarInjector::new(24, "bar");

        // Act: clear-screen split in the middle of the CSI
        let first = injector.transform(b"abc\x1b[2");
        let second = injector.transform(b"Jdef");

        // Assert
        assert_eq!(first, b"abc".to_vec());
        let mut expected = b"\x1b[2J".to_vec();
        expected.extend_from_slice(&injection_for(24, "bar"));
        expected.extend_from_slice(b"def");
        assert_eq!(second, expected);
    }

    #[test]
    fn test_injection_saves_and_restores_cursor() {
        // Act
        let bytes = injection_for(40, "status");
        let text = String::from_utf8(bytes).expect("non-utf8 injection");

        // Assert
        assert!(text.starts_with("\x1b7"));
        assert!(text.contains("\x1b[40;1H"));
        assert!(text.contains("\x1b[2K"));
        assert!(text.contains("status"));
        assert!(text.ends_with("\x1b8"));
    }

    #[test]
    fn test_injected_bar_lands_on_the_bottom_row() {
        // Arrange: a vt100 screen the size of the host terminal
        let mut parser = vt100::Parser::new(10, 40, 0);
        let mut injector = StatusBarInjector::new(10, "argonaut status");

        // Act: child clears and draws a frame
        let output = injector.transform(b"\x1b[2Jchild content");
        parser.process(&output);

        // Assert: bottom row carries the bar, child content is on top
        let screen = parser.screen();
        let row_text = |row: u16| -> String {
            (0..40)
                .filter_map(|col| screen.cell(row, col))
                .map(vt100::Cell::contents)
                .collect()
        };
        assert!(row_text(9).contains("argonaut status"));
        assert!(row_text(0).contains("child content"));
    }

    #[test]
    fn test_finish_flushes_partial_sequence() {
        // Arrange
        let mut injector = StatusBarInjector::new(24, "bar");
        let _ = injector.transform(b"\x1b[2");

        // Act
        let tail = injector.finish();

        // Assert
        assert_eq!(tail, b"\x1b[2".to_vec());
    }
}
