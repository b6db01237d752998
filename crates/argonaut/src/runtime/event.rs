use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{Event, KeyEventKind};
use tokio::sync::mpsc;

use crate::app::msg::Msg;

/// Reads terminal events from an underlying event backend.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait EventSource: Send + Sync + 'static {
    /// Polls for an available event.
    fn poll(&self, timeout: Duration) -> io::Result<bool>;

    /// Reads the next available event.
    fn read(&self) -> io::Result<Event>;
}

struct CrosstermEventSource;

impl EventSource for CrosstermEventSource {
    fn poll(&self, timeout: Duration) -> io::Result<bool> {
        crossterm::event::poll(timeout)
    }

    fn read(&self) -> io::Result<Event> {
        crossterm::event::read()
    }
}

/// Spawns the dedicated input-reader thread.
///
/// The thread converts terminal events to loop messages. While `suspend`
/// is set (terminal handed to a child process) it stops polling entirely
/// so keystrokes reach the child instead of the loop.
pub(crate) fn spawn_event_reader(
    msg_tx: mpsc::UnboundedSender<Msg>,
    shutdown: Arc<AtomicBool>,
    suspend: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    let event_source: Arc<dyn EventSource> = Arc::new(CrosstermEventSource);

    spawn_event_reader_with_source(event_source, msg_tx, shutdown, suspend)
}

fn spawn_event_reader_with_source(
    event_source: Arc<dyn EventSource>,
    msg_tx: mpsc::UnboundedSender<Msg>,
    shutdown: Arc<AtomicBool>,
    suspend: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            if suspend.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }

            match event_source.poll(Duration::from_millis(50)) {
                Ok(true) => {
                    let Ok(event) = event_source.read() else {
                        break;
                    };
                    let msg = match event {
                        Event::Key(key) if key.kind != KeyEventKind::Release => {
                            Some(Msg::Key(key))
                        }
                        Event::Resize(cols, rows) => Some(Msg::Resize(cols, rows)),
                        _ => None,
                    };
                    if let Some(msg) = msg {
                        if msg_tx.send(msg).is_err() {
                            break;
                        }
                    }
                }
                Ok(false) => {}
                Err(_) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use mockall::Sequence;
    use mockall::predicate::eq;

    use super::*;

    #[tokio::test]
    async fn test_key_events_are_forwarded_as_messages() {
        // Arrange
        let mut mock_source = MockEventSource::new();
        let mut sequence = Sequence::new();
        mock_source
            .expect_poll()
            .with(eq(Duration::from_millis(50)))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(true));
        mock_source
            .expect_read()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| {
                Ok(Event::Key(KeyEvent::new(
                    KeyCode::Char('j'),
                    KeyModifiers::NONE,
                )))
            });
        mock_source
            .expect_poll()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Err(io::Error::new(ErrorKind::Interrupted, "stop")));
        let event_source: Arc<dyn EventSource> = Arc::new(mock_source);
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let suspend = Arc::new(AtomicBool::new(false));

        // Act
        let join_handle =
            spawn_event_reader_with_source(event_source, msg_tx, shutdown, suspend);
        let received = tokio::time::timeout(Duration::from_secs(1), msg_rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("failed to receive message");
        join_handle.join().expect("failed to join reader thread");

        // Assert
        assert!(matches!(received, Msg::Key(_)));
    }

    #[tokio::test]
    async fn test_resize_events_become_resize_messages() {
        // Arrange
        let mut mock_source = MockEventSource::new();
        let mut sequence = Sequence::new();
        mock_source
            .expect_poll()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(true));
        mock_source
            .expect_read()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|| Ok(Event::Resize(120, 40)));
        mock_source
            .expect_poll()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Err(io::Error::new(ErrorKind::Interrupted, "stop")));
        let event_source: Arc<dyn EventSource> = Arc::new(mock_source);
        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel();

        // Act
        let join_handle = spawn_event_reader_with_source(
            event_source,
            msg_tx,
            Arc::new(AtomicBool::new(false)),
            Arc::new(AtomicBool::new(false)),
        );
        let received = tokio::time::timeout(Duration::from_secs(1), msg_rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("failed to receive message");
        join_handle.join().expect("failed to join reader thread");

        // Assert
        assert!(matches!(received, Msg::Resize(120, 40)));
    }

    #[test]
    fn test_reader_stops_when_receiver_is_dropped() {
        // Arrange
        let mut mock_source = MockEventSource::new();
        mock_source.expect_poll().times(1).returning(|_| Ok(true));
        mock_source.expect_read().times(1).returning(|| {
            Ok(Event::Key(KeyEvent::new(
                KeyCode::Char('x'),
                KeyModifiers::NONE,
            )))
        });
        let event_source: Arc<dyn EventSource> = Arc::new(mock_source);
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        drop(msg_rx);

        // Act
        let join_handle = spawn_event_reader_with_source(
            event_source,
            msg_tx,
            Arc::new(AtomicBool::new(false)),
            Arc::new(AtomicBool::new(false)),
        );

        // Assert
        assert!(join_handle.join().is_ok());
    }

    #[test]
    fn test_shutdown_flag_stops_the_reader_without_polling() {
        // Arrange
        let mock_source = MockEventSource::new();
        let event_source: Arc<dyn EventSource> = Arc::new(mock_source);
        let (msg_tx, _msg_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(AtomicBool::new(true));

        // Act
        let join_handle = spawn_event_reader_with_source(
            event_source,
            msg_tx,
            shutdown,
            Arc::new(AtomicBool::new(false)),
        );

        // Assert: no poll expectations were set, so an early poll panics
        assert!(join_handle.join().is_ok());
    }
}
