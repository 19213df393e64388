//! Mock window event source for unit testing.
//!
//! Allows tests to inject synthetic [`WindowEvent`]s without requiring a
//! Windows desktop or WinEvent hooks, and to simulate hook installation
//! failure for the degraded poll-only mode.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use super::{HookError, WindowEvent, WindowEventSource};

/// A mock implementation of [`WindowEventSource`] that allows tests to
/// inject events.
pub struct MockWindowEventSource {
    sender: Arc<Mutex<Option<Sender<WindowEvent>>>>,
    fail_on_start: bool,
}

impl MockWindowEventSource {
    /// Creates a new mock event source.
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            fail_on_start: false,
        }
    }

    /// Creates a mock whose `start()` always fails, for exercising the
    /// degraded poll-only fallback.
    pub fn failing() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            fail_on_start: true,
        }
    }

    /// Injects a synthetic event, as if delivered by the OS hook.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: WindowEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .send(event)
                .expect("receiver has been dropped; call start() first");
        } else {
            panic!("MockWindowEventSource::inject_event called before start()");
        }
    }
}

impl Default for MockWindowEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowEventSource for MockWindowEventSource {
    fn start(&self) -> Result<mpsc::Receiver<WindowEvent>, HookError> {
        if self.fail_on_start {
            return Err(HookError::InstallFailed(
                "mock configured to fail".to_string(),
            ));
        }
        let (tx, rx) = mpsc::channel();
        *self.sender.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zone_core::WindowId;

    #[test]
    fn test_mock_event_source_starts_and_receives_events() {
        // Arrange
        let source = MockWindowEventSource::new();
        let rx = source.start().expect("start should succeed");

        // Act
        source.inject_event(WindowEvent::Shown(WindowId::from_raw(7)));

        // Assert
        let event = rx.recv().expect("should receive event");
        assert_eq!(event, WindowEvent::Shown(WindowId::from_raw(7)));
    }

    #[test]
    fn test_mock_event_source_stop_closes_channel() {
        // Arrange
        let source = MockWindowEventSource::new();
        let rx = source.start().expect("start should succeed");

        // Act
        source.stop();

        // Assert – channel should be disconnected
        assert!(rx.recv().is_err(), "channel should be closed after stop()");
    }

    #[test]
    fn test_failing_mock_event_source_reports_install_failure() {
        // Arrange
        let source = MockWindowEventSource::failing();

        // Act
        let result = source.start();

        // Assert
        assert!(matches!(result, Err(HookError::InstallFailed(_))));
    }

    #[test]
    fn test_window_event_exposes_its_window_id() {
        let id = WindowId::from_raw(42);
        assert_eq!(WindowEvent::Shown(id).window(), id);
        assert_eq!(WindowEvent::Hidden(id).window(), id);
        assert_eq!(WindowEvent::Destroyed(id).window(), id);
        assert_eq!(WindowEvent::MoveResizeEnded(id).window(), id);
    }
}
