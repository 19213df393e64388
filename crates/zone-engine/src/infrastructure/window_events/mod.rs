//! Window lifecycle event infrastructure.
//!
//! On Windows, this installs a WinEvent hook (`SetWinEventHook`) on a
//! dedicated Win32 message loop thread and forwards window show/hide/destroy
//! and move-size-end notifications into an `mpsc` channel consumed by the
//! enforcement workers.
//!
//! # Windows-Specific Implementation
//!
//! WinEvent callbacks run on the hook thread's message loop and must return
//! quickly; all processing is deferred out of the callback via the channel.
//!
//! # Testability
//!
//! The `WindowEventSource` trait allows unit tests to inject synthetic
//! events without requiring a Windows desktop.

use std::sync::mpsc;

use zone_core::WindowId;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// A window lifecycle event produced by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowEvent {
    /// A top-level window became visible (created or un-hidden).
    Shown(WindowId),
    /// A top-level window was hidden.
    Hidden(WindowId),
    /// A top-level window was destroyed.
    Destroyed(WindowId),
    /// The user finished an interactive move or resize of a window.
    MoveResizeEnded(WindowId),
}

impl WindowEvent {
    /// The window this event refers to.
    pub fn window(&self) -> WindowId {
        match self {
            WindowEvent::Shown(id)
            | WindowEvent::Hidden(id)
            | WindowEvent::Destroyed(id)
            | WindowEvent::MoveResizeEnded(id) => *id,
        }
    }
}

/// Error type for event source operations.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("failed to install WinEvent hook: {0}")]
    InstallFailed(String),
    #[error("event source has already been started")]
    AlreadyStarted,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Trait abstracting window event production.
///
/// The production implementation uses WinEvent hooks; tests use
/// [`mock::MockWindowEventSource`]. When `start` fails the engine falls back
/// to a poll-only degraded mode rather than aborting.
pub trait WindowEventSource: Send + Sync {
    /// Starts the event source and returns a receiver for window events.
    fn start(&self) -> Result<mpsc::Receiver<WindowEvent>, HookError>;
    /// Stops the event source and releases all OS resources.
    fn stop(&self);
}
