//! Window-system adapter: monitor/window queries, window positioning, and
//! cursor clipping.
//!
//! The [`WindowSystem`] trait is the engine's only route to the desktop.
//! All methods are synchronous because the underlying OS calls are; every
//! method is fallible because any window may vanish between the event that
//! named it and the call that touches it.
//!
//! # Testability
//!
//! The production implementation wraps Win32; unit and integration tests
//! inject [`mock::MockWindowSystem`], an in-memory desktop that records
//! every write issued by the engine.

use zone_core::{Monitor, Rect, WindowId, WindowSnapshot};

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for window-system operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("window {} no longer exists", .0.as_raw())]
    WindowGone(WindowId),
    #[error("monitor enumeration failed: {0}")]
    MonitorQuery(String),
    #[error("window operation failed: {0}")]
    WindowOp(String),
    #[error("cursor clip operation failed: {0}")]
    CursorClip(String),
}

/// Trait abstracting the OS window table and cursor.
///
/// Implementations must be safe to call from any of the engine's worker
/// threads concurrently.
pub trait WindowSystem: Send + Sync {
    /// Returns a snapshot of all connected monitors, primary first.
    fn enumerate_monitors(&self) -> Result<Vec<Monitor>, PlatformError>;

    /// Returns snapshots of all top-level windows, in z-order.
    fn enumerate_windows(&self) -> Result<Vec<WindowSnapshot>, PlatformError>;

    /// Returns the current snapshot of one window.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::WindowGone`] when the handle is stale.
    fn window_snapshot(&self, id: WindowId) -> Result<WindowSnapshot, PlatformError>;

    /// Returns the window currently holding foreground focus, if any.
    fn foreground_window(&self) -> Result<Option<WindowId>, PlatformError>;

    /// Returns `true` when the window is maximized.
    fn is_maximized(&self, id: WindowId) -> Result<bool, PlatformError>;

    /// Restores a maximized window to its normal state.
    fn restore_window(&self, id: WindowId) -> Result<(), PlatformError>;

    /// Moves/resizes a single window to `rect`.
    fn position_window(&self, id: WindowId, rect: Rect) -> Result<(), PlatformError>;

    /// Applies a whole tiling assignment in one batched, flicker-free
    /// operation: all windows move together or none do.
    fn position_windows(&self, assignment: &[(WindowId, Rect)]) -> Result<(), PlatformError>;

    /// Constrains the cursor to `rect`, or releases the constraint back to
    /// the full virtual desktop when `rect` is `None`.
    fn clip_cursor(&self, rect: Option<Rect>) -> Result<(), PlatformError>;

    /// The bounding rectangle of the entire virtual desktop.
    fn virtual_screen_rect(&self) -> Rect;
}
