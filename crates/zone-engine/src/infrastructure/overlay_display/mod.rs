//! Exclusion-zone overlay rendering.
//!
//! The exclusion zone is made visible as a native, borderless, topmost
//! black window covering the excluded part of the monitor. The window is
//! never activated and is transparent to hit-testing, so it acts as a
//! purely visual wall; keeping windows and the cursor out of the zone is
//! the enforcement workers' job.

use thiserror::Error;

use zone_core::Rect;

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

/// Error type for overlay window operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to create the overlay window: {0}")]
    WindowCreation(String),
    #[error("overlay window thread failed: {0}")]
    Thread(String),
}

/// Trait abstracting the visual overlay window.
///
/// The production implementation owns a native popup window; tests use
/// [`mock::MockOverlayDisplay`].
pub trait OverlayDisplay: Send + Sync {
    /// Shows the overlay covering `rect`, moving it if already visible.
    /// Never steals focus.
    fn show(&self, rect: Rect) -> Result<(), OverlayError>;

    /// Hides the overlay. Idempotent; an overlay that was never shown
    /// stays hidden.
    fn hide(&self) -> Result<(), OverlayError>;
}
