//! Recording overlay double for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use zone_core::Rect;

use super::{OverlayDisplay, OverlayError};

/// An in-memory overlay that records every show/hide call.
#[derive(Default)]
pub struct MockOverlayDisplay {
    /// Every call in order: `Some(rect)` for show, `None` for hide.
    pub calls: Mutex<Vec<Option<Rect>>>,
    /// When `true`, every call returns an [`OverlayError`].
    pub should_fail: AtomicBool,
}

impl MockOverlayDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent call, if any.
    pub fn last_call(&self) -> Option<Option<Rect>> {
        self.calls.lock().unwrap().last().copied()
    }

    /// `true` when the last call left the overlay visible.
    pub fn is_visible(&self) -> bool {
        matches!(self.last_call(), Some(Some(_)))
    }

    fn fail_if_requested(&self, what: &str) -> Result<(), OverlayError> {
        if self.should_fail.load(Ordering::SeqCst) {
            Err(OverlayError::Thread(format!("mock failure: {what}")))
        } else {
            Ok(())
        }
    }
}

impl OverlayDisplay for MockOverlayDisplay {
    fn show(&self, rect: Rect) -> Result<(), OverlayError> {
        self.fail_if_requested("show")?;
        self.calls.lock().unwrap().push(Some(rect));
        Ok(())
    }

    fn hide(&self) -> Result<(), OverlayError> {
        self.fail_if_requested("hide")?;
        self.calls.lock().unwrap().push(None);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
