//! Mock window system for unit and integration testing.
//!
//! # Why a mock desktop?
//!
//! The real [`WindowSystem`](super::WindowSystem) implementation makes Win32
//! calls that require a live desktop session and actually move windows and
//! clip the cursor on the test machine.  `MockWindowSystem` replaces the OS
//! with an in-memory window table: reads are answered from stored
//! snapshots, and every write the engine issues is recorded in a
//! `Mutex<Vec<...>>` so tests can assert exactly what was applied and in
//! what order.
//!
//! # Concurrency instrumentation
//!
//! `position_window` tracks how many calls are inside it simultaneously and
//! remembers the high-water mark.  Combined with an artificial
//! `position_delay`, this lets the mutual-exclusion tests prove that the
//! correction gate never admits two corrections at once.
//!
//! # `should_fail` flag
//!
//! Set `should_fail` to make every write return a [`PlatformError`],
//! exercising the callers' swallow-and-retry error paths.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use zone_core::{Monitor, Rect, WindowId, WindowSnapshot};

use super::{PlatformError, WindowSystem};

/// An in-memory window system that records all writes.
#[derive(Default)]
pub struct MockWindowSystem {
    /// The simulated monitor list.
    pub monitors: Mutex<Vec<Monitor>>,
    /// The simulated top-level window table, in z-order.
    pub windows: Mutex<Vec<WindowSnapshot>>,
    /// The simulated foreground window.
    pub foreground: Mutex<Option<WindowId>>,
    /// Windows currently in the maximized state.
    pub maximized: Mutex<HashSet<WindowId>>,

    /// Records each single-window move issued by the engine.
    pub position_calls: Mutex<Vec<(WindowId, Rect)>>,
    /// Records each batched tiling application, one entry per batch.
    pub batch_calls: Mutex<Vec<Vec<(WindowId, Rect)>>>,
    /// Records each cursor clip call (`None` = released to the desktop).
    pub clip_calls: Mutex<Vec<Option<Rect>>>,
    /// Records each restore-from-maximized call.
    pub restore_calls: Mutex<Vec<WindowId>>,

    /// When `true`, every write returns a [`PlatformError`].
    pub should_fail: AtomicBool,
    /// Artificial latency inside `position_window`, for concurrency tests.
    pub position_delay: Mutex<Duration>,
    /// Number of `position_window` calls currently executing.
    in_position: AtomicUsize,
    /// High-water mark of concurrent `position_window` calls.
    pub max_concurrent_positions: AtomicUsize,
}

impl MockWindowSystem {
    /// Creates an empty mock desktop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a monitor to the simulated layout.
    pub fn add_monitor(&self, monitor: Monitor) {
        self.monitors.lock().unwrap().push(monitor);
    }

    /// Inserts or replaces a window snapshot in the simulated table.
    pub fn put_window(&self, snapshot: WindowSnapshot) {
        let mut windows = self.windows.lock().unwrap();
        if let Some(existing) = windows.iter_mut().find(|w| w.id == snapshot.id) {
            *existing = snapshot;
        } else {
            windows.push(snapshot);
        }
    }

    /// Removes a window from the simulated table (window destroyed).
    pub fn remove_window(&self, id: WindowId) {
        self.windows.lock().unwrap().retain(|w| w.id != id);
        self.maximized.lock().unwrap().remove(&id);
    }

    pub fn set_foreground(&self, id: Option<WindowId>) {
        *self.foreground.lock().unwrap() = id;
    }

    pub fn set_maximized(&self, id: WindowId) {
        self.maximized.lock().unwrap().insert(id);
    }

    /// Current rect of a simulated window, if present.
    pub fn window_rect(&self, id: WindowId) -> Option<Rect> {
        self.windows.lock().unwrap().iter().find(|w| w.id == id).map(|w| w.rect)
    }

    /// The most recent cursor clip call, if any.
    pub fn last_clip(&self) -> Option<Option<Rect>> {
        self.clip_calls.lock().unwrap().last().copied()
    }

    fn fail_if_requested(&self, what: &str) -> Result<(), PlatformError> {
        if self.should_fail.load(Ordering::SeqCst) {
            Err(PlatformError::WindowOp(format!("mock failure: {what}")))
        } else {
            Ok(())
        }
    }
}

impl WindowSystem for MockWindowSystem {
    fn enumerate_monitors(&self) -> Result<Vec<Monitor>, PlatformError> {
        Ok(self.monitors.lock().unwrap().clone())
    }

    fn enumerate_windows(&self) -> Result<Vec<WindowSnapshot>, PlatformError> {
        Ok(self.windows.lock().unwrap().clone())
    }

    fn window_snapshot(&self, id: WindowId) -> Result<WindowSnapshot, PlatformError> {
        self.windows
            .lock()
            .unwrap()
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or(PlatformError::WindowGone(id))
    }

    fn foreground_window(&self) -> Result<Option<WindowId>, PlatformError> {
        Ok(*self.foreground.lock().unwrap())
    }

    fn is_maximized(&self, id: WindowId) -> Result<bool, PlatformError> {
        Ok(self.maximized.lock().unwrap().contains(&id))
    }

    fn restore_window(&self, id: WindowId) -> Result<(), PlatformError> {
        self.fail_if_requested("restore_window")?;
        self.maximized.lock().unwrap().remove(&id);
        self.restore_calls.lock().unwrap().push(id);
        Ok(())
    }

    fn position_window(&self, id: WindowId, rect: Rect) -> Result<(), PlatformError> {
        self.fail_if_requested("position_window")?;

        // Track concurrent entries for the mutual-exclusion tests.
        let now = self.in_position.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_positions.fetch_max(now, Ordering::SeqCst);

        let delay = *self.position_delay.lock().unwrap();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        {
            let mut windows = self.windows.lock().unwrap();
            if let Some(w) = windows.iter_mut().find(|w| w.id == id) {
                w.rect = rect;
            }
        }
        self.position_calls.lock().unwrap().push((id, rect));

        self.in_position.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn position_windows(&self, assignment: &[(WindowId, Rect)]) -> Result<(), PlatformError> {
        self.fail_if_requested("position_windows")?;
        {
            let mut windows = self.windows.lock().unwrap();
            for (id, rect) in assignment {
                if let Some(w) = windows.iter_mut().find(|w| w.id == *id) {
                    w.rect = *rect;
                }
            }
        }
        self.batch_calls.lock().unwrap().push(assignment.to_vec());
        Ok(())
    }

    fn clip_cursor(&self, rect: Option<Rect>) -> Result<(), PlatformError> {
        self.fail_if_requested("clip_cursor")?;
        self.clip_calls.lock().unwrap().push(rect);
        Ok(())
    }

    fn virtual_screen_rect(&self) -> Rect {
        let monitors = self.monitors.lock().unwrap();
        let mut iter = monitors.iter();
        match iter.next() {
            Some(first) => iter.fold(first.rect, |acc, m| acc.bounding_union(&m.rect)),
            None => Rect::new(0, 0, 0, 0),
        }
    }
}
