//! The correction coordinator: shared enforcement state plus the fast
//! (event-driven) and slow (polled) correction paths.
//!
//! # Concurrency model
//!
//! - Zone geometry is published as `Mutex<Arc<EnforcementView>>` and swapped
//!   copy-on-write: only the command surface writes, every worker reads a
//!   cheap `Arc` clone and never blocks a writer mid-correction.
//! - Membership lives behind its own mutex, held only for mutation and
//!   snapshotting — never across OS calls.
//! - Corrections funnel through `correction_gate`, acquired with `try_lock`.
//!   A contended correction is dropped, never queued: the loser's trigger
//!   either fires again (the poll path) or is superseded by the winner's
//!   correction of the same window.
//! - `retile_needed` coalesces any number of membership changes into a
//!   single retile, consumed with an atomic swap.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use zone_core::{
    compute_layout, nudge_into, ManagedWindowSet, Rect, WindowId, ZoneGeometry,
};

use crate::application::cursor_guard;
use crate::infrastructure::window_events::{WindowEvent, WindowEventSource};
use crate::infrastructure::window_system::WindowSystem;

/// How long the event pump blocks waiting for the next window event before
/// checking the stop flag and the retile flag.
const EVENT_PUMP_TIMEOUT: Duration = Duration::from_millis(100);

/// Granularity of interruptible worker sleeps, so stop() joins quickly even
/// with long poll intervals.
const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// The immutable snapshot every worker reads: derived zone geometry plus
/// the monitor rects the membership predicate consumes.
#[derive(Debug, Clone)]
pub struct EnforcementView {
    pub geometry: ZoneGeometry,
    pub monitor_rects: Vec<Rect>,
}

/// Owns the shared enforcement state and the correction logic.
///
/// One instance is shared (via `Arc`) between the command surface and the
/// worker threads spawned by [`ZoneEnforcer::spawn_workers`].
pub struct ZoneEnforcer {
    window_system: Arc<dyn WindowSystem>,
    /// Current enforcement view, swapped copy-on-write by the command surface.
    view: Mutex<Arc<EnforcementView>>,
    /// The managed window set; lock held only for mutation/snapshot.
    members: Mutex<ManagedWindowSet>,
    /// Non-blocking gate serializing window corrections across paths.
    correction_gate: Mutex<()>,
    /// Set by membership changes, consumed once per event-pump cycle.
    retile_needed: AtomicBool,
    /// Cleared by `stop()`; every worker loop polls it.
    running: AtomicBool,
    /// Set when the event hook failed to install (poll-only mode).
    degraded: AtomicBool,
}

impl ZoneEnforcer {
    pub fn new(window_system: Arc<dyn WindowSystem>, view: EnforcementView) -> Self {
        Self {
            window_system,
            view: Mutex::new(Arc::new(view)),
            members: Mutex::new(ManagedWindowSet::new()),
            correction_gate: Mutex::new(()),
            retile_needed: AtomicBool::new(false),
            running: AtomicBool::new(true),
            degraded: AtomicBool::new(false),
        }
    }

    /// The window system this enforcer drives.
    pub fn window_system(&self) -> &Arc<dyn WindowSystem> {
        &self.window_system
    }

    /// Cheap clone of the current enforcement view.
    pub fn current_view(&self) -> Arc<EnforcementView> {
        self.view
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a new enforcement view.
    ///
    /// Forces an immediate cursor re-assert (or release) and schedules a
    /// retile so the managed windows converge on the new geometry.
    pub fn publish_view(&self, view: EnforcementView) {
        {
            let mut slot = self.view.lock().unwrap_or_else(PoisonError::into_inner);
            *slot = Arc::new(view);
        }
        self.apply_cursor_now();
        self.request_retile();
    }

    /// `true` while the workers should keep running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// `true` when the engine fell back to poll-only membership tracking.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Signals every worker loop to exit. Threads observe the flag within
    /// one sleep slice; callers then join the handles.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    // ── Membership ────────────────────────────────────────────────────────────

    /// Explicit user selection; schedules a retile when the set changed.
    pub fn select_window(&self, id: WindowId) {
        let change = self
            .members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .select(id);
        if change.needs_retile() {
            self.request_retile();
        }
    }

    /// Explicit user deselection, authoritative over automatic tracking.
    pub fn deselect_window(&self, id: WindowId) {
        let change = self
            .members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .deselect(id);
        if change.needs_retile() {
            self.request_retile();
        }
    }

    /// Drops every managed window (tiling disabled).
    pub fn clear_members(&self) {
        self.members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Copy of the managed set in tiling priority order.
    pub fn members_snapshot(&self) -> Vec<WindowId> {
        self.members
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Marks the managed set dirty; the event pump retiles on its next cycle.
    pub fn request_retile(&self) {
        self.retile_needed.store(true, Ordering::SeqCst);
    }

    // ── Fast path: window events ──────────────────────────────────────────────

    /// Applies one window event to the membership state and, for completed
    /// moves of managed windows, runs the immediate correction.
    pub fn handle_event(&self, event: WindowEvent) {
        let view = self.current_view();

        match event {
            WindowEvent::Shown(id) => {
                let Ok(snapshot) = self.window_system.window_snapshot(id) else {
                    return;
                };
                let change = self
                    .members
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .on_window_shown(&snapshot, view.geometry.tiling_rect, &view.monitor_rects);
                if change.needs_retile() {
                    self.request_retile();
                }
            }
            WindowEvent::MoveResizeEnded(id) => {
                let Ok(snapshot) = self.window_system.window_snapshot(id) else {
                    // The window vanished between the event and the query.
                    let change = self
                        .members
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .on_window_gone(id);
                    if change.needs_retile() {
                        self.request_retile();
                    }
                    return;
                };
                let change = self
                    .members
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .on_move_resize_ended(
                        &snapshot,
                        view.geometry.tiling_rect,
                        &view.monitor_rects,
                    );
                if change.needs_retile() {
                    // The retile repositions the window anyway.
                    self.request_retile();
                } else if self
                    .members
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .contains(id)
                {
                    // Managed window moved within the zone: clamp it back
                    // against the overlay wall right away.
                    self.correct_window(id, false);
                }
            }
            WindowEvent::Hidden(id) | WindowEvent::Destroyed(id) => {
                let change = self
                    .members
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .on_window_gone(id);
                if change.needs_retile() {
                    self.request_retile();
                }
            }
        }
    }

    // ── Corrections ───────────────────────────────────────────────────────────

    /// Clamps one window back into the usable rectangle.
    ///
    /// Non-blocking: when another correction is in flight the call is
    /// dropped (the poll path will fire again; the in-flight correction
    /// supersedes a concurrent one for the same window).
    ///
    /// `is_maximize_check` is the slow path: a window whose rect escapes the
    /// usable rect while maximized is restored first, then nudged.
    pub fn correct_window(&self, id: WindowId, is_maximize_check: bool) {
        let Ok(_gate) = self.correction_gate.try_lock() else {
            debug!(window = id.as_raw(), "correction dropped, gate contended");
            return;
        };
        if !self.is_running() {
            return;
        }

        let view = self.current_view();
        let usable = view.geometry.usable_rect;
        if usable.is_degenerate() {
            return;
        }

        let snapshot = match self.window_system.window_snapshot(id) {
            Ok(s) => s,
            Err(e) => {
                debug!(window = id.as_raw(), error = %e, "correction skipped");
                return;
            }
        };

        // Only windows on the target monitor are subject to the zones.
        let (cx, cy) = snapshot.rect.center();
        if !view.geometry.monitor_rect.contains_point(cx, cy) {
            return;
        }

        let mut rect = snapshot.rect;
        let escapes = rect.left < usable.left
            || rect.top < usable.top
            || rect.right > usable.right
            || rect.bottom > usable.bottom;
        if !escapes {
            return;
        }

        if is_maximize_check {
            match self.window_system.is_maximized(id) {
                Ok(true) => {
                    // A maximized window covers the overlay; restore it so
                    // SetWindowPos takes effect, then re-read its rect.
                    if let Err(e) = self.window_system.restore_window(id) {
                        warn!(window = id.as_raw(), error = %e, "restore failed");
                        return;
                    }
                    match self.window_system.window_snapshot(id) {
                        Ok(s) => rect = s.rect,
                        Err(e) => {
                            debug!(window = id.as_raw(), error = %e, "window gone after restore");
                            return;
                        }
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    debug!(window = id.as_raw(), error = %e, "maximize query failed");
                    return;
                }
            }
        }

        let target = nudge_into(rect, usable);
        if target == rect {
            return;
        }
        debug!(
            window = id.as_raw(),
            from = ?rect,
            to = ?target,
            "correcting window"
        );
        if let Err(e) = self.window_system.position_window(id, target) {
            warn!(window = id.as_raw(), error = %e, "window correction failed");
        }
    }

    /// Consumes the retile flag; retiles at most once per call.
    pub fn retile_if_needed(&self) {
        if self.retile_needed.swap(false, Ordering::SeqCst) {
            self.retile();
        }
    }

    /// Recomputes the layout for the current members and applies it in one
    /// batched positioning call.
    fn retile(&self) {
        let view = self.current_view();
        let Some(tiling_rect) = view.geometry.tiling_rect else {
            return;
        };
        if tiling_rect.is_degenerate() {
            return;
        }

        // Prune members whose windows no longer exist before laying out.
        let candidates = self.members_snapshot();
        let mut live = Vec::with_capacity(candidates.len());
        for id in candidates {
            if self.window_system.window_snapshot(id).is_ok() {
                live.push(id);
            } else {
                let _ = self
                    .members
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .on_window_gone(id);
            }
        }
        if live.is_empty() {
            return;
        }

        let assignment = compute_layout(&live, tiling_rect);
        debug!(windows = live.len(), zone = ?tiling_rect, "retiling");
        if let Err(e) = self.window_system.position_windows(&assignment) {
            warn!(error = %e, "batched retile failed");
            // Re-arm the flag so the next pump cycle retries.
            self.request_retile();
        }
    }

    // ── Slow path: poll sweep ─────────────────────────────────────────────────

    /// One slow-path tick: maximize/escape check on the foreground window,
    /// plus full membership reconciliation when running degraded.
    fn poll_tick(&self) {
        if self.is_degraded() {
            self.reconcile_membership();
            self.retile_if_needed();
        }
        match self.window_system.foreground_window() {
            Ok(Some(fg)) => self.correct_window(fg, true),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "foreground query failed"),
        }
    }

    /// Rebuilds membership from a full window enumeration. Used instead of
    /// events when the hook could not be installed.
    fn reconcile_membership(&self) {
        let view = self.current_view();
        if view.geometry.tiling_rect.is_none() {
            return;
        }
        let windows = match self.window_system.enumerate_windows() {
            Ok(w) => w,
            Err(e) => {
                warn!(error = %e, "window enumeration failed");
                return;
            }
        };

        let live: HashSet<WindowId> = windows.iter().map(|w| w.id).collect();
        let mut changed = false;
        {
            let mut members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
            for id in members.snapshot() {
                if !live.contains(&id) {
                    changed |= members.on_window_gone(id).needs_retile();
                }
            }
            // Each live window gets the move-end transition: members whose
            // center left the zone are released, newcomers inside it join.
            for snapshot in &windows {
                changed |= members
                    .on_move_resize_ended(
                        snapshot,
                        view.geometry.tiling_rect,
                        &view.monitor_rects,
                    )
                    .needs_retile();
            }
        }
        if changed {
            self.request_retile();
        }
    }

    // ── Workers ───────────────────────────────────────────────────────────────

    /// Starts the event source and spawns the three worker threads: the
    /// event pump, the maximize poll and the cursor guard.
    ///
    /// When the event source fails to start the engine logs once and runs
    /// degraded: membership is reconciled from enumeration each poll tick.
    pub fn spawn_workers(
        self: &Arc<Self>,
        event_source: &Arc<dyn WindowEventSource>,
        poll_interval: Duration,
        cursor_interval: Duration,
    ) -> Vec<JoinHandle<()>> {
        self.running.store(true, Ordering::SeqCst);
        let mut handles = Vec::new();

        match event_source.start() {
            Ok(rx) => {
                let enforcer = Arc::clone(self);
                match thread::Builder::new()
                    .name("zone-event-pump".to_string())
                    .spawn(move || enforcer.run_event_pump(rx))
                {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // No pump means no fast path; membership must come
                        // from the poll sweep instead.
                        warn!(error = %e, "event pump failed to spawn, running in poll-only mode");
                        self.degraded.store(true, Ordering::SeqCst);
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "window event hook unavailable, running in poll-only mode");
                self.degraded.store(true, Ordering::SeqCst);
            }
        }

        {
            let enforcer = Arc::clone(self);
            match thread::Builder::new()
                .name("zone-maximize-poll".to_string())
                .spawn(move || enforcer.run_maximize_poll(poll_interval))
            {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(error = %e, "maximize poll failed to spawn"),
            }
        }
        {
            let enforcer = Arc::clone(self);
            match thread::Builder::new()
                .name("zone-cursor-guard".to_string())
                .spawn(move || cursor_guard::run_cursor_guard(&enforcer, cursor_interval))
            {
                Ok(handle) => handles.push(handle),
                Err(e) => warn!(error = %e, "cursor guard failed to spawn"),
            }
        }

        info!(
            degraded = self.is_degraded(),
            "enforcement workers started"
        );
        handles
    }

    fn run_event_pump(&self, rx: Receiver<WindowEvent>) {
        while self.is_running() {
            match rx.recv_timeout(EVENT_PUMP_TIMEOUT) {
                Ok(event) => {
                    self.handle_event(event);
                    // Drain the backlog so a burst coalesces into one retile.
                    while let Ok(next) = rx.try_recv() {
                        self.handle_event(next);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("event channel closed, event pump exiting");
                    break;
                }
            }
            self.retile_if_needed();
        }
    }

    fn run_maximize_poll(&self, interval: Duration) {
        while self.is_running() {
            self.poll_tick();
            self.sleep_while_running(interval);
        }
    }

    /// Applies the current cursor state once: the clip rect when confinement
    /// is enabled, the full virtual desktop otherwise.
    pub(crate) fn apply_cursor_now(&self) {
        let view = self.current_view();
        let target = view
            .geometry
            .cursor_clip_rect
            .unwrap_or_else(|| self.window_system.virtual_screen_rect());
        if let Err(e) = self.window_system.clip_cursor(Some(target)) {
            warn!(error = %e, "cursor clip failed");
        }
    }

    /// Sleeps up to `total`, waking early when `stop()` is called.
    pub(crate) fn sleep_while_running(&self, total: Duration) {
        let mut remaining = total;
        while !remaining.is_zero() && self.is_running() {
            let step = SLEEP_SLICE.min(remaining);
            thread::sleep(step);
            remaining -= step;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use zone_core::{
        compute_zone_geometry, Monitor, MonitorHandle, OverlaySide, TilingMode, WindowSnapshot,
        ZoneConfig,
    };

    use crate::infrastructure::window_system::mock::MockWindowSystem;

    const PRIMARY: Rect = Rect { left: 0, top: 0, right: 1920, bottom: 1080 };
    const SECONDARY: Rect = Rect { left: 1920, top: 0, right: 3840, bottom: 1080 };

    fn monitors() -> Vec<Monitor> {
        vec![
            Monitor { handle: MonitorHandle::from_raw(1), rect: PRIMARY, is_primary: true },
            Monitor { handle: MonitorHandle::from_raw(2), rect: SECONDARY, is_primary: false },
        ]
    }

    /// Overlay on the left 400px of the primary monitor, tiling over the
    /// remainder, cursor lock off.
    fn overlay_config() -> ZoneConfig {
        ZoneConfig {
            overlay_enabled: true,
            overlay_side: OverlaySide::Left,
            overlay_boundary_x: 400,
            tiling_enabled: true,
            tiling_mode: TilingMode::Full,
            cursor_lock_enabled: false,
            ..ZoneConfig::default()
        }
    }

    fn view_for(config: &ZoneConfig) -> EnforcementView {
        let monitors = monitors();
        EnforcementView {
            geometry: compute_zone_geometry(&monitors, 0, config),
            monitor_rects: monitors.iter().map(|m| m.rect).collect(),
        }
    }

    fn make_enforcer(config: &ZoneConfig) -> (Arc<ZoneEnforcer>, Arc<MockWindowSystem>) {
        let mock = Arc::new(MockWindowSystem::new());
        for m in monitors() {
            mock.add_monitor(m);
        }
        let enforcer = Arc::new(ZoneEnforcer::new(
            Arc::clone(&mock) as Arc<dyn WindowSystem>,
            view_for(config),
        ));
        (enforcer, mock)
    }

    fn window(raw: u64, rect: Rect) -> WindowSnapshot {
        WindowSnapshot {
            id: WindowId::from_raw(raw),
            title: format!("app-{raw}"),
            rect,
            visible: true,
            has_owner: false,
        }
    }

    // ── correct_window ────────────────────────────────────────────────────────

    #[test]
    fn test_correction_nudges_window_out_of_overlay() {
        // Arrange: window straddling the overlay wall at x=400
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(100, 100, 700, 600)));

        // Act
        enforcer.correct_window(WindowId::from_raw(1), false);

        // Assert – translated right, size preserved
        let calls = mock.position_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (WindowId::from_raw(1), Rect::new(400, 100, 1000, 600)));
    }

    #[test]
    fn test_correction_leaves_compliant_window_alone() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));

        enforcer.correct_window(WindowId::from_raw(1), false);

        assert!(mock.position_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_correction_ignores_window_on_other_monitor() {
        // Center on the secondary monitor: the zones do not apply there.
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(2000, 100, 2600, 600)));

        enforcer.correct_window(WindowId::from_raw(1), false);

        assert!(mock.position_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_correction_skips_vanished_window() {
        let (enforcer, mock) = make_enforcer(&overlay_config());

        enforcer.correct_window(WindowId::from_raw(99), false);

        assert!(mock.position_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_maximize_check_restores_before_nudging() {
        // Arrange: a maximized window covering the whole monitor, overlay
        // included.
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, PRIMARY));
        mock.set_maximized(WindowId::from_raw(1));

        // Act
        enforcer.correct_window(WindowId::from_raw(1), true);

        // Assert – restored first, then clamped into the usable rect
        assert_eq!(mock.restore_calls.lock().unwrap().as_slice(), &[WindowId::from_raw(1)]);
        let calls = mock.position_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, Rect::new(400, 0, 1920, 1080));
    }

    #[test]
    fn test_fast_path_does_not_restore_maximized_window() {
        // The restore-then-nudge treatment is reserved for the slow path.
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, PRIMARY));
        mock.set_maximized(WindowId::from_raw(1));

        enforcer.correct_window(WindowId::from_raw(1), false);

        assert!(mock.restore_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_contended_gate_drops_correction() {
        // Arrange: hold the gate as if another correction were in flight.
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(100, 100, 700, 600)));
        let _held = enforcer.correction_gate.lock().unwrap();

        // Act
        enforcer.correct_window(WindowId::from_raw(1), false);

        // Assert – dropped, not queued
        assert!(mock.position_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_correction_swallows_platform_failure() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(100, 100, 700, 600)));
        mock.should_fail.store(true, Ordering::SeqCst);

        // Must not panic; the failure is logged and swallowed.
        enforcer.correct_window(WindowId::from_raw(1), false);
    }

    // ── Event handling and retiling ───────────────────────────────────────────

    #[test]
    fn test_shown_window_in_zone_becomes_member_and_flags_retile() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));

        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(1)));

        assert_eq!(enforcer.members_snapshot(), vec![WindowId::from_raw(1)]);
        assert!(enforcer.retile_needed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_move_out_of_zone_removes_member() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(1)));

        // Move the window onto the secondary monitor, then deliver the event.
        mock.put_window(window(1, Rect::new(2000, 100, 2600, 600)));
        enforcer.handle_event(WindowEvent::MoveResizeEnded(WindowId::from_raw(1)));

        assert!(enforcer.members_snapshot().is_empty());
    }

    #[test]
    fn test_destroyed_member_flags_retile() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(1)));
        enforcer.retile_if_needed(); // consume the add

        mock.remove_window(WindowId::from_raw(1));
        enforcer.handle_event(WindowEvent::Destroyed(WindowId::from_raw(1)));

        assert!(enforcer.retile_needed.load(Ordering::SeqCst));
        assert!(enforcer.members_snapshot().is_empty());
    }

    #[test]
    fn test_retile_applies_batched_layout() {
        // Arrange: two members inside the tiling zone (400..1920 x 0..1080)
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        mock.put_window(window(2, Rect::new(600, 200, 1200, 700)));
        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(1)));
        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(2)));

        // Act
        enforcer.retile_if_needed();

        // Assert – one batch matching the pure layout for the zone
        let zone = enforcer.current_view().geometry.tiling_rect.unwrap();
        let expected = compute_layout(
            &[WindowId::from_raw(1), WindowId::from_raw(2)],
            zone,
        );
        let batches = mock.batch_calls.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], expected);
    }

    #[test]
    fn test_retile_prunes_dead_members() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        mock.put_window(window(2, Rect::new(600, 200, 1200, 700)));
        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(1)));
        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(2)));

        // Window 1 dies without a Destroyed event reaching us.
        mock.remove_window(WindowId::from_raw(1));
        enforcer.retile_if_needed();

        // The survivor gets the whole zone.
        let zone = enforcer.current_view().geometry.tiling_rect.unwrap();
        let batches = mock.batch_calls.lock().unwrap();
        assert_eq!(batches[0], vec![(WindowId::from_raw(2), zone)]);
        assert_eq!(enforcer.members_snapshot(), vec![WindowId::from_raw(2)]);
    }

    #[test]
    fn test_failed_retile_is_rescheduled() {
        // Arrange: one member, then make every write fail
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(1)));
        mock.should_fail.store(true, Ordering::SeqCst);

        // Act – the batch fails; the flag must be re-armed
        enforcer.retile_if_needed();
        assert!(enforcer.retile_needed.load(Ordering::SeqCst));

        // Act – the transient failure clears; the next cycle self-corrects
        mock.should_fail.store(false, Ordering::SeqCst);
        enforcer.retile_if_needed();

        // Assert
        assert_eq!(mock.batch_calls.lock().unwrap().len(), 1);
        assert!(!enforcer.retile_needed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_retile_flag_is_consumed_once() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        enforcer.handle_event(WindowEvent::Shown(WindowId::from_raw(1)));

        enforcer.retile_if_needed();
        enforcer.retile_if_needed();

        assert_eq!(mock.batch_calls.lock().unwrap().len(), 1);
    }

    // ── Degraded reconciliation ───────────────────────────────────────────────

    #[test]
    fn test_reconcile_membership_sweeps_window_table() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        mock.put_window(window(2, Rect::new(2000, 100, 2600, 600))); // other monitor

        enforcer.reconcile_membership();

        assert_eq!(enforcer.members_snapshot(), vec![WindowId::from_raw(1)]);
        assert!(enforcer.retile_needed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_reconcile_membership_releases_member_that_left_zone() {
        // Arrange: the sweep picks the window up inside the zone
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        enforcer.reconcile_membership();
        enforcer.retile_if_needed();
        assert_eq!(enforcer.members_snapshot(), vec![WindowId::from_raw(1)]);

        // Act – the user drags it onto the secondary monitor; no events
        // arrive in poll-only mode, only the next sweep sees the new rect
        mock.put_window(window(1, Rect::new(2000, 100, 2600, 600)));
        enforcer.reconcile_membership();

        // Assert – released, and a retile is scheduled for the survivors
        assert!(enforcer.members_snapshot().is_empty());
        assert!(enforcer.retile_needed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_reconcile_membership_drops_vanished_members() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
        enforcer.reconcile_membership();
        enforcer.retile_if_needed();

        mock.remove_window(WindowId::from_raw(1));
        enforcer.reconcile_membership();

        assert!(enforcer.members_snapshot().is_empty());
    }

    // ── publish_view ──────────────────────────────────────────────────────────

    #[test]
    fn test_publish_view_reasserts_cursor_and_schedules_retile() {
        // Arrange: enable cursor lock at the overlay wall
        let (enforcer, mock) = make_enforcer(&overlay_config());
        let mut config = overlay_config();
        config.cursor_lock_enabled = true;

        // Act
        enforcer.publish_view(view_for(&config));

        // Assert – clip applied immediately, retile pending
        let clip = mock.last_clip().expect("clip must have been called");
        assert_eq!(clip, enforcer.current_view().geometry.cursor_clip_rect);
        assert!(enforcer.retile_needed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_publish_view_releases_cursor_when_lock_disabled() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        let mut config = overlay_config();
        config.cursor_lock_enabled = true;
        enforcer.publish_view(view_for(&config));

        config.cursor_lock_enabled = false;
        enforcer.publish_view(view_for(&config));

        // Released to the full virtual desktop.
        let clip = mock.last_clip().expect("clip must have been called");
        assert_eq!(clip, Some(mock.virtual_screen_rect()));
    }

    // ── Explicit selection ────────────────────────────────────────────────────

    #[test]
    fn test_select_and_deselect_schedule_retiles() {
        let (enforcer, mock) = make_enforcer(&overlay_config());
        mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));

        enforcer.select_window(WindowId::from_raw(1));
        assert!(enforcer.retile_needed.swap(false, Ordering::SeqCst));

        enforcer.deselect_window(WindowId::from_raw(1));
        assert!(enforcer.retile_needed.load(Ordering::SeqCst));
        assert!(enforcer.members_snapshot().is_empty());
    }
}
