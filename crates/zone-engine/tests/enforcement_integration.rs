//! Integration tests for the enforcement pipeline.
//!
//! These tests exercise the application layer of zone-engine end-to-end:
//! `ZoneEngine` + `ZoneEnforcer` + the in-memory mock adapters, with the
//! real worker threads running.  They verify:
//!
//! - The event-to-retile pipeline: a window shown inside the tiling zone is
//!   picked up by the event pump and the batched layout is applied.
//! - Mutual exclusion of corrections: the fast and slow paths never run a
//!   window correction concurrently, even under a burst of triggers.
//! - The cursor guard: the clip is reasserted while enabled and the full
//!   virtual-desktop rect is applied after disable.
//! - Degraded mode: a failing event hook leaves the engine running with
//!   poll-based membership tracking, including both membership directions.
//! - The overlay window: shown over the exclusion rect on start, hidden on
//!   shutdown.
//!
//! Timers are shortened to tens of milliseconds so every test settles well
//! within a second of sleeping.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use zone_core::{
    compute_layout, Monitor, MonitorHandle, OverlaySide, Rect, TilingMode, WindowId,
    WindowSnapshot, ZoneConfig,
};
use zone_engine::application::commands::{EngineCommand, ZoneEngine};
use zone_engine::infrastructure::overlay_display::mock::MockOverlayDisplay;
use zone_engine::infrastructure::overlay_display::OverlayDisplay;
use zone_engine::infrastructure::window_events::mock::MockWindowEventSource;
use zone_engine::infrastructure::window_events::{WindowEvent, WindowEventSource};
use zone_engine::infrastructure::window_system::mock::MockWindowSystem;
use zone_engine::infrastructure::window_system::WindowSystem;

const PRIMARY: Rect = Rect { left: 0, top: 0, right: 1920, bottom: 1080 };
const SECONDARY: Rect = Rect { left: 1920, top: 0, right: 3840, bottom: 1080 };

/// Generous settle time for worker threads driven by 10-20 ms intervals.
const SETTLE: Duration = Duration::from_millis(250);

fn desktop() -> Arc<MockWindowSystem> {
    let mock = Arc::new(MockWindowSystem::new());
    mock.add_monitor(Monitor {
        handle: MonitorHandle::from_raw(1),
        rect: PRIMARY,
        is_primary: true,
    });
    mock
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

/// Overlay over the left 400 px, tiling across the remainder.
fn zone_config(cursor_lock: bool) -> ZoneConfig {
    ZoneConfig {
        overlay_enabled: true,
        overlay_side: OverlaySide::Left,
        overlay_boundary_x: 400,
        tiling_enabled: true,
        tiling_mode: TilingMode::Full,
        cursor_lock_enabled: cursor_lock,
        ..ZoneConfig::default()
    }
}

fn start_engine(
    mock: &Arc<MockWindowSystem>,
    source: &Arc<MockWindowEventSource>,
    config: ZoneConfig,
) -> (ZoneEngine, Arc<MockOverlayDisplay>) {
    let overlay = Arc::new(MockOverlayDisplay::new());
    let mut engine = ZoneEngine::new(
        Arc::clone(mock) as Arc<dyn WindowSystem>,
        Arc::clone(source) as Arc<dyn WindowEventSource>,
        Arc::clone(&overlay) as Arc<dyn OverlayDisplay>,
        config,
        0,
        Duration::from_millis(20),
        Duration::from_millis(10),
    );
    engine.start();
    (engine, overlay)
}

// ── Event-to-retile pipeline ──────────────────────────────────────────────────

#[test]
fn test_shown_windows_are_tiled_by_the_event_pump() {
    // Arrange
    let mock = desktop();
    let source = Arc::new(MockWindowEventSource::new());
    mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
    mock.put_window(window(2, Rect::new(600, 200, 1200, 700)));
    let (mut engine, _overlay) = start_engine(&mock, &source, zone_config(false));

    // Act – the OS reports both windows appearing
    source.inject_event(WindowEvent::Shown(WindowId::from_raw(1)));
    source.inject_event(WindowEvent::Shown(WindowId::from_raw(2)));
    thread::sleep(SETTLE);

    // Assert – one coalesced batch matching the pure layout
    let zone = engine.state().geometry.tiling_rect.expect("tiling enabled");
    let expected = compute_layout(&[WindowId::from_raw(1), WindowId::from_raw(2)], zone);
    {
        let batches = mock.batch_calls.lock().unwrap();
        assert!(!batches.is_empty(), "event pump must have retiled");
        assert_eq!(*batches.last().unwrap(), expected);
    }
    assert_eq!(engine.state().members.len(), 2);

    engine.handle_command(EngineCommand::Shutdown);
}

#[test]
fn test_destroyed_window_triggers_relayout_for_survivor() {
    // Arrange: two tiled windows
    let mock = desktop();
    let source = Arc::new(MockWindowEventSource::new());
    mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
    mock.put_window(window(2, Rect::new(600, 200, 1200, 700)));
    let (mut engine, _overlay) = start_engine(&mock, &source, zone_config(false));
    source.inject_event(WindowEvent::Shown(WindowId::from_raw(1)));
    source.inject_event(WindowEvent::Shown(WindowId::from_raw(2)));
    thread::sleep(SETTLE);

    // Act – window 1 dies
    mock.remove_window(WindowId::from_raw(1));
    source.inject_event(WindowEvent::Destroyed(WindowId::from_raw(1)));
    thread::sleep(SETTLE);

    // Assert – the survivor now owns the whole zone
    let zone = engine.state().geometry.tiling_rect.expect("tiling enabled");
    {
        let batches = mock.batch_calls.lock().unwrap();
        assert_eq!(*batches.last().unwrap(), vec![(WindowId::from_raw(2), zone)]);
    }
    assert_eq!(engine.state().members, vec![WindowId::from_raw(2)]);

    engine.handle_command(EngineCommand::Shutdown);
}

// ── Mutual exclusion of corrections ───────────────────────────────────────────

#[test]
fn test_concurrent_corrections_never_overlap() {
    // Arrange: a window straddling the overlay wall, an artificial delay
    // inside position_window, and the foreground set so the slow path keeps
    // firing alongside the fast path.
    let mock = desktop();
    let source = Arc::new(MockWindowEventSource::new());
    mock.put_window(window(1, Rect::new(100, 100, 700, 600)));
    mock.set_foreground(Some(WindowId::from_raw(1)));
    *mock.position_delay.lock().unwrap() = Duration::from_millis(15);
    let (mut engine, _overlay) = start_engine(&mock, &source, zone_config(false));

    // Act – burst of move-end events racing the 20 ms poll ticks.  The mock
    // keeps reporting the pre-correction rect only until the first
    // correction lands, so keep re-dirtying the window.
    for _ in 0..10 {
        mock.put_window(window(1, Rect::new(100, 100, 700, 600)));
        source.inject_event(WindowEvent::MoveResizeEnded(WindowId::from_raw(1)));
        thread::sleep(Duration::from_millis(10));
    }
    thread::sleep(SETTLE);

    // Assert – corrections happened, but never two at once
    assert!(
        !mock.position_calls.lock().unwrap().is_empty(),
        "at least one correction must have landed"
    );
    assert_eq!(
        mock.max_concurrent_positions.load(Ordering::SeqCst),
        1,
        "the correction gate must serialize fast and slow paths"
    );

    engine.handle_command(EngineCommand::Shutdown);
}

// ── Maximize enforcement (slow path) ──────────────────────────────────────────

#[test]
fn test_poll_path_restores_and_corrects_maximized_foreground_window() {
    // Arrange: a maximized window covering the monitor, overlay included
    let mock = desktop();
    let source = Arc::new(MockWindowEventSource::new());
    mock.put_window(window(1, PRIMARY));
    mock.set_maximized(WindowId::from_raw(1));
    mock.set_foreground(Some(WindowId::from_raw(1)));

    // Act
    let (mut engine, _overlay) = start_engine(&mock, &source, zone_config(false));
    thread::sleep(SETTLE);

    // Assert – restored once, then clamped into the usable rect
    assert_eq!(
        mock.restore_calls.lock().unwrap().as_slice(),
        &[WindowId::from_raw(1)]
    );
    assert_eq!(
        mock.window_rect(WindowId::from_raw(1)),
        Some(Rect::new(400, 0, 1920, 1080))
    );

    engine.handle_command(EngineCommand::Shutdown);
}

// ── Cursor guard ──────────────────────────────────────────────────────────────

#[test]
fn test_cursor_clip_is_reasserted_and_released_on_disable() {
    // Arrange: cursor lock on from the start
    let mock = desktop();
    let source = Arc::new(MockWindowEventSource::new());
    let (mut engine, _overlay) = start_engine(&mock, &source, zone_config(true));
    let clip_rect = engine
        .state()
        .geometry
        .cursor_clip_rect
        .expect("cursor lock enabled");

    thread::sleep(SETTLE);

    // Assert – level-triggered: many reasserts of the same rect
    let reasserts = {
        let clips = mock.clip_calls.lock().unwrap();
        clips.iter().filter(|c| **c == Some(clip_rect)).count()
    };
    assert!(reasserts >= 3, "expected repeated reasserts, got {reasserts}");

    // Act – disable confinement
    engine.handle_command(EngineCommand::SetCursorLockEnabled(false));
    thread::sleep(SETTLE);

    // Assert – released to the full virtual desktop and left alone after
    let full = mock.virtual_screen_rect();
    {
        let clips = mock.clip_calls.lock().unwrap();
        assert_eq!(*clips.last().unwrap(), Some(full));
    }

    engine.handle_command(EngineCommand::Shutdown);
    // Shutdown hands the cursor back to the OS unconditionally.
    assert_eq!(mock.last_clip(), Some(None));
}

// ── Degraded poll-only mode ───────────────────────────────────────────────────

#[test]
fn test_failing_event_hook_falls_back_to_poll_only_membership() {
    // Arrange: the hook refuses to install
    let mock = desktop();
    let source = Arc::new(MockWindowEventSource::failing());
    mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));

    // Act – no events will ever arrive; the poll sweep must pick the
    // window up by enumeration
    let (mut engine, _overlay) = start_engine(&mock, &source, zone_config(false));
    thread::sleep(SETTLE);

    // Assert
    assert!(engine.state().degraded, "engine must report degraded mode");
    assert_eq!(engine.state().members, vec![WindowId::from_raw(1)]);
    let zone = engine.state().geometry.tiling_rect.expect("tiling enabled");
    {
        let batches = mock.batch_calls.lock().unwrap();
        assert!(!batches.is_empty(), "poll sweep must have retiled");
        assert_eq!(*batches.last().unwrap(), vec![(WindowId::from_raw(1), zone)]);
    }

    engine.handle_command(EngineCommand::Shutdown);
}

#[test]
fn test_degraded_sweep_releases_window_dragged_out_of_the_zone() {
    // Arrange: poll-only mode with a second monitor to drag onto
    let mock = desktop();
    mock.add_monitor(Monitor {
        handle: MonitorHandle::from_raw(2),
        rect: SECONDARY,
        is_primary: false,
    });
    let source = Arc::new(MockWindowEventSource::failing());
    mock.put_window(window(1, Rect::new(500, 100, 1100, 600)));
    let (mut engine, _overlay) = start_engine(&mock, &source, zone_config(false));
    thread::sleep(SETTLE);
    assert_eq!(engine.state().members, vec![WindowId::from_raw(1)]);

    // Act – the user drags the window fully onto the secondary monitor;
    // with no move-end events, only the sweep can notice
    let parked = Rect::new(2400, 100, 3000, 600);
    mock.put_window(window(1, parked));
    thread::sleep(SETTLE);

    // Assert – released, and no retile yanked it back into the zone
    assert!(
        engine.state().members.is_empty(),
        "window that left the zone is still managed: {:?}",
        engine.state().members
    );
    assert_eq!(mock.window_rect(WindowId::from_raw(1)), Some(parked));

    engine.handle_command(EngineCommand::Shutdown);
}

// ── Overlay window ────────────────────────────────────────────────────────────

#[test]
fn test_overlay_tracks_engine_lifecycle() {
    // Arrange / Act
    let mock = desktop();
    let source = Arc::new(MockWindowEventSource::new());
    let (mut engine, overlay) = start_engine(&mock, &source, zone_config(false));

    // Assert – shown over the exclusion rect as soon as the engine starts
    let overlay_rect = engine.state().geometry.overlay_rect.expect("overlay enabled");
    assert_eq!(overlay_rect, Rect::new(0, 0, 400, 1080));
    assert_eq!(overlay.last_call(), Some(Some(overlay_rect)));

    // Act / Assert – shutdown hides it
    engine.handle_command(EngineCommand::Shutdown);
    assert!(!overlay.is_visible());
}
