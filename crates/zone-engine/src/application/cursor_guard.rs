//! Level-triggered cursor confinement loop.
//!
//! Win32 silently drops a cursor clip whenever another process calls
//! `ClipCursor`, a UAC prompt appears, or the session locks.  Instead of
//! trying to detect those losses, the guard reasserts the clip rectangle on
//! every tick while confinement is enabled.  On the first tick after
//! confinement is disabled it applies the full virtual-desktop rectangle
//! once, then goes idle until re-enabled.

use std::time::Duration;

use tracing::warn;

use super::enforce_zones::ZoneEnforcer;

/// Runs the cursor guard until the enforcer stops.
///
/// Called on its own worker thread by [`ZoneEnforcer::spawn_workers`].
pub(crate) fn run_cursor_guard(enforcer: &ZoneEnforcer, interval: Duration) {
    let mut was_active = false;
    while enforcer.is_running() {
        cursor_tick(enforcer, &mut was_active);
        enforcer.sleep_while_running(interval);
    }
    // Never leave the desktop confined after shutdown.
    if was_active {
        release(enforcer);
    }
}

/// One guard tick: reassert while enabled, release once after disable.
pub(crate) fn cursor_tick(enforcer: &ZoneEnforcer, was_active: &mut bool) {
    let view = enforcer.current_view();
    match view.geometry.cursor_clip_rect {
        Some(clip) => {
            *was_active = true;
            if let Err(e) = enforcer.window_system().clip_cursor(Some(clip)) {
                warn!(error = %e, "cursor clip reassert failed");
            }
        }
        None => {
            if *was_active {
                *was_active = false;
                release(enforcer);
            }
        }
    }
}

fn release(enforcer: &ZoneEnforcer) {
    let full = enforcer.window_system().virtual_screen_rect();
    if let Err(e) = enforcer.window_system().clip_cursor(Some(full)) {
        warn!(error = %e, "cursor release failed");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
