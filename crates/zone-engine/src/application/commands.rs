//! Engine command surface and observer channel.
//!
//! All configuration changes and user actions reach the enforcement state
//! through [`EngineCommand`] values dispatched by one handler on the
//! control thread.  State flows back out one way only: observers subscribe
//! to an `mpsc` channel of [`EngineNotification`]s carrying full state
//! snapshots, so no UI layer ever holds a reference into the engine.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use zone_core::{compute_zone_geometry, Rect, WindowId, ZoneConfig, ZoneGeometry};

use crate::application::enforce_zones::{EnforcementView, ZoneEnforcer};
use crate::infrastructure::overlay_display::OverlayDisplay;
use crate::infrastructure::window_events::WindowEventSource;
use crate::infrastructure::window_system::WindowSystem;

/// A command accepted by the engine's control thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Replaces the zone configuration wholesale.
    ApplyConfig(ZoneConfig),
    /// Changes which monitor the zones apply to (index, primary first).
    SetTargetMonitor(usize),
    /// Adds a window to the managed set regardless of its geometry.
    SelectWindow(WindowId),
    /// Removes a window from the managed set; authoritative until the
    /// window's automatic trigger fires again.
    DeselectWindow(WindowId),
    SetTilingEnabled(bool),
    SetCursorLockEnabled(bool),
    /// Stops all workers and releases the cursor.
    Shutdown,
}

/// Notification pushed to observers after every state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineNotification {
    StateChanged(EngineStateSnapshot),
}

/// A self-contained copy of the engine state for display purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStateSnapshot {
    pub geometry: ZoneGeometry,
    pub members: Vec<WindowId>,
    pub overlay_enabled: bool,
    pub tiling_enabled: bool,
    pub cursor_lock_enabled: bool,
    pub target_monitor: usize,
    /// `true` when the event hook failed and the engine runs poll-only.
    pub degraded: bool,
}

/// The engine facade: owns the configuration, the enforcer and the worker
/// handles, and dispatches commands.
pub struct ZoneEngine {
    config: ZoneConfig,
    target_monitor: usize,
    poll_interval: Duration,
    cursor_interval: Duration,
    enforcer: Arc<ZoneEnforcer>,
    event_source: Arc<dyn WindowEventSource>,
    overlay: Arc<dyn OverlayDisplay>,
    workers: Vec<JoinHandle<()>>,
    observers: Vec<Sender<EngineNotification>>,
}

impl ZoneEngine {
    /// Builds the engine with an initial geometry computed from the live
    /// monitor list.  Does not start the workers; call [`ZoneEngine::start`].
    pub fn new(
        window_system: Arc<dyn WindowSystem>,
        event_source: Arc<dyn WindowEventSource>,
        overlay: Arc<dyn OverlayDisplay>,
        config: ZoneConfig,
        target_monitor: usize,
        poll_interval: Duration,
        cursor_interval: Duration,
    ) -> Self {
        let mut target = target_monitor;
        let view = build_view(&window_system, &config, &mut target)
            .unwrap_or_else(|| EnforcementView {
                geometry: empty_geometry(),
                monitor_rects: Vec::new(),
            });
        let enforcer = Arc::new(ZoneEnforcer::new(window_system, view));
        Self {
            config,
            target_monitor: target,
            poll_interval,
            cursor_interval,
            enforcer,
            event_source,
            overlay,
            workers: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Spawns the enforcement workers and shows the overlay.
    pub fn start(&mut self) {
        if !self.workers.is_empty() {
            return;
        }
        self.workers = self.enforcer.spawn_workers(
            &self.event_source,
            self.poll_interval,
            self.cursor_interval,
        );
        self.apply_overlay();
        self.notify();
    }

    /// Stops the event source and all workers, hides the overlay, then
    /// hands the cursor back to the OS unconditionally.
    pub fn shutdown(&mut self) {
        self.event_source.stop();
        self.enforcer.stop();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked during shutdown");
            }
        }
        if let Err(e) = self.overlay.hide() {
            warn!(error = %e, "overlay hide failed during shutdown");
        }
        if let Err(e) = self.enforcer.window_system().clip_cursor(None) {
            warn!(error = %e, "final cursor release failed");
        }
        info!("engine stopped");
    }

    /// Registers an observer; every state change is delivered as an
    /// [`EngineNotification::StateChanged`].
    pub fn subscribe(&mut self) -> Receiver<EngineNotification> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    /// The current state, for pull-style consumers.
    pub fn state(&self) -> EngineStateSnapshot {
        let view = self.enforcer.current_view();
        EngineStateSnapshot {
            geometry: view.geometry.clone(),
            members: self.enforcer.members_snapshot(),
            overlay_enabled: self.config.overlay_enabled,
            tiling_enabled: self.config.tiling_enabled,
            cursor_lock_enabled: self.config.cursor_lock_enabled,
            target_monitor: self.target_monitor,
            degraded: self.enforcer.is_degraded(),
        }
    }

    /// Dispatches one command. Returns `false` when the engine has shut
    /// down and the control loop should exit.
    pub fn handle_command(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::ApplyConfig(config) => {
                self.config = config;
                if !self.config.tiling_enabled {
                    self.enforcer.clear_members();
                }
                self.recompute();
            }
            EngineCommand::SetTargetMonitor(index) => {
                self.target_monitor = index;
                self.recompute();
            }
            EngineCommand::SelectWindow(id) => {
                self.enforcer.select_window(id);
                self.notify();
            }
            EngineCommand::DeselectWindow(id) => {
                self.enforcer.deselect_window(id);
                self.notify();
            }
            EngineCommand::SetTilingEnabled(enabled) => {
                self.config.tiling_enabled = enabled;
                if !enabled {
                    self.enforcer.clear_members();
                }
                self.recompute();
            }
            EngineCommand::SetCursorLockEnabled(enabled) => {
                self.config.cursor_lock_enabled = enabled;
                self.recompute();
            }
            EngineCommand::Shutdown => {
                self.shutdown();
                return false;
            }
        }
        true
    }

    /// Re-derives the geometry from the live monitor list and publishes it.
    /// A stale target index is clamped to the primary monitor.
    fn recompute(&mut self) {
        match build_view(
            self.enforcer.window_system(),
            &self.config,
            &mut self.target_monitor,
        ) {
            Some(view) => self.enforcer.publish_view(view),
            None => warn!("monitor enumeration failed, keeping previous geometry"),
        }
        self.apply_overlay();
        self.notify();
    }

    /// Converges the overlay window on the current geometry: shown over the
    /// exclusion rect, hidden when the overlay is disabled.
    fn apply_overlay(&self) {
        let view = self.enforcer.current_view();
        let result = match view.geometry.overlay_rect {
            Some(rect) if !rect.is_degenerate() => self.overlay.show(rect),
            _ => self.overlay.hide(),
        };
        if let Err(e) = result {
            warn!(error = %e, "overlay update failed");
        }
    }

    fn notify(&mut self) {
        let snapshot = self.state();
        // Drop observers whose receiver is gone.
        self.observers.retain(|tx| {
            tx.send(EngineNotification::StateChanged(snapshot.clone()))
                .is_ok()
        });
    }
}

/// Computes the enforcement view from the live monitor list, clamping a
/// stale target index to 0.
fn build_view(
    window_system: &Arc<dyn WindowSystem>,
    config: &ZoneConfig,
    target_monitor: &mut usize,
) -> Option<EnforcementView> {
    let monitors = match window_system.enumerate_monitors() {
        Ok(m) if !m.is_empty() => m,
        Ok(_) => return None,
        Err(e) => {
            warn!(error = %e, "monitor enumeration failed");
            return None;
        }
    };
    if *target_monitor >= monitors.len() {
        warn!(
            configured = *target_monitor,
            available = monitors.len(),
            "target monitor is stale, falling back to primary"
        );
        *target_monitor = 0;
    }
    let geometry = compute_zone_geometry(&monitors, *target_monitor, config);
    Some(EnforcementView {
        geometry,
        monitor_rects: monitors.iter().map(|m| m.rect).collect(),
    })
}

/// Placeholder geometry used when no monitor is available at construction.
/// All rects are degenerate so every worker treats it as a no-op.
fn empty_geometry() -> ZoneGeometry {
    ZoneGeometry {
        monitor_rect: Rect::new(0, 0, 0, 0),
        usable_rect: Rect::new(0, 0, 0, 0),
        overlay_rect: None,
        tiling_rect: None,
        cursor_clip_rect: None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
