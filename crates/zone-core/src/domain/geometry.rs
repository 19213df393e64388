//! Zone geometry domain entities and the geometry calculator.
//!
//! All rectangles live in virtual-screen coordinates (the unified 2D space
//! spanning every monitor; coordinates may be negative for monitors left
//! of or above the primary).  A `Rect` is half-open like a Win32 RECT:
//! `left..right` × `top..bottom`.
//!
//! The central operation is [`compute_zone_geometry`]: a pure, total
//! function from (monitor list, target monitor index, [`ZoneConfig`]) to a
//! [`ZoneGeometry`] snapshot.  Geometry is derived state — it is recomputed
//! whenever the config or monitor layout changes and never mutated in
//! place, so concurrent readers only ever observe complete snapshots.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rectangle in virtual-screen coordinates, half-open on right/bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Creates a rectangle from its four edges.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Width in pixels (negative if the rect is inverted).
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Height in pixels (negative if the rect is inverted).
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Returns the center point, rounded toward the top-left.
    pub fn center(&self) -> (i32, i32) {
        (self.left + self.width() / 2, self.top + self.height() / 2)
    }

    /// Returns `true` if the point lies inside (half-open on right/bottom).
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Returns `true` if this rect shares area with `other`.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.top < other.bottom
            && self.bottom > other.top
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn bounding_union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Returns `true` when the rect has no positive area.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Returns the rect shifted by (dx, dy).
    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }
}

/// Opaque handle identifying a monitor.
///
/// Wraps the raw OS handle value; no arithmetic is exposed so a handle can
/// never be confused with a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorHandle(u64);

impl MonitorHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Read-only snapshot of one physical monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub handle: MonitorHandle,
    /// Full monitor rectangle in virtual-screen coordinates.
    pub rect: Rect,
    /// `true` for the monitor carrying the taskbar/origin.
    pub is_primary: bool,
}

/// Which side of the target monitor the exclusion overlay occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySide {
    Left,
    Right,
}

/// How the tiling zone's horizontal extent is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TilingMode {
    /// From the overlay wall (or the monitor edge when the overlay is
    /// disabled) to the opposite monitor edge.
    Full,
    /// Explicit horizontal bounds, clipped to the monitor. The bounds may
    /// be given in either order.
    Custom { start_x: i32, end_x: i32 },
}

/// How the cursor confinement wall coordinate is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorLockMode {
    /// The wall tracks the overlay boundary.
    FollowOverlay,
    /// The wall is an independent coordinate.
    Custom { wall_x: i32 },
}

/// Error type for parsing zone enums from their config-file spellings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneParseError {
    #[error("unknown overlay side '{0}', expected 'left' or 'right'")]
    OverlaySide(String),
    #[error("unknown tiling mode '{0}', expected 'full' or 'custom'")]
    TilingMode(String),
    #[error("unknown cursor lock mode '{0}', expected 'follow_overlay' or 'custom'")]
    CursorLockMode(String),
}

impl FromStr for OverlaySide {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(OverlaySide::Left),
            "right" => Ok(OverlaySide::Right),
            other => Err(ZoneParseError::OverlaySide(other.to_string())),
        }
    }
}

impl OverlaySide {
    /// The config-file spelling of this side.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlaySide::Left => "left",
            OverlaySide::Right => "right",
        }
    }
}

impl TilingMode {
    /// Builds a mode from its config-file parts: the mode keyword plus the
    /// custom bounds (ignored for `"full"`).
    pub fn from_parts(kind: &str, start_x: i32, end_x: i32) -> Result<Self, ZoneParseError> {
        match kind {
            "full" => Ok(TilingMode::Full),
            "custom" => Ok(TilingMode::Custom { start_x, end_x }),
            other => Err(ZoneParseError::TilingMode(other.to_string())),
        }
    }

    /// The config-file keyword for this mode.
    pub fn kind(&self) -> &'static str {
        match self {
            TilingMode::Full => "full",
            TilingMode::Custom { .. } => "custom",
        }
    }
}

impl CursorLockMode {
    /// Builds a mode from its config-file parts: the mode keyword plus the
    /// custom wall coordinate (ignored for `"follow_overlay"`).
    pub fn from_parts(kind: &str, wall_x: i32) -> Result<Self, ZoneParseError> {
        match kind {
            "follow_overlay" => Ok(CursorLockMode::FollowOverlay),
            "custom" => Ok(CursorLockMode::Custom { wall_x }),
            other => Err(ZoneParseError::CursorLockMode(other.to_string())),
        }
    }

    /// The config-file keyword for this mode.
    pub fn kind(&self) -> &'static str {
        match self {
            CursorLockMode::FollowOverlay => "follow_overlay",
            CursorLockMode::Custom { .. } => "custom",
        }
    }
}

/// Immutable zone configuration snapshot consumed per recalculation.
///
/// Owned by the configuration layer; the geometry calculator treats it as
/// a read-only input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub overlay_enabled: bool,
    pub overlay_side: OverlaySide,
    /// Absolute X coordinate of the overlay boundary wall.
    pub overlay_boundary_x: i32,
    pub tiling_enabled: bool,
    pub tiling_mode: TilingMode,
    pub cursor_lock_enabled: bool,
    pub cursor_lock_mode: CursorLockMode,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            overlay_enabled: false,
            overlay_side: OverlaySide::Left,
            overlay_boundary_x: 0,
            tiling_enabled: false,
            tiling_mode: TilingMode::Full,
            cursor_lock_enabled: false,
            cursor_lock_mode: CursorLockMode::FollowOverlay,
        }
    }
}

/// Derived zone geometry: a disposable snapshot, cheap to regenerate.
///
/// The optional rects are `None` when the corresponding feature is
/// disabled. `monitor_rect` and `usable_rect` are always carried: the
/// correction routine clamps windows into the usable rectangle and must
/// re-check that a window still belongs to the target monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneGeometry {
    /// Full rectangle of the target monitor.
    pub monitor_rect: Rect,
    /// The part of the target monitor not covered by the overlay
    /// (the whole monitor when the overlay is disabled).
    pub usable_rect: Rect,
    pub overlay_rect: Option<Rect>,
    pub tiling_rect: Option<Rect>,
    pub cursor_clip_rect: Option<Rect>,
}

/// Computes the zone geometry for `config` on `monitors[target_index]`.
///
/// Pure and total over its preconditions: same inputs always yield the
/// same snapshot, and no input combination is reported as an error.  An
/// out-of-range `target_index` is a caller precondition violation —
/// callers must clamp/validate a stale index before calling.
///
/// Rules:
/// - The overlay truncates the target monitor at `overlay_boundary_x`
///   (clamped into the monitor) on the configured side.
/// - The tiling rect spans the usable area in [`TilingMode::Full`], or the
///   custom bounds clipped to the monitor in [`TilingMode::Custom`].
/// - The cursor clip rect is the bounding union of the usable area beyond
///   the wall and the primary monitor's full rect, so the cursor can
///   always reach the primary monitor's taskbar and controls.
///
/// # Panics
///
/// Panics if `monitors` is empty or `target_index` is out of range.
pub fn compute_zone_geometry(
    monitors: &[Monitor],
    target_index: usize,
    config: &ZoneConfig,
) -> ZoneGeometry {
    let target = &monitors[target_index];
    let m = target.rect;

    let boundary = config.overlay_boundary_x.clamp(m.left, m.right);

    let overlay_rect = if config.overlay_enabled {
        Some(match config.overlay_side {
            OverlaySide::Left => Rect::new(m.left, m.top, boundary, m.bottom),
            OverlaySide::Right => Rect::new(boundary, m.top, m.right, m.bottom),
        })
    } else {
        None
    };

    let usable_rect = if config.overlay_enabled {
        match config.overlay_side {
            OverlaySide::Left => Rect::new(boundary, m.top, m.right, m.bottom),
            OverlaySide::Right => Rect::new(m.left, m.top, boundary, m.bottom),
        }
    } else {
        m
    };

    let tiling_rect = if config.tiling_enabled {
        Some(match config.tiling_mode {
            TilingMode::Full => usable_rect,
            TilingMode::Custom { start_x, end_x } => Rect::new(
                start_x.min(end_x).clamp(m.left, m.right),
                m.top,
                start_x.max(end_x).clamp(m.left, m.right),
                m.bottom,
            ),
        })
    } else {
        None
    };

    let cursor_clip_rect = if config.cursor_lock_enabled {
        let wall = match config.cursor_lock_mode {
            CursorLockMode::FollowOverlay => boundary,
            CursorLockMode::Custom { wall_x } => wall_x.clamp(m.left, m.right),
        };
        // Usable area beyond the wall on the target monitor. The wall side
        // follows the overlay side even for a custom wall coordinate.
        let beyond_wall = match config.overlay_side {
            OverlaySide::Left => Rect::new(wall, m.top, m.right, m.bottom),
            OverlaySide::Right => Rect::new(m.left, m.top, wall, m.bottom),
        };
        // A cursor clip is a single rectangle, so "union" means the
        // bounding rectangle of the usable area and the primary monitor.
        let primary = monitors
            .iter()
            .find(|mon| mon.is_primary)
            .map(|mon| mon.rect)
            .unwrap_or(m);
        Some(beyond_wall.bounding_union(&primary))
    } else {
        None
    };

    ZoneGeometry {
        monitor_rect: m,
        usable_rect,
        overlay_rect,
        tiling_rect,
        cursor_clip_rect,
    }
}

/// Minimal-motion clamp of `window` into `bounds`.
///
/// Translates only along axes/edges that are violated: a window straddling
/// the left edge is pushed right just far enough to clear it, never
/// recentered.  A window larger than `bounds` is shrunk to fit first.
pub fn nudge_into(window: Rect, bounds: Rect) -> Rect {
    let mut r = window;

    if r.width() > bounds.width() {
        r.right = r.left + bounds.width();
    }
    if r.height() > bounds.height() {
        r.bottom = r.top + bounds.height();
    }

    let dx = if r.left < bounds.left {
        bounds.left - r.left
    } else if r.right > bounds.right {
        bounds.right - r.right
    } else {
        0
    };
    let dy = if r.top < bounds.top {
        bounds.top - r.top
    } else if r.bottom > bounds.bottom {
        bounds.bottom - r.bottom
    } else {
        0
    };

    r.translated(dx, dy)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
