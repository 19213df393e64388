//! # zone-core
//!
//! Shared library for the Zone Engine containing the pure domain logic:
//! zone geometry computation, the tiling layout engine, and the managed
//! window membership tracker.
//!
//! This crate is used by the `zone-engine` application. It has zero
//! dependencies on OS APIs, UI frameworks, or threads.
//!
//! # Architecture overview (for beginners)
//!
//! The Zone Engine partitions one physical monitor into logical zones: an
//! exclusion overlay that blacks out part of the screen, a tiling zone
//! where windows are arranged automatically, and a cursor confinement
//! boundary the mouse cannot cross.  The engine then keeps the live
//! desktop converged on that partitioning while the OS and the user keep
//! disturbing it.
//!
//! This crate (`zone-core`) is the foundation.  It defines:
//!
//! - **`domain::geometry`** – How a monitor is partitioned.  Given the
//!   monitor list, a target monitor, and a `ZoneConfig`, it derives the
//!   overlay, usable, tiling, and cursor-clip rectangles.
//!
//! - **`domain::tiling`** – How the tiling zone is subdivided.  A pure,
//!   deterministic function from an ordered window list and a rectangle
//!   to a gap-free, overlap-free cell assignment.
//!
//! - **`domain::membership`** – Which windows are tiled.  An ordered set
//!   of window handles driven by window lifecycle events and explicit
//!   user selection.

// Rust will look for the module in a subdirectory with the same name
// (src/domain/mod.rs).
pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `zone_core::ZoneGeometry` instead of `zone_core::domain::geometry::ZoneGeometry`.
pub use domain::geometry::{
    compute_zone_geometry, nudge_into, CursorLockMode, Monitor, MonitorHandle, OverlaySide, Rect,
    TilingMode, ZoneConfig, ZoneGeometry, ZoneParseError,
};
pub use domain::membership::{
    is_manageable, ManagedWindowSet, MembershipChange, WindowSnapshot,
};
pub use domain::tiling::{compute_layout, TilingAssignment, WindowId};
