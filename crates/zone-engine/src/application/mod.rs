//! Application layer: enforcement orchestration.
//!
//! The application layer sits between the domain (pure zone geometry,
//! layout and membership rules in `zone-core`) and the infrastructure
//! (Win32 adapters).  Everything here:
//!
//! - **Orchestrates** domain functions to keep the desktop converged on
//!   the configured zones (corrections, retiling, cursor confinement).
//! - **Depends on abstractions** (`WindowSystem`, `WindowEventSource`)
//!   rather than concrete implementations, so the infrastructure can be
//!   swapped without changing this code.
//! - **Contains no direct OS calls** — those live behind the traits.
//!
//! # Sub-modules
//!
//! - **`enforce_zones`** – The correction coordinator: owns the shared
//!   enforcement state and the fast (event) and slow (poll) correction
//!   paths.  This is the most critical module — it runs on every window
//!   move and every poll tick.
//!
//! - **`cursor_guard`** – The level-triggered cursor confinement loop.
//!
//! - **`commands`** – The engine command surface and observer channel:
//!   the single entry point through which configuration changes and user
//!   actions reach the enforcement state.

pub mod commands;
pub mod cursor_guard;
pub mod enforce_zones;
