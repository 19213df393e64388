//! Infrastructure layer: OS-boundary adapters and configuration storage.
//!
//! Everything that touches the operating system lives behind the traits in
//! `window_system`, `window_events` and `overlay_display`; the application
//! layer depends only on those traits so it can be tested against the
//! in-memory mocks.

pub mod overlay_display;
pub mod storage;
pub mod window_events;
pub mod window_system;
