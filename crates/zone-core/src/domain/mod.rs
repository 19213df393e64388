//! Pure domain logic: zone geometry, tiling layout, and window membership.

pub mod geometry;
pub mod membership;
pub mod tiling;
