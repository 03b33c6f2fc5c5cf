//! Image utility functions.

pub mod crop;
pub mod visualization;

pub use crop::{crop_with_padding, rotate_clockwise};
pub use visualization::draw_registry_overlay;
