//! Value types shared by the scanner
//!
//! Geometry in surface pixel coordinates, decode results and stroke colours.

/// CSS colour parsing for the overlay stroke
pub mod color;
/// Code corners and decode results
pub mod location;
/// 2D point in surface coordinates
pub mod point;

pub use color::Color;
pub use location::{DecodeResult, Location};
pub use point::Point;
