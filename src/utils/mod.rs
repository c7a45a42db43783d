//! Pixel helpers shared by the decoder and benchmarks
//!
//! - Luminance conversion (RGBA to 8-bit luma)
//! - Luma inversion for light-on-dark codes

pub mod luminance;
