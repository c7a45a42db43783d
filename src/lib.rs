//! RustQR live scanner
//!
//! Captures camera frames into a drawing surface, decodes each ready frame
//! for a QR code and outlines the code's boundary, emitting the decoded text
//! per frame. Decoding is delegated to a [`decoder::QrDecoder`]; camera and
//! drawing are host services behind [`media::MediaDevices`] and
//! [`surface::RenderingContext`].
//!
//! ```
//! use qr_scanner::{AnimationFrameLoop, QrScanner, ScanConfig};
//! use qr_scanner::media::ImageSequenceDevices;
//!
//! let frames = vec![image::RgbaImage::new(64, 48)];
//! let mut scanner = QrScanner::new(ScanConfig::default(), ImageSequenceDevices::new(frames));
//! scanner.init();
//! scanner.on_data(|text| println!("scanned: {text}"));
//! if let Some(token) = scanner.start() {
//!     AnimationFrameLoop::unthrottled().max_frames(3).run(&mut scanner, token);
//! }
//! scanner.stop();
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Capture source (video element equivalent)
pub mod capture;
/// Scanner settings and TOML loading
pub mod config;
/// Decoder trait and the `rqrr`-backed implementation
pub mod decoder;
/// Error types
pub mod error;
/// Output event emitter
pub mod events;
/// Animation-frame scheduler for the scan loop
pub mod frame_loop;
/// Camera device and stream abstractions
pub mod media;
/// Core data structures (Point, Color, Location, DecodeResult)
pub mod models;
/// Code boundary overlay drawing
pub mod overlay;
/// The scanner component
pub mod scanner;
/// Session state machine
pub mod session;
/// Drawing surface
pub mod surface;
/// Pixel helpers (luminance)
pub mod utils;

pub use config::{ScanConfig, ScannerSettings};
pub use decoder::{DecodeOptions, InversionAttempts, QrDecoder, RqrrDecoder};
pub use error::{MediaError, Result, ScanError};
pub use frame_loop::{AnimationFrameLoop, LoopSummary};
pub use models::{Color, DecodeResult, Location, Point};
pub use scanner::{QrScanner, StopOutcome, TickOutcome};
pub use session::{SessionState, SessionToken};
pub use surface::{ImageData, RenderingContext, Surface};
