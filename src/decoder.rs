//! Decoder seam
//!
//! The scan loop never decodes anything itself: it hands raw RGBA surface
//! pixels to a [`QrDecoder`] and gets back at most one [`DecodeResult`].
//! [`RqrrDecoder`] is the stock implementation; any closure with the same
//! shape also works, which is how tests substitute fixed results.

use crate::models::{DecodeResult, Location, Point};
use crate::utils::luminance::{invert_luma, rgba_to_luma};
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Which luminance polarities the decoder should try
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InversionAttempts {
    /// Original image first, then inverted
    #[default]
    AttemptBoth,
    /// Original image only (dark modules on light background)
    DontInvert,
    /// Inverted image only
    OnlyInvert,
    /// Inverted image first, then original
    InvertFirst,
}

impl InversionAttempts {
    /// Passes to run in order; `true` means the inverted image
    pub fn passes(self) -> &'static [bool] {
        match self {
            InversionAttempts::AttemptBoth => &[false, true],
            InversionAttempts::DontInvert => &[false],
            InversionAttempts::OnlyInvert => &[true],
            InversionAttempts::InvertFirst => &[true, false],
        }
    }
}

/// Options passed with every decode call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Inversion strategy
    pub inversion_attempts: InversionAttempts,
}

impl DecodeOptions {
    /// Options with the given inversion strategy
    pub fn new(inversion_attempts: InversionAttempts) -> Self {
        Self { inversion_attempts }
    }
}

/// Decode one RGBA frame (4 bytes per pixel, row-major)
pub trait QrDecoder {
    /// Return the first code found, or `None` when the frame holds no readable code
    fn decode(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Option<DecodeResult>;
}

impl<F> QrDecoder for F
where
    F: Fn(&[u8], u32, u32, &DecodeOptions) -> Option<DecodeResult>,
{
    fn decode(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Option<DecodeResult> {
        self(rgba, width, height, options)
    }
}

/// Decoder backed by the `rqrr` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    /// Create a decoder
    pub fn new() -> Self {
        Self
    }

    fn decode_luma(gray: GrayImage) -> Option<DecodeResult> {
        let mut prepared = rqrr::PreparedImage::prepare(gray);
        for grid in prepared.detect_grids() {
            let mut bytes = Vec::new();
            match grid.decode_to(&mut bytes) {
                Ok(meta) => {
                    let data = match String::from_utf8(bytes.clone()) {
                        Ok(text) => text,
                        Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
                    };
                    let corners = grid.bounds.map(Point::from);
                    return Some(DecodeResult {
                        data,
                        binary_data: bytes,
                        version: u8::try_from(meta.version.0).ok(),
                        location: Location::from_corners(corners),
                    });
                }
                Err(err) => {
                    tracing::trace!(error = ?err, "grid found but not decodable");
                }
            }
        }
        None
    }
}

impl QrDecoder for RqrrDecoder {
    fn decode(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Option<DecodeResult> {
        let (w, h) = (width as usize, height as usize);
        if w == 0 || h == 0 || rgba.len() < w * h * 4 {
            return None;
        }

        let luma = rgba_to_luma(rgba, w, h);
        for &inverted in options.inversion_attempts.passes() {
            let mut pixels = luma.clone();
            if inverted {
                invert_luma(&mut pixels);
            }
            let gray = GrayImage::from_raw(width, height, pixels)?;
            if let Some(result) = Self::decode_luma(gray) {
                return Some(result);
            }
        }
        None
    }
}
