//! Convert RGBA pixel data to 8-bit luminance
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
use rayon::prelude::*;

/// Coefficients for luminance conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Below this pixel count the rayon split costs more than it saves
const PARALLEL_THRESHOLD: usize = 64 * 64;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

fn convert_row(rgba_row: &[u8], out: &mut [u8]) {
    for (px, y) in rgba_row.chunks_exact(4).zip(out.iter_mut()) {
        *y = luma(px[0], px[1], px[2]);
    }
}

/// Convert RGBA to luminance (alpha is ignored), choosing sequential or
/// row-parallel processing by image size
pub fn rgba_to_luma(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    rgba_to_luma_into(rgba, width, height, &mut gray);
    gray
}

/// Convert RGBA to luminance into a pre-allocated buffer
///
/// # Returns
/// Number of pixels written (width * height)
pub fn rgba_to_luma_into(rgba: &[u8], width: usize, height: usize, output: &mut [u8]) -> usize {
    let pixel_count = width * height;
    assert!(output.len() >= pixel_count, "Output buffer too small");
    assert!(rgba.len() >= pixel_count * 4, "Input buffer too small");
    if width == 0 {
        return 0;
    }

    let output = &mut output[..pixel_count];
    if pixel_count < PARALLEL_THRESHOLD {
        convert_row(&rgba[..pixel_count * 4], output);
    } else {
        // Process rows in parallel
        output
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                let start = y * width * 4;
                convert_row(&rgba[start..start + width * 4], row);
            });
    }
    pixel_count
}

/// Invert luminance in place (dark becomes light)
pub fn invert_luma(gray: &mut [u8]) {
    gray.par_iter_mut().for_each(|v| *v = 255 - *v);
}
