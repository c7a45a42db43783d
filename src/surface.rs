//! Drawing surface
//!
//! [`RenderingContext`] is the subset of a 2D canvas context the scanner
//! needs. [`Surface`] implements it over an `image::RgbaImage`, with
//! canvas semantics: out-of-bounds reads are transparent black, drawing is
//! clipped, and colours are composited source-over.

use crate::models::{Color, Point};
use image::imageops::{self, FilterType};
use image::error::{ImageError, ParameterError, ParameterErrorKind};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Pixel block read back from a surface, RGBA row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// 4 bytes per pixel
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageData {
    /// Write the pixels as an image file (format from extension)
    pub fn save<P: AsRef<Path>>(self, path: P) -> crate::error::Result<()> {
        let image = RgbaImage::from_raw(self.width, self.height, self.data).ok_or_else(|| {
            ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        image.save(path)?;
        Ok(())
    }
}

/// 2D drawing primitives used by the scanner
pub trait RenderingContext {
    /// Surface width in pixels
    fn width(&self) -> u32;

    /// Surface height in pixels
    fn height(&self) -> u32;

    /// Resize the surface; contents are cleared to transparent
    fn resize(&mut self, width: u32, height: u32);

    /// Fill a rectangle with a solid colour
    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color);

    /// Draw an opaque video `frame` scaled to `width`x`height` at (`x`, `y`)
    fn draw_frame(&mut self, frame: &RgbaImage, x: i32, y: i32, width: u32, height: u32);

    /// Read back a rectangle of pixels
    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> ImageData;

    /// Stroke a straight segment with butt caps
    fn stroke_line(&mut self, from: Point, to: Point, line_width: f32, color: Color);
}

/// Raster surface
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    /// Transparent surface of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Underlying pixel buffer
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Pixel at (x, y), `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.pixels.width() || y >= self.pixels.height() {
            return None;
        }
        let Rgba([r, g, b, a]) = *self.pixels.get_pixel(x, y);
        Some(Color::rgba(r, g, b, a))
    }

    fn blend(&mut self, x: u32, y: u32, src: Rgba<u8>) {
        let dst = self.pixels.get_pixel_mut(x, y);
        *dst = source_over(src, *dst);
    }

    /// Clip a rectangle to the surface; returns (x0, y0, x1, y1) exclusive
    fn clip(&self, x: i64, y: i64, width: i64, height: i64) -> Option<(u32, u32, u32, u32)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(self.pixels.width() as i64);
        let y1 = (y + height).min(self.pixels.height() as i64);
        (x0 < x1 && y0 < y1).then_some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }
}

fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        255 => src,
        0 => dst,
        alpha => {
            let sa = alpha as f32 / 255.0;
            let da = dst[3] as f32 / 255.0;
            let out_a = sa + da * (1.0 - sa);
            let mut out = [0u8; 4];
            for c in 0..3 {
                let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
                out[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            out[3] = (out_a * 255.0).round() as u8;
            Rgba(out)
        }
    }
}

impl RenderingContext for Surface {
    fn width(&self) -> u32 {
        self.pixels.width()
    }

    fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip(x as i64, y as i64, width as i64, height as i64)
        else {
            return;
        };
        let src = color.to_rgba();
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, src);
            }
        }
    }

    fn draw_frame(&mut self, frame: &RgbaImage, x: i32, y: i32, width: u32, height: u32) {
        if width == 0 || height == 0 || frame.width() == 0 || frame.height() == 0 {
            return;
        }
        let scaled;
        let frame = if frame.dimensions() == (width, height) {
            frame
        } else {
            scaled = imageops::resize(frame, width, height, FilterType::Triangle);
            &scaled
        };
        let Some((x0, y0, x1, y1)) = self.clip(x as i64, y as i64, width as i64, height as i64)
        else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let sx = (px as i64 - x as i64) as u32;
                let sy = (py as i64 - y as i64) as u32;
                // Video frames are opaque
                let Rgba([r, g, b, _]) = *frame.get_pixel(sx, sy);
                self.pixels.put_pixel(px, py, Rgba([r, g, b, 255]));
            }
        }
    }

    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> ImageData {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        if let Some((x0, y0, x1, y1)) = self.clip(x as i64, y as i64, width as i64, height as i64) {
            for py in y0..y1 {
                for px in x0..x1 {
                    let dx = (px as i64 - x as i64) as usize;
                    let dy = (py as i64 - y as i64) as usize;
                    let idx = (dy * width as usize + dx) * 4;
                    data[idx..idx + 4].copy_from_slice(&self.pixels.get_pixel(px, py).0);
                }
            }
        }
        ImageData {
            data,
            width,
            height,
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, line_width: f32, color: Color) {
        if line_width <= 0.0 || !line_width.is_finite() {
            return;
        }
        let half = line_width / 2.0;
        let len = from.distance(&to);
        if len == 0.0 {
            // Zero-length segment with butt caps paints nothing
            return;
        }
        let (ux, uy) = ((to.x - from.x) / len, (to.y - from.y) / len);

        let min_x = (from.x.min(to.x) - half).floor() as i64;
        let min_y = (from.y.min(to.y) - half).floor() as i64;
        let max_x = (from.x.max(to.x) + half).ceil() as i64;
        let max_y = (from.y.max(to.y) + half).ceil() as i64;
        let Some((x0, y0, x1, y1)) = self.clip(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
        else {
            return;
        };

        let src = color.to_rgba();
        for py in y0..y1 {
            for px in x0..x1 {
                // Sample at the pixel centre
                let cx = px as f32 + 0.5 - from.x;
                let cy = py as f32 + 0.5 - from.y;
                let along = cx * ux + cy * uy;
                let across = (cx * uy - cy * ux).abs();
                if (0.0..=len).contains(&along) && across <= half {
                    self.blend(px, py, src);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_save() {
        let mut surface = Surface::new(3, 2);
        surface.fill_rect(0, 0, 3, 2, Color::rgb(10, 20, 30));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.png");
        surface.get_image_data(0, 0, 3, 2).save(&path).unwrap();

        let saved = image::open(&path).unwrap().to_rgba8();
        assert_eq!(saved.dimensions(), (3, 2));
        assert_eq!(saved.get_pixel(2, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_image_data_save_rejects_short_buffer() {
        let data = ImageData {
            data: vec![0; 4],
            width: 3,
            height: 2,
        };
        let dir = tempfile::tempdir().unwrap();
        let err = data.save(dir.path().join("short.png")).unwrap_err();
        assert!(matches!(err, crate::error::ScanError::Image(_)));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut surface = Surface::new(4, 4);
        surface.fill_rect(-2, -2, 4, 4, Color::rgb(255, 0, 0));
        assert_eq!(surface.pixel(0, 0), Some(Color::rgb(255, 0, 0)));
        assert_eq!(surface.pixel(1, 1), Some(Color::rgb(255, 0, 0)));
        assert_eq!(surface.pixel(2, 2), Some(Color::rgba(0, 0, 0, 0)));
    }

    #[test]
    fn test_get_image_data_out_of_bounds_is_transparent() {
        let mut surface = Surface::new(2, 2);
        surface.fill_rect(0, 0, 2, 2, Color::rgb(1, 2, 3));
        let data = surface.get_image_data(1, 1, 2, 2);
        assert_eq!(data.data.len(), 16);
        assert_eq!(&data.data[0..4], &[1, 2, 3, 255]);
        assert_eq!(&data.data[4..8], &[0, 0, 0, 0]);
        assert_eq!(&data.data[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_draw_frame_scales_to_target() {
        let mut surface = Surface::new(8, 6);
        let frame = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        surface.draw_frame(&frame, 0, 0, 8, 6);
        for y in 0..6 {
            for x in 0..8 {
                let px = surface.pixel(x, y).unwrap();
                assert!(px.r.abs_diff(10) <= 1 && px.g.abs_diff(20) <= 1 && px.b.abs_diff(30) <= 1);
                assert_eq!(px.a, 255);
            }
        }
    }

    #[test]
    fn test_draw_frame_same_size_is_exact() {
        let mut surface = Surface::new(3, 2);
        let frame = RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8, y as u8, 7, 255]));
        surface.draw_frame(&frame, 0, 0, 3, 2);
        assert_eq!(surface.pixels(), &frame);
    }

    #[test]
    fn test_stroke_horizontal_line() {
        let mut surface = Surface::new(10, 10);
        surface.fill_rect(0, 0, 10, 10, Color::BLACK);
        let green = Color::OVERLAY_GREEN;
        surface.stroke_line(Point::new(1.0, 5.0), Point::new(9.0, 5.0), 2.0, green);
        assert_eq!(surface.pixel(4, 4), Some(green));
        assert_eq!(surface.pixel(4, 5), Some(green));
        assert_eq!(surface.pixel(4, 3), Some(Color::BLACK));
        assert_eq!(surface.pixel(4, 6), Some(Color::BLACK));
        // Butt caps: nothing before the start point
        assert_eq!(surface.pixel(0, 5), Some(Color::BLACK));
    }

    #[test]
    fn test_stroke_blends_translucent() {
        let mut surface = Surface::new(3, 3);
        surface.fill_rect(0, 0, 3, 3, Color::BLACK);
        surface.stroke_line(
            Point::new(0.0, 1.5),
            Point::new(3.0, 1.5),
            1.0,
            Color::rgba(255, 255, 255, 128),
        );
        let px = surface.pixel(1, 1).unwrap();
        assert_eq!(px.a, 255);
        assert!(px.r > 100 && px.r < 156);
    }

    #[test]
    fn test_resize_clears() {
        let mut surface = Surface::new(2, 2);
        surface.fill_rect(0, 0, 2, 2, Color::BLACK);
        surface.resize(3, 1);
        assert_eq!((surface.width(), surface.height()), (3, 1));
        assert_eq!(surface.pixel(0, 0), Some(Color::rgba(0, 0, 0, 0)));
    }
}
