//! Code boundary overlay.

use crate::models::{Color, Location};
use crate::surface::RenderingContext;

/// Stroke the four edges of `location` TL→TR→BR→BL→TL
pub fn draw_location(
    context: &mut dyn RenderingContext,
    location: &Location,
    line_width: f32,
    color: Color,
) {
    for (begin, end) in location.segments() {
        context.stroke_line(begin, end, line_width, color);
    }
}
