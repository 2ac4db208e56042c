// THEORY:
// Stage 8: draw the result onto the operator's frame, in place.
//
// Two marks are made: the outline of the selected contour and a one-line
// label with the range. Both use a fixed colour and position so the overlay
// looks the same on every frame. The label is rendered from 8x8 bitmap glyphs
// scaled up by an integer factor; `LABEL_ORIGIN` is the left end of the text
// baseline. Anything that falls outside the frame is clipped.

use crate::core_modules::contour::Contour;
use crate::core_modules::distance::Distance;
use crate::core_modules::frame::{Bgr, Frame};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::Rgb;
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Green, in BGR order.
pub const ANNOTATION_COLOR: Bgr = [0, 255, 0];
pub const STROKE_WIDTH: i32 = 2;
pub const LABEL_ORIGIN: (i32, i32) = (10, 30);
/// Each glyph pixel becomes a `GLYPH_SCALE x GLYPH_SCALE` block.
pub const GLYPH_SCALE: u32 = 3;
const GLYPH_SIZE: u32 = 8;

/// The overlay text for a range estimate.
pub fn label_for(distance: Distance) -> String {
    format!("Distance: {distance}")
}

/// Draws the contour outline and the label onto `frame`.
pub fn annotate(frame: &mut Frame, contour: &Contour, label: &str) {
    draw_contour(frame, contour);
    draw_label(frame, label);
}

/// Traces the closed contour with a `STROKE_WIDTH`-pixel line centred on the
/// boundary. An even width puts the extra pixel above and to the left.
pub fn draw_contour(frame: &mut Frame, contour: &Contour) {
    let points = contour.points();
    let color = Rgb(ANNOTATION_COLOR);
    let canvas = frame.canvas_mut();
    let offsets = -(STROKE_WIDTH / 2)..STROKE_WIDTH - STROKE_WIDTH / 2;

    for (i, start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        for dy in offsets.clone() {
            for dx in offsets.clone() {
                draw_line_segment_mut(
                    canvas,
                    ((start.x + dx) as f32, (start.y + dy) as f32),
                    ((end.x + dx) as f32, (end.y + dy) as f32),
                    color,
                );
            }
        }
    }
}

/// Renders `text` with its baseline starting at `LABEL_ORIGIN`. Characters
/// without a glyph advance the pen but draw nothing.
pub fn draw_label(frame: &mut Frame, text: &str) {
    let color = Rgb(ANNOTATION_COLOR);
    let canvas = frame.canvas_mut();
    let cell = (GLYPH_SIZE * GLYPH_SCALE) as i32;
    let (mut pen_x, baseline) = LABEL_ORIGIN;
    let top = baseline - cell;

    for ch in text.chars() {
        if let Some(glyph) = BASIC_FONTS.get(ch) {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let x = pen_x + (col * GLYPH_SCALE) as i32;
                    let y = top + row as i32 * GLYPH_SCALE as i32;
                    draw_filled_rect_mut(
                        canvas,
                        Rect::at(x, y).of_size(GLYPH_SCALE, GLYPH_SCALE),
                        color,
                    );
                }
            }
        }
        pen_x += cell;
    }
}
