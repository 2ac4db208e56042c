// THEORY:
// Stage 1 of the pipeline: reduce a BGR frame to one luminance channel.
//
// Luminance uses the Rec. 601 luma weights (0.299 R + 0.587 G + 0.114 B). The
// weights are held as 14-bit fixed-point integers that sum to exactly 1 << 14,
// so pure white stays 255, pure black stays 0, and the result is bit-for-bit
// reproducible on every platform with no floating-point rounding drift.

use crate::core_modules::frame::{Bgr, Frame, GrayFrame};
use image::{GrayImage, Luma};

const LUMA_SHIFT: u32 = 14;
const BLUE_WEIGHT: u32 = 1868;
const GREEN_WEIGHT: u32 = 9617;
const RED_WEIGHT: u32 = 4899;

/// Rec. 601 luma of a single BGR pixel, rounded to nearest.
pub fn luma(pixel: Bgr) -> u8 {
    let [blue, green, red] = pixel;
    let weighted =
        blue as u32 * BLUE_WEIGHT + green as u32 * GREEN_WEIGHT + red as u32 * RED_WEIGHT;
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Converts a colour frame into its luminance plane.
pub fn to_gray(frame: &Frame) -> GrayFrame {
    let (width, height) = frame.dimensions();
    GrayFrame::from_image(GrayImage::from_fn(width, height, |x, y| {
        Luma([luma(frame.pixel(x, y))])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_unity() {
        assert_eq!(BLUE_WEIGHT + GREEN_WEIGHT + RED_WEIGHT, 1 << LUMA_SHIFT);
        assert_eq!(luma([255, 255, 255]), 255);
        assert_eq!(luma([0, 0, 0]), 0);
        assert_eq!(luma([128, 128, 128]), 128);
    }

    #[test]
    fn green_dominates_blue() {
        // 0.114 * 255 = 29.07, 0.587 * 255 = 149.69, 0.299 * 255 = 76.25
        assert_eq!(luma([255, 0, 0]), 29);
        assert_eq!(luma([0, 255, 0]), 150);
        assert_eq!(luma([0, 0, 255]), 76);
    }

    #[test]
    fn converts_every_pixel() {
        let mut frame = Frame::filled(3, 2, [0, 0, 0]).expect("valid frame");
        frame.put_pixel(2, 1, [255, 255, 255]);
        let gray = to_gray(&frame);
        assert_eq!(gray.dimensions(), (3, 2));
        assert_eq!(gray.as_image().get_pixel(2, 1).0, [255]);
        assert_eq!(gray.as_image().get_pixel(0, 0).0, [0]);
    }
}
