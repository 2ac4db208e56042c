// Stage 3: global, fixed binarization. Strictly-greater-than keeps the cutoff
// value itself in the background.

use crate::core_modules::frame::{BinaryFrame, BlurredFrame};
use imageproc::contrast::{ThresholdType, threshold};

pub const FOREGROUND: u8 = u8::MAX;
pub const BACKGROUND: u8 = 0;

/// Pixels above `cutoff` become `FOREGROUND`, everything else `BACKGROUND`.
pub fn binarize(blurred: &BlurredFrame, cutoff: u8) -> BinaryFrame {
    BinaryFrame::new(threshold(blurred.as_image(), cutoff, ThresholdType::Binary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::blur::gaussian_blur;
    use crate::core_modules::frame::GrayFrame;
    use image::{GrayImage, Luma};

    #[test]
    fn boundary_levels() {
        let levels = GrayFrame::from_image(GrayImage::from_fn(5, 5, |_, _| Luma([50])));
        assert_eq!(binarize(&gaussian_blur(&levels), 50).foreground_count(), 0);

        let levels = GrayFrame::from_image(GrayImage::from_fn(5, 5, |_, _| Luma([51])));
        let binary = binarize(&gaussian_blur(&levels), 50);
        assert_eq!(binary.foreground_count(), 25);
        assert!(binary.as_image().pixels().all(|p| p.0[0] == FOREGROUND));
    }

    #[test]
    fn mixed_levels_split_at_cutoff() {
        // Column 0 blurs to 33, column 4 stays at 200.
        let levels = GrayFrame::from_image(GrayImage::from_fn(5, 5, |x, _| {
            Luma([if x < 2 { 10 } else { 200 }])
        }));
        let binary = binarize(&gaussian_blur(&levels), 50);
        assert_eq!(binary.as_image().get_pixel(0, 2).0[0], BACKGROUND);
        assert_eq!(binary.as_image().get_pixel(4, 2).0[0], FOREGROUND);
    }
}
