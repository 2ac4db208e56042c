// THEORY:
// Stage 2: suppress sensor noise before thresholding.
//
// The kernel is a 5x5 Gaussian whose standard deviation is derived from the
// kernel size. For five taps that derivation lands on the binomial row
// [1, 4, 6, 4, 1] / 16, which is what we apply, once horizontally and once
// vertically. Both passes stay in integers and the result is rounded a single
// time at the end (total weight 16 * 16 = 256), so the output is exact and
// identical on every call.
//
// Borders are mirrored without repeating the edge pixel (`dcb|abcd|cba`), so
// a constant image blurs to itself all the way to the edge.

use crate::core_modules::frame::{BlurredFrame, GrayFrame};
use image::{GrayImage, Luma};

pub const KERNEL_SIZE: usize = 5;
const KERNEL: [u32; KERNEL_SIZE] = [1, 4, 6, 4, 1];
const RADIUS: i64 = (KERNEL_SIZE / 2) as i64;
/// log2 of the combined weight of both passes.
const NORMALIZE_SHIFT: u32 = 8;

/// Applies the 5x5 Gaussian to a luminance plane.
pub fn gaussian_blur(gray: &GrayFrame) -> BlurredFrame {
    let source = gray.as_image();
    let (width, height) = source.dimensions();

    // --- Horizontal pass, kept unnormalized ---
    let mut horizontal = vec![0u32; width as usize * height as usize];
    for y in 0..height {
        for x in 0..width {
            let acc: u32 = KERNEL
                .iter()
                .enumerate()
                .map(|(tap, weight)| {
                    let sx = reflect_101(x as i64 + tap as i64 - RADIUS, width);
                    weight * source.get_pixel(sx, y).0[0] as u32
                })
                .sum();
            horizontal[(y * width + x) as usize] = acc;
        }
    }

    // --- Vertical pass, then one rounding step ---
    let blurred = GrayImage::from_fn(width, height, |x, y| {
        let acc: u32 = KERNEL
            .iter()
            .enumerate()
            .map(|(tap, weight)| {
                let sy = reflect_101(y as i64 + tap as i64 - RADIUS, height);
                weight * horizontal[(sy * width + x) as usize]
            })
            .sum();
        Luma([((acc + (1 << (NORMALIZE_SHIFT - 1))) >> NORMALIZE_SHIFT) as u8])
    });

    BlurredFrame::new(blurred)
}

/// Mirrors an out-of-range index back into `0..len` without repeating the edge.
fn reflect_101(index: i64, len: u32) -> u32 {
    let last = len as i64 - 1;
    if last <= 0 {
        return 0;
    }
    let mut index = index;
    while index < 0 || index > last {
        if index < 0 {
            index = -index;
        }
        if index > last {
            index = 2 * last - index;
        }
    }
    index as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> GrayFrame {
        GrayFrame::from_image(GrayImage::from_fn(width, height, |x, y| Luma([f(x, y)])))
    }

    #[test]
    fn reflects_without_repeating_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 5), 3);
        assert_eq!(reflect_101(-2, 2), 0);
        assert_eq!(reflect_101(2, 1), 0);
    }

    #[test]
    fn constant_image_is_unchanged() {
        let blurred = gaussian_blur(&gray(7, 6, |_, _| 77));
        assert!(blurred.as_image().pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn single_bright_pixel_spreads_binomially() {
        let blurred = gaussian_blur(&gray(9, 9, |x, y| if (x, y) == (4, 4) { 255 } else { 0 }));
        let image = blurred.as_image();
        // 255 * 36 / 256 = 35.86
        assert_eq!(image.get_pixel(4, 4).0[0], 36);
        // 255 * 24 / 256 = 23.9
        assert_eq!(image.get_pixel(5, 4).0[0], 24);
        // 255 * 1 / 256 rounds to 1
        assert_eq!(image.get_pixel(6, 6).0[0], 1);
        assert_eq!(image.get_pixel(7, 4).0[0], 0);
    }

    #[test]
    fn repeated_blur_is_deterministic() {
        let noisy = gray(16, 12, |x, y| ((x * 37 + y * 91) % 256) as u8);
        let once = gaussian_blur(&noisy).into_image();

        let first = gaussian_blur(&GrayFrame::from_image(once.clone()));
        let second = gaussian_blur(&GrayFrame::from_image(once));
        assert_eq!(first.as_image().as_raw(), second.as_image().as_raw());
    }

    #[test]
    fn handles_images_smaller_than_kernel() {
        let blurred = gaussian_blur(&gray(1, 2, |_, y| if y == 0 { 200 } else { 0 }));
        assert_eq!(blurred.dimensions(), (1, 2));
        // Rows around y = 0 reflect to [0, 1, 0, 1, 0]: (1 + 6 + 1) * 200 / 16 = 100
        assert_eq!(blurred.as_image().get_pixel(0, 0).0[0], 100);
        assert_eq!(blurred.as_image().get_pixel(0, 1).0[0], 100);
    }
}
