// THEORY:
// The `frame` module holds the pixel containers that flow through the pipeline.
// Like the rest of the core, these are "dumb" data containers: they know their
// shape and how to hand out their pixels, but not how to analyze themselves.
//
// Key architectural principles:
// 1.  **Shape is checked once, at the door**: every way of building a `Frame`
//     verifies a non-zero size and exactly three channels. Once a `Frame`
//     exists, later stages never re-check it and never index out of bounds.
// 2.  **BGR storage**: colour frames keep the channel order the camera
//     transport delivers (blue, green, red). The buffer is an `RgbImage` so the
//     `image`/`imageproc` drawing tools work on it directly; only the channel
//     meaning differs, and colours handed to drawing routines are BGR triples.
// 3.  **One type per stage**: `GrayFrame`, `BlurredFrame` and `BinaryFrame` wrap
//     the same single-channel buffer type, but they are distinct types so the
//     stages can only be chained in pipeline order.

use crate::error::FrameError;
use image::{GrayImage, Luma, Rgb, RgbImage};

/// Number of interleaved channels in a colour frame.
pub const CHANNELS: u32 = 3;

pub type Bgr = [u8; 3];

/// Channel order of an inbound transport message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelEncoding {
    Bgr8,
    Rgb8,
}

/// An image message exactly as the transport delivers it. Nothing about it is
/// trusted until `to_pixel_buffer` has checked it.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub pixel_data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub encoding: PixelEncoding,
}

impl RawFrame {
    pub fn bgr8(width: u32, height: u32, pixel_data: Vec<u8>) -> Self {
        Self {
            pixel_data,
            width,
            height,
            channels: CHANNELS,
            encoding: PixelEncoding::Bgr8,
        }
    }

    pub fn rgb8(width: u32, height: u32, pixel_data: Vec<u8>) -> Self {
        Self {
            pixel_data,
            width,
            height,
            channels: CHANNELS,
            encoding: PixelEncoding::Rgb8,
        }
    }
}

/// Converts a transport message into a pipeline `Frame`.
///
/// Stateless: nothing is cached between calls. RGB messages are swizzled into
/// BGR order; anything that is not a non-empty three-channel buffer of the
/// advertised size is rejected.
pub fn to_pixel_buffer(raw: &RawFrame) -> Result<Frame, FrameError> {
    check_shape(raw.width, raw.height, raw.channels, raw.pixel_data.len())?;

    let mut data = raw.pixel_data.clone();
    if raw.encoding == PixelEncoding::Rgb8 {
        for pixel in data.chunks_exact_mut(CHANNELS as usize) {
            pixel.swap(0, 2);
        }
    }
    Frame::from_bgr(raw.width, raw.height, data)
}

fn check_shape(width: u32, height: u32, channels: u32, len: usize) -> Result<(), FrameError> {
    if width == 0 || height == 0 {
        return Err(FrameError::EmptyFrame { width, height });
    }
    if channels != CHANNELS {
        return Err(FrameError::ChannelCount { channels });
    }
    let expected = width as usize * height as usize * channels as usize;
    if len != expected {
        return Err(FrameError::BufferLength {
            expected,
            actual: len,
            width,
            height,
            channels,
        });
    }
    Ok(())
}

/// A three-channel BGR frame, annotated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    canvas: RgbImage,
}

impl Frame {
    /// Wraps an interleaved BGR buffer of `width * height * 3` bytes.
    pub fn from_bgr(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        check_shape(width, height, CHANNELS, data.len())?;
        let actual = data.len();
        let canvas = RgbImage::from_raw(width, height, data).ok_or(FrameError::BufferLength {
            expected: width as usize * height as usize * CHANNELS as usize,
            actual,
            width,
            height,
            channels: CHANNELS,
        })?;
        Ok(Self { canvas })
    }

    /// A frame of a single colour.
    pub fn filled(width: u32, height: u32, color: Bgr) -> Result<Self, FrameError> {
        let data = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS as usize)
            .collect();
        Self::from_bgr(width, height, data)
    }

    /// Builds a frame from a decoded RGB image (e.g. a file on disk).
    pub fn from_rgb_image(image: &RgbImage) -> Result<Self, FrameError> {
        let (width, height) = image.dimensions();
        let mut data = image.as_raw().clone();
        for pixel in data.chunks_exact_mut(CHANNELS as usize) {
            pixel.swap(0, 2);
        }
        Self::from_bgr(width, height, data)
    }

    /// Copies the frame out in RGB order for encoding or display.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width(), self.height(), |x, y| {
            let [b, g, r] = self.pixel(x, y);
            Rgb([r, g, b])
        })
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// The BGR triple at `(x, y)`. Panics outside the frame, like `image`'s `get_pixel`.
    pub fn pixel(&self, x: u32, y: u32) -> Bgr {
        self.canvas.get_pixel(x, y).0
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Bgr) {
        self.canvas.put_pixel(x, y, Rgb(color));
    }

    /// Interleaved BGR bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        self.canvas.as_raw()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.canvas.into_raw()
    }

    /// Drawing surface for annotation. Colours written here are BGR triples.
    pub(crate) fn canvas_mut(&mut self) -> &mut RgbImage {
        &mut self.canvas
    }
}

/// Single-channel luminance of a `Frame`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame(GrayImage);

/// Luminance after noise suppression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlurredFrame(GrayImage);

/// Foreground mask: every pixel is either 0 or 255.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFrame(GrayImage);

impl GrayFrame {
    /// Treats an existing single-channel image as luminance, e.g. to re-run
    /// the blur stage on its own output.
    pub fn from_image(image: GrayImage) -> Self {
        Self(image)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

impl BlurredFrame {
    pub(crate) fn new(image: GrayImage) -> Self {
        Self(image)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

impl BinaryFrame {
    pub(crate) fn new(image: GrayImage) -> Self {
        Self(image)
    }

    /// Builds a mask from any single-channel image; non-zero pixels become 255.
    pub fn from_mask(mut image: GrayImage) -> Self {
        for Luma([value]) in image.pixels_mut() {
            if *value != 0 {
                *value = u8::MAX;
            }
        }
        Self(image)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn foreground_count(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        let err = to_pixel_buffer(&RawFrame::bgr8(0, 4, Vec::new())).unwrap_err();
        assert_eq!(err, FrameError::EmptyFrame { width: 0, height: 4 });
    }

    #[test]
    fn rejects_wrong_channel_count() {
        let raw = RawFrame {
            pixel_data: vec![0; 2 * 2 * 4],
            width: 2,
            height: 2,
            channels: 4,
            encoding: PixelEncoding::Bgr8,
        };
        assert_eq!(
            to_pixel_buffer(&raw).unwrap_err(),
            FrameError::ChannelCount { channels: 4 }
        );
    }

    #[test]
    fn rejects_short_buffer() {
        let err = to_pixel_buffer(&RawFrame::bgr8(4, 4, vec![0; 47])).unwrap_err();
        assert!(matches!(
            err,
            FrameError::BufferLength {
                expected: 48,
                actual: 47,
                ..
            }
        ));
        assert!(err.to_string().contains("47"));
    }

    #[test]
    fn rgb_messages_are_swizzled_to_bgr() {
        let raw = RawFrame::rgb8(2, 1, vec![10, 20, 30, 40, 50, 60]);
        let frame = to_pixel_buffer(&raw).expect("valid frame");
        assert_eq!(frame.pixel(0, 0), [30, 20, 10]);
        assert_eq!(frame.pixel(1, 0), [60, 50, 40]);
    }

    #[test]
    fn bgr_messages_pass_through() {
        let raw = RawFrame::bgr8(2, 1, vec![10, 20, 30, 40, 50, 60]);
        let frame = to_pixel_buffer(&raw).expect("valid frame");
        assert_eq!(frame.as_bytes(), &[10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn rgb_image_bridge_restores_channel_order() {
        let image = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 200]));
        let frame = Frame::from_rgb_image(&image).expect("valid frame");
        assert_eq!(frame.pixel(2, 1), [200, 1, 2]);
        assert_eq!(frame.to_rgb_image(), image);
    }

    #[test]
    fn filled_frame_has_uniform_pixels() {
        let frame = Frame::filled(4, 3, [1, 2, 3]).expect("valid frame");
        assert_eq!(frame.dimensions(), (4, 3));
        assert!(frame.as_bytes().chunks_exact(3).all(|p| p == [1, 2, 3]));
    }

    #[test]
    fn mask_normalizes_foreground() {
        let mut image = GrayImage::new(3, 1);
        image.put_pixel(1, 0, Luma([7]));
        let mask = BinaryFrame::from_mask(image);
        assert_eq!(mask.as_image().as_raw(), &vec![0, 255, 0]);
        assert_eq!(mask.foreground_count(), 1);
    }
}
