pub mod annotate;
pub mod blur;
pub mod contour;
pub mod distance;
pub mod frame;
pub mod luminance;
pub mod threshold;
