// THEORY:
// Stage 7: the pinhole approximation.
//
//     distance = focal_length_px * real_object_width_m / sqrt(contour_area)
//
// Area grows with the square of apparent linear size, so its square root stands
// in for the object's apparent width in pixels. This is a coarse, single-axis
// estimate aimed at one known object class at moderate range, not a
// photogrammetric solve.
//
// A zero (or negative, or NaN) area cannot be divided through. Instead of
// leaning on IEEE infinity surviving every later formatting step, the result
// is a tagged value and callers must handle `Unavailable` explicitly.

use crate::config::CameraParameters;
use std::fmt;

/// A single range estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    /// Estimated distance to the object in metres.
    Meters(f64),
    /// No valid measurement: the selected contour encloses no area.
    Unavailable,
}

impl Distance {
    pub fn meters(&self) -> Option<f64> {
        match self {
            Distance::Meters(m) => Some(*m),
            Distance::Unavailable => None,
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distance::Meters(m) => write!(f, "{m:.2} m"),
            Distance::Unavailable => f.write_str("inf"),
        }
    }
}

/// Estimates range from the area of the object's contour.
pub fn estimate_distance(contour_area: f64, camera: &CameraParameters) -> Distance {
    if contour_area.is_nan() || contour_area <= 0.0 {
        return Distance::Unavailable;
    }
    Distance::Meters(camera.focal_length_px() * camera.real_object_width_m() / contour_area.sqrt())
}
