// THEORY:
// The `pipeline` module is the top-level API of the rangefinder. It strings the
// core stages together into one synchronous call: a colour frame goes in, the
// same frame comes back annotated, together with what was measured.
//
// Each call stands alone: nothing carries over between frames, so identical
// pixels with identical configuration always give identical output. Every
// intermediate buffer belongs to the call that made it and is dropped before
// the call returns.

use crate::core_modules::annotate::{annotate, label_for};
use crate::core_modules::blur::gaussian_blur;
use crate::core_modules::contour::{find_external_contours, select_largest};
use crate::core_modules::distance::estimate_distance;
use crate::core_modules::frame::BinaryFrame;
use crate::core_modules::luminance::to_gray;
use crate::core_modules::threshold::binarize;
use tracing::trace;

// Re-export key data structures for the public API.
pub use crate::config::{CameraParameters, PipelineConfig};
pub use crate::core_modules::contour::Contour;
pub use crate::core_modules::distance::Distance;
pub use crate::core_modules::frame::Frame;

/// What was found in the frame's selected contour.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// The largest external contour, chain-compressed.
    pub contour: Contour,
    /// Enclosed area of `contour` in square pixels.
    pub contour_area: f64,
    pub distance: Distance,
    /// The text drawn onto the frame.
    pub label: String,
}

/// The outcome of measuring one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    /// Nothing above the threshold; the frame passes through untouched.
    NoContour,
    Target(Detection),
}

impl Measurement {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            Measurement::NoContour => None,
            Measurement::Target(detection) => Some(detection),
        }
    }

    pub fn distance(&self) -> Option<Distance> {
        self.detection().map(|d| d.distance)
    }
}

/// The primary output of the pipeline for a single frame.
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    /// The input frame, annotated in place when a target was measured.
    pub frame: Frame,
    pub measurement: Measurement,
}

/// Runs the per-frame vision pipeline.
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    config: PipelineConfig,
}

impl FrameProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn process(&self, mut frame: Frame) -> ProcessedFrame {
        // Stage 1: Luminance
        let gray = to_gray(&frame);

        // Stage 2: Noise Suppression
        let blurred = gaussian_blur(&gray);

        // Stage 3: Binarization
        let binary = binarize(&blurred, self.config.binary_threshold);

        // Stages 4-7: Contours, Selection, Range
        let measurement = self.measure(&binary);

        // Stage 8: Annotation
        if let Measurement::Target(detection) = &measurement {
            annotate(&mut frame, &detection.contour, &detection.label);
        }

        ProcessedFrame { frame, measurement }
    }

    /// Finds the largest external contour in a foreground mask and estimates
    /// its range. Does not draw anything.
    pub fn measure(&self, binary: &BinaryFrame) -> Measurement {
        let contours = find_external_contours(binary);
        trace!(contours = contours.len(), "extracted external contours");

        let Some(largest) = select_largest(&contours) else {
            return Measurement::NoContour;
        };

        let contour_area = largest.area();
        let distance = estimate_distance(contour_area, &self.config.camera);
        Measurement::Target(Detection {
            contour: largest.clone(),
            contour_area,
            distance,
            label: label_for(distance),
        })
    }
}

/// One-shot form of `FrameProcessor::process` with the default threshold.
pub fn process(frame: Frame, params: &CameraParameters) -> ProcessedFrame {
    FrameProcessor::new(PipelineConfig::with_camera(*params)).process(frame)
}
