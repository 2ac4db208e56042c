// THEORY:
// Everything the pipeline needs to know about the camera lives here, in one
// explicit value handed to the processor. Nothing is read from globals and no
// literal is buried inside a processing function.
//
// Key principles:
// 1.  **Validated on construction**: `CameraParameters` can only exist with a
//     strictly positive, finite focal length and object width. Deserialization
//     goes through the same check, so a bad config file fails at load time
//     instead of producing negative or infinite distances frame after frame.
// 2.  **Defaults match the deployed camera**: 700 px focal length, 0.2 m target
//     width and a binarization cutoff of 50. Any field may be omitted from a
//     config file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FOCAL_LENGTH_PX: f64 = 700.0;
pub const DEFAULT_REAL_OBJECT_WIDTH_M: f64 = 0.2;
/// Fixed global cutoff. Assumes a known lighting and contrast regime; scenes
/// with a bright background will segment poorly.
pub const DEFAULT_BINARY_THRESHOLD: u8 = 50;

/// Pinhole-camera constants for a single camera and target class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCameraParameters", into = "RawCameraParameters")]
pub struct CameraParameters {
    focal_length_px: f64,
    real_object_width_m: f64,
}

impl CameraParameters {
    pub fn new(focal_length_px: f64, real_object_width_m: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            focal_length_px: positive("focal_length_px", focal_length_px)?,
            real_object_width_m: positive("real_object_width_m", real_object_width_m)?,
        })
    }

    /// Focal length in pixels, determined experimentally per camera.
    pub fn focal_length_px(&self) -> f64 {
        self.focal_length_px
    }

    /// Physical width of the tracked object class in metres.
    pub fn real_object_width_m(&self) -> f64 {
        self.real_object_width_m
    }
}

impl Default for CameraParameters {
    fn default() -> Self {
        Self {
            focal_length_px: DEFAULT_FOCAL_LENGTH_PX,
            real_object_width_m: DEFAULT_REAL_OBJECT_WIDTH_M,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCameraParameters {
    #[serde(default = "default_focal_length_px")]
    focal_length_px: f64,
    #[serde(default = "default_real_object_width_m")]
    real_object_width_m: f64,
}

fn default_focal_length_px() -> f64 {
    DEFAULT_FOCAL_LENGTH_PX
}

fn default_real_object_width_m() -> f64 {
    DEFAULT_REAL_OBJECT_WIDTH_M
}

impl TryFrom<RawCameraParameters> for CameraParameters {
    type Error = ConfigError;

    fn try_from(raw: RawCameraParameters) -> Result<Self, Self::Error> {
        CameraParameters::new(raw.focal_length_px, raw.real_object_width_m)
    }
}

impl From<CameraParameters> for RawCameraParameters {
    fn from(params: CameraParameters) -> Self {
        Self {
            focal_length_px: params.focal_length_px,
            real_object_width_m: params.real_object_width_m,
        }
    }
}

/// Configuration for the `FrameProcessor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub camera: CameraParameters,
    /// Blurred luminance strictly above this value is foreground.
    pub binary_threshold: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            camera: CameraParameters::default(),
            binary_threshold: DEFAULT_BINARY_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub fn with_camera(camera: CameraParameters) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployed_camera() {
        let config = PipelineConfig::default();
        assert_eq!(config.camera.focal_length_px(), 700.0);
        assert_eq!(config.camera.real_object_width_m(), 0.2);
        assert_eq!(config.binary_threshold, 50);
    }

    #[test]
    fn rejects_non_positive_parameters() {
        for (focal, width) in [(0.0, 0.2), (-700.0, 0.2), (700.0, 0.0), (700.0, -0.1)] {
            assert!(
                matches!(
                    CameraParameters::new(focal, width),
                    Err(ConfigError::NonPositive { .. })
                ),
                "accepted focal={focal} width={width}"
            );
        }
    }

    #[test]
    fn rejects_non_finite_parameters() {
        assert!(CameraParameters::new(f64::NAN, 0.2).is_err());
        assert!(CameraParameters::new(700.0, f64::INFINITY).is_err());
    }

    #[test]
    fn names_the_offending_field() {
        let err = CameraParameters::new(700.0, 0.0).unwrap_err();
        assert!(err.to_string().contains("real_object_width_m"));
    }

    #[test]
    fn loads_partial_json_with_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"camera": {"focal_length_px": 650.0}}"#)
            .expect("valid config");
        assert_eq!(config.camera.focal_length_px(), 650.0);
        assert_eq!(config.camera.real_object_width_m(), 0.2);
        assert_eq!(config.binary_threshold, 50);

        let empty = PipelineConfig::from_json_str("{}").expect("empty config");
        assert_eq!(empty, PipelineConfig::default());
    }

    #[test]
    fn json_load_rejects_invalid_camera() {
        let err = PipelineConfig::from_json_str(r#"{"camera": {"focal_length_px": -1.0}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("focal_length_px"));
    }

    #[test]
    fn json_load_rejects_unknown_fields() {
        assert!(PipelineConfig::from_json_str(r#"{"threshold": 40}"#).is_err());
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!(
            "rangefinder_config_{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"camera": {"focal_length_px": 800.0, "real_object_width_m": 0.5}, "binary_threshold": 80}"#,
        )
        .expect("write config");

        let config = PipelineConfig::from_json_file(&path).expect("load config");
        std::fs::remove_file(&path).ok();

        assert_eq!(config.camera.focal_length_px(), 800.0);
        assert_eq!(config.camera.real_object_width_m(), 0.5);
        assert_eq!(config.binary_threshold, 80);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PipelineConfig::from_json_file("/nonexistent/rangefinder.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
