// THEORY:
// This file is the main entry point for the `rangefinder` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (the tester binary, the
// visualizer, or any transport that delivers camera frames).
//
// The primary export is the `FrameProcessor` and its associated data structures
// (`PipelineConfig`, `ProcessedFrame`, `Measurement`, etc.). The individual
// image stages live in `core_modules` and stay public so each one can be run
// and inspected on its own.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod stream;

pub use config::{CameraParameters, PipelineConfig};
pub use core_modules::frame::{Frame, PixelEncoding, RawFrame, to_pixel_buffer};
pub use error::{ConfigError, FrameError};
pub use pipeline::{Detection, Distance, FrameProcessor, Measurement, ProcessedFrame, process};
pub use stream::{StreamStats, spawn_frame_stream};
