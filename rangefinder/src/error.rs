use std::path::PathBuf;
use thiserror::Error;

/// A frame that cannot enter the pipeline. The offending frame is dropped;
/// the stream it came from keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has zero dimensions ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },

    #[error("unsupported channel count {channels}, expected 3")]
    ChannelCount { channels: u32 },

    #[error(
        "pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}x{channels}"
    )]
    BufferLength {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
        channels: u32,
    },
}

/// Rejected configuration, raised when the configuration is built or loaded
/// and never deferred to per-frame computation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("failed to read configuration {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
