// THEORY:
// The `stream` module connects the pipeline to a live feed. A single tokio
// task owns one `FrameProcessor`, pulls transport messages off an inbound
// channel, and pushes processed frames out in the order they arrived.
//
// Key architectural principles:
// 1.  **One logical worker**: the stages of a frame depend on each other, and
//     frames carry no state between them, so there is nothing to gain from
//     fanning out. Frames are handled strictly one at a time.
// 2.  **Per-frame isolation**: a malformed message is logged and dropped. It
//     never ends the stream and never reaches the pipeline.
// 3.  **No hidden buffering**: the worker holds at most the frame it is working
//     on. Queue depth and drop policy belong to whoever owns the channels.
// 4.  **Shutdown by closing**: when the inbound sender goes away the worker
//     drains what is left and returns its counters. If the consumer goes away
//     first, the worker stops at the next frame.

use crate::config::PipelineConfig;
use crate::core_modules::frame::{RawFrame, to_pixel_buffer};
use crate::pipeline::{FrameProcessor, ProcessedFrame};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Counters reported when a frame stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Messages taken off the inbound channel.
    pub received: u64,
    /// Frames that went through the pipeline.
    pub processed: u64,
    /// Messages rejected by frame conversion.
    pub dropped: u64,
    /// Processed frames that produced a target.
    pub measured: u64,
}

/// Spawns the frame worker onto the current tokio runtime.
pub fn spawn_frame_stream(
    config: PipelineConfig,
    mut inbound: mpsc::Receiver<RawFrame>,
    outbound: mpsc::Sender<ProcessedFrame>,
) -> JoinHandle<StreamStats> {
    tokio::spawn(async move {
        let processor = FrameProcessor::new(config);
        let mut stats = StreamStats::default();

        while let Some(raw) = inbound.recv().await {
            stats.received += 1;
            debug!(frame = stats.received, "Receiving video frame");

            let frame = match to_pixel_buffer(&raw) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(frame = stats.received, error = %err, "dropping malformed frame");
                    stats.dropped += 1;
                    continue;
                }
            };

            let processed = processor.process(frame);
            stats.processed += 1;
            if let Some(detection) = processed.measurement.detection() {
                stats.measured += 1;
                debug!(
                    frame = stats.received,
                    area = detection.contour_area,
                    label = %detection.label,
                    "target measured"
                );
            }

            if outbound.send(processed).await.is_err() {
                info!("frame consumer closed, stopping stream");
                break;
            }
        }

        info!(
            received = stats.received,
            processed = stats.processed,
            dropped = stats.dropped,
            measured = stats.measured,
            "frame stream finished"
        );
        stats
    })
}
