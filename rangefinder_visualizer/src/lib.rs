use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use rangefinder::{Frame, Measurement, ProcessedFrame};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const JPEG_QUALITY: u8 = 85;
pub const META_FILE_NAME: &str = "meta.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Jpeg,
    Png,
}

impl FrameFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FrameFormat::Jpeg => "jpg",
            FrameFormat::Png => "png",
        }
    }
}

/// An encoded, annotated frame ready for display.
#[derive(Debug, Clone)]
pub struct FramePacket {
    pub frame_id: u64,
    pub ts_millis: u64,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
    pub data: Bytes,
}

impl FramePacket {
    pub fn encode(
        frame_id: u64,
        frame: &Frame,
        format: FrameFormat,
        ts_millis: u64,
    ) -> anyhow::Result<Self> {
        let rgb = frame.to_rgb_image();
        let (width, height) = rgb.dimensions();
        let mut data = Vec::new();
        match format {
            FrameFormat::Jpeg => JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)?,
            FrameFormat::Png => PngEncoder::new(&mut data).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?,
        }
        Ok(Self {
            frame_id,
            ts_millis,
            width,
            height,
            format,
            data: Bytes::from(data),
        })
    }

    pub fn file_name(&self) -> String {
        format!("frame_{:06}.{}", self.frame_id, self.format.extension())
    }
}

/// Per-frame measurement summary published next to the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub frame_id: u64,
    pub ts_millis: u64,
    pub distance_m: Option<f64>,
    pub contour_area: Option<f64>,
    pub label: Option<String>,
}

impl Meta {
    pub fn from_measurement(frame_id: u64, ts_millis: u64, measurement: &Measurement) -> Self {
        let detection = measurement.detection();
        Self {
            frame_id,
            ts_millis,
            distance_m: detection.and_then(|d| d.distance.meters()),
            contour_area: detection.map(|d| d.contour_area),
            label: detection.map(|d| d.label.clone()),
        }
    }
}

/// Fan-out of annotated frames and their metadata. Slow subscribers lose the
/// oldest packets rather than holding up the pipeline.
#[derive(Clone)]
pub struct FrameBus {
    pub frames_tx: broadcast::Sender<FramePacket>,
    pub meta_tx: broadcast::Sender<Meta>,
}

impl FrameBus {
    pub fn new(capacity: usize) -> Self {
        let (frames_tx, _) = broadcast::channel::<FramePacket>(capacity.max(1));
        let (meta_tx, _) = broadcast::channel::<Meta>(capacity.max(1));
        Self { frames_tx, meta_tx }
    }

    /// Encodes and broadcasts one processed frame. Returns how many frame
    /// subscribers were listening; zero is not an error.
    pub fn publish(
        &self,
        frame_id: u64,
        processed: &ProcessedFrame,
        format: FrameFormat,
        ts_millis: u64,
    ) -> anyhow::Result<usize> {
        let packet = FramePacket::encode(frame_id, &processed.frame, format, ts_millis)?;
        let meta = Meta::from_measurement(frame_id, ts_millis, &processed.measurement);
        let listeners = self.frames_tx.send(packet).unwrap_or(0);
        // Meta with no subscribers is simply discarded.
        let _ = self.meta_tx.send(meta);
        Ok(listeners)
    }
}

/// Counters reported when a recorder finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecorderStats {
    pub frames_written: u64,
    pub meta_written: u64,
    pub lagged: u64,
}

/// Subscribes to the bus and writes every frame packet to `out_dir`, plus one
/// JSON line per meta record in `meta.jsonl`. Ends once every sender of the
/// bus is dropped.
pub fn spawn_recorder(
    bus: &FrameBus,
    out_dir: impl Into<PathBuf>,
) -> JoinHandle<anyhow::Result<RecorderStats>> {
    let mut frames_rx = bus.frames_tx.subscribe();
    let mut meta_rx = bus.meta_tx.subscribe();
    let out_dir = out_dir.into();

    tokio::spawn(async move {
        tokio::fs::create_dir_all(&out_dir).await?;
        let mut meta_file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(out_dir.join(META_FILE_NAME))
            .await?;

        let mut stats = RecorderStats::default();
        let mut frames_open = true;
        let mut meta_open = true;

        while frames_open || meta_open {
            tokio::select! {
                packet = frames_rx.recv(), if frames_open => match packet {
                    Ok(packet) => {
                        write_packet(&out_dir, &packet).await?;
                        stats.frames_written += 1;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "recorder fell behind, frames skipped");
                        stats.lagged += skipped;
                    }
                    Err(RecvError::Closed) => frames_open = false,
                },
                meta = meta_rx.recv(), if meta_open => match meta {
                    Ok(meta) => {
                        let mut line = serde_json::to_vec(&meta)?;
                        line.push(b'\n');
                        meta_file.write_all(&line).await?;
                        stats.meta_written += 1;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "recorder fell behind, meta skipped");
                    }
                    Err(RecvError::Closed) => meta_open = false,
                },
            }
        }

        meta_file.flush().await?;
        debug!(?stats, "recorder finished");
        Ok::<_, anyhow::Error>(stats)
    })
}

async fn write_packet(out_dir: &Path, packet: &FramePacket) -> anyhow::Result<()> {
    tokio::fs::write(out_dir.join(packet.file_name()), &packet.data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rangefinder::{CameraParameters, process};

    fn target_frame() -> Frame {
        let mut frame = Frame::filled(96, 64, [0, 0, 0]).expect("valid frame");
        for y in 30..50 {
            for x in 40..70 {
                frame.put_pixel(x, y, [255, 255, 255]);
            }
        }
        frame
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rangefinder_{name}_{}", std::process::id()))
    }

    #[test]
    fn png_packet_decodes_to_frame() {
        let frame = target_frame();
        let packet = FramePacket::encode(3, &frame, FrameFormat::Png, 1_000).expect("encode");
        assert_eq!(packet.file_name(), "frame_000003.png");

        let decoded = image::load_from_memory(&packet.data).expect("decode").to_rgb8();
        assert_eq!(decoded, frame.to_rgb_image());
    }

    #[test]
    fn jpeg_packet_keeps_dimensions() {
        let packet =
            FramePacket::encode(1, &target_frame(), FrameFormat::Jpeg, 0).expect("encode");
        assert_eq!((packet.width, packet.height), (96, 64));
        assert_eq!(&packet.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn meta_reflects_measurement() {
        let processed = process(target_frame(), &CameraParameters::default());
        let meta = Meta::from_measurement(7, 42, &processed.measurement);
        assert_eq!(meta.frame_id, 7);
        assert!(meta.distance_m.is_some());
        assert!(meta.contour_area.is_some());
        assert!(meta.label.as_deref().is_some_and(|l| l.starts_with("Distance: ")));

        let empty = Meta::from_measurement(8, 43, &Measurement::NoContour);
        assert_eq!(empty.distance_m, None);
        assert_eq!(empty.label, None);
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = FrameBus::new(2);
        let processed = process(target_frame(), &CameraParameters::default());
        assert_eq!(bus.publish(1, &processed, FrameFormat::Png, 0).expect("publish"), 0);
    }

    #[tokio::test]
    async fn recorder_writes_frames_and_meta() {
        let out_dir = scratch_dir("recorder");
        let _ = tokio::fs::remove_dir_all(&out_dir).await;

        let bus = FrameBus::new(8);
        let recorder = spawn_recorder(&bus, out_dir.clone());

        let processed = process(target_frame(), &CameraParameters::default());
        assert_eq!(bus.publish(1, &processed, FrameFormat::Png, 10).expect("publish"), 1);
        assert_eq!(bus.publish(2, &processed, FrameFormat::Jpeg, 20).expect("publish"), 1);
        drop(bus);

        let stats = recorder.await.expect("join").expect("recorder");
        assert_eq!(stats.frames_written, 2);
        assert_eq!(stats.meta_written, 2);
        assert!(out_dir.join("frame_000001.png").exists());
        assert!(out_dir.join("frame_000002.jpg").exists());

        let lines = tokio::fs::read_to_string(out_dir.join(META_FILE_NAME))
            .await
            .expect("meta file");
        let metas: Vec<Meta> = lines
            .lines()
            .map(|line| serde_json::from_str(line).expect("meta line"))
            .collect();
        assert_eq!(metas.len(), 2);
        assert_eq!(metas[1].frame_id, 2);

        let _ = tokio::fs::remove_dir_all(&out_dir).await;
    }
}
