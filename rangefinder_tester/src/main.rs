use anyhow::{Context, Result, bail};
use rangefinder::{PipelineConfig, RawFrame, spawn_frame_stream};
use rangefinder_visualizer::{FrameBus, FrameFormat, spawn_recorder};
use std::env;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "RF_CONFIG";
const CHANNEL_DEPTH: usize = 4;
const BUS_CAPACITY: usize = 64;
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: rangefinder_tester <input_image_or_dir> <output_dir>");
        println!("       set {CONFIG_ENV}=<config.json> to override camera parameters");
        return Ok(());
    }
    let input_path = PathBuf::from(&args[1]);
    let output_path = PathBuf::from(&args[2]);

    let config = load_config()?;
    info!(
        focal_length_px = config.camera.focal_length_px(),
        real_object_width_m = config.camera.real_object_width_m(),
        binary_threshold = config.binary_threshold,
        "pipeline configured"
    );

    let inputs = collect_inputs(&input_path)?;
    if inputs.is_empty() {
        bail!("no images found at {}", input_path.display());
    }
    info!(frames = inputs.len(), input = %input_path.display(), "starting frame source");

    // --- 2. Display Sink ---
    let bus = FrameBus::new(BUS_CAPACITY);
    let recorder = spawn_recorder(&bus, output_path.clone());

    // --- 3. Frame Stream ---
    let (raw_tx, raw_rx) = mpsc::channel(CHANNEL_DEPTH);
    let (processed_tx, mut processed_rx) = mpsc::channel(CHANNEL_DEPTH);
    let stream = spawn_frame_stream(config, raw_rx, processed_tx);
    let source = tokio::spawn(feed_frames(inputs, raw_tx));

    // --- 4. Main Processing Loop ---
    let mut frame_id = 0u64;
    while let Some(processed) = processed_rx.recv().await {
        frame_id += 1;
        match processed.measurement.detection() {
            Some(detection) => info!(
                frame_id,
                area = detection.contour_area,
                "{}",
                detection.label
            ),
            None => info!(frame_id, "no contour found"),
        }
        bus.publish(frame_id, &processed, FrameFormat::Png, now_millis())?;
    }

    // --- 5. Shutdown ---
    let sent = source.await.context("frame source panicked")??;
    let stats = stream.await.context("frame stream panicked")?;
    drop(bus);
    let recorded = recorder.await.context("recorder panicked")??;

    info!(
        sent,
        processed = stats.processed,
        dropped = stats.dropped,
        measured = stats.measured,
        written = recorded.frames_written,
        "Processing complete. Output saved to {}",
        output_path.display()
    );
    Ok(())
}

fn load_config() -> Result<PipelineConfig> {
    match env::var(CONFIG_ENV) {
        Ok(path) => PipelineConfig::from_json_file(&path)
            .with_context(|| format!("loading pipeline configuration from {path}")),
        Err(_) => Ok(PipelineConfig::default()),
    }
}

/// A single image, or every image directly inside a directory in lexical order.
fn collect_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut inputs: Vec<PathBuf> = std::fs::read_dir(path)
        .with_context(|| format!("reading {}", path.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_image(p))
        .collect();
    inputs.sort();
    Ok(inputs)
}

fn is_image(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Decodes each file into a transport message and sends it down the stream.
/// Files that fail to decode are skipped. Returns the number of frames sent.
async fn feed_frames(inputs: Vec<PathBuf>, raw_tx: mpsc::Sender<RawFrame>) -> Result<u64> {
    let mut sent = 0;
    for path in inputs {
        let decode_path = path.clone();
        let decoded = tokio::task::spawn_blocking(move || image::open(&decode_path)).await?;
        let rgb = match decoded {
            Ok(image) => image.to_rgb8(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable image");
                continue;
            }
        };
        let (width, height) = rgb.dimensions();
        if raw_tx.send(RawFrame::rgb8(width, height, rgb.into_raw())).await.is_err() {
            warn!("frame stream closed early");
            break;
        }
        sent += 1;
    }
    Ok(sent)
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
