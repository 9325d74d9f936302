use anyhow::Context;
use detector::backend::ort::OrtBackend;
use detector::letterbox::{ColorFormat, Frame};
use detector::{Detector, DetectorConfig, labels};
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let config = DetectorConfig::from_env()?;
    common::setup_logging(config.environment.clone());

    tracing::info!(config = ?config, "Loaded configuration");

    let image_path = std::env::args()
        .nth(1)
        .context("usage: detector <image-path>")?;

    let mut detector: Detector<OrtBackend> = Detector::new(config.clone());
    detector.load_model(&config.model_path)?;
    tracing::info!("{}", detector.model_info());

    let image = image::open(&image_path)
        .with_context(|| format!("failed to open {image_path}"))?
        .to_rgb8();
    let frame = Frame {
        pixels: image.as_raw(),
        width: image.width(),
        height: image.height(),
        format: ColorFormat::Rgb,
    };

    let start = Instant::now();
    let (input, params) = detector.preprocess(&frame)?;
    let preprocess_time = start.elapsed();

    let start = Instant::now();
    let raw = detector.infer(&input)?;
    let infer_time = start.elapsed();

    let start = Instant::now();
    let detections = detector.postprocess(&raw, &params, frame.width, frame.height)?;
    let postprocess_time = start.elapsed();

    tracing::info!(
        preprocess_ms = preprocess_time.as_secs_f64() * 1e3,
        infer_ms = infer_time.as_secs_f64() * 1e3,
        postprocess_ms = postprocess_time.as_secs_f64() * 1e3,
        detections = detections.len(),
        "Pipeline complete"
    );

    for det in &detections {
        tracing::info!(
            class = labels::class_name(det.class_id),
            confidence = det.confidence,
            x = det.x,
            y = det.y,
            width = det.width,
            height = det.height,
            "Detection"
        );
    }

    Ok(())
}
