use anyhow::Context;
use clap::{Parser, ValueEnum};
use image::ImageReader;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use markscan::{BatchExecutor, DetectionConfig, DetectionResult, Frame, FrameOutcome, SquareDetector};

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Canny edges, all contours, tolerance 0.02
    Canny,
    /// Binary threshold 127, outermost contours, tolerance 0.1
    Threshold,
}

#[derive(Parser)]
#[command(name = "markscan")]
#[command(about = "Detect filled squares on scanned answer sheets")]
struct Cli {
    /// Input image files
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start from a preset instead of the default configuration
    #[arg(long, value_enum, conflicts_with = "config")]
    preset: Option<Preset>,

    /// Polygon approximation tolerance (fraction of perimeter)
    #[arg(long)]
    approx_tolerance: Option<f64>,

    /// Minimum square side in pixels
    #[arg(long)]
    min_size: Option<u32>,

    /// Maximum square side in pixels
    #[arg(long)]
    max_size: Option<u32>,

    /// Mean intensity below which a square counts as marked
    #[arg(long)]
    mark_threshold: Option<f32>,

    /// Gaussian blur kernel size (odd, 0 disables)
    #[arg(long)]
    blur_kernel: Option<u32>,

    /// Outline rejected contours in the annotated images
    #[arg(long)]
    show_rejected: bool,

    /// Write annotated images to this directory
    #[arg(short, long, value_name = "DIR")]
    annotated_out: Option<PathBuf>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct ImageReport<'a> {
    image: &'a str,
    #[serde(flatten)]
    result: Option<&'a DetectionResult>,
    error: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = build_config(&args)?;

    let mut detector = SquareDetector::with_default_engine(config).context("Invalid detection configuration")?;
    if let Some(debug_dir) = args.debug_out.clone() {
        detector = detector.with_debug(debug_dir)?;
    }

    if let Some(dir) = &args.annotated_out {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    // Load images; an unreadable file is reported against that image only
    let labels = frame_labels(&args.images);
    let mut frames = Vec::with_capacity(args.images.len());
    let mut load_errors = Vec::with_capacity(args.images.len());
    for (path, label) in args.images.iter().zip(labels) {
        match load_image(path) {
            Ok(img) => {
                frames.push(Frame::new(label, img));
                load_errors.push(None);
            }
            Err(e) => load_errors.push(Some(format!("{e:#}"))),
        }
    }

    let executor = BatchExecutor::new(Arc::new(detector), args.jobs);
    let outcomes = executor.execute(frames);
    let mut outcomes_iter = outcomes.iter();

    let mut reports = Vec::with_capacity(args.images.len());
    for (path, load_error) in args.images.iter().zip(load_errors) {
        let report = match load_error {
            Some(message) => ImageReport {
                image: path.to_str().unwrap_or_default(),
                result: None,
                error: Some(message),
            },
            None => match outcomes_iter.next() {
                Some(outcome) => report_outcome(path, outcome, args.annotated_out.as_deref()),
                None => continue,
            },
        };

        if let Some(message) = &report.error {
            warn!("{}: {}", path.display(), message);
            if !args.json {
                eprintln!("{}: error: {}", path.display(), message);
            }
        } else if let (Some(result), false) = (report.result, args.json) {
            print_summary(path, result);
        }
        reports.push(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let failures = reports.iter().filter(|r| r.error.is_some()).count();
    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, reports.len());
    }
    Ok(())
}

fn load_image(path: &Path) -> anyhow::Result<image::RgbaImage> {
    let img = ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode {}: {}", path.display(), e))?;
    Ok(img.to_rgba8())
}

/// Save the annotated image (if requested) and build the report for one frame.
/// A failed save marks only this image as failed.
fn report_outcome<'a>(path: &'a Path, outcome: &'a FrameOutcome, annotated_out: Option<&Path>) -> ImageReport<'a> {
    let error = match (&outcome.output, annotated_out) {
        (Err(e), _) => Some(e.to_string()),
        (Ok(output), Some(dir)) => {
            let out_path = dir.join(format!("{}.annotated.png", outcome.label));
            output
                .annotated
                .save(&out_path)
                .err()
                .map(|e| format!("Failed to save {}: {}", out_path.display(), e))
        }
        (Ok(_), None) => None,
    };

    ImageReport {
        image: path.to_str().unwrap_or_default(),
        result: outcome.output.as_ref().ok().map(|o| &o.result),
        error,
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Cli) -> anyhow::Result<DetectionConfig> {
    let mut config = match (&args.config, args.preset) {
        (Some(path), _) => DetectionConfig::from_json_file(path)?,
        (None, Some(Preset::Threshold)) => DetectionConfig::threshold_preset(),
        (None, Some(Preset::Canny)) | (None, None) => DetectionConfig::canny_preset(),
    };

    // Command line flags override file values
    if let Some(v) = args.approx_tolerance {
        config.approx_tolerance = v;
    }
    if let Some(v) = args.min_size {
        config.min_square_size = v;
    }
    if let Some(v) = args.max_size {
        config.max_square_size = v;
    }
    if let Some(v) = args.mark_threshold {
        config.mark_intensity_threshold = v;
    }
    if let Some(v) = args.blur_kernel {
        config.blur_kernel_size = v;
    }
    if args.show_rejected {
        config.annotation.draw_rejected = true;
    }

    Ok(config)
}

fn frame_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string())
}

/// One label per input, unique across the batch so output files never collide.
/// Repeated stems get a numeric suffix in input order.
fn frame_labels(paths: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let stem = frame_label(path);
            let mut label = stem.clone();
            let mut n = 2;
            while !taken.insert(label.clone()) {
                label = format!("{stem}-{n}");
                n += 1;
            }
            label
        })
        .collect()
}

fn print_summary(path: &Path, result: &DetectionResult) {
    println!("\n=== {} ===", path.display());
    println!("Squares detected: {} ({} marked)", result.total, result.marked_count());
    for (i, detection) in result.detections.iter().enumerate() {
        let bbox = &detection.bounding_box;
        println!(
            "  {:>3}: ({}, {}) {}x{}  mean={:.1}  {}",
            i + 1,
            bbox.x,
            bbox.y,
            bbox.width,
            bbox.height,
            detection.mean_intensity,
            if detection.is_marked { "MARKED" } else { "-" }
        );
    }
}
