use image::ImageReader;
use markscan::detection::squares::SquareFilter;
use markscan::detection::steps::*;
use markscan::{ContourApproximation, DedupOrder, EdgeMode, ImageprocEngine, Pipeline, RetrievalMode};
use std::env;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image_path>", args[0]);
        std::process::exit(1);
    }

    let image_path = &args[1];
    let img = ImageReader::open(image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgba8();
    let img = Arc::new(img);

    println!("Loaded image: {}x{}", img.width(), img.height());

    // Example 1: Canny edges with light smoothing
    println!("\n=== Canny Pipeline ===");
    let canny_pipeline = Pipeline::new(Arc::new(ImageprocEngine))
        .add_step_boxed(Box::new(GrayscaleStep))
        .add_step_boxed(Box::new(BlurStep { sigma: 1.1 }))
        .add_step_boxed(Box::new(EdgeDetectionStep {
            mode: EdgeMode::Canny { low: 50.0, high: 150.0 },
        }))
        .add_step_boxed(Box::new(ContourDetectionStep {
            retrieval: RetrievalMode::List,
            approximation: ContourApproximation::Simple,
        }))
        .add_step_boxed(Box::new(SquareFilterStep {
            filter: SquareFilter {
                approx_tolerance: 0.02,
                min_size: 10,
                max_size: 150,
            },
        }))
        .add_step_boxed(Box::new(ContainmentStep { order: DedupOrder::Discovery }))
        .add_step_boxed(Box::new(MarkEvaluationStep { intensity_threshold: 50.0 }));

    let data = canny_pipeline.run("canny", Arc::clone(&img))?;

    println!("Contours: {}", data.contours.len());
    println!("Rejected: {}", data.rejected.len());
    println!("Squares:  {}", data.detections.len());
    for (i, detection) in data.detections.iter().take(10).enumerate() {
        let bbox = &detection.bounding_box;
        println!(
            "  {}: ({}, {}) {}x{} mean={:.1} marked={}",
            i + 1,
            bbox.x,
            bbox.y,
            bbox.width,
            bbox.height,
            detection.mean_intensity,
            detection.is_marked
        );
    }

    // Example 2: Threshold the ink, keep outermost shapes, let large boxes win
    println!("\n\n=== Threshold Pipeline (Area-Ordered Dedup) ===");
    let threshold_pipeline = Pipeline::new(Arc::new(ImageprocEngine))
        .add_step_boxed(Box::new(GrayscaleStep))
        .add_step_boxed(Box::new(EdgeDetectionStep {
            mode: EdgeMode::BinaryThreshold { cutoff: 127 },
        }))
        .add_step_boxed(Box::new(ContourDetectionStep {
            retrieval: RetrievalMode::External,
            approximation: ContourApproximation::Simple,
        }))
        .add_step_boxed(Box::new(SquareFilterStep {
            filter: SquareFilter {
                approx_tolerance: 0.1,
                min_size: 10,
                max_size: 150,
            },
        }))
        .add_step_boxed(Box::new(ContainmentStep { order: DedupOrder::AreaDescending }))
        .add_step_boxed(Box::new(MarkEvaluationStep { intensity_threshold: 50.0 }));

    let data = threshold_pipeline.run("threshold", Arc::clone(&img))?;
    let marked = data.detections.iter().filter(|d| d.is_marked).count();
    println!("Threshold pipeline found {} squares ({} marked)", data.detections.len(), marked);

    // Example 3: Stop after contour detection (partial execution for debugging)
    println!("\n\n=== Partial Pipeline (Stop After Contour Detection) ===");
    let data = canny_pipeline.run_partial("partial", img, 4)?;
    println!("Steps: {:?}", &canny_pipeline.step_names()[..4]);
    println!("Contours found: {}", data.contours.len());

    Ok(())
}
