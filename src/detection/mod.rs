pub mod annotate;
pub mod contours;
pub mod dedup;
pub mod geometry;
pub mod marks;
pub mod preprocessing;
pub mod squares;
pub mod steps;

use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::DetectionConfig;
use crate::engine::{ImageprocEngine, VisionEngine};
use crate::error::Result;
use crate::models::{DetectionResult, RejectedContour};
use crate::pipeline::{Pipeline, PipelineData};

/// Detection result together with the annotated frame
#[derive(Debug, Clone)]
pub struct DetectionOutput {
    pub result: DetectionResult,
    pub annotated: RgbaImage,
    /// Contours the shape classifier turned down, for diagnostics
    pub rejected: Vec<RejectedContour>,
}

/// Square-mark detector: a configured pipeline bound to a vision engine.
///
/// Holds no per-frame state, so one detector can serve many threads.
pub struct SquareDetector {
    config: DetectionConfig,
    pipeline: Pipeline,
}

impl SquareDetector {
    /// Validate `config` and build the standard pipeline on `engine`
    pub fn new(engine: Arc<dyn VisionEngine>, config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        info!(engine = engine.name(), "Creating square detector");
        let pipeline = build_standard_pipeline(engine, &config);
        Ok(Self { config, pipeline })
    }

    /// Detector on the default `imageproc` engine
    pub fn with_default_engine(config: DetectionConfig) -> Result<Self> {
        Self::new(Arc::new(ImageprocEngine::new()), config)
    }

    /// Write every stage's image under `output_dir` (must be empty or absent)
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.pipeline = self.pipeline.with_debug(output_dir)?;
        Ok(self)
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Detect squares and classify them as marked or unmarked
    pub fn detect(&self, image: &RgbaImage) -> Result<DetectionResult> {
        let data = self.run_frame("frame", Arc::new(image.clone()))?;
        Ok(finish(data).0)
    }

    /// Detect and also render the annotated frame
    pub fn detect_annotated(&self, image: &RgbaImage) -> Result<DetectionOutput> {
        self.detect_frame("frame", Arc::new(image.clone()))
    }

    /// Labelled variant used for batches; the label names the debug directory
    pub fn detect_frame(&self, label: &str, image: Arc<RgbaImage>) -> Result<DetectionOutput> {
        let data = self.run_frame(label, image)?;
        let original = Arc::clone(&data.original);
        let (result, rejected) = finish(data);
        let annotated = annotate::annotate(&original, &result, &rejected, &self.config.annotation);
        Ok(DetectionOutput {
            result,
            annotated,
            rejected,
        })
    }

    fn run_frame(&self, label: &str, image: Arc<RgbaImage>) -> Result<PipelineData> {
        let data = self.pipeline.run(label, image)?;
        info!(
            frame = label,
            contours = data.contours.len(),
            squares = data.detections.len(),
            marked = data.detections.iter().filter(|d| d.is_marked).count(),
            "Frame processed"
        );
        Ok(data)
    }
}

/// Detect marked squares with the default engine.
///
/// Stateless: identical input and config always give identical results.
pub fn detect(image: &RgbaImage, config: &DetectionConfig) -> Result<DetectionResult> {
    SquareDetector::with_default_engine(config.clone())?.detect(image)
}

/// Build the standard detection pipeline for a configuration
pub fn build_standard_pipeline(engine: Arc<dyn VisionEngine>, config: &DetectionConfig) -> Pipeline {
    use steps::*;

    let mut pipeline = Pipeline::new(engine).add_step(Arc::new(GrayscaleStep));

    if let Some(sigma) = config.blur_sigma() {
        pipeline = pipeline.add_step(Arc::new(BlurStep { sigma }));
    }

    pipeline
        .add_step(Arc::new(EdgeDetectionStep { mode: config.edge_mode }))
        .add_step(Arc::new(ContourDetectionStep {
            retrieval: config.retrieval_mode,
            approximation: config.contour_approximation,
        }))
        .add_step(Arc::new(SquareFilterStep {
            filter: squares::SquareFilter {
                approx_tolerance: config.approx_tolerance,
                min_size: config.min_square_size,
                max_size: config.max_square_size,
            },
        }))
        .add_step(Arc::new(ContainmentStep { order: config.dedup_order }))
        .add_step(Arc::new(MarkEvaluationStep {
            intensity_threshold: config.mark_intensity_threshold,
        }))
}

fn finish(data: PipelineData) -> (DetectionResult, Vec<RejectedContour>) {
    (DetectionResult::new(data.detections), data.rejected)
}
