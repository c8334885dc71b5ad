use image::{DynamicImage, GrayImage, RgbaImage};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::VisionEngine;
use crate::error::{DetectionError, Result};
use crate::models::{CandidateSquare, Contour, Detection, RejectedContour};

/// Data that flows through the pipeline for one frame.
/// Each stage fills in its own field; everything is dropped with the frame.
#[derive(Clone)]
pub struct PipelineData {
    /// Name of the frame, used for debug output paths
    pub label: String,

    /// The captured frame (shared efficiently via Arc)
    pub original: Arc<RgbaImage>,

    /// Unsmoothed grayscale, sampled by the mark evaluator
    pub gray: Option<GrayImage>,

    /// Working single-channel image (blurred, then edge/threshold map)
    pub working: Option<GrayImage>,

    pub contours: Vec<Contour>,

    /// Quadrilaterals accepted by the shape classifier (deduplicated in place)
    pub candidates: Vec<CandidateSquare>,

    pub rejected: Vec<RejectedContour>,

    pub detections: Vec<Detection>,
}

impl PipelineData {
    /// Create PipelineData for a full frame
    pub fn from_image(label: impl Into<String>, image: Arc<RgbaImage>) -> Self {
        Self {
            label: label.into(),
            original: image,
            gray: None,
            working: None,
            contours: Vec::new(),
            candidates: Vec::new(),
            rejected: Vec::new(),
            detections: Vec::new(),
        }
    }

    /// Grayscale image, or a processing failure naming the stage that needed it
    pub fn require_gray(&self, stage: &str) -> Result<&GrayImage> {
        self.gray
            .as_ref()
            .ok_or_else(|| DetectionError::processing(stage, "grayscale image not available"))
    }

    /// Working image, or a processing failure naming the stage that needed it
    pub fn require_working(&self, stage: &str) -> Result<&GrayImage> {
        self.working
            .as_ref()
            .ok_or_else(|| DetectionError::processing(stage, "working image not available"))
    }
}

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

/// Context available to all pipeline steps
#[derive(Clone)]
pub struct PipelineContext {
    pub engine: Arc<dyn VisionEngine>,
    pub debug: Option<DebugConfig>,
}

/// Trait that all pipeline steps must implement
pub trait PipelineStep: Send + Sync {
    /// Transform the frame data, filling in this stage's output
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Human-readable name for this step (used in logs and debug file names)
    fn name(&self) -> &str;

    /// Image written to the debug directory after this step ran
    fn debug_image(&self, data: &PipelineData) -> Option<DynamicImage> {
        data.working.clone().map(DynamicImage::ImageLuma8)
    }
}

/// Composable pipeline builder
#[derive(Clone)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    /// Create a new empty pipeline using the given engine
    pub fn new(engine: Arc<dyn VisionEngine>) -> Self {
        Self {
            steps: Vec::new(),
            context: PipelineContext { engine, debug: None },
        }
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        let io_err = |e: std::io::Error| DetectionError::processing("Debug Output", e.to_string());

        // Check if directory exists and is empty
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir).map_err(io_err)?;
            if entries.count() > 0 {
                return Err(DetectionError::InvalidConfig(format!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            // Create directory if it doesn't exist
            std::fs::create_dir_all(&output_dir).map_err(io_err)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });

        Ok(self)
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Run every step on a frame
    pub fn run(&self, label: &str, input: Arc<RgbaImage>) -> Result<PipelineData> {
        self.run_partial(label, input, self.steps.len())
    }

    /// Run the pipeline but stop after `num_steps` steps (useful for debugging)
    pub fn run_partial(&self, label: &str, input: Arc<RgbaImage>, num_steps: usize) -> Result<PipelineData> {
        validate_frame(&input)?;
        info!(frame = label, width = input.width(), height = input.height(), "Running pipeline");

        let mut data = PipelineData::from_image(label, input);
        if self.context.debug.is_some() {
            self.save_debug_image(&data.label, "00_input", &DynamicImage::ImageRgba8((*data.original).clone()))?;
        }

        for (step_idx, step) in self.steps.iter().take(num_steps).enumerate() {
            let step_name = step.name();
            debug!(frame = label, step = step_name, "Running step");

            data = run_step(step.as_ref(), data, &self.context)?;

            if self.context.debug.is_some() {
                if let Some(image) = step.debug_image(&data) {
                    let file_stem = format!("{:02}_{}", step_idx + 1, step_name.to_lowercase().replace(' ', "_"));
                    self.save_debug_image(&data.label, &file_stem, &image)?;
                }
            }

            debug!(
                frame = label,
                step = step_name,
                contours = data.contours.len(),
                candidates = data.candidates.len(),
                detections = data.detections.len(),
                "Step finished"
            );
        }

        Ok(data)
    }

    /// Save debug output if debug mode is enabled
    fn save_debug_image(&self, label: &str, file_stem: &str, image: &DynamicImage) -> Result<()> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };

        let frame_dir = debug_config.output_dir.join(sanitize_label(label));
        std::fs::create_dir_all(&frame_dir)
            .map_err(|e| DetectionError::processing("Debug Output", e.to_string()))?;
        let output_path = frame_dir.join(format!("{file_stem}.png"));
        image
            .save(&output_path)
            .map_err(|e| DetectionError::processing("Debug Output", format!("Failed to save debug image: {e}")))?;

        debug!("Debug: saved {}", display_relative(&output_path, &debug_config.output_dir));
        Ok(())
    }
}

/// Reject frames the pipeline cannot process
pub fn validate_frame(image: &RgbaImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DetectionError::InvalidInput(format!(
            "image has zero area ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Run one step, turning a panic inside a primitive into a processing failure
fn run_step(step: &dyn PipelineStep, data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
    match panic::catch_unwind(AssertUnwindSafe(|| step.process(data, context))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "step panicked".to_string());
            Err(DetectionError::processing(step.name(), message))
        }
    }
}

fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "frame".to_string()
    } else {
        cleaned
    }
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ImageprocEngine;

    struct PanickingStep;

    impl PipelineStep for PanickingStep {
        fn process(&self, _data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
            panic!("allocation failed");
        }

        fn name(&self) -> &str {
            "Exploding Step"
        }
    }

    #[test]
    fn zero_area_frame_is_invalid_input() {
        let pipeline = Pipeline::new(Arc::new(ImageprocEngine));
        let result = pipeline.run("empty", Arc::new(RgbaImage::new(0, 10)));
        assert!(matches!(result, Err(DetectionError::InvalidInput(_))));
    }

    #[test]
    fn panics_become_processing_failures() {
        let pipeline = Pipeline::new(Arc::new(ImageprocEngine)).add_step_boxed(Box::new(PanickingStep));
        let result = pipeline.run("frame", Arc::new(RgbaImage::new(4, 4)));
        match result {
            Err(DetectionError::ProcessingFailure { stage, message }) => {
                assert_eq!(stage, "Exploding Step");
                assert!(message.contains("allocation failed"));
            }
            _ => panic!("expected a processing failure"),
        }
    }

    #[test]
    fn labels_are_safe_directory_names() {
        assert_eq!(sanitize_label("sheet 1.png"), "sheet_1.png");
        assert_eq!(sanitize_label("../x"), ".._x");
        assert_eq!(sanitize_label(".."), "frame");
        assert_eq!(sanitize_label(""), "frame");
    }
}
