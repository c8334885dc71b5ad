use crate::config::{ContourApproximation, DedupOrder, EdgeMode, RetrievalMode};
use crate::detection::annotate::{self, MARKED_COLOR, REJECTED_COLOR, UNMARKED_COLOR};
use crate::detection::dedup;
use crate::detection::marks;
use crate::detection::squares::SquareFilter;
use crate::error::Result;
use crate::models::BoundingBox;
use crate::pipeline::{PipelineContext, PipelineData, PipelineStep};
use image::DynamicImage;

/// Convert the frame to grayscale
pub struct GrayscaleStep;

impl PipelineStep for GrayscaleStep {
    fn process(&self, mut data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let gray = context.engine.grayscale(&data.original)?;
        data.working = Some(gray.clone());
        data.gray = Some(gray);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Grayscale Conversion"
    }
}

/// Apply Gaussian blur to the working image
pub struct BlurStep {
    pub sigma: f32,
}

impl PipelineStep for BlurStep {
    fn process(&self, mut data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let blurred = context.engine.gaussian_blur(data.require_working(self.name())?, self.sigma)?;
        data.working = Some(blurred);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Turn the working image into an edge map or a binary threshold image
pub struct EdgeDetectionStep {
    pub mode: EdgeMode,
}

impl PipelineStep for EdgeDetectionStep {
    fn process(&self, mut data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let working = data.require_working(self.name())?;
        let binary = match self.mode {
            EdgeMode::Canny { low, high } => context.engine.canny(working, low, high)?,
            EdgeMode::BinaryThreshold { cutoff } => context.engine.threshold(working, cutoff)?,
        };
        data.working = Some(binary);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Edge Detection"
    }
}

/// Trace contours in the binary image
pub struct ContourDetectionStep {
    pub retrieval: RetrievalMode,
    pub approximation: ContourApproximation,
}

impl PipelineStep for ContourDetectionStep {
    fn process(&self, mut data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let contours = context.engine.find_contours(
            data.require_working(self.name())?,
            self.retrieval,
            self.approximation,
        )?;
        data.contours = contours;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Contour Detection"
    }

    fn debug_image(&self, data: &PipelineData) -> Option<DynamicImage> {
        let gray = data.gray.as_ref()?;
        Some(DynamicImage::ImageRgba8(annotate::draw_contours(gray, &data.contours)))
    }
}

/// Keep convex quadrilaterals within the size band
pub struct SquareFilterStep {
    pub filter: SquareFilter,
}

impl PipelineStep for SquareFilterStep {
    fn process(&self, mut data: PipelineData, context: &PipelineContext) -> Result<PipelineData> {
        let classification = self.filter.classify_all(context.engine.as_ref(), &data.contours);
        data.candidates = classification.candidates;
        data.rejected = classification.rejected;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Square Filtering"
    }

    fn debug_image(&self, data: &PipelineData) -> Option<DynamicImage> {
        let gray = data.gray.as_ref()?;
        let mut canvas = annotate::draw_boxes(gray, &candidate_boxes(data), UNMARKED_COLOR);
        for rejected in &data.rejected {
            if let Some(bbox) = &rejected.bounding_box {
                annotate::draw_box(&mut canvas, bbox, 1, REJECTED_COLOR);
            }
        }
        Some(DynamicImage::ImageRgba8(canvas))
    }
}

/// Drop squares nested inside an earlier accepted square
pub struct ContainmentStep {
    pub order: DedupOrder,
}

impl PipelineStep for ContainmentStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let candidates = std::mem::take(&mut data.candidates);
        data.candidates = dedup::remove_contained(candidates, self.order);
        Ok(data)
    }

    fn name(&self) -> &str {
        "Containment Dedup"
    }

    fn debug_image(&self, data: &PipelineData) -> Option<DynamicImage> {
        let gray = data.gray.as_ref()?;
        Some(DynamicImage::ImageRgba8(annotate::draw_boxes(gray, &candidate_boxes(data), UNMARKED_COLOR)))
    }
}

/// Classify each surviving square by its mean intensity
pub struct MarkEvaluationStep {
    pub intensity_threshold: f32,
}

impl PipelineStep for MarkEvaluationStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let detections = marks::evaluate_marks(
            data.require_gray(self.name())?,
            &data.candidates,
            self.intensity_threshold,
        );
        data.detections = detections;
        Ok(data)
    }

    fn name(&self) -> &str {
        "Mark Evaluation"
    }

    fn debug_image(&self, data: &PipelineData) -> Option<DynamicImage> {
        let gray = data.gray.as_ref()?;
        let mut canvas = annotate::draw_boxes(gray, &[], MARKED_COLOR);
        for detection in &data.detections {
            let color = if detection.is_marked { MARKED_COLOR } else { UNMARKED_COLOR };
            annotate::draw_box(&mut canvas, &detection.bounding_box, 1, color);
        }
        Some(DynamicImage::ImageRgba8(canvas))
    }
}

fn candidate_boxes(data: &PipelineData) -> Vec<BoundingBox> {
    data.candidates.iter().map(|c| c.bounding_box).collect()
}
