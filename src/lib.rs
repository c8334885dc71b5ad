pub mod batch;
pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod models;
pub mod pipeline;

pub use batch::{BatchExecutor, Frame, FrameOutcome};
pub use config::{AnnotationOptions, ContourApproximation, DedupOrder, DetectionConfig, EdgeMode, RetrievalMode};
pub use detection::annotate::annotate;
pub use detection::{build_standard_pipeline, detect, DetectionOutput, SquareDetector};
pub use engine::{ImageprocEngine, VisionEngine};
pub use error::{DetectionError, Result};
pub use models::{BoundingBox, CandidateSquare, Contour, Detection, DetectionResult, Point, RejectReason, RejectedContour};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};

use image::RgbaImage;

/// Wrap a raw RGBA buffer from a capture source.
///
/// Fails with `InvalidInput` when the frame is empty or the buffer length
/// does not match `width * height * 4`.
pub fn frame_from_raw(width: u32, height: u32, rgba: Vec<u8>) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(DetectionError::InvalidInput(format!("image has zero area ({width}x{height})")));
    }
    let len = rgba.len();
    let mismatch = || {
        DetectionError::InvalidInput(format!(
            "buffer of {len} bytes does not hold a {width}x{height} RGBA image"
        ))
    };
    if len as u64 != u64::from(width) * u64::from(height) * 4 {
        return Err(mismatch());
    }
    RgbaImage::from_raw(width, height, rgba).ok_or_else(mismatch)
}
