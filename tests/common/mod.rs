mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from markscan for tests
pub use markscan::{
    BoundingBox, DetectionConfig, DetectionError, DetectionResult, EdgeMode, ImageprocEngine,
    RetrievalMode, SquareDetector, VisionEngine,
};
