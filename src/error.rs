//! Error types for markscan

use thiserror::Error;

/// Result type alias for detection operations
pub type Result<T> = std::result::Result<T, DetectionError>;

/// Errors reported by a detection call. A call either succeeds completely or
/// returns one of these; no partial result is ever produced.
#[derive(Error, Debug)]
pub enum DetectionError {
    /// Image missing, zero-area, or unreadable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A pipeline stage or vision primitive failed
    #[error("Processing failed in {stage}: {message}")]
    ProcessingFailure { stage: String, message: String },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DetectionError {
    pub fn processing(stage: impl Into<String>, message: impl Into<String>) -> Self {
        DetectionError::ProcessingFailure {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for DetectionError {
    fn from(err: image::ImageError) -> Self {
        DetectionError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_failure_names_the_stage() {
        let err = DetectionError::processing("Edge Detection", "out of memory");
        let msg = err.to_string();
        assert!(msg.contains("Edge Detection"));
        assert!(msg.contains("out of memory"));
    }

    #[test]
    fn invalid_input_display() {
        let err = DetectionError::InvalidInput("image has zero area".to_string());
        assert_eq!(err.to_string(), "Invalid input: image has zero area");
    }
}
