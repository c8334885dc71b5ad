//! Detection configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DetectionError, Result};

/// How the grayscale image is turned into a binary/edge image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EdgeMode {
    /// Canny edge detector with hysteresis thresholds
    Canny { low: f32, high: f32 },
    /// Pixels darker than `cutoff` become foreground
    BinaryThreshold { cutoff: u8 },
}

impl Default for EdgeMode {
    fn default() -> Self {
        EdgeMode::Canny { low: 50.0, high: 150.0 }
    }
}

/// Which borders the contour extractor reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Every border, outer and hole
    #[default]
    List,
    /// Outermost borders only
    External,
}

/// Point compression applied to traced contours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourApproximation {
    /// Keep every border pixel
    None,
    /// Keep only the endpoints of straight runs
    #[default]
    Simple,
}

/// Order in which candidates enter the containment sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupOrder {
    /// Contour discovery order
    #[default]
    Discovery,
    /// Largest bounding box first (stable for equal areas)
    AreaDescending,
}

/// Overlay options for the annotated output image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationOptions {
    pub line_thickness: u32,
    /// Outline contours the classifier rejected
    pub draw_rejected: bool,
    /// Draw the detection count in the top-left corner
    pub draw_count: bool,
}

impl Default for AnnotationOptions {
    fn default() -> Self {
        Self {
            line_thickness: 2,
            draw_rejected: false,
            draw_count: true,
        }
    }
}

/// Parameters of the square-mark detection pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub edge_mode: EdgeMode,
    pub retrieval_mode: RetrievalMode,
    pub contour_approximation: ContourApproximation,
    /// Polygon tolerance as a fraction of the contour perimeter.
    ///
    /// Higher values accept more non-square contours as quadrilaterals;
    /// lower values reject slightly irregular squares.
    pub approx_tolerance: f64,
    pub min_square_size: u32,
    pub max_square_size: u32,
    /// Mean intensity (0-255) below which a square counts as marked
    pub mark_intensity_threshold: f32,
    /// Gaussian pre-smoothing kernel size, 0 disables
    pub blur_kernel_size: u32,
    pub dedup_order: DedupOrder,
    pub annotation: AnnotationOptions,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::canny_preset()
    }
}

impl DetectionConfig {
    /// Canny edges, all contours, tight polygon tolerance
    pub fn canny_preset() -> Self {
        Self {
            edge_mode: EdgeMode::default(),
            retrieval_mode: RetrievalMode::List,
            contour_approximation: ContourApproximation::Simple,
            approx_tolerance: 0.02,
            min_square_size: 10,
            max_square_size: 150,
            mark_intensity_threshold: 50.0,
            blur_kernel_size: 0,
            dedup_order: DedupOrder::Discovery,
            annotation: AnnotationOptions::default(),
        }
    }

    /// Fixed binary threshold, outermost contours, permissive tolerance
    pub fn threshold_preset() -> Self {
        Self {
            edge_mode: EdgeMode::BinaryThreshold { cutoff: 127 },
            retrieval_mode: RetrievalMode::External,
            approx_tolerance: 0.1,
            ..Self::canny_preset()
        }
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DetectionError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            DetectionError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Gaussian sigma for the configured kernel size (OpenCV's rule), None when disabled
    pub fn blur_sigma(&self) -> Option<f32> {
        if self.blur_kernel_size == 0 {
            return None;
        }
        let k = self.blur_kernel_size as f32;
        Some(0.3 * ((k - 1.0) * 0.5 - 1.0) + 0.8)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(DetectionError::InvalidConfig(msg));

        if !(self.approx_tolerance > 0.0 && self.approx_tolerance < 1.0) {
            return invalid(format!(
                "approx_tolerance must be in (0, 1), got {}",
                self.approx_tolerance
            ));
        }
        if self.min_square_size == 0 {
            return invalid("min_square_size must be at least 1".to_string());
        }
        if self.min_square_size > self.max_square_size {
            return invalid(format!(
                "min_square_size ({}) exceeds max_square_size ({})",
                self.min_square_size, self.max_square_size
            ));
        }
        if !(0.0..=256.0).contains(&self.mark_intensity_threshold) {
            return invalid(format!(
                "mark_intensity_threshold must be in [0, 256], got {}",
                self.mark_intensity_threshold
            ));
        }
        if self.blur_kernel_size != 0 && (self.blur_kernel_size < 3 || self.blur_kernel_size % 2 == 0) {
            return invalid(format!(
                "blur_kernel_size must be 0 or an odd number >= 3, got {}",
                self.blur_kernel_size
            ));
        }
        if let EdgeMode::Canny { low, high } = self.edge_mode {
            if !(low >= 0.0 && low <= high) {
                return invalid(format!("canny thresholds must satisfy 0 <= low <= high, got {low}/{high}"));
            }
        }
        if self.annotation.line_thickness == 0 {
            return invalid("annotation.line_thickness must be at least 1".to_string());
        }
        Ok(())
    }
}
