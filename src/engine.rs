//! Vision primitives the detection pipeline is composed from.
//!
//! Callers create an engine once and hand it to the pipeline; nothing here
//! keeps process-wide state. Tests and alternative back ends implement
//! [`VisionEngine`] to swap primitives without touching the pipeline.

use image::{GrayImage, RgbaImage};

use crate::config::{ContourApproximation, RetrievalMode};
use crate::detection::{contours, geometry, preprocessing};
use crate::error::Result;
use crate::models::{Contour, Point};

/// Low-level image operations used by the pipeline steps.
///
/// Implementations must be deterministic: the same input always gives the
/// same output, including contour order.
pub trait VisionEngine: Send + Sync {
    fn grayscale(&self, image: &RgbaImage) -> Result<GrayImage>;

    fn gaussian_blur(&self, image: &GrayImage, sigma: f32) -> Result<GrayImage>;

    fn canny(&self, image: &GrayImage, low: f32, high: f32) -> Result<GrayImage>;

    /// Foreground (255) where a pixel is darker than `cutoff`
    fn threshold(&self, image: &GrayImage, cutoff: u8) -> Result<GrayImage>;

    fn find_contours(
        &self,
        binary: &GrayImage,
        retrieval: RetrievalMode,
        approximation: ContourApproximation,
    ) -> Result<Vec<Contour>>;

    fn arc_length(&self, points: &[Point]) -> f64 {
        geometry::arc_length(points)
    }

    fn approximate_polygon(&self, points: &[Point], epsilon: f64) -> Vec<Point> {
        geometry::approximate_polygon(points, epsilon)
    }

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Default engine backed by `image` and `imageproc`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocEngine;

impl ImageprocEngine {
    pub fn new() -> Self {
        Self
    }
}

impl VisionEngine for ImageprocEngine {
    fn grayscale(&self, image: &RgbaImage) -> Result<GrayImage> {
        Ok(preprocessing::to_grayscale(image))
    }

    fn gaussian_blur(&self, image: &GrayImage, sigma: f32) -> Result<GrayImage> {
        Ok(preprocessing::apply_blur(image, sigma))
    }

    fn canny(&self, image: &GrayImage, low: f32, high: f32) -> Result<GrayImage> {
        Ok(preprocessing::detect_edges(image, low, high))
    }

    fn threshold(&self, image: &GrayImage, cutoff: u8) -> Result<GrayImage> {
        Ok(preprocessing::threshold_dark(image, cutoff))
    }

    fn find_contours(
        &self,
        binary: &GrayImage,
        retrieval: RetrievalMode,
        approximation: ContourApproximation,
    ) -> Result<Vec<Contour>> {
        Ok(contours::find_contours(binary, retrieval, approximation))
    }

    fn name(&self) -> &str {
        "imageproc"
    }
}
