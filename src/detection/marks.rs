use image::GrayImage;

use crate::models::{BoundingBox, CandidateSquare, Detection};

/// Mean intensity of `gray` over `bbox`, clipped to the image.
/// Returns None when the box falls entirely outside the image.
pub fn mean_intensity(gray: &GrayImage, bbox: &BoundingBox) -> Option<f32> {
    let region = bbox.clipped_to(gray.width(), gray.height())?;

    let mut sum: u64 = 0;
    for y in region.y..region.y + region.height {
        for x in region.x..region.x + region.width {
            sum += u64::from(gray.get_pixel(x, y).0[0]);
        }
    }
    Some((sum as f64 / region.area() as f64) as f32)
}

/// Classify each square as marked (darker than `threshold` on average) or not
pub fn evaluate_marks(gray: &GrayImage, squares: &[CandidateSquare], threshold: f32) -> Vec<Detection> {
    squares
        .iter()
        .map(|square| {
            // A box outside the image has nothing dark in it.
            let mean = mean_intensity(gray, &square.bounding_box).unwrap_or(255.0);
            Detection {
                bounding_box: square.bounding_box,
                is_marked: mean < threshold,
                mean_intensity: mean,
            }
        })
        .collect()
}
