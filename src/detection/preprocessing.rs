use image::{GrayImage, Luma, RgbaImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;

/// Convert image to grayscale using luma weighting
pub fn to_grayscale(img: &RgbaImage) -> GrayImage {
    image::imageops::grayscale(img)
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Binarize with ink as foreground: pixels darker than `cutoff` become 255, the rest 0.
///
/// This is the inverse of a plain binary threshold (which keeps bright pixels),
/// so dark boxes on white paper are traced as outer borders.
pub fn threshold_dark(img: &GrayImage, cutoff: u8) -> GrayImage {
    let mut binary = img.clone();
    for p in binary.pixels_mut() {
        *p = if p.0[0] < cutoff { Luma([255]) } else { Luma([0]) };
    }
    binary
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn grayscale_keeps_dimensions() {
        let img = RgbaImage::from_pixel(17, 31, Rgba([128, 64, 32, 255]));
        let gray = to_grayscale(&img);
        assert_eq!(gray.dimensions(), (17, 31));
    }

    #[test]
    fn grayscale_of_white_and_black() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let gray = to_grayscale(&img);
        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
        assert_eq!(gray.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn threshold_marks_dark_pixels_as_foreground() {
        let mut img = GrayImage::from_pixel(3, 1, Luma([200]));
        img.put_pixel(0, 0, Luma([10]));
        img.put_pixel(1, 0, Luma([127]));
        let binary = threshold_dark(&img, 127);
        assert_eq!(binary.get_pixel(0, 0).0[0], 255);
        assert_eq!(binary.get_pixel(1, 0).0[0], 0);
        assert_eq!(binary.get_pixel(2, 0).0[0], 0);
    }

    #[test]
    fn uniform_image_has_no_edges() {
        let img = GrayImage::from_pixel(32, 32, Luma([255]));
        let edges = detect_edges(&img, 50.0, 150.0);
        assert!(edges.pixels().all(|p| p.0[0] == 0));
    }
}
