use image::GrayImage;
use imageproc::contours::BorderType;

use crate::config::{ContourApproximation, RetrievalMode};
use crate::models::{Contour, Point};

/// Trace region borders in a binary image (non-zero pixels are foreground).
///
/// Order follows the raster scan of the border follower, so it is stable
/// for a given input. An image without foreground yields no contours.
/// Pixels outside the image count as background, so regions touching the
/// image edge still get an outer border.
pub fn find_contours(
    binary: &GrayImage,
    retrieval: RetrievalMode,
    approximation: ContourApproximation,
) -> Vec<Contour> {
    // The tracer never starts an outer border in column 0.
    let mut padded = GrayImage::new(binary.width() + 2, binary.height() + 2);
    image::imageops::replace(&mut padded, binary, 1, 1);
    let traced = imageproc::contours::find_contours::<i32>(&padded);

    traced
        .into_iter()
        .filter(|c| match retrieval {
            RetrievalMode::List => true,
            RetrievalMode::External => c.border_type == BorderType::Outer && c.parent.is_none(),
        })
        .map(|c| {
            let points: Vec<Point> = c.points.iter().map(|p| Point::new(p.x - 1, p.y - 1)).collect();
            let points = match approximation {
                ContourApproximation::None => points,
                ContourApproximation::Simple => compress_straight_runs(&points),
            };
            Contour {
                points,
                is_hole: c.border_type == BorderType::Hole,
                // Parent indices refer to the full list, which external retrieval does not keep.
                parent: match retrieval {
                    RetrievalMode::List => c.parent,
                    RetrievalMode::External => None,
                },
            }
        })
        .collect()
}

/// Keep only the points where a closed chain changes direction.
pub fn compress_straight_runs(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: Point, b: Point| (b.x - a.x, b.y - a.y);
    let compressed: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    // A chain that never turns (a back-and-forth line) keeps its endpoints.
    if compressed.is_empty() {
        return vec![points[0], points[n - 1]];
    }
    compressed
}
