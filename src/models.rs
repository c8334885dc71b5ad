use serde::{Deserialize, Serialize};

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in image coordinates (pixel-inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest box covering all points, or None for an empty slice.
    /// Negative coordinates are clamped to zero.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        let max_x = max_x.max(min_x);
        let max_y = max_y.max(min_y);

        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Exclusive right edge
    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    /// True when `other` lies inside `self`, edges inclusive.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Clip to an image of the given size. Returns None when nothing is left.
    pub fn clipped_to(&self, img_width: u32, img_height: u32) -> Option<BoundingBox> {
        if self.x >= img_width || self.y >= img_height {
            return None;
        }
        let width = (self.right().min(u64::from(img_width)) - u64::from(self.x)) as u32;
        let height = (self.bottom().min(u64::from(img_height)) - u64::from(self.y)) as u32;
        if width == 0 || height == 0 {
            return None;
        }
        Some(BoundingBox::new(self.x, self.y, width, height))
    }
}

/// A closed boundary traced from a binary image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point>,
    /// True for the inner border of a foreground region
    pub is_hole: bool,
    /// Index of the enclosing contour in the same extraction, if any
    pub parent: Option<usize>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }
}

/// A convex quadrilateral that passed shape and size filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSquare {
    pub bounding_box: BoundingBox,
    pub vertices: [Point; 4],
    pub is_convex: bool,
    pub contour_index: usize,
}

/// Why the shape classifier turned a contour down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    TooFewVertices,
    NotQuadrilateral,
    NotConvex,
    TooSmall,
    TooLarge,
}

/// Diagnostic record for a contour that is not a candidate square
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedContour {
    pub contour_index: usize,
    pub bounding_box: Option<BoundingBox>,
    pub reason: RejectReason,
}

/// One classified square
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bounding_box: BoundingBox,
    pub is_marked: bool,
    /// Mean grayscale intensity over the bounding box (0-255)
    pub mean_intensity: f32,
}

/// Final output of one detection call
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionResult {
    pub detections: Vec<Detection>,
    pub total: usize,
}

impl DetectionResult {
    pub fn new(detections: Vec<Detection>) -> Self {
        let total = detections.len();
        Self { detections, total }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn marked_count(&self) -> usize {
        self.detections.iter().filter(|d| d.is_marked).count()
    }

    pub fn marked(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter().filter(|d| d.is_marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_is_pixel_inclusive() {
        let pts = [Point::new(10, 20), Point::new(49, 20), Point::new(49, 59), Point::new(10, 59)];
        let bbox = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 20, 40, 40));
    }

    #[test]
    fn containment_is_inclusive_on_all_edges() {
        let outer = BoundingBox::new(10, 10, 40, 40);
        assert!(outer.contains(&outer));
        assert!(outer.contains(&BoundingBox::new(10, 10, 10, 40)));
        assert!(!outer.contains(&BoundingBox::new(9, 10, 10, 10)));
        assert!(!outer.contains(&BoundingBox::new(45, 45, 6, 5)));
    }

    #[test]
    fn clipping_trims_to_image() {
        let bbox = BoundingBox::new(90, 90, 20, 20);
        assert_eq!(bbox.clipped_to(100, 100), Some(BoundingBox::new(90, 90, 10, 10)));
        assert_eq!(bbox.clipped_to(50, 50), None);
    }

    #[test]
    fn result_counts() {
        let bbox = BoundingBox::new(0, 0, 10, 10);
        let result = DetectionResult::new(vec![
            Detection { bounding_box: bbox, is_marked: true, mean_intensity: 10.0 },
            Detection { bounding_box: bbox, is_marked: false, mean_intensity: 200.0 },
        ]);
        assert_eq!(result.total, 2);
        assert_eq!(result.marked_count(), 1);
    }
}
