use tracing::trace;

use crate::detection::geometry;
use crate::engine::VisionEngine;
use crate::models::{CandidateSquare, Contour, Point, RejectReason, RejectedContour};

/// Parameters for quadrilateral classification
#[derive(Debug, Clone, Copy)]
pub struct SquareFilter {
    pub approx_tolerance: f64,
    pub min_size: u32,
    pub max_size: u32,
}

/// Outcome of classifying every contour of a frame
#[derive(Debug, Default)]
pub struct Classification {
    pub candidates: Vec<CandidateSquare>,
    pub rejected: Vec<RejectedContour>,
}

impl SquareFilter {
    /// Classify a single contour
    pub fn classify(
        &self,
        engine: &dyn VisionEngine,
        index: usize,
        contour: &Contour,
    ) -> Result<CandidateSquare, RejectedContour> {
        let reject = |reason, bounding_box| RejectedContour {
            contour_index: index,
            bounding_box,
            reason,
        };

        let perimeter = engine.arc_length(&contour.points);
        let polygon = engine.approximate_polygon(&contour.points, self.approx_tolerance * perimeter);

        if polygon.len() < 4 {
            return Err(reject(RejectReason::TooFewVertices, contour.bounding_box()));
        }
        let vertices: [Point; 4] = match polygon.as_slice().try_into() {
            Ok(v) => v,
            Err(_) => return Err(reject(RejectReason::NotQuadrilateral, contour.bounding_box())),
        };
        // Boxed from the full contour: the polygon cuts rounded corners, and an
        // outer border must still enclose its own hole border.
        let bbox = contour.bounding_box();
        if !geometry::is_convex(&vertices) {
            return Err(reject(RejectReason::NotConvex, bbox));
        }
        let Some(bbox) = bbox else {
            return Err(reject(RejectReason::TooFewVertices, None));
        };
        if bbox.width < self.min_size || bbox.height < self.min_size {
            return Err(reject(RejectReason::TooSmall, Some(bbox)));
        }
        if bbox.width > self.max_size || bbox.height > self.max_size {
            return Err(reject(RejectReason::TooLarge, Some(bbox)));
        }

        Ok(CandidateSquare {
            bounding_box: bbox,
            vertices,
            is_convex: true,
            contour_index: index,
        })
    }

    /// Classify contours in order, splitting them into candidates and rejects
    pub fn classify_all(&self, engine: &dyn VisionEngine, contours: &[Contour]) -> Classification {
        let mut result = Classification::default();
        for (index, contour) in contours.iter().enumerate() {
            match self.classify(engine, index, contour) {
                Ok(square) => result.candidates.push(square),
                Err(rejected) => {
                    trace!(index, reason = ?rejected.reason, "contour rejected");
                    result.rejected.push(rejected);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ImageprocEngine;
    use crate::models::BoundingBox;

    fn filter() -> SquareFilter {
        SquareFilter {
            approx_tolerance: 0.02,
            min_size: 10,
            max_size: 150,
        }
    }

    fn rect_contour(x: i32, y: i32, w: i32, h: i32) -> Contour {
        Contour {
            points: vec![
                Point::new(x, y),
                Point::new(x + w - 1, y),
                Point::new(x + w - 1, y + h - 1),
                Point::new(x, y + h - 1),
            ],
            is_hole: false,
            parent: None,
        }
    }

    #[test]
    fn accepts_square_in_band() {
        let square = filter().classify(&ImageprocEngine, 3, &rect_contour(10, 10, 40, 40)).unwrap();
        assert_eq!(square.bounding_box, BoundingBox::new(10, 10, 40, 40));
        assert_eq!(square.contour_index, 3);
        assert!(square.is_convex);
    }

    #[test]
    fn bounding_box_covers_points_the_polygon_drops() {
        // Small bump on the top edge, well inside the polygon tolerance.
        let bumpy = Contour {
            points: vec![
                Point::new(10, 10),
                Point::new(29, 10),
                Point::new(30, 9),
                Point::new(31, 10),
                Point::new(49, 10),
                Point::new(49, 49),
                Point::new(10, 49),
            ],
            is_hole: false,
            parent: None,
        };
        let square = filter().classify(&ImageprocEngine, 0, &bumpy).unwrap();
        assert!(!square.vertices.contains(&Point::new(30, 9)));
        assert_eq!(square.bounding_box, BoundingBox::new(10, 9, 40, 41));
    }

    #[test]
    fn rejects_narrow_quadrilateral() {
        let rejected = filter().classify(&ImageprocEngine, 0, &rect_contour(10, 10, 5, 40)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::TooSmall);
    }

    #[test]
    fn rejects_oversized_quadrilateral() {
        let rejected = filter().classify(&ImageprocEngine, 0, &rect_contour(0, 0, 151, 40)).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::TooLarge);
    }

    #[test]
    fn size_band_is_inclusive() {
        assert!(filter().classify(&ImageprocEngine, 0, &rect_contour(0, 0, 10, 10)).is_ok());
        assert!(filter().classify(&ImageprocEngine, 0, &rect_contour(0, 0, 150, 150)).is_ok());
    }

    #[test]
    fn rejects_triangle() {
        let tri = Contour {
            points: vec![Point::new(0, 0), Point::new(40, 0), Point::new(20, 30)],
            is_hole: false,
            parent: None,
        };
        let rejected = filter().classify(&ImageprocEngine, 0, &tri).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::TooFewVertices);
    }

    #[test]
    fn rejects_concave_quadrilateral() {
        let dart = Contour {
            points: vec![Point::new(0, 0), Point::new(40, 20), Point::new(0, 40), Point::new(15, 20)],
            is_hole: false,
            parent: None,
        };
        let rejected = filter().classify(&ImageprocEngine, 0, &dart).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::NotConvex);
    }

    #[test]
    fn rejects_hexagon() {
        let hex = Contour {
            points: vec![
                Point::new(20, 0),
                Point::new(60, 0),
                Point::new(80, 35),
                Point::new(60, 70),
                Point::new(20, 70),
                Point::new(0, 35),
            ],
            is_hole: false,
            parent: None,
        };
        let rejected = filter().classify(&ImageprocEngine, 0, &hex).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::NotQuadrilateral);
    }

    #[test]
    fn classify_all_preserves_order() {
        let contours = vec![
            rect_contour(100, 100, 20, 20),
            rect_contour(0, 0, 3, 3),
            rect_contour(10, 10, 30, 30),
        ];
        let result = filter().classify_all(&ImageprocEngine, &contours);
        let indices: Vec<usize> = result.candidates.iter().map(|c| c.contour_index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(result.rejected.len(), 1);
        assert_eq!(result.rejected[0].contour_index, 1);
    }
}
