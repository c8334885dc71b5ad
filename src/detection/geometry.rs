//! Polygon geometry on integer contours: perimeter, closed-curve
//! Ramer-Douglas-Peucker approximation, and convexity.

use imageproc::point::Point as PixelPoint;

use crate::models::Point;

/// Length of the closed curve through `points`, including the closing segment.
pub fn arc_length(points: &[Point]) -> f64 {
    let curve: Vec<PixelPoint<i32>> = points.iter().map(|p| PixelPoint::new(p.x, p.y)).collect();
    imageproc::geometry::arc_length(&curve, true)
}

/// Approximate a closed curve with fewer vertices.
///
/// The curve is split at its first point and the point farthest from it,
/// each half is simplified with RDP, and the start vertex is dropped again
/// when it lies within `epsilon` of the line joining its neighbours.
pub fn approximate_polygon(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let start = points[0];
    let Some(far) = (1..n).max_by_key(|&i| distance_sq(start, points[i])) else {
        return points.to_vec();
    };
    if distance_sq(start, points[far]) == 0 {
        // Every point coincides with the start.
        return vec![start];
    }

    let mut kept = vec![false; n];
    kept[0] = true;
    kept[far] = true;
    rdp_recurse(&points[..=far], 0, far, epsilon, &mut kept[..=far]);

    // Second half runs from the far point back around to the start.
    let ring: Vec<Point> = points[far..].iter().copied().chain(std::iter::once(start)).collect();
    let mut ring_kept = vec![false; ring.len()];
    let last = ring.len() - 1;
    rdp_recurse(&ring, 0, last, epsilon, &mut ring_kept);
    for (offset, keep) in ring_kept.iter().enumerate().take(last).skip(1) {
        if *keep {
            kept[far + offset] = true;
        }
    }

    let mut polygon: Vec<Point> = points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect();

    // The start point is forced into the result; drop it when it sits on an edge.
    if polygon.len() > 3 {
        let prev = polygon[polygon.len() - 1];
        let next = polygon[1];
        if perpendicular_distance(polygon[0], prev, next) <= epsilon {
            polygon.remove(0);
        }
    }

    polygon
}

/// True when the polygon turns the same way at every vertex.
/// Collinear vertices count as non-convex.
pub fn is_convex(polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut sign = 0i64;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let c = polygon[(i + 2) % n];
        let cross = cross(a, b, c);
        if cross == 0 {
            return false;
        }
        let s = cross.signum();
        if sign == 0 {
            sign = s;
        } else if s != sign {
            return false;
        }
    }
    true
}

fn rdp_recurse(points: &[Point], start: usize, end: usize, epsilon: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, epsilon, kept);
        rdp_recurse(points, max_idx, end, epsilon, kept);
    }
}

/// Distance from `p` to the line through `a` and `b` (to `a` when they coincide).
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return distance(p, a);
    }
    let cross = dx * f64::from(a.y - p.y) - dy * f64::from(a.x - p.x);
    cross.abs() / length_sq.sqrt()
}

/// z-component of (b - a) x (c - b)
fn cross(a: Point, b: Point, c: Point) -> i64 {
    let (abx, aby) = (i64::from(b.x - a.x), i64::from(b.y - a.y));
    let (bcx, bcy) = (i64::from(c.x - b.x), i64::from(c.y - b.y));
    abx * bcy - aby * bcx
}

fn distance(a: Point, b: Point) -> f64 {
    (distance_sq(a, b) as f64).sqrt()
}

fn distance_sq(a: Point, b: Point) -> i64 {
    let dx = i64::from(a.x - b.x);
    let dy = i64::from(a.y - b.y);
    dx * dx + dy * dy
}
