use super::{Point2, Vector2, TOLERANCE};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Winding number of a closed polygon around `point`.
///
/// Counter-clockwise loops contribute `+1`. Points exactly on the boundary
/// give an unspecified but finite answer; use [`point_on_polygon_boundary`]
/// first when that matters.
#[must_use]
pub fn winding_number_2d(polygon: &[Point2], point: &Point2) -> i32 {
    let n = polygon.len();
    let mut winding = 0;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        if (a.y <= point.y) != (b.y <= point.y) {
            let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x > point.x {
                winding += if b.y > a.y { 1 } else { -1 };
            }
        }
    }
    winding
}

/// Returns `true` if `point` lies within `eps` of an edge of the closed polygon.
#[must_use]
pub fn point_on_polygon_boundary(polygon: &[Point2], point: &Point2, eps: f64) -> bool {
    let n = polygon.len();
    (0..n).any(|i| point_segment_distance(point, &polygon[i], &polygon[(i + 1) % n]) < eps)
}

/// Distance from `p` to the segment `a`-`b`.
#[must_use]
pub fn point_segment_distance(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// Number of chords needed to approximate an arc of `sweep` radians within `tolerance`.
#[must_use]
pub fn circle_segment_count(radius: f64, sweep: f64, tolerance: f64) -> u32 {
    if radius <= tolerance || tolerance <= 0.0 {
        return 8;
    }
    // Sagitta of a chord spanning angle a is r * (1 - cos(a / 2)).
    let max_angle = 2.0 * (1.0 - tolerance / radius).clamp(-1.0, 1.0).acos();
    if max_angle <= TOLERANCE {
        return 256;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = (sweep.abs() / max_angle).ceil() as u32;
    n.clamp(8, 256)
}
