use super::{cross, Point2, Vector2};

/// How two segments meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    /// The segments are disjoint.
    None,
    /// A single meeting point with parameters `t` on the first and `u` on the
    /// second segment, both clamped to `[0, 1]`.
    Point { point: Point2, t: f64, u: f64 },
    /// The segments are collinear and overlap on `[t0, t1]` of the first
    /// segment, which corresponds to `[u0, u1]` on the second.
    Overlap { t0: f64, t1: f64, u0: f64, u1: f64 },
}

/// Bounded segment-segment intersection in 2D with a distance tolerance.
///
/// `eps` is a length: endpoints closer than `eps` to the other segment count
/// as touching it, and segments whose lines are closer than `eps` count as
/// collinear.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
    eps: f64,
) -> SegmentIntersection {
    let da = a1 - a0;
    let db = b1 - b0;
    let len_a = da.norm();
    let len_b = db.norm();
    if len_a < eps || len_b < eps {
        return SegmentIntersection::None;
    }

    let denom = cross(&da, &db);
    // Distance of the b endpoints from the line through a.
    let dist_b0 = cross(&da, &(b0 - a0)) / len_a;
    let dist_b1 = cross(&da, &(b1 - a0)) / len_a;

    if dist_b0.abs() < eps && dist_b1.abs() < eps {
        return collinear_overlap(a0, &da, len_a, b0, b1, eps);
    }

    if denom.abs() < f64::EPSILON * len_a * len_b {
        return SegmentIntersection::None;
    }

    let diff: Vector2 = b0 - a0;
    let t = cross(&diff, &db) / denom;
    let u = cross(&diff, &da) / denom;

    let eps_t = eps / len_a;
    let eps_u = eps / len_b;
    if t < -eps_t || t > 1.0 + eps_t || u < -eps_u || u > 1.0 + eps_u {
        return SegmentIntersection::None;
    }

    let t = t.clamp(0.0, 1.0);
    let u = u.clamp(0.0, 1.0);
    SegmentIntersection::Point {
        point: a0 + da * t,
        t,
        u,
    }
}

fn collinear_overlap(
    a0: &Point2,
    da: &Vector2,
    len_a: f64,
    b0: &Point2,
    b1: &Point2,
    eps: f64,
) -> SegmentIntersection {
    let len_sq = len_a * len_a;
    let tb0 = (b0 - a0).dot(da) / len_sq;
    let tb1 = (b1 - a0).dot(da) / len_sq;
    let (lo, hi) = if tb0 <= tb1 { (tb0, tb1) } else { (tb1, tb0) };
    let eps_t = eps / len_a;

    let t0 = lo.max(0.0);
    let t1 = hi.min(1.0);
    if t1 < t0 - eps_t {
        return SegmentIntersection::None;
    }

    let to_u = |t: f64| {
        if (tb1 - tb0).abs() < f64::EPSILON {
            0.0
        } else {
            ((t - tb0) / (tb1 - tb0)).clamp(0.0, 1.0)
        }
    };

    if t1 - t0 < eps_t {
        // Touching at a single point.
        let t = t0.clamp(0.0, 1.0);
        return SegmentIntersection::Point {
            point: a0 + da * t,
            t,
            u: to_u(t),
        };
    }

    SegmentIntersection::Overlap {
        t0,
        t1,
        u0: to_u(t0),
        u1: to_u(t1),
    }
}
