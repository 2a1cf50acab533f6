use super::polygon_2d::point_segment_distance;
use super::{Point2, Vector2};

/// Maximum recursion depth of adaptive flattening.
const MAX_FLATTEN_DEPTH: u32 = 16;

/// A cubic Bezier segment in control-point form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBez {
    pub p0: Point2,
    pub p1: Point2,
    pub p2: Point2,
    pub p3: Point2,
}

impl CubicBez {
    /// Creates a cubic from its four control points.
    #[must_use]
    pub fn new(p0: Point2, p1: Point2, p2: Point2, p3: Point2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Creates a cubic from endpoints and scaled end tangents.
    ///
    /// `start_tangent` is the derivative at `t = 0` and `end_tangent` the
    /// derivative at `t = 1`, i.e. three times the handle vectors.
    #[must_use]
    pub fn from_tangents(
        start: Point2,
        start_tangent: Vector2,
        end_tangent: Vector2,
        end: Point2,
    ) -> Self {
        Self {
            p0: start,
            p1: start + start_tangent / 3.0,
            p2: end - end_tangent / 3.0,
            p3: end,
        }
    }

    /// Returns the derivatives at `t = 0` and `t = 1`.
    #[must_use]
    pub fn tangents(&self) -> (Vector2, Vector2) {
        ((self.p1 - self.p0) * 3.0, (self.p3 - self.p2) * 3.0)
    }

    /// Evaluates the curve at parameter `t`.
    #[must_use]
    pub fn eval(&self, t: f64) -> Point2 {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point2::from(
            self.p0.coords * a + self.p1.coords * b + self.p2.coords * c + self.p3.coords * d,
        )
    }

    /// First derivative at parameter `t`.
    #[must_use]
    pub fn derivative(&self, t: f64) -> Vector2 {
        let mt = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * mt * mt)
            + (self.p2 - self.p1) * (6.0 * mt * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Splits the curve at `t` (de Casteljau).
    #[must_use]
    pub fn split(&self, t: f64) -> (Self, Self) {
        let q0 = self.p0 + (self.p1 - self.p0) * t;
        let q1 = self.p1 + (self.p2 - self.p1) * t;
        let q2 = self.p2 + (self.p3 - self.p2) * t;
        let r0 = q0 + (q1 - q0) * t;
        let r1 = q1 + (q2 - q1) * t;
        let s = r0 + (r1 - r0) * t;
        (Self::new(self.p0, q0, r0, s), Self::new(s, r1, q2, self.p3))
    }

    /// Returns the portion of the curve between `t0` and `t1`.
    ///
    /// When `t0 > t1` the returned segment runs backwards.
    #[must_use]
    pub fn subsegment(&self, t0: f64, t1: f64) -> Self {
        if t0 > t1 {
            return self.subsegment(t1, t0).reversed();
        }
        let (_, right) = self.split(t0);
        if (1.0 - t0).abs() < f64::EPSILON {
            return Self::new(right.p0, right.p0, right.p0, right.p0);
        }
        let (mid, _) = right.split((t1 - t0) / (1.0 - t0));
        mid
    }

    /// Same curve traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(self.p3, self.p2, self.p1, self.p0)
    }

    /// Maximum distance of the inner control points from the chord.
    #[must_use]
    pub fn flatness(&self) -> f64 {
        point_segment_distance(&self.p1, &self.p0, &self.p3)
            .max(point_segment_distance(&self.p2, &self.p0, &self.p3))
    }

    /// Flattens the curve into `(t, point)` samples, excluding `t = 0`.
    ///
    /// Subdivides adaptively until each piece deviates from its chord by at
    /// most `tolerance`.
    #[must_use]
    pub fn flatten(&self, tolerance: f64) -> Vec<(f64, Point2)> {
        let mut out = Vec::new();
        flatten_rec(self, 0.0, 1.0, tolerance.max(f64::EPSILON), 0, &mut out);
        out
    }

    /// Approximate arc length by flattening.
    #[must_use]
    pub fn arc_length(&self, tolerance: f64) -> f64 {
        let mut prev = self.p0;
        let mut len = 0.0;
        for (_, p) in self.flatten(tolerance) {
            len += (p - prev).norm();
            prev = p;
        }
        len
    }
}

fn flatten_rec(
    curve: &CubicBez,
    t0: f64,
    t1: f64,
    tolerance: f64,
    depth: u32,
    out: &mut Vec<(f64, Point2)>,
) {
    if depth >= MAX_FLATTEN_DEPTH || curve.flatness() <= tolerance {
        out.push((t1, curve.p3));
        return;
    }
    let (left, right) = curve.split(0.5);
    let mid = 0.5 * (t0 + t1);
    flatten_rec(&left, t0, mid, tolerance, depth + 1, out);
    flatten_rec(&right, mid, t1, tolerance, depth + 1, out);
}
