use tracing::debug;

use crate::error::Result;
use crate::geometry::flatten::convert_with_back_data;
use crate::geometry::Path;
use crate::math::polygon_2d::{circle_segment_count, left_normal, signed_area_2d};
use crate::math::{cross, Point2, Vector2, TOLERANCE};

use super::{FillRule, Shape, ShapeParams};

/// How two offset segments are connected at a corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Sharp corner, falling back to a bevel past the miter limit.
    #[default]
    Miter,
    Round,
    /// Straight cut across the corner.
    Bevel,
}

impl JoinType {
    /// Parses a CSS `stroke-linejoin` value.
    #[must_use]
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "round" => Self::Round,
            "bevel" => Self::Bevel,
            _ => Self::Miter,
        }
    }
}

/// How open subpaths end when stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

impl LineCap {
    /// Parses a CSS `stroke-linecap` value.
    #[must_use]
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "round" => Self::Round,
            "square" => Self::Square,
            _ => Self::Butt,
        }
    }
}

/// Stroke parameters for outlining.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub join: JoinType,
    pub cap: LineCap,
    /// Maximum miter length as a multiple of half the width.
    pub miter_limit: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            join: JoinType::Miter,
            cap: LineCap::Butt,
            miter_limit: 4.0,
        }
    }
}

impl Shape {
    /// Grows (positive `distance`) or shrinks (negative) the filled area.
    ///
    /// A band of half-width `|distance|` is built around every boundary
    /// loop, with joins on the open side of each corner. The band is added
    /// to or removed from the shape and the result is uncrossed with
    /// [`FillRule::Positive`].
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::MissingWinding` if the shape was not uncrossed.
    pub fn make_offset(
        &self,
        distance: f64,
        join: JoinType,
        miter_limit: f64,
        params: &ShapeParams,
    ) -> Result<Shape> {
        self.require_winding()?;
        if distance.abs() < TOLERANCE {
            return Ok(self.clone());
        }
        let radius = distance.abs();
        let mut raw = self.clone();
        let mut bands = 0usize;
        for traced in self.trace_loops()? {
            let points = traced
                .edges
                .iter()
                .map(|&id| self.edge_points(id).map(|(a, _)| a))
                .collect::<Result<Vec<_>>>()?;
            for mut polygon in band_polygons(
                &points,
                traced.closed,
                radius,
                join,
                miter_limit,
                None,
                params.arc_tolerance,
            ) {
                if distance < 0.0 {
                    polygon.reverse();
                }
                raw.add_polygon(&polygon);
                bands += 1;
            }
        }
        let out = raw.convert_to_shape(FillRule::Positive, params)?;
        debug!(distance, bands, edges = out.edge_count(), "offset shape");
        Ok(out)
    }

    /// Builds the filled outline of stroking `path` with `style`.
    ///
    /// # Errors
    ///
    /// Returns an error if the intermediate graph is inconsistent.
    pub fn stroke(
        path: &Path,
        style: &StrokeStyle,
        tolerance: f64,
        params: &ShapeParams,
    ) -> Result<Shape> {
        let radius = 0.5 * style.width;
        let mut raw = Shape::new();
        if radius > TOLERANCE {
            for polyline in convert_with_back_data(path, tolerance) {
                let mut points = polyline.vertices();
                if polyline.closed && points.len() > 1 {
                    let first = points[0];
                    if points.last().is_some_and(|p| (p - first).norm() < TOLERANCE) {
                        points.pop();
                    }
                }
                for polygon in band_polygons(
                    &points,
                    polyline.closed,
                    radius,
                    style.join,
                    style.miter_limit,
                    Some(style.cap),
                    params.arc_tolerance,
                ) {
                    raw.add_polygon(&polygon);
                }
            }
        }
        raw.convert_to_shape(FillRule::Positive, params)
    }
}

/// Counter-clockwise polygons whose union is the band of half-width `radius`
/// around the polyline, including joins and, for open polylines, caps.
pub(crate) fn band_polygons(
    points: &[Point2],
    closed: bool,
    radius: f64,
    join: JoinType,
    miter_limit: f64,
    cap: Option<LineCap>,
    arc_tolerance: f64,
) -> Vec<Vec<Point2>> {
    let mut pts: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if pts.last().is_none_or(|q: &Point2| (p - q).norm() > TOLERANCE) {
            pts.push(*p);
        }
    }
    if closed && pts.len() > 1 && (pts[0] - pts[pts.len() - 1]).norm() <= TOLERANCE {
        pts.pop();
    }
    let n = pts.len();
    if n < 2 {
        return Vec::new();
    }
    let segment_count = if closed { n } else { n - 1 };
    let dirs: Vec<Vector2> = (0..segment_count)
        .map(|i| {
            let d = pts[(i + 1) % n] - pts[i];
            d / d.norm()
        })
        .collect();

    let mut polygons = Vec::new();
    for (i, d) in dirs.iter().enumerate() {
        let (p, q) = (pts[i], pts[(i + 1) % n]);
        let nr = left_normal(*d) * radius;
        polygons.push(vec![p - nr, q - nr, q + nr, p + nr]);
    }

    let joints: Vec<(usize, usize, usize)> = if closed {
        (0..n).map(|i| ((i + segment_count - 1) % segment_count, i, i)).collect()
    } else {
        (1..n - 1).map(|i| (i - 1, i, i)).collect()
    };
    for (incoming, vertex, outgoing) in joints {
        if let Some(polygon) = join_polygon(
            pts[vertex],
            dirs[incoming],
            dirs[outgoing],
            radius,
            join,
            miter_limit,
            arc_tolerance,
        ) {
            polygons.push(polygon);
        }
    }

    if !closed {
        if let Some(cap) = cap {
            polygons.extend(cap_polygon(pts[0], -dirs[0], radius, cap, arc_tolerance));
            polygons.extend(cap_polygon(
                pts[n - 1],
                dirs[segment_count - 1],
                radius,
                cap,
                arc_tolerance,
            ));
        }
    }

    for polygon in &mut polygons {
        if signed_area_2d(polygon) < 0.0 {
            polygon.reverse();
        }
    }
    polygons
}

fn join_polygon(
    v: Point2,
    d1: Vector2,
    d2: Vector2,
    radius: f64,
    join: JoinType,
    miter_limit: f64,
    arc_tolerance: f64,
) -> Option<Vec<Point2>> {
    let turn = cross(&d1, &d2);
    if turn.abs() < 1e-12 && d1.dot(&d2) > 0.0 {
        return None;
    }
    // A left turn opens a gap on the right side, and vice versa.
    let side = if turn > 0.0 { -1.0 } else { 1.0 };
    let n1 = left_normal(d1) * side;
    let n2 = left_normal(d2) * side;
    let a = v + n1 * radius;
    let b = v + n2 * radius;

    match join {
        JoinType::Bevel => Some(vec![v, a, b]),
        JoinType::Miter => {
            let denom = 1.0 + n1.dot(&n2);
            if denom > TOLERANCE && (2.0 / denom).sqrt() <= miter_limit {
                let tip = v + (n1 + n2) * (radius / denom);
                Some(vec![v, a, tip, b])
            } else {
                Some(vec![v, a, b])
            }
        }
        JoinType::Round => {
            let start = n1.y.atan2(n1.x);
            let sweep = cross(&n1, &n2).atan2(n1.dot(&n2));
            Some(arc_fan(v, radius, start, sweep, arc_tolerance))
        }
    }
}

fn cap_polygon(
    end: Point2,
    outward: Vector2,
    radius: f64,
    cap: LineCap,
    arc_tolerance: f64,
) -> Option<Vec<Point2>> {
    let nr = left_normal(outward) * radius;
    match cap {
        LineCap::Butt => None,
        LineCap::Square => {
            let ext = outward * radius;
            Some(vec![end - nr, end - nr + ext, end + nr + ext, end + nr])
        }
        LineCap::Round => {
            let start = (-nr.y).atan2(-nr.x);
            let mut fan = arc_fan(end, radius, start, std::f64::consts::PI, arc_tolerance);
            // The half disc needs no center point.
            fan.remove(0);
            Some(fan)
        }
    }
}

/// Pie slice centered at `center`: the center followed by arc points.
fn arc_fan(center: Point2, radius: f64, start: f64, sweep: f64, tolerance: f64) -> Vec<Point2> {
    let steps = circle_segment_count(radius, sweep, tolerance);
    let mut fan = Vec::with_capacity(steps as usize + 2);
    fan.push(center);
    for k in 0..=steps {
        let angle = start + sweep * f64::from(k) / f64::from(steps);
        fan.push(Point2::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        ));
    }
    fan
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::svg_data::parse_path_data;
    use approx::assert_abs_diff_eq;

    fn square(size: f64) -> Shape {
        let mut shape = Shape::new();
        let path = parse_path_data(&format!("M0,0 L{size},0 L{size},{size} L0,{size} Z")).unwrap();
        shape.fill(&path, 0, true, 0.1);
        shape
            .convert_to_shape(FillRule::NonZero, &ShapeParams::default())
            .unwrap()
    }

    #[test]
    fn miter_outset_of_square_is_square() {
        let out = square(2.0)
            .make_offset(0.5, JoinType::Miter, 4.0, &ShapeParams::default())
            .unwrap();
        assert_abs_diff_eq!(out.area(), 9.0, epsilon = 1e-6);
    }

    #[test]
    fn bevel_cuts_the_corners() {
        let out = square(2.0)
            .make_offset(0.5, JoinType::Bevel, 4.0, &ShapeParams::default())
            .unwrap();
        // Four corner triangles of legs 0.5 are missing.
        assert_abs_diff_eq!(out.area(), 9.0 - 0.5, epsilon = 1e-6);
    }

    #[test]
    fn outset_area_grows_with_distance() {
        let base = square(2.0);
        let params = ShapeParams::default();
        let mut last = base.area();
        for d in [0.25, 0.5, 1.0] {
            let area = base.make_offset(d, JoinType::Round, 4.0, &params).unwrap().area();
            assert!(area > last, "{area} <= {last}");
            last = area;
        }
        // Bounded by the miter square.
        assert!(last < 16.0);
    }

    #[test]
    fn inset_shrinks_until_empty() {
        let base = square(2.0);
        let params = ShapeParams::default();
        let inset = base.make_offset(-0.5, JoinType::Miter, 4.0, &params).unwrap();
        assert_abs_diff_eq!(inset.area(), 1.0, epsilon = 1e-6);
        let smaller = base.make_offset(-0.75, JoinType::Miter, 4.0, &params).unwrap();
        assert!(smaller.area() < inset.area());
        let gone = base.make_offset(-1.5, JoinType::Miter, 4.0, &params).unwrap();
        assert!(gone.is_empty());
    }

    #[test]
    fn stroke_of_open_line_uses_caps() {
        let line = parse_path_data("M0,0 L4,0").unwrap();
        let params = ShapeParams::default();
        let mut style = StrokeStyle {
            width: 2.0,
            ..StrokeStyle::default()
        };
        let butt = Shape::stroke(&line, &style, 0.1, &params).unwrap();
        assert_abs_diff_eq!(butt.area(), 8.0, epsilon = 1e-6);
        style.cap = LineCap::Square;
        let square = Shape::stroke(&line, &style, 0.1, &params).unwrap();
        assert_abs_diff_eq!(square.area(), 12.0, epsilon = 1e-6);
        style.cap = LineCap::Round;
        let round = Shape::stroke(&line, &style, 0.1, &params).unwrap();
        assert!(round.area() > 8.0 && round.area() < 8.0 + std::f64::consts::PI + 1e-6);
    }

    #[test]
    fn css_values_parse() {
        assert_eq!(JoinType::from_css("round"), JoinType::Round);
        assert_eq!(JoinType::from_css("miter"), JoinType::Miter);
        assert_eq!(LineCap::from_css("square"), LineCap::Square);
        assert_eq!(LineCap::from_css(""), LineCap::Butt);
    }
}
