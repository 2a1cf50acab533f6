use tracing::debug;

use crate::geometry::flatten::convert_with_back_data;
use crate::geometry::Path;

use super::{BackData, EdgeData, Shape};

/// Rule deciding which winding numbers count as inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
    /// Inside where the winding is strictly positive.
    Positive,
    /// Skip winding computation; the shape is only uncrossed.
    JustDont,
}

impl FillRule {
    /// Whether `winding` is inside under this rule.
    ///
    /// `JustDont` never reports inside.
    #[must_use]
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            Self::NonZero => winding != 0,
            Self::EvenOdd => winding.rem_euclid(2) == 1,
            Self::Positive => winding > 0,
            Self::JustDont => false,
        }
    }

    /// Parses a CSS `fill-rule` value; anything but `evenodd` is nonzero.
    #[must_use]
    pub fn from_css(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("evenodd") {
            Self::EvenOdd
        } else {
            Self::NonZero
        }
    }
}

impl Shape {
    /// Flattens `path` into edges tagged with `path_id`.
    ///
    /// Existing content is kept, so several operands can share one shape.
    /// Open subpaths are closed with a straight edge when `close_if_needed`
    /// is set. Back data is recorded when the path has it enabled.
    pub fn fill(&mut self, path: &Path, path_id: usize, close_if_needed: bool, tolerance: f64) {
        let record = path.has_back_data();
        let before = self.edge_count();
        for polyline in convert_with_back_data(path, tolerance) {
            let n = polyline.points.len();
            if n < 2 {
                continue;
            }
            let ids: Vec<_> = polyline
                .points
                .iter()
                .map(|p| self.add_point(p.point))
                .collect();
            for i in 0..n - 1 {
                let mut edge = EdgeData::new(ids[i], ids[i + 1]);
                if record {
                    let origin = polyline.edge_origin(i);
                    edge.back.push(BackData {
                        path_id,
                        piece: origin.piece,
                        t_start: origin.t_start,
                        t_end: origin.t_end,
                    });
                }
                self.add_edge(edge);
            }
            let first = polyline.points[0].point;
            let last = polyline.points[n - 1].point;
            if !polyline.closed && close_if_needed && (first - last).norm() > 0.0 {
                self.add_edge(EdgeData::new(ids[n - 1], ids[0]));
            }
        }
        debug!(
            path_id,
            edges = self.edge_count() - before,
            "filled shape from path"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::svg_data::parse_path_data;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rules_classify_windings() {
        assert!(FillRule::NonZero.is_inside(-2));
        assert!(!FillRule::EvenOdd.is_inside(-2));
        assert!(FillRule::EvenOdd.is_inside(-1));
        assert!(!FillRule::Positive.is_inside(-1));
        assert!(!FillRule::JustDont.is_inside(1));
        assert_eq!(FillRule::from_css(" evenodd"), FillRule::EvenOdd);
        assert_eq!(FillRule::from_css("inherit"), FillRule::NonZero);
    }

    #[test]
    fn fill_closes_open_subpaths_on_request() {
        let path = parse_path_data("M0,0 L1,0 L1,1").unwrap();
        let mut open = Shape::new();
        open.fill(&path, 0, false, 0.1);
        assert_eq!(open.edge_count(), 2);
        let mut closed = Shape::new();
        closed.fill(&path, 0, true, 0.1);
        assert_eq!(closed.edge_count(), 3);
        assert_abs_diff_eq!(closed.area(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn fill_records_back_data_when_enabled() {
        let mut path = parse_path_data("M0,0 L1,0 L1,1 Z").unwrap();
        path.set_back_data(true);
        let mut shape = Shape::new();
        shape.fill(&path, 7, true, 0.1);
        assert_eq!(shape.edge_count(), 3);
        for (_, edge) in shape.edges() {
            let back = edge.back_for(7).unwrap();
            assert_abs_diff_eq!(back.t_end, 1.0);
        }
    }

    #[test]
    fn fill_accumulates_operands() {
        let a = parse_path_data("M0,0 L1,0 L1,1 Z").unwrap();
        let b = parse_path_data("M5,5 L6,5 L6,6 Z").unwrap();
        let mut shape = Shape::new();
        shape.fill(&a, 0, true, 0.1);
        shape.fill(&b, 1, true, 0.1);
        assert_eq!(shape.edge_count(), 6);
    }
}
