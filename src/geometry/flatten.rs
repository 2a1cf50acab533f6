use crate::math::Point2;

use super::path::{Path, Segment};

/// A flattened vertex with its origin on the source path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatPoint {
    pub point: Point2,
    /// Command index of the piece this vertex ends (or starts, for the first
    /// vertex of a subpath).
    pub piece: usize,
    /// Curve parameter of the vertex on that piece.
    pub t: f64,
}

/// A flattened subpath.
///
/// For closed subpaths the last vertex coincides with the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<FlatPoint>,
    pub closed: bool,
}

/// Origin of a polyline edge on the source path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeOrigin {
    pub piece: usize,
    pub t_start: f64,
    pub t_end: f64,
}

impl Polyline {
    /// Source positions of the edge from vertex `i` to vertex `i + 1`.
    #[must_use]
    pub fn edge_origin(&self, i: usize) -> EdgeOrigin {
        let a = &self.points[i];
        let b = &self.points[i + 1];
        EdgeOrigin {
            piece: b.piece,
            t_start: if a.piece == b.piece { a.t } else { 0.0 },
            t_end: b.t,
        }
    }

    #[must_use]
    pub fn vertices(&self) -> Vec<Point2> {
        self.points.iter().map(|p| p.point).collect()
    }
}

/// Flattens every subpath into a polyline, recording for each vertex the
/// piece and parameter it came from.
#[must_use]
pub fn convert_with_back_data(path: &Path, tolerance: f64) -> Vec<Polyline> {
    path.subpaths()
        .into_iter()
        .filter(|sub| !sub.pieces.is_empty())
        .map(|sub| {
            let mut points = vec![FlatPoint {
                point: sub.start,
                piece: sub.pieces[0].piece,
                t: 0.0,
            }];
            for piece in &sub.pieces {
                match piece.segment {
                    Segment::Line { to, .. } => points.push(FlatPoint {
                        point: to,
                        piece: piece.piece,
                        t: 1.0,
                    }),
                    Segment::Cubic(c) => {
                        points.extend(c.flatten(tolerance).into_iter().map(|(t, point)| {
                            FlatPoint {
                                point,
                                piece: piece.piece,
                                t,
                            }
                        }));
                    }
                }
            }
            Polyline {
                points,
                closed: sub.closed,
            }
        })
        .collect()
}

/// Rebuilds a path as straight segments no longer than `step`.
///
/// Curves are flattened first, then every resulting segment is split evenly.
#[must_use]
pub fn convert_even_lines(path: &Path, step: f64) -> Path {
    let step = step.max(f64::EPSILON);
    let mut out = Path::new();
    for polyline in convert_with_back_data(path, step * 0.25) {
        let mut prev = polyline.points[0].point;
        out.move_to(prev);
        for fp in &polyline.points[1..] {
            let len = (fp.point - prev).norm();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let parts = ((len / step).ceil() as usize).max(1);
            for k in 1..=parts {
                #[allow(clippy::cast_precision_loss)]
                let s = k as f64 / parts as f64;
                out.line_to(prev + (fp.point - prev) * s);
            }
            prev = fp.point;
        }
        if polyline.closed {
            out.close();
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::svg_data::parse_path_data;
    use approx::assert_abs_diff_eq;

    #[test]
    fn lines_keep_their_pieces() {
        let path = parse_path_data("M0,0 L1,0 L1,1 Z").unwrap();
        let lines = convert_with_back_data(&path, 0.1);
        assert_eq!(lines.len(), 1);
        let poly = &lines[0];
        assert!(poly.closed);
        assert_eq!(poly.points.len(), 4);
        assert_eq!(poly.edge_origin(0).piece, 1);
        assert_eq!(poly.edge_origin(2).piece, 3);
        assert_abs_diff_eq!(poly.points[3].point.x, 0.0);
    }

    #[test]
    fn curve_edges_carry_contiguous_parameters() {
        let path = parse_path_data("M0,0 C0,1 1,1 1,0").unwrap();
        let lines = convert_with_back_data(&path, 0.01);
        let poly = &lines[0];
        assert!(poly.points.len() > 3);
        let mut t = 0.0;
        for i in 0..poly.points.len() - 1 {
            let origin = poly.edge_origin(i);
            assert_eq!(origin.piece, 1);
            assert_abs_diff_eq!(origin.t_start, t);
            assert!(origin.t_end > origin.t_start);
            t = origin.t_end;
        }
        assert_abs_diff_eq!(t, 1.0);
    }

    #[test]
    fn even_lines_respect_step() {
        let path = parse_path_data("M0,0 L10,0").unwrap();
        let even = convert_even_lines(&path, 3.0);
        // ceil(10 / 3) = 4 segments.
        assert_eq!(even.len(), 5);
        assert_abs_diff_eq!(even.length(0.1), 10.0, epsilon = 1e-12);
    }
}
