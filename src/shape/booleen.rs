use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::geometry::CutPosition;
use crate::operations::boolean::BoolOp;

use super::planarize::{planarize, RawSegment};
use super::winding::compute_windings;
use super::{EdgeId, EdgeWinding, PointId, Shape, ShapeParams};

/// Edges meeting at a point, by origin.
#[derive(Default)]
struct Incidence {
    degree: usize,
    target: bool,
    cutter: bool,
}

impl Shape {
    /// Combines two shapes.
    ///
    /// For set operations both shapes must have been uncrossed with
    /// [`Shape::convert_to_shape`]; the result keeps the edges separating
    /// regions the operation keeps from regions it drops. Cut and slice
    /// treat `b` as a cutting curve; slice reads cut positions from edges
    /// carrying back data for `target_path_id`.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::MissingWinding` if an area operand was not
    /// uncrossed.
    pub fn booleen(
        a: &Shape,
        b: &Shape,
        op: BoolOp,
        target_path_id: usize,
        params: &ShapeParams,
    ) -> Result<Shape> {
        match op {
            BoolOp::Cut => Self::cut(a, b, params),
            BoolOp::Slice => Ok(Self::slice(a, b, target_path_id, params)?.0),
            _ => Self::set_operation(a, b, op, params),
        }
    }

    fn set_operation(a: &Shape, b: &Shape, op: BoolOp, params: &ShapeParams) -> Result<Shape> {
        a.require_winding()?;
        b.require_winding()?;
        let mut segments = a.segments();
        for seg in &mut segments {
            seg.weights = [seg.weights[0], 0];
        }
        segments.extend(b.segments().into_iter().map(|seg| RawSegment {
            weights: [0, seg.weights[0]],
            ..seg
        }));
        let planar = planarize(segments, params.epsilon);

        let mut out = Shape::new();
        let mut ids: HashMap<PointId, PointId> = HashMap::new();
        for (id, w) in compute_windings(&planar) {
            let left = op.keeps(w.left[0] > 0, w.left[1] > 0);
            let right = op.keeps(w.right[0] > 0, w.right[1] > 0);
            if left == right {
                continue;
            }
            out.push_oriented(&planar, &mut ids, planar.edge(id)?, w, !left)?;
        }
        debug!(op = op.label(), edges = out.edge_count(), "boolean combination");
        Ok(out)
    }

    /// Splits the filled area of `a` along the curves of `b`.
    ///
    /// Cutter edges inside `a` are added in both directions so each piece
    /// traces as its own loop. Cutter edges leading to a dead end inside the
    /// area are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::MissingWinding` if `a` was not uncrossed.
    pub fn cut(a: &Shape, b: &Shape, params: &ShapeParams) -> Result<Shape> {
        a.require_winding()?;
        let mut segments = a.segments();
        for seg in &mut segments {
            seg.weights = [seg.weights[0], 0];
        }
        segments.extend(b.segments().into_iter().map(|seg| RawSegment {
            weights: [0, 0],
            keep: true,
            ..seg
        }));
        let planar = planarize(segments, params.epsilon);

        let mut boundary = Vec::new();
        let mut inside = Vec::new();
        for (id, w) in compute_windings(&planar) {
            let edge = planar.edge(id)?;
            let left = w.left[0] > 0;
            let right = w.right[0] > 0;
            if left != right {
                boundary.push((id, w, !left));
            } else if edge.keep && left {
                inside.push((id, w));
            }
        }
        let inside = without_dead_ends(&planar, &boundary, inside)?;

        let mut out = Shape::new();
        let mut ids: HashMap<PointId, PointId> = HashMap::new();
        for (id, w, reverse) in boundary {
            out.push_oriented(&planar, &mut ids, planar.edge(id)?, w, reverse)?;
        }
        for &(id, w) in &inside {
            let edge = planar.edge(id)?;
            out.push_oriented(&planar, &mut ids, edge, w, false)?;
            out.push_oriented(&planar, &mut ids, edge, w, true)?;
        }
        debug!(edges = out.edge_count(), cutter_edges = inside.len(), "cut shape");
        Ok(out)
    }

    /// Finds where the curves of `b` cross the curves of `a`.
    ///
    /// Both shapes are taken as plain curves. Returns the uncrossed curves of
    /// `a` with the cutter removed, and the positions on the operand path
    /// `target_path_id` where its outline meets the cutter at a vertex of
    /// degree three or more.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph references missing points.
    pub fn slice(
        a: &Shape,
        b: &Shape,
        target_path_id: usize,
        params: &ShapeParams,
    ) -> Result<(Shape, Vec<CutPosition>)> {
        let segments = a
            .segments()
            .into_iter()
            .chain(b.segments())
            .map(|seg| RawSegment {
                weights: [0, 0],
                keep: true,
                ..seg
            })
            .collect();
        let planar = planarize(segments, params.epsilon);

        let mut incidence: HashMap<PointId, Incidence> = HashMap::new();
        for (_, edge) in planar.edges() {
            let on_target = edge.back_for(target_path_id).is_some();
            for p in [edge.start, edge.end] {
                let entry = incidence.entry(p).or_default();
                entry.degree += 1;
                entry.target |= on_target;
                entry.cutter |= !on_target;
            }
        }
        let is_crossing =
            |p: PointId| incidence.get(&p).is_some_and(|i| i.degree > 2 && i.target && i.cutter);

        let mut positions = Vec::new();
        let mut out = Shape::new();
        let mut ids: HashMap<PointId, PointId> = HashMap::new();
        for (_, edge) in planar.edges() {
            let Some(back) = edge.back_for(target_path_id) else {
                continue;
            };
            if is_crossing(edge.start) {
                positions.push(CutPosition {
                    piece: back.piece,
                    t: back.t_start,
                });
            }
            if is_crossing(edge.end) {
                positions.push(CutPosition {
                    piece: back.piece,
                    t: back.t_end,
                });
            }
            let mut copy = edge.clone();
            let mut map = |src: PointId| -> Result<PointId> {
                if let Some(mapped) = ids.get(&src) {
                    return Ok(*mapped);
                }
                let mapped = out.add_point(planar.point(src)?.position);
                ids.insert(src, mapped);
                Ok(mapped)
            };
            copy.start = map(edge.start)?;
            copy.end = map(edge.end)?;
            copy.keep = false;
            out.add_edge(copy);
        }
        debug!(
            edges = out.edge_count(),
            positions = positions.len(),
            "sliced shape"
        );
        Ok((out, positions))
    }
}

/// Removes the `inside` edges that end at a point no other edge reaches,
/// repeating until none is left.
fn without_dead_ends(
    planar: &Shape,
    boundary: &[(EdgeId, EdgeWinding, bool)],
    inside: Vec<(EdgeId, EdgeWinding)>,
) -> Result<Vec<(EdgeId, EdgeWinding)>> {
    let mut degree: HashMap<PointId, usize> = HashMap::new();
    let mut incident: HashMap<PointId, Vec<usize>> = HashMap::new();
    for &(id, _, _) in boundary {
        let edge = planar.edge(id)?;
        for p in [edge.start, edge.end] {
            *degree.entry(p).or_default() += 1;
        }
    }
    let mut ends = Vec::with_capacity(inside.len());
    for (i, &(id, _)) in inside.iter().enumerate() {
        let edge = planar.edge(id)?;
        for p in [edge.start, edge.end] {
            *degree.entry(p).or_default() += 1;
            incident.entry(p).or_default().push(i);
        }
        ends.push([edge.start, edge.end]);
    }

    let mut removed = vec![false; inside.len()];
    let mut stack: Vec<PointId> = degree
        .iter()
        .filter(|&(_, &d)| d == 1)
        .map(|(&p, _)| p)
        .collect();
    while let Some(p) = stack.pop() {
        let Some(edges) = incident.get(&p) else {
            continue;
        };
        for &i in edges {
            if removed[i] {
                continue;
            }
            removed[i] = true;
            for q in ends[i] {
                if let Some(d) = degree.get_mut(&q) {
                    *d -= 1;
                    if *d == 1 {
                        stack.push(q);
                    }
                }
            }
        }
    }
    Ok(inside
        .into_iter()
        .zip(removed)
        .filter_map(|(edge, gone)| (!gone).then_some(edge))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::svg_data::parse_path_data;
    use crate::shape::FillRule;
    use approx::assert_abs_diff_eq;

    fn uncrossed(d: &str, path_id: usize) -> Shape {
        let mut path = parse_path_data(d).unwrap();
        path.set_back_data(true);
        let mut shape = Shape::new();
        shape.fill(&path, path_id, true, 0.01);
        shape
            .convert_to_shape(FillRule::NonZero, &ShapeParams::default())
            .unwrap()
    }

    fn curves(d: &str, path_id: usize) -> Shape {
        let mut path = parse_path_data(d).unwrap();
        path.set_back_data(true);
        let mut shape = Shape::new();
        shape.fill(&path, path_id, false, 0.01);
        shape
            .convert_to_shape(FillRule::JustDont, &ShapeParams::default())
            .unwrap()
    }

    const A: &str = "M0,0 L1,0 L1,1 L0,1 Z";
    const B: &str = "M0.5,0.5 L1.5,0.5 L1.5,1.5 L0.5,1.5 Z";

    fn area_of(op: BoolOp) -> f64 {
        let params = ShapeParams::default();
        Shape::booleen(&uncrossed(A, 0), &uncrossed(B, 1), op, 0, &params)
            .unwrap()
            .area()
    }

    #[test]
    fn set_operations_on_overlapping_squares() {
        assert_abs_diff_eq!(area_of(BoolOp::Union), 1.75, epsilon = 1e-9);
        assert_abs_diff_eq!(area_of(BoolOp::Intersection), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(area_of(BoolOp::Difference), 0.75, epsilon = 1e-9);
        assert_abs_diff_eq!(area_of(BoolOp::SymmetricDifference), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn set_operations_need_windings() {
        let raw = curves(A, 0);
        let result = Shape::booleen(&raw, &uncrossed(B, 1), BoolOp::Union, 0, &ShapeParams::default());
        assert!(result.is_err());
    }

    #[test]
    fn cut_keeps_area_and_adds_cutter_twice() {
        let square = uncrossed("M0,0 L2,0 L2,2 L0,2 Z", 0);
        let diagonal = curves("M-1,-1 L3,3", 1);
        let cut = Shape::cut(&square, &diagonal, &ShapeParams::default()).unwrap();
        // Four sides plus the diagonal in both directions.
        assert_eq!(cut.edge_count(), 6);
        assert_abs_diff_eq!(cut.area(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn cut_drops_cutter_ending_inside() {
        crate::test_log::init();
        let square = uncrossed("M0,0 L4,0 L4,4 L0,4 Z", 0);
        let stub = curves("M2,-1 L2,1 L2,2", 1);
        let cut = Shape::cut(&square, &stub, &ShapeParams::default()).unwrap();
        // The bottom side split where the stub enters, and nothing else.
        assert_eq!(cut.edge_count(), 5);
        assert_abs_diff_eq!(cut.area(), 16.0, epsilon = 1e-9);

        let through = curves("M2,-1 L2,5", 1);
        let halves = Shape::cut(&square, &through, &ShapeParams::default()).unwrap();
        assert_eq!(halves.edge_count(), 8);
        assert_abs_diff_eq!(halves.area(), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn slice_reports_crossings_on_the_target() {
        let square = curves("M0,0 L2,0 L2,2 L0,2 Z", 0);
        let line = curves("M1,-1 L1,3", 1);
        let (shape, positions) = Shape::slice(&square, &line, 0, &ShapeParams::default()).unwrap();
        assert!(shape.edges().all(|(_, e)| e.back_for(0).is_some()));
        let mut pieces: Vec<usize> = positions.iter().map(|p| p.piece).collect();
        pieces.sort_unstable();
        pieces.dedup();
        assert_eq!(pieces, vec![1, 3]);
        for p in &positions {
            assert_abs_diff_eq!(p.t, 0.5, epsilon = 1e-9);
        }
    }
}
