use std::collections::{HashMap, HashSet};
use std::f64::consts::TAU;

use tracing::debug;

use crate::error::Result;
use crate::geometry::{Nesting, Path, Segment};
use crate::math::polygon_2d::{point_on_polygon_boundary, signed_area_2d, winding_number_2d};
use crate::math::{cross, Point2, TOLERANCE};

use super::{BackData, EdgeId, PointId, Shape};

/// Parameter gap tolerated between consecutive edges of one curve run.
const RUN_GAP: f64 = 1e-9;

/// A chain of edges found by walking the graph.
#[derive(Debug, Clone)]
pub(crate) struct TracedLoop {
    pub edges: Vec<EdgeId>,
    pub closed: bool,
}

/// Geometry of a traced edge plus the origin used for curve rebuilding.
#[derive(Debug, Clone, Copy)]
struct TracedEdge {
    start: Point2,
    end: Point2,
    back: Option<BackData>,
}

type PieceTable = HashMap<(usize, usize), Segment>;

impl Shape {
    /// Walks the edges into loops.
    ///
    /// At every point the walk continues with the unused outgoing edge
    /// making the sharpest left turn, so each loop bounds a single face.
    pub(crate) fn trace_loops(&self) -> Result<Vec<TracedLoop>> {
        let mut outgoing: HashMap<PointId, Vec<EdgeId>> = HashMap::new();
        for (id, edge) in self.edges() {
            outgoing.entry(edge.start).or_default().push(id);
        }

        let mut used: HashSet<EdgeId> = HashSet::new();
        let mut loops = Vec::new();
        for (first, first_edge) in self.edges() {
            if used.contains(&first) {
                continue;
            }
            let origin = first_edge.start;
            let mut edges = Vec::new();
            let mut current = first;
            let closed = loop {
                used.insert(current);
                edges.push(current);
                let edge = self.edge(current)?;
                if edge.end == origin {
                    break true;
                }
                let (a, b) = self.edge_points(current)?;
                let back_dir = a - b;
                let mut best: Option<(f64, EdgeId)> = None;
                for &candidate in outgoing.get(&edge.end).into_iter().flatten() {
                    if used.contains(&candidate) {
                        continue;
                    }
                    let (_, c) = self.edge_points(candidate)?;
                    let out_dir = c - b;
                    let ccw = cross(&back_dir, &out_dir).atan2(back_dir.dot(&out_dir));
                    let mut cw = (-ccw).rem_euclid(TAU);
                    if cw <= TOLERANCE {
                        cw = TAU;
                    }
                    if best.is_none_or(|(angle, _)| cw < angle) {
                        best = Some((cw, candidate));
                    }
                }
                match best {
                    Some((_, next)) => current = next,
                    None => break false,
                }
            };
            loops.push(TracedLoop { edges, closed });
        }
        Ok(loops)
    }

    /// Traces the shape into a path, one subpath per loop.
    ///
    /// `operands` are the source paths indexed by back-data path id. Runs of
    /// edges covering a contiguous stretch of one cubic piece are emitted as
    /// the matching part of that cubic; everything else becomes lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph references missing entities.
    pub fn convert_to_forme(&self, operands: &[&Path]) -> Result<Path> {
        let table = piece_table(operands);
        let mut path = Path::new();
        for traced in self.trace_loops()? {
            self.emit_loop(&mut path, &traced, &table)?;
        }
        debug!(commands = path.len(), "traced shape into path");
        Ok(path)
    }

    /// Like [`Shape::convert_to_forme`], also reporting which subpaths are
    /// holes of which outer contours.
    ///
    /// Loops with positive area are outer contours. Each hole is assigned to
    /// the smallest outer contour containing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph references missing entities.
    pub fn convert_to_forme_nested(&self, operands: &[&Path]) -> Result<(Path, Nesting)> {
        let table = piece_table(operands);
        let loops = self.trace_loops()?;
        let mut path = Path::new();
        let mut polygons = Vec::with_capacity(loops.len());
        for traced in &loops {
            self.emit_loop(&mut path, traced, &table)?;
            let polygon = traced
                .edges
                .iter()
                .map(|&id| self.edge_points(id).map(|(a, _)| a))
                .collect::<Result<Vec<_>>>()?;
            polygons.push((signed_area_2d(&polygon), traced.closed, polygon));
        }

        let mut parent = vec![None; loops.len()];
        for (i, (area, closed, polygon)) in polygons.iter().enumerate() {
            if *area >= 0.0 || !*closed {
                continue;
            }
            let mut best: Option<(f64, usize)> = None;
            for (j, (outer_area, outer_closed, outer)) in polygons.iter().enumerate() {
                if *outer_area <= 0.0 || !*outer_closed || *outer_area < area.abs() {
                    continue;
                }
                let probe = polygon
                    .iter()
                    .copied()
                    .find(|p| !point_on_polygon_boundary(outer, p, TOLERANCE.sqrt()))
                    .unwrap_or_else(|| midpoint(polygon));
                if winding_number_2d(outer, &probe) == 0 {
                    continue;
                }
                if best.is_none_or(|(best_area, _)| *outer_area < best_area) {
                    best = Some((*outer_area, j));
                }
            }
            parent[i] = best.map(|(_, j)| j);
        }
        Ok((path, Nesting { parent }))
    }

    fn emit_loop(&self, path: &mut Path, traced: &TracedLoop, table: &PieceTable) -> Result<()> {
        let info = traced
            .edges
            .iter()
            .map(|&id| {
                let (start, end) = self.edge_points(id)?;
                let back = self
                    .edge(id)?
                    .back
                    .iter()
                    .find(|b| table.contains_key(&(b.path_id, b.piece)))
                    .copied();
                Ok(TracedEdge { start, end, back })
            })
            .collect::<Result<Vec<_>>>()?;
        let n = info.len();
        if n == 0 {
            return Ok(());
        }

        let first = if traced.closed {
            (0..n)
                .find(|&i| !continues(&info[(i + n - 1) % n], &info[i]))
                .unwrap_or(0)
        } else {
            0
        };

        path.move_to(info[first].start);
        let mut k = 0;
        while k < n {
            let run_start = info[(first + k) % n];
            let mut run_end = run_start;
            let mut len = 1;
            while k + len < n && continues(&run_end, &info[(first + k + len) % n]) {
                run_end = info[(first + k + len) % n];
                len += 1;
            }
            let segment = run_start
                .back
                .and_then(|b| table.get(&(b.path_id, b.piece)).map(|s| (b, s)));
            match (segment, run_end.back) {
                (Some((b0, Segment::Cubic(c))), Some(b1)) if (b1.t_end - b0.t_start).abs() > RUN_GAP => {
                    let mut sub = c.subsegment(b0.t_start, b1.t_end);
                    let d0 = run_start.start - sub.p0;
                    let d3 = run_end.end - sub.p3;
                    sub.p0 = run_start.start;
                    sub.p1 += d0;
                    sub.p2 += d3;
                    sub.p3 = run_end.end;
                    let (start_tangent, end_tangent) = sub.tangents();
                    path.cubic_to(sub.p3, start_tangent, end_tangent);
                }
                (Some((_, Segment::Line { .. })), _) => path.line_to(run_end.end),
                _ => {
                    for i in 0..len {
                        path.line_to(info[(first + k + i) % n].end);
                    }
                }
            }
            k += len;
        }
        if traced.closed {
            path.close();
        }
        Ok(())
    }
}

fn piece_table(operands: &[&Path]) -> PieceTable {
    let mut table = HashMap::new();
    for (path_id, path) in operands.iter().enumerate() {
        for sub in path.subpaths() {
            for piece in sub.pieces {
                table.insert((path_id, piece.piece), piece.segment);
            }
        }
    }
    table
}

fn continues(prev: &TracedEdge, next: &TracedEdge) -> bool {
    match (prev.back, next.back) {
        (Some(a), Some(b)) => {
            a.path_id == b.path_id
                && a.piece == b.piece
                && (a.t_end - b.t_start).abs() < RUN_GAP
                && (a.t_end - a.t_start) * (b.t_end - b.t_start) > 0.0
        }
        _ => false,
    }
}

fn midpoint(polygon: &[Point2]) -> Point2 {
    match polygon {
        [a, b, ..] => Point2::new(0.5 * (a.x + b.x), 0.5 * (a.y + b.y)),
        [a] => *a,
        [] => Point2::origin(),
    }
}
