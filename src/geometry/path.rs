use crate::math::bezier::CubicBez;
use crate::math::intersect_2d::{segment_segment_intersect_2d, SegmentIntersection};
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{Point2, Transform2, Vector2, TOLERANCE};

use super::path_builder::PathInstruction;

/// Parameters closer than this to a piece boundary snap onto it.
const POSITION_SNAP: f64 = 1e-6;

/// Subdivision rounds when intersecting two segments.
const MAX_INTERSECTION_DEPTH: usize = 48;

/// A single drawing command.
///
/// Cubic segments store their end tangents (three times the handle vectors)
/// rather than control points, which is the form flattening works with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point2),
    LineTo(Point2),
    CubicTo {
        end: Point2,
        start_tangent: Vector2,
        end_tangent: Vector2,
    },
    Close,
}

/// Geometry of one drawable piece of a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line { from: Point2, to: Point2 },
    Cubic(CubicBez),
}

impl Segment {
    #[must_use]
    pub fn start(&self) -> Point2 {
        match self {
            Self::Line { from, .. } => *from,
            Self::Cubic(c) => c.p0,
        }
    }

    #[must_use]
    pub fn end(&self) -> Point2 {
        match self {
            Self::Line { to, .. } => *to,
            Self::Cubic(c) => c.p3,
        }
    }

    /// Point at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        match self {
            Self::Line { from, to } => from + (to - from) * t,
            Self::Cubic(c) => c.eval(t),
        }
    }

    /// The part of this segment between parameters `t0` and `t1`.
    #[must_use]
    pub fn portion(&self, t0: f64, t1: f64) -> Self {
        match self {
            Self::Line { .. } => Self::Line {
                from: self.point_at(t0),
                to: self.point_at(t1),
            },
            Self::Cubic(c) => Self::Cubic(c.subsegment(t0, t1)),
        }
    }

    /// The command that draws this segment from its start point.
    #[must_use]
    pub fn to_command(&self) -> PathCommand {
        match self {
            Self::Line { to, .. } => PathCommand::LineTo(*to),
            Self::Cubic(c) => {
                let (start_tangent, end_tangent) = c.tangents();
                PathCommand::CubicTo {
                    end: c.p3,
                    start_tangent,
                    end_tangent,
                }
            }
        }
    }

    /// Approximate length.
    #[must_use]
    pub fn length(&self, tolerance: f64) -> f64 {
        match self {
            Self::Line { from, to } => (to - from).norm(),
            Self::Cubic(c) => c.arc_length(tolerance),
        }
    }

    /// Largest distance of the control points from the chord.
    fn flatness(&self) -> f64 {
        match self {
            Self::Line { .. } => 0.0,
            Self::Cubic(c) => c.flatness(),
        }
    }

    /// Bounding box of the control points, which contains the segment.
    fn control_bounds(&self) -> (Point2, Point2) {
        let points = match self {
            Self::Line { from, to } => vec![*from, *to],
            Self::Cubic(c) => vec![c.p0, c.p1, c.p2, c.p3],
        };
        points.iter().skip(1).fold((points[0], points[0]), |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        })
    }

    /// Parameters `(t, u)` where this segment meets `other`, found by
    /// subdividing both until they are flat within `tolerance`.
    ///
    /// Collinear overlaps are not reported.
    #[must_use]
    pub fn intersections(&self, other: &Segment, tolerance: f64) -> Vec<(f64, f64)> {
        let tolerance = tolerance.max(TOLERANCE);
        let mut found: Vec<(f64, f64, Point2)> = Vec::new();
        let mut work = vec![((0.0, 1.0), (0.0, 1.0))];
        for _ in 0..MAX_INTERSECTION_DEPTH {
            if work.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for ((t0, t1), (u0, u1)) in work {
                let a = self.portion(t0, t1);
                let b = other.portion(u0, u1);
                let (a_lo, a_hi) = a.control_bounds();
                let (b_lo, b_hi) = b.control_bounds();
                if a_lo.x > b_hi.x + tolerance
                    || b_lo.x > a_hi.x + tolerance
                    || a_lo.y > b_hi.y + tolerance
                    || b_lo.y > a_hi.y + tolerance
                {
                    continue;
                }
                let a_flat = a.flatness() <= tolerance;
                let b_flat = b.flatness() <= tolerance;
                if a_flat && b_flat {
                    let crossing =
                        segment_segment_intersect_2d(&a.start(), &a.end(), &b.start(), &b.end(), tolerance);
                    if let SegmentIntersection::Point { point, t, u } = crossing {
                        if !found.iter().any(|(_, _, q)| (q - point).norm() <= 2.0 * tolerance) {
                            found.push((t0 + (t1 - t0) * t, u0 + (u1 - u0) * u, point));
                        }
                    }
                    continue;
                }
                let t_mid = 0.5 * (t0 + t1);
                let u_mid = 0.5 * (u0 + u1);
                let ts = if a_flat {
                    vec![(t0, t1)]
                } else {
                    vec![(t0, t_mid), (t_mid, t1)]
                };
                let us = if b_flat {
                    vec![(u0, u1)]
                } else {
                    vec![(u0, u_mid), (u_mid, u1)]
                };
                for &t in &ts {
                    for &u in &us {
                        next.push((t, u));
                    }
                }
            }
            work = next;
        }
        found.into_iter().map(|(t, u, _)| (t, u)).collect()
    }
}

/// A drawable piece together with the index of the command that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPiece {
    pub piece: usize,
    pub segment: Segment,
}

/// One subpath: a start point and its pieces.
///
/// For closed subpaths whose last point differs from the start, the closing
/// line is included as a piece indexed by the `Close` command.
#[derive(Debug, Clone, PartialEq)]
pub struct Subpath {
    pub start: Point2,
    pub pieces: Vec<PathPiece>,
    pub closed: bool,
}

impl Subpath {
    /// Vertices of the pieces' endpoints (curves are not sampled).
    #[must_use]
    pub fn end_points(&self) -> Vec<Point2> {
        std::iter::once(self.start)
            .chain(self.pieces.iter().map(|p| p.segment.end()))
            .collect()
    }
}

/// A position on a path: command index and curve parameter in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutPosition {
    pub piece: usize,
    pub t: f64,
}

/// Containment relation between the subpaths of a traced path.
///
/// `parent[i]` is the index of the outer contour that subpath `i` is a hole
/// of, or `None` when subpath `i` is itself an outer contour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nesting {
    pub parent: Vec<Option<usize>>,
}

/// An ordered sequence of drawing commands describing one or more subpaths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
    back_data: bool,
}

impl Path {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a path from raw commands.
    #[must_use]
    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        Self {
            commands,
            back_data: false,
        }
    }

    /// Enables or disables back data on shapes filled from this path.
    pub fn set_back_data(&mut self, enabled: bool) {
        self.back_data = enabled;
    }

    #[must_use]
    pub fn has_back_data(&self) -> bool {
        self.back_data
    }

    #[must_use]
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// A path with a single command (presumably a moveto) draws nothing.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.commands.len() > 1
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }

    pub fn move_to(&mut self, point: Point2) {
        self.commands.push(PathCommand::MoveTo(point));
    }

    pub fn line_to(&mut self, point: Point2) {
        self.commands.push(PathCommand::LineTo(point));
    }

    pub fn cubic_to(&mut self, end: Point2, start_tangent: Vector2, end_tangent: Vector2) {
        self.commands.push(PathCommand::CubicTo {
            end,
            start_tangent,
            end_tangent,
        });
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    /// Appends all commands of `other`.
    pub fn append(&mut self, other: &Path) {
        self.commands.extend_from_slice(&other.commands);
    }

    /// Returns a copy with every point and tangent mapped through `transform`.
    #[must_use]
    pub fn transformed(&self, transform: &Transform2) -> Self {
        let commands = self
            .commands
            .iter()
            .map(|cmd| match *cmd {
                PathCommand::MoveTo(p) => PathCommand::MoveTo(transform.transform_point(&p)),
                PathCommand::LineTo(p) => PathCommand::LineTo(transform.transform_point(&p)),
                PathCommand::CubicTo {
                    end,
                    start_tangent,
                    end_tangent,
                } => PathCommand::CubicTo {
                    end: transform.transform_point(&end),
                    start_tangent: transform.transform_vector(&start_tangent),
                    end_tangent: transform.transform_vector(&end_tangent),
                },
                PathCommand::Close => PathCommand::Close,
            })
            .collect();
        Self {
            commands,
            back_data: self.back_data,
        }
    }

    /// Splits the command stream into subpaths with resolved geometry.
    ///
    /// Drawing commands before any moveto start at the origin. Subpaths
    /// without pieces are kept so indices line up with moveto commands.
    #[must_use]
    pub fn subpaths(&self) -> Vec<Subpath> {
        let mut result: Vec<Subpath> = Vec::new();
        let mut current: Option<Subpath> = None;
        let mut pen = Point2::origin();

        for (index, cmd) in self.commands.iter().enumerate() {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    if let Some(done) = current.take() {
                        result.push(done);
                    }
                    current = Some(Subpath {
                        start: p,
                        pieces: Vec::new(),
                        closed: false,
                    });
                    pen = p;
                }
                PathCommand::LineTo(p) => {
                    let sub = current.get_or_insert_with(|| open_subpath(pen));
                    sub.pieces.push(PathPiece {
                        piece: index,
                        segment: Segment::Line { from: pen, to: p },
                    });
                    pen = p;
                }
                PathCommand::CubicTo {
                    end,
                    start_tangent,
                    end_tangent,
                } => {
                    let sub = current.get_or_insert_with(|| open_subpath(pen));
                    sub.pieces.push(PathPiece {
                        piece: index,
                        segment: Segment::Cubic(CubicBez::from_tangents(
                            pen,
                            start_tangent,
                            end_tangent,
                            end,
                        )),
                    });
                    pen = end;
                }
                PathCommand::Close => {
                    if let Some(mut sub) = current.take() {
                        if (pen - sub.start).norm() > TOLERANCE {
                            sub.pieces.push(PathPiece {
                                piece: index,
                                segment: Segment::Line {
                                    from: pen,
                                    to: sub.start,
                                },
                            });
                        }
                        sub.closed = true;
                        pen = sub.start;
                        result.push(sub);
                    }
                }
            }
        }
        if let Some(done) = current {
            result.push(done);
        }
        result
    }

    /// Converts the path back into builder instructions.
    #[must_use]
    pub fn to_instructions(&self) -> Vec<PathInstruction> {
        let mut out = Vec::new();
        for sub in self.subpaths() {
            out.push(PathInstruction::MoveTo {
                point: sub.start,
                closed: sub.closed,
            });
            for piece in &sub.pieces {
                match piece.segment {
                    Segment::Line { to, .. } => out.push(PathInstruction::LineTo(to)),
                    Segment::Cubic(c) => out.push(PathInstruction::CurveTo {
                        c1: c.p1,
                        c2: c.p2,
                        end: c.p3,
                    }),
                }
            }
        }
        out
    }

    /// Restarts a subpath at each of the given positions.
    ///
    /// Pieces are split at the positions; closed subpaths containing a cut
    /// are opened there so every fragment becomes its own open subpath.
    #[must_use]
    pub fn convert_positions_to_move_to(&self, positions: &[CutPosition]) -> Self {
        let mut out = Self::new();
        for sub in self.subpaths() {
            if sub.pieces.is_empty() {
                continue;
            }
            let breaks = normalized_breaks(&sub, positions);
            emit_with_breaks(&mut out, &sub, &breaks);
        }
        out
    }

    /// Splits the path into one path per subpath.
    #[must_use]
    pub fn sub_paths(&self) -> Vec<Path> {
        self.split_subpath_commands()
            .into_iter()
            .filter(|cmds| cmds.len() > 1)
            .map(Path::from_commands)
            .collect()
    }

    /// Splits the path into one path per outer contour, each carrying its holes.
    ///
    /// Subpath indices in `nesting` follow the order of moveto commands.
    #[must_use]
    pub fn sub_paths_with_nesting(&self, nesting: &Nesting) -> Vec<Path> {
        let chunks = self.split_subpath_commands();
        let mut result = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if nesting.parent.get(i).copied().flatten().is_some() {
                continue;
            }
            let mut commands = chunk.clone();
            for (j, hole) in chunks.iter().enumerate() {
                if nesting.parent.get(j).copied().flatten() == Some(i) {
                    commands.extend_from_slice(hole);
                }
            }
            if commands.len() > 1 {
                result.push(Path::from_commands(commands));
            }
        }
        result
    }

    fn split_subpath_commands(&self) -> Vec<Vec<PathCommand>> {
        let mut chunks: Vec<Vec<PathCommand>> = Vec::new();
        for cmd in &self.commands {
            match cmd {
                PathCommand::MoveTo(_) => chunks.push(vec![*cmd]),
                _ => match chunks.last_mut() {
                    Some(chunk) => chunk.push(*cmd),
                    None => chunks.push(vec![PathCommand::MoveTo(Point2::origin()), *cmd]),
                },
            }
        }
        chunks
    }

    /// Sum of the signed areas of all subpaths, each treated as closed.
    #[must_use]
    pub fn area(&self, tolerance: f64) -> f64 {
        self.subpaths()
            .iter()
            .map(|sub| signed_area_2d(&sample_subpath(sub, tolerance)))
            .sum()
    }

    /// Total drawn length.
    #[must_use]
    pub fn length(&self, tolerance: f64) -> f64 {
        self.subpaths()
            .iter()
            .flat_map(|s| s.pieces.iter())
            .map(|p| p.segment.length(tolerance))
            .sum()
    }

    /// Axis-aligned bounds of the flattened path.
    #[must_use]
    pub fn bounds(&self, tolerance: f64) -> Option<(Point2, Point2)> {
        let mut points = self
            .subpaths()
            .iter()
            .flat_map(|s| sample_subpath(s, tolerance))
            .collect::<Vec<_>>()
            .into_iter();
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }
}

fn open_subpath(start: Point2) -> Subpath {
    Subpath {
        start,
        pieces: Vec::new(),
        closed: false,
    }
}

/// Samples a subpath into a polygon (start point plus flattened pieces).
pub(crate) fn sample_subpath(sub: &Subpath, tolerance: f64) -> Vec<Point2> {
    let mut pts = vec![sub.start];
    for piece in &sub.pieces {
        match piece.segment {
            Segment::Line { to, .. } => pts.push(to),
            Segment::Cubic(c) => pts.extend(c.flatten(tolerance).into_iter().map(|(_, p)| p)),
        }
    }
    if sub.closed && pts.len() > 1 && (pts[0] - pts[pts.len() - 1]).norm() < TOLERANCE {
        pts.pop();
    }
    pts
}

/// Breaks of one subpath as `(piece order, t)` with `t` in `[0, 1)`.
fn normalized_breaks(sub: &Subpath, positions: &[CutPosition]) -> Vec<(usize, f64)> {
    let n = sub.pieces.len();
    let mut breaks: Vec<(usize, f64)> = Vec::new();
    for pos in positions {
        let Some(k) = sub.pieces.iter().position(|p| p.piece == pos.piece) else {
            continue;
        };
        let mut k = k;
        let mut t = pos.t.clamp(0.0, 1.0);
        if t < POSITION_SNAP {
            t = 0.0;
        }
        if t > 1.0 - POSITION_SNAP {
            if k + 1 < n {
                k += 1;
                t = 0.0;
            } else if sub.closed {
                k = 0;
                t = 0.0;
            } else {
                // End of an open subpath.
                continue;
            }
        }
        if k == 0 && t == 0.0 && !sub.closed {
            continue;
        }
        if !breaks
            .iter()
            .any(|&(bk, bt)| bk == k && (bt - t).abs() < POSITION_SNAP)
        {
            breaks.push((k, t));
        }
    }
    breaks.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    breaks
}

fn emit_with_breaks(out: &mut Path, sub: &Subpath, breaks: &[(usize, f64)]) {
    // Split every piece at its interior breaks; remember which portions
    // start at a break.
    let mut portions: Vec<(Segment, bool)> = Vec::new();
    for (k, piece) in sub.pieces.iter().enumerate() {
        let mut cuts: Vec<f64> = breaks
            .iter()
            .filter(|&&(bk, _)| bk == k)
            .map(|&(_, t)| t)
            .collect();
        let break_at_start = cuts.first().is_some_and(|&t| t == 0.0);
        cuts.retain(|&t| t > 0.0);
        let mut t0 = 0.0;
        let mut first = true;
        for &t in cuts.iter().chain(std::iter::once(&1.0)) {
            portions.push((piece.segment.portion(t0, t), (first && break_at_start) || !first));
            first = false;
            t0 = t;
        }
    }

    if !sub.closed || breaks.is_empty() {
        out.move_to(sub.start);
        for (segment, break_before) in &portions {
            if *break_before {
                out.move_to(segment.start());
            }
            out.commands.push(segment.to_command());
        }
        if sub.closed {
            out.close();
        }
        return;
    }

    let first_break = portions.iter().position(|(_, b)| *b).unwrap_or(0);
    let n = portions.len();
    out.move_to(portions[first_break].0.start());
    for offset in 0..n {
        let (segment, break_before) = &portions[(first_break + offset) % n];
        if *break_before && offset > 0 {
            out.move_to(segment.start());
        }
        out.commands.push(segment.to_command());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(x: f64, y: f64, size: f64) -> Path {
        let mut path = Path::new();
        path.move_to(p(x, y));
        path.line_to(p(x + size, y));
        path.line_to(p(x + size, y + size));
        path.line_to(p(x, y + size));
        path.close();
        path
    }

    fn count_moves(path: &Path) -> usize {
        path.commands()
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count()
    }

    #[test]
    fn subpaths_include_closing_line() {
        let subs = square(0.0, 0.0, 1.0).subpaths();
        assert_eq!(subs.len(), 1);
        assert!(subs[0].closed);
        assert_eq!(subs[0].pieces.len(), 4);
        assert_eq!(subs[0].pieces[3].piece, 4);
    }

    #[test]
    fn area_of_square() {
        assert_abs_diff_eq!(square(0.0, 0.0, 2.0).area(0.01), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn single_moveto_is_not_drawable() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0));
        assert!(!path.is_drawable());
    }

    #[test]
    fn cut_open_polyline_in_the_middle() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0));
        path.line_to(p(2.0, 0.0));
        let cut = path.convert_positions_to_move_to(&[CutPosition { piece: 1, t: 0.5 }]);
        assert_eq!(count_moves(&cut), 2);
        let parts = cut.sub_paths();
        assert_eq!(parts.len(), 2);
        assert_abs_diff_eq!(parts[0].length(0.01), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(parts[1].length(0.01), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn cut_closed_square_opens_it() {
        let path = square(0.0, 0.0, 1.0);
        let cut = path.convert_positions_to_move_to(&[
            CutPosition { piece: 1, t: 0.5 },
            CutPosition { piece: 3, t: 0.5 },
        ]);
        assert!(!cut.commands().contains(&PathCommand::Close));
        let parts = cut.sub_paths();
        assert_eq!(parts.len(), 2);
        assert_abs_diff_eq!(parts[0].length(0.01), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(parts[1].length(0.01), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn cut_at_piece_boundary_is_deduplicated() {
        let path = square(0.0, 0.0, 1.0);
        let cut = path.convert_positions_to_move_to(&[
            CutPosition { piece: 1, t: 1.0 },
            CutPosition { piece: 2, t: 0.0 },
        ]);
        // One break opens the loop into a single open subpath.
        assert_eq!(cut.sub_paths().len(), 1);
        assert_abs_diff_eq!(cut.length(0.01), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn nesting_groups_holes_with_outer() {
        let mut path = square(0.0, 0.0, 4.0);
        let mut hole = Path::new();
        hole.move_to(p(1.0, 1.0));
        hole.line_to(p(1.0, 2.0));
        hole.line_to(p(2.0, 2.0));
        hole.line_to(p(2.0, 1.0));
        hole.close();
        path.append(&hole);
        path.append(&square(10.0, 0.0, 1.0));
        let nesting = Nesting {
            parent: vec![None, Some(0), None],
        };
        let parts = path.sub_paths_with_nesting(&nesting);
        assert_eq!(parts.len(), 2);
        assert_abs_diff_eq!(parts[0].area(0.01), 15.0, epsilon = 1e-12);
        assert_abs_diff_eq!(parts[1].area(0.01), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn cubic_meets_line_on_the_curve() {
        let arc = Segment::Cubic(CubicBez::new(
            p(1.0, 0.0),
            p(1.0, 0.5523),
            p(0.5523, 1.0),
            p(0.0, 1.0),
        ));
        let line = Segment::Line {
            from: p(-2.0, 0.5),
            to: p(2.0, 0.5),
        };
        let hits = arc.intersections(&line, 1e-9);
        assert_eq!(hits.len(), 1);
        let (t, u) = hits[0];
        let on_arc = arc.point_at(t);
        let on_line = line.point_at(u);
        assert_abs_diff_eq!(on_arc.y, 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(on_arc.x, on_line.x, epsilon = 1e-8);
        assert_abs_diff_eq!(on_arc.x, 0.866, epsilon = 1e-3);
    }

    #[test]
    fn s_curve_meets_axis_three_times() {
        let wave = Segment::Cubic(CubicBez::new(
            p(0.0, 0.0),
            p(1.0, 2.0),
            p(2.0, -2.0),
            p(3.0, 0.0),
        ));
        let axis = Segment::Line {
            from: p(-1.0, 0.0),
            to: p(4.0, 0.0),
        };
        let mut ts: Vec<f64> = wave.intersections(&axis, 1e-9).into_iter().map(|(t, _)| t).collect();
        ts.sort_by(f64::total_cmp);
        assert_eq!(ts.len(), 3);
        for (t, expected) in ts.iter().zip([0.0, 0.5, 1.0]) {
            assert_abs_diff_eq!(*t, expected, epsilon = 1e-6);
        }
        let far = Segment::Line {
            from: p(0.0, 5.0),
            to: p(3.0, 5.0),
        };
        assert!(wave.intersections(&far, 1e-9).is_empty());
    }

    #[test]
    fn transformed_moves_tangents_without_translation() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0));
        path.cubic_to(p(1.0, 0.0), Vector2::new(1.0, 0.0), Vector2::new(1.0, 0.0));
        let t = crate::math::transform_from_coefficients(1.0, 0.0, 0.0, 1.0, 5.0, 0.0);
        let moved = path.transformed(&t);
        match moved.commands()[1] {
            PathCommand::CubicTo {
                end, start_tangent, ..
            } => {
                assert_abs_diff_eq!(end.x, 6.0, epsilon = 1e-12);
                assert_abs_diff_eq!(start_tangent.x, 1.0, epsilon = 1e-12);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
