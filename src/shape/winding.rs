use std::cmp::Ordering;

use crate::math::Point2;

use super::{EdgeId, EdgeWinding, Shape};

/// An edge oriented for the sweep: `lo` is its left end, or its lower end
/// when it is vertical.
struct SweepEdge {
    id: EdgeId,
    lo: Point2,
    hi: Point2,
    /// +1 when the edge runs from `lo` to `hi`.
    sign: i32,
    weights: [i32; 2],
}

#[allow(clippy::float_cmp)]
impl SweepEdge {
    fn new(id: EdgeId, a: Point2, b: Point2, weights: [i32; 2]) -> Self {
        let forward = a.x < b.x || (a.x == b.x && a.y <= b.y);
        let (lo, hi, sign) = if forward { (a, b, 1) } else { (b, a, -1) };
        Self {
            id,
            lo,
            hi,
            sign,
            weights,
        }
    }

    fn is_vertical(&self) -> bool {
        self.lo.x == self.hi.x
    }

    /// Height of the edge at `x`, exact at the endpoints.
    fn y_at(&self, x: f64) -> f64 {
        if x == self.lo.x {
            self.lo.y
        } else if x == self.hi.x {
            self.hi.y
        } else {
            self.lo.y + (x - self.lo.x) * (self.hi.y - self.lo.y) / (self.hi.x - self.lo.x)
        }
    }

    fn slope(&self) -> f64 {
        (self.hi.y - self.lo.y) / (self.hi.x - self.lo.x)
    }

    /// Winding above the edge given the winding below it.
    fn step(&self, below: [i32; 2]) -> [i32; 2] {
        [
            below[0] + self.sign * self.weights[0],
            below[1] + self.sign * self.weights[1],
        ]
    }

    /// Windings of the edge given the winding below it, or on its -x side
    /// when vertical.
    fn winding(&self, below: [i32; 2]) -> EdgeWinding {
        let w = self.weights;
        // Running towards +x the left is above; running towards +y it is -x.
        let left_is_below = (self.sign > 0) == self.is_vertical();
        if left_is_below {
            EdgeWinding {
                left: below,
                right: [below[0] - w[0], below[1] - w[1]],
            }
        } else {
            EdgeWinding {
                left: [below[0] + w[0], below[1] + w[1]],
                right: below,
            }
        }
    }
}

/// An edge crossing the sweep line with the winding of the region above it.
struct Active {
    edge: usize,
    above: [i32; 2],
}

/// Computes, for every edge of a planar shape, the winding numbers of the
/// regions on its left and right.
///
/// Sweeps a vertical line from left to right, keeping the edges it crosses
/// ordered by height. A new edge takes the winding above the edge just below
/// it. Edges must not cross or overlap and their weights must already be
/// merged, which holds for the output of the uncrossing sweep.
#[allow(clippy::float_cmp)]
pub(crate) fn compute_windings(shape: &Shape) -> Vec<(EdgeId, EdgeWinding)> {
    let edges: Vec<SweepEdge> = shape
        .edges()
        .filter_map(|(id, e)| {
            let (a, b) = shape.edge_points(id).ok()?;
            Some(SweepEdge::new(id, a, b, e.weights))
        })
        .collect();

    let by_x = |&i: &usize, &j: &usize| edges[i].lo.x.total_cmp(&edges[j].lo.x);
    let (mut verticals, mut starts): (Vec<usize>, Vec<usize>) =
        (0..edges.len()).partition(|&i| edges[i].is_vertical());
    verticals.sort_by(by_x);
    starts.sort_by(|i, j| {
        let (a, b) = (&edges[*i], &edges[*j]);
        a.lo.x
            .total_cmp(&b.lo.x)
            .then(a.lo.y.total_cmp(&b.lo.y))
            .then(a.slope().total_cmp(&b.slope()))
    });
    let mut ends: Vec<f64> = starts.iter().map(|&i| edges[i].hi.x).collect();
    ends.sort_by(f64::total_cmp);

    let mut xs: Vec<f64> = edges.iter().flat_map(|e| [e.lo.x, e.hi.x]).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();

    let mut windings: Vec<Option<EdgeWinding>> = vec![None; edges.len()];
    let mut active: Vec<Active> = Vec::new();
    let (mut next_start, mut next_vertical, mut next_end) = (0, 0, 0);

    for x in xs {
        // Vertical edges see the region just left of the sweep line, so they
        // go before the edges ending here are dropped.
        while let Some(&i) = verticals.get(next_vertical).filter(|&&i| edges[i].lo.x == x) {
            let e = &edges[i];
            let mid = 0.5 * (e.lo.y + e.hi.y);
            let k = active.partition_point(|a| edges[a.edge].y_at(x) < mid);
            let left_side = k.checked_sub(1).map_or([0, 0], |k| active[k].above);
            windings[i] = Some(e.winding(left_side));
            next_vertical += 1;
        }

        let ending = ends[next_end..].iter().take_while(|&&end| end == x).count();
        if ending > 0 {
            active.retain(|a| edges[a.edge].hi.x != x);
            next_end += ending;
        }

        while let Some(&i) = starts.get(next_start).filter(|&&i| edges[i].lo.x == x) {
            let e = &edges[i];
            let (y, slope) = (e.lo.y, e.slope());
            let k = active.partition_point(|a| {
                let other = &edges[a.edge];
                match other.y_at(x).total_cmp(&y) {
                    Ordering::Equal => other.slope() < slope,
                    order => order == Ordering::Less,
                }
            });
            let below = k.checked_sub(1).map_or([0, 0], |k| active[k].above);
            windings[i] = Some(e.winding(below));
            active.insert(
                k,
                Active {
                    edge: i,
                    above: e.step(below),
                },
            );
            next_start += 1;
        }
    }

    edges
        .iter()
        .zip(windings)
        .filter_map(|(e, w)| Some((e.id, w?)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::shape::planarize::planarize;
    use std::f64::consts::TAU;

    fn square_shape(ccw: bool) -> Shape {
        let mut pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        if !ccw {
            pts.reverse();
        }
        let mut shape = Shape::new();
        shape.add_polygon(&pts);
        shape
    }

    /// Winding of `p` by crossing count over every edge.
    fn winding_at(shape: &Shape, p: &Point2) -> [i32; 2] {
        let mut acc = [0; 2];
        for (id, e) in shape.edges() {
            let (a, b) = shape.edge_points(id).unwrap();
            let side = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            let sign = if a.y <= p.y && p.y < b.y && side > 0.0 {
                1
            } else if b.y <= p.y && p.y < a.y && side < 0.0 {
                -1
            } else {
                0
            };
            acc[0] += sign * e.weights[0];
            acc[1] += sign * e.weights[1];
        }
        acc
    }

    /// Checks every edge against crossing counts just off its midpoint.
    fn assert_matches_crossing_count(shape: &Shape) {
        let windings = compute_windings(shape);
        assert_eq!(windings.len(), shape.edge_count());
        for (id, w) in windings {
            let (a, b) = shape.edge_points(id).unwrap();
            let d = (b - a).normalize() * 1e-6;
            let mid = Point2::new(0.5 * (a.x + b.x), 0.5 * (a.y + b.y));
            let left = Point2::new(mid.x - d.y, mid.y + d.x);
            let right = Point2::new(mid.x + d.y, mid.y - d.x);
            assert_eq!(w.left, winding_at(shape, &left), "left of {a:?} -> {b:?}");
            assert_eq!(w.right, winding_at(shape, &right), "right of {a:?} -> {b:?}");
        }
    }

    fn pentagram() -> Vec<Point2> {
        (0..5)
            .map(|i| {
                let a = TAU * f64::from(i * 2) / 5.0 + 0.3;
                Point2::new(3.0 * a.cos(), 3.0 * a.sin())
            })
            .collect()
    }

    #[test]
    fn ccw_square_has_inside_on_the_left() {
        for (_, w) in compute_windings(&square_shape(true)) {
            assert_eq!(w.left, [1, 0]);
            assert_eq!(w.right, [0, 0]);
        }
    }

    #[test]
    fn cw_square_has_negative_inside_on_the_right() {
        for (_, w) in compute_windings(&square_shape(false)) {
            assert_eq!(w.left, [0, 0]);
            assert_eq!(w.right, [-1, 0]);
        }
    }

    #[test]
    fn nested_squares_accumulate() {
        let mut shape = square_shape(true);
        shape.add_polygon(&[
            Point2::new(0.25, 0.25),
            Point2::new(0.75, 0.25),
            Point2::new(0.75, 0.75),
            Point2::new(0.25, 0.75),
        ]);
        let windings = compute_windings(&shape);
        let inner = windings
            .iter()
            .filter(|(_, w)| w.left == [2, 0])
            .count();
        assert_eq!(inner, 4);
    }

    #[test]
    fn pentagram_centre_winds_twice() {
        let mut star = Shape::new();
        star.add_polygon(&pentagram());
        let shape = planarize(star.segments(), 1e-9);
        assert_eq!(shape.edge_count(), 15);
        let windings = compute_windings(&shape);
        let centre = windings.iter().filter(|(_, w)| w.left == [2, 0]).count();
        assert_eq!(centre, 5);
        assert_matches_crossing_count(&shape);
    }

    #[test]
    fn overlapping_polygons_agree_with_crossing_count() {
        let mut raw = Shape::new();
        raw.add_polygon(&pentagram());
        // Vertical sides.
        raw.add_polygon(&[
            Point2::new(-1.0, -1.0),
            Point2::new(2.0, -1.0),
            Point2::new(2.0, 2.0),
            Point2::new(-1.0, 2.0),
        ]);
        // Clockwise, sharing a side with the square.
        raw.add_polygon(&[
            Point2::new(2.0, -1.0),
            Point2::new(0.5, 0.5),
            Point2::new(2.0, 2.0),
        ]);
        // A fan of triangles around one point.
        for i in 0..6 {
            let a = TAU * f64::from(i) / 6.0;
            let b = TAU * f64::from(i + 1) / 6.0;
            raw.add_polygon(&[
                Point2::new(5.0, 5.0),
                Point2::new(5.0 + a.cos(), 5.0 + a.sin()),
                Point2::new(5.0 + b.cos(), 5.0 + b.sin()),
            ]);
        }
        let shape = planarize(raw.segments(), 1e-9);
        assert_matches_crossing_count(&shape);
    }

    #[test]
    fn many_disjoint_squares_each_wind_once() {
        let mut shape = Shape::new();
        for i in 0..400 {
            let x = f64::from(i % 20) * 2.0;
            let y = f64::from(i / 20) * 2.0;
            shape.add_polygon(&[
                Point2::new(x, y),
                Point2::new(x + 1.0, y + 0.5),
                Point2::new(x + 1.0, y + 1.0),
                Point2::new(x, y + 1.5),
            ]);
        }
        let windings = compute_windings(&shape);
        assert_eq!(windings.len(), 1600);
        assert!(windings
            .iter()
            .all(|(_, w)| w.left == [1, 0] && w.right == [0, 0]));
    }
}
