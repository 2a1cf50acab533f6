use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::math::intersect_2d::{segment_segment_intersect_2d, SegmentIntersection};
use crate::math::Point2;

use super::{BackData, EdgeData, PointId, Shape};

/// An input segment of the sweep.
#[derive(Debug, Clone)]
pub(crate) struct RawSegment {
    pub a: Point2,
    pub b: Point2,
    pub weights: [i32; 2],
    pub keep: bool,
    pub back: Vec<BackData>,
}

/// Splits crossing segments at their intersections and merges duplicates.
///
/// The result has no two edges crossing or overlapping. Coincident edges are
/// merged into one edge running from the lower to the higher vertex index,
/// with signed weights summed and back data collected. Edges whose weights
/// cancel are dropped unless one of the merged segments had `keep` set.
pub(crate) fn planarize(segments: Vec<RawSegment>, epsilon: f64) -> Shape {
    let mut pool = VertexPool::new(epsilon);
    let segments: Vec<RawSegment> = segments
        .into_iter()
        .filter(|s| (s.b - s.a).norm() >= epsilon)
        .collect();

    // Split parameters per segment: (t, vertex index).
    let mut splits: Vec<Vec<(f64, usize)>> = segments
        .iter()
        .map(|s| vec![(0.0, pool.insert(s.a)), (1.0, pool.insert(s.b))])
        .collect();

    let min_x = |s: &RawSegment| s.a.x.min(s.b.x);
    let max_x = |s: &RawSegment| s.a.x.max(s.b.x);
    let mut order: Vec<usize> = (0..segments.len()).collect();
    order.sort_by(|&i, &j| {
        min_x(&segments[i])
            .total_cmp(&min_x(&segments[j]))
            .then(segments[i].a.y.min(segments[i].b.y).total_cmp(&segments[j].a.y.min(segments[j].b.y)))
    });

    let mut active: Vec<usize> = Vec::new();
    let mut intersections = 0usize;
    for &i in &order {
        let si = &segments[i];
        let sweep_x = min_x(si) - epsilon;
        active.retain(|&j| max_x(&segments[j]) >= sweep_x);
        let (ilo, ihi) = (si.a.y.min(si.b.y), si.a.y.max(si.b.y));
        for &j in &active {
            let sj = &segments[j];
            if sj.a.y.max(sj.b.y) < ilo - epsilon || sj.a.y.min(sj.b.y) > ihi + epsilon {
                continue;
            }
            match segment_segment_intersect_2d(&si.a, &si.b, &sj.a, &sj.b, epsilon) {
                SegmentIntersection::None => {}
                SegmentIntersection::Point { point, t, u } => {
                    let v = pool.insert(point);
                    splits[i].push((t, v));
                    splits[j].push((u, v));
                    intersections += 1;
                }
                SegmentIntersection::Overlap { t0, t1, u0, u1 } => {
                    let da = si.b - si.a;
                    let v0 = pool.insert(si.a + da * t0);
                    let v1 = pool.insert(si.a + da * t1);
                    splits[i].push((t0, v0));
                    splits[i].push((t1, v1));
                    splits[j].push((u0, v0));
                    splits[j].push((u1, v1));
                    intersections += 1;
                }
            }
        }
        active.push(i);
    }

    // Merge sub-segments keyed by their (low, high) vertex pair.
    let mut merged: BTreeMap<(usize, usize), Merged> = BTreeMap::new();
    for (seg, mut cuts) in segments.iter().zip(splits) {
        cuts.sort_by(|x, y| x.0.total_cmp(&y.0));
        cuts.dedup_by_key(|c| c.1);
        for w in cuts.windows(2) {
            let ((t0, u), (t1, v)) = (w[0], w[1]);
            if u == v {
                continue;
            }
            let forward = u < v;
            let entry = merged.entry((u.min(v), u.max(v))).or_default();
            for k in 0..2 {
                entry.weights[k] += if forward { seg.weights[k] } else { -seg.weights[k] };
            }
            entry.keep |= seg.keep;
            for back in &seg.back {
                let part = back.sub_range(t0, t1);
                entry.back.push(if forward { part } else { part.reversed() });
            }
        }
    }

    let mut shape = Shape::new();
    let mut ids: HashMap<usize, PointId> = HashMap::new();
    for ((lo, hi), m) in merged {
        if m.weights == [0, 0] && !m.keep {
            continue;
        }
        let start = *ids.entry(lo).or_insert_with(|| shape.add_point(pool.points[lo]));
        let end = *ids.entry(hi).or_insert_with(|| shape.add_point(pool.points[hi]));
        shape.add_edge(EdgeData {
            start,
            end,
            weights: m.weights,
            keep: m.keep,
            back: m.back,
            winding: None,
        });
    }
    debug!(
        points = shape.point_count(),
        edges = shape.edge_count(),
        intersections,
        "planarized shape"
    );
    shape
}

#[derive(Debug, Default)]
struct Merged {
    weights: [i32; 2],
    keep: bool,
    back: Vec<BackData>,
}

/// Grid hash that snaps points within `epsilon` of an existing vertex onto it.
struct VertexPool {
    cell_size: f64,
    map: HashMap<(i64, i64), Vec<usize>>,
    points: Vec<Point2>,
}

impl VertexPool {
    fn new(epsilon: f64) -> Self {
        Self {
            cell_size: epsilon.max(f64::EPSILON),
            map: HashMap::new(),
            points: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_key(&self, p: &Point2) -> (i64, i64) {
        let inv = 1.0 / self.cell_size;
        ((p.x * inv).floor() as i64, (p.y * inv).floor() as i64)
    }

    fn insert(&mut self, point: Point2) -> usize {
        let key = self.cell_key(&point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(entries) = self.map.get(&(key.0 + dx, key.1 + dy)) {
                    for &idx in entries {
                        if (point - self.points[idx]).norm() < self.cell_size {
                            return idx;
                        }
                    }
                }
            }
        }
        let idx = self.points.len();
        self.points.push(point);
        self.map.entry(key).or_default().push(idx);
        idx
    }
}
