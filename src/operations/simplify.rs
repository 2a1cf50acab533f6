//! Path simplification: merging near-collinear segments and refitting
//! dense polylines with cubic Beziers.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::geometry::flatten::convert_with_back_data;
use crate::geometry::Path;
use crate::math::bezier::CubicBez;
use crate::math::polygon_2d::point_segment_distance;
use crate::math::{Point2, Vector2, TOLERANCE};

/// Turns whose direction cosine falls below this split fitting sections.
const CORNER_COS: f64 = 0.5;

/// Curve samples used when measuring how far a fit strays from its points.
const DEVIATION_SAMPLES: usize = 48;

/// Settings of the simplify command.
#[derive(Debug, Clone, Copy)]
pub struct SimplifySettings {
    /// Threshold as a fraction of the selection's bounding box diagonal.
    pub threshold: f64,
    /// Only merge near-collinear segments instead of refitting curves.
    pub just_coalesce: bool,
    /// Invocations closer than this accelerate the simplification.
    pub window: Duration,
}

impl Default for SimplifySettings {
    fn default() -> Self {
        Self {
            threshold: 0.003,
            just_coalesce: false,
            window: Duration::from_millis(500),
        }
    }
}

/// Grows the simplify threshold when the command is repeated quickly.
///
/// Every invocation within the window of the previous one adds one half to
/// the multiplier; a slower invocation resets it to one.
#[derive(Debug, Clone)]
pub struct SimplifyAccelerator {
    last: Option<Instant>,
    multiplier: f64,
}

impl Default for SimplifyAccelerator {
    fn default() -> Self {
        Self {
            last: None,
            multiplier: 1.0,
        }
    }
}

impl SimplifyAccelerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Records an invocation at `now` and returns the threshold to use.
    pub fn threshold_at(&mut self, now: Instant, settings: &SimplifySettings) -> f64 {
        match self.last {
            Some(previous) if now.saturating_duration_since(previous) < settings.window => {
                self.multiplier += 0.5;
            }
            _ => self.multiplier = 1.0,
        }
        self.last = Some(now);
        settings.threshold * self.multiplier
    }

    /// Records an invocation now and returns the threshold to use.
    pub fn threshold(&mut self, settings: &SimplifySettings) -> f64 {
        self.threshold_at(Instant::now(), settings)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Rebuilds `path` as lines, merging runs of segments that stay within
/// `threshold` of a single straight line.
#[must_use]
pub fn coalesce(path: &Path, threshold: f64) -> Path {
    let threshold = threshold.max(TOLERANCE);
    let mut out = Path::new();
    for (points, closed) in polylines(path, threshold) {
        let points = if closed {
            rotate_to_sharpest(&points)
        } else {
            points
        };
        let mut ring = points.clone();
        if closed {
            ring.push(points[0]);
        }
        out.move_to(ring[0]);
        let mut i = 0;
        while i + 1 < ring.len() {
            let mut j = i + 1;
            while j + 1 < ring.len() && collinear_deviation(&ring[i..=j + 1]) <= threshold {
                j += 1;
            }
            out.line_to(ring[j]);
            i = j;
        }
        if closed {
            out.close();
        }
    }
    debug!(before = path.len(), after = out.len(), threshold, "coalesced path");
    out
}

/// Refits `path` with lines and cubic Beziers that stay within `threshold`
/// of its flattened outline.
///
/// Sharp turns are kept as corners; smooth stretches between them are
/// covered greedily by the longest fits that meet the threshold.
#[must_use]
pub fn simplify(path: &Path, threshold: f64) -> Path {
    let threshold = threshold.max(TOLERANCE);
    let mut out = Path::new();
    for (points, closed) in polylines(path, threshold) {
        for section in sections(&points, closed) {
            if section.first {
                out.move_to(section.points[0]);
            }
            fit_section(&mut out, &section, threshold);
        }
        if closed {
            out.close();
        }
    }
    debug!(before = path.len(), after = out.len(), threshold, "simplified path");
    out
}

/// Flattened subpaths with repeated points removed, closing point dropped.
fn polylines(path: &Path, threshold: f64) -> Vec<(Vec<Point2>, bool)> {
    convert_with_back_data(path, threshold * 0.25)
        .into_iter()
        .filter_map(|polyline| {
            let mut points: Vec<Point2> = Vec::with_capacity(polyline.points.len());
            for p in polyline.vertices() {
                if points.last().map_or(true, |last| (p - last).norm() > TOLERANCE) {
                    points.push(p);
                }
            }
            if polyline.closed && points.len() > 1 {
                let first = points[0];
                if points.last().is_some_and(|p| (p - first).norm() <= TOLERANCE) {
                    points.pop();
                }
            }
            (points.len() >= 2).then_some((points, polyline.closed))
        })
        .collect()
}

/// Cosine of the turn at `b` going from `a` through `b` to `c`.
fn turn_cos(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let u = b - a;
    let v = c - b;
    let denom = u.norm() * v.norm();
    if denom < TOLERANCE {
        1.0
    } else {
        u.dot(&v) / denom
    }
}

fn rotate_to_sharpest(points: &[Point2]) -> Vec<Point2> {
    let n = points.len();
    let start = (0..n)
        .min_by(|&a, &b| {
            let ca = turn_cos(&points[(a + n - 1) % n], &points[a], &points[(a + 1) % n]);
            let cb = turn_cos(&points[(b + n - 1) % n], &points[b], &points[(b + 1) % n]);
            ca.total_cmp(&cb)
        })
        .unwrap_or(0);
    points[start..].iter().chain(&points[..start]).copied().collect()
}

/// Largest distance of the inner points from the chord of the run.
fn collinear_deviation(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let (a, b) = (&points[0], &points[points.len() - 1]);
    points[1..points.len() - 1]
        .iter()
        .map(|p| point_segment_distance(p, a, b))
        .fold(0.0, f64::max)
}

/// A stretch of polyline between two corners, with a tangent per point.
struct Section {
    points: Vec<Point2>,
    tangents: Vec<Vector2>,
    /// Starts a new subpath.
    first: bool,
}

fn sections(points: &[Point2], closed: bool) -> Vec<Section> {
    let n = points.len();
    if n < 3 {
        return vec![section(points.to_vec(), true, false)];
    }
    let corner = |k: usize| -> bool {
        let (prev, next) = if closed {
            ((k + n - 1) % n, (k + 1) % n)
        } else if k == 0 || k == n - 1 {
            return true;
        } else {
            (k - 1, k + 1)
        };
        turn_cos(&points[prev], &points[k], &points[next]) < CORNER_COS
    };
    let corners: Vec<usize> = (0..n).filter(|&k| corner(k)).collect();

    if closed && corners.is_empty() {
        let mut ring = points.to_vec();
        ring.push(points[0]);
        return vec![section(ring, true, true)];
    }
    let mut out = Vec::new();
    if closed {
        for (i, &c) in corners.iter().enumerate() {
            let next = corners[(i + 1) % corners.len()];
            let mut run = Vec::new();
            let mut k = c;
            loop {
                run.push(points[k]);
                k = (k + 1) % n;
                if k == next {
                    run.push(points[k]);
                    break;
                }
            }
            out.push(section(run, i == 0, false));
        }
    } else {
        for (i, pair) in corners.windows(2).enumerate() {
            out.push(section(points[pair[0]..=pair[1]].to_vec(), i == 0, false));
        }
    }
    out
}

/// Builds a section, estimating tangents by central differences. A
/// `smooth_ends` section wraps around, so its end tangents use the points
/// across the seam.
fn section(points: Vec<Point2>, first: bool, smooth_ends: bool) -> Section {
    let n = points.len();
    let unit = |v: Vector2| -> Vector2 {
        let len = v.norm();
        if len < TOLERANCE {
            Vector2::zeros()
        } else {
            v / len
        }
    };
    let tangents = (0..n)
        .map(|k| {
            if k > 0 && k + 1 < n {
                unit(points[k + 1] - points[k - 1])
            } else if smooth_ends && n > 2 {
                unit(points[1] - points[n - 2])
            } else if k == 0 {
                unit(points[1] - points[0])
            } else {
                unit(points[n - 1] - points[n - 2])
            }
        })
        .collect();
    Section {
        points,
        tangents,
        first,
    }
}

fn fit_section(out: &mut Path, section: &Section, threshold: f64) {
    let pts = &section.points;
    let mut i = 0;
    while i + 1 < pts.len() {
        let mut best = (i + 1, None);
        for j in i + 2..pts.len() {
            if collinear_deviation(&pts[i..=j]) <= threshold {
                best = (j, None);
                continue;
            }
            let cubic = fit_cubic(&pts[i..=j], section.tangents[i], section.tangents[j]);
            if max_deviation(&cubic, &pts[i..=j]) <= threshold {
                best = (j, Some(cubic));
            } else {
                break;
            }
        }
        match best {
            (j, Some(cubic)) => {
                let (start_tangent, end_tangent) = cubic.tangents();
                out.cubic_to(pts[j], start_tangent, end_tangent);
                i = j;
            }
            (j, None) => {
                out.line_to(pts[j]);
                i = j;
            }
        }
    }
}

/// Least-squares handle lengths along fixed end tangents, with the points
/// parameterized by chord length.
fn fit_cubic(points: &[Point2], t0: Vector2, t1: Vector2) -> CubicBez {
    let p0 = points[0];
    let p3 = points[points.len() - 1];
    let chord = (p3 - p0).norm();

    let mut u = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    u.push(0.0);
    for w in points.windows(2) {
        acc += (w[1] - w[0]).norm();
        u.push(acc);
    }
    if acc > TOLERANCE {
        for v in &mut u {
            *v /= acc;
        }
    }

    let (mut c11, mut c12, mut c22, mut x1, mut x2) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (p, &t) in points.iter().zip(&u) {
        let mt = 1.0 - t;
        let b0 = mt * mt * mt;
        let b1 = 3.0 * mt * mt * t;
        let b2 = 3.0 * mt * t * t;
        let b3 = t * t * t;
        let a1 = t0 * b1;
        let a2 = -t1 * b2;
        let base = p0.coords * (b0 + b1) + p3.coords * (b2 + b3);
        let tmp = p.coords - base;
        c11 += a1.dot(&a1);
        c12 += a1.dot(&a2);
        c22 += a2.dot(&a2);
        x1 += a1.dot(&tmp);
        x2 += a2.dot(&tmp);
    }
    let det = c11 * c22 - c12 * c12;
    let (mut alpha1, mut alpha2) = if det.abs() > TOLERANCE {
        ((x1 * c22 - x2 * c12) / det, (c11 * x2 - c12 * x1) / det)
    } else {
        (0.0, 0.0)
    };
    let floor = chord * 1e-3;
    if alpha1 < floor || alpha2 < floor {
        alpha1 = chord / 3.0;
        alpha2 = chord / 3.0;
    }
    CubicBez::new(p0, p0 + t0 * alpha1, p3 - t1 * alpha2, p3)
}

/// Largest distance from the inner points to the nearest curve sample.
fn max_deviation(cubic: &CubicBez, points: &[Point2]) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<Point2> = (0..=DEVIATION_SAMPLES)
        .map(|i| cubic.eval(i as f64 / DEVIATION_SAMPLES as f64))
        .collect();
    points[1..points.len() - 1]
        .iter()
        .map(|p| {
            samples
                .windows(2)
                .map(|w| point_segment_distance(p, &w[0], &w[1]))
                .fold(f64::MAX, f64::min)
        })
        .fold(0.0, f64::max)
}
