use tracing::{debug, info};

use crate::error::{OperationError, Result};
use crate::geometry::{CutPosition, Nesting, Path, PathPiece};
use crate::math::Point2;
use crate::shape::{FillRule, Shape};

use super::select::BoolOp;
use super::{BoolOpSettings, BooleanOutput, Operand};

/// Flatness at which slice crossings are located on the curves.
const CROSSING_TOLERANCE: f64 = 1e-9;

/// Runs a boolean operation over operands given bottom first.
///
/// Union and intersection fold over all operands. The other operations take
/// exactly two: the bottom operand is the target and the top one is
/// subtracted from it or used as the cutting curve.
pub(crate) fn boolean_execute(
    operands: &[Operand],
    op: BoolOp,
    settings: &BoolOpSettings,
) -> Result<BooleanOutput> {
    // Step 1: arity
    if operands.len() < 2 {
        return Err(OperationError::InvalidSelection(
            "Select at least 2 paths to perform a boolean operation.".to_owned(),
        )
        .into());
    }
    if op.is_binary() && operands.len() > 2 {
        return Err(OperationError::InvalidSelection(
            "Select exactly 2 paths to perform difference, exclusion, division, or path cut."
                .to_owned(),
        )
        .into());
    }

    // Step 2: every operand must draw something
    if let Some(index) = operands.iter().position(|o| !o.path.is_drawable()) {
        return Err(OperationError::DegenerateOperand { index }.into());
    }

    let paths: Vec<Path> = operands
        .iter()
        .map(|o| {
            let mut path = o.path.clone();
            path.set_back_data(true);
            path
        })
        .collect();
    let refs: Vec<&Path> = paths.iter().collect();
    let tolerance = settings.tolerance_for(op);
    debug!(op = op.label(), operands = paths.len(), tolerance, "boolean operands ready");

    // Step 3: combine
    let output = match op {
        BoolOp::Slice => {
            let target = curves(&paths[0], 0, tolerance, settings)?;
            let cutter = curves(&paths[1], 1, tolerance, settings)?;
            let (_, positions) = Shape::slice(&target, &cutter, 0, &settings.shape)?;
            let positions = snap_to_crossings(&operands[0].path, &operands[1].path, &positions);
            debug!(positions = positions.len(), "slice positions found");
            BooleanOutput {
                path: operands[0].path.convert_positions_to_move_to(&positions),
                nesting: None,
            }
        }
        BoolOp::Cut => {
            let target = area(&paths[0], operands[0].fill_rule, 0, tolerance, settings)?;
            let cutter = curves(&paths[1], 1, tolerance, settings)?;
            let cut = Shape::booleen(&target, &cutter, op, 0, &settings.shape)?;
            let (path, nesting) = cut.convert_to_forme_nested(&refs)?;
            BooleanOutput {
                path,
                nesting: Some(nesting),
            }
        }
        _ => {
            let mut result = area(&paths[0], operands[0].fill_rule, 0, tolerance, settings)?;
            for (index, operand) in operands.iter().enumerate().skip(1) {
                let next = area(&paths[index], operand.fill_rule, index, tolerance, settings)?;
                result = Shape::booleen(&result, &next, op, 0, &settings.shape)?;
            }
            BooleanOutput {
                path: result.convert_to_forme(&refs)?,
                nesting: None,
            }
        }
    };

    // Step 4: anything left?
    if !output.path.is_drawable() {
        info!(op = op.label(), "boolean operation produced an empty result");
        return Err(OperationError::EmptyResult.into());
    }
    info!(
        op = op.label(),
        commands = output.path.len(),
        "boolean operation complete"
    );
    Ok(output)
}

/// Fills `path` and uncrosses it under `rule`.
fn area(
    path: &Path,
    rule: FillRule,
    path_id: usize,
    tolerance: f64,
    settings: &BoolOpSettings,
) -> Result<Shape> {
    let mut shape = Shape::new();
    shape.fill(path, path_id, true, tolerance);
    shape.convert_to_shape(rule, &settings.shape)
}

/// Fills `path` as open curves and uncrosses it without windings.
fn curves(path: &Path, path_id: usize, tolerance: f64, settings: &BoolOpSettings) -> Result<Shape> {
    let mut shape = Shape::new();
    shape.fill(path, path_id, false, tolerance);
    shape.convert_to_shape(FillRule::JustDont, &settings.shape)
}

/// Moves slice positions found on the flattened outlines onto the nearest
/// crossing of the target and cutter curves.
///
/// A position with no crossing on the curves is kept as found.
fn snap_to_crossings(target: &Path, cutter: &Path, positions: &[CutPosition]) -> Vec<CutPosition> {
    let pieces: Vec<PathPiece> = target.subpaths().into_iter().flat_map(|s| s.pieces).collect();
    let cutting: Vec<PathPiece> = cutter.subpaths().into_iter().flat_map(|s| s.pieces).collect();
    let crossings: Vec<(CutPosition, Point2)> = pieces
        .iter()
        .flat_map(|p| {
            cutting.iter().flat_map(move |c| {
                p.segment
                    .intersections(&c.segment, CROSSING_TOLERANCE)
                    .into_iter()
                    .map(move |(t, _)| (CutPosition { piece: p.piece, t }, p.segment.point_at(t)))
            })
        })
        .collect();
    debug!(crossings = crossings.len(), "slice crossings on curves");

    positions
        .iter()
        .map(|pos| {
            let Some(found) = pieces.iter().find(|p| p.piece == pos.piece) else {
                return *pos;
            };
            let approx = found.segment.point_at(pos.t);
            crossings
                .iter()
                .min_by(|a, b| (a.1 - approx).norm().total_cmp(&(b.1 - approx).norm()))
                .map_or(*pos, |(exact, _)| *exact)
        })
        .collect()
}

impl BooleanOutput {
    /// Splits the result into the paths that become separate objects.
    ///
    /// Cut fragments keep their holes; slice fragments are single subpaths;
    /// set operations produce one path.
    #[must_use]
    pub fn fragments(&self, op: BoolOp) -> Vec<Path> {
        match (op, &self.nesting) {
            (BoolOp::Cut, Some(nesting)) => self.path.sub_paths_with_nesting(nesting),
            (BoolOp::Cut, None) => self.path.sub_paths_with_nesting(&Nesting::default()),
            (BoolOp::Slice, _) => self.path.sub_paths(),
            _ => vec![self.path.clone()],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PathOpsError;
    use crate::geometry::svg_data::parse_path_data;
    use approx::assert_abs_diff_eq;

    const A: &str = "M0,0 L1,0 L1,1 L0,1 Z";
    const B: &str = "M0.5,0.5 L1.5,0.5 L1.5,1.5 L0.5,1.5 Z";
    const CIRCLE: &str = "M1,0 C1,0.5523 0.5523,1 0,1 C-0.5523,1 -1,0.5523 -1,0 \
                          C-1,-0.5523 -0.5523,-1 0,-1 C0.5523,-1 1,-0.5523 1,0 Z";

    fn operand(d: &str) -> Operand {
        Operand::new(parse_path_data(d).unwrap(), FillRule::NonZero)
    }

    fn run(op: BoolOp, ds: &[&str]) -> Result<BooleanOutput> {
        run_with(op, ds, &BoolOpSettings::default())
    }

    fn run_with(op: BoolOp, ds: &[&str], settings: &BoolOpSettings) -> Result<BooleanOutput> {
        let operands: Vec<Operand> = ds.iter().map(|d| operand(d)).collect();
        boolean_execute(&operands, op, settings)
    }

    fn area_of(op: BoolOp, ds: &[&str]) -> f64 {
        run(op, ds).unwrap().path.area(0.001)
    }

    /// Area with fine flattening, for comparisons across curved results.
    fn fine_area_of(op: BoolOp, ds: &[&str]) -> f64 {
        let settings = BoolOpSettings {
            tolerance: 0.001,
            ..BoolOpSettings::default()
        };
        run_with(op, ds, &settings).unwrap().path.area(0.0001)
    }

    #[test]
    fn overlapping_squares() {
        assert_abs_diff_eq!(area_of(BoolOp::Union, &[A, B]), 1.75, epsilon = 1e-9);
        assert_abs_diff_eq!(area_of(BoolOp::Intersection, &[A, B]), 0.25, epsilon = 1e-9);
        assert_abs_diff_eq!(area_of(BoolOp::Difference, &[A, B]), 0.75, epsilon = 1e-9);
        assert_abs_diff_eq!(area_of(BoolOp::SymmetricDifference, &[A, B]), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn union_and_intersection_commute() {
        assert_abs_diff_eq!(
            area_of(BoolOp::Union, &[CIRCLE, B]),
            area_of(BoolOp::Union, &[B, CIRCLE]),
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            area_of(BoolOp::Intersection, &[CIRCLE, B]),
            area_of(BoolOp::Intersection, &[B, CIRCLE]),
            epsilon = 1e-6
        );
    }

    #[test]
    fn inclusion_exclusion_holds() {
        let circle = parse_path_data(CIRCLE).unwrap().area(0.0001);
        let square = 1.0;
        let union = fine_area_of(BoolOp::Union, &[CIRCLE, B]);
        let inter = fine_area_of(BoolOp::Intersection, &[CIRCLE, B]);
        assert_abs_diff_eq!(union, circle + square - inter, epsilon = 5e-3);
    }

    #[test]
    fn symmetric_difference_decomposes() {
        let sym = fine_area_of(BoolOp::SymmetricDifference, &[CIRCLE, B]);
        let ab = fine_area_of(BoolOp::Difference, &[CIRCLE, B]);
        let ba = fine_area_of(BoolOp::Difference, &[B, CIRCLE]);
        assert_abs_diff_eq!(sym, ab + ba, epsilon = 5e-3);
    }

    #[test]
    fn union_folds_many_operands() {
        let c = "M2,0 L3,0 L3,1 L2,1 Z";
        assert_abs_diff_eq!(area_of(BoolOp::Union, &[A, B, c]), 2.75, epsilon = 1e-9);
    }

    #[test]
    fn union_keeps_curves() {
        let out = run(BoolOp::Union, &[CIRCLE, "M0.5,-0.25 L2,-0.25 L2,0.25 L0.5,0.25 Z"]).unwrap();
        let cubics = out
            .path
            .commands()
            .iter()
            .filter(|c| matches!(c, crate::geometry::PathCommand::CubicTo { .. }))
            .count();
        assert!(cubics >= 4);
    }

    #[test]
    fn cut_conserves_area() {
        let out = run(BoolOp::Cut, &["M0,0 L1,0 L1,1 L0,1 Z", "M-0.5,-0.5 L1.5,1.5"]).unwrap();
        let fragments = out.fragments(BoolOp::Cut);
        assert_eq!(fragments.len(), 2);
        let total: f64 = fragments.iter().map(|p| p.area(0.01)).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
        for fragment in &fragments {
            assert_abs_diff_eq!(fragment.area(0.01), 0.5, epsilon = 1e-9);
        }
    }

    /// First and last point of every fragment.
    fn break_points(fragments: &[Path]) -> Vec<Point2> {
        fragments
            .iter()
            .flat_map(Path::subpaths)
            .flat_map(|s| [s.start, s.pieces.last().map_or(s.start, |p| p.segment.end())])
            .collect()
    }

    #[test]
    fn slice_breaks_circle_twice() {
        crate::test_log::init();
        let out = run(BoolOp::Slice, &[CIRCLE, "M-2,0.5 L2,0.5"]).unwrap();
        let fragments = out.fragments(BoolOp::Slice);
        assert_eq!(fragments.len(), 2);
        let circle = parse_path_data(CIRCLE).unwrap();
        let total: f64 = fragments.iter().map(|p| p.length(0.0001)).sum();
        assert_abs_diff_eq!(total, circle.length(0.0001), epsilon = 1e-3);
    }

    #[test]
    fn slice_breaks_land_on_the_circle() {
        crate::test_log::init();
        let out = run(BoolOp::Slice, &[CIRCLE, "M-2,0.5 L2,0.5"]).unwrap();
        let fragments = out.fragments(BoolOp::Slice);
        let breaks = break_points(&fragments);
        assert_eq!(breaks.len(), 4);
        for p in breaks {
            assert_abs_diff_eq!(p.y, 0.5, epsilon = 1e-6);
            assert_abs_diff_eq!(p.x.abs(), 0.866, epsilon = 2e-3);
        }
    }

    #[test]
    fn slice_breaks_on_a_large_circle() {
        let large = "M50,0 C50,27.615 27.615,50 0,50 C-27.615,50 -50,27.615 -50,0 \
                     C-50,-27.615 -27.615,-50 0,-50 C27.615,-50 50,-27.615 50,0 Z";
        let out = run(BoolOp::Slice, &[large, "M-60,25 L60,25"]).unwrap();
        let fragments = out.fragments(BoolOp::Slice);
        assert_eq!(fragments.len(), 2);
        for p in break_points(&fragments) {
            assert_abs_diff_eq!(p.y, 25.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn slice_through_centre_breaks_at_the_sides() {
        let out = run(BoolOp::Slice, &[CIRCLE, "M-2,0 L2,0"]).unwrap();
        let fragments = out.fragments(BoolOp::Slice);
        assert_eq!(fragments.len(), 2);
        for p in break_points(&fragments) {
            assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
            assert_abs_diff_eq!(p.x.abs(), 1.0, epsilon = 1e-9);
        }
        let halves: Vec<f64> = fragments.iter().map(|f| f.length(0.0001)).collect();
        assert_abs_diff_eq!(halves[0], halves[1], epsilon = 1e-6);
    }

    #[test]
    fn disjoint_intersection_is_empty() {
        let err = run(BoolOp::Intersection, &[A, "M5,5 L6,5 L6,6 Z"]).err().unwrap();
        assert!(matches!(err, PathOpsError::Operation(OperationError::EmptyResult)));
    }

    #[test]
    fn selection_errors() {
        let err = run(BoolOp::Union, &[A]).err().unwrap();
        assert!(matches!(err, PathOpsError::Operation(OperationError::InvalidSelection(_))));
        let err = run(BoolOp::Difference, &[A, B, A]).err().unwrap();
        assert!(matches!(err, PathOpsError::Operation(OperationError::InvalidSelection(_))));
        let err = run(BoolOp::Union, &[A, "M3,3"]).err().unwrap();
        assert!(matches!(
            err,
            PathOpsError::Operation(OperationError::DegenerateOperand { index: 1 })
        ));
    }
}
