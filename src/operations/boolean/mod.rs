//! Boolean operations between filled paths: union, intersection,
//! difference, exclusion, division and path cut.

mod engine;
mod select;

pub use select::BoolOp;

use crate::error::Result;
use crate::geometry::{Nesting, Path};
use crate::shape::{FillRule, ShapeParams};

use engine::boolean_execute;

/// Tunables of the boolean pipeline.
#[derive(Debug, Clone, Copy)]
pub struct BoolOpSettings {
    /// Flattening tolerance for the set operations.
    pub tolerance: f64,
    /// Coarser flattening tolerance used by cut and slice.
    pub cut_tolerance: f64,
    pub shape: ShapeParams,
    /// Whether the driver deletes the inputs when the result is empty.
    pub delete_inputs_on_empty: bool,
}

impl Default for BoolOpSettings {
    fn default() -> Self {
        Self {
            tolerance: 0.1,
            cut_tolerance: 1.0,
            shape: ShapeParams::default(),
            delete_inputs_on_empty: true,
        }
    }
}

impl BoolOpSettings {
    /// Flattening tolerance to use for `op`.
    #[must_use]
    pub fn tolerance_for(&self, op: BoolOp) -> f64 {
        if op.is_cutting() {
            self.cut_tolerance
        } else {
            self.tolerance
        }
    }
}

/// One input of a boolean operation, in document coordinates.
#[derive(Debug, Clone)]
pub struct Operand {
    pub path: Path,
    pub fill_rule: FillRule,
}

impl Operand {
    #[must_use]
    pub fn new(path: Path, fill_rule: FillRule) -> Self {
        Self { path, fill_rule }
    }
}

/// Result of a boolean operation.
#[derive(Debug, Clone)]
pub struct BooleanOutput {
    pub path: Path,
    /// Parent of every subpath, set for cuts so fragments keep their holes.
    pub nesting: Option<Nesting>,
}

/// Combines paths given bottom first.
pub struct BooleanOperation {
    operands: Vec<Operand>,
    op: BoolOp,
    settings: BoolOpSettings,
}

impl BooleanOperation {
    /// Creates a new boolean operation with default settings.
    #[must_use]
    pub fn new(operands: Vec<Operand>, op: BoolOp) -> Self {
        Self {
            operands,
            op,
            settings: BoolOpSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: BoolOpSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidSelection` for a wrong operand count,
    /// `OperationError::DegenerateOperand` when an input draws nothing and
    /// `OperationError::EmptyResult` when nothing is left.
    pub fn execute(&self) -> Result<BooleanOutput> {
        boolean_execute(&self.operands, self.op, &self.settings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::svg_data::parse_path_data;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cutting_operations_use_coarse_tolerance() {
        let settings = BoolOpSettings::default();
        assert_abs_diff_eq!(settings.tolerance_for(BoolOp::Union), 0.1);
        assert_abs_diff_eq!(settings.tolerance_for(BoolOp::Cut), 1.0);
        assert_abs_diff_eq!(settings.tolerance_for(BoolOp::Slice), 1.0);
    }

    #[test]
    fn operation_runs_with_custom_settings() {
        let operands = vec![
            Operand::new(parse_path_data("M0,0 L2,0 L2,2 L0,2 Z").unwrap(), FillRule::NonZero),
            Operand::new(parse_path_data("M1,1 L3,1 L3,3 L1,3 Z").unwrap(), FillRule::EvenOdd),
        ];
        let settings = BoolOpSettings {
            tolerance: 0.01,
            ..BoolOpSettings::default()
        };
        let out = BooleanOperation::new(operands, BoolOp::Difference)
            .with_settings(settings)
            .execute()
            .unwrap();
        assert!(out.nesting.is_none());
        assert_abs_diff_eq!(out.path.area(0.01), 3.0, epsilon = 1e-9);
    }
}
