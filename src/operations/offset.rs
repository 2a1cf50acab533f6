//! Inset, outset and stroke outlining of single paths.

use tracing::{debug, info};

use crate::error::{OperationError, Result};
use crate::geometry::flatten::convert_even_lines;
use crate::geometry::Path;
use crate::shape::{FillRule, JoinType, Shape, ShapeParams, StrokeStyle};

use super::simplify::simplify;

/// Settings of the inset/outset and outline commands.
#[derive(Debug, Clone, Copy)]
pub struct OffsetSettings {
    /// Offset distance used when none is given.
    pub default_width: f64,
    /// Flattening tolerance for the source outline.
    pub tolerance: f64,
    /// Widths below this are raised to it.
    pub min_width: f64,
    pub shape: ShapeParams,
}

impl Default for OffsetSettings {
    fn default() -> Self {
        Self {
            default_width: 1.0,
            tolerance: 0.03,
            min_width: 0.1,
            shape: ShapeParams::default(),
        }
    }
}

/// Whether an offset grows or shrinks the filled area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetDirection {
    Outset,
    Inset,
}

impl OffsetDirection {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Outset => "Outset path",
            Self::Inset => "Inset path",
        }
    }
}

/// Moves the outline of a filled path outwards or inwards.
pub struct PathOffset {
    path: Path,
    direction: OffsetDirection,
    fill_rule: FillRule,
    width: Option<f64>,
    join: JoinType,
    miter_limit: f64,
    settings: OffsetSettings,
}

impl PathOffset {
    /// Creates an offset with the default width and miter joins.
    #[must_use]
    pub fn new(path: Path, direction: OffsetDirection) -> Self {
        Self {
            path,
            direction,
            fill_rule: FillRule::NonZero,
            width: None,
            join: JoinType::Miter,
            miter_limit: StrokeStyle::default().miter_limit,
            settings: OffsetSettings::default(),
        }
    }

    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    /// Sets the corner style; `miter_limit` is relative to the width.
    #[must_use]
    pub fn with_join(mut self, join: JoinType, miter_limit: f64) -> Self {
        self.join = join;
        self.miter_limit = miter_limit;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: OffsetSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Offset distance actually applied.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
            .unwrap_or(self.settings.default_width)
            .max(self.settings.min_width)
    }

    /// Executes the offset.
    ///
    /// The result is resampled and simplified at the offset width, capped
    /// at one unit.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::DegenerateOperand` when the path draws
    /// nothing and `OperationError::EmptyResult` when an inset consumes the
    /// whole area.
    pub fn execute(&self) -> Result<Path> {
        if !self.path.is_drawable() {
            return Err(OperationError::DegenerateOperand { index: 0 }.into());
        }
        let width = self.width();
        let distance = match self.direction {
            OffsetDirection::Outset => width,
            OffsetDirection::Inset => -width,
        };
        let params = &self.settings.shape;

        let mut source = Shape::new();
        source.fill(&self.path, 0, true, self.settings.tolerance);
        let area = source.convert_to_shape(self.fill_rule, params)?;
        let offset = area.make_offset(distance, self.join, self.miter_limit, params)?;
        let traced = offset.convert_to_forme(&[])?;
        if !traced.is_drawable() {
            info!(op = self.direction.label(), width, "offset consumed the whole path");
            return Err(OperationError::EmptyResult.into());
        }

        let step = width.min(1.0);
        let result = simplify(&convert_even_lines(&traced, step), step);
        debug!(
            op = self.direction.label(),
            width,
            traced = traced.len(),
            commands = result.len(),
            "offset complete"
        );
        Ok(result)
    }
}

/// Converts the stroke of a path into a filled outline.
pub struct PathOutline {
    path: Path,
    style: StrokeStyle,
    settings: OffsetSettings,
}

impl PathOutline {
    #[must_use]
    pub fn new(path: Path, style: StrokeStyle) -> Self {
        Self {
            path,
            style,
            settings: OffsetSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: OffsetSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Executes the outline.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::DegenerateOperand` when the path draws
    /// nothing and `OperationError::EmptyResult` when the stroke covers no
    /// area.
    pub fn execute(&self) -> Result<Path> {
        if !self.path.is_drawable() {
            return Err(OperationError::DegenerateOperand { index: 0 }.into());
        }
        let style = StrokeStyle {
            width: self.style.width.max(self.settings.min_width),
            ..self.style
        };
        let stroke = Shape::stroke(
            &self.path,
            &style,
            self.settings.tolerance,
            &self.settings.shape,
        )?;
        let result = stroke.convert_to_forme(&[])?;
        if !result.is_drawable() {
            return Err(OperationError::EmptyResult.into());
        }
        debug!(width = style.width, commands = result.len(), "outline complete");
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PathOpsError;
    use crate::geometry::svg_data::parse_path_data;
    use crate::shape::LineCap;
    use approx::assert_abs_diff_eq;

    const SQUARE: &str = "M0,0 L2,0 L2,2 L0,2 Z";

    fn offset(direction: OffsetDirection, width: f64) -> Result<Path> {
        PathOffset::new(parse_path_data(SQUARE).unwrap(), direction)
            .with_width(width)
            .execute()
    }

    #[test]
    fn outset_grows_square() {
        let path = offset(OffsetDirection::Outset, 0.5).unwrap();
        assert_abs_diff_eq!(path.area(0.01), 9.0, epsilon = 1e-6);
    }

    #[test]
    fn inset_shrinks_square() {
        let path = offset(OffsetDirection::Inset, 0.5).unwrap();
        assert_abs_diff_eq!(path.area(0.01), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn inset_past_the_middle_is_empty() {
        let err = offset(OffsetDirection::Inset, 1.5).err().unwrap();
        assert!(matches!(err, PathOpsError::Operation(OperationError::EmptyResult)));
    }

    #[test]
    fn width_defaults_and_clamps() {
        let path = parse_path_data(SQUARE).unwrap();
        let op = PathOffset::new(path.clone(), OffsetDirection::Outset);
        assert_abs_diff_eq!(op.width(), 1.0);
        let op = PathOffset::new(path, OffsetDirection::Outset).with_width(0.01);
        assert_abs_diff_eq!(op.width(), 0.1);
    }

    #[test]
    fn degenerate_path_is_rejected() {
        let err = PathOffset::new(parse_path_data("M1,1").unwrap(), OffsetDirection::Outset)
            .execute()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PathOpsError::Operation(OperationError::DegenerateOperand { index: 0 })
        ));
    }

    #[test]
    fn outline_of_open_line() {
        let line = parse_path_data("M0,0 L4,0").unwrap();
        let butt = PathOutline::new(
            line.clone(),
            StrokeStyle {
                width: 2.0,
                ..StrokeStyle::default()
            },
        )
        .execute()
        .unwrap();
        assert_abs_diff_eq!(butt.area(0.01), 8.0, epsilon = 1e-6);

        let square = PathOutline::new(
            line,
            StrokeStyle {
                width: 2.0,
                cap: LineCap::Square,
                ..StrokeStyle::default()
            },
        )
        .execute()
        .unwrap();
        assert_abs_diff_eq!(square.area(0.01), 12.0, epsilon = 1e-6);
    }

    #[test]
    fn outline_of_closed_square_is_a_frame() {
        let frame = PathOutline::new(
            parse_path_data(SQUARE).unwrap(),
            StrokeStyle {
                width: 0.5,
                ..StrokeStyle::default()
            },
        )
        .execute()
        .unwrap();
        // 2.5 x 2.5 outside minus 1.5 x 1.5 hole.
        assert_abs_diff_eq!(frame.area(0.01), 4.0, epsilon = 1e-6);
        assert_eq!(frame.subpaths().len(), 2);
    }
}
