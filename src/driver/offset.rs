use tracing::{debug, info};

use crate::document::Document;
use crate::error::{OperationError, PathOpsError, Result};
use crate::operations::offset::{OffsetDirection, OffsetSettings, PathOffset, PathOutline};

use super::{apply, extract, Replacement};

/// Insets or outsets every selected path by a fixed distance.
///
/// Each object keeps its style, id, transform and slot. An inset that
/// consumes an object deletes it.
pub struct OffsetDriver {
    direction: OffsetDirection,
    width: Option<f64>,
    settings: OffsetSettings,
}

impl OffsetDriver {
    #[must_use]
    pub fn new(direction: OffsetDirection) -> Self {
        Self {
            direction,
            width: None,
            settings: OffsetSettings::default(),
        }
    }

    /// Sets the offset distance, in the objects' own units.
    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: OffsetSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Offsets the selection and returns the new selection.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidSelection` for an empty selection and
    /// `OperationError::NothingToDo` when no selected object has an outline.
    pub fn execute<D: Document>(&self, doc: &mut D) -> Result<Vec<D::Handle>> {
        let label = self.direction.label();
        let selection = doc.selection();
        if selection.is_empty() {
            return Err(
                OperationError::InvalidSelection("Select path(s) to inset/outset.".to_owned()).into(),
            );
        }

        let mut replacements = Vec::new();
        for &item in &selection {
            if !doc.kind(item).has_outline() {
                continue;
            }
            let Some(path) = extract(doc, item, false) else {
                continue;
            };
            let style = doc.style(item);
            let stroke = style.stroke_style();
            let mut offset = PathOffset::new(path, self.direction)
                .with_fill_rule(style.fill_rule())
                .with_join(stroke.join, stroke.miter_limit)
                .with_settings(self.settings);
            if let Some(width) = self.width {
                offset = offset.with_width(width);
            }
            let path = match offset.execute() {
                Ok(path) => Some(path),
                Err(PathOpsError::Operation(OperationError::EmptyResult)) => None,
                Err(PathOpsError::Operation(OperationError::DegenerateOperand { .. })) => continue,
                Err(err) => return Err(err),
            };
            replacements.push(Replacement { item, path, style });
        }

        if replacements.is_empty() {
            return Err(OperationError::NothingToDo(
                "No paths to inset/outset in the selection.".to_owned(),
            )
            .into());
        }
        let count = replacements.len();
        let next = apply(doc, &selection, replacements);
        doc.commit(label);
        info!(op = label, objects = count, "offset applied");
        Ok(next)
    }
}

/// Converts the stroke of every selected path into a filled outline.
///
/// Objects without a stroke are skipped. The stroke paint becomes the fill
/// of the new object.
#[derive(Default)]
pub struct OutlineDriver {
    settings: OffsetSettings,
}

impl OutlineDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(mut self, settings: OffsetSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Outlines the selection and returns the new selection.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidSelection` for an empty selection and
    /// `OperationError::NothingToDo` when no selected object has a stroke.
    pub fn execute<D: Document>(&self, doc: &mut D) -> Result<Vec<D::Handle>> {
        let selection = doc.selection();
        if selection.is_empty() {
            return Err(
                OperationError::InvalidSelection("Select path(s) to outline.".to_owned()).into(),
            );
        }

        let mut replacements = Vec::new();
        for &item in &selection {
            let style = doc.style(item);
            if !doc.kind(item).has_outline() || !style.has_stroke() {
                continue;
            }
            let Some(path) = extract(doc, item, false) else {
                continue;
            };
            match PathOutline::new(path, style.stroke_style())
                .with_settings(self.settings)
                .execute()
            {
                Ok(path) => replacements.push(Replacement {
                    item,
                    path: Some(path),
                    style: style.outline_fill(),
                }),
                Err(PathOpsError::Operation(
                    OperationError::EmptyResult | OperationError::DegenerateOperand { .. },
                )) => {
                    debug!(?item, "stroke has no outline, left untouched");
                }
                Err(err) => return Err(err),
            }
        }

        if replacements.is_empty() {
            return Err(OperationError::NothingToDo(
                "No stroked paths to outline in the selection.".to_owned(),
            )
            .into());
        }
        let count = replacements.len();
        let next = apply(doc, &selection, replacements);
        doc.commit("Convert stroke to path");
        info!(objects = count, "strokes outlined");
        Ok(next)
    }
}
