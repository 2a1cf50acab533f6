use tracing::{debug, info};

use crate::document::Document;
use crate::error::{OperationError, Result};
use crate::geometry::flatten::convert_even_lines;
use crate::math::{Point2, Transform2, TOLERANCE};
use crate::operations::simplify::{coalesce, simplify, SimplifyAccelerator, SimplifySettings};

use super::{apply, extract, Replacement};

/// Flattening tolerance for measuring the selection bounds.
const BOUNDS_TOLERANCE: f64 = 0.01;

/// Simplifies every path in the selection, descending into groups.
///
/// The threshold is relative to the diagonal of the selection's bounding
/// box, so the same setting suits small and large drawings.
#[derive(Default)]
pub struct SimplifyDriver {
    settings: SimplifySettings,
}

impl SimplifyDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SimplifySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Simplifies the selection, growing the threshold when the command is
    /// repeated quickly.
    ///
    /// # Errors
    ///
    /// See [`SimplifyDriver::execute_with_threshold`].
    pub fn execute<D: Document>(
        &self,
        doc: &mut D,
        accelerator: &mut SimplifyAccelerator,
    ) -> Result<Vec<D::Handle>> {
        let threshold = accelerator.threshold(&self.settings);
        debug!(threshold, multiplier = accelerator.multiplier(), "simplify threshold");
        self.execute_with_threshold(doc, threshold)
    }

    /// Simplifies the selection with a threshold given as a fraction of the
    /// selection's bounding box diagonal.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidSelection` for an empty selection and
    /// `OperationError::NothingToDo` when it holds no paths.
    pub fn execute_with_threshold<D: Document>(
        &self,
        doc: &mut D,
        threshold: f64,
    ) -> Result<Vec<D::Handle>> {
        let selection = doc.selection();
        if selection.is_empty() {
            return Err(
                OperationError::InvalidSelection("Select path(s) to simplify.".to_owned()).into(),
            );
        }

        let mut leaves = Vec::new();
        for &item in &selection {
            collect_paths(doc, item, &mut leaves);
        }
        let size = selection_diagonal(doc, &leaves);

        let mut replacements = Vec::new();
        for &item in &leaves {
            let Some(path) = extract(doc, item, false) else {
                continue;
            };
            let local = threshold * size / scale_factor(&doc.document_transform(item));
            let result = if self.settings.just_coalesce {
                coalesce(&path, local)
            } else {
                simplify(&convert_even_lines(&path, local), local)
            };
            if !result.is_drawable() {
                debug!(?item, "simplified path draws nothing, left untouched");
                continue;
            }
            debug!(?item, before = path.len(), after = result.len(), "path simplified");
            replacements.push(Replacement {
                item,
                path: Some(result),
                style: doc.style(item),
            });
        }

        if replacements.is_empty() {
            return Err(
                OperationError::NothingToDo("No paths to simplify in the selection.".to_owned())
                    .into(),
            );
        }
        let count = replacements.len();
        let next = apply(doc, &selection, replacements);
        doc.commit("Simplify");
        info!(objects = count, threshold, size, "selection simplified");
        Ok(next)
    }
}

/// Collects `item` or, for groups, the paths below it.
fn collect_paths<D: Document>(doc: &D, item: D::Handle, out: &mut Vec<D::Handle>) {
    if doc.kind(item).has_outline() {
        out.push(item);
        return;
    }
    for child in doc.children(item) {
        collect_paths(doc, child, out);
    }
}

/// Diagonal of the bounding box of `items` in document coordinates.
fn selection_diagonal<D: Document>(doc: &D, items: &[D::Handle]) -> f64 {
    let bounds = items
        .iter()
        .filter_map(|&item| extract(doc, item, true)?.bounds(BOUNDS_TOLERANCE))
        .reduce(|(lo, hi), (a, b)| {
            (
                Point2::new(lo.x.min(a.x), lo.y.min(a.y)),
                Point2::new(hi.x.max(b.x), hi.y.max(b.y)),
            )
        });
    bounds.map_or(0.0, |(lo, hi)| (hi - lo).norm())
}

/// Average linear scaling of a transform.
fn scale_factor(transform: &Transform2) -> f64 {
    let m = transform.matrix();
    let det = (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]).abs();
    if det > TOLERANCE {
        det.sqrt()
    } else {
        1.0
    }
}
