use tracing::{debug, info, warn};

use crate::document::z_order::{bottom_and_top, bottom_most};
use crate::document::{Document, NewPath};
use crate::error::{OperationError, PathOpsError, Result};
use crate::geometry::svg_data::write_path_data;
use crate::geometry::Path;
use crate::math::Transform2;
use crate::operations::boolean::{BoolOp, BoolOpSettings, BooleanOperation, Operand};

use super::extract;

/// Runs a boolean operation on the selected objects and replaces them
/// with the result.
///
/// The result takes the slot, id and style of the bottom-most operand.
/// Cut and slice produce one object per fragment; the largest cut piece
/// and the longest slice piece keep the source id.
pub struct BooleanOpDriver {
    op: BoolOp,
    settings: BoolOpSettings,
}

impl BooleanOpDriver {
    #[must_use]
    pub fn new(op: BoolOp) -> Self {
        Self {
            op,
            settings: BoolOpSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: BoolOpSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Executes the operation on the document selection and returns the
    /// created objects, which become the new selection.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidSelection`,
    /// `OperationError::AmbiguousZOrder` or
    /// `OperationError::DegenerateOperand` without touching the document.
    /// Returns `OperationError::EmptyResult` after deleting the operands,
    /// unless the settings keep them.
    pub fn execute<D: Document>(&self, doc: &mut D) -> Result<Vec<D::Handle>> {
        let op = self.op;
        let selection = doc.selection();

        // Phase 1: selection
        if selection.len() < 2 {
            return Err(OperationError::InvalidSelection(
                "Select at least 2 paths to perform a boolean operation.".to_owned(),
            )
            .into());
        }
        if op.is_binary() && selection.len() > 2 {
            return Err(OperationError::InvalidSelection(
                "Select exactly 2 paths to perform difference, exclusion, division, or path cut."
                    .to_owned(),
            )
            .into());
        }
        if selection.iter().any(|&item| !doc.kind(item).has_outline()) {
            return Err(OperationError::InvalidSelection(
                "One of the objects is not a path, cannot perform boolean operation.".to_owned(),
            )
            .into());
        }

        // Phase 2: z-order
        let (items, source) = if op.is_binary() {
            let (bottom, top) = bottom_and_top(doc, selection[0], selection[1])?;
            (vec![bottom, top], bottom)
        } else {
            let bottom = bottom_most(doc, &selection)?.ok_or(OperationError::AmbiguousZOrder)?;
            (selection.clone(), bottom)
        };

        // Phase 3: operands in document coordinates
        let operands = items
            .iter()
            .enumerate()
            .map(|(index, &item)| {
                let path = extract(doc, item, true)
                    .ok_or(OperationError::DegenerateOperand { index })?;
                Ok(Operand::new(path, doc.style(item).fill_rule()))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(op = op.label(), operands = operands.len(), "operands extracted");

        // Phase 4: geometry
        let output = match BooleanOperation::new(operands, op)
            .with_settings(self.settings)
            .execute()
        {
            Ok(output) => output,
            Err(PathOpsError::Operation(OperationError::EmptyResult)) => {
                if self.settings.delete_inputs_on_empty {
                    for &item in &items {
                        doc.delete(item);
                    }
                    doc.set_selection(&[]);
                    doc.commit(op.label());
                }
                info!(
                    op = op.label(),
                    deleted = self.settings.delete_inputs_on_empty,
                    "boolean result is empty"
                );
                return Err(OperationError::EmptyResult.into());
            }
            Err(err) => return Err(err),
        };

        // Phase 5: write the result into the source's slot
        let fragments = output.fragments(op);
        let keeper = self.keeper(&fragments);
        let parent = doc.parent(source);
        let id = doc.id(source);
        let mut style = doc.style(source);
        if op == BoolOp::Slice {
            style.set("fill", "none");
        }
        let parent_transform = parent.map_or_else(Transform2::identity, |p| doc.document_transform(p));
        let transform = parent_transform.try_inverse().unwrap_or_else(|| {
            warn!(op = op.label(), "parent transform is singular, writing document coordinates");
            Transform2::identity()
        });

        for &item in items.iter().filter(|&&item| item != source) {
            doc.delete(item);
        }
        let position = doc.position(source).unwrap_or(0);
        doc.delete(source);

        let created: Vec<D::Handle> = fragments
            .iter()
            .enumerate()
            .map(|(k, fragment)| {
                doc.create_path(NewPath {
                    data: write_path_data(fragment),
                    style: style.clone(),
                    parent,
                    position: position + k,
                    id: if k == keeper { id.clone() } else { None },
                    transform,
                })
            })
            .collect();

        // Phase 6: commit
        doc.set_selection(&created);
        doc.commit(op.label());
        info!(op = op.label(), objects = created.len(), "boolean operation applied");
        Ok(created)
    }

    /// Index of the fragment that keeps the source id.
    fn keeper(&self, fragments: &[Path]) -> usize {
        let tolerance = self.settings.tolerance;
        let measure = |path: &Path| match self.op {
            BoolOp::Cut => path.area(tolerance).abs(),
            BoolOp::Slice => path.length(tolerance),
            _ => 0.0,
        };
        fragments
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (k, path)| {
                let value = measure(path);
                if value > best.1 {
                    (k, value)
                } else {
                    best
                }
            })
            .0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::document::{ItemKind, NodeId, SceneTree, Style};
    use crate::math::transform_from_coefficients;
    use approx::assert_abs_diff_eq;

    fn add(tree: &mut SceneTree, parent: Option<NodeId>, d: &str, style: &str) -> NodeId {
        tree.add_path_data(parent, d, Style::parse(style), Transform2::identity())
            .unwrap()
    }

    fn area(tree: &SceneTree, item: NodeId) -> f64 {
        let path = tree.path(item).unwrap();
        path.transformed(&tree.document_transform(item)).area(0.01)
    }

    const A: &str = "M0,0 L1,0 L1,1 L0,1 Z";
    const B: &str = "M0.5,0.5 L1.5,0.5 L1.5,1.5 L0.5,1.5 Z";

    #[test]
    fn union_replaces_operands_in_bottom_slot() {
        let mut tree = SceneTree::new();
        let below = add(&mut tree, None, "M5,5 L6,5 L6,6 Z", "fill:green");
        let a = add(&mut tree, None, A, "fill:red");
        let b = add(&mut tree, None, B, "fill:blue");
        let a_id = tree.id(a);
        tree.set_selection(&[b, a]);

        let created = BooleanOpDriver::new(BoolOp::Union).execute(&mut tree).unwrap();
        assert_eq!(created.len(), 1);
        let result = created[0];
        assert_eq!(tree.id(result), a_id);
        assert_eq!(tree.style(result).get("fill"), Some("red"));
        assert_eq!(tree.roots(), vec![below, result]);
        assert_eq!(tree.selection(), created);
        assert_eq!(tree.commits(), ["Union"]);
        assert_abs_diff_eq!(area(&tree, result), 1.75, epsilon = 1e-9);
    }

    #[test]
    fn difference_subtracts_top_from_bottom_whatever_the_selection_order() {
        let mut tree = SceneTree::new();
        let a = add(&mut tree, None, A, "fill:red");
        let b = add(&mut tree, None, B, "fill:blue");
        tree.set_selection(&[b, a]);
        let created = BooleanOpDriver::new(BoolOp::Difference).execute(&mut tree).unwrap();
        assert_abs_diff_eq!(area(&tree, created[0]), 0.75, epsilon = 1e-9);
        assert_eq!(tree.style(created[0]).get("fill"), Some("red"));
    }

    #[test]
    fn operands_keep_their_own_fill_rule() {
        crate::test_log::init();
        // Both contours run the same way: a ring under even-odd, a solid
        // square under nonzero.
        let ring = "M0,0 L4,0 L4,4 L0,4 Z M1,1 L3,1 L3,3 L1,3 Z";
        let far = "M10,0 L11,0 L11,1 L10,1 Z";
        let right = "M2,-1 L5,-1 L5,5 L2,5 Z";
        let run = |op: BoolOp, top: &str, rule: &str| {
            let mut tree = SceneTree::new();
            let bottom = add(&mut tree, None, ring, rule);
            let top = add(&mut tree, None, top, "fill-rule:nonzero");
            tree.set_selection(&[bottom, top]);
            let created = BooleanOpDriver::new(op).execute(&mut tree).unwrap();
            area(&tree, created[0])
        };
        assert_abs_diff_eq!(run(BoolOp::Union, far, "fill-rule:evenodd"), 13.0, epsilon = 1e-9);
        assert_abs_diff_eq!(run(BoolOp::Union, far, "fill-rule:nonzero"), 17.0, epsilon = 1e-9);
        assert_abs_diff_eq!(run(BoolOp::Difference, right, "fill-rule:evenodd"), 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(run(BoolOp::Difference, right, "fill-rule:nonzero"), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn result_is_written_in_parent_coordinates() {
        let mut tree = SceneTree::new();
        let group = tree.add_group(
            None,
            Style::default(),
            transform_from_coefficients(2.0, 0.0, 0.0, 2.0, 0.0, 0.0),
        );
        let a = add(&mut tree, Some(group), A, "");
        let b = add(&mut tree, None, "M1,1 L3,1 L3,3 L1,3 Z", "");
        tree.set_selection(&[a, b]);
        let created = BooleanOpDriver::new(BoolOp::Intersection).execute(&mut tree).unwrap();
        let result = created[0];
        assert_eq!(tree.parent(result), Some(group));
        // The 2x2 image of A meets B in a 1x1 square.
        assert_abs_diff_eq!(area(&tree, result), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn cut_makes_one_object_per_piece() {
        let mut tree = SceneTree::new();
        let square = add(&mut tree, None, "M0,0 L4,0 L4,4 L0,4 Z", "fill:red");
        let line = add(&mut tree, None, "M1,-1 L1,5", "fill:none;stroke:black");
        let square_id = tree.id(square);
        tree.set_selection(&[line, square]);
        let created = BooleanOpDriver::new(BoolOp::Cut).execute(&mut tree).unwrap();
        assert_eq!(created.len(), 2);
        let areas: Vec<f64> = created.iter().map(|&c| area(&tree, c)).collect();
        assert_abs_diff_eq!(areas.iter().sum::<f64>(), 16.0, epsilon = 1e-9);
        let largest = if areas[0] > areas[1] { created[0] } else { created[1] };
        assert_eq!(tree.id(largest), square_id);
        assert!(created.iter().all(|&c| tree.kind(c) == ItemKind::Shape));
    }

    #[test]
    fn slice_removes_fill_from_pieces() {
        let mut tree = SceneTree::new();
        let square = add(&mut tree, None, "M0,0 L4,0 L4,4 L0,4 Z", "fill:red;stroke:black");
        let line = add(&mut tree, None, "M1,-1 L1,5", "");
        tree.set_selection(&[square, line]);
        let created = BooleanOpDriver::new(BoolOp::Slice).execute(&mut tree).unwrap();
        assert_eq!(created.len(), 2);
        for &c in &created {
            assert_eq!(tree.style(c).get("fill"), Some("none"));
            assert_eq!(tree.style(c).get("stroke"), Some("black"));
        }
    }

    #[test]
    fn empty_intersection_deletes_operands_by_default() {
        let mut tree = SceneTree::new();
        let a = add(&mut tree, None, A, "");
        let b = add(&mut tree, None, "M5,5 L6,5 L6,6 Z", "");
        tree.set_selection(&[a, b]);
        let err = BooleanOpDriver::new(BoolOp::Intersection)
            .execute(&mut tree)
            .err()
            .unwrap();
        assert!(matches!(err, PathOpsError::Operation(OperationError::EmptyResult)));
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.commits().len(), 1);
    }

    #[test]
    fn empty_intersection_can_keep_operands() {
        let mut tree = SceneTree::new();
        let a = add(&mut tree, None, A, "");
        let b = add(&mut tree, None, "M5,5 L6,5 L6,6 Z", "");
        tree.set_selection(&[a, b]);
        let settings = BoolOpSettings {
            delete_inputs_on_empty: false,
            ..BoolOpSettings::default()
        };
        let result = BooleanOpDriver::new(BoolOp::Intersection)
            .with_settings(settings)
            .execute(&mut tree);
        assert!(result.is_err());
        assert_eq!(tree.node_count(), 2);
        assert!(tree.commits().is_empty());
    }

    #[test]
    fn invalid_selections_leave_document_untouched() {
        let mut tree = SceneTree::new();
        let a = add(&mut tree, None, A, "");
        let b = add(&mut tree, None, B, "");
        let c = add(&mut tree, None, B, "");
        let image = tree.add_other(None, Style::default(), Transform2::identity());

        tree.set_selection(&[a]);
        let err = BooleanOpDriver::new(BoolOp::Union).execute(&mut tree).err().unwrap();
        assert_eq!(err.user_message(), "Select at least 2 paths to perform a boolean operation.");

        tree.set_selection(&[a, b, c]);
        assert!(BooleanOpDriver::new(BoolOp::Difference).execute(&mut tree).is_err());

        tree.set_selection(&[a, image]);
        assert!(BooleanOpDriver::new(BoolOp::Union).execute(&mut tree).is_err());

        let empty = tree.add_path(None, Path::new(), Style::default(), Transform2::identity());
        tree.set_selection(&[a, empty]);
        let err = BooleanOpDriver::new(BoolOp::Union).execute(&mut tree).err().unwrap();
        assert!(matches!(
            err,
            PathOpsError::Operation(OperationError::DegenerateOperand { index: 1 })
        ));

        assert_eq!(tree.node_count(), 5);
        assert!(tree.commits().is_empty());
    }
}
