//! Commands that run the path operations on a document selection.
//!
//! Each driver validates the selection and computes every result before it
//! touches the document, then replaces the source objects and commits once.

mod boolean;
mod offset;
mod simplify;

pub use boolean::BooleanOpDriver;
pub use offset::{OffsetDriver, OutlineDriver};
pub use simplify::SimplifyDriver;

use crate::document::{Document, NewPath, Style};
use crate::geometry::svg_data::write_path_data;
use crate::geometry::{Path, PathBuilder};

/// Builds the outline of `item`, in document coordinates when
/// `to_document` is set and in the item's own coordinates otherwise.
fn extract<D: Document>(doc: &D, item: D::Handle, to_document: bool) -> Option<Path> {
    let instructions = doc.outline(item)?;
    let builder = if to_document {
        PathBuilder::with_transform(doc.document_transform(item))
    } else {
        PathBuilder::new()
    };
    builder.build(&instructions)
}

/// Replaces `item` by a path in the same slot, with the same id and
/// transform. With no path the item is only deleted.
fn replace<D: Document>(
    doc: &mut D,
    item: D::Handle,
    path: Option<&Path>,
    style: Style,
) -> Option<D::Handle> {
    let parent = doc.parent(item);
    let position = doc.position(item).unwrap_or(0);
    let id = doc.id(item);
    let transform = doc.item_transform(item);
    doc.delete(item);
    let path = path?;
    Some(doc.create_path(NewPath {
        data: write_path_data(path),
        style,
        parent,
        position,
        id,
        transform,
    }))
}

/// A computed single-object result waiting to be written.
struct Replacement<H> {
    item: H,
    path: Option<Path>,
    style: Style,
}

/// Writes the replacements and returns the new selection: selected
/// objects are swapped for their replacements, deleted ones dropped.
fn apply<D: Document>(
    doc: &mut D,
    selection: &[D::Handle],
    replacements: Vec<Replacement<D::Handle>>,
) -> Vec<D::Handle> {
    let mut swapped = Vec::with_capacity(replacements.len());
    for Replacement { item, path, style } in replacements {
        let created = replace(doc, item, path.as_ref(), style);
        swapped.push((item, created));
    }
    let mut next = Vec::with_capacity(selection.len());
    for &item in selection {
        match swapped.iter().find(|(old, _)| *old == item) {
            Some((_, Some(created))) => next.push(*created),
            Some((_, None)) => {}
            None => next.push(item),
        }
    }
    doc.set_selection(&next);
    next
}
