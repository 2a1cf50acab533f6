//! Paint order of objects in the document tree.

use std::cmp::Ordering;

use crate::error::{OperationError, Result};

use super::Document;

/// The object followed by its ancestors, innermost first.
pub fn ancestors<D: Document + ?Sized>(doc: &D, item: D::Handle) -> Vec<D::Handle> {
    let mut chain = vec![item];
    let mut current = item;
    while let Some(parent) = doc.parent(current) {
        chain.push(parent);
        current = parent;
    }
    chain
}

/// Whether `ancestor` is `item` or contains it.
pub fn is_ancestor<D: Document + ?Sized>(doc: &D, ancestor: D::Handle, item: D::Handle) -> bool {
    let mut current = Some(item);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        current = doc.parent(node);
    }
    false
}

/// Compares the paint order of two objects; `Less` means `a` is drawn
/// below `b`.
///
/// A group is below its descendants. Unrelated objects are ordered by the
/// children of their lowest common ancestor that lead to them.
///
/// # Errors
///
/// Returns `OperationError::AmbiguousZOrder` if the objects share no
/// ancestor or the tree is inconsistent.
pub fn compare_position<D: Document + ?Sized>(
    doc: &D,
    a: D::Handle,
    b: D::Handle,
) -> Result<Ordering> {
    if a == b {
        return Ok(Ordering::Equal);
    }
    if is_ancestor(doc, a, b) {
        return Ok(Ordering::Less);
    }
    if is_ancestor(doc, b, a) {
        return Ok(Ordering::Greater);
    }

    let chain_a = ancestors(doc, a);
    let chain_b = ancestors(doc, b);
    let top_a = chain_a.last().copied();
    let top_b = chain_b.last().copied();

    let (siblings, branch_a, branch_b) = match chain_a
        .iter()
        .enumerate()
        .find(|(_, node)| chain_b.contains(node))
    {
        Some((i, &common)) => {
            let j = chain_b
                .iter()
                .position(|&n| n == common)
                .ok_or(OperationError::AmbiguousZOrder)?;
            (doc.children(common), chain_a[i - 1], chain_b[j - 1])
        }
        // Separate top-level subtrees.
        None => match (top_a, top_b) {
            (Some(ta), Some(tb)) => (doc.roots(), ta, tb),
            _ => return Err(OperationError::AmbiguousZOrder.into()),
        },
    };

    let index_a = siblings.iter().position(|&s| s == branch_a);
    let index_b = siblings.iter().position(|&s| s == branch_b);
    match (index_a, index_b) {
        (Some(ia), Some(ib)) => Ok(ia.cmp(&ib)),
        _ => Err(OperationError::AmbiguousZOrder.into()),
    }
}

/// Orders two objects as `(bottom, top)`.
///
/// # Errors
///
/// Returns `OperationError::AmbiguousZOrder` if the order cannot be found.
pub fn bottom_and_top<D: Document + ?Sized>(
    doc: &D,
    a: D::Handle,
    b: D::Handle,
) -> Result<(D::Handle, D::Handle)> {
    match compare_position(doc, a, b)? {
        Ordering::Greater => Ok((b, a)),
        _ => Ok((a, b)),
    }
}

/// The bottom-most of `items`.
///
/// # Errors
///
/// Returns `OperationError::AmbiguousZOrder` if two items cannot be ordered.
pub fn bottom_most<D: Document + ?Sized>(doc: &D, items: &[D::Handle]) -> Result<Option<D::Handle>> {
    let mut best: Option<D::Handle> = None;
    for &item in items {
        best = match best {
            Some(current) if compare_position(doc, current, item)? != Ordering::Greater => {
                Some(current)
            }
            _ => Some(item),
        };
    }
    Ok(best)
}
