//! The surrounding object model, as seen by the operation drivers.
//!
//! Hosts implement [`Document`] over their own scene graph. [`SceneTree`] is
//! a self-contained implementation for embedders without one, and for tests.

pub mod style;
pub mod tree;
pub mod z_order;

pub use style::Style;
pub use tree::{NodeData, NodeId, SceneTree};

use std::fmt::Debug;
use std::hash::Hash;

use crate::geometry::PathInstruction;
use crate::math::Transform2;

/// What an object is, as far as path operations care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Group,
    /// Anything with a path outline: paths, rectangles, ellipses, stars.
    Shape,
    Text,
    /// Objects without an outline, such as images.
    Other,
}

impl ItemKind {
    /// Whether the object provides an outline path.
    #[must_use]
    pub fn has_outline(self) -> bool {
        matches!(self, Self::Shape | Self::Text)
    }
}

/// Description of a path object to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPath<H> {
    /// SVG path data.
    pub data: String,
    pub style: Style,
    /// `None` inserts into the top level of the document.
    pub parent: Option<H>,
    /// Index among the parent's children.
    pub position: usize,
    /// Requested id; the host assigns a fresh one when missing or taken.
    pub id: Option<String>,
    pub transform: Transform2,
}

/// Host collaborator contract.
///
/// Drivers read everything they need before the first mutating call, so a
/// failing operation leaves the document untouched. All mutations of one
/// operation are followed by a single [`Document::commit`].
pub trait Document {
    type Handle: Copy + Eq + Hash + Debug;

    fn kind(&self, item: Self::Handle) -> ItemKind;

    /// Outline of the object in its own coordinates, before its transform.
    fn outline(&self, item: Self::Handle) -> Option<Vec<PathInstruction>>;

    /// The object's own transform, relative to its parent.
    fn item_transform(&self, item: Self::Handle) -> Transform2;

    /// Transform from the object's coordinates to document coordinates.
    fn document_transform(&self, item: Self::Handle) -> Transform2;

    /// Effective style of the object.
    fn style(&self, item: Self::Handle) -> Style;

    fn id(&self, item: Self::Handle) -> Option<String>;

    fn parent(&self, item: Self::Handle) -> Option<Self::Handle>;

    /// Children in paint order, bottom first.
    fn children(&self, item: Self::Handle) -> Vec<Self::Handle>;

    /// Top-level objects in paint order, bottom first.
    fn roots(&self) -> Vec<Self::Handle>;

    fn selection(&self) -> Vec<Self::Handle>;

    fn set_selection(&mut self, items: &[Self::Handle]);

    fn create_path(&mut self, path: NewPath<Self::Handle>) -> Self::Handle;

    fn delete(&mut self, item: Self::Handle);

    /// Records everything since the last commit as one undoable step.
    fn commit(&mut self, label: &str);

    /// Index of the object among its siblings.
    fn position(&self, item: Self::Handle) -> Option<usize> {
        let siblings = match self.parent(item) {
            Some(parent) => self.children(parent),
            None => self.roots(),
        };
        siblings.iter().position(|&s| s == item)
    }
}
