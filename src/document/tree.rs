use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::svg_data::parse_path_data;
use crate::geometry::{Path, PathInstruction};
use crate::math::Transform2;

use super::{Document, ItemKind, NewPath, Style};

slotmap::new_key_type! {
    /// Identifier of a node in a [`SceneTree`].
    pub struct NodeId;
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    Group,
    Path(Path),
    /// Text, represented by the outline of its glyphs.
    Text(Path),
    Other,
}

/// A node of the scene tree.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub content: NodeContent,
    pub id: String,
    pub style: Style,
    pub transform: Transform2,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// In-memory document: a forest of groups and path objects with a
/// selection and a log of committed changes.
#[derive(Debug, Default)]
pub struct SceneTree {
    nodes: SlotMap<NodeId, NodeData>,
    roots: Vec<NodeId>,
    selection: Vec<NodeId>,
    commits: Vec<String>,
    next_id: usize,
}

impl SceneTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a group on top of `parent`'s children, or of the top level.
    pub fn add_group(&mut self, parent: Option<NodeId>, style: Style, transform: Transform2) -> NodeId {
        self.append(parent, NodeContent::Group, style, transform)
    }

    /// Appends a path object.
    pub fn add_path(
        &mut self,
        parent: Option<NodeId>,
        path: Path,
        style: Style,
        transform: Transform2,
    ) -> NodeId {
        self.append(parent, NodeContent::Path(path), style, transform)
    }

    /// Appends a path object from SVG path data.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidPathData` if `data` does not parse.
    pub fn add_path_data(
        &mut self,
        parent: Option<NodeId>,
        data: &str,
        style: Style,
        transform: Transform2,
    ) -> Result<NodeId> {
        let path = parse_path_data(data)?;
        Ok(self.add_path(parent, path, style, transform))
    }

    /// Appends a text object with the given glyph outline.
    pub fn add_text(
        &mut self,
        parent: Option<NodeId>,
        outline: Path,
        style: Style,
        transform: Transform2,
    ) -> NodeId {
        self.append(parent, NodeContent::Text(outline), style, transform)
    }

    /// Appends an object without an outline.
    pub fn add_other(&mut self, parent: Option<NodeId>, style: Style, transform: Transform2) -> NodeId {
        self.append(parent, NodeContent::Other, style, transform)
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Path of a path or text node.
    #[must_use]
    pub fn path(&self, id: NodeId) -> Option<&Path> {
        match &self.nodes.get(id)?.content {
            NodeContent::Path(path) | NodeContent::Text(path) => Some(path),
            NodeContent::Group | NodeContent::Other => None,
        }
    }

    /// Finds a node by its id attribute.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find_map(|(key, node)| (node.id == id).then_some(key))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Labels of the committed changes, oldest first.
    #[must_use]
    pub fn commits(&self) -> &[String] {
        &self.commits
    }

    fn append(
        &mut self,
        parent: Option<NodeId>,
        content: NodeContent,
        style: Style,
        transform: Transform2,
    ) -> NodeId {
        let prefix = match content {
            NodeContent::Group => "g",
            NodeContent::Text(_) => "text",
            NodeContent::Path(_) | NodeContent::Other => "path",
        };
        let id = self.fresh_id(prefix);
        let position = usize::MAX;
        self.insert(parent, position, content, id, style, transform)
    }

    fn insert(
        &mut self,
        parent: Option<NodeId>,
        position: usize,
        content: NodeContent,
        id: String,
        style: Style,
        transform: Transform2,
    ) -> NodeId {
        let parent = parent.filter(|p| self.nodes.contains_key(*p));
        let key = self.nodes.insert(NodeData {
            content,
            id,
            style,
            transform,
            parent,
            children: Vec::new(),
        });
        let siblings = match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(node) => &mut node.children,
            None => &mut self.roots,
        };
        let index = position.min(siblings.len());
        siblings.insert(index, key);
        key
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        loop {
            self.next_id += 1;
            let candidate = format!("{prefix}{}", self.next_id);
            if self.find(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

impl Document for SceneTree {
    type Handle = NodeId;

    fn kind(&self, item: NodeId) -> ItemKind {
        match self.nodes.get(item).map(|n| &n.content) {
            Some(NodeContent::Group) => ItemKind::Group,
            Some(NodeContent::Path(_)) => ItemKind::Shape,
            Some(NodeContent::Text(_)) => ItemKind::Text,
            Some(NodeContent::Other) | None => ItemKind::Other,
        }
    }

    fn outline(&self, item: NodeId) -> Option<Vec<PathInstruction>> {
        let path = self.path(item)?;
        (!path.is_empty()).then(|| path.to_instructions())
    }

    fn item_transform(&self, item: NodeId) -> Transform2 {
        self.nodes
            .get(item)
            .map_or_else(Transform2::identity, |n| n.transform)
    }

    fn document_transform(&self, item: NodeId) -> Transform2 {
        let mut transform = Transform2::identity();
        let mut current = Some(item);
        while let Some(node) = current.and_then(|id| self.nodes.get(id)) {
            transform = node.transform * transform;
            current = node.parent;
        }
        transform
    }

    fn style(&self, item: NodeId) -> Style {
        self.nodes
            .get(item)
            .map(|n| n.style.clone())
            .unwrap_or_default()
    }

    fn id(&self, item: NodeId) -> Option<String> {
        self.nodes.get(item).map(|n| n.id.clone())
    }

    fn parent(&self, item: NodeId) -> Option<NodeId> {
        self.nodes.get(item)?.parent
    }

    fn children(&self, item: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(item)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn roots(&self) -> Vec<NodeId> {
        self.roots.clone()
    }

    fn selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn set_selection(&mut self, items: &[NodeId]) {
        self.selection = items
            .iter()
            .copied()
            .filter(|id| self.nodes.contains_key(*id))
            .collect();
    }

    fn create_path(&mut self, new: NewPath<NodeId>) -> NodeId {
        let path = parse_path_data(&new.data).unwrap_or_else(|err| {
            warn!(%err, "created path has invalid data");
            Path::new()
        });
        let id = match new.id {
            Some(id) if self.find(&id).is_none() => id,
            _ => self.fresh_id("path"),
        };
        self.insert(
            new.parent,
            new.position,
            NodeContent::Path(path),
            id,
            new.style,
            new.transform,
        )
    }

    fn delete(&mut self, item: NodeId) {
        let Some(parent) = self.nodes.get(item).map(|n| n.parent) else {
            return;
        };
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => parent.children.retain(|&c| c != item),
            None => self.roots.retain(|&c| c != item),
        }
        let mut stack = vec![item];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                stack.extend(removed.children);
            }
        }
        let nodes = &self.nodes;
        self.selection.retain(|id| nodes.contains_key(*id));
    }

    fn commit(&mut self, label: &str) {
        debug!(label, nodes = self.nodes.len(), "document change committed");
        self.commits.push(label.to_owned());
    }
}
