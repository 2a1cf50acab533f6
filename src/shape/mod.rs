//! Planar graph of points and directed edges used by every path operation.
//!
//! A [`Shape`] is produced by [`Shape::fill`], uncrossed into a planar
//! subdivision with per-edge windings by [`Shape::convert_to_shape`],
//! combined by [`Shape::booleen`] and traced back into a
//! [`Path`](crate::geometry::Path) by [`Shape::convert_to_forme`]. Each
//! stage builds a new shape rather than mutating its input.

mod booleen;
mod convert;
mod fill;
mod forme;
mod offset;
mod planarize;
mod winding;

pub use fill::FillRule;
pub use offset::{JoinType, LineCap, StrokeStyle};

use slotmap::SlotMap;

use crate::error::{Result, ShapeError};
use crate::math::Point2;

slotmap::new_key_type! {
    /// Identifier of a point in a [`Shape`].
    pub struct PointId;
}

slotmap::new_key_type! {
    /// Identifier of an edge in a [`Shape`].
    pub struct EdgeId;
}

/// Where an edge came from: the operand path, the command index of the piece
/// and the curve parameters of the edge's start and end.
///
/// `t_start > t_end` means the edge runs against the piece's direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackData {
    pub path_id: usize,
    pub piece: usize,
    pub t_start: f64,
    pub t_end: f64,
}

impl BackData {
    /// The same origin seen from the other end of the edge.
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            t_start: self.t_end,
            t_end: self.t_start,
            ..self
        }
    }

    /// Restricts the origin to the part `[s0, s1]` of the edge.
    #[must_use]
    pub fn sub_range(self, s0: f64, s1: f64) -> Self {
        let dt = self.t_end - self.t_start;
        Self {
            t_start: self.t_start + dt * s0,
            t_end: self.t_start + dt * s1,
            ..self
        }
    }
}

/// Winding numbers on both sides of an edge, one per operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeWinding {
    pub left: [i32; 2],
    pub right: [i32; 2],
}

/// A point of the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointData {
    pub position: Point2,
}

/// A directed edge of the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    pub start: PointId,
    pub end: PointId,
    /// Signed multiplicity contributed to each operand's winding.
    pub weights: [i32; 2],
    /// Keeps the edge even when its weights cancel out (cutting curves).
    pub keep: bool,
    pub back: Vec<BackData>,
    /// Set once the shape has been uncrossed under a fill rule.
    pub winding: Option<EdgeWinding>,
}

impl EdgeData {
    /// A unit-weight edge for the first operand.
    #[must_use]
    pub fn new(start: PointId, end: PointId) -> Self {
        Self {
            start,
            end,
            weights: [1, 0],
            keep: false,
            back: Vec::new(),
            winding: None,
        }
    }

    /// Back data of the first origin on operand path `path_id`.
    #[must_use]
    pub fn back_for(&self, path_id: usize) -> Option<&BackData> {
        self.back.iter().find(|b| b.path_id == path_id)
    }
}

/// Numeric parameters of the graph stages.
#[derive(Debug, Clone, Copy)]
pub struct ShapeParams {
    /// Points closer than this are merged, and intersections are snapped to
    /// existing points within this distance.
    pub epsilon: f64,
    /// Tolerance used for join and cap arcs built by offsets.
    pub arc_tolerance: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            arc_tolerance: 0.03,
        }
    }
}

/// Arena-backed planar graph.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    points: SlotMap<PointId, PointData>,
    edges: SlotMap<EdgeId, EdgeData>,
}

impl Shape {
    /// Creates an empty shape.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a point and returns its ID.
    pub fn add_point(&mut self, position: Point2) -> PointId {
        self.points.insert(PointData { position })
    }

    /// Inserts an edge and returns its ID.
    pub fn add_edge(&mut self, data: EdgeData) -> EdgeId {
        self.edges.insert(data)
    }

    /// Returns the point data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::EntityNotFound` if the point is not in the shape.
    pub fn point(&self, id: PointId) -> Result<&PointData> {
        self.points
            .get(id)
            .ok_or_else(|| ShapeError::EntityNotFound("point").into())
    }

    /// Returns the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::EntityNotFound` if the edge is not in the shape.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData> {
        self.edges
            .get(id)
            .ok_or_else(|| ShapeError::EntityNotFound("edge").into())
    }

    /// Start and end positions of an edge.
    ///
    /// # Errors
    ///
    /// Returns `ShapeError::EntityNotFound` if the edge or its points are missing.
    pub fn edge_points(&self, id: EdgeId) -> Result<(Point2, Point2)> {
        let edge = self.edge(id)?;
        Ok((
            self.point(edge.start)?.position,
            self.point(edge.end)?.position,
        ))
    }

    pub fn points(&self) -> impl Iterator<Item = (PointId, &PointData)> {
        self.points.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// `true` when the shape has been uncrossed under a fill rule.
    ///
    /// An empty shape trivially qualifies.
    #[must_use]
    pub fn has_winding(&self) -> bool {
        self.edges.values().all(|e| e.winding.is_some())
    }

    /// Errors unless the shape carries windings.
    pub(crate) fn require_winding(&self) -> Result<()> {
        if self.has_winding() {
            Ok(())
        } else {
            Err(ShapeError::MissingWinding.into())
        }
    }

    /// Adds a closed polygon with unit weight (counter-clockwise adds +1).
    pub fn add_polygon(&mut self, polygon: &[Point2]) {
        if polygon.len() < 2 {
            return;
        }
        let ids: Vec<PointId> = polygon.iter().map(|p| self.add_point(*p)).collect();
        for i in 0..ids.len() {
            self.add_edge(EdgeData::new(ids[i], ids[(i + 1) % ids.len()]));
        }
    }

    /// Sum of `cross(start, end) / 2` over all edges.
    ///
    /// For an uncrossed shape this is the filled area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.edges
            .values()
            .filter_map(|e| {
                let a = self.points.get(e.start)?.position;
                let b = self.points.get(e.end)?.position;
                Some(0.5 * (a.x * b.y - b.x * a.y))
            })
            .sum()
    }

    /// Raw segments of every edge, the input of the uncrossing sweep.
    pub(crate) fn segments(&self) -> Vec<planarize::RawSegment> {
        self.edges
            .values()
            .filter_map(|e| {
                Some(planarize::RawSegment {
                    a: self.points.get(e.start)?.position,
                    b: self.points.get(e.end)?.position,
                    weights: e.weights,
                    keep: e.keep,
                    back: e.back.clone(),
                })
            })
            .collect()
    }
}
