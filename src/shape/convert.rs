use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;

use super::planarize::planarize;
use super::winding::compute_windings;
use super::{EdgeData, EdgeWinding, FillRule, PointId, Shape, ShapeParams};

impl Shape {
    /// Uncrosses the shape and keeps the boundary of its inside.
    ///
    /// The result is a planar subdivision whose edges separate inside from
    /// outside under `rule`, oriented with the inside on their left, each
    /// with unit weight and its computed winding. With
    /// [`FillRule::JustDont`] the planar graph is returned as is, without
    /// windings, which is what cutting curves need.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph references missing points.
    pub fn convert_to_shape(&self, rule: FillRule, params: &ShapeParams) -> Result<Shape> {
        let planar = planarize(self.segments(), params.epsilon);
        if rule == FillRule::JustDont {
            return Ok(planar);
        }

        let mut out = Shape::new();
        let mut ids: HashMap<PointId, PointId> = HashMap::new();
        for (id, winding) in compute_windings(&planar) {
            let inside_left = rule.is_inside(winding.left[0]);
            let inside_right = rule.is_inside(winding.right[0]);
            if inside_left == inside_right {
                continue;
            }
            let edge = planar.edge(id)?;
            out.push_oriented(&planar, &mut ids, edge, winding, !inside_left)?;
        }
        debug!(
            ?rule,
            points = out.point_count(),
            edges = out.edge_count(),
            "converted shape"
        );
        Ok(out)
    }

    /// Copies `edge` of `source` into `self` with unit weight, reversed when
    /// `flip` is set, reusing already copied points.
    pub(crate) fn push_oriented(
        &mut self,
        source: &Shape,
        ids: &mut HashMap<PointId, PointId>,
        edge: &EdgeData,
        winding: EdgeWinding,
        flip: bool,
    ) -> Result<()> {
        let mut map = |src: PointId| -> Result<PointId> {
            if let Some(id) = ids.get(&src) {
                return Ok(*id);
            }
            let id = self.add_point(source.point(src)?.position);
            ids.insert(src, id);
            Ok(id)
        };
        let (start, end) = (map(edge.start)?, map(edge.end)?);
        let (start, end, back, winding) = if flip {
            (
                end,
                start,
                edge.back.iter().map(|b| b.reversed()).collect(),
                EdgeWinding {
                    left: winding.right,
                    right: winding.left,
                },
            )
        } else {
            (start, end, edge.back.clone(), winding)
        };
        self.add_edge(EdgeData {
            start,
            end,
            weights: [1, 0],
            keep: false,
            back,
            winding: Some(winding),
        });
        Ok(())
    }
}
