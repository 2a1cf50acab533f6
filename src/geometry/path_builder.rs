use crate::math::{is_identity, Point2, Transform2};

use super::path::Path;

/// One element of an item's outline as the document hands it over.
///
/// Curves use absolute control points; `MoveTo` records whether the subpath
/// it starts is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathInstruction {
    MoveTo { point: Point2, closed: bool },
    LineTo(Point2),
    CurveTo { c1: Point2, c2: Point2, end: Point2 },
}

/// Converts outline instructions into a [`Path`], optionally transformed.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    transform: Option<Transform2>,
}

impl PathBuilder {
    /// Creates a builder that keeps coordinates as they are.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder applying `transform` to every point first.
    #[must_use]
    pub fn with_transform(transform: Transform2) -> Self {
        Self {
            transform: (!is_identity(&transform)).then_some(transform),
        }
    }

    /// Builds the path, or `None` when there are no instructions.
    ///
    /// A closed subpath receives its `Close` command right before the next
    /// moveto, or at the end of the input.
    #[must_use]
    pub fn build(&self, instructions: &[PathInstruction]) -> Option<Path> {
        if instructions.is_empty() {
            return None;
        }
        let map = |p: Point2| match &self.transform {
            Some(t) => t.transform_point(&p),
            None => p,
        };

        let mut path = Path::new();
        let mut pen = Point2::origin();
        let mut pending_close = false;
        for instruction in instructions {
            match *instruction {
                PathInstruction::MoveTo { point, closed } => {
                    if pending_close {
                        path.close();
                    }
                    pen = map(point);
                    path.move_to(pen);
                    pending_close = closed;
                }
                PathInstruction::LineTo(point) => {
                    pen = map(point);
                    path.line_to(pen);
                }
                PathInstruction::CurveTo { c1, c2, end } => {
                    let (c1, c2, end) = (map(c1), map(c2), map(end));
                    path.cubic_to(end, (c1 - pen) * 3.0, (end - c2) * 3.0);
                    pen = end;
                }
            }
        }
        if pending_close {
            path.close();
        }
        Some(path)
    }
}
