use thiserror::Error;

/// Top-level error type for path operations.
#[derive(Debug, Error)]
pub enum PathOpsError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl PathOpsError {
    /// Short message suitable for the host's status bar.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Operation(err) => err.user_message(),
            other => format!("Path operation failed: {other}."),
        }
    }
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid path data at byte {offset}: {reason}")]
    InvalidPathData { offset: usize, reason: String },
}

/// Errors raised by the planar graph stages.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("shape has no winding data; uncross it with a fill rule first")]
    MissingWinding,

    #[error("entity not found: {0}")]
    EntityNotFound(&'static str),
}

/// Errors reported by the operation drivers.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("operand {index} flattens to fewer than two drawing commands")]
    DegenerateOperand { index: usize },

    #[error("unable to determine the z-order of the operands")]
    AmbiguousZOrder,

    #[error("the operation produced no geometry")]
    EmptyResult,

    #[error("nothing to do: {0}")]
    NothingToDo(String),
}

impl OperationError {
    /// Short message suitable for the host's status bar.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidSelection(reason) => reason.clone(),
            Self::DegenerateOperand { .. } => {
                "One of the objects has no usable outline, cannot perform the operation.".to_owned()
            }
            Self::AmbiguousZOrder => {
                "Unable to determine the z-order of the objects selected for difference, XOR, division, or path cut."
                    .to_owned()
            }
            Self::EmptyResult => "The operation produced an empty result.".to_owned(),
            Self::NothingToDo(reason) => reason.clone(),
        }
    }
}

/// Convenience type alias for results using [`PathOpsError`].
pub type Result<T> = std::result::Result<T, PathOpsError>;
