pub mod flatten;
pub mod path;
pub mod path_builder;
pub mod svg_data;

pub use path::{CutPosition, Nesting, Path, PathCommand, PathPiece, Segment, Subpath};
pub use path_builder::{PathBuilder, PathInstruction};
