pub mod document;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod shape;
#[cfg(test)]
mod test_log;

pub use error::{PathOpsError, Result};
