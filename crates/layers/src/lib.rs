pub mod context;
pub mod converter;
pub mod height;
pub mod layer;
pub mod run_converter;
pub mod shape;
pub mod style;
pub mod symbology;
pub mod tessellate;
pub mod vector;

pub use context::*;
pub use converter::*;
pub use layer::*;
pub use run_converter::*;
pub use symbology::*;
pub use vector::{SyncReport, VectorLayer};

#[cfg(test)]
pub(crate) mod testing;
