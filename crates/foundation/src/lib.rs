pub mod bounds;
pub mod color;
pub mod handles;
pub mod ids;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use color::*;
pub use handles::*;
pub use ids::*;
