pub mod feature;
pub mod geometry;
pub mod projection;
pub mod style;

pub use feature::*;
pub use geometry::*;
pub use projection::*;
pub use style::*;
