pub mod collection;
pub mod entity;
pub mod error;
pub mod image;
pub mod primitives;
pub mod view;

pub use collection::*;
pub use entity::*;
pub use error::*;
pub use primitives::*;
pub use view::*;
