pub mod runner;
pub mod scenario;

pub use runner::*;
pub use scenario::*;
