pub mod annotation;
pub mod grid;

pub use annotation::*;
pub use grid::*;
