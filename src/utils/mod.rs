pub mod conditions;
pub mod grid;

pub use conditions::Condition;
pub use grid::{Cell, Heading};
