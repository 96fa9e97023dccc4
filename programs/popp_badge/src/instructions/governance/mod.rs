pub mod conclude;
pub mod propose;
pub mod queries;
pub mod vote;

pub use conclude::*;
pub use propose::*;
pub use queries::*;
pub use vote::*;
