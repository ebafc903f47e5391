// RagTune pipeline layer
// Describes the index/eval pipelines and wraps their external executors

pub mod builders;
pub mod compose;
pub mod runner;
pub mod spec;
pub mod vector;

pub use builders::*;
pub use compose::*;
pub use runner::*;
pub use spec::*;
pub use vector::*;
