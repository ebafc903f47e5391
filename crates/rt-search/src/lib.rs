//! # rt-search
//!
//! Parameter search for the RagTune pipeline pair.
//!
//! Provides the search strategies (exhaustive grid and progressive
//! coordinate sweep) and the controller that drives trials against the
//! external index/eval pipeline executors and the artifact store.

mod controller;
mod search;

pub use controller::{SearchController, SearchReport, SearchSettings, SearchState};
pub use search::{GridSearch, ProgressiveSearch, SearchStrategy};
