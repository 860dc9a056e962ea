//! Compute module - Lattice keys, sparse accumulation and redistribution.

mod engine;
mod grid_key;
mod kernel;
mod prune;
mod threshold;
mod tree;

pub use engine::*;
pub use grid_key::*;
pub use kernel::*;
pub use prune::*;
pub use threshold::*;
pub use tree::*;
