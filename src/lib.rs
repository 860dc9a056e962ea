//! cvortex - Vortex particle redistribution onto a regular lattice.
//!
//! Lagrangian vortex methods lose accuracy as particles clump and spread.
//! Redistribution resamples the cloud onto a uniform lattice with a
//! conservative interpolation kernel, then prunes the result back down to
//! a fixed capacity without changing the total circulation.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Particle and configuration types
//! - `compute`: Lattice keys, sparse grid tree, kernels, pruning and the engine
//!
//! # Example
//!
//! ```rust,no_run
//! use cvortex::{
//!     compute::{RedistKernel, RedistributionEngine},
//!     schema::{Particle2, RedistConfig, total_strength},
//! };
//!
//! let particles: Vec<Particle2> = (0..1000)
//!     .map(|i| {
//!         let t = i as f32 * 0.01;
//!         Particle2::new([t.cos(), t.sin()], 1.0 - t * 0.05, 0.01)
//!     })
//!     .collect();
//!
//! let config = RedistConfig::new(RedistKernel::M4Prime, 0.05, 2000)
//!     .with_negligible_fraction(0.01);
//! let engine = RedistributionEngine::new(config).unwrap();
//! let (output, stats) = engine.redistribute_with_stats(&particles).unwrap();
//!
//! println!(
//!     "{} -> {} particles, total strength {} -> {}",
//!     stats.input_particles,
//!     stats.output_particles,
//!     total_strength(&particles),
//!     total_strength(&output)
//! );
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{RedistError, RedistKernel, RedistStats, RedistributionEngine, redistribute};
pub use schema::{Particle, Particle2, Particle3, RedistConfig, Strength};
