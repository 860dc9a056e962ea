//! Schema module - Particle and configuration types for redistribution.

mod config;
mod particle;

pub use config::*;
pub use particle::*;
