//! Configuration types for redistribution parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compute::RedistKernel;

fn default_spacing() -> f32 {
    0.1
}

fn default_max_output() -> usize {
    1 << 20
}

/// Parameters of one redistribution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistConfig {
    /// Interpolation kernel spreading each particle onto the lattice.
    pub kernel: RedistKernel,
    /// Lattice spacing in world units. Must be positive and finite.
    #[serde(default = "default_spacing")]
    pub grid_spacing: f32,
    /// Particles with `|strength| <= mean(|strength|) * negligible_fraction`
    /// are dropped and their strength spread over the rest. In `[0, 1)`;
    /// zero disables the soft prune.
    #[serde(default)]
    pub negligible_fraction: f32,
    /// Upper bound on the number of output particles.
    #[serde(default = "default_max_output")]
    pub max_output: usize,
    /// Scatter worker count. `None` uses the rayon pool's thread count.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for RedistConfig {
    fn default() -> Self {
        Self {
            kernel: RedistKernel::M4Prime,
            grid_spacing: default_spacing(),
            negligible_fraction: 0.0,
            max_output: default_max_output(),
            workers: None,
        }
    }
}

impl RedistConfig {
    /// Configuration with the given kernel, spacing and capacity and no
    /// soft pruning.
    pub fn new(kernel: RedistKernel, grid_spacing: f32, max_output: usize) -> Self {
        Self {
            kernel,
            grid_spacing,
            max_output,
            ..Self::default()
        }
    }

    /// Set the negligible-strength fraction.
    pub fn with_negligible_fraction(mut self, negligible_fraction: f32) -> Self {
        self.negligible_fraction = negligible_fraction;
        self
    }

    /// Pin the scatter worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_spacing.is_finite() && self.grid_spacing > 0.0) {
            return Err(ConfigError::InvalidSpacing(self.grid_spacing));
        }
        if !(0.0..1.0).contains(&self.negligible_fraction) {
            return Err(ConfigError::InvalidNegligibleFraction(
                self.negligible_fraction,
            ));
        }
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Grid spacing must be positive and finite, got {0}")]
    InvalidSpacing(f32),
    #[error("Negligible fraction must lie in [0, 1), got {0}")]
    InvalidNegligibleFraction(f32),
    #[error("Worker count must be non-zero")]
    InvalidWorkers,
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
