//! Redistribution interpolation kernels.
//!
//! Piecewise-polynomial, compactly supported weights `w(u)` over the distance
//! `u` (in cells) between a particle and a lattice node. Each forms a 1D
//! partition of unity over integer offsets, so the tensor product over `D`
//! axes conserves strength.

use serde::{Deserialize, Serialize};

/// Longest 1D stencil of any kernel in the catalogue (`2 * 2 + 1`).
pub const MAX_STENCIL: usize = 5;

/// Interpolation kernel used to spread a particle over nearby lattice nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedistKernel {
    /// Nearest node (top hat).
    Lambda0,
    /// Linear (tent).
    Lambda1,
    /// Quadratic.
    Lambda2,
    /// Cubic.
    Lambda3,
    /// Monaghan's M4' (third order, C1 continuous).
    M4Prime,
}

impl RedistKernel {
    /// Every kernel in the catalogue.
    pub const ALL: [RedistKernel; 5] = [
        RedistKernel::Lambda0,
        RedistKernel::Lambda1,
        RedistKernel::Lambda2,
        RedistKernel::Lambda3,
        RedistKernel::M4Prime,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            RedistKernel::Lambda0 => "Λ0",
            RedistKernel::Lambda1 => "Λ1",
            RedistKernel::Lambda2 => "Λ2",
            RedistKernel::Lambda3 => "Λ3",
            RedistKernel::M4Prime => "M4'",
        }
    }

    /// Support radius in cells; the weight is zero at and beyond it.
    pub fn radius(self) -> f32 {
        match self {
            RedistKernel::Lambda0 => 0.5,
            RedistKernel::Lambda1 => 1.0,
            RedistKernel::Lambda2 => 1.5,
            RedistKernel::Lambda3 => 2.0,
            RedistKernel::M4Prime => 2.0,
        }
    }

    /// Neighbourhood half-width in whole cells, `round(radius)`.
    pub fn grid_radius(self) -> u32 {
        self.radius().round() as u32
    }

    /// Weight at distance `u` cells (sign ignored).
    #[inline]
    pub fn weight(self, u: f32) -> f32 {
        let u = u.abs();
        match self {
            RedistKernel::Lambda0 => {
                if u < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            RedistKernel::Lambda1 => {
                if u < 1.0 {
                    1.0 - u
                } else {
                    0.0
                }
            }
            RedistKernel::Lambda2 => {
                if u < 0.5 {
                    1.0 - u * u
                } else if u < 1.5 {
                    0.5 * (1.0 - u) * (2.0 - u)
                } else {
                    0.0
                }
            }
            RedistKernel::Lambda3 => {
                if u < 1.0 {
                    0.5 * (1.0 - u * u) * (2.0 - u)
                } else if u < 2.0 {
                    (1.0 - u) * (2.0 - u) * (3.0 - u) / 6.0
                } else {
                    0.0
                }
            }
            RedistKernel::M4Prime => {
                if u < 1.0 {
                    1.0 - 2.5 * u * u + 1.5 * u * u * u
                } else if u < 2.0 {
                    0.5 * (1.0 - u) * (2.0 - u) * (2.0 - u)
                } else {
                    0.0
                }
            }
        }
    }

    /// 1D weights of the `2 * grid_radius + 1` stencil around a node.
    ///
    /// `frac` is the particle's offset from its nearest node in cells, in
    /// `[-0.5, 0.5]`. Entry `i` is the weight of node offset
    /// `i - grid_radius`. The weights are normalised to sum to 1; when all
    /// raw weights vanish (the top hat exactly on a half-cell tie) the
    /// centre node takes everything.
    pub fn axis_weights(self, frac: f32, out: &mut [f32]) {
        let radius = self.grid_radius() as i32;
        debug_assert_eq!(out.len(), (2 * radius + 1) as usize);

        let mut sum = 0.0f32;
        for (i, w) in out.iter_mut().enumerate() {
            let offset = i as i32 - radius;
            *w = self.weight(offset as f32 - frac);
            sum += *w;
        }

        if sum > 0.0 {
            let inv_sum = 1.0 / sum;
            for w in out.iter_mut() {
                *w *= inv_sum;
            }
        } else {
            out.fill(0.0);
            out[radius as usize] = 1.0;
        }
    }
}

impl std::fmt::Display for RedistKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
