//! Redistribution engine - resamples a particle cloud onto a regular lattice.
//!
//! One call runs every stage in order:
//!
//! 1. Frame: pick a lattice corner so every touched key is non-negative.
//! 2. Scatter: split the particles into contiguous chunks, one per worker;
//!    each worker spreads its particles into a private [`SparseGridTree`].
//! 3. Merge: fold the worker trees into one, sequentially.
//! 4. Flatten: one output particle per populated cell.
//! 5. Soft prune: drop negligible particles (relative to the mean magnitude).
//! 6. Hard prune: enforce the output capacity.
//!
//! Strength is conserved by every stage up to floating-point rounding.
//! Workers share only read-only inputs, so no stage needs a lock.

use std::collections::TryReserveError;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::grid_key::GridKey;
use super::kernel::{MAX_STENCIL, RedistKernel};
use super::prune::{hard_prune, soft_prune};
use super::tree::SparseGridTree;
use crate::schema::{ConfigError, Particle, RedistConfig, Strength, total_strength};

/// Cells of headroom between the cloud's stencil and the lattice corner.
const FRAME_MARGIN: u32 = 2;

/// Lattice coordinates beyond this are not exact in `f32`.
const MAX_CELLS: f64 = (1u32 << 24) as f64;

/// Errors from a redistribution call. No partial result is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum RedistError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ConfigError),

    #[error("Particle {index} has a non-finite position")]
    NonFinitePosition { index: usize },

    #[error("Particle cloud spans {cells:.0} cells along axis {axis}, beyond the lattice range")]
    GridOverflow { axis: usize, cells: f64 },

    #[error("Out of memory while building the redistribution grid: {0}")]
    ResourceExhausted(#[from] TryReserveError),
}

/// Lattice placement shared by every worker tree of one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFrame<const D: usize> {
    /// World position of lattice key zero. A whole multiple of `spacing`.
    pub corner: [f32; D],
    /// Lattice spacing.
    pub spacing: f32,
    /// Stencil half-width in cells.
    pub grid_radius: u32,
}

impl<const D: usize> GridFrame<D> {
    /// Frame for a particle cloud.
    ///
    /// The corner sits an integer number of cells below the mean position,
    /// far enough to cover the lowest particle plus its stencil. It is
    /// snapped to a multiple of the spacing so that repeated calls on a
    /// lattice-aligned cloud reproduce the same lattice.
    pub fn compute<V: Strength>(
        particles: &[Particle<D, V>],
        spacing: f32,
        kernel: RedistKernel,
    ) -> Result<Self, RedistError> {
        let grid_radius = kernel.grid_radius();
        if particles.is_empty() {
            return Ok(Self {
                corner: [0.0; D],
                spacing,
                grid_radius,
            });
        }

        let mut sum = [0.0f64; D];
        let mut lo = [f64::INFINITY; D];
        let mut hi = [f64::NEG_INFINITY; D];
        for (index, p) in particles.iter().enumerate() {
            for axis in 0..D {
                let x = p.position[axis];
                if !x.is_finite() {
                    return Err(RedistError::NonFinitePosition { index });
                }
                let x = x as f64;
                sum[axis] += x;
                lo[axis] = lo[axis].min(x);
                hi[axis] = hi[axis].max(x);
            }
        }

        let h = spacing as f64;
        let headroom = (grid_radius + FRAME_MARGIN) as f64;
        let mut corner = [0.0f32; D];
        for axis in 0..D {
            let mean = sum[axis] / particles.len() as f64;
            let below = ((mean - lo[axis]) / h).ceil() + headroom;
            let origin = ((mean / h).floor() - below) * h;

            let cells = (hi[axis] - origin) / h + headroom;
            if !(cells < MAX_CELLS) {
                return Err(RedistError::GridOverflow { axis, cells });
            }
            corner[axis] = origin as f32;
        }

        Ok(Self {
            corner,
            spacing,
            grid_radius,
        })
    }
}

/// Statistics of one redistribution call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedistStats {
    pub input_particles: usize,
    pub workers: usize,
    /// Distinct lattice cells that received a non-zero contribution.
    pub touched_cells: usize,
    pub soft_pruned: usize,
    pub hard_pruned: usize,
    pub truncated: usize,
    pub output_particles: usize,
    /// Magnitude of (output total strength - input total strength).
    pub strength_drift: f32,
}

/// Spread one chunk of particles into a fresh tree.
fn scatter_chunk<const D: usize, V: Strength>(
    particles: &[Particle<D, V>],
    frame: &GridFrame<D>,
    kernel: RedistKernel,
) -> Result<SparseGridTree<D, V>, TryReserveError> {
    let GridFrame {
        corner,
        spacing,
        grid_radius,
    } = *frame;
    let side = 2 * grid_radius as usize + 1;

    // Same row-major order for keys and weights.
    let offsets: Vec<[i32; D]> = GridKey::<D>::neighbourhood_offsets(grid_radius).collect();

    let mut tree = SparseGridTree::new();
    let mut axis_weights = [[0.0f32; MAX_STENCIL]; D];
    let mut keys = Vec::with_capacity(offsets.len());
    let mut values = Vec::with_capacity(offsets.len());

    for p in particles {
        let key = GridKey::from_position(p.position, spacing, corner);
        let lanes = key.lanes();
        for axis in 0..D {
            let cell = (p.position[axis] - corner[axis]) / spacing;
            let frac = cell - lanes[axis] as f32;
            kernel.axis_weights(frac, &mut axis_weights[axis][..side]);
        }

        keys.clear();
        values.clear();
        for offset in &offsets {
            let mut weight = 1.0f32;
            for axis in 0..D {
                weight *= axis_weights[axis][(offset[axis] + grid_radius as i32) as usize];
            }
            if weight == 0.0 {
                continue;
            }
            keys.push(key.offset_by(*offset));
            values.push(p.strength.scaled(weight));
        }

        tree.insert_batch(&keys, &values)?;
    }

    Ok(tree)
}

/// One particle per populated cell, positioned on the lattice node.
fn flatten_to_particles<const D: usize, V: Strength>(
    grid: &SparseGridTree<D, V>,
    frame: &GridFrame<D>,
) -> Result<Vec<Particle<D, V>>, TryReserveError> {
    let cells = grid.flatten(grid.len())?;
    let volume = frame.spacing.powi(D as i32);

    let mut particles = Vec::new();
    particles.try_reserve_exact(cells.len())?;
    particles.par_extend(cells.into_par_iter().map(|(key, strength)| {
        Particle::new(
            key.to_position(frame.spacing, frame.corner),
            strength,
            volume,
        )
    }));
    Ok(particles)
}

/// Redistribution driver holding validated parameters.
#[derive(Debug, Clone)]
pub struct RedistributionEngine {
    config: RedistConfig,
}

impl RedistributionEngine {
    /// Create an engine, rejecting invalid parameters.
    pub fn new(config: RedistConfig) -> Result<Self, RedistError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get configuration reference.
    pub fn config(&self) -> &RedistConfig {
        &self.config
    }

    /// (worker count, particles per chunk) for `n` particles.
    fn partition(&self, n: usize) -> (usize, usize) {
        let workers = self
            .config
            .workers
            .unwrap_or_else(rayon::current_num_threads)
            .clamp(1, n.max(1));
        let chunk_len = n.div_ceil(workers).max(1);
        (n.div_ceil(chunk_len), chunk_len)
    }

    /// Frame, parallel scatter and merge: the accumulated lattice before
    /// flattening and pruning.
    pub fn build_grid<const D: usize, V: Strength>(
        &self,
        particles: &[Particle<D, V>],
    ) -> Result<(GridFrame<D>, SparseGridTree<D, V>), RedistError> {
        let kernel = self.config.kernel;
        let frame = GridFrame::compute(particles, self.config.grid_spacing, kernel)?;
        if particles.is_empty() {
            return Ok((frame, SparseGridTree::new()));
        }

        let (workers, chunk_len) = self.partition(particles.len());
        log::trace!(
            "scatter: {} particles over {} workers, corner {:?}, kernel {}",
            particles.len(),
            workers,
            frame.corner,
            kernel
        );

        // Each worker owns its tree; the join happens at collect.
        let trees: Vec<SparseGridTree<D, V>> = particles
            .par_chunks(chunk_len)
            .map(|chunk| scatter_chunk(chunk, &frame, kernel))
            .collect::<Result<_, _>>()?;

        let mut trees = trees.into_iter();
        let mut grid = trees.next().unwrap_or_default();
        for tree in trees {
            grid.merge(&tree)?;
        }
        log::trace!(
            "merge: {} cells, {} branches",
            grid.len(),
            grid.branch_count()
        );

        Ok((frame, grid))
    }

    /// Redistribute `particles`, returning at most `max_output` lattice
    /// particles with the same total strength.
    pub fn redistribute<const D: usize, V: Strength>(
        &self,
        particles: &[Particle<D, V>],
    ) -> Result<Vec<Particle<D, V>>, RedistError> {
        self.redistribute_with_stats(particles)
            .map(|(output, _)| output)
    }

    /// [`RedistributionEngine::redistribute`] plus per-stage counts.
    pub fn redistribute_with_stats<const D: usize, V: Strength>(
        &self,
        particles: &[Particle<D, V>],
    ) -> Result<(Vec<Particle<D, V>>, RedistStats), RedistError> {
        let mut stats = RedistStats {
            input_particles: particles.len(),
            ..Default::default()
        };
        if particles.is_empty() || self.config.max_output == 0 {
            return Ok((Vec::new(), stats));
        }
        stats.workers = self.partition(particles.len()).0;

        let (frame, grid) = self.build_grid(particles)?;
        stats.touched_cells = grid.len();

        let mut output = flatten_to_particles(&grid, &frame)?;
        drop(grid);

        stats.soft_pruned = soft_prune(&mut output, self.config.negligible_fraction);
        let outcome = hard_prune(&mut output, self.config.max_output);
        stats.hard_pruned = outcome.pruned;
        stats.truncated = outcome.truncated;
        stats.output_particles = output.len();

        let mut drift = total_strength(&output);
        drift.accumulate(total_strength(particles).scaled(-1.0));
        stats.strength_drift = drift.magnitude();

        log::debug!(
            "redistributed {} -> {} particles ({} cells, {} soft-pruned, {} hard-pruned, {} truncated, drift {:e})",
            stats.input_particles,
            stats.output_particles,
            stats.touched_cells,
            stats.soft_pruned,
            stats.hard_pruned,
            stats.truncated,
            stats.strength_drift
        );

        Ok((output, stats))
    }
}

/// Redistribute a particle cloud onto a lattice of spacing `grid_spacing`.
///
/// Returns at most `max_output` grid-aligned particles whose total strength
/// equals the input's up to rounding. Invalid arguments are rejected before
/// any work starts.
pub fn redistribute<const D: usize, V: Strength>(
    particles: &[Particle<D, V>],
    kernel: RedistKernel,
    grid_spacing: f32,
    negligible_fraction: f32,
    max_output: usize,
) -> Result<Vec<Particle<D, V>>, RedistError> {
    let config = RedistConfig::new(kernel, grid_spacing, max_output)
        .with_negligible_fraction(negligible_fraction);
    RedistributionEngine::new(config)?.redistribute(particles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Particle2, Particle3, total_magnitude};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn cloud_2d(n: usize, seed: u64) -> Vec<Particle2> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Particle::new(
                    [rng.gen_range(-1.0..1.0), rng.gen_range(-0.5..1.5)],
                    rng.gen_range(-1.0..1.0),
                    0.01,
                )
            })
            .collect()
    }

    fn cloud_3d(n: usize, seed: u64, extent: f32) -> Vec<Particle3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Particle::new(
                    [
                        rng.gen_range(0.0..extent),
                        rng.gen_range(0.0..extent),
                        rng.gen_range(0.0..extent),
                    ],
                    [
                        rng.gen_range(0.5..1.5),
                        rng.gen_range(0.5..1.5),
                        rng.gen_range(0.5..1.5),
                    ],
                    0.001,
                )
            })
            .collect()
    }

    fn assert_conserved_2d(input: &[Particle2], output: &[Particle2]) {
        let before: f64 = input.iter().map(|p| p.strength as f64).sum();
        let after: f64 = output.iter().map(|p| p.strength as f64).sum();
        let tolerance = 1e-5 * total_magnitude(input) + 1e-4;
        assert!(
            (before - after).abs() <= tolerance,
            "Strength not conserved: {} -> {} (tolerance {})",
            before,
            after,
            tolerance
        );
    }

    fn sum_3d(particles: &[Particle3]) -> [f64; 3] {
        let mut total = [0.0f64; 3];
        for p in particles {
            for axis in 0..3 {
                total[axis] += p.strength[axis] as f64;
            }
        }
        total
    }

    fn sorted_by_position<const D: usize, V: Strength>(
        mut particles: Vec<Particle<D, V>>,
    ) -> Vec<Particle<D, V>> {
        particles.sort_by(|a, b| {
            a.position
                .iter()
                .zip(b.position.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        particles
    }

    #[test]
    fn test_rejects_invalid_arguments() {
        let particles = cloud_2d(10, 1);
        for spacing in [0.0, -1.0, f32::NAN] {
            let result = redistribute(&particles, RedistKernel::Lambda1, spacing, 0.0, 10);
            assert!(matches!(
                result,
                Err(RedistError::InvalidArgument(ConfigError::InvalidSpacing(_)))
            ));
        }
        for fraction in [1.0, -0.01] {
            let result = redistribute(&particles, RedistKernel::Lambda1, 0.1, fraction, 10);
            assert!(matches!(
                result,
                Err(RedistError::InvalidArgument(
                    ConfigError::InvalidNegligibleFraction(_)
                ))
            ));
        }
    }

    #[test]
    fn test_zero_capacity_is_empty() {
        let particles = cloud_2d(500, 2);
        for kernel in RedistKernel::ALL {
            let output = redistribute(&particles, kernel, 0.1, 0.0, 0).unwrap();
            assert!(output.is_empty());
        }
    }

    #[test]
    fn test_empty_input() {
        let output = redistribute::<2, f32>(&[], RedistKernel::M4Prime, 0.1, 0.0, 100).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_non_finite_position() {
        let mut particles = cloud_2d(20, 3);
        particles[7].position[1] = f32::NAN;
        let result = redistribute(&particles, RedistKernel::Lambda1, 0.1, 0.0, 100);
        assert!(matches!(
            result,
            Err(RedistError::NonFinitePosition { index: 7 })
        ));
    }

    #[test]
    fn test_grid_overflow() {
        let particles: Vec<Particle2> = vec![
            Particle::new([0.0, 0.0], 1.0, 1.0),
            Particle::new([1.0e6, 0.0], 1.0, 1.0),
        ];
        let result = redistribute(&particles, RedistKernel::Lambda1, 0.01, 0.0, 100);
        assert!(matches!(
            result,
            Err(RedistError::GridOverflow { axis: 0, .. })
        ));
    }

    #[test]
    fn test_frame_covers_stencil() {
        let particles = cloud_2d(300, 4);
        for kernel in RedistKernel::ALL {
            let frame = GridFrame::compute(&particles, 0.05, kernel).unwrap();
            for p in &particles {
                let key = GridKey::from_position(p.position, frame.spacing, frame.corner);
                for lane in key.lanes() {
                    assert!(lane >= frame.grid_radius + FRAME_MARGIN - 1);
                }
            }
            // Corner lies on the global lattice.
            for c in frame.corner {
                let cells = c / 0.05;
                assert!((cells - cells.round()).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_conservation_all_kernels_2d() {
        let particles = cloud_2d(2000, 5);
        for kernel in RedistKernel::ALL {
            for max_output in [usize::MAX, 1500, 300, 25, 1] {
                let config = RedistConfig::new(kernel, 0.05, max_output);
                let output = RedistributionEngine::new(config)
                    .unwrap()
                    .redistribute(&particles)
                    .unwrap();
                assert!(output.len() <= max_output);
                assert!(!output.is_empty());
                assert_conserved_2d(&particles, &output);
            }
        }
    }

    #[test]
    fn test_conservation_with_soft_prune() {
        let particles = cloud_2d(1000, 6);
        for fraction in [0.05, 0.2, 0.9] {
            let config = RedistConfig::new(RedistKernel::Lambda3, 0.04, 800)
                .with_negligible_fraction(fraction);
            let (output, stats) = RedistributionEngine::new(config)
                .unwrap()
                .redistribute_with_stats(&particles)
                .unwrap();
            assert!(stats.soft_pruned > 0, "fraction {}", fraction);
            assert!(output.len() <= 800);
            assert_eq!(
                stats.touched_cells,
                output.len() + stats.soft_pruned + stats.hard_pruned + stats.truncated
            );
            assert_conserved_2d(&particles, &output);
        }
    }

    #[test]
    fn test_conservation_all_kernels_3d() {
        let particles = cloud_3d(400, 7, 1.0);
        let before = sum_3d(&particles);
        for kernel in RedistKernel::ALL {
            for max_output in [usize::MAX, 200] {
                let output = redistribute(&particles, kernel, 0.1, 0.0, max_output).unwrap();
                assert!(output.len() <= max_output);
                let after = sum_3d(&output);
                for axis in 0..3 {
                    let rel = (after[axis] - before[axis]).abs() / before[axis];
                    assert!(rel < 1e-4, "{} axis {}: rel error {}", kernel, axis, rel);
                }
            }
        }
    }

    #[test]
    fn test_output_is_lattice_aligned() {
        let particles = cloud_2d(500, 8);
        let spacing = 0.125;
        let output = redistribute(&particles, RedistKernel::M4Prime, spacing, 0.0, usize::MAX)
            .unwrap();
        for p in &output {
            assert_eq!(p.volume, spacing * spacing);
            for x in p.position {
                let cells = x / spacing;
                assert_eq!(cells, cells.round(), "{} is off-lattice", x);
            }
        }
    }

    #[test]
    fn test_idempotent_on_lattice_2d() {
        let spacing = 0.5;
        let mut particles: Vec<Particle2> = Vec::new();
        for x in -6i32..6 {
            for y in -3i32..5 {
                let strength = ((x * 7 + y * 3).rem_euclid(5) + 1) as f32 * 0.25;
                particles.push(Particle::new(
                    [x as f32 * spacing, y as f32 * spacing],
                    strength,
                    spacing * spacing,
                ));
            }
        }
        let expected = sorted_by_position(particles.clone());

        for kernel in RedistKernel::ALL {
            let output =
                redistribute(&particles, kernel, spacing, 0.0, particles.len()).unwrap();
            assert_eq!(sorted_by_position(output), expected, "{}", kernel);
        }
    }

    #[test]
    fn test_idempotent_on_lattice_3d() {
        let spacing = 0.25;
        let mut particles: Vec<Particle3> = Vec::new();
        for x in 0..5 {
            for y in 0..4 {
                for z in 0..3 {
                    let s = (x + 2 * y + 3 * z) as f32 * 0.5 + 0.5;
                    particles.push(Particle::new(
                        [
                            10.0 + x as f32 * spacing,
                            y as f32 * spacing,
                            -3.0 + z as f32 * spacing,
                        ],
                        [s, -s, 0.25],
                        spacing * spacing * spacing,
                    ));
                }
            }
        }
        let expected = sorted_by_position(particles.clone());

        for kernel in RedistKernel::ALL {
            let output =
                redistribute(&particles, kernel, spacing, 0.0, particles.len()).unwrap();
            assert_eq!(sorted_by_position(output), expected, "{}", kernel);
        }
    }

    #[test]
    fn test_opposite_strengths_cancel() {
        let particles: Vec<Particle2> = vec![
            Particle::new([0.3, 0.3], 1.25, 1.0),
            Particle::new([0.3, 0.3], -1.25, 1.0),
        ];
        let config = RedistConfig::new(RedistKernel::Lambda0, 1.0, 10);
        let engine = RedistributionEngine::new(config).unwrap();

        let (frame, grid) = engine.build_grid(&particles).unwrap();
        assert_eq!(grid.len(), 1);
        let key = GridKey::from_position([0.3, 0.3], frame.spacing, frame.corner);
        let value = grid.get(&key).unwrap();
        assert!(value.abs() < 1e-6, "Expected cancellation, got {}", value);

        let output = engine.redistribute(&particles).unwrap();
        let total: f32 = output.iter().map(|p| p.strength).sum();
        assert!(total.abs() < 1e-6);
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let particles = cloud_2d(3000, 9);
        let reference = {
            let config = RedistConfig::new(RedistKernel::M4Prime, 0.05, usize::MAX).with_workers(1);
            let output = RedistributionEngine::new(config)
                .unwrap()
                .redistribute(&particles)
                .unwrap();
            sorted_by_position(output)
        };

        for workers in [2, 3, 7, 64, 5000] {
            let config =
                RedistConfig::new(RedistKernel::M4Prime, 0.05, usize::MAX).with_workers(workers);
            let output = RedistributionEngine::new(config)
                .unwrap()
                .redistribute(&particles)
                .unwrap();
            let output = sorted_by_position(output);
            assert_eq!(output.len(), reference.len(), "workers {}", workers);
            for (a, b) in output.iter().zip(&reference) {
                assert_eq!(a.position, b.position);
                assert!((a.strength - b.strength).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_stats_report_workers() {
        let particles = cloud_2d(10, 10);
        let config = RedistConfig::new(RedistKernel::Lambda1, 0.1, 1000).with_workers(6);
        let (_, stats) = RedistributionEngine::new(config)
            .unwrap()
            .redistribute_with_stats(&particles)
            .unwrap();
        // 10 particles in chunks of 2.
        assert_eq!(stats.workers, 5);
        assert_eq!(stats.input_particles, 10);
        assert!(stats.strength_drift < 1e-5);
    }

    /// Uniform 3D cloud, M4', no hard pruning: every touched cell becomes an
    /// output particle and the total strength is preserved.
    fn uniform_cube_scenario(n: usize, spacing: f32) {
        let particles = cloud_3d(n, 11, 10.0);
        let config = RedistConfig::new(RedistKernel::M4Prime, spacing, usize::MAX);
        let (output, stats) = RedistributionEngine::new(config)
            .unwrap()
            .redistribute_with_stats(&particles)
            .unwrap();

        assert_eq!(stats.hard_pruned, 0);
        assert_eq!(output.len(), stats.touched_cells);

        let before = sum_3d(&particles);
        let after = sum_3d(&output);
        for axis in 0..3 {
            let rel = (after[axis] - before[axis]).abs() / before[axis];
            assert!(rel < 1e-3, "axis {}: relative error {}", axis, rel);
        }
    }

    #[test]
    fn test_uniform_cube_small() {
        uniform_cube_scenario(20_000, 0.05);
    }

    #[test]
    #[ignore = "one million particles; needs several GB of memory"]
    fn test_uniform_cube_full() {
        uniform_cube_scenario(1_000_000, 0.01);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_permutation_invariant(seed in any::<u64>(), workers in 1usize..6) {
            let particles = cloud_2d(300, seed);
            let mut shuffled = particles.clone();
            shuffled.shuffle(&mut StdRng::seed_from_u64(seed ^ 0x5eed));

            let run = |input: &[Particle2], workers: usize| {
                let config = RedistConfig::new(RedistKernel::Lambda2, 0.1, usize::MAX)
                    .with_workers(workers);
                let output = RedistributionEngine::new(config)
                    .unwrap()
                    .redistribute(input)
                    .unwrap();
                sorted_by_position(output)
            };

            let a = run(&particles, 1);
            let b = run(&shuffled, workers);
            prop_assert_eq!(a.len(), b.len());
            for (x, y) in a.iter().zip(&b) {
                for axis in 0..2 {
                    prop_assert!((x.position[axis] - y.position[axis]).abs() < 1e-4);
                }
                prop_assert!((x.strength - y.strength).abs() < 1e-5);
            }
        }
    }
}
