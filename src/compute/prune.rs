//! Strength-conserving particle pruning.
//!
//! Both stages drop particles and spread the dropped strength evenly over the
//! survivors, so the total strength of the set is unchanged.

use rayon::prelude::*;

use super::threshold::find_cutoff;
use crate::schema::{Particle, Strength};

/// Result of a hard prune.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HardPruneOutcome {
    /// Particles dropped at or below the magnitude cutoff.
    pub pruned: usize,
    /// Particles dropped by index to meet the capacity exactly.
    pub truncated: usize,
}

/// Add `removed / survivors` to every particle.
fn spread_evenly<const D: usize, V: Strength>(particles: &mut [Particle<D, V>], removed: V) {
    if particles.is_empty() || removed.is_zero() {
        return;
    }
    let share = removed.scaled(1.0 / particles.len() as f32);
    particles
        .par_iter_mut()
        .for_each(|p| p.strength.accumulate(share));
}

/// Drop particles whose magnitude is at most `mean magnitude * fraction`.
///
/// The reference is the mean of absolute strengths, not the maximum.
/// A non-positive fraction disables the stage. Returns the number dropped.
pub fn soft_prune<const D: usize, V: Strength>(
    particles: &mut Vec<Particle<D, V>>,
    negligible_fraction: f32,
) -> usize {
    if negligible_fraction <= 0.0 || particles.is_empty() {
        return 0;
    }

    let total: f64 = particles
        .par_iter()
        .map(|p| p.strength.magnitude() as f64)
        .sum();
    let threshold = (total / particles.len() as f64) as f32 * negligible_fraction;

    let before = particles.len();
    let mut removed = V::zero();
    particles.retain(|p| {
        if p.strength.magnitude() > threshold {
            true
        } else {
            removed.accumulate(p.strength);
            false
        }
    });

    log::trace!(
        "soft prune: threshold {}, dropped {} of {}",
        threshold,
        before - particles.len(),
        before
    );

    spread_evenly(particles, removed);
    before - particles.len()
}

/// Shrink the set to at most `max_output` particles.
///
/// Uses [`find_cutoff`] on the magnitudes and drops everything at or under
/// the cutoff. If ties leave no survivor, the first `max_output` particles
/// are kept instead. Any residual excess is truncated by index.
pub fn hard_prune<const D: usize, V: Strength>(
    particles: &mut Vec<Particle<D, V>>,
    max_output: usize,
) -> HardPruneOutcome {
    if particles.len() <= max_output {
        return HardPruneOutcome::default();
    }

    let magnitudes: Vec<f32> = particles
        .par_iter()
        .map(|p| p.strength.magnitude())
        .collect();
    let cutoff = find_cutoff(&magnitudes, max_output);

    let mut keep: Vec<bool> = magnitudes.par_iter().map(|&m| m > cutoff).collect();
    if max_output > 0 && !keep.contains(&true) {
        keep.iter_mut().take(max_output).for_each(|k| *k = true);
    }

    let before = particles.len();
    let mut removed = V::zero();
    let mut flags = keep.iter();
    particles.retain(|p| {
        let kept = flags.next().copied().unwrap_or(false);
        if !kept {
            removed.accumulate(p.strength);
        }
        kept
    });
    let pruned = before - particles.len();

    let mut truncated = 0;
    if particles.len() > max_output {
        truncated = particles.len() - max_output;
        for p in particles.drain(max_output..) {
            removed.accumulate(p.strength);
        }
    }

    log::trace!(
        "hard prune: cutoff {}, dropped {}, truncated {}, kept {}",
        cutoff,
        pruned,
        truncated,
        particles.len()
    );

    spread_evenly(particles, removed);
    HardPruneOutcome { pruned, truncated }
}
