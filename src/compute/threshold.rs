//! Approximate order-statistic cutoff search.
//!
//! Finds a magnitude cutoff that keeps at most a desired number of values
//! strictly above it, using repeated histogram refinement instead of a sort.
//! Working memory is one histogram regardless of input size.

/// Histogram resolution per refinement pass.
pub const BUCKETS: usize = 1024;

/// Stop refining once the boundary bucket holds at most this fraction of
/// the input.
pub const TOLERANCE: f32 = 0.006;

const MAX_PASSES: usize = 16;

struct Histogram {
    counts: Vec<usize>,
    min: Vec<f32>,
    max: Vec<f32>,
}

impl Histogram {
    fn new() -> Self {
        Self {
            counts: vec![0; BUCKETS],
            min: vec![f32::INFINITY; BUCKETS],
            max: vec![f32::NEG_INFINITY; BUCKETS],
        }
    }

    /// Bucket every value in `[lo, hi]`, returning how many lie above `hi`.
    fn fill(&mut self, values: &[f32], lo: f32, hi: f32) -> usize {
        self.counts.fill(0);
        self.min.fill(f32::INFINITY);
        self.max.fill(f32::NEG_INFINITY);

        let inv_width = BUCKETS as f32 / (hi - lo);
        let mut above = 0usize;
        for &x in values {
            if x > hi {
                above += 1;
                continue;
            }
            if x.is_nan() || x < lo {
                continue;
            }
            // Monotone in x: a value in a higher bucket is strictly larger.
            let b = (((x - lo) * inv_width) as usize).min(BUCKETS - 1);
            self.counts[b] += 1;
            self.min[b] = self.min[b].min(x);
            self.max[b] = self.max[b].max(x);
        }
        above
    }
}

/// Cutoff `c` such that `count(x > c) <= desired_count`.
///
/// The survivor count lands within [`TOLERANCE`] of the input length below
/// `desired_count` (exact unless many values tie at the boundary). When
/// `desired_count >= abs_strengths.len()` nothing needs pruning and the
/// cutoff returned lies above the maximum. The cutoff is non-increasing in
/// `desired_count` for a fixed input. NaN entries never survive.
pub fn find_cutoff(abs_strengths: &[f32], desired_count: usize) -> f32 {
    let (mut lo, mut hi) = abs_strengths
        .iter()
        .filter(|x| !x.is_nan())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });

    if desired_count >= abs_strengths.len() || hi < lo {
        return if hi.is_finite() { hi.next_up() } else { f32::INFINITY };
    }

    let slack = ((abs_strengths.len() as f32 * TOLERANCE) as usize).max(1);
    let mut histogram = Histogram::new();
    // Nothing lies above the maximum.
    let mut cutoff = hi;

    for _ in 0..MAX_PASSES {
        if hi <= lo || (hi - lo) / BUCKETS as f32 == 0.0 {
            break;
        }

        let above = histogram.fill(abs_strengths, lo, hi);

        // Survivors when cutting at the top of bucket b: `above` plus every
        // bucket past b. Walk down to the lowest bucket still within budget.
        let mut survivors = above;
        let mut b = BUCKETS - 1;
        while b > 0 && survivors + histogram.counts[b] <= desired_count {
            survivors += histogram.counts[b];
            b -= 1;
        }

        log::trace!(
            "cutoff pass: range [{}, {}], bucket {} holds {}, {} survivors",
            lo,
            hi,
            b,
            histogram.counts[b],
            survivors
        );

        if histogram.counts[b] == 0 {
            break;
        }
        cutoff = histogram.max[b];

        if survivors == desired_count
            || histogram.counts[b] <= slack
            || histogram.min[b] == histogram.max[b]
        {
            break;
        }
        lo = histogram.min[b];
        hi = histogram.max[b];
    }

    cutoff
}

/// Number of values strictly above `cutoff`.
pub fn count_above(values: &[f32], cutoff: f32) -> usize {
    values.iter().filter(|&&x| x > cutoff).count()
}
