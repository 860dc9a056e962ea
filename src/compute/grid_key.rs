//! Integer lattice coordinates used as sparse grid tree keys.
//!
//! A key holds one unsigned 32-bit lane per axis. The tree descends one
//! "level" at a time, consuming bit `L` of every lane at level `L`, so the
//! key order is the interleaved-bit (Morton) order: the most significant
//! differing bit decides, and at equal bit position axis 0 outranks axis 1.
//! Depth-first traversal of the tree therefore visits keys in ascending
//! order.

use std::cmp::Ordering;

/// Number of bits per lane, and therefore the number of tree levels.
pub const KEY_BITS: u32 = 32;

/// Integer lattice coordinate, one lane per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey<const D: usize> {
    lanes: [u32; D],
}

/// True when the highest set bit of `a` is strictly below that of `b`.
#[inline]
fn less_msb(a: u32, b: u32) -> bool {
    a < b && a < (a ^ b)
}

impl<const D: usize> GridKey<D> {
    /// Number of children of a branch: one per combination of axis bits.
    pub const CHILDREN: usize = 1 << D;

    /// Key from raw lanes.
    #[inline]
    pub const fn new(lanes: [u32; D]) -> Self {
        Self { lanes }
    }

    /// Raw lane values.
    #[inline]
    pub fn lanes(&self) -> [u32; D] {
        self.lanes
    }

    /// Snap a position to the nearest lattice point.
    ///
    /// # Panics
    /// If any axis would map to a negative (or unrepresentable) lattice
    /// coordinate. Callers pick `corner` so that this cannot happen.
    #[inline]
    pub fn from_position(position: [f32; D], spacing: f32, corner: [f32; D]) -> Self {
        let mut lanes = [0u32; D];
        for axis in 0..D {
            let cell = ((position[axis] - corner[axis]) / spacing).round();
            assert!(
                cell >= 0.0 && cell < u32::MAX as f32,
                "lattice coordinate {} on axis {} out of range (position {}, corner {})",
                cell,
                axis,
                position[axis],
                corner[axis]
            );
            lanes[axis] = cell as u32;
        }
        Self { lanes }
    }

    /// World position of this lattice point. Exact inverse of
    /// [`GridKey::from_position`] on lattice points.
    #[inline]
    pub fn to_position(&self, spacing: f32, corner: [f32; D]) -> [f32; D] {
        std::array::from_fn(|axis| corner[axis] + self.lanes[axis] as f32 * spacing)
    }

    /// Key shifted by a signed per-axis offset.
    ///
    /// # Panics
    /// If the result leaves the representable lattice.
    #[inline]
    pub fn offset_by(&self, offset: [i32; D]) -> Self {
        let mut lanes = self.lanes;
        for (lane, delta) in lanes.iter_mut().zip(offset) {
            *lane = lane
                .checked_add_signed(delta)
                .unwrap_or_else(|| panic!("lattice offset {} leaves key range", delta));
        }
        Self { lanes }
    }

    /// Per-axis offsets of the `(2r+1)^D` neighbourhood box in row-major
    /// order (axis 0 slowest, last axis fastest).
    ///
    /// This order is shared by [`GridKey::nearby_keys`] and by the engine's
    /// weight evaluation so both index the same cells.
    pub fn neighbourhood_offsets(radius: u32) -> NeighbourhoodOffsets<D> {
        NeighbourhoodOffsets::new(radius)
    }

    /// All keys within the `(2r+1)^D` box around `self`, row-major.
    pub fn nearby_keys(&self, radius: u32) -> impl Iterator<Item = GridKey<D>> + '_ {
        Self::neighbourhood_offsets(radius).map(move |offset| self.offset_by(offset))
    }

    /// Number of leading levels (from bit 31 down) at which both keys agree
    /// on every axis. 32 for identical keys.
    #[inline]
    pub fn matching_leading_bits(&self, other: &Self) -> u32 {
        self.lanes
            .iter()
            .zip(other.lanes.iter())
            .map(|(a, b)| (a ^ b).leading_zeros())
            .min()
            .unwrap_or(KEY_BITS)
    }

    /// Child slot selected by this key in a branch at `level`.
    ///
    /// Bit `level` of axis 0 is the most significant slot bit.
    #[inline]
    pub fn child_index(&self, level: u32) -> usize {
        let mut index = 0usize;
        for lane in &self.lanes {
            index = (index << 1) | ((lane >> level) & 1) as usize;
        }
        index
    }

    /// Key with all bits below `level` cleared.
    #[inline]
    pub fn prefix(&self, level: u32) -> Self {
        let mask = if level >= KEY_BITS {
            0
        } else {
            u32::MAX << level
        };
        Self {
            lanes: self.lanes.map(|lane| lane & mask),
        }
    }

    /// Key with bit `level` of each axis set from the slot `index`
    /// (inverse of [`GridKey::child_index`] for that level).
    #[inline]
    pub fn with_child(&self, level: u32, index: usize) -> Self {
        let mut lanes = self.lanes;
        for (axis, lane) in lanes.iter_mut().enumerate() {
            let bit = ((index >> (D - 1 - axis)) & 1) as u32;
            *lane = (*lane & !(1 << level)) | (bit << level);
        }
        Self { lanes }
    }
}

impl<const D: usize> Ord for GridKey<D> {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut axis = 0;
        let mut msb = self.lanes[0] ^ other.lanes[0];
        for a in 1..D {
            let diff = self.lanes[a] ^ other.lanes[a];
            if less_msb(msb, diff) {
                axis = a;
                msb = diff;
            }
        }
        self.lanes[axis].cmp(&other.lanes[axis])
    }
}

impl<const D: usize> PartialOrd for GridKey<D> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Odometer over the offsets `[-r, r]^D`, last axis fastest.
#[derive(Debug, Clone)]
pub struct NeighbourhoodOffsets<const D: usize> {
    radius: i32,
    current: [i32; D],
    remaining: usize,
}

impl<const D: usize> NeighbourhoodOffsets<D> {
    fn new(radius: u32) -> Self {
        let radius = radius as i32;
        let side = (2 * radius + 1) as usize;
        Self {
            radius,
            current: [-radius; D],
            remaining: side.pow(D as u32),
        }
    }
}

impl<const D: usize> Iterator for NeighbourhoodOffsets<D> {
    type Item = [i32; D];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let item = self.current;

        for axis in (0..D).rev() {
            if self.current[axis] < self.radius {
                self.current[axis] += 1;
                break;
            }
            self.current[axis] = -self.radius;
        }

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const D: usize> ExactSizeIterator for NeighbourhoodOffsets<D> {}
