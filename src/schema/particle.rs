//! Vortex particle types.
//!
//! A particle is a point sample of the vorticity field: a position, a
//! strength (circulation) and the area or volume it represents. In 2D the
//! strength is a scalar, in 3D it is a vector.

use serde::{Deserialize, Serialize};

/// Value carried by a particle and accumulated per lattice cell.
///
/// Implemented for `f32` (2D scalar circulation) and `[f32; 3]` (3D vector
/// vorticity). The zero value is the accumulation identity.
pub trait Strength: Copy + Send + Sync + PartialEq + std::fmt::Debug + 'static {
    /// Additive identity.
    fn zero() -> Self;

    /// `self += other`.
    fn accumulate(&mut self, other: Self);

    /// Scale by a scalar weight.
    fn scaled(self, factor: f32) -> Self;

    /// Magnitude used for pruning decisions (absolute value or Euclidean norm).
    fn magnitude(self) -> f32;

    /// True for the additive identity.
    #[inline]
    fn is_zero(self) -> bool {
        self == Self::zero()
    }
}

impl Strength for f32 {
    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn accumulate(&mut self, other: Self) {
        *self += other;
    }

    #[inline]
    fn scaled(self, factor: f32) -> Self {
        self * factor
    }

    #[inline]
    fn magnitude(self) -> f32 {
        self.abs()
    }
}

impl Strength for [f32; 3] {
    #[inline]
    fn zero() -> Self {
        [0.0; 3]
    }

    #[inline]
    fn accumulate(&mut self, other: Self) {
        for (a, b) in self.iter_mut().zip(other) {
            *a += b;
        }
    }

    #[inline]
    fn scaled(self, factor: f32) -> Self {
        self.map(|c| c * factor)
    }

    #[inline]
    fn magnitude(self) -> f32 {
        (self[0] * self[0] + self[1] * self[1] + self[2] * self[2]).sqrt()
    }
}

/// A vortex particle in `D` dimensions carrying strength `V`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle<const D: usize, V> {
    /// Position in world units.
    #[serde(with = "serde_position")]
    pub position: [f32; D],
    /// Circulation (2D) or vorticity vector (3D).
    pub strength: V,
    /// Area (2D) or volume (3D) represented by this particle.
    pub volume: f32,
}

/// 2D particle: scalar strength, `volume` is an area.
pub type Particle2 = Particle<2, f32>;

/// 3D particle: vector strength, `volume` is a volume.
pub type Particle3 = Particle<3, [f32; 3]>;

impl<const D: usize, V: Strength> Particle<D, V> {
    /// Create a particle.
    pub fn new(position: [f32; D], strength: V, volume: f32) -> Self {
        Self {
            position,
            strength,
            volume,
        }
    }
}

/// Total strength of a particle set.
///
/// Summed in fixed-size chunks to bound rounding drift on large sets.
pub fn total_strength<const D: usize, V: Strength>(particles: &[Particle<D, V>]) -> V {
    let mut total = V::zero();
    for chunk in particles.chunks(4096) {
        let mut partial = V::zero();
        for p in chunk {
            partial.accumulate(p.strength);
        }
        total.accumulate(partial);
    }
    total
}

/// Sum of `magnitude()` over a particle set.
pub fn total_magnitude<const D: usize, V: Strength>(particles: &[Particle<D, V>]) -> f64 {
    particles.iter().map(|p| p.strength.magnitude() as f64).sum()
}

/// serde has no blanket impl for `[T; D]` with a const generic `D`.
mod serde_position {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer, const D: usize>(
        value: &[f32; D],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.as_slice().serialize(serializer)
    }

    pub fn deserialize<'de, De: Deserializer<'de>, const D: usize>(
        deserializer: De,
    ) -> Result<[f32; D], De::Error> {
        let values = Vec::<f32>::deserialize(deserializer)?;
        let len = values.len();
        values
            .try_into()
            .map_err(|_| De::Error::invalid_length(len, &"a position with one entry per axis"))
    }
}
