//! # Seeded Randomness
//!
//! All terrain generation consumes randomness through [`TerrainRng`],
//! injected at construction. There is no process-wide RNG state:
//! given the same [`FieldSeed`] and the same call sequence, generation
//! is bit-for-bit reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed for deterministic terrain generation.
///
/// All heightfield randomness derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSeed(u64);

impl FieldSeed {
    /// Creates a new field seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose.
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a style mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for FieldSeed {
    fn default() -> Self {
        Self(0xC0FF_EE00_5EED_5EED)
    }
}

/// Source of randomness for terrain generation.
///
/// Stateful and not thread-shared; every entry point that perturbs
/// terrain takes one of these explicitly.
pub trait TerrainRng {
    /// Returns the next pseudo-random integer.
    fn next_int(&mut self) -> i32;

    /// Returns a uniform float in `[min, max]`.
    ///
    /// When the range is empty or inverted, returns `min` (a zero-width
    /// amplitude must produce zero noise, not panic).
    fn next_float_in_range(&mut self, min: f32, max: f32) -> f32;
}

/// [`TerrainRng`] backed by ChaCha8.
///
/// ChaCha gives identical streams on every platform, which is what
/// keeps worlds portable across saves and architectures.
pub struct SeededRng {
    inner: ChaCha8Rng,
}

impl SeededRng {
    /// Creates a generator from a field seed.
    #[must_use]
    pub fn new(seed: FieldSeed) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed.value()),
        }
    }
}

impl TerrainRng for SeededRng {
    fn next_int(&mut self) -> i32 {
        self.inner.gen()
    }

    fn next_float_in_range(&mut self, min: f32, max: f32) -> f32 {
        if min < max {
            self.inner.gen_range(min..=max)
        } else {
            min
        }
    }
}
