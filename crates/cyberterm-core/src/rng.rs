#![forbid(unsafe_code)]

//! Pseudo-random source for decorative effects.
//!
//! Production visuals may run unseeded; every test seeds explicitly so spawn
//! and trigger probabilities are reproducible.

use std::ops::Range;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Small, fast RNG shared by the decorative subsystems.
#[derive(Debug, Clone)]
pub struct FxRng {
    inner: SmallRng,
    seed: Option<u64>,
}

impl FxRng {
    /// Deterministic generator from an explicit seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Generator seeded from OS entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            inner: SmallRng::from_os_rng(),
            seed: None,
        }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    #[must_use]
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Seed this generator was built from, if any.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Derive an independent generator for a child subsystem.
    ///
    /// Seeded parents produce seeded children, so a single session seed
    /// reproduces every subsystem.
    #[must_use]
    pub fn fork(&mut self, salt: u64) -> Self {
        match self.seed {
            Some(seed) => Self::seeded(seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            None => Self {
                inner: SmallRng::seed_from_u64(self.inner.random::<u64>() ^ salt),
                seed: None,
            },
        }
    }

    /// `true` with probability `p` (clamped to `[0, 1]`; NaN is never).
    pub fn chance(&mut self, p: f64) -> bool {
        if p.is_nan() || p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        self.inner.random_bool(p)
    }

    /// Uniform `f32` in `range`; returns `range.start` for an empty or
    /// unbounded range.
    pub fn range_f32(&mut self, range: Range<f32>) -> f32 {
        if !(range.start < range.end && (range.end - range.start).is_finite()) {
            return range.start;
        }
        self.inner.random_range(range)
    }

    /// Uniform `u32` in `range`; returns `range.start` for an empty range.
    pub fn range_u32(&mut self, range: Range<u32>) -> u32 {
        if range.start >= range.end {
            return range.start;
        }
        self.inner.random_range(range)
    }

    /// Uniform index below `len`; `None` when `len == 0`.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.inner.random_range(0..len))
    }
}
