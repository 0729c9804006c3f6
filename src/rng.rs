//! Per-game seed source.
//!
//! Uses the `rand` crate with `SmallRng` (xoshiro256++), which is fast and
//! works under WASM. Entropy comes from `getrandom` (browser crypto API).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Largest integer a JS number holds exactly. Seeds never exceed it.
pub const MAX_SAFE_SEED: u64 = (1 << 53) - 1;

/// `seed` as a JS number, dropping bits above [`MAX_SAFE_SEED`].
pub fn seed_to_f64(seed: u64) -> f64 {
    (seed & MAX_SAFE_SEED) as f64
}

/// Hands out one engine seed per game so batch members never share randomness.
///
/// Seeded sources replay the same sequence, which makes a whole batch
/// reproducible given an engine that honours `set_seed`.
pub struct SeedSource {
    inner: SmallRng,
}

impl SeedSource {
    /// Create from system entropy (browser crypto.getRandomValues or OS).
    pub fn new() -> Self {
        Self {
            inner: SmallRng::from_os_rng(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// `from_seed` when a base seed is configured, entropy otherwise.
    pub fn from_config(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::from_seed)
    }

    #[inline]
    pub fn next_seed(&mut self) -> u64 {
        self.inner.random::<u64>() & MAX_SAFE_SEED
    }

    pub fn take(&mut self, n: usize) -> Vec<u64> {
        (0..n).map(|_| self.next_seed()).collect()
    }
}

impl Default for SeedSource {
    fn default() -> Self {
        Self::new()
    }
}
