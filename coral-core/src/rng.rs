//! Per-run random stream.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The single random stream consumed by one growth run.
///
/// Owned by the engine for the duration of a run, never shared between
/// runs. ChaCha8 pins the algorithm, so a seed reproduces the same
/// sequence on every platform.
#[derive(Debug, Clone)]
pub struct GrowthRng {
    inner: ChaCha8Rng,
    seed: Option<u64>,
}

impl GrowthRng {
    /// Seeds the stream, or draws a fresh seed from the thread RNG when
    /// `seed` is `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let inner = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        Self { inner, seed }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Uniform draw in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.inner.random::<f64>()
    }

    /// Uniform draw in `[lo, hi]`.
    #[inline]
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        self.inner.random_range(lo..=hi)
    }

    /// Returns `true` with probability `p` (one draw, always consumed).
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p
    }

    /// Multiplicative jitter factor in `[1 - amount, 1 + amount]`.
    ///
    /// Always consumes exactly one draw, so the stream position does not
    /// depend on `amount`.
    #[inline]
    pub fn jitter(&mut self, amount: f64) -> f64 {
        1.0 + amount * self.range(-1.0, 1.0)
    }
}
