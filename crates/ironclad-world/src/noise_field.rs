//! Seeded 2D coherent noise.

use noise::{NoiseFn, OpenSimplex};

/// Deterministic 2D coherent noise, seeded once.
///
/// `eval` is a pure function of `(seed, x, y)` with output in `[-1, 1]`.
/// It is defined for every finite input; non-finite inputs evaluate to 0.
#[derive(Clone)]
pub struct NoiseField {
    seed: u64,
    source: OpenSimplex,
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}

impl NoiseField {
    /// Creates a noise field for the given world seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            source: OpenSimplex::new(fold_seed(seed)),
        }
    }

    /// Returns the world seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Samples the field at `(x, y)`.
    #[must_use]
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        if !x.is_finite() || !y.is_finite() {
            return 0.0;
        }
        self.source.get([x, y]).clamp(-1.0, 1.0)
    }
}

/// Folds a 64-bit seed into the 32-bit seed the permutation table takes.
const fn fold_seed(seed: u64) -> u32 {
    ((seed >> 32) as u32) ^ (seed as u32)
}
