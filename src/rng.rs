use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// seeded random source shared by the greedy and tabu phases.
/// every stochastic decision goes through here so a run is reproducible from its seed.
#[derive(Clone, Debug)]
pub struct SearchRng {
    inner: Pcg32,
}

impl SearchRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: Pcg32::seed_from_u64(seed) }
    }

    /// uniform integer in the closed range [min, max]
    #[inline]
    pub fn uniform_int(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        self.inner.random_range(min..=max)
    }

    /// uniform index in [0, len). len must be non-zero
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        if len <= 1 {
            return 0;
        }
        self.inner.random_range(0..len)
    }

    /// uniform float in the half-open range [min, max)
    #[inline]
    pub fn uniform_float(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        self.inner.random_range(min..max)
    }
}
