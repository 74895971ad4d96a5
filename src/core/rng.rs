// Copyright @yucwang 2026

use crate::math::constants::Float;

/// Worker-local linear congruential generator. Each render worker owns one,
/// so ray jitter never shares state across threads.
#[derive(Debug, Clone)]
pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.state >> 32) as u32
    }

    /// Uniform sample in [0, 1).
    pub fn next_float(&mut self) -> Float {
        (self.next_u32() as Float) / ((u32::MAX as Float) + 1.0)
    }
}

/// Mixes a base seed with a worker index (splitmix64 finalizer) so that
/// neighbouring workers start from decorrelated streams.
pub fn derive_seed(base: u64, index: usize) -> u64 {
    let mut z = base ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
