//! Session-seeded pseudo-random source
//!
//! Every stochastic decision in the simulation (spawn choice, drop rolls,
//! cooldown jitter, particle spray) draws from here, so a run is repeatable
//! given its seed. Reseeded once per session start.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

#[derive(Debug, Clone)]
pub struct SessionRng {
    seed: u64,
    rng: Pcg32,
}

impl SessionRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Seed the current sequence was started from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the sequence from a new seed
    pub fn reseed(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Uniform float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Uniform float in [lo, hi)
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Uniform float in [-1, 1)
    pub fn signed(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32() < p
    }

    /// Uniform integer in [lo, hi]
    pub fn range_u32(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        self.rng.random_range(lo..=hi)
    }

    /// Pick from a weighted table; weights need not sum to 1
    pub fn pick_weighted<T: Copy>(&mut self, table: &[(T, f32)]) -> Option<T> {
        let total: f32 = table.iter().map(|(_, w)| w.max(0.0)).sum();
        if total <= 0.0 {
            return table.first().map(|(t, _)| *t);
        }
        let mut r = self.next_f32() * total;
        for &(item, weight) in table {
            let weight = weight.max(0.0);
            if r < weight {
                return Some(item);
            }
            r -= weight;
        }
        // Float rounding can leave r a hair above the last band
        table.last().map(|(t, _)| *t)
    }
}
