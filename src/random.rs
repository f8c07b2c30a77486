//! Injectable random stream for layout decisions
//!
//! Every pseudo-random choice in the cover layout goes through
//! [`RandomStream`], so a fixed seed reproduces the same placement and tests
//! can script exact values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of layout randomness
pub trait RandomStream {
    /// Integer in `low..=high`
    fn int_in(&mut self, low: i64, high: i64) -> i64;

    /// Float in `low..=high`
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Fisher-Yates shuffle driven by a [`RandomStream`]
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomStream) {
    for i in (1..items.len()).rev() {
        let j = rng.int_in(0, i as i64) as usize;
        items.swap(i, j);
    }
}

/// `StdRng` seeded from the build seed, or from OS entropy without one
#[derive(Debug, Clone)]
pub struct SeededStream {
    rng: StdRng,
    seed: Option<u64>,
}

impl SeededStream {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self { rng, seed }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl RandomStream for SeededStream {
    fn int_in(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.random_range(low..=high)
    }
}

/// Replays fixed values in a loop; ints are clamped into the requested range
#[derive(Debug, Clone, Default)]
pub struct ScriptedStream {
    ints: Vec<i64>,
    floats: Vec<f64>,
    int_pos: usize,
    float_pos: usize,
}

impl ScriptedStream {
    pub fn new(ints: Vec<i64>, floats: Vec<f64>) -> Self {
        Self {
            ints,
            floats,
            int_pos: 0,
            float_pos: 0,
        }
    }
}

impl RandomStream for ScriptedStream {
    fn int_in(&mut self, low: i64, high: i64) -> i64 {
        if self.ints.is_empty() {
            return low;
        }
        let value = self.ints[self.int_pos % self.ints.len()];
        self.int_pos += 1;
        value.clamp(low, high.max(low))
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if self.floats.is_empty() {
            return low;
        }
        let value = self.floats[self.float_pos % self.floats.len()];
        self.float_pos += 1;
        value.clamp(low, high.max(low))
    }
}
