//! Deterministic random number generation for synthetic data.
//!
//! RULE: The generator never calls a platform RNG.
//! Every table draws from its own stream, seeded from
//! (master_seed XOR stream_index). This means:
//!   - Changing the event count never changes the generated users.
//!   - The same seed always reproduces the same snapshot.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG for a single table stream.
pub struct StreamRng {
    inner: Pcg64Mcg,
}

impl StreamRng {
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Uniform pick from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries — only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Users = 0,
    Events = 1,
}

impl Stream {
    pub fn rng(self, master_seed: u64) -> StreamRng {
        StreamRng::new(master_seed, self as u64)
    }
}
