//! Families of independent hash functions for cuckoo hashing

use std::hash::{DefaultHasher, Hash, Hasher};

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// A fixed number of hash functions over `K` that can be replaced on demand.
///
/// The cuckoo table asks for `hash(key, which)` with `which` in
/// `0..number_of_functions()`, and calls `generate_new_functions` when it
/// gives up on the current family and rebuilds in place.
pub trait HashFamily<K: ?Sized> {
    /// Number of functions in the family. Must not change over its lifetime.
    fn number_of_functions(&self) -> usize;

    /// Hash of `key` under function `which`
    fn hash(&self, key: &K, which: usize) -> u64;

    /// Replaces every function with a freshly drawn one
    fn generate_new_functions(&mut self);
}

/// Hash functions over any `Hash` key, each one the default hasher keyed with
/// its own random seed.
#[derive(Debug, Clone)]
pub struct SeededHashFamily {
    /// One seed per function
    seeds: Vec<u64>,
    /// Source of new seeds
    rng: StdRng,
}

impl SeededHashFamily {
    /// Creates `functions` hash functions seeded from the thread RNG
    #[must_use]
    pub fn new(functions: usize) -> Self {
        Self::from_rng(functions, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates a reproducible family
    #[must_use]
    pub fn with_seed(functions: usize, seed: u64) -> Self {
        Self::from_rng(functions, StdRng::seed_from_u64(seed))
    }

    /// Draws the initial seeds from `rng`
    fn from_rng(functions: usize, mut rng: StdRng) -> Self {
        let seeds = (0..functions).map(|_| rng.random()).collect();
        Self { seeds, rng }
    }
}

impl<K: Hash + ?Sized> HashFamily<K> for SeededHashFamily {
    fn number_of_functions(&self) -> usize {
        self.seeds.len()
    }

    fn hash(&self, key: &K, which: usize) -> u64 {
        let mut hasher = DefaultHasher::new();
        hasher.write_u64(self.seeds.get(which).copied().unwrap_or_default());
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn generate_new_functions(&mut self) {
        for seed in &mut self.seeds {
            *seed = self.rng.random();
        }
        debug!("regenerated {} seeded hash functions", self.seeds.len());
    }
}

/// Multiplicative string hashes: function `i` starts from `offset[i]` and
/// folds the characters of the key as `h = h * multiplier[i] + c`.
///
/// The random starting value keeps one-character keys and keys with leading
/// NUL characters apart across functions.
#[derive(Debug, Clone)]
pub struct StringHashFamily {
    /// One odd multiplier per function
    multipliers: Vec<u64>,
    /// Initial fold value per function
    offsets: Vec<u64>,
    /// Source of new multipliers
    rng: StdRng,
}

impl StringHashFamily {
    /// Creates `functions` string hashes with multipliers from the thread RNG
    #[must_use]
    pub fn new(functions: usize) -> Self {
        Self::from_rng(functions, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates a reproducible family
    #[must_use]
    pub fn with_seed(functions: usize, seed: u64) -> Self {
        Self::from_rng(functions, StdRng::seed_from_u64(seed))
    }

    /// Draws the initial multipliers and offsets from `rng`
    fn from_rng(functions: usize, mut rng: StdRng) -> Self {
        let multipliers = (0..functions).map(|_| odd_multiplier(&mut rng)).collect();
        let offsets = (0..functions).map(|_| rng.random()).collect();
        Self { multipliers, offsets, rng }
    }
}

/// Odd so that no multiplier collapses the hash onto the last character
fn odd_multiplier(rng: &mut StdRng) -> u64 {
    rng.random::<u64>() | 1
}

impl<K: AsRef<str> + ?Sized> HashFamily<K> for StringHashFamily {
    fn number_of_functions(&self) -> usize {
        self.multipliers.len()
    }

    fn hash(&self, key: &K, which: usize) -> u64 {
        let multiplier = self.multipliers.get(which).copied().unwrap_or(1);
        let offset = self.offsets.get(which).copied().unwrap_or_default();
        key.as_ref()
            .chars()
            .fold(offset, |h, c| h.wrapping_mul(multiplier).wrapping_add(u64::from(c)))
    }

    fn generate_new_functions(&mut self) {
        for multiplier in &mut self.multipliers {
            *multiplier = odd_multiplier(&mut self.rng);
        }
        for offset in &mut self.offsets {
            *offset = self.rng.random();
        }
        debug!("regenerated {} string hash functions", self.multipliers.len());
    }
}
