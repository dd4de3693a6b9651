//! Utility functions and traits shared by the hash tables

use std::hash::{BuildHasherDefault, DefaultHasher};

/// Hasher builder used when none is supplied. Unseeded, so a key hashes to the
/// same value in every table and every run.
pub type DefaultHashBuilder = BuildHasherDefault<DefaultHasher>;

/// Initial number of slots (or buckets) when no size is given.
pub const DEFAULT_TABLE_SIZE: usize = 101;

/// Common surface of the hash tables in this crate.
///
/// Lets callers such as timing harnesses drive any of the tables through
/// one seam. Every table answers duplicates and misses with `false` rather
/// than an error.
pub trait HashTable<K> {
    /// Inserts `key`, returning `false` if it was already present
    fn insert(&mut self, key: K) -> bool;

    /// Removes `key`, returning `true` if it was present
    fn remove(&mut self, key: &K) -> bool;

    /// Returns true if the table holds `key`
    fn contains(&self, key: &K) -> bool;

    /// Number of keys currently stored
    fn len(&self) -> usize;

    /// Returns true if no keys are stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the underlying array
    fn capacity(&self) -> usize;

    /// Removes every key without shrinking the table
    fn make_empty(&mut self);
}

/// Maps a raw hash onto `0..len`.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn slot_for(hash: u64, len: usize) -> usize {
    hash.checked_rem(len as u64).unwrap_or_default() as usize
}

/// Returns true if `n` is prime. Trial division, only meant for table sizes.
#[must_use]
pub fn is_prime(n: usize) -> bool {
    if n == 2 || n == 3 {
        return true;
    }
    if n < 2 || n.checked_rem(2) == Some(0) {
        return false;
    }
    let mut i: usize = 3;
    while i.saturating_mul(i) <= n {
        if n.checked_rem(i) == Some(0) {
            return false;
        }
        i = i.saturating_add(2);
    }
    true
}

/// Smallest odd prime at least as large as `n`.
///
/// Even inputs are bumped to the next odd number first, so 2 maps to 3.
#[must_use]
pub fn next_prime(n: usize) -> usize {
    let mut candidate = if n.checked_rem(2) == Some(0) { n.saturating_add(1) } else { n };
    while !is_prime(candidate) {
        candidate = candidate.saturating_add(2);
    }
    candidate
}
