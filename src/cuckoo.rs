use std::{borrow::Borrow, mem};

use log::{debug, trace};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    error::Error,
    hash_family::HashFamily,
    utils::{DEFAULT_TABLE_SIZE, HashTable, next_prime, slot_for},
};

/// Highest fraction of slots that may hold a key
pub const MAX_LOAD: f64 = 0.40;
/// Failed eviction chains tolerated at the current size before growing
const ALLOWED_REHASHES: usize = 1;
/// Moves attempted by one eviction chain before the table is rebuilt
const COUNT_LIMIT: usize = 100;
/// Extra draws allowed when the random victim is the slot just filled
const EVICTION_RETRIES: usize = 5;

/// How a new key makes room for itself when all its candidate slots are taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertStrategy {
    /// Take any free candidate slot, otherwise evict the occupant of a randomly
    /// chosen candidate and carry it on
    #[default]
    RandomWalk,
    /// Cycle through the hash functions in order, always displacing whatever
    /// sits in the chosen slot
    Sequential,
}

/// A cuckoo hash set.
///
/// Every key lives in one of the slots named by the functions of its hash
/// family, so a lookup probes at most `number_of_functions` slots. The table
/// never holds more than [`MAX_LOAD`] of its slots.
///
/// When an eviction chain runs for too long the table is rebuilt: first at
/// the same size with a new set of hash functions, and if that also fails,
/// at roughly two and a half times the size. Insertion retries until it
/// succeeds; there is no upper bound on the number of rebuilds, only the
/// growing table making room eventually.
#[derive(Debug, Clone)]
pub struct CuckooHashTable<K, F> {
    /// Slot array, its length always prime
    slots: Vec<Option<K>>,
    /// Number of stored keys
    size: usize,
    /// The hash functions, replaced on in-place rehash
    hash_functions: F,
    /// Cached `hash_functions.number_of_functions()`
    num_hash_functions: usize,
    /// Failed eviction chains since the last expansion
    rehashes: usize,
    /// Placement algorithm used by `insert`
    strategy: InsertStrategy,
    /// Picks eviction victims
    rng: StdRng,
}

impl<K, F> CuckooHashTable<K, F>
where
    K: Eq,
    F: HashFamily<K>,
{
    /// Creates a table of 101 slots over `hash_functions`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyHashFamily`] if the family has no functions.
    pub fn new(hash_functions: F) -> Result<Self, Error> {
        Self::with_capacity(hash_functions, DEFAULT_TABLE_SIZE)
    }

    /// Creates a table with at least `size` slots, rounded up to a prime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyHashFamily`] if the family has no functions.
    pub fn with_capacity(hash_functions: F, size: usize) -> Result<Self, Error> {
        Self::build(hash_functions, size, StdRng::from_rng(&mut rand::rng()))
    }

    /// Creates a table whose eviction choices are reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyHashFamily`] if the family has no functions.
    pub fn with_seed(hash_functions: F, size: usize, seed: u64) -> Result<Self, Error> {
        Self::build(hash_functions, size, StdRng::seed_from_u64(seed))
    }

    /// Shared constructor
    fn build(hash_functions: F, size: usize, rng: StdRng) -> Result<Self, Error> {
        let num_hash_functions = HashFamily::<K>::number_of_functions(&hash_functions);
        if num_hash_functions == 0 {
            return Err(Error::EmptyHashFamily);
        }
        Ok(Self {
            slots: empty_slots(next_prime(size)),
            size: 0,
            hash_functions,
            num_hash_functions,
            rehashes: 0,
            strategy: InsertStrategy::default(),
            rng,
        })
    }

    /// Slot named for `key` by function `which`
    fn slot_index<Q: ?Sized>(&self, key: &Q, which: usize) -> usize
    where
        F: HashFamily<Q>,
    {
        slot_for(HashFamily::<Q>::hash(&self.hash_functions, key, which), self.slots.len())
    }

    /// Probes every candidate slot of `key` for an equal key
    fn find_pos<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        F: HashFamily<Q>,
    {
        (0..self.num_hash_functions).map(|which| self.slot_index(key, which)).find(|&pos| {
            self.slots.get(pos).and_then(Option::as_ref).is_some_and(|stored| stored.borrow() == key)
        })
    }

    /// Returns true if a key equal to `key` is stored
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        F: HashFamily<Q>,
    {
        self.find_pos(key).is_some()
    }

    /// Removes the key equal to `key`, if any
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        F: HashFamily<Q>,
    {
        let Some(pos) = self.find_pos(key) else {
            return false;
        };
        let removed = self.slots.get_mut(pos).and_then(Option::take).is_some();
        if removed {
            self.size = self.size.saturating_sub(1);
        }
        removed
    }

    /// Inserts `key`, returning `false` if it is already present.
    ///
    /// The table is expanded first if one more key would exceed [`MAX_LOAD`].
    pub fn insert(&mut self, key: K) -> bool {
        if self.contains(&key) {
            return false;
        }
        if self.exceeds_max_load(self.size.saturating_add(1)) {
            self.expand();
        }

        match self.strategy {
            InsertStrategy::RandomWalk => self.insert_random_walk(key),
            InsertStrategy::Sequential => self.insert_sequential(key),
        }
        true
    }

    /// Returns true if holding `size` keys would break the load ceiling
    #[allow(clippy::cast_precision_loss)]
    fn exceeds_max_load(&self, size: usize) -> bool {
        size as f64 > self.slots.len() as f64 * MAX_LOAD
    }

    /// Places `item`, evicting random occupants until a free candidate slot
    /// turns up, rebuilding the table whenever a chain gets too long
    fn insert_random_walk(&mut self, mut item: K) {
        loop {
            let mut last_pos = None;

            for _ in 0..COUNT_LIMIT {
                for which in 0..self.num_hash_functions {
                    let pos = self.slot_index(&item, which);
                    if let Some(slot) = self.slots.get_mut(pos) {
                        if slot.is_none() {
                            *slot = Some(item);
                            self.size = self.size.saturating_add(1);
                            return;
                        }
                    }
                }

                let pos = self.eviction_target(&item, last_pos);
                last_pos = Some(pos);
                item = match self.place(pos, item) {
                    Some(displaced) => displaced,
                    None => return,
                };
            }

            trace!("cuckoo eviction chain gave up after {COUNT_LIMIT} moves");
            self.recover();
        }
    }

    /// Places `item` at its candidates for functions `0, 1, 2, ...` in turn,
    /// displacing the occupant each time
    fn insert_sequential(&mut self, mut item: K) {
        loop {
            for count in 0..COUNT_LIMIT {
                let which = count.checked_rem(self.num_hash_functions).unwrap_or_default();
                let pos = self.slot_index(&item, which);
                item = match self.place(pos, item) {
                    Some(displaced) => displaced,
                    None => return,
                };
            }

            trace!("cuckoo sequential chain gave up after {COUNT_LIMIT} moves");
            self.recover();
        }
    }

    /// Puts `item` into slot `pos` and hands back the previous occupant.
    /// Filling an empty slot counts the new key.
    fn place(&mut self, pos: usize, item: K) -> Option<K> {
        let slot = self.slots.get_mut(pos)?;
        let displaced = slot.replace(item);
        if displaced.is_none() {
            self.size = self.size.saturating_add(1);
        }
        displaced
    }

    /// Picks a random candidate slot of `item` to evict, avoiding `last_pos`
    /// for a few draws
    fn eviction_target(&mut self, item: &K, last_pos: Option<usize>) -> usize {
        let mut attempts = 0;
        loop {
            let which = self.rng.random_range(0..self.num_hash_functions);
            let pos = self.slot_index(item, which);
            if Some(pos) != last_pos || attempts >= EVICTION_RETRIES {
                return pos;
            }
            attempts = attempts.saturating_add(1);
        }
    }

    /// Called when an eviction chain fails: rebuild in place with new hash
    /// functions, or grow once too many rebuilds have failed
    fn recover(&mut self) {
        self.rehashes = self.rehashes.saturating_add(1);
        if self.rehashes > ALLOWED_REHASHES {
            self.expand();
            self.rehashes = 0;
        } else {
            self.rehash();
        }
    }

    /// Grows to the next prime at least `capacity / MAX_LOAD`
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn expand(&mut self) {
        let target = (self.slots.len() as f64 / MAX_LOAD) as usize;
        self.rebuild(target);
    }

    /// Draws new hash functions and rebuilds at the current size
    fn rehash(&mut self) {
        debug!("cuckoo rehash: new hash functions at {} slots", self.slots.len());
        HashFamily::<K>::generate_new_functions(&mut self.hash_functions);
        self.rebuild(self.slots.len());
    }

    /// Reallocates at `next_prime(new_len)` slots and reinserts every key
    fn rebuild(&mut self, new_len: usize) {
        let new_len = next_prime(new_len);
        if new_len != self.slots.len() {
            debug!("cuckoo expand: {} -> {} slots ({} keys)", self.slots.len(), new_len, self.size);
        }

        let old_slots = mem::replace(&mut self.slots, empty_slots(new_len));
        self.size = 0;
        for key in old_slots.into_iter().flatten() {
            self.insert(key);
        }
    }

    /// Selects the placement algorithm for later inserts
    pub fn set_insert_strategy(&mut self, strategy: InsertStrategy) {
        self.strategy = strategy;
    }

    /// Returns the placement algorithm in use
    #[must_use]
    pub fn insert_strategy(&self) -> InsertStrategy {
        self.strategy
    }

    /// Returns the hash family in use
    #[must_use]
    pub fn hash_family(&self) -> &F {
        &self.hash_functions
    }

    /// Empties every slot, keeping the current size and hash functions
    pub fn make_empty(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.size = 0;
    }

    /// Returns the number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if no keys are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of slots
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Fraction of slots holding a key
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.slots.len() as f64
    }

    /// Iterates over the keys in slot order
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.slots.iter().flatten()
    }
}

impl<K, F> Extend<K> for CuckooHashTable<K, F>
where
    K: Eq,
    F: HashFamily<K>,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, F> HashTable<K> for CuckooHashTable<K, F>
where
    K: Eq,
    F: HashFamily<K>,
{
    fn insert(&mut self, key: K) -> bool {
        self.insert(key)
    }

    fn remove(&mut self, key: &K) -> bool {
        self.remove(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.contains(key)
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn capacity(&self) -> usize {
        self.capacity()
    }

    fn make_empty(&mut self) {
        self.make_empty();
    }
}

/// Allocates `len` empty slots
fn empty_slots<K>(len: usize) -> Vec<Option<K>> {
    std::iter::repeat_with(|| None).take(len).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::hash::{DefaultHasher, Hash, Hasher};

    use super::*;
    use crate::hash_family::{SeededHashFamily, StringHashFamily};

    /// Sends every key to slot 0 until it has been regenerated `good_after`
    /// times, then behaves like an ordinary seeded family
    #[derive(Debug)]
    struct StubbornFamily {
        functions: usize,
        generation: usize,
        good_after: usize,
    }

    impl StubbornFamily {
        fn new(functions: usize, good_after: usize) -> Self {
            Self { functions, generation: 0, good_after }
        }
    }

    impl<K: Hash + ?Sized> HashFamily<K> for StubbornFamily {
        fn number_of_functions(&self) -> usize {
            self.functions
        }

        fn hash(&self, key: &K, which: usize) -> u64 {
            if self.generation < self.good_after {
                return 0;
            }
            let mut hasher = DefaultHasher::new();
            which.hash(&mut hasher);
            self.generation.hash(&mut hasher);
            key.hash(&mut hasher);
            hasher.finish()
        }

        fn generate_new_functions(&mut self) {
            self.generation += 1;
        }
    }

    fn seeded_table(functions: usize) -> CuckooHashTable<u64, SeededHashFamily> {
        CuckooHashTable::with_seed(SeededHashFamily::with_seed(functions, 3), 101, 17).unwrap()
    }

    #[test]
    fn test_insert_and_contains() {
        let mut table = seeded_table(2);
        assert!(table.insert(1));
        assert!(table.insert(2));
        assert!(table.insert(3));

        assert!(table.contains(&2));
        assert!(!table.contains(&4));
        assert_eq!(table.len(), 3);
        assert_eq!(table.capacity(), 101);
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut table = seeded_table(2);
        assert!(table.insert(7));
        assert!(!table.insert(7));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut table = seeded_table(3);
        table.extend(0..20);

        assert!(table.remove(&5));
        assert!(!table.contains(&5));
        assert!(!table.remove(&5));
        assert_eq!(table.len(), 19);
        assert!(table.insert(5));
        assert_eq!(table.len(), 20);
    }

    #[test]
    fn test_string_keys() {
        let family = StringHashFamily::with_seed(3, 1);
        let mut table = CuckooHashTable::with_seed(family, 7, 2).unwrap();
        for key in ["a", "b", "c"] {
            assert!(table.insert(key.to_string()));
        }
        assert!(table.contains("b"));
        assert!(!table.contains("z"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_single_character_and_leading_nul_keys() {
        let family = StringHashFamily::with_seed(3, 1);
        let mut table = CuckooHashTable::with_seed(family, 101, 1).unwrap();
        assert!(table.insert("a".to_string()));
        assert!(table.insert("\0a".to_string()));
        assert!(table.insert("\0\0a".to_string()));
        assert!(table.contains("a"));
        assert!(table.contains("\0a"));
        assert!(table.contains("\0\0a"));
        assert_eq!(table.len(), 3);
        assert_eq!(table.capacity(), 101);
    }

    #[test]
    fn test_empty_family_is_rejected() {
        let result = CuckooHashTable::<u64, _>::new(SeededHashFamily::with_seed(0, 1));
        assert_eq!(result.err(), Some(Error::EmptyHashFamily));
    }

    #[test]
    fn test_load_never_exceeds_max() {
        let mut table = seeded_table(2);
        for key in 0..2000 {
            assert!(table.insert(key));
            assert!(table.load_factor() <= MAX_LOAD, "load {} at {key}", table.load_factor());
        }
        assert_eq!(table.len(), 2000);
        assert!((0..2000).all(|key| table.contains(&key)));
    }

    #[test]
    fn test_expand_grows_by_max_load() {
        let mut table =
            CuckooHashTable::with_seed(SeededHashFamily::with_seed(3, 5), 11, 5).unwrap();
        for key in 0..5 {
            table.insert(key);
        }
        // 5 keys exceed 40% of 11 slots; 11 / 0.4 = 27, next prime 29
        assert_eq!(table.capacity(), 29);
        assert!((0..5).all(|key| table.contains(&key)));
    }

    #[test]
    fn test_failed_chain_rehashes_in_place() {
        let mut table = CuckooHashTable::with_seed(StubbornFamily::new(2, 1), 101, 9).unwrap();
        assert!(table.insert(1_u32));
        assert!(table.insert(2_u32));

        assert_eq!(table.hash_family().generation, 1);
        assert_eq!(table.capacity(), 101);
        assert!(table.contains(&1));
        assert!(table.contains(&2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_repeated_failures_expand() {
        let mut table = CuckooHashTable::with_seed(StubbornFamily::new(2, 2), 101, 9).unwrap();
        assert!(table.insert(1_u32));
        assert!(table.insert(2_u32));

        // rehash, then expand at 101 / 0.4 = 252 -> 257, then rehash again
        assert_eq!(table.capacity(), 257);
        assert_eq!(table.hash_family().generation, 2);
        assert!(table.contains(&1));
        assert!(table.contains(&2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_sequential_strategy() {
        let mut table = seeded_table(3);
        table.set_insert_strategy(InsertStrategy::Sequential);
        assert_eq!(table.insert_strategy(), InsertStrategy::Sequential);

        for key in 0..1000 {
            assert!(table.insert(key));
        }
        assert_eq!(table.len(), 1000);
        assert_eq!(table.iter().count(), 1000);
        assert!((0..1000).all(|key| table.contains(&key)));
        assert!(table.load_factor() <= MAX_LOAD);
    }

    #[test]
    fn test_sequential_strategy_recovers_from_failed_chain() {
        let mut table = CuckooHashTable::with_seed(StubbornFamily::new(2, 1), 101, 9).unwrap();
        table.set_insert_strategy(InsertStrategy::Sequential);
        assert!(table.insert(1_u32));
        assert!(table.insert(2_u32));
        assert_eq!(table.len(), 2);
        assert!(table.contains(&1));
        assert!(table.contains(&2));
    }

    #[test]
    fn test_make_empty() {
        let mut table = seeded_table(2);
        table.extend(0..30);
        let capacity = table.capacity();
        table.make_empty();

        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert!(!table.contains(&1));
        assert!(table.insert(1));
    }
}
