use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    mem,
};

use log::debug;

use crate::utils::{DEFAULT_TABLE_SIZE, DefaultHashBuilder, HashTable, next_prime, slot_for};

/// A single cell of the probing array
#[derive(Debug, Clone)]
enum Slot<K> {
    /// Never written since the last rebuild
    Empty,
    /// Holds a live key
    Active(K),
    /// Holds a removed key; still ends a probe for an equal key
    Tombstone(K),
}

impl<K> Slot<K> {
    /// The key stored in the slot, live or not
    fn key(&self) -> Option<&K> {
        match self {
            Self::Empty => None,
            Self::Active(key) | Self::Tombstone(key) => Some(key),
        }
    }

    /// Returns true if the slot holds a live key
    fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// Turns a live key into a tombstone. Returns false if the slot was not live.
    fn deactivate(&mut self) -> bool {
        match mem::replace(self, Self::Empty) {
            Self::Active(key) => {
                *self = Self::Tombstone(key);
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }
}

/// An open-addressing hash set using quadratic probing and lazy deletion.
///
/// Removed keys leave a tombstone behind so that probe sequences through
/// them stay intact. Tombstones count toward the occupancy that triggers a
/// rebuild, and are dropped when the table is rebuilt at the next prime at
/// least twice as large.
///
/// Note: the table is kept at most half occupied, which together with the
/// prime length guarantees every probe sequence reaches a free slot.
#[derive(Debug, Clone)]
pub struct QuadraticProbingHashTable<K, S = DefaultHashBuilder> {
    /// The probing array
    slots: Vec<Slot<K>>,
    /// Number of live keys
    size: usize,
    /// Number of slots holding a live key or a tombstone
    occupied: usize,
    /// Builds the hasher used for the home slot
    hash_builder: S,
}

impl<K, S> Default for QuadraticProbingHashTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, S> Extend<K> for QuadraticProbingHashTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, S> FromIterator<K> for QuadraticProbingHashTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<K> QuadraticProbingHashTable<K>
where
    K: Eq + Hash,
{
    /// Creates a table with the default 101 slots
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TABLE_SIZE)
    }

    /// Creates a table with at least `size` slots, rounded up to a prime
    #[must_use]
    pub fn with_capacity(size: usize) -> Self {
        Self::with_capacity_and_hasher(size, DefaultHashBuilder::default())
    }
}

impl<K, S> QuadraticProbingHashTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates a table with the default size that hashes keys with `hash_builder`
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_TABLE_SIZE, hash_builder)
    }

    /// Creates a table with at least `size` slots that hashes keys with `hash_builder`
    pub fn with_capacity_and_hasher(size: usize, hash_builder: S) -> Self {
        Self { slots: empty_slots(next_prime(size)), size: 0, occupied: 0, hash_builder }
    }

    /// Slot where the probe sequence for `key` starts
    fn home<Q: ?Sized + Hash>(&self, key: &Q) -> usize {
        slot_for(self.hash_builder.hash_one(key), self.slots.len())
    }

    /// Walks the probe sequence `home, home + 1, home + 4, home + 9, ...` and
    /// stops at the first empty slot or the first slot holding `key`, live or
    /// tombstoned.
    fn find_pos<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let len = self.slots.len();
        let mut offset: usize = 1;
        let mut pos = self.home(key);

        while let Some(stored) = self.slots.get(pos).and_then(Slot::key) {
            if stored.borrow() == key {
                break;
            }
            pos = pos.saturating_add(offset).checked_rem(len).unwrap_or_default();
            offset = offset.saturating_add(2);
        }
        pos
    }

    /// Returns true if the slot at `pos` holds a live key
    fn is_active(&self, pos: usize) -> bool {
        self.slots.get(pos).is_some_and(Slot::is_active)
    }

    /// Inserts `key`, returning `false` if it is already live in the table.
    ///
    /// A tombstone left by an earlier removal of the same key is revived in
    /// place.
    pub fn insert(&mut self, key: K) -> bool {
        let pos = self.find_pos(&key);
        let Some(slot) = self.slots.get_mut(pos) else {
            return false;
        };
        let fresh = match slot {
            Slot::Active(_) => return false,
            Slot::Empty => true,
            Slot::Tombstone(_) => false,
        };

        *slot = Slot::Active(key);
        self.size = self.size.saturating_add(1);
        if fresh {
            self.occupied = self.occupied.saturating_add(1);
            if self.occupied > self.slots.len() / 2 {
                self.rehash();
            }
        }
        true
    }

    /// Marks the live key equal to `key` as removed
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.find_pos(key);
        let removed = self.slots.get_mut(pos).is_some_and(Slot::deactivate);
        if removed {
            self.size = self.size.saturating_sub(1);
        }
        removed
    }

    /// Returns true if a live key equal to `key` is stored
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.is_active(self.find_pos(key))
    }

    /// Clears every slot, tombstones included
    pub fn make_empty(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.size = 0;
        self.occupied = 0;
    }

    /// Returns the number of live keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if no live keys are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the length of the probing array
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of slots holding a live key or a tombstone
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Iterates over the live keys in slot order
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Active(key) => Some(key),
            Slot::Empty | Slot::Tombstone(_) => None,
        })
    }

    /// Rebuilds at the next prime at least twice as large, keeping only live keys
    fn rehash(&mut self) {
        let new_len = next_prime(self.slots.len().saturating_mul(2));
        debug!(
            "quadratic probing rehash: {} -> {} slots ({} live, {} tombstones)",
            self.slots.len(),
            new_len,
            self.size,
            self.occupied.saturating_sub(self.size)
        );

        let old_slots = mem::replace(&mut self.slots, empty_slots(new_len));
        self.size = 0;
        self.occupied = 0;
        for slot in old_slots {
            if let Slot::Active(key) = slot {
                self.insert(key);
            }
        }
    }
}

impl<K, S> HashTable<K> for QuadraticProbingHashTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
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
fn empty_slots<K>(len: usize) -> Vec<Slot<K>> {
    std::iter::repeat_with(|| Slot::Empty).take(len).collect()
}
