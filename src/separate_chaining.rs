use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    mem,
};

use log::debug;

use crate::utils::{DEFAULT_TABLE_SIZE, DefaultHashBuilder, HashTable, next_prime, slot_for};

/// A hash set resolving collisions with one chain per bucket.
///
/// The number of buckets is always prime. Once the number of keys exceeds
/// the number of buckets the table grows to the next prime at least twice
/// as large and every key is reinserted in bucket order.
#[derive(Debug, Clone)]
pub struct SeparateChainingHashTable<K, S = DefaultHashBuilder> {
    /// The chains, each holding its keys in insertion order
    buckets: Vec<Vec<K>>,
    /// Total number of keys across all chains
    size: usize,
    /// Builds the hasher used to pick a bucket
    hash_builder: S,
}

impl<K, S> Default for SeparateChainingHashTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, S> Extend<K> for SeparateChainingHashTable<K, S>
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

impl<K, S> FromIterator<K> for SeparateChainingHashTable<K, S>
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

impl<K> SeparateChainingHashTable<K>
where
    K: Eq + Hash,
{
    /// Creates a table with the default 101 buckets
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TABLE_SIZE)
    }

    /// Creates a table with at least `size` buckets, rounded up to a prime
    #[must_use]
    pub fn with_capacity(size: usize) -> Self {
        Self::with_capacity_and_hasher(size, DefaultHashBuilder::default())
    }
}

impl<K, S> SeparateChainingHashTable<K, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates a table with the default size that hashes keys with `hash_builder`
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_TABLE_SIZE, hash_builder)
    }

    /// Creates a table with at least `size` buckets that hashes keys with `hash_builder`
    pub fn with_capacity_and_hasher(size: usize, hash_builder: S) -> Self {
        Self { buckets: empty_buckets(next_prime(size)), size: 0, hash_builder }
    }

    /// Index of the bucket `key` belongs to
    fn bucket_index<Q: ?Sized + Hash>(&self, key: &Q) -> usize {
        slot_for(self.hash_builder.hash_one(key), self.buckets.len())
    }

    /// Inserts `key` unless an equal key is already in its bucket.
    ///
    /// Returns `false` for a duplicate, leaving the table untouched.
    pub fn insert(&mut self, key: K) -> bool {
        let index = self.bucket_index(&key);
        let Some(bucket) = self.buckets.get_mut(index) else {
            return false;
        };
        if bucket.contains(&key) {
            return false;
        }

        bucket.push(key);
        self.size = self.size.saturating_add(1);
        if self.size > self.buckets.len() {
            self.rehash();
        }
        true
    }

    /// Removes the key equal to `key`, if any
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        let Some(bucket) = self.buckets.get_mut(index) else {
            return false;
        };
        match bucket.iter().position(|k| k.borrow() == key) {
            Some(position) => {
                bucket.remove(position);
                self.size = self.size.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    /// Returns true if a key equal to `key` is stored
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets
            .get(self.bucket_index(key))
            .is_some_and(|bucket| bucket.iter().any(|k| k.borrow() == key))
    }

    /// Empties every chain, keeping the current number of buckets
    pub fn make_empty(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.size = 0;
    }

    /// Returns the number of keys in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the table holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of buckets
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Average chain length
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.size as f64 / self.buckets.len() as f64
    }

    /// Iterates over the keys bucket by bucket
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.buckets.iter().flatten()
    }

    /// Grows to the next prime at least twice the bucket count and reinserts
    /// every key, walking the old buckets in order
    fn rehash(&mut self) {
        let new_len = next_prime(self.buckets.len().saturating_mul(2));
        debug!("separate chaining rehash: {} -> {} buckets", self.buckets.len(), new_len);

        let old_buckets = mem::replace(&mut self.buckets, empty_buckets(new_len));
        self.size = 0;
        for key in old_buckets.into_iter().flatten() {
            self.insert(key);
        }
    }
}

impl<K, S> HashTable<K> for SeparateChainingHashTable<K, S>
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

/// Allocates `len` empty chains
fn empty_buckets<K>(len: usize) -> Vec<Vec<K>> {
    std::iter::repeat_with(Vec::new).take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut table = SeparateChainingHashTable::with_capacity(7);
        assert!(table.insert("a".to_string()));
        assert!(table.insert("b".to_string()));
        assert!(table.insert("c".to_string()));

        assert!(table.contains("b"));
        assert!(!table.contains("z"));
        assert_eq!(table.len(), 3);
        assert_eq!(table.capacity(), 7);
    }

    #[test]
    fn test_duplicate_insert_is_ignored() {
        let mut table = SeparateChainingHashTable::new();
        assert!(table.insert(42));
        assert!(!table.insert(42));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut table = SeparateChainingHashTable::new();
        table.insert("key1".to_string());
        table.insert("key2".to_string());

        assert!(table.remove("key1"));
        assert!(!table.contains("key1"));
        assert!(table.contains("key2"));
        assert!(!table.remove("key1"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_rehash_grows_to_next_prime() {
        let mut table = SeparateChainingHashTable::with_capacity(7);
        for i in 0..7 {
            table.insert(i);
        }
        assert_eq!(table.capacity(), 7);

        // The eighth key pushes the size past the bucket count
        table.insert(7);
        assert_eq!(table.capacity(), 17);
        assert_eq!(table.len(), 8);
        for i in 0..8 {
            assert!(table.contains(&i));
        }
    }

    #[test]
    fn test_many_rehashes_keep_every_key() {
        let mut table = SeparateChainingHashTable::with_capacity(3);
        for i in 0..1000 {
            table.insert(i);
        }
        assert_eq!(table.len(), 1000);
        assert!(table.capacity() >= 1000);
        assert!(crate::utils::is_prime(table.capacity()));
        assert_eq!(table.iter().count(), 1000);
        assert!((0..1000).all(|i| table.contains(&i)));
    }

    #[test]
    fn test_make_empty() {
        let mut table: SeparateChainingHashTable<i32> = (0..50).collect();
        let capacity = table.capacity();
        table.make_empty();

        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert!(!table.contains(&3));
        assert!(table.insert(3));
    }

    #[test]
    fn test_load_factor() {
        let mut table = SeparateChainingHashTable::with_capacity(11);
        table.extend(0..11);
        assert!((table.load_factor() - 1.0).abs() < f64::EPSILON);
    }
}
