//! # Hash Kit
//!
//! In-memory hash sets built on three collision-resolution schemes, plus a
//! binary min-heap.
//!
//! - `SeparateChainingHashTable`: one chain per bucket, grows once there are
//!   more keys than buckets
//! - `QuadraticProbingHashTable`: open addressing with quadratic probing and
//!   tombstones, kept at most half occupied
//! - `CuckooHashTable`: every key sits in one of a few slots picked by a
//!   `HashFamily`, with eviction chains and in-place rehashing
//! - `BinaryHeap`: array-backed min-heap priority queue
//!
//! Table sizes are always prime. None of the containers are thread-safe;
//! wrap them in a lock to share them.
//!
//! ## Basic Usage
//!
//! ```rust
//! use hashkit::{CuckooHashTable, SeparateChainingHashTable, StringHashFamily};
//!
//! let mut chained = SeparateChainingHashTable::with_capacity(7);
//! chained.insert("a".to_string());
//! chained.insert("b".to_string());
//! assert!(chained.contains("b"));
//! assert!(!chained.contains("z"));
//!
//! let mut cuckoo = CuckooHashTable::new(StringHashFamily::new(3)).unwrap();
//! assert!(cuckoo.insert("apple".to_string()));
//! assert!(!cuckoo.insert("apple".to_string()));
//! assert!(cuckoo.remove("apple"));
//! assert!(cuckoo.is_empty());
//! ```
//!
//! ## Priority Queue
//!
//! ```rust
//! use hashkit::BinaryHeap;
//!
//! let mut heap: BinaryHeap<i32> = [5, 3, 8, 1, 9, 2].into_iter().collect();
//! assert_eq!(heap.find_min(), Some(&1));
//! assert_eq!(heap.delete_min(), Some(1));
//! assert_eq!(heap.delete_min(), Some(2));
//! ```

/// Module implementing the array-backed binary min-heap
mod binary_heap;
/// Module implementing the cuckoo hash table
mod cuckoo;
/// Error type for container construction
mod error;
/// Hash function families consumed by the cuckoo table
mod hash_family;
/// Module implementing the quadratic probing hash table
mod quadratic_probing;
/// Module implementing the separate chaining hash table
mod separate_chaining;
/// Utility functions and traits for the hash tables
mod utils;

pub use binary_heap::BinaryHeap;
pub use cuckoo::{CuckooHashTable, InsertStrategy, MAX_LOAD};
pub use error::Error;
pub use hash_family::{HashFamily, SeededHashFamily, StringHashFamily};
pub use quadratic_probing::QuadraticProbingHashTable;
pub use separate_chaining::SeparateChainingHashTable;
pub use utils::{DEFAULT_TABLE_SIZE, DefaultHashBuilder, HashTable, is_prime, next_prime};
