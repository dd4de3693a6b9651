use std::mem;

use log::debug;

/// Number of elements a heap holds before its first growth
const DEFAULT_CAPACITY: usize = 10;

/// An array-backed binary min-heap.
///
/// Elements live at indices `1..=size`; the children of index `i` are `2i`
/// and `2i + 1`. Duplicates are allowed and ties come out in no particular
/// order.
#[derive(Debug, Clone)]
pub struct BinaryHeap<T> {
    /// Heap array; index 0 is never used
    slots: Vec<Option<T>>,
    /// Number of elements in the heap
    size: usize,
}

impl<T: Ord> Default for BinaryHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> Extend<T> for BinaryHeap<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<T: Ord> From<Vec<T>> for BinaryHeap<T> {
    /// Builds a heap from arbitrary items in linear time
    fn from(items: Vec<T>) -> Self {
        let size = items.len();
        let len = size.saturating_add(2).saturating_mul(11) / 10;

        let mut slots = Vec::with_capacity(len);
        slots.push(None);
        slots.extend(items.into_iter().map(Some));
        slots.resize_with(len.max(slots.len()), || None);

        let mut heap = Self { slots, size };
        heap.build_heap();
        heap
    }
}

impl<T: Ord> FromIterator<T> for BinaryHeap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: Ord> BinaryHeap<T> {
    /// Creates an empty heap with room for 10 elements
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty heap with room for `capacity` elements
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = std::iter::repeat_with(|| None).take(capacity.saturating_add(1)).collect();
        Self { slots, size: 0 }
    }

    /// Adds `item`, growing the array to `2 * length + 1` when it is full
    pub fn insert(&mut self, item: T) {
        if self.size.saturating_add(1) >= self.slots.len() {
            self.enlarge(self.slots.len().saturating_mul(2).saturating_add(1));
        }

        self.size = self.size.saturating_add(1);
        let hole = self.percolate_up(self.size, &item);
        if let Some(slot) = self.slots.get_mut(hole) {
            *slot = Some(item);
        }
    }

    /// Moves parents of `hole` down while they are greater than `item` and
    /// returns the index where `item` belongs
    fn percolate_up(&mut self, mut hole: usize, item: &T) -> usize {
        while hole > 1 {
            let parent = hole / 2;
            let parent_is_greater = self.get(parent).is_some_and(|p| item < p);
            if !parent_is_greater {
                break;
            }
            self.move_slot(parent, hole);
            hole = parent;
        }
        hole
    }

    /// Returns the smallest element without removing it
    #[must_use]
    pub fn find_min(&self) -> Option<&T> {
        self.get(1)
    }

    /// Removes and returns the smallest element
    pub fn delete_min(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        let last = self.slots.get_mut(self.size).and_then(Option::take);
        self.size = self.size.saturating_sub(1);
        if self.size == 0 {
            return last;
        }

        let min = match self.slots.get_mut(1) {
            Some(root) => mem::replace(root, last),
            None => last,
        };
        self.percolate_down(1);
        min
    }

    /// Sinks the element at `hole` below every child smaller than it
    fn percolate_down(&mut self, mut hole: usize) {
        let Some(item) = self.slots.get_mut(hole).and_then(Option::take) else {
            return;
        };

        loop {
            let left = hole.saturating_mul(2);
            if left > self.size {
                break;
            }
            let right = left.saturating_add(1);
            let child = match (self.get(left), self.get(right)) {
                (Some(l), Some(r)) if r < l => right,
                _ => left,
            };

            if self.get(child).is_some_and(|c| c < &item) {
                self.move_slot(child, hole);
                hole = child;
            } else {
                break;
            }
        }

        if let Some(slot) = self.slots.get_mut(hole) {
            *slot = Some(item);
        }
    }

    /// Establishes heap order over the first `size` elements in linear time
    fn build_heap(&mut self) {
        for index in (1..=self.size / 2).rev() {
            self.percolate_down(index);
        }
    }

    /// Logically removes every element; stale values are overwritten as the
    /// heap refills
    pub fn make_empty(&mut self) {
        self.size = 0;
    }

    /// Returns the number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the heap has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of elements the heap holds before it has to grow
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len().saturating_sub(1)
    }

    /// The element at heap index `index`, if it is live
    fn get(&self, index: usize) -> Option<&T> {
        if index == 0 || index > self.size {
            return None;
        }
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Moves the element at `from` into `to`, leaving `from` empty
    fn move_slot(&mut self, from: usize, to: usize) {
        let moved = self.slots.get_mut(from).and_then(Option::take);
        if let Some(slot) = self.slots.get_mut(to) {
            *slot = moved;
        }
    }

    /// Reallocates the array to `new_len` slots, keeping every element
    fn enlarge(&mut self, new_len: usize) {
        debug!("binary heap grow: {} -> {} slots", self.slots.len(), new_len);
        self.slots.resize_with(new_len, || None);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    /// Checks that no live element is smaller than its parent
    fn assert_heap_order<T: Ord + std::fmt::Debug>(heap: &BinaryHeap<T>) {
        for index in 2..=heap.len() {
            let parent = heap.get(index / 2).unwrap();
            let child = heap.get(index).unwrap();
            assert!(parent <= child, "{parent:?} above {child:?} at {index}");
        }
    }

    #[test]
    fn test_delete_min_in_order() {
        let mut heap = BinaryHeap::new();
        for key in [5, 3, 8, 1, 9, 2] {
            heap.insert(key);
        }
        assert_heap_order(&heap);

        let drained: Vec<i32> = std::iter::from_fn(|| heap.delete_min()).collect();
        assert_eq!(drained, vec![1, 2, 3, 5, 8, 9]);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_empty_heap() {
        let mut heap: BinaryHeap<u8> = BinaryHeap::new();
        assert_eq!(heap.find_min(), None);
        assert_eq!(heap.delete_min(), None);
        assert_eq!(heap.len(), 0);
    }

    #[test]
    fn test_find_min_does_not_remove() {
        let mut heap = BinaryHeap::new();
        heap.insert("pear");
        heap.insert("apple");
        heap.insert("fig");

        assert_eq!(heap.find_min(), Some(&"apple"));
        assert_eq!(heap.len(), 3);
        assert_eq!(heap.delete_min(), Some("apple"));
        assert_eq!(heap.find_min(), Some(&"fig"));
    }

    #[test]
    fn test_duplicates() {
        let mut heap = BinaryHeap::new();
        heap.extend([4, 1, 4, 1, 4]);
        let drained: Vec<i32> = std::iter::from_fn(|| heap.delete_min()).collect();
        assert_eq!(drained, vec![1, 1, 4, 4, 4]);
    }

    #[test]
    fn test_grows_to_twice_plus_one() {
        let mut heap = BinaryHeap::with_capacity(3);
        assert_eq!(heap.capacity(), 3);
        for key in 0..4 {
            heap.insert(key);
        }
        // 4 slots (3 + unused index 0) become 9
        assert_eq!(heap.capacity(), 8);
        assert_eq!(heap.len(), 4);
        assert_eq!(heap.find_min(), Some(&0));
    }

    #[test]
    fn test_build_heap_from_vec() {
        let heap = BinaryHeap::from(vec![9, 4, 7, 1, 8, 2, 6, 3, 5]);
        assert_eq!(heap.len(), 9);
        assert_eq!(heap.capacity(), 11);
        assert_heap_order(&heap);
        assert_eq!(heap.find_min(), Some(&1));
    }

    #[test]
    fn test_collect_then_drain() {
        let mut heap: BinaryHeap<i64> = (0..200).rev().collect();
        assert_heap_order(&heap);
        for expected in 0..200 {
            assert_eq!(heap.delete_min(), Some(expected));
        }
        assert_eq!(heap.delete_min(), None);
    }

    #[test]
    fn test_interleaved_operations_keep_order() {
        let mut heap = BinaryHeap::new();
        for round in 0..50_i32 {
            heap.insert((round * 37) % 101);
            heap.insert((round * 53) % 89);
            heap.delete_min();
            assert_heap_order(&heap);
        }
        let mut previous = i32::MIN;
        while let Some(key) = heap.delete_min() {
            assert!(previous <= key);
            previous = key;
        }
    }

    #[test]
    fn test_make_empty() {
        let mut heap = BinaryHeap::new();
        heap.extend([3, 1, 2]);
        heap.make_empty();

        assert!(heap.is_empty());
        assert_eq!(heap.find_min(), None);
        heap.insert(7);
        assert_eq!(heap.delete_min(), Some(7));
        assert_eq!(heap.delete_min(), None);
    }
}
