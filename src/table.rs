//! Unique table: hash-consing storage for immutable values.
//!
//! Values are appended to a plain `Vec` and never removed, so an index stays
//! valid for the lifetime of the table. Lookup goes through a bucket array of
//! collision chains threaded through the entries themselves:
//!
//! ```text
//! buckets[h] → entry i → entry j → 0
//! ```
//!
//! Index 0 is a sentry and never holds a value, so `next == 0` ends a chain.
//! When the average chain length exceeds `max_load`, the bucket array is
//! doubled and every chain is rebuilt.

use std::ops::Index;

use log::debug;

use crate::utils::MyHash;

struct Entry<T> {
    value: T,
    hash: u64,
    next: usize,
}

pub struct Table<T> {
    data: Vec<Option<Entry<T>>>,
    buckets: Vec<usize>,
    bitmask: u64,
    max_load: usize,
}

impl<T> Table<T> {
    /// Create a new table with `2^bits` buckets.
    pub fn new(bits: usize, max_load: usize) -> Self {
        assert!(bits <= 24, "Table bits should be in the range 0..=24");
        assert!(max_load > 0, "Table load factor should be positive");

        let buckets_size = 1 << bits;

        Self {
            data: vec![None], // 0th cell is the sentry
            buckets: vec![0; buckets_size],
            bitmask: (buckets_size - 1) as u64,
            max_load,
        }
    }

    /// Get the number of stored values.
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of buckets.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        match &self.data[index] {
            Some(entry) => &entry.value,
            None => panic!("Index {} is not occupied", index),
        }
    }

    fn next(&self, index: usize) -> usize {
        self.data[index].as_ref().map_or(0, |entry| entry.next)
    }

    fn set_next(&mut self, index: usize, next: usize) {
        assert_ne!(index, 0, "Index is 0");
        if let Some(entry) = &mut self.data[index] {
            entry.next = next;
        }
    }

    fn bucket_index(&self, hash: u64) -> usize {
        (hash & self.bitmask) as usize
    }

    /// Double the bucket array and relink every entry.
    fn grow(&mut self) {
        let buckets_size = self.buckets.len() * 2;
        debug!("table: growing to {} buckets ({} values)", buckets_size, self.len());

        self.buckets = vec![0; buckets_size];
        self.bitmask = (buckets_size - 1) as u64;

        for index in 1..self.data.len() {
            let hash = match &self.data[index] {
                Some(entry) => entry.hash,
                None => continue,
            };
            let bucket = self.bucket_index(hash);
            let head = self.buckets[bucket];
            self.set_next(index, head);
            self.buckets[bucket] = index;
        }
    }
}

impl<T> Table<T>
where
    T: MyHash + Eq,
{
    /// Find the index of an equal value, if present.
    pub fn find(&self, value: &T) -> Option<usize> {
        let hash = value.hash();
        let mut index = self.buckets[self.bucket_index(hash)];
        while index != 0 {
            if let Some(entry) = &self.data[index] {
                if entry.hash == hash && &entry.value == value {
                    return Some(index);
                }
            }
            index = self.next(index);
        }
        None
    }

    /// Put a value into the table and return its index.
    ///
    /// Returns the index of the existing equal value, if any. Otherwise stores the value.
    /// The second component is `true` when the value was freshly inserted.
    pub fn put(&mut self, value: T) -> (usize, bool) {
        if let Some(index) = self.find(&value) {
            return (index, false);
        }

        if self.len() >= self.buckets.len() * self.max_load {
            self.grow();
        }

        let hash = value.hash();
        let bucket = self.bucket_index(hash);
        let index = self.data.len();
        self.data.push(Some(Entry {
            value,
            hash,
            next: self.buckets[bucket],
        }));
        self.buckets[bucket] = index;

        (index, true)
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}
