//! Sort-based accumulator
//!
//! Collects (key, value) pairs in an unsorted list, then sorts them and
//! merges duplicate keys. The sort is stable, so duplicates are merged in
//! the order they were pushed: the merge function sees the older value
//! first. Tuple building and the assembly of pending tuples rely on this.

use crate::error::{Error, Result};

/// Sort-based accumulator over keys of type `K`
pub struct SortAccumulator<K, T> {
    /// Temporary storage for keys of the collected entries
    keys: Vec<K>,

    /// Temporary storage for values of the collected entries
    values: Vec<T>,
}

impl<K, T> SortAccumulator<K, T>
where
    K: Ord + Copy,
    T: Copy,
{
    /// Create a new sort-based accumulator
    ///
    /// # Arguments
    ///
    /// * `initial_capacity` - Initial capacity for the temporary storage
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(initial_capacity),
            values: Vec::with_capacity(initial_capacity),
        }
    }

    /// Simply add the entry to our unsorted lists
    pub fn push(&mut self, key: K, val: T) {
        self.keys.push(key);
        self.values.push(val);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Positions of the entries in stable key order
    fn order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_by_key(|&p| self.keys[p]);
        order
    }

    /// Extract the entries sorted by key, merging duplicates with `merge(older, newer)`
    pub fn extract_with<F>(self, mut merge: F) -> (Vec<K>, Vec<T>)
    where
        F: FnMut(T, T) -> T,
    {
        if self.keys.is_empty() {
            return (Vec::new(), Vec::new());
        }
        let order = self.order();

        let mut sorted_keys = Vec::with_capacity(order.len());
        let mut sorted_vals = Vec::with_capacity(order.len());

        let mut current_key = self.keys[order[0]];
        let mut current_val = self.values[order[0]];

        for &p in order.iter().skip(1) {
            let key = self.keys[p];
            let val = self.values[p];
            if key == current_key {
                current_val = merge(current_val, val);
            } else {
                sorted_keys.push(current_key);
                sorted_vals.push(current_val);
                current_key = key;
                current_val = val;
            }
        }

        sorted_keys.push(current_key);
        sorted_vals.push(current_val);

        (sorted_keys, sorted_vals)
    }

    /// Extract the entries sorted by key; a repeated key is an error
    pub fn extract_unique(self) -> Result<(Vec<K>, Vec<T>)> {
        let order = self.order();
        if order.windows(2).any(|w| self.keys[w[0]] == self.keys[w[1]]) {
            return Err(Error::invalid_value("duplicate entries without a dup operator"));
        }
        let keys = order.iter().map(|&p| self.keys[p]).collect();
        let values = order.iter().map(|&p| self.values[p]).collect();
        Ok((keys, values))
    }
}
