//! Hash accumulator for saxpy3
//!
//! An open-addressing table with linear probing, sized to at least twice
//! the number of distinct indices a vector can produce, so probing always
//! finds an empty slot. Slots use the same mark encoding as the dense
//! accumulator; a slot with a mark below the current pass is empty.

use crate::accumulator::{Accumulator, MaskPolicy};
use crate::constants::HASH_FACTOR;
use crate::error::Result;
use crate::mask::MarkWorkspace;
use crate::ops::{Kernel, Scalar};
use crate::utils::{next_pow2, try_vec};

#[inline]
pub(crate) fn hash_index(i: usize, bits: usize) -> usize {
    i.wrapping_mul(HASH_FACTOR) & bits
}

/// Private hash workspace of one coarse task
pub struct HashAccumulator<T: Scalar> {
    keys: Vec<usize>,
    marks: MarkWorkspace,
    values: Vec<T>,
    /// Slots holding a value, in insertion order
    touched: Vec<usize>,
    bits: usize,
    mark: u32,
    policy: MaskPolicy,
}

impl<T: Scalar> HashAccumulator<T> {
    /// Creates a table with `size` slots, rounded up to a power of two
    pub fn new(size: usize, mark_limit: u32) -> Result<Self> {
        let size = next_pow2(size);
        Ok(Self {
            keys: try_vec(size, 0usize)?,
            marks: MarkWorkspace::new(size, mark_limit)?,
            values: try_vec(size, T::zero())?,
            touched: Vec::new(),
            bits: size - 1,
            mark: 0,
            policy: MaskPolicy::Unmasked,
        })
    }

    pub fn size(&self) -> usize {
        self.bits + 1
    }

    /// Slot of index `i`, and whether it already holds `i` in this pass
    #[inline]
    fn probe(&self, i: usize) -> (usize, bool) {
        let mut h = hash_index(i, self.bits);
        loop {
            if self.marks.get(h) < self.mark {
                return (h, false);
            }
            if self.keys[h] == i {
                return (h, true);
            }
            h = (h + 1) & self.bits;
        }
    }
}

impl<T: Scalar> Accumulator<T> for HashAccumulator<T> {
    fn begin_vector(&mut self, policy: MaskPolicy) {
        self.touched.clear();
        self.mark = self.marks.next_pass(2);
        self.policy = policy;
    }

    fn scatter_mask(&mut self, i: usize) {
        let (h, _) = self.probe(i);
        self.keys[h] = i;
        self.marks.set(h, self.mark);
    }

    #[inline]
    fn accumulate(&mut self, i: usize, val: T, add: &Kernel<T>) {
        let m = self.mark;
        let (h, found) = self.probe(i);
        if found {
            let state = self.marks.get(h);
            if state == m + 1 {
                self.values[h] = add.call(self.values[h], val);
                return;
            }
            // scattered from the mask
            if self.policy == MaskPolicy::Exclude {
                return;
            }
        } else if self.policy == MaskPolicy::Include {
            return;
        }
        debug_assert!(self.touched.len() < self.bits);
        self.keys[h] = i;
        self.marks.set(h, m + 1);
        self.values[h] = val;
        self.touched.push(h);
    }

    fn drain_into(&mut self, ci: &mut Vec<usize>, cx: &mut Vec<T>) -> bool {
        let mut sorted = true;
        let mut last = None;
        for &h in &self.touched {
            let i = self.keys[h];
            if last.map_or(false, |prev| prev > i) {
                sorted = false;
            }
            last = Some(i);
            ci.push(i);
            cx.push(self.values[h]);
        }
        self.touched.clear();
        sorted
    }
}
