//! Dense (Gustavson) accumulator for saxpy3
//!
//! One workspace cell per index of the output vector. A cell belongs to the
//! current vector only if its mark is in the vector's mark range, so the
//! workspace is never cleared between vectors:
//!
//! - `mark < m`: untouched in this vector (or not in an included mask)
//! - `mark == m`: scattered from the mask
//! - `mark == m + 1`: holds a value

use aligned_vec::AVec;

use crate::accumulator::{Accumulator, MaskPolicy};
use crate::error::{Error, Result};
use crate::mask::MarkWorkspace;
use crate::ops::{Kernel, Scalar};

/// Dense accumulator covering indices `0..n`
pub struct DenseAccumulator<T: Scalar> {
    /// Mark generation of each cell
    marks: MarkWorkspace,

    /// The dense accumulation array, cache-line aligned
    values: AVec<T>,

    /// Indices holding a value in the current vector
    touched: Vec<usize>,

    mark: u32,
    policy: MaskPolicy,
}

impl<T: Scalar> DenseAccumulator<T> {
    /// Create a dense accumulator for output vectors of length `n`
    ///
    /// # Arguments
    ///
    /// * `n` - Length of the output vectors
    /// * `mark_limit` - Mark value at which the workspace is reset
    pub fn new(n: usize, mark_limit: u32) -> Result<Self> {
        // AVec has no fallible reserve; past isize::MAX bytes it would abort
        let fits = n
            .checked_mul(std::mem::size_of::<T>())
            .and_then(|bytes| bytes.checked_add(64))
            .map_or(false, |bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(Error::OutOfMemory { size: n });
        }
        let marks = MarkWorkspace::new(n, mark_limit)?;
        Ok(Self {
            marks,
            values: AVec::from_iter(64, (0..n).map(|_| T::zero())),
            touched: Vec::new(),
            mark: 0,
            policy: MaskPolicy::Unmasked,
        })
    }

    /// Number of times the mark array was cleared
    pub fn resets(&self) -> usize {
        self.marks.resets()
    }
}

impl<T: Scalar> Accumulator<T> for DenseAccumulator<T> {
    fn begin_vector(&mut self, policy: MaskPolicy) {
        self.touched.clear();
        self.mark = self.marks.next_pass(2);
        self.policy = policy;
    }

    fn scatter_mask(&mut self, i: usize) {
        self.marks.set(i, self.mark);
    }

    #[inline]
    fn accumulate(&mut self, i: usize, val: T, add: &Kernel<T>) {
        let m = self.mark;
        let state = self.marks.get(i);
        if state == m + 1 {
            // Index already exists, just add the value
            self.values[i] = add.call(self.values[i], val);
            return;
        }
        let allowed = match self.policy {
            MaskPolicy::Unmasked => true,
            MaskPolicy::Include => state == m,
            MaskPolicy::Exclude => state < m,
        };
        if allowed {
            // First time seeing this index in the vector
            self.marks.set(i, m + 1);
            self.values[i] = val;
            self.touched.push(i);
        }
    }

    fn drain_into(&mut self, ci: &mut Vec<usize>, cx: &mut Vec<T>) -> bool {
        self.touched.sort_unstable();
        for &i in &self.touched {
            ci.push(i);
            cx.push(self.values[i]);
        }
        self.touched.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::BinaryOp;

    #[test]
    fn test_dense_accumulator_sorted_output() {
        let add = Kernel::resolve(&BinaryOp::Plus);
        let mut acc = DenseAccumulator::<i64>::new(10, u32::MAX).unwrap();
        acc.begin_vector(MaskPolicy::Unmasked);
        for (i, v) in [(9, 1), (3, 2), (9, 4), (0, 8)] {
            acc.accumulate(i, v, &add);
        }
        let (mut ci, mut cx) = (Vec::new(), Vec::new());
        assert!(acc.drain_into(&mut ci, &mut cx));
        assert_eq!(ci, vec![0, 3, 9]);
        assert_eq!(cx, vec![8, 2, 5]);
    }

    #[test]
    fn test_oversized_workspace_is_out_of_memory() {
        let n = isize::MAX as usize / std::mem::size_of::<f64>() + 1;
        let err = DenseAccumulator::<f64>::new(n, u32::MAX).err().unwrap();
        assert!(err.is_out_of_memory());
    }

    #[test]
    fn test_excluded_mask_entries_are_dropped() {
        let add = Kernel::resolve(&BinaryOp::Plus);
        let mut acc = DenseAccumulator::<i64>::new(5, u32::MAX).unwrap();
        acc.begin_vector(MaskPolicy::Exclude);
        acc.scatter_mask(1);
        acc.accumulate(1, 10, &add);
        acc.accumulate(2, 20, &add);
        let (mut ci, mut cx) = (Vec::new(), Vec::new());
        acc.drain_into(&mut ci, &mut cx);
        assert_eq!(ci, vec![2]);
        assert_eq!(cx, vec![20]);
    }

    #[test]
    fn test_reset_keeps_results_correct() {
        let add = Kernel::resolve(&BinaryOp::Plus);
        let mut acc = DenseAccumulator::<i64>::new(4, 16).unwrap();
        for round in 0..20i64 {
            acc.begin_vector(MaskPolicy::Unmasked);
            acc.accumulate(round as usize % 4, round, &add);
            acc.accumulate(round as usize % 4, 1, &add);
            let (mut ci, mut cx) = (Vec::new(), Vec::new());
            acc.drain_into(&mut ci, &mut cx);
            assert_eq!(ci, vec![round as usize % 4]);
            assert_eq!(cx, vec![round + 1]);
        }
        assert!(acc.resets() > 0);
    }
}
