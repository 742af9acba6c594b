//! Accumulator implementations for sparse matrix multiplication
//!
//! This module contains the workspaces that collect the products of one
//! output vector in saxpy-style multiplication:
//!
//! - [`dense::DenseAccumulator`]: Gustavson's dense workspace, one cell per
//!   row of the output, cleared in O(1) through mark generations
//! - [`hash::HashAccumulator`]: an open-addressing hash table sized to the
//!   work of one vector, for outputs much longer than their fill
//! - [`atomic`]: the same two workspaces shared by a team of fine tasks
//!   through per-cell atomic state
//! - [`sort::SortAccumulator`]: collect-sort-merge, used to assemble tuples

pub mod atomic;
pub mod dense;
pub mod hash;
pub mod sort;

use crate::ops::{Kernel, Scalar};

pub use atomic::{SharedGustavson, SharedHash};
pub use dense::DenseAccumulator;
pub use hash::HashAccumulator;
pub use sort::SortAccumulator;

/// How scattered mask entries are read during one output vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskPolicy {
    /// No mask: every index may receive an entry
    Unmasked,
    /// Only scattered indices may receive an entry
    Include,
    /// Scattered indices may not receive an entry
    Exclude,
}

/// Trait for workspaces that accumulate the products of one output vector
///
/// A vector is computed by `begin_vector`, optional `scatter_mask` calls for
/// the mask entries of the vector, any number of `accumulate` calls, and a
/// final `drain_into` that appends the entries and readies the workspace
/// for the next vector.
pub trait Accumulator<T: Scalar> {
    /// Prepares the workspace for a new output vector
    fn begin_vector(&mut self, policy: MaskPolicy);

    /// Records that index `i` is in the mask of the current vector
    fn scatter_mask(&mut self, i: usize);

    /// Folds `val` into index `i` with the additive monoid, honoring the mask
    fn accumulate(&mut self, i: usize, val: T, add: &Kernel<T>);

    /// Appends the vector's entries; returns true if they are in ascending order
    fn drain_into(&mut self, ci: &mut Vec<usize>, cx: &mut Vec<T>) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::BinaryOp;

    fn run<A: Accumulator<f64>>(acc: &mut A) -> (Vec<usize>, Vec<f64>) {
        let add = Kernel::resolve(&BinaryOp::Plus);
        let mut ci = Vec::new();
        let mut cx = Vec::new();

        acc.begin_vector(MaskPolicy::Unmasked);
        acc.accumulate(7, 1.0, &add);
        acc.accumulate(2, 2.0, &add);
        acc.accumulate(7, 3.0, &add);
        acc.drain_into(&mut ci, &mut cx);

        // a second vector must not see the first one's entries
        acc.begin_vector(MaskPolicy::Include);
        acc.scatter_mask(2);
        acc.accumulate(2, 5.0, &add);
        acc.accumulate(7, 9.0, &add);
        acc.drain_into(&mut ci, &mut cx);

        let mut pairs: Vec<_> = ci.iter().copied().zip(cx.iter().copied()).collect();
        pairs[..2].sort_by_key(|&(i, _)| i);
        pairs.into_iter().unzip()
    }

    #[test]
    fn test_dense_and_hash_agree() {
        let mut dense = DenseAccumulator::<f64>::new(10, u32::MAX).unwrap();
        let mut hash = HashAccumulator::<f64>::new(16, u32::MAX).unwrap();
        let expected = (vec![2, 7, 2], vec![2.0, 4.0, 5.0]);
        assert_eq!(run(&mut dense), expected);
        assert_eq!(run(&mut hash), expected);
    }
}
