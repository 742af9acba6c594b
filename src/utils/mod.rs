//! Utility functions and helpers

pub mod formats;

use crate::error::{Error, Result};

pub use formats::{from_dense, from_sprs, to_dense, to_sprs};

/// Replaces `counts` with its exclusive prefix sum in place
///
/// `counts` has one trailing slot that receives the total. Returns the
/// number of non-zero counts.
pub fn cumsum_in_place(counts: &mut [usize]) -> usize {
    let mut sum = 0;
    let mut nonempty = 0;
    for c in counts.iter_mut() {
        let n = *c;
        if n > 0 {
            nonempty += 1;
        }
        *c = sum;
        sum += n;
    }
    nonempty
}

/// Allocates a vector of `n` copies of `value`, reporting failure
pub fn try_vec<T: Clone>(n: usize, value: T) -> Result<Vec<T>> {
    let mut v = try_with_capacity(n)?;
    v.resize(n, value);
    Ok(v)
}

/// Allocates an empty vector with room for `n` elements, reporting failure
pub fn try_with_capacity<T>(n: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)
        .map_err(|_| Error::OutOfMemory { size: n })?;
    Ok(v)
}

/// Drops the empty vectors of a hypersparse list `h` with pointers `p`
pub fn prune_empty(mut h: Vec<usize>, p: &mut Vec<usize>) -> Vec<usize> {
    let mut kept = 0;
    for k in 0..h.len() {
        if p[k + 1] > p[k] {
            h[kept] = h[k];
            p[kept + 1] = p[k + 1];
            kept += 1;
        }
    }
    h.truncate(kept);
    p.truncate(kept + 1);
    h
}

/// Smallest power of two that is >= n (and at least 1)
pub fn next_pow2(n: usize) -> usize {
    n.max(1).checked_next_power_of_two().unwrap_or(1 << (usize::BITS - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_empty() {
        let mut p = vec![0, 2, 2, 5, 5];
        let h = prune_empty(vec![1, 4, 6, 9], &mut p);
        assert_eq!(h, vec![1, 6]);
        assert_eq!(p, vec![0, 2, 5]);
    }

    #[test]
    fn test_cumsum_in_place() {
        let mut counts = vec![2, 0, 3, 0];
        let nonempty = cumsum_in_place(&mut counts);
        assert_eq!(counts, vec![0, 2, 2, 5]);
        assert_eq!(nonempty, 2);
    }

    #[test]
    fn test_try_vec_reports_oom() {
        let v: Vec<u8> = try_vec(8, 1).unwrap();
        assert_eq!(v, vec![1; 8]);

        let huge = try_vec::<u64>(usize::MAX / 2, 0);
        assert!(matches!(huge, Err(Error::OutOfMemory { .. })));
    }

    #[test]
    fn test_next_pow2() {
        assert_eq!(next_pow2(0), 1);
        assert_eq!(next_pow2(5), 8);
        assert_eq!(next_pow2(64), 64);
    }
}
