//! Equal-entry slicing
//!
//! Splits the entries `[0, nnz)` of a matrix into tasks of nearly equal
//! size regardless of vector boundaries. A task may start or end in the
//! middle of a vector; the first and last vectors it touches are recorded
//! so the task can clip their ranges.

use crate::matrix::Matrix;
use crate::ops::Scalar;
use crate::slice::search_for_vector;

/// A slice `[pstart, pend)` of entries, touching vectors `kfirst..=klast`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EkTask {
    pub kfirst: usize,
    pub klast: usize,
    pub pstart: usize,
    pub pend: usize,
}

impl EkTask {
    /// The part of vector k's entries `[vstart, vend)` owned by this task
    #[inline]
    pub fn clip(&self, vstart: usize, vend: usize) -> (usize, usize) {
        (vstart.max(self.pstart), vend.min(self.pend))
    }
}

/// Slices the entries described by the pointer array `p`
///
/// Empty matrices yield no tasks; otherwise there are at most `nnz` tasks
/// and their entry ranges partition `[0, nnz)` in order.
pub fn ek_slice_ptr(p: &[usize], ntasks: usize) -> Vec<EkTask> {
    let nnz = p.last().copied().unwrap_or(0);
    if nnz == 0 {
        return Vec::new();
    }
    let ntasks = ntasks.clamp(1, nnz);
    let mut tasks = Vec::with_capacity(ntasks);
    let mut kleft = 0;
    for t in 0..ntasks {
        let pstart = (nnz as u128 * t as u128 / ntasks as u128) as usize;
        let pend = (nnz as u128 * (t + 1) as u128 / ntasks as u128) as usize;
        let kfirst = search_for_vector(p, pstart, kleft);
        let klast = search_for_vector(p, pend - 1, kfirst);
        tasks.push(EkTask {
            kfirst,
            klast,
            pstart,
            pend,
        });
        kleft = klast;
    }
    tasks
}

/// Slices the entry slots of a matrix of any format
pub fn ek_slice<T: Scalar>(m: &Matrix<T>, ntasks: usize) -> Vec<EkTask> {
    if let Some(p) = m.ptr() {
        return ek_slice_ptr(p, ntasks);
    }
    let nnz = m.nnz_slots();
    if nnz == 0 {
        return Vec::new();
    }
    let vlen = m.vlen;
    let ntasks = ntasks.clamp(1, nnz);
    (0..ntasks)
        .map(|t| {
            let pstart = (nnz as u128 * t as u128 / ntasks as u128) as usize;
            let pend = (nnz as u128 * (t + 1) as u128 / ntasks as u128) as usize;
            EkTask {
                kfirst: pstart / vlen,
                klast: (pend - 1) / vlen,
                pstart,
                pend,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::{nthreads_for, ntasks_for};

    #[test]
    fn test_ranges_partition_the_entries() {
        // 1000 entries spread unevenly over 7 vectors
        let p = vec![0, 0, 3, 400, 400, 401, 999, 1000];
        let nthreads = nthreads_for(1000.0, 1, 4);
        assert_eq!(nthreads, 4);
        let tasks = ek_slice_ptr(&p, ntasks_for(nthreads, 1000));
        assert_eq!(tasks.len(), 16);

        let mut next = 0;
        for task in &tasks {
            assert_eq!(task.pstart, next);
            assert!(task.pend > task.pstart);
            assert!(p[task.kfirst] <= task.pstart && task.pstart < p[task.kfirst + 1]);
            assert!(p[task.klast] < task.pend && task.pend <= p[task.klast + 1]);
            next = task.pend;
        }
        assert_eq!(next, 1000);
    }

    #[test]
    fn test_more_tasks_than_entries() {
        let p = vec![0, 2, 3];
        let tasks = ek_slice_ptr(&p, 10);
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[2], EkTask { kfirst: 1, klast: 1, pstart: 2, pend: 3 });
        assert!(ek_slice_ptr(&[0, 0], 4).is_empty());
    }

    #[test]
    fn test_clip() {
        let task = EkTask { kfirst: 0, klast: 2, pstart: 5, pend: 12 };
        assert_eq!(task.clip(0, 8), (5, 8));
        assert_eq!(task.clip(8, 10), (8, 10));
        assert_eq!(task.clip(10, 20), (10, 12));
    }

    #[test]
    fn test_dense_matrix() {
        let m = Matrix::new_full(4, 3, 1.0f64).unwrap();
        let tasks = ek_slice(&m, 2);
        assert_eq!(tasks.len(), 2);
        // by row: vectors of length 3
        assert_eq!(tasks[0], EkTask { kfirst: 0, klast: 1, pstart: 0, pend: 6 });
        assert_eq!(tasks[1], EkTask { kfirst: 2, klast: 3, pstart: 6, pend: 12 });
    }
}
