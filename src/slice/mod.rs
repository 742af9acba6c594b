//! Task partitioning
//!
//! Parallel operations split their work into tasks before running. A
//! *coarse* task owns a contiguous range of whole vectors `[kfirst, klast]`.
//! A *fine* task owns part of a single vector, an index range
//! `[istart, iend)` together with the matching entry ranges of the
//! operands; the fine tasks of one vector form a team.
//!
//! The number of threads comes from the amount of work:
//!
//! ```text
//! nthreads = clamp(floor(work / chunk), 1, nthreads_max)
//! ntasks   = 1 if nthreads == 1, else min(4 * nthreads, items)
//! ```
//!
//! Every slicing routine returns tasks in vector order, so output offsets
//! derived by a prefix sum over the tasks are disjoint and cover the output.

pub mod cumsum;
pub mod ek;
pub mod ewise;
pub mod saxpy;

pub use cumsum::task_cumsum;
pub use ek::{ek_slice, ek_slice_ptr, EkTask};
pub use ewise::ewise_slice;
pub use saxpy::{choose_workspace, saxpy_flops, saxpy_slice, SaxpyTask, Team, WorkspaceKind};

use crate::constants::TASKS_PER_THREAD;

/// Number of threads for `work` units, at least one and at most `nthreads_max`
pub fn nthreads_for(work: f64, chunk: usize, nthreads_max: usize) -> usize {
    let chunk = chunk.max(1) as f64;
    let n = (work / chunk).floor();
    if n.is_nan() || n < 1.0 {
        return 1;
    }
    (n.min(nthreads_max.max(1) as f64)) as usize
}

/// Number of coarse tasks for `nthreads` threads over `items` units
pub fn ntasks_for(nthreads: usize, items: usize) -> usize {
    if nthreads <= 1 {
        1
    } else {
        (TASKS_PER_THREAD * nthreads).min(items).max(1)
    }
}

/// Splits the cumulative array `cum` into `ntasks` balanced ranges
///
/// `cum` has one more slot than there are items and is non-decreasing (a
/// pointer array, or a prefix sum of work). Returns `ntasks + 1` item
/// boundaries: task t owns items `[slice[t], slice[t+1])`.
pub fn p_slice(cum: &[usize], ntasks: usize) -> Vec<usize> {
    let n = cum.len().saturating_sub(1);
    let ntasks = ntasks.max(1);
    let mut slice = Vec::with_capacity(ntasks + 1);
    slice.push(0);
    if n == 0 {
        slice.resize(ntasks + 1, 0);
        return slice;
    }
    let base = cum[0];
    let total = cum[n] - base;
    for t in 1..ntasks {
        let target = base + (total as u128 * t as u128 / ntasks as u128) as usize;
        let k = cum[..n].partition_point(|&c| c < target).min(n);
        let prev = slice[t - 1];
        slice.push(k.max(prev));
    }
    slice.push(n);
    slice
}

/// The vector `k >= kleft` whose entries `[p[k], p[k+1])` contain position `pos`
///
/// Empty vectors are skipped: the result is the last `k` with `p[k] <= pos`.
pub fn search_for_vector(p: &[usize], pos: usize, kleft: usize) -> usize {
    debug_assert!(pos < p[p.len() - 1]);
    kleft + p[kleft..].partition_point(|&x| x <= pos) - 1
}

/// Entry ranges of one fine task inside a single vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FineSlice {
    /// First index of the vector owned by this task
    pub istart: usize,
    /// One past the last index owned by this task
    pub iend: usize,
    /// Entries of the first operand in `[istart, iend)`
    pub pa: (usize, usize),
    /// Entries of the second operand in `[istart, iend)`
    pub pb: (usize, usize),
}

/// One unit of work of an element-wise operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub kfirst: usize,
    pub klast: usize,
    /// Set for fine tasks, which always have `kfirst == klast`
    pub fine: Option<FineSlice>,
    /// Output range `[pc, pc_end)`, filled in by [`task_cumsum`]
    pub pc: usize,
    pub pc_end: usize,
}

impl TaskDescriptor {
    pub fn coarse(kfirst: usize, klast: usize) -> Self {
        Self {
            kfirst,
            klast,
            fine: None,
            pc: 0,
            pc_end: 0,
        }
    }

    pub fn fine(k: usize, slice: FineSlice) -> Self {
        Self {
            kfirst: k,
            klast: k,
            fine: Some(slice),
            pc: 0,
            pc_end: 0,
        }
    }

    pub fn is_fine(&self) -> bool {
        self.fine.is_some()
    }
}
