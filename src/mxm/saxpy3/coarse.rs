//! Coarse saxpy3 tasks: a run of whole output vectors, private workspace

use crate::accumulator::{Accumulator, DenseAccumulator, HashAccumulator};
use crate::error::Result;
use crate::mask::MaskView;
use crate::matrix::Matrix;
use crate::ops::{Scalar, SemiringKernel};
use crate::slice::{SaxpyTask, WorkspaceKind};

use super::{mask_policy, multiply_range};

/// The vectors `kfirst..=klast` computed by one coarse task
pub(crate) struct CoarseOutput<T> {
    /// Entries in each vector, in vector order
    pub(crate) counts: Vec<usize>,
    pub(crate) ci: Vec<usize>,
    pub(crate) cx: Vec<T>,
    /// False if any vector came out of the hash workspace unsorted
    pub(crate) sorted: bool,
}

pub(crate) fn run_coarse<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    mask: Option<&MaskView<'_, T>>,
    kernel: &SemiringKernel<T>,
    task: &SaxpyTask,
    cvlen: usize,
    mark_limit: u32,
) -> Result<CoarseOutput<T>> {
    match task.workspace {
        WorkspaceKind::Gustavson => {
            let mut acc = DenseAccumulator::new(cvlen, mark_limit)?;
            Ok(run_with(&mut acc, a, b, mask, kernel, task))
        }
        WorkspaceKind::Hash { size } => {
            let mut acc = HashAccumulator::new(size, mark_limit)?;
            Ok(run_with(&mut acc, a, b, mask, kernel, task))
        }
    }
}

fn run_with<T: Scalar, A: Accumulator<T>>(
    acc: &mut A,
    a: &Matrix<T>,
    b: &Matrix<T>,
    mask: Option<&MaskView<'_, T>>,
    kernel: &SemiringKernel<T>,
    task: &SaxpyTask,
) -> CoarseOutput<T> {
    let policy = mask_policy(mask);
    let mut out = CoarseOutput {
        counts: Vec::with_capacity(task.klast + 1 - task.kfirst),
        ci: Vec::new(),
        cx: Vec::new(),
        sorted: true,
    };
    for k in task.kfirst..=task.klast {
        let j = b.vector_id(k);
        acc.begin_vector(policy);
        if let Some(view) = mask {
            view.for_each_true(j, |i| acc.scatter_mask(i));
        }
        multiply_range(a, b, b.vector_range(k), kernel, |i, t| acc.accumulate(i, t, &kernel.add));
        let before = out.ci.len();
        out.sorted &= acc.drain_into(&mut out.ci, &mut out.cx);
        out.counts.push(out.ci.len() - before);
    }
    out
}
