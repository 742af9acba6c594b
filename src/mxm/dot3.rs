//! dot3: `C<M> = A'*B` where M is sparse or hypersparse
//!
//! C takes the pattern of M. Each mask entry (i, j) is one dot product; an
//! entry whose mask value is false, or whose dot product is empty, becomes a
//! zombie and is removed by the final `wait`.

use crate::error::Result;
use crate::mask::MaskView;
use crate::matrix::{flip_index, Context, Matrix};
use crate::ops::{Scalar, SemiringKernel};
use crate::parallel::{map_tasks, split_by_offsets};
use crate::slice::{ek_slice, nthreads_for, ntasks_for};
use crate::utils::{try_vec, try_with_capacity};

use super::dot_product;

/// Computes `C<M> = A'*B`; the result is clean and has no zombies
pub(crate) fn dot3<T: Scalar>(
    ctx: &Context,
    at: &Matrix<T>,
    b: &Matrix<T>,
    mask: &MaskView<'_, T>,
    kernel: &SemiringKernel<T>,
) -> Result<Matrix<T>> {
    let m = mask.m;
    debug_assert!(m.is_sparse_or_hyper() && !mask.complement);
    debug_assert_eq!((m.vlen, m.vdim), (at.vdim, b.vdim));
    let (mp, mi) = match (m.ptr(), m.indices()) {
        (Some(p), Some(i)) => (p, i),
        _ => return Ok(Matrix::empty(at.vdim, b.vdim, b.by_col)),
    };
    let mnz = m.nnz_slots();
    let nthreads = nthreads_for(mnz as f64 * 8.0, ctx.chunk, ctx.nthreads_max);
    let tasks = ek_slice(m, ntasks_for(nthreads, mnz));
    tracing::trace!(nthreads, ntasks = tasks.len(), mnz, "dot3");

    let mut ci = try_with_capacity(mnz)?;
    ci.extend_from_slice(mi);
    let mut cx = try_vec(mnz, T::zero())?;

    // tasks own disjoint entry ranges of the mask, and so of C
    let offsets: Vec<usize> = std::iter::once(0).chain(tasks.iter().map(|t| t.pend)).collect();
    let items: Vec<_> = tasks
        .iter()
        .copied()
        .zip(split_by_offsets(&mut ci, &offsets))
        .zip(split_by_offsets(&mut cx, &offsets))
        .map(|((task, ci_task), cx_task)| (task, ci_task, cx_task))
        .collect();
    let zombies: usize = map_tasks(ctx, nthreads, items, |(task, ci_task, cx_task)| {
        let mut nzombies = 0;
        for k in task.kfirst..=task.klast {
            let j = m.vector_id(k);
            let kb = b.find_vector(j);
            let (vs, ve) = m.vector_range(k);
            let (ps, pe) = task.clip(vs, ve);
            for p in ps..pe {
                let q = p - task.pstart;
                let i = ci_task[q];
                let value = if mask.entry_true(p) {
                    dot_product(at, at.find_vector(i), b, kb, kernel)
                } else {
                    None
                };
                match value {
                    Some(cij) => cx_task[q] = cij,
                    None => {
                        ci_task[q] = flip_index(i);
                        nzombies += 1;
                    }
                }
            }
        }
        nzombies
    })
    .into_iter()
    .sum();

    let h = m.hlist().map(<[usize]>::to_vec);
    let mut c = Matrix::from_sparse(at.vdim, b.vdim, b.by_col, mp.to_vec(), h, ci, cx, false);
    c.nzombies = zombies;
    tracing::debug!(zombies, "dot3 done");
    c.wait_with(ctx)?;
    Ok(c)
}
