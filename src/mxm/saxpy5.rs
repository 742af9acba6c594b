//! saxpy5: `C += A*B` in place, C full, A bitmap/full, B sparse/hyper

use crate::matrix::{Context, Matrix};
use crate::ops::{Scalar, SemiringKernel};
use crate::parallel::for_each_window;
use crate::slice::nthreads_for;

/// Adds `A*B` into the values of a full, non-iso C
///
/// A is typically short and fat, so each task owns whole vectors of C and
/// sweeps one dense column of A per entry of B.
pub(crate) fn saxpy5<T: Scalar>(
    ctx: &Context,
    cx: &mut [T],
    cvlen: usize,
    a: &Matrix<T>,
    b: &Matrix<T>,
    kernel: &SemiringKernel<T>,
) {
    debug_assert!(a.is_bitmap_or_full() && b.is_sparse_or_hyper());
    let work = (a.nnz_slots() + b.nnz_slots()) as f64;
    let nthreads = nthreads_for(work, ctx.chunk, ctx.nthreads_max);
    let a_full = a.is_full();
    for_each_window(ctx, nthreads, cx, cvlen, |j, col| {
        let Some(kb) = b.find_vector(j) else {
            return;
        };
        let (ps, pe) = b.vector_range(kb);
        for p in ps..pe {
            let bkj = b.value_at(p);
            let base = b.index_at(p) * cvlen;
            for (i, cij) in col.iter_mut().enumerate() {
                if a_full || a.present_at(base + i) {
                    *cij = kernel.add(*cij, kernel.multiply(a.value_at(base + i), bkj));
                }
            }
        }
    });
}
