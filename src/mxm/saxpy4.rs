//! saxpy4: `C += A*B` in place, C full, A sparse/hyper, B bitmap/full

use crate::matrix::{Context, Matrix};
use crate::ops::{Scalar, SemiringKernel};
use crate::parallel::for_each_window;
use crate::slice::nthreads_for;

/// Adds `A*B` into the values of a full, non-iso C
///
/// Each output vector j reads column j of the dense B and scatters the
/// matching vectors of A straight into C's values; no workspace is needed
/// and tasks own whole vectors of C.
pub(crate) fn saxpy4<T: Scalar>(
    ctx: &Context,
    cx: &mut [T],
    cvlen: usize,
    a: &Matrix<T>,
    b: &Matrix<T>,
    kernel: &SemiringKernel<T>,
) {
    debug_assert!(a.is_sparse_or_hyper() && b.is_bitmap_or_full());
    let work = (a.nnz_slots() + b.nnz_slots()) as f64;
    let nthreads = nthreads_for(work, ctx.chunk, ctx.nthreads_max);
    for_each_window(ctx, nthreads, cx, cvlen, |j, col| {
        let (ps, pe) = b.vector_range(j);
        for p in ps..pe {
            if !b.present_at(p) {
                continue;
            }
            let bkj = b.value_at(p);
            let Some(q) = a.find_vector(p - ps) else {
                continue;
            };
            let (as_, ae) = a.vector_range(q);
            for pa in as_..ae {
                let i = a.index_at(pa);
                col[i] = kernel.add(col[i], kernel.multiply(a.value_at(pa), bkj));
            }
        }
    });
}
