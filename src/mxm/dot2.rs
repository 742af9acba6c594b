//! dot2: `C<M> = A'*B` as a bitmap, one dot product per output slot
//!
//! A' arrives with its vectors being the rows of the product's left
//! operand, so entry (i, j) of C is the dot product of A' vector i with B
//! vector j. Every slot of C is visited; slots the mask does not allow are
//! skipped without computing anything.

use crate::error::Result;
use crate::mask::{MaskColumn, MaskView};
use crate::matrix::{Context, Matrix};
use crate::ops::{Scalar, SemiringKernel};
use crate::parallel::try_map_tasks;
use crate::slice::{nthreads_for, ntasks_for};
use crate::utils::{try_vec, try_with_capacity};

use super::dot_product;

/// Bitmap slots and values of the columns one task owns
struct Block<T> {
    b: Vec<u8>,
    x: Vec<T>,
    nvals: usize,
}

/// Computes the bitmap `C<M> = A'*B`, or `None` if it cannot be held
pub(crate) fn dot2<T: Scalar>(
    ctx: &Context,
    at: &Matrix<T>,
    b: &Matrix<T>,
    mask: Option<&MaskView<'_, T>>,
    kernel: &SemiringKernel<T>,
) -> Result<Option<Matrix<T>>> {
    debug_assert_eq!(at.vlen, b.vlen);
    let (cvlen, cvdim) = (at.vdim, b.vdim);
    let Some(extent) = cvlen.checked_mul(cvdim) else {
        tracing::debug!(cvlen, cvdim, "dot2 punt: bitmap extent overflows");
        return Ok(None);
    };

    let work = extent.saturating_add(at.nnz_slots()).saturating_add(b.nnz_slots());
    let nthreads = nthreads_for(work as f64, ctx.chunk, ctx.nthreads_max);
    let ntasks = ntasks_for(nthreads, cvdim);
    let ranges: Vec<(usize, usize)> = (0..ntasks)
        .map(|t| (cvdim * t / ntasks, cvdim * (t + 1) / ntasks))
        .filter(|(j0, j1)| j1 > j0)
        .collect();
    tracing::trace!(nthreads, ntasks = ranges.len(), extent, "dot2");

    let blocks = try_map_tasks(ctx, nthreads, ranges, |(j0, j1)| {
        let n = (j1 - j0) * cvlen;
        let mut block = Block {
            b: try_vec(n, 0u8)?,
            x: try_vec(n, T::zero())?,
            nvals: 0,
        };
        for j in j0..j1 {
            let kb = b.find_vector(j);
            let mut allowed = MaskColumn::for_vector(mask, j, 0);
            let base = (j - j0) * cvlen;
            for i in 0..cvlen {
                if !allowed.allows(i) {
                    continue;
                }
                if let Some(cij) = dot_product(at, at.find_vector(i), b, kb, kernel) {
                    block.b[base + i] = 1;
                    block.x[base + i] = cij;
                    block.nvals += 1;
                }
            }
        }
        Ok(block)
    })?;

    let mut cb = try_with_capacity(extent)?;
    let mut cx = try_with_capacity(extent)?;
    let mut nvals = 0;
    for block in blocks {
        cb.extend(block.b);
        cx.extend(block.x);
        nvals += block.nvals;
    }
    Ok(Some(Matrix::from_bitmap(cvlen, cvdim, b.by_col, cb, cx, nvals, false)))
}
