//! Merges with a bitmap or full output
//!
//! Sparse operands are first expanded to bitmaps, then each output vector
//! is merged position by position into its own window of the output.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::ewise::cursor::Cursor;
use crate::ewise::merge::{Merger, Sink};
use crate::ewise::MergeKind;
use crate::mask::{MaskColumn, MaskView};
use crate::matrix::{Context, Matrix, Sparsity};
use crate::ops::Scalar;
use crate::parallel::map_tasks;
use crate::slice::{nthreads_for, ntasks_for};
use crate::utils::try_vec;

/// Writes entries into the dense window of one vector
struct DenseSink<'w, T> {
    b: &'w mut [u8],
    x: Option<&'w mut [T]>,
    count: usize,
}

impl<'w, T> Sink<T> for DenseSink<'w, T> {
    #[inline]
    fn push<F: FnOnce() -> T>(&mut self, i: usize, value: F) {
        self.b[i] = 1;
        if let Some(x) = self.x.as_deref_mut() {
            x[i] = value();
        }
        self.count += 1;
    }
}

fn as_dense<'m, T: Scalar>(m: &'m Matrix<T>, ctx: &Context) -> Result<Cow<'m, Matrix<T>>> {
    if m.is_bitmap_or_full() {
        return Ok(Cow::Borrowed(m));
    }
    let mut copy = m.clone();
    copy.convert_clean(Sparsity::Bitmap, ctx)?;
    Ok(Cow::Owned(copy))
}

pub(super) fn merge_dense<T: Scalar>(
    ctx: &Context,
    kind: MergeKind<'_, T>,
    mask: Option<&MaskView<'_, T>>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    iso: Option<T>,
    full_allowed: bool,
) -> Result<Matrix<T>> {
    let (vlen, vdim, by_col) = (a.vlen, a.vdim, a.by_col);
    let n = a
        .dense_extent()
        .ok_or_else(|| Error::invalid_value("dense extent overflows"))?;
    let a_dense = as_dense(a, ctx)?;
    let b_dense = as_dense(b, ctx)?;
    let (a, b): (&Matrix<T>, &Matrix<T>) = (&a_dense, &b_dense);

    let mut bm = try_vec(n, 0u8)?;
    let mut x = match iso {
        Some(v) => vec![v],
        None => try_vec(n, T::zero())?,
    };

    let mut nvals = 0;
    if n > 0 {
        let nthreads = nthreads_for(n as f64, ctx.chunk, ctx.nthreads_max);
        let ntasks = ntasks_for(nthreads, vdim);
        let per_task = vdim.div_ceil(ntasks);
        let width = per_task * vlen;
        let value_windows: Vec<Option<&mut [T]>> = if iso.is_some() {
            (0..vdim.div_ceil(per_task)).map(|_| None).collect()
        } else {
            x.chunks_mut(width).map(Some).collect()
        };
        let work: Vec<_> = bm.chunks_mut(width).zip(value_windows).enumerate().collect();
        let merger = Merger::new(kind, a, b);

        let counts = map_tasks(ctx, nthreads, work, |(t, (wb, mut wx)): (usize, (&mut [u8], Option<&mut [T]>))| {
            let jfirst = t * per_task;
            let mut count = 0;
            for (q, vb) in wb.chunks_mut(vlen).enumerate() {
                let j = jfirst + q;
                let vx = wx.as_deref_mut().map(|wx| &mut wx[q * vlen..(q + 1) * vlen]);
                let mut sink = DenseSink { b: vb, x: vx, count: 0 };
                let mut mc = MaskColumn::for_vector(mask, j, 0);
                merger.merge_vector(
                    Cursor::whole(a, Some(j)),
                    Cursor::whole(b, Some(j)),
                    &mut mc,
                    &mut sink,
                );
                count += sink.count;
            }
            count
        });
        nvals = counts.into_iter().sum();
    }

    if full_allowed && nvals == n {
        return Ok(Matrix::from_full(vlen, vdim, by_col, x, iso.is_some()));
    }
    Ok(Matrix::from_bitmap(vlen, vdim, by_col, bm, x, nvals, iso.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::BinaryOp;

    #[test]
    fn test_masked_bitmap_union() {
        let a = Matrix::new_full(3, 3, 1i32).unwrap();
        let mut b = Matrix::build(3, 3, &[0, 2], &[0, 2], &[5, 6], None).unwrap();
        b.convert_to(Sparsity::Bitmap).unwrap();
        let m = Matrix::build(3, 3, &[0, 1, 2], &[0, 1, 2], &[1, 1, 1], None).unwrap();
        let view = MaskView::new(&m, false, true);
        let c = merge_dense(
            &Context::sequential(),
            MergeKind::Union(&BinaryOp::Plus),
            Some(&view),
            &a,
            &b,
            None,
            false,
        )
        .unwrap();
        assert_eq!(c.sparsity(), Sparsity::Bitmap);
        assert!(c.check().is_ok());
        assert_eq!(c.tuples().unwrap(), vec![(0, 0, 6), (1, 1, 1), (2, 2, 7)]);
    }

    #[test]
    fn test_parallel_dense_intersection() {
        let a = Matrix::new_full(50, 40, 2i32).unwrap();
        let b = Matrix::new_full(50, 40, 3i32).unwrap();
        let ctx = Context::sequential().with_nthreads_max(4).with_chunk(10);
        let c = merge_dense(&ctx, MergeKind::Intersection(&BinaryOp::Times), None, &a, &b, Some(6), true).unwrap();
        assert_eq!(c.sparsity(), Sparsity::Full);
        assert!(c.is_iso());
        assert_eq!(c.nvals(), 2000);
        assert_eq!(c.get(49, 39), Some(6));
    }
}
