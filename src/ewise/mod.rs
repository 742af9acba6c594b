//! Element-wise union, intersection and the masker
//!
//! All three merge two matrices of the same shape and orientation vector
//! by vector, and share one pipeline:
//!
//! 1. **phase 0** decides the output vector list (see [`phase0`]);
//! 2. **phase 1** slices the vectors into tasks and counts the entries each
//!    output vector will hold, then turns the counts into pointers;
//! 3. **phase 2** writes indices and values into the disjoint ranges the
//!    counts reserved for each task.
//!
//! The output format is fixed before any value is computed: bitmap (or
//! full) when the operands are dense enough, sparse or hypersparse
//! otherwise. Dense outputs skip phases 0 and 1.

pub mod add;
mod bitmap;
pub(crate) mod cursor;
pub mod emult;
pub(crate) mod merge;
pub mod phase0;
mod sparse;

pub use add::ewise_add;
pub use emult::ewise_mult;
pub(crate) use phase0::phase0;
pub use phase0::Phase0;

use crate::error::{Error, Result};
use crate::mask::accum_mask::{accum_mask_prepared, PreparedMask};
use crate::mask::{MaskSpec, MaskView};
use crate::matrix::{Context, Descriptor, Matrix, Sparsity};
use crate::ops::{BinaryOp, Scalar};

/// How two vectors are combined
#[derive(Debug, Clone, Copy)]
pub enum MergeKind<'a, T> {
    /// Entries of either operand; `op` where both have one
    Union(&'a BinaryOp<T>),
    /// Entries of both operands, combined with `op`
    Intersection(&'a BinaryOp<T>),
    /// Writes Z (second operand) into C (first) where the mask allows;
    /// elsewhere C is kept, or deleted with `replace`
    Masker { replace: bool },
}

/// Format of the merge output
fn output_sparsity<T: Scalar>(
    kind: MergeKind<'_, T>,
    masked: bool,
    a: &Matrix<T>,
    b: &Matrix<T>,
) -> Sparsity {
    let dense = |m: &Matrix<T>| m.is_bitmap_or_full();
    match kind {
        MergeKind::Union(_) => {
            if !masked && (a.is_full() || b.is_full()) {
                Sparsity::Full
            } else if dense(a) || dense(b) {
                Sparsity::Bitmap
            } else if a.is_hyper() && b.is_hyper() {
                Sparsity::Hypersparse
            } else {
                Sparsity::Sparse
            }
        }
        MergeKind::Intersection(_) => {
            if !masked && a.is_full() && b.is_full() {
                Sparsity::Full
            } else if dense(a) && dense(b) {
                Sparsity::Bitmap
            } else if a.is_hyper() || b.is_hyper() {
                Sparsity::Hypersparse
            } else {
                Sparsity::Sparse
            }
        }
        MergeKind::Masker { .. } => {
            if dense(a) && dense(b) {
                Sparsity::Bitmap
            } else if a.is_hyper() && b.is_hyper() {
                Sparsity::Hypersparse
            } else {
                Sparsity::Sparse
            }
        }
    }
}

/// The value shared by every output entry, when one is known in advance
fn output_iso<T: Scalar>(kind: MergeKind<'_, T>, a: &Matrix<T>, b: &Matrix<T>) -> Option<T> {
    let (a0, b0) = (a.iso_value(), b.iso_value());
    match kind {
        MergeKind::Intersection(BinaryOp::Pair) => Some(T::one()),
        MergeKind::Intersection(op) => Some(op.apply(a0?, b0?)),
        MergeKind::Union(op) => {
            let (a0, b0) = (a0?, b0?);
            (a0 == b0 && op.apply(a0, b0) == a0).then_some(a0)
        }
        MergeKind::Masker { .. } => {
            let (a0, b0) = (a0?, b0?);
            (a0 == b0).then_some(a0)
        }
    }
}

/// Merges two clean matrices of the same shape and orientation
///
/// The mask, when given, must be in the same orientation; entries it does
/// not allow are left out of union and intersection outputs and steer the
/// masker. The result is clean but not conformed.
pub(crate) fn ewise_merge<T: Scalar>(
    ctx: &Context,
    kind: MergeKind<'_, T>,
    mask: Option<&MaskView<'_, T>>,
    a: &Matrix<T>,
    b: &Matrix<T>,
) -> Result<Matrix<T>> {
    a.ensure_valid()?;
    b.ensure_valid()?;
    debug_assert_eq!((a.vlen, a.vdim, a.by_col), (b.vlen, b.vdim, b.by_col));
    debug_assert!(a.pending.is_none() && a.nzombies == 0 && !a.jumbled);
    debug_assert!(b.pending.is_none() && b.nzombies == 0 && !b.jumbled);

    let iso = output_iso(kind, a, b);
    let sparsity = output_sparsity(kind, mask.is_some(), a, b);
    tracing::debug!(?kind, ?sparsity, iso = iso.is_some(), "ewise merge");
    match sparsity {
        Sparsity::Bitmap | Sparsity::Full => {
            bitmap::merge_dense(ctx, kind, mask, a, b, iso, sparsity == Sparsity::Full)
        }
        Sparsity::Sparse | Sparsity::Hypersparse => sparse::merge_sparse(ctx, kind, mask, a, b, iso),
    }
}

/// `C<M> = accum(C, A op B)` for a union or intersection
///
/// Shared body of [`ewise_add`] and [`ewise_mult`]: checks dimensions,
/// brings A, B and the mask into C's orientation, merges under the mask and
/// writes the result through the masked accumulate step.
#[allow(clippy::too_many_arguments)]
pub(crate) fn ewise_apply<T: Scalar>(
    name: &'static str,
    c: &mut Matrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&BinaryOp<T>>,
    kind: MergeKind<'_, T>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    c.ensure_valid()?;
    let dims = |m: &Matrix<T>, transpose: bool| {
        if transpose {
            (m.ncols(), m.nrows())
        } else {
            (m.nrows(), m.ncols())
        }
    };
    let (ad, bd) = (dims(a, desc.transpose_first), dims(b, desc.transpose_second));
    let cd = (c.nrows(), c.ncols());
    if ad != cd || bd != cd {
        return Err(Error::dimension_mismatch(
            name,
            format!(
                "C is {}x{}, A is {}x{}, B is {}x{}",
                cd.0, cd.1, ad.0, ad.1, bd.0, bd.1
            ),
        ));
    }

    let by_col = c.by_col;
    let mask = PreparedMask::new(MaskSpec::new(mask, desc), cd.0, cd.1, by_col, name, ctx)?;
    if mask.allows_nothing() {
        return if desc.replace { c.clear() } else { Ok(()) };
    }
    let a = a.as_operand(desc.transpose_first, by_col, ctx)?;
    let b = b.as_operand(desc.transpose_second, by_col, ctx)?;
    let view = mask.view();
    let t = ewise_merge(ctx, kind, view.as_ref(), &a, &b)?;
    accum_mask_prepared(c, &mask, accum, t, desc.replace, ctx)
}

/// Union of two clean matrices with `op` where both have an entry
pub(crate) fn union_matrices<T: Scalar>(
    ctx: &Context,
    a: &Matrix<T>,
    b: &Matrix<T>,
    op: &BinaryOp<T>,
) -> Result<Matrix<T>> {
    ewise_merge(ctx, MergeKind::Union(op), None, a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SparsityControl;

    fn sparse(nrows: usize, ncols: usize, t: &[(usize, usize, i64)]) -> Matrix<i64> {
        let rows: Vec<_> = t.iter().map(|e| e.0).collect();
        let cols: Vec<_> = t.iter().map(|e| e.1).collect();
        let vals: Vec<_> = t.iter().map(|e| e.2).collect();
        let mut m = Matrix::build(nrows, ncols, &rows, &cols, &vals, None).unwrap();
        m.set_sparsity_control(SparsityControl::SPARSE);
        m.convert_to(Sparsity::Sparse).unwrap();
        m
    }

    #[test]
    fn test_output_sparsity_rules() {
        let s = sparse(4, 4, &[(0, 0, 1)]);
        let mut f = Matrix::new_full(4, 4, 1i64).unwrap();
        let plus = BinaryOp::Plus;
        assert_eq!(output_sparsity(MergeKind::Union(&plus), false, &s, &f), Sparsity::Full);
        assert_eq!(output_sparsity(MergeKind::Union(&plus), true, &s, &f), Sparsity::Bitmap);
        assert_eq!(output_sparsity(MergeKind::Intersection(&plus), false, &s, &f), Sparsity::Sparse);
        assert_eq!(output_sparsity(MergeKind::Intersection(&plus), false, &f, &f), Sparsity::Full);
        f.convert_to(Sparsity::Bitmap).unwrap();
        assert_eq!(output_sparsity(MergeKind::Intersection(&plus), false, &f, &f), Sparsity::Bitmap);
        assert_eq!(output_sparsity(MergeKind::Masker { replace: false }, true, &s, &f), Sparsity::Sparse);
    }

    #[test]
    fn test_iso_rules() {
        let a = Matrix::new_full(2, 2, 3i64).unwrap();
        let b = Matrix::new_full(2, 2, 3i64).unwrap();
        let s = sparse(2, 2, &[(0, 0, 1)]);
        assert_eq!(output_iso(MergeKind::Intersection(&BinaryOp::Pair), &s, &s), Some(1));
        assert_eq!(output_iso(MergeKind::Intersection(&BinaryOp::Plus), &a, &b), Some(6));
        assert_eq!(output_iso(MergeKind::Union(&BinaryOp::Max), &a, &b), Some(3));
        assert_eq!(output_iso(MergeKind::Union(&BinaryOp::Plus), &a, &b), None);
        assert_eq!(output_iso(MergeKind::Union(&BinaryOp::Plus), &a, &s), None);
        assert_eq!(output_iso(MergeKind::Masker { replace: true }, &a, &b), Some(3));
    }

    #[test]
    fn test_union_of_sparse_matrices() {
        let a = sparse(3, 3, &[(0, 0, 1), (1, 2, 2)]);
        let b = sparse(3, 3, &[(0, 0, 10), (2, 1, 5)]);
        let c = union_matrices(&Context::sequential(), &a, &b, &BinaryOp::Plus).unwrap();
        assert!(c.check().is_ok());
        assert_eq!(c.tuples().unwrap(), vec![(0, 0, 11), (1, 2, 2), (2, 1, 5)]);
    }

    #[test]
    fn test_parallel_merge_matches_sequential() {
        // a long row forces fine tasks
        let mut ta = Vec::new();
        let mut tb = Vec::new();
        for j in 0..3000 {
            if j % 2 == 0 {
                ta.push((0, j, j as i64));
            }
            if j % 3 == 0 {
                tb.push((0, j, 1));
            }
        }
        ta.push((5, 7, 9));
        let a = sparse(8, 3000, &ta);
        let b = sparse(8, 3000, &tb);
        let par = Context::sequential().with_nthreads_max(4).with_chunk(16);
        let seq = Context::sequential();
        for kind in [MergeKind::Union(&BinaryOp::Plus), MergeKind::Intersection(&BinaryOp::Plus)] {
            let x = ewise_merge(&par, kind, None, &a, &b).unwrap();
            let y = ewise_merge(&seq, kind, None, &a, &b).unwrap();
            assert!(x.check().is_ok());
            assert_eq!(x.tuples().unwrap(), y.tuples().unwrap());
        }
    }

    #[test]
    fn test_dense_merge() {
        let a = sparse(2, 2, &[(0, 1, 4)]);
        let mut b = sparse(2, 2, &[(0, 0, 1), (1, 1, 2)]);
        b.set_sparsity_control(SparsityControl::BITMAP);
        b.convert_to(Sparsity::Bitmap).unwrap();
        let ctx = Context::sequential();
        let u = ewise_merge(&ctx, MergeKind::Union(&BinaryOp::Plus), None, &a, &b).unwrap();
        assert_eq!(u.sparsity(), Sparsity::Bitmap);
        assert_eq!(u.tuples().unwrap(), vec![(0, 0, 1), (0, 1, 4), (1, 1, 2)]);

        let f = Matrix::new_full(2, 2, 10i64).unwrap();
        let u = ewise_merge(&ctx, MergeKind::Union(&BinaryOp::Plus), None, &a, &f).unwrap();
        assert_eq!(u.sparsity(), Sparsity::Full);
        assert_eq!(u.get(0, 1), Some(14));
        assert_eq!(u.get(1, 0), Some(10));
        assert!(!u.is_iso());
    }
}
