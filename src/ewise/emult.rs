//! Element-wise intersection: `C<M> = accum(C, A ⊗ B)`

use crate::error::Result;
use crate::ewise::{ewise_apply, MergeKind};
use crate::matrix::{Context, Descriptor, Matrix};
use crate::ops::{BinaryOp, Scalar};

/// Computes `C<M> = accum(C, A ⊗ B)`
///
/// The result has an entry only where both A and B have one.
#[allow(clippy::too_many_arguments)]
pub fn ewise_mult<T: Scalar>(
    c: &mut Matrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&BinaryOp<T>>,
    op: &BinaryOp<T>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    ewise_apply("ewise_mult", c, mask, accum, MergeKind::Intersection(op), a, b, desc, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{reference_ewise, DenseModel, Sparsity};

    fn from(nrows: usize, ncols: usize, t: &[(usize, usize, f64)]) -> Matrix<f64> {
        let rows: Vec<_> = t.iter().map(|e| e.0).collect();
        let cols: Vec<_> = t.iter().map(|e| e.1).collect();
        let vals: Vec<_> = t.iter().map(|e| e.2).collect();
        Matrix::build(nrows, ncols, &rows, &cols, &vals, None).unwrap()
    }

    #[test]
    fn test_intersection() {
        let a = from(3, 3, &[(0, 0, 2.0), (1, 2, 3.0), (2, 1, 4.0)]);
        let b = from(3, 3, &[(0, 0, 5.0), (2, 1, 0.5), (2, 2, 1.0)]);
        let mut c = Matrix::new(3, 3);
        ewise_mult(&mut c, None, None, &BinaryOp::Times, &a, &b, &Descriptor::new(), &Context::sequential())
            .unwrap();
        assert_eq!(c.tuples().unwrap(), vec![(0, 0, 10.0), (2, 1, 2.0)]);
    }

    #[test]
    fn test_every_format_pair_agrees() {
        let ta = [(0, 0, 1.0), (1, 1, 2.0), (2, 3, 3.0), (3, 3, 4.0), (3, 0, 5.0)];
        let tb = [(0, 0, 6.0), (2, 3, 7.0), (3, 0, 8.0), (1, 2, 9.0)];
        let want = reference_ewise(&from(4, 4, &ta), &from(4, 4, &tb), &BinaryOp::Plus, false)
            .unwrap()
            .tuples();
        let formats = [Sparsity::Hypersparse, Sparsity::Sparse, Sparsity::Bitmap];
        for fa in formats {
            for fb in formats {
                let mut a = from(4, 4, &ta);
                let mut b = from(4, 4, &tb);
                a.convert_to(fa).unwrap();
                b.convert_to(fb).unwrap();
                let mut c = Matrix::new(4, 4);
                ewise_mult(&mut c, None, None, &BinaryOp::Plus, &a, &b, &Descriptor::new(), &Context::sequential())
                    .unwrap();
                assert_eq!(c.tuples().unwrap(), want, "{fa:?} x {fb:?}");
            }
        }
    }

    #[test]
    fn test_masked_intersection_with_accum() {
        let a = from(2, 2, &[(0, 0, 1.0), (0, 1, 2.0), (1, 1, 3.0)]);
        let b = from(2, 2, &[(0, 0, 4.0), (0, 1, 5.0), (1, 1, 6.0)]);
        let m = from(2, 2, &[(0, 1, 1.0), (1, 1, 0.0)]);
        let c0 = from(2, 2, &[(0, 1, 100.0), (1, 0, 7.0)]);
        let ctx = Context::sequential();
        for desc in [Descriptor::new(), Descriptor::new().with_structural().with_replace()] {
            let mut c = c0.clone();
            ewise_mult(&mut c, Some(&m), Some(&BinaryOp::Plus), &BinaryOp::Times, &a, &b, &desc, &ctx).unwrap();
            let t = reference_ewise(&a, &b, &BinaryOp::Times, false).unwrap();
            let want = DenseModel::from_matrix(&c0).unwrap().masked_write(
                &t,
                Some(&DenseModel::from_matrix(&m).unwrap()),
                desc.mask_complement,
                desc.mask_structural,
                Some(&BinaryOp::Plus),
                desc.replace,
            );
            assert_eq!(c.tuples().unwrap(), want.tuples(), "{desc:?}");
        }
    }

    #[test]
    fn test_pair_gives_iso_result() {
        let a = from(3, 3, &[(0, 0, 2.0), (1, 1, 3.0)]);
        let b = from(3, 3, &[(0, 0, 5.0), (1, 1, 1.0), (2, 2, 1.0)]);
        let mut c = Matrix::new(3, 3);
        ewise_mult(&mut c, None, None, &BinaryOp::Pair, &a, &b, &Descriptor::new(), &Context::sequential())
            .unwrap();
        assert!(c.is_iso());
        assert_eq!(c.tuples().unwrap(), vec![(0, 0, 1.0), (1, 1, 1.0)]);
    }
}
