//! Element-wise union: `C<M> = accum(C, A ⊕ B)`

use crate::error::Result;
use crate::ewise::{ewise_apply, MergeKind};
use crate::matrix::{Context, Descriptor, Matrix};
use crate::ops::{BinaryOp, Scalar};

/// Computes `C<M> = accum(C, A ⊕ B)`
///
/// The result has an entry wherever A or B has one; `op` combines the two
/// values where both are present, otherwise the single value is copied.
/// With `transpose_first` / `transpose_second` in `desc`, A' or B' is used.
///
/// # Example
///
/// ```
/// use gbsparse::{ewise_add, BinaryOp, Context, Descriptor, Matrix};
///
/// let a = Matrix::build(2, 2, &[0], &[0], &[1.0], None).unwrap();
/// let b = Matrix::build(2, 2, &[0, 1], &[0, 1], &[2.0, 3.0], None).unwrap();
/// let mut c = Matrix::new(2, 2);
/// ewise_add(&mut c, None, None, &BinaryOp::Plus, &a, &b, &Descriptor::new(), &Context::new()).unwrap();
/// assert_eq!(c.get(0, 0), Some(3.0));
/// assert_eq!(c.get(1, 1), Some(3.0));
/// ```
#[allow(clippy::too_many_arguments)]
pub fn ewise_add<T: Scalar>(
    c: &mut Matrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&BinaryOp<T>>,
    op: &BinaryOp<T>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    ewise_apply("ewise_add", c, mask, accum, MergeKind::Union(op), a, b, desc, ctx)
}
