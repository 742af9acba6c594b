//! Matrix multiply over a semiring: `C<M> = accum(C, A*B)`
//!
//! The dispatcher works on operands laid out in C's orientation. For a
//! by-column C the product is computed as is; for a by-row C the storage of
//! every matrix is read as its transpose and `C' = B'*A'` is computed, with
//! the multiply operator's arguments swapped back. In that frame the left
//! operand is X and the right one Y, and the methods are tried in order:
//!
//! 1. saxpy4 / saxpy5: C full and updated in place, `C += X*Y` where one
//!    of X and Y is bitmap or full and the accumulator is the monoid
//! 2. dot3 / dot2: when X's rows are at hand without a transpose, or the
//!    method is forced; dot3 for a sparse mask, dot2 for a bitmap result
//! 3. saxpy3: everything else
//!
//! A method that declines a case (a punt) leaves no trace and the next one
//! runs. The product is then written through the masked accumulate step.

mod dot2;
mod dot3;
mod saxpy3;
mod saxpy4;
mod saxpy5;

use crate::constants::{DOT2_DENSITY_FACTOR, INTERSECT_SEARCH_RATIO};
use crate::error::{Error, Result};
use crate::ewise::cursor::Cursor;
use crate::mask::accum_mask::{accum_mask_prepared, PreparedMask};
use crate::mask::{MaskSpec, MaskView};
use crate::matrix::{AxbMethod, Context, Descriptor, Lifecycle, Matrix};
use crate::ops::{BinaryOp, Scalar, Semiring, SemiringKernel};

/// A method's result, or `None` when it declines the case
type Attempt<R> = Result<Option<R>>;

/// Computes `C<M> = accum(C, A*B)` over `semiring`
///
/// `desc` may transpose either operand, complement or structure the mask,
/// replace C outside the mask, swap the multiply's arguments (`flipxy`) and
/// force a method. On error C keeps its previous content.
///
/// # Example
///
/// ```
/// use gbsparse::{mxm, Context, Descriptor, Matrix, Semiring};
///
/// let a = Matrix::build(2, 2, &[0, 1], &[0, 1], &[1.0, 2.0], None).unwrap();
/// let b = Matrix::<f64>::identity(2).unwrap();
/// let mut c = Matrix::new(2, 2);
/// mxm(&mut c, None, None, &Semiring::plus_times(), &a, &b, &Descriptor::new(), &Context::new()).unwrap();
/// assert_eq!(c.tuples().unwrap(), vec![(0, 0, 1.0), (1, 1, 2.0)]);
/// ```
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip_all, fields(method = ?desc.axb_method))]
pub fn mxm<T: Scalar>(
    c: &mut Matrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&BinaryOp<T>>,
    semiring: &Semiring<T>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    c.ensure_valid()?;
    a.ensure_valid()?;
    b.ensure_valid()?;
    let dims = |m: &Matrix<T>, transpose: bool| {
        if transpose {
            (m.ncols(), m.nrows())
        } else {
            (m.nrows(), m.ncols())
        }
    };
    let (ad, bd) = (dims(a, desc.transpose_first), dims(b, desc.transpose_second));
    let cd = (c.nrows(), c.ncols());
    if ad.1 != bd.0 || cd != (ad.0, bd.1) {
        return Err(Error::dimension_mismatch(
            "mxm",
            format!(
                "C is {}x{}, A is {}x{}, B is {}x{}",
                cd.0, cd.1, ad.0, ad.1, bd.0, bd.1
            ),
        ));
    }

    let o = c.by_col;
    let prepared = PreparedMask::new(MaskSpec::new(mask, desc), cd.0, cd.1, o, "mxm", ctx)?;
    if prepared.allows_nothing() {
        tracing::debug!("complemented empty mask, no product computed");
        return if desc.replace { c.clear() } else { Ok(()) };
    }

    let (x_src, y_src) = if o {
        ((a, desc.transpose_first), (b, desc.transpose_second))
    } else {
        ((b, desc.transpose_second), (a, desc.transpose_first))
    };
    let kernel = SemiringKernel::new(semiring, desc.flipxy != !o);
    let method = desc.axb_method;
    let y = y_src.0.as_operand(y_src.1, o, ctx)?;

    if in_place_eligible(c, &prepared, accum, semiring, desc) {
        let x = x_src.0.as_operand(x_src.1, o, ctx)?;
        if saxpy_in_place(ctx, c, &x, &y, &kernel)?.is_some() {
            return Ok(());
        }
    }

    let view = prepared.view();
    let (xm, xtr) = x_src;
    let xt_free = (xm.by_col == o) == xtr;
    let try_dot = match method {
        AxbMethod::Dot => true,
        AxbMethod::Default => xt_free,
        _ => false,
    };
    if try_dot {
        // X with its rows as stored vectors
        let xt = xm.as_operand(xtr, !o, ctx)?;
        if let Some(t) = dot(ctx, &xt, &y, view.as_ref(), &kernel, method)? {
            return accum_mask_prepared(c, &prepared, accum, t, desc.replace, ctx);
        }
    }

    let x = xm.as_operand(xtr, o, ctx)?;
    tracing::debug!(
        x = ?x.sparsity(),
        y = ?y.sparsity(),
        masked = view.is_some(),
        "saxpy3"
    );
    let t = saxpy3::saxpy3(ctx, &x, &y, view.as_ref(), &kernel, method)?;
    accum_mask_prepared(c, &prepared, accum, t, desc.replace, ctx)
}

/// True if `C += X*Y` can update C's values directly
fn in_place_eligible<T: Scalar>(
    c: &Matrix<T>,
    mask: &PreparedMask<'_, T>,
    accum: Option<&BinaryOp<T>>,
    semiring: &Semiring<T>,
    desc: &Descriptor,
) -> bool {
    matches!(desc.axb_method, AxbMethod::Default | AxbMethod::Saxpy)
        && c.is_full()
        && c.lifecycle() == Lifecycle::Clean
        && mask.is_absent()
        && !desc.replace
        && accum.is_some_and(|op| op.same_as(semiring.add().op()))
}

/// saxpy4 or saxpy5 into a full C, when one operand is dense and the other sparse
fn saxpy_in_place<T: Scalar>(
    ctx: &Context,
    c: &mut Matrix<T>,
    x: &Matrix<T>,
    y: &Matrix<T>,
    kernel: &SemiringKernel<T>,
) -> Attempt<()> {
    let sparse_dense = x.is_sparse_or_hyper() && y.is_bitmap_or_full();
    let dense_sparse = x.is_bitmap_or_full() && y.is_sparse_or_hyper();
    if !sparse_dense && !dense_sparse {
        return Ok(None);
    }
    if kernel.any || !kernel.is_builtin() {
        tracing::debug!(any = kernel.any, "saxpy4/5 punt");
        return Ok(None);
    }
    c.expand_iso()?;
    let cvlen = c.vlen;
    if sparse_dense {
        tracing::debug!(y = ?y.sparsity(), "saxpy4: full += sparse * dense");
        saxpy4::saxpy4(ctx, &mut c.x, cvlen, x, y, kernel);
    } else {
        tracing::debug!(x = ?x.sparsity(), "saxpy5: full += dense * sparse");
        saxpy5::saxpy5(ctx, &mut c.x, cvlen, x, y, kernel);
    }
    Ok(Some(()))
}

/// dot3 for a sparse non-complemented mask, dot2 otherwise
fn dot<T: Scalar>(
    ctx: &Context,
    xt: &Matrix<T>,
    y: &Matrix<T>,
    mask: Option<&MaskView<'_, T>>,
    kernel: &SemiringKernel<T>,
    method: AxbMethod,
) -> Attempt<Matrix<T>> {
    if let Some(view) = mask.filter(|v| v.m.is_sparse_or_hyper() && !v.complement) {
        tracing::debug!(mask = ?view.m.sparsity(), "dot3");
        return dot3::dot3(ctx, xt, y, view, kernel).map(Some);
    }
    if method == AxbMethod::Default {
        let extent = xt.vdim.checked_mul(y.vdim).unwrap_or(usize::MAX);
        let held = xt.nnz_slots().saturating_add(y.nnz_slots()).max(1);
        if extent / DOT2_DENSITY_FACTOR > held {
            tracing::debug!(extent, held, "dot2 punt: bitmap result too sparse");
            return Ok(None);
        }
    }
    tracing::debug!("dot2");
    dot2::dot2(ctx, xt, y, mask, kernel)
}

/// `sum over k of X(i,k) * Y(k,j)`, merging X' vector `ki` with Y vector `kj`
///
/// `None` if the two vectors share no index. Stops early once the monoid
/// reaches its terminal value.
pub(crate) fn dot_product<T: Scalar>(
    xt: &Matrix<T>,
    ki: Option<usize>,
    y: &Matrix<T>,
    kj: Option<usize>,
    kernel: &SemiringKernel<T>,
) -> Option<T> {
    let mut cx = Cursor::whole(xt, ki);
    let mut cy = Cursor::whole(y, kj);
    let (nx, ny) = (cx.remaining(), cy.remaining());
    let searching = cx.is_sparse()
        && cy.is_sparse()
        && (nx.saturating_mul(INTERSECT_SEARCH_RATIO) <= ny || ny.saturating_mul(INTERSECT_SEARCH_RATIO) <= nx);
    let mut sum: Option<T> = None;
    while let (Some(ix), Some(iy)) = (cx.peek(), cy.peek()) {
        if ix < iy {
            if searching {
                cx.seek(iy);
            } else {
                cx.advance_to(iy);
            }
        } else if iy < ix {
            if searching {
                cy.seek(ix);
            } else {
                cy.advance_to(ix);
            }
        } else {
            let t = kernel.multiply(xt.value_at(cx.pos()), y.value_at(cy.pos()));
            let s = match sum {
                Some(s) => kernel.add(s, t),
                None => t,
            };
            sum = Some(s);
            if kernel.is_terminal(s) {
                break;
            }
            cx.advance();
            cy.advance();
        }
    }
    sum
}
