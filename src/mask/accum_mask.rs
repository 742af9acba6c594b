//! `C<M> = accum(C, T)`
//!
//! The last step of every operation that writes into a caller's matrix.
//! First `Z = accum(C, T)` is formed (or `Z = T` without an accumulator),
//! then the masker writes Z into C where the mask allows it. C is replaced
//! only after the new content has been fully built.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::ewise::{ewise_merge, union_matrices, MergeKind};
use crate::mask::{MaskSpec, MaskView};
use crate::matrix::{Context, Descriptor, Matrix};
use crate::ops::{BinaryOp, Scalar};

/// A mask checked against the output and stored in its orientation
pub(crate) struct PreparedMask<'m, T: Scalar> {
    matrix: Option<Cow<'m, Matrix<T>>>,
    complement: bool,
    structural: bool,
}

impl<'m, T: Scalar> PreparedMask<'m, T> {
    pub(crate) fn new(
        spec: MaskSpec<'m, T>,
        nrows: usize,
        ncols: usize,
        by_col: bool,
        op: &'static str,
        ctx: &Context,
    ) -> Result<Self> {
        let matrix = match spec.matrix {
            Some(m) => {
                if (m.nrows(), m.ncols()) != (nrows, ncols) {
                    return Err(Error::dimension_mismatch(
                        op,
                        format!("mask is {}x{}, output is {nrows}x{ncols}", m.nrows(), m.ncols()),
                    ));
                }
                Some(m.in_orientation(by_col, ctx)?)
            }
            None => None,
        };
        Ok(Self {
            matrix,
            complement: spec.complement,
            structural: spec.structural,
        })
    }

    /// The mask as seen by the kernels, if there is one
    pub(crate) fn view(&self) -> Option<MaskView<'_, T>> {
        self.matrix
            .as_deref()
            .map(|m| MaskView::new(m, self.complement, self.structural))
    }

    /// Complemented with no mask matrix
    pub(crate) fn allows_nothing(&self) -> bool {
        self.matrix.is_none() && self.complement
    }

    pub(crate) fn is_absent(&self) -> bool {
        self.matrix.is_none() && !self.complement
    }
}

/// Computes `C<M> = accum(C, T)`
///
/// `t` must have the dimensions of `c`; it may be stored in either
/// orientation and may hold pending work. On error `c` keeps its entries.
pub fn accum_mask<T: Scalar>(
    c: &mut Matrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&BinaryOp<T>>,
    t: Matrix<T>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    c.ensure_valid()?;
    t.ensure_valid()?;
    if (t.nrows(), t.ncols()) != (c.nrows(), c.ncols()) {
        return Err(Error::dimension_mismatch(
            "accum_mask",
            format!("T is {}x{}, C is {}x{}", t.nrows(), t.ncols(), c.nrows(), c.ncols()),
        ));
    }
    let mask = PreparedMask::new(
        MaskSpec::new(mask, desc),
        c.nrows(),
        c.ncols(),
        c.by_col,
        "accum_mask",
        ctx,
    )?;
    accum_mask_prepared(c, &mask, accum, t, desc.replace, ctx)
}

/// `C<M> = accum(C, T)` with a prepared mask
pub(crate) fn accum_mask_prepared<T: Scalar>(
    c: &mut Matrix<T>,
    mask: &PreparedMask<'_, T>,
    accum: Option<&BinaryOp<T>>,
    mut t: Matrix<T>,
    replace: bool,
    ctx: &Context,
) -> Result<()> {
    if mask.allows_nothing() {
        tracing::debug!(replace, "complemented empty mask, T discarded");
        return if replace { c.clear() } else { Ok(()) };
    }
    c.wait_with(ctx)?;
    t.wait_with(ctx)?;
    if t.by_col != c.by_col {
        t = t.transpose_stored(ctx)?;
    }

    let z = match accum {
        Some(op) => union_matrices(ctx, c, &t, op)?,
        None => t,
    };
    write_masked(c, mask, z, replace, ctx)
}

/// `C<M> = Z`: writes Z where the mask allows, keeps or deletes C elsewhere
///
/// Z must be clean, in C's orientation and of C's dimensions.
pub(crate) fn write_masked<T: Scalar>(
    c: &mut Matrix<T>,
    mask: &PreparedMask<'_, T>,
    z: Matrix<T>,
    replace: bool,
    ctx: &Context,
) -> Result<()> {
    if mask.allows_nothing() {
        return if replace { c.clear() } else { Ok(()) };
    }
    let result = match mask.view() {
        None => z,
        Some(view) => {
            c.wait_with(ctx)?;
            ewise_merge(ctx, MergeKind::Masker { replace }, Some(&view), c, &z)?
        }
    };
    c.replace_content(result);
    c.conform_clean(ctx)
}
