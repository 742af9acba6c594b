//! Masked assignment: `C<M>(I, J) = accum(C(I, J), A)` and its scalar form
//!
//! The general path expands A (or the scalar) into a matrix S of C's
//! dimensions holding entries only inside the I×J region, forms
//! `Z = accum(C, S)` (or C with the region replaced by S), and writes Z
//! through the masker. The mask has C's dimensions and `replace` applies to
//! all of C.
//!
//! Two dense cases skip the general path: a full C receiving a scalar
//! everywhere, and an empty C receiving a dense A everywhere. Both punt to
//! the general path when their preconditions do not hold.

use crate::error::{Error, Result};
use crate::ewise::union_matrices;
use crate::mask::accum_mask::{write_masked, PreparedMask};
use crate::mask::MaskSpec;
use crate::matrix::{Context, Descriptor, Lifecycle, Matrix, Sparsity};
use crate::ops::{BinaryOp, Scalar};
use crate::parallel::for_each_window;
use crate::slice::nthreads_for;
use crate::utils::{try_vec, try_with_capacity};

/// A list of row or column indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indices<'a> {
    /// Every index of the dimension, in order
    All,
    /// The half-open range `[start, end)`
    Range { start: usize, end: usize },
    /// An explicit list
    List(&'a [usize]),
}

impl<'a> Indices<'a> {
    /// Number of indices selected from a dimension of size `n`
    pub fn len(&self, n: usize) -> usize {
        match self {
            Indices::All => n,
            Indices::Range { start, end } => end.saturating_sub(*start),
            Indices::List(list) => list.len(),
        }
    }

    /// The `k`-th selected index
    #[inline]
    pub fn get(&self, k: usize) -> usize {
        match self {
            Indices::All => k,
            Indices::Range { start, .. } => start + k,
            Indices::List(list) => list[k],
        }
    }

    fn is_all(&self, n: usize) -> bool {
        match self {
            Indices::All => true,
            Indices::Range { start, end } => *start == 0 && *end == n,
            Indices::List(_) => false,
        }
    }

    /// Membership flags over a dimension of size `n`; duplicates and
    /// out-of-range indices are rejected
    fn membership(&self, n: usize) -> Result<Option<Vec<bool>>> {
        if self.is_all(n) {
            return Ok(None);
        }
        let mut member = try_vec(n, false)?;
        for k in 0..self.len(n) {
            let i = self.get(k);
            if i >= n {
                return Err(Error::IndexOutOfBounds { index: i, size: n });
            }
            if member[i] {
                return Err(Error::invalid_value(format!("index {i} appears twice")));
            }
            member[i] = true;
        }
        Ok(Some(member))
    }
}

/// Computes `C<M>(rows, cols) = accum(C(rows, cols), A)`
///
/// A (or its transpose with `transpose_first`) must be
/// `rows.len()`-by-`cols.len()`. Without `accum`, entries of C inside the
/// region that A does not have are deleted.
#[allow(clippy::too_many_arguments)]
pub fn assign<T: Scalar>(
    c: &mut Matrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&BinaryOp<T>>,
    a: &Matrix<T>,
    rows: Indices<'_>,
    cols: Indices<'_>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    c.ensure_valid()?;
    a.ensure_valid()?;
    let (nrows, ncols) = (c.nrows(), c.ncols());
    let (ni, nj) = (rows.len(nrows), cols.len(ncols));
    let (anrows, ancols) = if desc.transpose_first {
        (a.ncols(), a.nrows())
    } else {
        (a.nrows(), a.ncols())
    };
    if (anrows, ancols) != (ni, nj) {
        return Err(Error::dimension_mismatch(
            "assign",
            format!("A is {anrows}x{ancols}, the region is {ni}x{nj}"),
        ));
    }
    let row_member = rows.membership(nrows)?;
    let col_member = cols.membership(ncols)?;
    let mask = PreparedMask::new(MaskSpec::new(mask, desc), nrows, ncols, c.by_col, "assign", ctx)?;
    let a = a.as_operand(desc.transpose_first, c.by_col, ctx)?;

    let whole = row_member.is_none() && col_member.is_none();
    if whole && mask.is_absent() && accum.is_none() && assign_dense_into_empty(c, &a)? {
        return Ok(());
    }

    let mut entries = try_with_capacity(a.nvals())?;
    for k in 0..a.nvec() {
        let j = a.vector_id(k);
        let (pstart, pend) = a.vector_range(k);
        for p in pstart..pend {
            if a.present_at(p) {
                let (r, s) = a.logical_coords(j, a.index_at(p));
                entries.push((rows.get(r), cols.get(s), a.value_at(p)));
            }
        }
    }
    let s = region_matrix(c, entries)?;
    assign_general(c, &mask, accum, s, row_member.as_deref(), col_member.as_deref(), desc.replace, ctx)
}

/// Computes `C<M>(rows, cols) = accum(C(rows, cols), value)`
#[allow(clippy::too_many_arguments)]
pub fn assign_scalar<T: Scalar>(
    c: &mut Matrix<T>,
    mask: Option<&Matrix<T>>,
    accum: Option<&BinaryOp<T>>,
    value: T,
    rows: Indices<'_>,
    cols: Indices<'_>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    c.ensure_valid()?;
    let (nrows, ncols) = (c.nrows(), c.ncols());
    let row_member = rows.membership(nrows)?;
    let col_member = cols.membership(ncols)?;
    let mask = PreparedMask::new(MaskSpec::new(mask, desc), nrows, ncols, c.by_col, "assign", ctx)?;

    let whole = row_member.is_none() && col_member.is_none();
    if whole && mask.is_absent() && assign_scalar_into_full(c, accum, value, ctx)? {
        return Ok(());
    }

    let (ni, nj) = (rows.len(nrows), cols.len(ncols));
    let n = ni
        .checked_mul(nj)
        .ok_or_else(|| Error::invalid_value("assigned region is too large"))?;
    let mut entries = try_with_capacity(n)?;
    for r in 0..ni {
        for s in 0..nj {
            entries.push((rows.get(r), cols.get(s), value));
        }
    }
    let s = region_matrix(c, entries)?;
    assign_general(c, &mask, accum, s, row_member.as_deref(), col_member.as_deref(), desc.replace, ctx)
}

/// Matrix of C's shape and orientation holding the given (row, col, value) entries
fn region_matrix<T: Scalar>(c: &Matrix<T>, entries: Vec<(usize, usize, T)>) -> Result<Matrix<T>> {
    let mut keyed: Vec<((usize, usize), T)> = try_with_capacity(entries.len())?;
    keyed.extend(
        entries
            .into_iter()
            .map(|(row, col, v)| (c.stored_coords(row, col), v)),
    );
    keyed.sort_unstable_by_key(|&(key, _)| key);
    let mut keys = try_with_capacity(keyed.len())?;
    let mut vals = try_with_capacity(keyed.len())?;
    for (key, v) in keyed {
        keys.push(key);
        vals.push(v);
    }
    Matrix::from_sorted_keys(c.vlen, c.vdim, c.by_col, &keys, vals)
}

#[allow(clippy::too_many_arguments)]
fn assign_general<T: Scalar>(
    c: &mut Matrix<T>,
    mask: &PreparedMask<'_, T>,
    accum: Option<&BinaryOp<T>>,
    s: Matrix<T>,
    row_member: Option<&[bool]>,
    col_member: Option<&[bool]>,
    replace: bool,
    ctx: &Context,
) -> Result<()> {
    if mask.allows_nothing() {
        return if replace { c.clear() } else { Ok(()) };
    }
    c.wait_with(ctx)?;
    let z = match accum {
        Some(op) => union_matrices(ctx, c, &s, op)?,
        None => {
            let kept = outside_region(c, row_member, col_member)?;
            union_matrices(ctx, &kept, &s, &BinaryOp::Second)?
        }
    };
    tracing::debug!(nvals = z.nvals(), accum = accum.is_some(), "assign general path");
    write_masked(c, mask, z, replace, ctx)
}

/// The entries of a clean C outside the rows × cols region
fn outside_region<T: Scalar>(
    c: &Matrix<T>,
    row_member: Option<&[bool]>,
    col_member: Option<&[bool]>,
) -> Result<Matrix<T>> {
    let inside = |row: usize, col: usize| {
        row_member.map_or(true, |m| m[row]) && col_member.map_or(true, |m| m[col])
    };
    let mut keys = try_with_capacity(c.nvals())?;
    let mut vals = try_with_capacity(c.nvals())?;
    for k in 0..c.nvec() {
        let j = c.vector_id(k);
        let (pstart, pend) = c.vector_range(k);
        for p in pstart..pend {
            let i = c.index_at(p);
            let (row, col) = c.logical_coords(j, i);
            if c.present_at(p) && !inside(row, col) {
                keys.push((j, i));
                vals.push(c.value_at(p));
            }
        }
    }
    Matrix::from_sorted_keys(c.vlen, c.vdim, c.by_col, &keys, vals)
}

/// `C = A` for an empty C and a dense A; false if the case does not apply
fn assign_dense_into_empty<T: Scalar>(c: &mut Matrix<T>, a: &Matrix<T>) -> Result<bool> {
    if c.lifecycle() != Lifecycle::Clean || c.nvals() != 0 || !a.is_bitmap_or_full() {
        return Ok(false);
    }
    let ctl = c.control.sparsity_control.normalized();
    if !ctl.allows(a.sparsity()) {
        tracing::debug!(sparsity = ?a.sparsity(), "dense assign punted, format not allowed in C");
        return Ok(false);
    }
    c.replace_content(a.clone());
    Ok(true)
}

/// `C = scalar` or `C = accum(C, scalar)` for a full C; false if the case
/// does not apply
fn assign_scalar_into_full<T: Scalar>(
    c: &mut Matrix<T>,
    accum: Option<&BinaryOp<T>>,
    value: T,
    ctx: &Context,
) -> Result<bool> {
    let Some(n) = c.dense_extent() else {
        return Ok(false);
    };
    let ctl = c.control.sparsity_control.normalized();
    match accum {
        None if ctl.allows(Sparsity::Full) => {
            let (vlen, vdim, by_col) = (c.vlen, c.vdim, c.by_col);
            c.replace_content(Matrix::from_full(vlen, vdim, by_col, vec![value], true));
            Ok(true)
        }
        Some(op) if c.is_full() && c.lifecycle() == Lifecycle::Clean => {
            if let Some(v) = c.iso_value() {
                c.x = vec![op.apply(v, value)];
                return Ok(true);
            }
            let nthreads = nthreads_for(n as f64, ctx.chunk, ctx.nthreads_max);
            let width = n.div_ceil(nthreads.max(1)).max(1);
            for_each_window(ctx, nthreads, &mut c.x, width, |_, xs| {
                for x in xs {
                    *x = op.apply(*x, value);
                }
            });
            Ok(true)
        }
        _ => {
            tracing::debug!(accum = accum.is_some(), "dense scalar assign punted");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SparsityControl;

    fn from(nrows: usize, ncols: usize, t: &[(usize, usize, i32)]) -> Matrix<i32> {
        let rows: Vec<_> = t.iter().map(|e| e.0).collect();
        let cols: Vec<_> = t.iter().map(|e| e.1).collect();
        let vals: Vec<_> = t.iter().map(|e| e.2).collect();
        Matrix::build(nrows, ncols, &rows, &cols, &vals, None).unwrap()
    }

    #[test]
    fn test_indices() {
        assert_eq!(Indices::All.len(5), 5);
        assert_eq!(Indices::Range { start: 2, end: 4 }.get(1), 3);
        assert_eq!(Indices::List(&[4, 1]).get(1), 1);
        assert!(Indices::Range { start: 0, end: 5 }.is_all(5));
        assert!(Indices::List(&[1, 1]).membership(3).is_err());
        assert!(matches!(
            Indices::List(&[3]).membership(3),
            Err(Error::IndexOutOfBounds { index: 3, size: 3 })
        ));
    }

    #[test]
    fn test_assign_submatrix_replaces_region() {
        let mut c = from(4, 4, &[(0, 0, 1), (1, 1, 2), (2, 2, 3), (3, 3, 4)]);
        let a = from(2, 2, &[(0, 1, 10)]);
        let ctx = Context::sequential();
        // region rows {1, 2}, cols {1, 2}
        assign(
            &mut c,
            None,
            None,
            &a,
            Indices::Range { start: 1, end: 3 },
            Indices::List(&[1, 2]),
            &Descriptor::new(),
            &ctx,
        )
        .unwrap();
        assert!(c.check().is_ok());
        assert_eq!(c.tuples().unwrap(), vec![(0, 0, 1), (1, 2, 10), (3, 3, 4)]);
    }

    #[test]
    fn test_assign_with_accum_and_mask() {
        let mut c = from(3, 3, &[(0, 0, 1), (2, 2, 3)]);
        let a = from(3, 3, &[(0, 0, 5), (1, 1, 6), (2, 2, 7)]);
        let m = from(3, 3, &[(0, 0, 1), (1, 1, 1)]);
        let ctx = Context::sequential();
        assign(&mut c, Some(&m), Some(&BinaryOp::Plus), &a, Indices::All, Indices::All, &Descriptor::new(), &ctx)
            .unwrap();
        assert_eq!(c.tuples().unwrap(), vec![(0, 0, 6), (1, 1, 6), (2, 2, 3)]);

        let mut c = from(3, 3, &[(0, 0, 1), (2, 2, 3)]);
        let desc = Descriptor::new().with_replace();
        assign(&mut c, Some(&m), None, &a, Indices::All, Indices::All, &desc, &ctx).unwrap();
        assert_eq!(c.tuples().unwrap(), vec![(0, 0, 5), (1, 1, 6)]);
    }

    #[test]
    fn test_assign_transposed() {
        let mut c = Matrix::<i32>::new(2, 3);
        let a = from(1, 2, &[(0, 0, 8), (0, 1, 9)]);
        let desc = Descriptor::new().with_transpose_first();
        assign(
            &mut c,
            None,
            None,
            &a,
            Indices::All,
            Indices::List(&[2]),
            &desc,
            &Context::sequential(),
        )
        .unwrap();
        assert_eq!(c.tuples().unwrap(), vec![(0, 2, 8), (1, 2, 9)]);
    }

    #[test]
    fn test_dense_into_empty() {
        let mut c = Matrix::<i32>::new_by_col(3, 2);
        let a = Matrix::new_full(3, 2, 4).unwrap();
        assign(&mut c, None, None, &a, Indices::All, Indices::All, &Descriptor::new(), &Context::sequential())
            .unwrap();
        assert_eq!(c.sparsity(), Sparsity::Full);
        assert!(c.by_col());
        assert_eq!(c.get(2, 1), Some(4));
    }

    #[test]
    fn test_scalar_into_full() {
        let mut c = Matrix::new_full(3, 3, 1i32).unwrap();
        c.expand_iso().unwrap();
        c.set_element(1, 1, 5).unwrap();
        let ctx = Context::sequential().with_nthreads_max(3).with_chunk(2);
        assign_scalar(&mut c, None, Some(&BinaryOp::Times), 2, Indices::All, Indices::All, &Descriptor::new(), &ctx)
            .unwrap();
        assert_eq!(c.get(1, 1), Some(10));
        assert_eq!(c.get(0, 2), Some(2));

        assign_scalar(&mut c, None, None, 7, Indices::All, Indices::All, &Descriptor::new(), &ctx).unwrap();
        assert!(c.is_iso());
        assert_eq!(c.nvals(), 9);
    }

    #[test]
    fn test_scalar_region_punts_to_general_path() {
        let mut c = from(3, 3, &[(0, 0, 1)]);
        c.set_sparsity_control(SparsityControl::SPARSE);
        let m = from(3, 3, &[(1, 1, 1), (2, 1, 1)]);
        assign_scalar(
            &mut c,
            Some(&m),
            None,
            9,
            Indices::List(&[1, 2]),
            Indices::All,
            &Descriptor::new(),
            &Context::sequential(),
        )
        .unwrap();
        assert_eq!(c.sparsity(), Sparsity::Sparse);
        assert_eq!(c.tuples().unwrap(), vec![(0, 0, 1), (1, 1, 9), (2, 1, 9)]);
    }
}
