//! Building matrices from tuples

use crate::accumulator::SortAccumulator;
use crate::error::{Error, Result};
use crate::matrix::{Context, Matrix};
use crate::ops::{BinaryOp, Scalar};
use crate::utils::{try_vec, try_with_capacity};

impl<T: Scalar> Matrix<T> {
    /// Builds an `nrows`-by-`ncols` matrix stored by row from (row, col, value) tuples
    ///
    /// Duplicate positions are combined with `dup` in the order given; with
    /// no `dup` operator a duplicate is an error.
    ///
    /// # Example
    ///
    /// ```
    /// use gbsparse::{BinaryOp, Matrix};
    ///
    /// let m = Matrix::build(2, 2, &[0, 1, 1], &[0, 1, 1], &[1, 2, 3], Some(&BinaryOp::Plus)).unwrap();
    /// assert_eq!(m.get(1, 1), Some(5));
    /// ```
    pub fn build(
        nrows: usize,
        ncols: usize,
        rows: &[usize],
        cols: &[usize],
        values: &[T],
        dup: Option<&BinaryOp<T>>,
    ) -> Result<Self> {
        Self::build_oriented(nrows, ncols, false, rows, cols, values, dup)
    }

    /// Like [`Matrix::build`], for a matrix stored by column
    pub fn build_by_col(
        nrows: usize,
        ncols: usize,
        rows: &[usize],
        cols: &[usize],
        values: &[T],
        dup: Option<&BinaryOp<T>>,
    ) -> Result<Self> {
        Self::build_oriented(nrows, ncols, true, rows, cols, values, dup)
    }

    fn build_oriented(
        nrows: usize,
        ncols: usize,
        by_col: bool,
        rows: &[usize],
        cols: &[usize],
        values: &[T],
        dup: Option<&BinaryOp<T>>,
    ) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != values.len() {
            return Err(Error::invalid_value(format!(
                "tuple arrays differ in length: {} rows, {} cols, {} values",
                rows.len(),
                cols.len(),
                values.len()
            )));
        }
        let (vlen, vdim) = if by_col { (nrows, ncols) } else { (ncols, nrows) };

        let mut acc = SortAccumulator::new(rows.len());
        for ((&row, &col), &v) in rows.iter().zip(cols).zip(values) {
            if row >= nrows {
                return Err(Error::IndexOutOfBounds { index: row, size: nrows });
            }
            if col >= ncols {
                return Err(Error::IndexOutOfBounds { index: col, size: ncols });
            }
            let key = if by_col { (col, row) } else { (row, col) };
            acc.push(key, v);
        }
        let (keys, vals) = match dup {
            Some(op) => acc.extract_with(|older, newer| op.apply(older, newer)),
            None => acc.extract_unique()?,
        };

        let mut m = Self::from_sorted_keys(vlen, vdim, by_col, &keys, vals)?;
        m.conform_clean(&Context::sequential())?;
        Ok(m)
    }

    /// Sparse matrix from unique (vector, index) keys in ascending order
    ///
    /// The result is hypersparse when fewer than half of the vectors are
    /// used, and is not conformed.
    pub(crate) fn from_sorted_keys(
        vlen: usize,
        vdim: usize,
        by_col: bool,
        keys: &[(usize, usize)],
        values: Vec<T>,
    ) -> Result<Self> {
        debug_assert!(keys.windows(2).all(|w| w[0] < w[1]));
        let mut ci = try_with_capacity(keys.len())?;
        ci.extend(keys.iter().map(|&(_, i)| i));

        let mut h: Vec<usize> = Vec::new();
        let mut hp = vec![0usize];
        for (q, &(j, _)) in keys.iter().enumerate() {
            if h.last() != Some(&j) {
                if !h.is_empty() {
                    hp.push(q);
                }
                h.push(j);
            }
        }
        if !h.is_empty() {
            hp.push(keys.len());
        }

        if h.len() * 2 < vdim {
            return Ok(Self::from_sparse(vlen, vdim, by_col, hp, Some(h), ci, values, false));
        }
        let mut p = try_vec(vdim + 1, 0usize)?;
        for &(j, _) in keys {
            p[j + 1] += 1;
        }
        for k in 0..vdim {
            p[k + 1] += p[k];
        }
        Ok(Self::from_sparse(vlen, vdim, by_col, p, None, ci, values, false))
    }
}
