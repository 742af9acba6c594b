//! Reference implementations for correctness testing
//!
//! These compute the same results as the optimized kernels with the
//! simplest possible algorithm: a hash map per output row. They are not
//! meant to be fast, only obviously correct.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::matrix::Matrix;
use crate::ops::{BinaryOp, Scalar, Semiring};

/// A matrix held as a map from (row, col) to value
#[derive(Debug, Clone, PartialEq)]
pub struct DenseModel<T> {
    pub nrows: usize,
    pub ncols: usize,
    pub entries: HashMap<(usize, usize), T>,
}

impl<T: Scalar> DenseModel<T> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            entries: HashMap::new(),
        }
    }

    /// Snapshot of the entries of a matrix, pending and zombies resolved
    pub fn from_matrix(m: &Matrix<T>) -> Result<Self> {
        let entries = m
            .tuples()?
            .into_iter()
            .map(|(row, col, v)| ((row, col), v))
            .collect();
        Ok(Self {
            nrows: m.nrows(),
            ncols: m.ncols(),
            entries,
        })
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        self.entries.get(&(row, col)).copied()
    }

    pub fn nvals(&self) -> usize {
        self.entries.len()
    }

    /// Entries sorted by row, then column
    pub fn tuples(&self) -> Vec<(usize, usize, T)> {
        let mut out: Vec<_> = self.entries.iter().map(|(&(r, c), &v)| (r, c, v)).collect();
        out.sort_unstable_by_key(|&(r, c, _)| (r, c));
        out
    }

    pub fn transpose(&self) -> Self {
        Self {
            nrows: self.ncols,
            ncols: self.nrows,
            entries: self.entries.iter().map(|(&(r, c), &v)| ((c, r), v)).collect(),
        }
    }

    /// The mask test at (row, col)
    pub fn mask_allows(mask: Option<&DenseModel<T>>, row: usize, col: usize, complement: bool, structural: bool) -> bool {
        let hit = match mask {
            Some(m) => m.get(row, col).map_or(false, |v| structural || v.as_bool()),
            None => false,
        };
        match mask {
            Some(_) => hit != complement,
            None => !complement,
        }
    }

    /// `C<M> = accum(C, T)` with the replace option
    ///
    /// `self` is C. Inside the mask the result is T, or accum(C, T) where both
    /// are present; outside it C is kept unless `replace` is set.
    pub fn masked_write(
        &self,
        t: &DenseModel<T>,
        mask: Option<&DenseModel<T>>,
        complement: bool,
        structural: bool,
        accum: Option<&BinaryOp<T>>,
        replace: bool,
    ) -> DenseModel<T> {
        let mut out = DenseModel::new(self.nrows, self.ncols);
        let mut keys: Vec<(usize, usize)> = self.entries.keys().chain(t.entries.keys()).copied().collect();
        keys.sort_unstable();
        keys.dedup();
        for (row, col) in keys {
            let c = self.get(row, col);
            let z = match (accum, c, t.get(row, col)) {
                (Some(op), Some(c), Some(t)) => Some(op.apply(c, t)),
                (Some(_), c, None) => c,
                (_, _, t) => t,
            };
            let value = if Self::mask_allows(mask, row, col, complement, structural) {
                z
            } else if replace {
                None
            } else {
                c
            };
            if let Some(v) = value {
                out.entries.insert((row, col), v);
            }
        }
        out
    }
}

/// `A * B` over a semiring, sums taken in ascending k
pub fn reference_mxm<T: Scalar>(a: &Matrix<T>, b: &Matrix<T>, semiring: &Semiring<T>) -> Result<DenseModel<T>> {
    if a.ncols() != b.nrows() {
        return Err(Error::dimension_mismatch(
            "reference_mxm",
            format!("A is {}x{}, B is {}x{}", a.nrows(), a.ncols(), b.nrows(), b.ncols()),
        ));
    }
    let mut b_rows: HashMap<usize, Vec<(usize, T)>> = HashMap::new();
    for (k, j, v) in b.tuples()? {
        b_rows.entry(k).or_default().push((j, v));
    }

    let add = semiring.add().op();
    let mult = semiring.mult();
    let mut out = DenseModel::new(a.nrows(), b.ncols());
    for (i, k, a_ik) in a.tuples()? {
        let Some(row) = b_rows.get(&k) else { continue };
        for &(j, b_kj) in row {
            let t = mult.apply(a_ik, b_kj);
            out.entries
                .entry((i, j))
                .and_modify(|c| *c = add.apply(*c, t))
                .or_insert(t);
        }
    }
    Ok(out)
}

/// Element-wise union (`union` true) or intersection of A and B
///
/// In a union, an entry present in only one operand is copied unchanged.
pub fn reference_ewise<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    op: &BinaryOp<T>,
    union: bool,
) -> Result<DenseModel<T>> {
    if a.nrows() != b.nrows() || a.ncols() != b.ncols() {
        return Err(Error::dimension_mismatch(
            "reference_ewise",
            format!("A is {}x{}, B is {}x{}", a.nrows(), a.ncols(), b.nrows(), b.ncols()),
        ));
    }
    let da = DenseModel::from_matrix(a)?;
    let db = DenseModel::from_matrix(b)?;
    let mut out = DenseModel::new(a.nrows(), a.ncols());
    for (&key, &x) in &da.entries {
        match db.entries.get(&key) {
            Some(&y) => {
                out.entries.insert(key, op.apply(x, y));
            }
            None if union => {
                out.entries.insert(key, x);
            }
            None => {}
        }
    }
    if union {
        for (&key, &y) in &db.entries {
            out.entries.entry(key).or_insert(y);
        }
    }
    Ok(out)
}
