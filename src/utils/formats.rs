//! Conversions between [`Matrix`] and the `sprs` and `ndarray` containers

use ndarray::Array2;
use sprs::CsMat;

use crate::error::{Error, Result};
use crate::matrix::{Context, Matrix, Sparsity, Structure};
use crate::ops::Scalar;

/// Copies a matrix into a `sprs` compressed matrix
///
/// A matrix stored by column becomes CSC, one stored by row becomes CSR.
/// Deferred work is finished on a copy first, so `m` is left untouched.
pub fn to_sprs<T: Scalar>(m: &Matrix<T>) -> Result<CsMat<T>> {
    let mut c = m.finalized(&Context::default())?.into_owned();
    c.convert_to(Sparsity::Sparse)?;
    c.expand_iso()?;
    let shape = (m.nrows(), m.ncols());
    match c.structure {
        Structure::Sparse { p, i } => {
            if c.by_col {
                Ok(CsMat::new_csc(shape, p, i, c.x))
            } else {
                Ok(CsMat::new(shape, p, i, c.x))
            }
        }
        _ => Err(Error::invalid_object("to_sprs: conversion to sparse failed")),
    }
}

/// Builds a matrix from a `sprs` compressed matrix
///
/// CSC input gives a matrix stored by column. Explicit zeros stay entries.
/// Unsorted indices are accepted; duplicates are an `InvalidObject` error.
pub fn from_sprs<T: Scalar>(s: CsMat<T>) -> Result<Matrix<T>> {
    let (nrows, ncols) = s.shape();
    let by_col = s.is_csc();
    let (vlen, vdim) = if by_col { (nrows, ncols) } else { (ncols, nrows) };
    let (p, i, x) = s.into_raw_storage();
    let base = p.first().copied().unwrap_or(0);
    let p: Vec<usize> = p.into_iter().map(|q| q - base).collect();
    let nnz = p.last().copied().unwrap_or(0);
    let i = i[base..base + nnz].to_vec();
    let x = x[base..base + nnz].to_vec();
    let mut m = Matrix::from_sparse(vlen, vdim, by_col, p, None, i, x, false);
    // sprs products may leave indices unsorted
    m.jumbled = true;
    m.wait()?;
    m.check()?;
    Ok(m)
}

/// Copies a matrix into a dense array, writing `fill` where no entry is held
pub fn to_dense<T: Scalar>(m: &Matrix<T>, fill: T) -> Result<Array2<T>> {
    let mut out = Array2::from_elem((m.nrows(), m.ncols()), fill);
    for (i, j, v) in m.tuples()? {
        out[[i, j]] = v;
    }
    Ok(out)
}

/// Builds a full matrix, stored by row, holding every element of `a`
pub fn from_dense<T: Scalar>(a: &Array2<T>) -> Matrix<T> {
    let (nrows, ncols) = a.dim();
    let x: Vec<T> = a.iter().copied().collect();
    Matrix::from_full(ncols, nrows, false, x, false)
}
