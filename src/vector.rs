//! Column vectors
//!
//! A [`Vector`] is an n-by-1 matrix stored by column, so every matrix
//! routine applies to it unchanged. `mxv` and `vxm` go through the same
//! multiply dispatcher as `mxm`.

use crate::error::{Error, Result};
use crate::matrix::{Context, Descriptor, Matrix, Sparsity};
use crate::mxm::mxm;
use crate::ops::{BinaryOp, Scalar, Semiring};

/// A sparse vector of length `size`
#[derive(Debug, Clone)]
pub struct Vector<T: Scalar> {
    m: Matrix<T>,
}

impl<T: Scalar> Vector<T> {
    /// An empty vector of length `n`
    pub fn new(n: usize) -> Self {
        Self {
            m: Matrix::new_by_col(n, 1),
        }
    }

    /// Builds a vector from (index, value) pairs; duplicates combine with `dup`
    pub fn build(n: usize, indices: &[usize], values: &[T], dup: Option<&BinaryOp<T>>) -> Result<Self> {
        let cols = vec![0; indices.len()];
        Ok(Self {
            m: Matrix::build_by_col(n, 1, indices, &cols, values, dup)?,
        })
    }

    /// Wraps an n-by-1 matrix
    pub fn from_matrix(mut m: Matrix<T>) -> Result<Self> {
        if m.ncols() != 1 {
            return Err(Error::dimension_mismatch(
                "Vector::from_matrix",
                format!("expected one column, got {}", m.ncols()),
            ));
        }
        m.set_orientation(true)?;
        Ok(Self { m })
    }

    pub fn into_matrix(self) -> Matrix<T> {
        self.m
    }

    pub fn as_matrix(&self) -> &Matrix<T> {
        &self.m
    }

    pub fn size(&self) -> usize {
        self.m.nrows()
    }

    pub fn nvals(&self) -> usize {
        self.m.nvals()
    }

    pub fn sparsity(&self) -> Sparsity {
        self.m.sparsity()
    }

    pub fn get(&self, i: usize) -> Option<T> {
        self.m.get(i, 0)
    }

    pub fn set_element(&mut self, i: usize, value: T) -> Result<()> {
        self.m.set_element(i, 0, value)
    }

    pub fn remove_element(&mut self, i: usize) -> Result<()> {
        self.m.remove_element(i, 0)
    }

    pub fn wait(&mut self) -> Result<()> {
        self.m.wait()
    }

    /// All entries as (index, value), in ascending index order
    pub fn tuples(&self) -> Result<Vec<(usize, T)>> {
        Ok(self.m.tuples()?.into_iter().map(|(i, _, x)| (i, x)).collect())
    }
}

/// Computes `w<mask> = accum(w, A*u)`
///
/// `desc.transpose_first` applies to A; `transpose_second` is ignored.
#[allow(clippy::too_many_arguments)]
pub fn mxv<T: Scalar>(
    w: &mut Vector<T>,
    mask: Option<&Vector<T>>,
    accum: Option<&BinaryOp<T>>,
    semiring: &Semiring<T>,
    a: &Matrix<T>,
    u: &Vector<T>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    let desc = Descriptor {
        transpose_second: false,
        ..*desc
    };
    mxm(&mut w.m, mask.map(|v| &v.m), accum, semiring, a, &u.m, &desc, ctx)
}

/// Computes `w'<mask'> = accum(w', u'*A)`
///
/// Evaluated as `w = A'*u` with the multiply's arguments swapped, so the
/// semiring still sees `mult(u(k), A(k,j))`. `desc.transpose_second`
/// applies to A; `transpose_first` is ignored.
#[allow(clippy::too_many_arguments)]
pub fn vxm<T: Scalar>(
    w: &mut Vector<T>,
    mask: Option<&Vector<T>>,
    accum: Option<&BinaryOp<T>>,
    semiring: &Semiring<T>,
    u: &Vector<T>,
    a: &Matrix<T>,
    desc: &Descriptor,
    ctx: &Context,
) -> Result<()> {
    let desc = Descriptor {
        transpose_first: !desc.transpose_second,
        transpose_second: false,
        flipxy: !desc.flipxy,
        ..*desc
    };
    mxm(&mut w.m, mask.map(|v| &v.m), accum, semiring, a, &u.m, &desc, ctx)
}
