//! Fill-reducing ordering boundary
//!
//! Orderings are computed by an external provider that sees only the
//! compressed-column pattern of a square matrix. The permutation it returns
//! is validated here before anything uses it.

use crate::error::{Error, Result};
use crate::matrix::{Context, Matrix, Sparsity};
use crate::ops::Scalar;
use crate::utils::{try_vec, try_with_capacity};

/// Outcome of checking a pattern, or the failure reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Ok,
    /// Valid, but some column has unsorted or duplicate row indices
    OkButJumbled,
    Invalid,
    OutOfMemory,
}

/// The compressed-column pattern of an `nrows`-by-`ncols` matrix
#[derive(Debug, Clone, Copy)]
pub struct Pattern<'a> {
    pub nrows: usize,
    pub ncols: usize,
    /// Column pointers, `ncols + 1` of them
    pub p: &'a [usize],
    /// Row indices
    pub i: &'a [usize],
}

/// Computes a permutation of `0..n` for the pattern of an n-by-n matrix
pub trait OrderingProvider {
    fn order(&self, pattern: &Pattern<'_>) -> std::result::Result<Vec<usize>, OrderStatus>;
}

/// Checks that `pattern` can be handed to an ordering provider
pub fn check_pattern(pattern: &Pattern<'_>) -> OrderStatus {
    let Pattern { nrows, ncols, p, i } = *pattern;
    if p.len() != ncols + 1 || p[0] != 0 {
        return OrderStatus::Invalid;
    }
    let nnz = p[ncols];
    if i.len() < nnz {
        return OrderStatus::Invalid;
    }
    let mut status = OrderStatus::Ok;
    for j in 0..ncols {
        let (ps, pe) = (p[j], p[j + 1]);
        if ps > pe {
            return OrderStatus::Invalid;
        }
        let mut last = None;
        for &row in &i[ps..pe] {
            if row >= nrows {
                return OrderStatus::Invalid;
            }
            if last.is_some_and(|prev| row <= prev) {
                status = OrderStatus::OkButJumbled;
            }
            last = Some(row);
        }
    }
    status
}

/// Checks that `perm` holds each of `0..n` exactly once
pub fn validate_permutation(perm: &[usize], n: usize) -> Result<()> {
    if perm.len() != n {
        return Err(Error::invalid_value(format!(
            "permutation has length {}, expected {n}",
            perm.len()
        )));
    }
    let mut seen = try_vec(n, false)?;
    for &k in perm {
        if k >= n {
            return Err(Error::IndexOutOfBounds { index: k, size: n });
        }
        if seen[k] {
            return Err(Error::invalid_value(format!("index {k} appears twice in the permutation")));
        }
        seen[k] = true;
    }
    Ok(())
}

fn status_error(status: OrderStatus) -> Error {
    match status {
        OrderStatus::OutOfMemory => Error::OutOfMemory { size: 0 },
        _ => Error::invalid_object(format!("ordering failed with status {status:?}")),
    }
}

/// Asks `provider` for an ordering of the square matrix `m`
///
/// The provider is given the pattern of `m` stored by column. Its result is
/// checked with [`validate_permutation`] before it is returned.
pub fn order_with<T: Scalar, O: OrderingProvider + ?Sized>(m: &Matrix<T>, provider: &O) -> Result<Vec<usize>> {
    let n = m.nrows();
    if m.ncols() != n {
        return Err(Error::dimension_mismatch(
            "order_with",
            format!("matrix is {}x{}, expected square", n, m.ncols()),
        ));
    }
    let mut a = m.in_orientation(true, &Context::default())?.into_owned();
    a.convert_to(Sparsity::Sparse)?;
    let (p, i) = match (a.ptr(), a.indices()) {
        (Some(p), Some(i)) => (p, i),
        _ => return Err(Error::invalid_object("order_with: expected a sparse matrix")),
    };
    let pattern = Pattern { nrows: n, ncols: n, p, i };
    match check_pattern(&pattern) {
        OrderStatus::Ok | OrderStatus::OkButJumbled => {}
        status => return Err(status_error(status)),
    }
    let perm = provider.order(&pattern).map_err(status_error)?;
    validate_permutation(&perm, n)?;
    tracing::debug!(n, nnz = p[n], "ordering computed");
    Ok(perm)
}

impl<T: Scalar> Matrix<T> {
    /// Returns `C = A(perm, perm)`, so `C(i,j) = A(perm[i], perm[j])`
    ///
    /// The result keeps the orientation and iso property of `self`.
    pub fn permute_symmetric(&self, perm: &[usize]) -> Result<Matrix<T>> {
        self.ensure_valid()?;
        let n = self.vlen;
        if self.vdim != n {
            return Err(Error::dimension_mismatch(
                "permute_symmetric",
                format!("matrix is {}x{}, expected square", self.nrows(), self.ncols()),
            ));
        }
        validate_permutation(perm, n)?;

        let mut a = self.finalized(&Context::default())?.into_owned();
        a.convert_to(Sparsity::Sparse)?;
        let (ap, ai) = match (a.ptr(), a.indices()) {
            (Some(p), Some(i)) => (p, i),
            _ => return Err(Error::invalid_object("permute_symmetric: expected a sparse matrix")),
        };

        let mut inv = try_vec(n, 0usize)?;
        for (k, &old) in perm.iter().enumerate() {
            inv[old] = k;
        }

        let nnz = ap[n];
        let mut cp = try_with_capacity(n + 1)?;
        let mut ci = try_with_capacity(nnz)?;
        let mut cx = try_with_capacity(if a.iso { 1 } else { nnz })?;
        let mut column: Vec<(usize, T)> = Vec::new();
        cp.push(0);
        for &old in perm {
            column.clear();
            for q in ap[old]..ap[old + 1] {
                column.push((inv[ai[q]], a.value_at(q)));
            }
            column.sort_unstable_by_key(|&(i, _)| i);
            for &(i, x) in &column {
                ci.push(i);
                if !a.iso {
                    cx.push(x);
                }
            }
            cp.push(ci.len());
        }
        if a.iso {
            cx.extend(a.x.first().copied());
        }

        let mut c = Matrix::from_sparse(n, n, a.by_col, cp, None, ci, cx, a.iso);
        c.control = self.control;
        c.conform()?;
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Orders columns by ascending degree
    struct MinDegree;

    impl OrderingProvider for MinDegree {
        fn order(&self, pattern: &Pattern<'_>) -> std::result::Result<Vec<usize>, OrderStatus> {
            let mut perm: Vec<usize> = (0..pattern.ncols).collect();
            perm.sort_by_key(|&j| (pattern.p[j + 1] - pattern.p[j], j));
            Ok(perm)
        }
    }

    struct Broken;

    impl OrderingProvider for Broken {
        fn order(&self, pattern: &Pattern<'_>) -> std::result::Result<Vec<usize>, OrderStatus> {
            Ok(vec![0; pattern.ncols])
        }
    }

    #[test]
    fn test_check_pattern() {
        let p = [0, 2, 3];
        assert_eq!(check_pattern(&Pattern { nrows: 2, ncols: 2, p: &p, i: &[0, 1, 1] }), OrderStatus::Ok);
        assert_eq!(
            check_pattern(&Pattern { nrows: 2, ncols: 2, p: &p, i: &[1, 0, 1] }),
            OrderStatus::OkButJumbled
        );
        assert_eq!(
            check_pattern(&Pattern { nrows: 2, ncols: 2, p: &p, i: &[1, 1, 0] }),
            OrderStatus::OkButJumbled
        );
        assert_eq!(check_pattern(&Pattern { nrows: 2, ncols: 2, p: &p, i: &[0, 2, 1] }), OrderStatus::Invalid);
        assert_eq!(
            check_pattern(&Pattern { nrows: 2, ncols: 2, p: &[0, 3, 2], i: &[0, 1, 1] }),
            OrderStatus::Invalid
        );
    }

    #[test]
    fn test_validate_permutation() {
        assert!(validate_permutation(&[2, 0, 1], 3).is_ok());
        assert!(validate_permutation(&[0, 1], 3).is_err());
        assert!(validate_permutation(&[0, 0, 1], 3).is_err());
        assert!(matches!(
            validate_permutation(&[0, 3, 1], 3),
            Err(Error::IndexOutOfBounds { index: 3, size: 3 })
        ));
    }

    #[test]
    fn test_order_and_permute() {
        // column 0 holds three entries, the others one or two
        let rows = [0, 1, 2, 1, 2];
        let cols = [0, 0, 0, 1, 2];
        let a = Matrix::build(3, 3, &rows, &cols, &[1i32, 2, 3, 4, 5], None).unwrap();
        let perm = order_with(&a, &MinDegree).unwrap();
        assert_eq!(perm, vec![1, 2, 0]);

        let c = a.permute_symmetric(&perm).unwrap();
        assert!(!c.by_col());
        for (i, j, v) in c.tuples().unwrap() {
            assert_eq!(a.get(perm[i], perm[j]), Some(v));
        }
        assert_eq!(c.nvals(), a.nvals());
    }

    #[test]
    fn test_permute_iso_by_col() {
        let a = Matrix::<u8>::identity(4).unwrap();
        let mut b = a.clone();
        b.set_orientation(true).unwrap();
        let c = b.permute_symmetric(&[3, 1, 0, 2]).unwrap();
        assert!(c.is_iso());
        assert!(c.by_col());
        assert_eq!(c.tuples().unwrap(), a.tuples().unwrap());
    }

    #[test]
    fn test_rejects_bad_provider_and_shape() {
        let a = Matrix::<f64>::identity(3).unwrap();
        assert!(order_with(&a, &Broken).is_err());
        let rect = Matrix::<f64>::new(2, 3);
        assert!(order_with(&rect, &MinDegree).is_err());
        assert!(rect.permute_symmetric(&[0, 1]).is_err());
    }
}
