//! Phase 0: which vectors the output has
//!
//! Decides the output vector list `ch` without looking at any index or
//! value, and maps each output vector to the stored vector of each operand
//! that contributes to it.

use crate::error::Result;
use crate::ewise::MergeKind;
use crate::mask::MaskView;
use crate::matrix::Matrix;
use crate::ops::Scalar;
use crate::utils::try_with_capacity;

/// Output vector list and the operand vectors feeding each output vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase0 {
    /// Vector id of each output vector
    pub(crate) ch: Vec<usize>,
    /// True if the output is hypersparse with hyperlist `ch`
    pub(crate) hyper: bool,
    /// Stored vector of A for each output vector
    pub(crate) to_a: Vec<Option<usize>>,
    /// Stored vector of B for each output vector
    pub(crate) to_b: Vec<Option<usize>>,
}

impl Phase0 {
    pub fn nvec(&self) -> usize {
        self.ch.len()
    }
}

/// Sorted union of two ascending lists
fn merge_union(x: &[usize], y: &[usize]) -> Result<Vec<usize>> {
    let mut out = try_with_capacity(x.len() + y.len())?;
    let (mut p, mut q) = (0, 0);
    while p < x.len() && q < y.len() {
        let (u, v) = (x[p], y[q]);
        out.push(u.min(v));
        p += usize::from(u <= v);
        q += usize::from(v <= u);
    }
    out.extend_from_slice(&x[p..]);
    out.extend_from_slice(&y[q..]);
    Ok(out)
}

/// Sorted intersection of two ascending lists
fn merge_intersection(x: &[usize], y: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(x.len().min(y.len()));
    let (mut p, mut q) = (0, 0);
    while p < x.len() && q < y.len() {
        let (u, v) = (x[p], y[q]);
        if u == v {
            out.push(u);
        }
        p += usize::from(u <= v);
        q += usize::from(v <= u);
    }
    out
}

/// Computes the output vector list of a sparse-format merge of `a` and `b`
///
/// A union or masker output is hypersparse only if both operands are; an
/// intersection output is hypersparse if either operand is. A hypersparse
/// intersection or union under a plain (not complemented) hypersparse mask
/// keeps only the vectors the mask has.
pub(crate) fn phase0<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    mask: Option<&MaskView<'_, T>>,
    kind: MergeKind<'_, T>,
) -> Result<Phase0> {
    debug_assert_eq!(a.vdim, b.vdim);
    let vdim = a.vdim;
    let (ah, bh) = (a.hlist(), b.hlist());

    let hyper_list = match kind {
        MergeKind::Union(_) | MergeKind::Masker { .. } => match (ah, bh) {
            (Some(ah), Some(bh)) => Some(merge_union(ah, bh)?),
            _ => None,
        },
        MergeKind::Intersection(_) => match (ah, bh) {
            (Some(ah), Some(bh)) => Some(merge_intersection(ah, bh)),
            (Some(h), None) | (None, Some(h)) => Some(h.to_vec()),
            (None, None) => None,
        },
    };

    let (ch, hyper) = match hyper_list {
        Some(mut h) => {
            let restricting = !matches!(kind, MergeKind::Masker { .. });
            if let Some(view) = mask.filter(|v| restricting && !v.complement) {
                if let Some(mh) = view.m.hlist() {
                    h = merge_intersection(&h, mh);
                }
            }
            (h, true)
        }
        None => {
            let mut all = try_with_capacity(vdim)?;
            all.extend(0..vdim);
            (all, false)
        }
    };

    let to_a = ch.iter().map(|&j| a.find_vector(j)).collect();
    let to_b = ch.iter().map(|&j| b.find_vector(j)).collect();
    Ok(Phase0 { ch, hyper, to_a, to_b })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Sparsity, SparsityControl};
    use crate::ops::BinaryOp;

    fn hyper(cols: &[usize]) -> Matrix<i32> {
        let rows = vec![0; cols.len()];
        let vals = vec![1; cols.len()];
        let mut m = Matrix::build_by_col(2, 100, &rows, cols, &vals, None).unwrap();
        m.set_sparsity_control(SparsityControl::HYPERSPARSE);
        m.convert_to(Sparsity::Hypersparse).unwrap();
        m
    }

    #[test]
    fn test_list_merges() {
        assert_eq!(merge_union(&[1, 3, 5], &[2, 3, 9]).unwrap(), vec![1, 2, 3, 5, 9]);
        assert_eq!(merge_intersection(&[1, 3, 5, 9], &[2, 3, 9]), vec![3, 9]);
        assert_eq!(merge_union(&[], &[4]).unwrap(), vec![4]);
    }

    #[test]
    fn test_union_and_intersection_of_hyperlists() {
        let a = hyper(&[3, 10, 50]);
        let b = hyper(&[10, 70]);
        let plus = BinaryOp::Plus;

        let u = phase0(&a, &b, None, MergeKind::Union(&plus)).unwrap();
        assert!(u.hyper);
        assert_eq!(u.ch, vec![3, 10, 50, 70]);
        assert_eq!(u.to_a, vec![Some(0), Some(1), Some(2), None]);
        assert_eq!(u.to_b, vec![None, Some(0), None, Some(1)]);

        let i = phase0(&a, &b, None, MergeKind::Intersection(&plus)).unwrap();
        assert_eq!(i.ch, vec![10]);
        assert_eq!(i.to_a, vec![Some(1)]);
    }

    #[test]
    fn test_sparse_operand_gives_all_vectors() {
        let a = hyper(&[3]);
        let mut b = hyper(&[4]);
        b.set_sparsity_control(SparsityControl::SPARSE);
        b.convert_to(Sparsity::Sparse).unwrap();
        let u = phase0(&a, &b, None, MergeKind::Union(&BinaryOp::Plus)).unwrap();
        assert!(!u.hyper);
        assert_eq!(u.nvec(), 100);
        assert_eq!(u.to_a[3], Some(0));
        assert_eq!(u.to_b[4], Some(4));

        let i = phase0(&a, &b, None, MergeKind::Intersection(&BinaryOp::Plus)).unwrap();
        assert!(i.hyper);
        assert_eq!(i.ch, vec![3]);
    }

    #[test]
    fn test_mask_restricts_hyperlist() {
        let a = hyper(&[3, 10, 50]);
        let m = hyper(&[10]);
        let view = MaskView::new(&m, false, false);
        let i = phase0(&a, &a, Some(&view), MergeKind::Intersection(&BinaryOp::Times)).unwrap();
        assert_eq!(i.ch, vec![10]);

        let comp = MaskView::new(&m, true, false);
        let i = phase0(&a, &a, Some(&comp), MergeKind::Intersection(&BinaryOp::Times)).unwrap();
        assert_eq!(i.ch, vec![3, 10, 50]);
    }
}
