//! Forward cursor over the entries of one vector

use crate::matrix::Matrix;
use crate::ops::Scalar;

/// Walks the present entries of a vector range in ascending index order
///
/// Sparse ranges walk the index array; bitmap and full ranges walk the
/// dense extent, skipping absent positions.
pub(crate) enum Cursor<'a> {
    Sparse {
        ind: &'a [usize],
        p: usize,
        pend: usize,
    },
    Dense {
        bitmap: Option<&'a [u8]>,
        base: usize,
        i: usize,
        iend: usize,
    },
    Empty,
}

impl<'a> Cursor<'a> {
    /// Cursor over entries `[pstart, pend)` of `m`, covering indices `[istart, iend)`
    ///
    /// For a sparse matrix the index range is implied by the entries; for a
    /// dense one the entries are implied by the index range.
    pub(crate) fn new<T: Scalar>(
        m: &'a Matrix<T>,
        k: Option<usize>,
        (pstart, pend): (usize, usize),
        istart: usize,
        iend: usize,
    ) -> Self {
        if k.is_none() {
            return Cursor::Empty;
        }
        match m.indices() {
            Some(ind) => Cursor::Sparse {
                ind,
                p: pstart,
                pend,
            },
            None => {
                let mut c = Cursor::Dense {
                    bitmap: m.bitmap(),
                    base: pstart - istart,
                    i: istart,
                    iend,
                };
                c.skip_absent();
                c
            }
        }
    }

    /// Cursor over the whole of stored vector `k`
    pub(crate) fn whole<T: Scalar>(m: &'a Matrix<T>, k: Option<usize>) -> Self {
        match k {
            Some(k) => Cursor::new(m, Some(k), m.vector_range(k), 0, m.vlen),
            None => Cursor::Empty,
        }
    }

    fn skip_absent(&mut self) {
        if let Cursor::Dense {
            bitmap: Some(b),
            base,
            i,
            iend,
        } = self
        {
            while *i < *iend && b[*base + *i] == 0 {
                *i += 1;
            }
        }
    }

    /// Index of the current entry
    #[inline]
    pub(crate) fn peek(&self) -> Option<usize> {
        match self {
            Cursor::Sparse { ind, p, pend } => (*p < *pend).then(|| ind[*p]),
            Cursor::Dense { i, iend, .. } => (*i < *iend).then_some(*i),
            Cursor::Empty => None,
        }
    }

    /// Position of the current entry in the value array
    #[inline]
    pub(crate) fn pos(&self) -> usize {
        match self {
            Cursor::Sparse { p, .. } => *p,
            Cursor::Dense { base, i, .. } => *base + *i,
            Cursor::Empty => 0,
        }
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        match self {
            Cursor::Sparse { p, .. } => *p += 1,
            Cursor::Dense { i, .. } => *i += 1,
            Cursor::Empty => return,
        }
        self.skip_absent();
    }

    /// Moves linearly to the first entry with index >= `target`
    pub(crate) fn advance_to(&mut self, target: usize) {
        match self {
            Cursor::Sparse { ind, p, pend } => {
                while *p < *pend && ind[*p] < target {
                    *p += 1;
                }
            }
            Cursor::Dense { i, iend, .. } => {
                *i = target.max(*i).min(*iend);
                self.skip_absent();
            }
            Cursor::Empty => {}
        }
    }

    /// Binary-searches for the first entry with index >= `target`
    pub(crate) fn seek(&mut self, target: usize) {
        match self {
            Cursor::Sparse { ind, p, pend } => {
                *p += ind[*p..*pend].partition_point(|&i| i < target);
            }
            _ => self.advance_to(target),
        }
    }

    /// Number of positions left to visit
    pub(crate) fn remaining(&self) -> usize {
        match self {
            Cursor::Sparse { p, pend, .. } => pend - p,
            Cursor::Dense { i, iend, .. } => iend - i,
            Cursor::Empty => 0,
        }
    }

    pub(crate) fn is_sparse(&self) -> bool {
        matches!(self, Cursor::Sparse { .. })
    }
}
