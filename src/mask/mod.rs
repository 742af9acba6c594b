//! Masked write engine
//!
//! Every write `C<M> = ...` is controlled by three flags: whether a mask is
//! present, whether it is complemented, and whether it is structural (only
//! the presence of an entry counts) or valued (the entry must also be
//! nonzero). An entry may be written at (i, j) only if the mask allows it:
//!
//! ```text
//! allows(i, j) = (M(i, j) present and (structural or M(i, j) != 0)) XOR complement
//! ```
//!
//! With no mask, everything is allowed unless the (empty) mask is
//! complemented, in which case nothing is.

pub mod accum_mask;
pub mod assign;
pub mod mark;

use crate::matrix::{Descriptor, Matrix};
use crate::ops::Scalar;

pub use accum_mask::accum_mask;
pub use assign::{assign, assign_scalar, Indices};
pub use mark::MarkWorkspace;

/// A mask together with how it is interpreted
#[derive(Debug, Clone, Copy)]
pub struct MaskSpec<'a, T: Scalar> {
    pub matrix: Option<&'a Matrix<T>>,
    pub complement: bool,
    pub structural: bool,
}

impl<'a, T: Scalar> MaskSpec<'a, T> {
    pub fn new(matrix: Option<&'a Matrix<T>>, desc: &Descriptor) -> Self {
        Self {
            matrix,
            complement: desc.mask_complement,
            structural: desc.mask_structural,
        }
    }

    /// No mask, not complemented: every position is allowed
    pub fn is_absent(&self) -> bool {
        self.matrix.is_none() && !self.complement
    }

    /// Complemented empty mask: no position is allowed
    pub fn allows_nothing(&self) -> bool {
        self.matrix.is_none() && self.complement
    }
}

/// A mask in the orientation of the output, ready for kernels
#[derive(Debug, Clone, Copy)]
pub(crate) struct MaskView<'a, T: Scalar> {
    pub(crate) m: &'a Matrix<T>,
    pub(crate) complement: bool,
    pub(crate) structural: bool,
}

impl<'a, T: Scalar> MaskView<'a, T> {
    pub(crate) fn new(m: &'a Matrix<T>, complement: bool, structural: bool) -> Self {
        Self {
            m,
            complement,
            structural,
        }
    }

    /// True if the mask entry at position `p` is present and true
    #[inline]
    pub(crate) fn entry_true(&self, p: usize) -> bool {
        self.m.present_at(p) && (self.structural || self.m.value_at(p).as_bool())
    }

    /// Mask test at dense position `p`, for bitmap or full masks
    #[inline]
    pub(crate) fn allows_dense(&self, p: usize) -> bool {
        debug_assert!(self.m.is_bitmap_or_full());
        self.entry_true(p) != self.complement
    }

    /// Random-access mask test at (vector j, index i)
    #[cfg(test)]
    pub(crate) fn allows(&self, j: usize, i: usize) -> bool {
        let hit = if self.m.is_bitmap_or_full() {
            self.entry_true(j * self.m.vlen + i)
        } else {
            match self.m.find_vector(j) {
                Some(k) => {
                    let (pstart, pend) = self.m.vector_range(k);
                    let mi = &self.m.indices().unwrap_or(&[])[pstart..pend];
                    match mi.binary_search(&i) {
                        Ok(q) => self.entry_true(pstart + q),
                        Err(_) => false,
                    }
                }
                None => false,
            }
        };
        hit != self.complement
    }

    /// Calls `f` with each index whose mask entry in vector `j` is present
    /// and true, ignoring the complement flag
    pub(crate) fn for_each_true<F: FnMut(usize)>(&self, j: usize, mut f: F) {
        if let Some(k) = self.m.find_vector(j) {
            let (pstart, pend) = self.m.vector_range(k);
            for p in pstart..pend {
                if self.entry_true(p) {
                    f(self.m.index_at(p));
                }
            }
        }
    }

    /// Number of stored slots in mask vector `j`
    pub(crate) fn vector_len(&self, j: usize) -> usize {
        self.m.find_vector(j).map_or(0, |k| {
            let (pstart, pend) = self.m.vector_range(k);
            pend - pstart
        })
    }

    /// Cursor over vector `j` for ascending index queries starting at `istart`
    pub(crate) fn column(&self, j: usize, istart: usize) -> MaskColumn<'a, T> {
        if self.m.is_bitmap_or_full() {
            return MaskColumn::Dense {
                view: *self,
                base: j * self.m.vlen,
            };
        }
        match self.m.find_vector(j) {
            Some(k) => {
                let (pstart, pend) = self.m.vector_range(k);
                let mi = &self.m.indices().unwrap_or(&[])[pstart..pend];
                let start = pstart + mi.partition_point(|&i| i < istart);
                MaskColumn::Sparse {
                    view: *self,
                    p: start,
                    pend,
                }
            }
            // an absent mask vector is all false
            None => MaskColumn::Constant(self.complement),
        }
    }
}

/// Evaluates one mask vector for non-decreasing indices
pub(crate) enum MaskColumn<'a, T: Scalar> {
    Constant(bool),
    Dense {
        view: MaskView<'a, T>,
        base: usize,
    },
    Sparse {
        view: MaskView<'a, T>,
        p: usize,
        pend: usize,
    },
}

impl<'a, T: Scalar> MaskColumn<'a, T> {
    /// Cursor for an optional mask; without one every index is allowed
    pub(crate) fn for_vector(mask: Option<&MaskView<'a, T>>, j: usize, istart: usize) -> Self {
        match mask {
            Some(view) => view.column(j, istart),
            None => MaskColumn::Constant(true),
        }
    }

    /// Mask test for index `i`; queries must not decrease
    #[inline]
    pub(crate) fn allows(&mut self, i: usize) -> bool {
        match self {
            MaskColumn::Constant(v) => *v,
            MaskColumn::Dense { view, base } => view.allows_dense(*base + i),
            MaskColumn::Sparse { view, p, pend } => {
                let mi = view.m.indices().unwrap_or(&[]);
                while *p < *pend && mi[*p] < i {
                    *p += 1;
                }
                let hit = *p < *pend && mi[*p] == i && view.entry_true(*p);
                hit != view.complement
            }
        }
    }
}
