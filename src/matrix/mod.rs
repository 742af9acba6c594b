//! Matrix representation
//!
//! A matrix is a set of `vdim` vectors of length `vlen`. When `by_col` is
//! true the vectors are columns, otherwise rows. Storage takes one of four
//! formats, chosen at runtime:
//!
//! - **Hypersparse**: pointers `p`, non-empty vector list `h`, indices `i`
//! - **Sparse**: pointers `p` (one per vector) and indices `i`
//! - **Bitmap**: presence bytes `b` and values over the dense extent
//! - **Full**: values over the dense extent, every entry present
//!
//! Values live in `x`, which holds a single value when the matrix is iso.
//! Deleted entries of a sparse matrix may linger as zombies (index with the
//! top bit set) and insertions may wait as pending tuples until the matrix
//! is finalized.

pub mod builder;
pub mod check;
pub mod config;
pub mod conversion;
pub mod import_export;
pub mod iso;
pub mod pending;
pub mod reference;

use std::borrow::Cow;
use std::mem::size_of;

use crate::constants::{INDEX_32_LIMIT, ZOMBIE_BIT};
use crate::error::{Error, Result};
use crate::ops::Scalar;
use crate::utils::try_vec;

pub use config::{
    AxbMethod, Context, Descriptor, FormatControl, Sparsity, SparsityControl,
};
pub use import_export::{ImportHeader, ImportMode, IndexBuffer, MatrixBuffers};
pub use pending::Lifecycle;
pub use reference::{reference_ewise, reference_mxm, DenseModel};

use pending::Pending;

/// Marks index `i` as a zombie, or revives a zombie
#[inline]
pub(crate) fn flip_index(i: usize) -> usize {
    i ^ ZOMBIE_BIT
}

#[inline]
pub(crate) fn is_zombie(i: usize) -> bool {
    i & ZOMBIE_BIT != 0
}

/// The index of an entry whether or not it is a zombie
#[inline]
pub(crate) fn unflip_index(i: usize) -> usize {
    i & !ZOMBIE_BIT
}

/// Format-specific part of the storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Structure {
    Hypersparse {
        p: Vec<usize>,
        h: Vec<usize>,
        i: Vec<usize>,
    },
    Sparse {
        p: Vec<usize>,
        i: Vec<usize>,
    },
    Bitmap {
        b: Vec<u8>,
        nvals: usize,
    },
    Full,
}

/// Whether each index array fits in 32 bits
///
/// Chosen from the extent of a matrix when it is created, or kept from the
/// buffers of an import; export and memory accounting follow these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexWidths {
    pub p_is_32: bool,
    pub j_is_32: bool,
    pub i_is_32: bool,
}

impl IndexWidths {
    pub(crate) fn for_extent(vlen: usize, vdim: usize, nnz: usize) -> Self {
        Self {
            p_is_32: nnz < INDEX_32_LIMIT,
            j_is_32: vdim < INDEX_32_LIMIT,
            i_is_32: vlen < INDEX_32_LIMIT,
        }
    }
}

/// A sparse matrix over the element type `T`
#[derive(Debug, Clone)]
pub struct Matrix<T: Scalar> {
    pub(crate) vlen: usize,
    pub(crate) vdim: usize,
    pub(crate) by_col: bool,
    pub(crate) structure: Structure,
    pub(crate) x: Vec<T>,
    pub(crate) iso: bool,
    pub(crate) jumbled: bool,
    pub(crate) nzombies: usize,
    pub(crate) pending: Option<Pending<T>>,
    pub(crate) widths: IndexWidths,
    pub(crate) control: FormatControl,
    pub(crate) valid: bool,
}

impl<T: Scalar> Matrix<T> {
    //--------------------------------------------------------------------------
    // construction
    //--------------------------------------------------------------------------

    /// An empty hypersparse matrix with the given storage shape
    pub(crate) fn empty(vlen: usize, vdim: usize, by_col: bool) -> Self {
        Self {
            vlen,
            vdim,
            by_col,
            structure: Structure::Hypersparse {
                p: vec![0],
                h: Vec::new(),
                i: Vec::new(),
            },
            x: Vec::new(),
            iso: false,
            jumbled: false,
            nzombies: 0,
            pending: None,
            widths: IndexWidths::for_extent(vlen, vdim, 0),
            control: FormatControl::default(),
            valid: true,
        }
    }

    /// Creates an empty `nrows`-by-`ncols` matrix stored by row
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self::empty(ncols, nrows, false)
    }

    /// Creates an empty `nrows`-by-`ncols` matrix stored by column
    pub fn new_by_col(nrows: usize, ncols: usize) -> Self {
        Self::empty(nrows, ncols, true)
    }

    /// Creates a full matrix with every entry equal to `value`
    ///
    /// The result is iso, so only one value is stored.
    pub fn new_full(nrows: usize, ncols: usize, value: T) -> Result<Self> {
        if nrows.checked_mul(ncols).is_none() {
            return Err(Error::invalid_value(format!(
                "a full {nrows}-by-{ncols} matrix is too large"
            )));
        }
        Ok(Self::from_full(ncols, nrows, false, vec![value], true))
    }

    /// Creates the `n`-by-`n` identity matrix (iso, value one)
    pub fn identity(n: usize) -> Result<Self> {
        let mut p = try_vec(n + 1, 0usize)?;
        let mut i = try_vec(n, 0usize)?;
        for k in 0..n {
            p[k + 1] = k + 1;
            i[k] = k;
        }
        let mut m = Self::from_sparse(n, n, false, p, None, i, vec![T::one()], true);
        m.conform_clean(&Context::sequential())?;
        Ok(m)
    }

    /// Assembles a sparse or hypersparse matrix from its parts
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_sparse(
        vlen: usize,
        vdim: usize,
        by_col: bool,
        p: Vec<usize>,
        h: Option<Vec<usize>>,
        i: Vec<usize>,
        x: Vec<T>,
        iso: bool,
    ) -> Self {
        let nnz = p.last().copied().unwrap_or(0);
        let structure = match h {
            Some(h) => Structure::Hypersparse { p, h, i },
            None => Structure::Sparse { p, i },
        };
        Self {
            vlen,
            vdim,
            by_col,
            structure,
            x,
            iso,
            jumbled: false,
            nzombies: 0,
            pending: None,
            widths: IndexWidths::for_extent(vlen, vdim, nnz),
            control: FormatControl::default(),
            valid: true,
        }
    }

    pub(crate) fn from_bitmap(
        vlen: usize,
        vdim: usize,
        by_col: bool,
        b: Vec<u8>,
        x: Vec<T>,
        nvals: usize,
        iso: bool,
    ) -> Self {
        Self {
            vlen,
            vdim,
            by_col,
            structure: Structure::Bitmap { b, nvals },
            x,
            iso,
            jumbled: false,
            nzombies: 0,
            pending: None,
            widths: IndexWidths::for_extent(vlen, vdim, nvals),
            control: FormatControl::default(),
            valid: true,
        }
    }

    pub(crate) fn from_full(vlen: usize, vdim: usize, by_col: bool, x: Vec<T>, iso: bool) -> Self {
        Self {
            vlen,
            vdim,
            by_col,
            structure: Structure::Full,
            x,
            iso,
            jumbled: false,
            nzombies: 0,
            pending: None,
            widths: IndexWidths::for_extent(vlen, vdim, vlen.saturating_mul(vdim)),
            control: FormatControl::default(),
            valid: true,
        }
    }

    /// Replaces the content with `other`, keeping this matrix's format controls
    pub(crate) fn replace_content(&mut self, mut other: Matrix<T>) {
        debug_assert_eq!(self.vlen, other.vlen);
        debug_assert_eq!(self.vdim, other.vdim);
        other.control = self.control;
        *self = other;
    }

    /// Frees all content, leaving only the header
    pub(crate) fn invalidate(&mut self) {
        self.structure = Structure::Full;
        self.x = Vec::new();
        self.pending = None;
        self.nzombies = 0;
        self.jumbled = false;
        self.iso = false;
        self.valid = false;
    }

    //--------------------------------------------------------------------------
    // logical properties
    //--------------------------------------------------------------------------

    pub fn nrows(&self) -> usize {
        if self.by_col {
            self.vlen
        } else {
            self.vdim
        }
    }

    pub fn ncols(&self) -> usize {
        if self.by_col {
            self.vdim
        } else {
            self.vlen
        }
    }

    /// True if the vectors are columns
    pub fn by_col(&self) -> bool {
        self.by_col
    }

    pub fn sparsity(&self) -> Sparsity {
        match self.structure {
            Structure::Hypersparse { .. } => Sparsity::Hypersparse,
            Structure::Sparse { .. } => Sparsity::Sparse,
            Structure::Bitmap { .. } => Sparsity::Bitmap,
            Structure::Full => Sparsity::Full,
        }
    }

    pub fn is_iso(&self) -> bool {
        self.iso
    }

    pub fn is_jumbled(&self) -> bool {
        self.jumbled
    }

    pub fn nzombies(&self) -> usize {
        self.nzombies
    }

    pub fn npending(&self) -> usize {
        self.pending.as_ref().map_or(0, |pending| pending.len())
    }

    /// False once the content was freed after a failed allocation
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn format_control(&self) -> FormatControl {
        self.control
    }

    pub fn index_widths(&self) -> IndexWidths {
        self.widths
    }

    /// Restricts the formats this matrix may take from the next conform on
    pub fn set_sparsity_control(&mut self, control: SparsityControl) {
        self.control.sparsity_control = control.normalized();
    }

    pub fn set_hyper_switch(&mut self, hyper_switch: f64) {
        self.control.hyper_switch = hyper_switch;
    }

    pub fn set_bitmap_switch(&mut self, bitmap_switch: f64) {
        self.control.bitmap_switch = bitmap_switch;
    }

    /// Number of entries, counting pending insertions and not zombies
    pub fn nvals(&self) -> usize {
        if !self.valid {
            return 0;
        }
        let stored = match &self.structure {
            Structure::Hypersparse { p, .. } | Structure::Sparse { p, .. } => {
                p.last().copied().unwrap_or(0) - self.nzombies
            }
            Structure::Bitmap { nvals, .. } => *nvals,
            Structure::Full => self.vlen * self.vdim,
        };
        stored + self.pending.as_ref().map_or(0, |pending| pending.distinct_count())
    }

    //--------------------------------------------------------------------------
    // storage access
    //--------------------------------------------------------------------------

    /// Number of stored vectors
    #[inline]
    pub(crate) fn nvec(&self) -> usize {
        match &self.structure {
            Structure::Hypersparse { h, .. } => h.len(),
            _ => self.vdim,
        }
    }

    /// Vector id of the k-th stored vector
    #[inline]
    pub(crate) fn vector_id(&self, k: usize) -> usize {
        match &self.structure {
            Structure::Hypersparse { h, .. } => h[k],
            _ => k,
        }
    }

    /// Entry positions `[pstart, pend)` of the k-th stored vector
    #[inline]
    pub(crate) fn vector_range(&self, k: usize) -> (usize, usize) {
        match &self.structure {
            Structure::Hypersparse { p, .. } | Structure::Sparse { p, .. } => (p[k], p[k + 1]),
            _ => (k * self.vlen, (k + 1) * self.vlen),
        }
    }

    /// Position in the vector list of vector `j`, if it is stored
    #[inline]
    pub(crate) fn find_vector(&self, j: usize) -> Option<usize> {
        match &self.structure {
            Structure::Hypersparse { h, .. } => h.binary_search(&j).ok(),
            _ => (j < self.vdim).then_some(j),
        }
    }

    pub(crate) fn ptr(&self) -> Option<&[usize]> {
        match &self.structure {
            Structure::Hypersparse { p, .. } | Structure::Sparse { p, .. } => Some(p),
            _ => None,
        }
    }

    pub(crate) fn hlist(&self) -> Option<&[usize]> {
        match &self.structure {
            Structure::Hypersparse { h, .. } => Some(h),
            _ => None,
        }
    }

    pub(crate) fn indices(&self) -> Option<&[usize]> {
        match &self.structure {
            Structure::Hypersparse { i, .. } | Structure::Sparse { i, .. } => Some(i),
            _ => None,
        }
    }

    pub(crate) fn bitmap(&self) -> Option<&[u8]> {
        match &self.structure {
            Structure::Bitmap { b, .. } => Some(b),
            _ => None,
        }
    }

    /// Index of the entry at position `p` (may be a zombie)
    #[inline]
    pub(crate) fn index_at(&self, p: usize) -> usize {
        match &self.structure {
            Structure::Hypersparse { i, .. } | Structure::Sparse { i, .. } => i[p],
            _ => p % self.vlen,
        }
    }

    #[inline]
    pub(crate) fn value_at(&self, p: usize) -> T {
        if self.iso {
            self.x[0]
        } else {
            self.x[p]
        }
    }

    /// True if position `p` holds a live entry
    #[inline]
    pub(crate) fn present_at(&self, p: usize) -> bool {
        match &self.structure {
            Structure::Hypersparse { i, .. } | Structure::Sparse { i, .. } => !is_zombie(i[p]),
            Structure::Bitmap { b, .. } => b[p] != 0,
            Structure::Full => true,
        }
    }

    /// `vlen * vdim`, if it fits
    pub(crate) fn dense_extent(&self) -> Option<usize> {
        self.vlen.checked_mul(self.vdim)
    }

    /// Number of entry slots: `p[nvec]` for sparse storage, the dense extent otherwise
    pub(crate) fn nnz_slots(&self) -> usize {
        match &self.structure {
            Structure::Hypersparse { p, .. } | Structure::Sparse { p, .. } => {
                p.last().copied().unwrap_or(0)
            }
            _ => self.vlen * self.vdim,
        }
    }

    pub(crate) fn is_sparse_or_hyper(&self) -> bool {
        matches!(
            self.structure,
            Structure::Hypersparse { .. } | Structure::Sparse { .. }
        )
    }

    pub(crate) fn is_bitmap_or_full(&self) -> bool {
        !self.is_sparse_or_hyper()
    }

    pub(crate) fn is_full(&self) -> bool {
        matches!(self.structure, Structure::Full)
    }

    pub(crate) fn is_hyper(&self) -> bool {
        matches!(self.structure, Structure::Hypersparse { .. })
    }

    /// Number of stored vectors holding at least one slot
    pub(crate) fn nvec_nonempty(&self) -> usize {
        match self.ptr() {
            Some(p) => p.windows(2).filter(|w| w[1] > w[0]).count(),
            None if self.vlen == 0 => 0,
            None => self.vdim,
        }
    }

    /// Storage coordinates (vector, index) of logical entry (row, col)
    #[inline]
    pub(crate) fn stored_coords(&self, row: usize, col: usize) -> (usize, usize) {
        if self.by_col {
            (col, row)
        } else {
            (row, col)
        }
    }

    /// Logical coordinates (row, col) of storage entry (vector, index)
    #[inline]
    pub(crate) fn logical_coords(&self, j: usize, i: usize) -> (usize, usize) {
        if self.by_col {
            (i, j)
        } else {
            (j, i)
        }
    }

    pub(crate) fn ensure_valid(&self) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(Error::invalid_object(
                "matrix content was freed after a failed allocation",
            ))
        }
    }

    pub(crate) fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.nrows() {
            return Err(Error::IndexOutOfBounds {
                index: row,
                size: self.nrows(),
            });
        }
        if col >= self.ncols() {
            return Err(Error::IndexOutOfBounds {
                index: col,
                size: self.ncols(),
            });
        }
        Ok(())
    }

    /// Position of index `i` in vector `j` of a sparse matrix, live or zombie
    pub(crate) fn find_entry(&self, j: usize, i: usize) -> Option<usize> {
        let k = self.find_vector(j)?;
        let (pstart, pend) = self.vector_range(k);
        let ci = self.indices()?;
        let slots = &ci[pstart..pend];
        if self.jumbled {
            slots
                .iter()
                .position(|&idx| unflip_index(idx) == i)
                .map(|q| pstart + q)
        } else {
            slots
                .binary_search_by(|&idx| unflip_index(idx).cmp(&i))
                .ok()
                .map(|q| pstart + q)
        }
    }

    /// This matrix if it is clean, otherwise a finalized copy
    pub(crate) fn finalized(&self, ctx: &Context) -> Result<Cow<'_, Matrix<T>>> {
        self.ensure_valid()?;
        if self.lifecycle() == Lifecycle::Clean {
            Ok(Cow::Borrowed(self))
        } else {
            let mut copy = self.clone();
            copy.wait_with(ctx)?;
            Ok(Cow::Owned(copy))
        }
    }

    //--------------------------------------------------------------------------
    // entries
    //--------------------------------------------------------------------------

    /// Value of entry (row, col), if present
    ///
    /// Pending insertions are visible; out-of-range coordinates give `None`.
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if !self.valid || row >= self.nrows() || col >= self.ncols() {
            return None;
        }
        let (j, i) = self.stored_coords(row, col);
        match &self.structure {
            Structure::Full => Some(self.value_at(j * self.vlen + i)),
            Structure::Bitmap { b, .. } => {
                let p = j * self.vlen + i;
                (b[p] != 0).then(|| self.value_at(p))
            }
            _ => match self.find_entry(j, i) {
                Some(p) if self.present_at(p) => Some(self.value_at(p)),
                _ => self.pending.as_ref().and_then(|pending| pending.lookup(j, i)),
            },
        }
    }

    /// All entries as (row, col, value), sorted by row then column
    pub fn tuples(&self) -> Result<Vec<(usize, usize, T)>> {
        let m = self.finalized(&Context::sequential())?;
        let mut out = Vec::with_capacity(m.nvals());
        for k in 0..m.nvec() {
            let j = m.vector_id(k);
            let (pstart, pend) = m.vector_range(k);
            for p in pstart..pend {
                if m.present_at(p) {
                    let (row, col) = m.logical_coords(j, m.index_at(p));
                    out.push((row, col, m.value_at(p)));
                }
            }
        }
        if m.by_col {
            out.sort_unstable_by_key(|&(row, col, _)| (row, col));
        }
        Ok(out)
    }

    /// Bytes held by all arrays of the matrix, including pending tuples
    pub fn memory_usage(&self) -> usize {
        let pw = if self.widths.p_is_32 { 4 } else { 8 };
        let jw = if self.widths.j_is_32 { 4 } else { 8 };
        let iw = if self.widths.i_is_32 { 4 } else { 8 };
        let structure = match &self.structure {
            Structure::Hypersparse { p, h, i } => p.len() * pw + h.len() * jw + i.len() * iw,
            Structure::Sparse { p, i } => p.len() * pw + i.len() * iw,
            Structure::Bitmap { b, .. } => b.len(),
            Structure::Full => 0,
        };
        let pending = self
            .pending
            .as_ref()
            .map_or(0, |pending| pending.len() * (jw + iw + size_of::<T>()));
        structure + self.x.len() * size_of::<T>() + pending
    }

    /// Removes all entries, keeping the type, dimensions and orientation
    ///
    /// A matrix restricted to the bitmap (or full) format becomes an empty
    /// bitmap. If that allocation fails the matrix is left invalid.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_valid()?;
        let ctl = self.control.sparsity_control.normalized();
        self.pending = None;
        self.nzombies = 0;
        self.jumbled = false;
        self.iso = false;

        if ctl.allows(Sparsity::Hypersparse) {
            self.structure = Structure::Hypersparse {
                p: vec![0],
                h: Vec::new(),
                i: Vec::new(),
            };
            self.x = Vec::new();
            return Ok(());
        }

        let result = if ctl.allows(Sparsity::Sparse) {
            try_vec(self.vdim + 1, 0usize).map(|p| {
                self.structure = Structure::Sparse { p, i: Vec::new() };
                self.x = Vec::new();
            })
        } else {
            self.dense_extent()
                .ok_or(Error::OutOfMemory { size: usize::MAX })
                .and_then(|n| Ok((try_vec(n, 0u8)?, try_vec(n, T::zero())?)))
                .map(|(b, x)| {
                    self.structure = Structure::Bitmap { b, nvals: 0 };
                    self.x = x;
                })
        };

        if let Err(e) = result {
            tracing::debug!(vdim = self.vdim, "clear failed, matrix left invalid");
            self.invalidate();
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix<f64> {
        // [1 2 0]
        // [0 3 0]
        // [4 0 5]
        Matrix::build(
            3,
            3,
            &[0, 0, 1, 2, 2],
            &[0, 1, 1, 0, 2],
            &[1.0, 2.0, 3.0, 4.0, 5.0],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_new_is_empty_hypersparse() {
        let m = Matrix::<f64>::new(4, 5);
        assert_eq!(m.nrows(), 4);
        assert_eq!(m.ncols(), 5);
        assert_eq!(m.nvals(), 0);
        assert_eq!(m.sparsity(), Sparsity::Hypersparse);
        assert!(!m.by_col());
        assert!(m.check().is_ok());
    }

    #[test]
    fn test_new_full_is_iso() {
        let m = Matrix::new_full(3, 2, 7i32).unwrap();
        assert_eq!(m.sparsity(), Sparsity::Full);
        assert!(m.is_iso());
        assert_eq!(m.nvals(), 6);
        assert_eq!(m.get(2, 1), Some(7));
        assert_eq!(m.get(3, 0), None);
        assert!(Matrix::new_full(usize::MAX, 2, 0i32).is_err());
    }

    #[test]
    fn test_identity() {
        let m = Matrix::<f64>::identity(3).unwrap();
        assert_eq!(m.nvals(), 3);
        assert_eq!(m.get(1, 1), Some(1.0));
        assert_eq!(m.get(0, 1), None);
        assert!(m.is_iso());
    }

    #[test]
    fn test_get_and_tuples() {
        let m = sample();
        assert_eq!(m.get(0, 1), Some(2.0));
        assert_eq!(m.get(1, 0), None);
        let t = m.tuples().unwrap();
        assert_eq!(
            t,
            vec![
                (0, 0, 1.0),
                (0, 1, 2.0),
                (1, 1, 3.0),
                (2, 0, 4.0),
                (2, 2, 5.0)
            ]
        );
    }

    #[test]
    fn test_clear_keeps_shape() {
        let mut m = sample();
        m.clear().unwrap();
        assert_eq!(m.nvals(), 0);
        assert_eq!((m.nrows(), m.ncols()), (3, 3));
        assert!(m.is_valid());
        assert!(m.check().is_ok());
    }

    #[test]
    fn test_clear_bitmap_only_stays_bitmap() {
        let mut m = sample();
        m.set_sparsity_control(SparsityControl::BITMAP);
        m.clear().unwrap();
        assert_eq!(m.sparsity(), Sparsity::Bitmap);
        assert_eq!(m.nvals(), 0);
        assert!(m.check().is_ok());
    }

    #[test]
    fn test_clear_failure_leaves_invalid_matrix() {
        // 2^60 columns cannot get a pointer array
        let mut m = Matrix::<f64>::new_by_col(4, 1 << 60);
        m.set_sparsity_control(SparsityControl::SPARSE);
        let err = m.clear().unwrap_err();
        assert!(err.is_out_of_memory());
        assert!(!m.is_valid());
        assert_eq!(m.nvals(), 0);
        assert_eq!((m.nrows(), m.ncols()), (4, 1 << 60));
        assert!(matches!(m.check(), Err(Error::InvalidObject(_))));
        assert!(matches!(m.clear(), Err(Error::InvalidObject(_))));

        // a long vector length is harmless
        let mut wide = Matrix::<f64>::new(4, 1 << 60);
        wide.set_sparsity_control(SparsityControl::SPARSE);
        assert!(wide.clear().is_ok());
        assert_eq!(wide.sparsity(), Sparsity::Sparse);
    }

    #[test]
    fn test_memory_usage_counts_arrays() {
        let m = sample();
        assert!(m.memory_usage() >= 5 * size_of::<f64>());
        let empty = Matrix::<f64>::new(3, 3);
        assert!(empty.memory_usage() < m.memory_usage());
    }

    #[test]
    fn test_zombie_encoding() {
        let z = flip_index(5);
        assert!(is_zombie(z));
        assert_eq!(unflip_index(z), 5);
        assert_eq!(flip_index(z), 5);
        assert!(!is_zombie(5));
    }
}
