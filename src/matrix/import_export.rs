//! Import and export of raw storage buffers
//!
//! A matrix is described by up to five flat buffers (pointers, hyperlist,
//! bitmap, indices, values) and a header. Import takes ownership of the
//! buffers; export consumes the matrix and hands them back. Index buffers
//! are 32 or 64 bits wide and the width survives a round trip.
//!
//! Fast import trusts the buffers after O(1) checks. Secure import checks
//! every entry and fails with `InvalidObject` on any malformed structure.

use crate::error::{Error, Result};
use crate::matrix::{IndexWidths, Matrix, Sparsity, Structure};
use crate::ops::Scalar;

/// Scalar metadata of an imported or exported matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportHeader {
    pub nrows: usize,
    pub ncols: usize,
    /// True if the vectors are columns
    pub by_col: bool,
    pub sparsity: Sparsity,
    pub iso: bool,
    /// True if indices within a vector may be unsorted
    pub jumbled: bool,
    /// Number of entries (bitmap only)
    pub nvals: usize,
    /// Number of vectors in the hyperlist (hypersparse only)
    pub nvec: usize,
}

/// Trust level of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// O(1) size checks only
    #[default]
    Fast,
    /// Full structural validation
    Secure,
}

/// An index buffer of either width
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    U32(Vec<u32>),
    U64(Vec<u64>),
}

impl IndexBuffer {
    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U32(v) => v.len(),
            IndexBuffer::U64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_32(&self) -> bool {
        matches!(self, IndexBuffer::U32(_))
    }

    fn truncated(self, len: usize) -> Self {
        match self {
            IndexBuffer::U32(mut v) => {
                v.truncate(len);
                IndexBuffer::U32(v)
            }
            IndexBuffer::U64(mut v) => {
                v.truncate(len);
                IndexBuffer::U64(v)
            }
        }
    }

    fn into_usize(self) -> Result<Vec<usize>> {
        match self {
            IndexBuffer::U32(v) => Ok(v.into_iter().map(|x| x as usize).collect()),
            IndexBuffer::U64(v) => v
                .into_iter()
                .map(|x| usize::try_from(x).map_err(|_| Error::invalid_value("index exceeds usize")))
                .collect(),
        }
    }

    fn from_usize(v: Vec<usize>, narrow: bool) -> Self {
        if narrow {
            IndexBuffer::U32(v.into_iter().map(|x| x as u32).collect())
        } else {
            IndexBuffer::U64(v.into_iter().map(|x| x as u64).collect())
        }
    }
}

/// The storage buffers of a matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixBuffers<T> {
    /// Vector pointers (sparse and hypersparse)
    pub p: Option<IndexBuffer>,
    /// Non-empty vector list (hypersparse)
    pub h: Option<IndexBuffer>,
    /// Presence bytes (bitmap)
    pub b: Option<Vec<u8>>,
    /// Indices (sparse and hypersparse)
    pub i: Option<IndexBuffer>,
    /// Values; a single value when iso
    pub x: Vec<T>,
}

fn require<B>(buffer: Option<B>, name: &str) -> Result<B> {
    buffer.ok_or_else(|| Error::invalid_value(format!("buffer {name} is missing")))
}

fn require_len(len: usize, needed: usize, name: &str) -> Result<()> {
    if len < needed {
        return Err(Error::invalid_value(format!(
            "buffer {name} holds {len} entries, {needed} required"
        )));
    }
    Ok(())
}

fn last_pointer(p: &IndexBuffer, nvec: usize) -> Result<usize> {
    let last = match p {
        IndexBuffer::U32(v) => v[nvec] as u64,
        IndexBuffer::U64(v) => v[nvec],
    };
    usize::try_from(last).map_err(|_| Error::invalid_value("pointer exceeds usize"))
}

impl<T: Scalar> Matrix<T> {
    /// Creates a matrix from raw buffers
    ///
    /// Buffers may be longer than required and are truncated; a buffer too
    /// short is an `InvalidValue` error, raised before any buffer is used.
    pub fn import(header: ImportHeader, buffers: MatrixBuffers<T>, mode: ImportMode) -> Result<Self> {
        let ImportHeader {
            nrows,
            ncols,
            by_col,
            sparsity,
            iso,
            jumbled,
            nvals,
            nvec,
        } = header;
        let (vlen, vdim) = if by_col { (nrows, ncols) } else { (ncols, nrows) };
        let MatrixBuffers { p, h, b, i, x } = buffers;

        let nx_needed = |slots: usize| if iso { 1 } else { slots };

        let mut m = match sparsity {
            Sparsity::Sparse | Sparsity::Hypersparse => {
                let hyper = sparsity == Sparsity::Hypersparse;
                let nvec = if hyper { nvec } else { vdim };
                if hyper && nvec > vdim {
                    return Err(Error::invalid_value(format!(
                        "hyperlist of {nvec} vectors exceeds dimension {vdim}"
                    )));
                }
                let p = require(p, "p")?;
                require_len(p.len(), nvec + 1, "p")?;
                let nnz = last_pointer(&p, nvec)?;
                let i = require(i, "i")?;
                require_len(i.len(), nnz, "i")?;
                require_len(x.len(), nx_needed(nnz), "x")?;
                let h = if hyper {
                    let h = require(h, "h")?;
                    require_len(h.len(), nvec, "h")?;
                    Some(h)
                } else {
                    None
                };

                let widths = IndexWidths {
                    p_is_32: p.is_32(),
                    j_is_32: h.as_ref().map_or(vdim < crate::constants::INDEX_32_LIMIT, |h| h.is_32()),
                    i_is_32: i.is_32(),
                };
                let p = p.truncated(nvec + 1).into_usize()?;
                let i = i.truncated(nnz).into_usize()?;
                let h = match h {
                    Some(h) => Some(h.truncated(nvec).into_usize()?),
                    None => None,
                };
                let mut x = x;
                x.truncate(nx_needed(nnz));
                let mut m = Matrix::from_sparse(vlen, vdim, by_col, p, h, i, x, iso);
                m.widths = widths;
                m.jumbled = jumbled;
                m
            }
            Sparsity::Bitmap => {
                let n = vlen
                    .checked_mul(vdim)
                    .ok_or_else(|| Error::invalid_value("bitmap extent overflows"))?;
                let mut b = require(b, "b")?;
                require_len(b.len(), n, "b")?;
                require_len(x.len(), nx_needed(n), "x")?;
                b.truncate(n);
                let mut x = x;
                x.truncate(nx_needed(n));
                Matrix::from_bitmap(vlen, vdim, by_col, b, x, nvals, iso)
            }
            Sparsity::Full => {
                let n = vlen
                    .checked_mul(vdim)
                    .ok_or_else(|| Error::invalid_value("full extent overflows"))?;
                require_len(x.len(), nx_needed(n), "x")?;
                let mut x = x;
                x.truncate(nx_needed(n));
                Matrix::from_full(vlen, vdim, by_col, x, iso)
            }
        };

        if mode == ImportMode::Secure {
            m.check_structure(jumbled)?;
        }
        // a sorted matrix is never reported as jumbled
        if m.jumbled && m.is_bitmap_or_full() {
            m.jumbled = false;
        }
        tracing::debug!(?sparsity, ?mode, nrows, ncols, "import");
        Ok(m)
    }

    /// Consumes the matrix and returns its header and buffers
    ///
    /// The matrix is finalized first. Unless `allow_jumbled` is set, the
    /// exported vectors are sorted.
    pub fn export(mut self, allow_jumbled: bool) -> Result<(ImportHeader, MatrixBuffers<T>)> {
        self.ensure_valid()?;
        if self.pending.is_some() || self.nzombies > 0 || (self.jumbled && !allow_jumbled) {
            self.wait()?;
        }
        let header = ImportHeader {
            nrows: self.nrows(),
            ncols: self.ncols(),
            by_col: self.by_col,
            sparsity: self.sparsity(),
            iso: self.iso,
            jumbled: self.jumbled,
            nvals: self.nvals(),
            nvec: self.hlist().map_or(0, |h| h.len()),
        };
        let widths = self.widths;
        let buffers = match self.structure {
            Structure::Hypersparse { p, h, i } => MatrixBuffers {
                p: Some(IndexBuffer::from_usize(p, widths.p_is_32)),
                h: Some(IndexBuffer::from_usize(h, widths.j_is_32)),
                b: None,
                i: Some(IndexBuffer::from_usize(i, widths.i_is_32)),
                x: self.x,
            },
            Structure::Sparse { p, i } => MatrixBuffers {
                p: Some(IndexBuffer::from_usize(p, widths.p_is_32)),
                h: None,
                b: None,
                i: Some(IndexBuffer::from_usize(i, widths.i_is_32)),
                x: self.x,
            },
            Structure::Bitmap { b, .. } => MatrixBuffers {
                p: None,
                h: None,
                b: Some(b),
                i: None,
                x: self.x,
            },
            Structure::Full => MatrixBuffers {
                p: None,
                h: None,
                b: None,
                i: None,
                x: self.x,
            },
        };
        Ok((header, buffers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse_header(nrows: usize, ncols: usize, jumbled: bool) -> ImportHeader {
        ImportHeader {
            nrows,
            ncols,
            by_col: true,
            sparsity: Sparsity::Sparse,
            iso: false,
            jumbled,
            nvals: 0,
            nvec: 0,
        }
    }

    fn buffers(p: Vec<u32>, i: Vec<u32>, x: Vec<f64>) -> MatrixBuffers<f64> {
        MatrixBuffers {
            p: Some(IndexBuffer::U32(p)),
            h: None,
            b: None,
            i: Some(IndexBuffer::U32(i)),
            x,
        }
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let original = buffers(vec![0, 1, 3], vec![2, 0, 1], vec![1.0, 2.0, 3.0]);
        let m = Matrix::import(sparse_header(3, 2, false), original.clone(), ImportMode::Secure).unwrap();
        assert_eq!(m.nvals(), 3);
        assert_eq!(m.get(2, 0), Some(1.0));
        let (header, out) = m.export(false).unwrap();
        assert_eq!(out, original);
        assert_eq!(header.sparsity, Sparsity::Sparse);
        assert!(header.by_col);
    }

    #[test]
    fn test_short_buffers_are_invalid_values() {
        let short = buffers(vec![0, 1], vec![0], vec![1.0]);
        let err = Matrix::import(sparse_header(3, 2, false), short, ImportMode::Fast).unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));

        let no_values = buffers(vec![0, 1, 2], vec![0, 1], vec![1.0]);
        assert!(matches!(
            Matrix::import(sparse_header(3, 2, false), no_values, ImportMode::Fast),
            Err(Error::InvalidValue(_))
        ));
    }

    #[test]
    fn test_jumbled_import() {
        // one vector with indices [1, 0]
        let jumbled = || buffers(vec![0, 2], vec![1, 0], vec![10.0, 20.0]);

        let m = Matrix::import(sparse_header(2, 1, true), jumbled(), ImportMode::Fast).unwrap();
        assert!(m.is_jumbled());
        assert_eq!(m.get(0, 0), Some(20.0));

        let err = Matrix::import(sparse_header(2, 1, false), jumbled(), ImportMode::Secure).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(_)));

        let ok = Matrix::import(sparse_header(2, 1, true), jumbled(), ImportMode::Secure).unwrap();
        assert!(ok.is_jumbled());
    }

    #[test]
    fn test_secure_import_rejects_malformed_structure() {
        let decreasing = buffers(vec![0, 2, 1], vec![0, 1], vec![1.0, 2.0]);
        assert!(Matrix::import(sparse_header(3, 2, false), decreasing.clone(), ImportMode::Fast).is_ok());
        assert!(matches!(
            Matrix::import(sparse_header(3, 2, false), decreasing, ImportMode::Secure),
            Err(Error::InvalidObject(_))
        ));

        let out_of_range = buffers(vec![0, 1, 1], vec![7], vec![1.0]);
        assert!(matches!(
            Matrix::import(sparse_header(3, 2, false), out_of_range, ImportMode::Secure),
            Err(Error::InvalidObject(_))
        ));

        let duplicate = buffers(vec![0, 2, 2], vec![1, 1], vec![1.0, 2.0]);
        assert!(matches!(
            Matrix::import(sparse_header(3, 2, true), duplicate, ImportMode::Secure),
            Err(Error::InvalidObject(_))
        ));
    }

    #[test]
    fn test_bitmap_and_full_round_trip() {
        let header = ImportHeader {
            nrows: 2,
            ncols: 2,
            by_col: false,
            sparsity: Sparsity::Bitmap,
            iso: false,
            jumbled: false,
            nvals: 2,
            nvec: 0,
        };
        let bufs = MatrixBuffers {
            p: None,
            h: None,
            b: Some(vec![1, 0, 0, 1]),
            i: None,
            x: vec![1i32, 0, 0, 4],
        };
        let m = Matrix::import(header, bufs.clone(), ImportMode::Secure).unwrap();
        assert_eq!(m.get(1, 1), Some(4));
        let (h2, out) = m.export(false).unwrap();
        assert_eq!(h2, header);
        assert_eq!(out, bufs);

        let bad = ImportHeader { nvals: 3, ..header };
        assert!(Matrix::import(bad, bufs, ImportMode::Secure).is_err());

        let full = ImportHeader {
            sparsity: Sparsity::Full,
            iso: true,
            nvals: 0,
            ..header
        };
        let m = Matrix::import(full, MatrixBuffers { p: None, h: None, b: None, i: None, x: vec![3i32, 9] }, ImportMode::Fast).unwrap();
        assert!(m.is_iso());
        assert_eq!(m.nvals(), 4);
        let (_, out) = m.export(false).unwrap();
        assert_eq!(out.x, vec![3]);
    }

    #[test]
    fn test_hypersparse_with_wide_indices() {
        let header = ImportHeader {
            nrows: 4,
            ncols: 100,
            by_col: true,
            sparsity: Sparsity::Hypersparse,
            iso: false,
            jumbled: false,
            nvals: 0,
            nvec: 2,
        };
        let bufs = MatrixBuffers {
            p: Some(IndexBuffer::U64(vec![0, 1, 3])),
            h: Some(IndexBuffer::U64(vec![5, 60])),
            b: None,
            i: Some(IndexBuffer::U64(vec![3, 0, 2])),
            x: vec![1.0f32, 2.0, 3.0],
        };
        let m = Matrix::import(header, bufs.clone(), ImportMode::Secure).unwrap();
        assert_eq!(m.get(2, 60), Some(3.0));
        assert!(!m.index_widths().p_is_32);
        let (_, out) = m.export(false).unwrap();
        assert_eq!(out, bufs);
    }
}
