//! Conversion between storage formats, orientations and transposes
//!
//! All conversions here work on clean matrices (no zombies, no pending
//! tuples, sorted vectors); the public entry points finalize first.

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::matrix::{Context, IndexWidths, Matrix, Sparsity, Structure};
use crate::ops::Scalar;
use crate::parallel::for_each_window;
use crate::slice::nthreads_for;
use crate::utils::{cumsum_in_place, try_vec, try_with_capacity};

impl<T: Scalar> Matrix<T> {
    /// Converts the matrix to the given format
    ///
    /// The format controls of the matrix are not consulted. Converting to
    /// [`Sparsity::Full`] fails with `InvalidValue` unless every entry is
    /// present.
    pub fn convert_to(&mut self, sparsity: Sparsity) -> Result<()> {
        self.convert_to_with(sparsity, &Context::default())
    }

    /// [`Matrix::convert_to`] with an explicit context
    pub fn convert_to_with(&mut self, sparsity: Sparsity, ctx: &Context) -> Result<()> {
        self.wait_with(ctx)?;
        if sparsity == Sparsity::Full && !self.all_present() {
            return Err(Error::invalid_value(
                "only a matrix with every entry present can be full",
            ));
        }
        self.convert_clean(sparsity, ctx)
    }

    /// Finalizes the matrix and picks its format from the format controls
    pub fn conform(&mut self) -> Result<()> {
        self.conform_with(&Context::default())
    }

    /// [`Matrix::conform`] with an explicit context
    pub fn conform_with(&mut self, ctx: &Context) -> Result<()> {
        self.wait_with(ctx)?;
        self.conform_clean(ctx)
    }

    /// Moves a clean matrix to its preferred format
    pub(crate) fn conform_clean(&mut self, ctx: &Context) -> Result<()> {
        let target = self.preferred_sparsity();
        if target != self.sparsity() {
            tracing::trace!(from = ?self.sparsity(), to = ?target, "conform");
            self.convert_clean(target, ctx)?;
        }
        Ok(())
    }

    fn all_present(&self) -> bool {
        self.dense_extent().map_or(false, |n| self.nvals() == n)
    }

    /// Format chosen by the hyper and bitmap switches within the allowed set
    fn preferred_sparsity(&self) -> Sparsity {
        let ctl = self.control.sparsity_control.normalized();
        let all_present = self.all_present();
        if all_present && ctl.allows(Sparsity::Full) {
            return Sparsity::Full;
        }
        let current = self.sparsity();
        let bitmap_ok = ctl.allows(Sparsity::Bitmap) && self.dense_extent().is_some();
        let sparse_ok = ctl.allows(Sparsity::Sparse);
        let hyper_ok = ctl.allows(Sparsity::Hypersparse);

        if !sparse_ok && !hyper_ok {
            // a full-only matrix with missing entries falls back to bitmap
            return Sparsity::Bitmap;
        }

        if bitmap_ok {
            let extent = self.dense_extent().unwrap_or(0);
            let density = if extent == 0 {
                0.0
            } else {
                self.nvals() as f64 / extent as f64
            };
            let bs = self.control.bitmap_switch;
            let stay = match current {
                Sparsity::Bitmap | Sparsity::Full => density >= bs / 2.0,
                _ => density >= bs,
            };
            if stay && extent > 0 {
                return Sparsity::Bitmap;
            }
        }

        if !hyper_ok {
            return Sparsity::Sparse;
        }
        if !sparse_ok {
            return Sparsity::Hypersparse;
        }
        let nonempty = self.count_nonempty_vectors() as f64;
        let hs = self.control.hyper_switch * self.vdim as f64;
        match current {
            Sparsity::Hypersparse if nonempty <= 2.0 * hs => Sparsity::Hypersparse,
            Sparsity::Hypersparse => Sparsity::Sparse,
            _ if nonempty <= hs => Sparsity::Hypersparse,
            _ => Sparsity::Sparse,
        }
    }

    fn count_nonempty_vectors(&self) -> usize {
        match &self.structure {
            Structure::Bitmap { b, .. } if self.vlen > 0 => b
                .chunks(self.vlen)
                .filter(|v| v.iter().any(|&bit| bit != 0))
                .count(),
            _ => self.nvec_nonempty(),
        }
    }

    /// Converts a clean matrix to `target`
    pub(crate) fn convert_clean(&mut self, target: Sparsity, ctx: &Context) -> Result<()> {
        match (self.sparsity(), target) {
            (from, to) if from == to => Ok(()),
            (Sparsity::Hypersparse, Sparsity::Sparse) => self.hyper_to_sparse(),
            (Sparsity::Sparse, Sparsity::Hypersparse) => {
                self.sparse_to_hyper();
                Ok(())
            }
            (Sparsity::Hypersparse | Sparsity::Sparse, Sparsity::Bitmap) => self.sparse_to_bitmap(),
            (Sparsity::Hypersparse | Sparsity::Sparse, Sparsity::Full) => {
                self.sparse_to_bitmap()?;
                self.bitmap_to_full();
                Ok(())
            }
            (Sparsity::Bitmap, Sparsity::Full) => {
                self.bitmap_to_full();
                Ok(())
            }
            (Sparsity::Full, Sparsity::Bitmap) => self.full_to_bitmap(),
            (Sparsity::Bitmap | Sparsity::Full, to) => {
                self.dense_to_sparse(ctx)?;
                if to == Sparsity::Hypersparse {
                    self.sparse_to_hyper();
                }
                Ok(())
            }
            (from, to) => Err(Error::invalid_value(format!(
                "no conversion from {from:?} to {to:?}"
            ))),
        }
    }

    fn hyper_to_sparse(&mut self) -> Result<()> {
        if let Structure::Hypersparse { p, h, i } = &mut self.structure {
            let mut full = try_vec(self.vdim + 1, 0usize)?;
            for (k, &j) in h.iter().enumerate() {
                full[j + 1] = p[k + 1] - p[k];
            }
            for j in 0..self.vdim {
                full[j + 1] += full[j];
            }
            let i = std::mem::take(i);
            self.structure = Structure::Sparse { p: full, i };
        }
        Ok(())
    }

    fn sparse_to_hyper(&mut self) {
        if let Structure::Sparse { p, i } = &mut self.structure {
            let mut h = Vec::new();
            let mut hp = vec![0usize];
            for (k, w) in p.windows(2).enumerate() {
                if w[1] > w[0] {
                    h.push(k);
                    hp.push(w[1]);
                }
            }
            let i = std::mem::take(i);
            self.structure = Structure::Hypersparse { p: hp, h, i };
        }
    }

    fn sparse_to_bitmap(&mut self) -> Result<()> {
        let n = self
            .dense_extent()
            .ok_or(Error::OutOfMemory { size: usize::MAX })?;
        let mut b = try_vec(n, 0u8)?;
        let mut x = if self.iso {
            Vec::new()
        } else {
            try_vec(n, T::zero())?
        };
        let mut nvals = 0;
        for k in 0..self.nvec() {
            let base = self.vector_id(k) * self.vlen;
            let (pstart, pend) = self.vector_range(k);
            for p in pstart..pend {
                if !self.present_at(p) {
                    continue;
                }
                let q = base + self.index_at(p);
                b[q] = 1;
                if !self.iso {
                    x[q] = self.x[p];
                }
                nvals += 1;
            }
        }
        self.structure = Structure::Bitmap { b, nvals };
        if !self.iso {
            self.x = x;
        }
        self.jumbled = false;
        Ok(())
    }

    fn bitmap_to_full(&mut self) {
        debug_assert!(self.all_present());
        self.structure = Structure::Full;
    }

    /// Compresses a bitmap or full matrix into sparse vectors
    fn dense_to_sparse(&mut self, ctx: &Context) -> Result<()> {
        let vlen = self.vlen;
        let nslots = self.nnz_slots();
        let mut p = try_vec(self.vdim + 1, 0usize)?;
        match &self.structure {
            Structure::Bitmap { b, .. } if vlen > 0 => {
                let nthreads = nthreads_for(nslots as f64, ctx.chunk, ctx.nthreads_max);
                let b = &b[..];
                for_each_window(ctx, nthreads, &mut p[..self.vdim], 1, |j, w| {
                    w[0] = b[j * vlen..(j + 1) * vlen].iter().filter(|&&bit| bit != 0).count();
                });
            }
            _ => p[..self.vdim].iter_mut().for_each(|c| *c = vlen),
        }
        cumsum_in_place(&mut p);
        let nnz = p[self.vdim];

        let mut i = try_with_capacity(nnz)?;
        let mut x = if self.iso { Vec::new() } else { try_with_capacity(nnz)? };
        for q in 0..nslots {
            if self.present_at(q) {
                i.push(q % vlen.max(1));
                if !self.iso {
                    x.push(self.x[q]);
                }
            }
        }
        self.structure = Structure::Sparse { p, i };
        if !self.iso {
            self.x = x;
        }
        Ok(())
    }

    /// The same logical matrix stored in the opposite orientation
    pub(crate) fn transpose_stored(&self, ctx: &Context) -> Result<Matrix<T>> {
        let m = self.finalized(ctx)?;
        let (vlen, vdim) = (m.vdim, m.vlen);
        let by_col = !m.by_col;

        let mut t = match &m.structure {
            Structure::Full | Structure::Bitmap { .. } => m.transpose_dense(ctx)?,
            _ => {
                let nnz = m.nnz_slots();
                if vdim > 2 * nnz + 1024 {
                    m.transpose_by_sort(nnz)?
                } else {
                    m.transpose_by_bucket(nnz)?
                }
            }
        };
        t.by_col = by_col;
        t.widths = IndexWidths::for_extent(vlen, vdim, t.nnz_slots());
        t.conform_clean(ctx)?;
        Ok(t)
    }

    fn transpose_dense(&self, ctx: &Context) -> Result<Matrix<T>> {
        let (vlen, vdim) = (self.vdim, self.vlen);
        let n = vlen * vdim;
        let nthreads = nthreads_for(n as f64, ctx.chunk, ctx.nthreads_max);
        let src_vlen = self.vlen;

        let x = if self.iso {
            self.x.clone()
        } else {
            let mut x = try_vec(n, T::zero())?;
            let src = &self.x[..];
            for_each_window(ctx, nthreads, &mut x, vlen, |i, w| {
                for (j, v) in w.iter_mut().enumerate() {
                    *v = src[j * src_vlen + i];
                }
            });
            x
        };
        match &self.structure {
            Structure::Bitmap { b, nvals } => {
                let mut bt = try_vec(n, 0u8)?;
                let src = &b[..];
                for_each_window(ctx, nthreads, &mut bt, vlen, |i, w| {
                    for (j, v) in w.iter_mut().enumerate() {
                        *v = src[j * src_vlen + i];
                    }
                });
                Ok(Matrix::from_bitmap(vlen, vdim, self.by_col, bt, x, *nvals, self.iso))
            }
            _ => Ok(Matrix::from_full(vlen, vdim, self.by_col, x, self.iso)),
        }
    }

    /// Counting transpose: bucket the entries by index
    fn transpose_by_bucket(&self, nnz: usize) -> Result<Matrix<T>> {
        let (vlen, vdim) = (self.vdim, self.vlen);

        // Count entries per output vector
        let mut p = try_vec(vdim + 1, 0usize)?;
        for q in 0..nnz {
            p[self.index_at(q)] += 1;
        }
        cumsum_in_place(&mut p);

        let mut ti = try_vec(nnz, 0usize)?;
        let mut tx = if self.iso {
            self.x.clone()
        } else {
            try_vec(nnz, T::zero())?
        };

        // Fill by scanning vectors in order, so each output vector is sorted
        let mut next = p.clone();
        for k in 0..self.nvec() {
            let j = self.vector_id(k);
            let (pstart, pend) = self.vector_range(k);
            for q in pstart..pend {
                let i = self.index_at(q);
                let pos = next[i];
                ti[pos] = j;
                if !self.iso {
                    tx[pos] = self.x[q];
                }
                next[i] += 1;
            }
        }
        Ok(Matrix::from_sparse(vlen, vdim, self.by_col, p, None, ti, tx, self.iso))
    }

    /// Sorting transpose for matrices with a long, sparsely used index range
    fn transpose_by_sort(&self, nnz: usize) -> Result<Matrix<T>> {
        let mut keyed: Vec<((usize, usize), T)> = try_with_capacity(nnz)?;
        for k in 0..self.nvec() {
            let j = self.vector_id(k);
            let (pstart, pend) = self.vector_range(k);
            for q in pstart..pend {
                keyed.push(((self.index_at(q), j), self.value_at(q)));
            }
        }
        keyed.sort_unstable_by_key(|&(key, _)| key);
        let (keys, mut values): (Vec<_>, Vec<_>) = keyed.into_iter().unzip();
        if self.iso {
            values = self.x.clone();
        }
        let mut t = Matrix::from_sorted_keys(self.vdim, self.vlen, self.by_col, &keys, values)?;
        t.iso = self.iso;
        Ok(t)
    }

    /// The logical transpose, stored in the same orientation
    pub fn transpose(&self) -> Result<Matrix<T>> {
        self.transpose_with(&Context::default())
    }

    /// [`Matrix::transpose`] with an explicit context
    pub fn transpose_with(&self, ctx: &Context) -> Result<Matrix<T>> {
        let mut t = self.transpose_stored(ctx)?;
        t.by_col = self.by_col;
        t.control = self.control;
        t.conform_clean(ctx)?;
        Ok(t)
    }

    /// Changes the storage orientation, keeping the logical content
    pub fn set_orientation(&mut self, by_col: bool) -> Result<()> {
        self.ensure_valid()?;
        if self.by_col == by_col {
            return Ok(());
        }
        let t = self.transpose_stored(&Context::default())?;
        let control = self.control;
        *self = t;
        self.control = control;
        Ok(())
    }

    /// This matrix finalized and stored in the requested orientation
    pub(crate) fn in_orientation(&self, by_col: bool, ctx: &Context) -> Result<Cow<'_, Matrix<T>>> {
        let m = self.finalized(ctx)?;
        if m.by_col == by_col {
            Ok(m)
        } else {
            Ok(Cow::Owned(m.transpose_stored(ctx)?))
        }
    }

    /// This matrix, or its transpose, finalized and stored in orientation `by_col`
    ///
    /// The transpose of a matrix stored in the other orientation shares its
    /// storage, so only the orientation flag changes.
    pub(crate) fn as_operand(&self, transpose: bool, by_col: bool, ctx: &Context) -> Result<Cow<'_, Matrix<T>>> {
        if !transpose {
            return self.in_orientation(by_col, ctx);
        }
        let m = self.finalized(ctx)?;
        let mut t = if m.by_col != by_col {
            m.into_owned()
        } else {
            m.transpose_stored(ctx)?
        };
        t.by_col = by_col;
        Ok(Cow::Owned(t))
    }
}
