//! Deferred insertions and deletions
//!
//! Single-entry updates are batched: an insertion that does not hit an
//! existing entry of a sparse matrix is appended to the pending list, and a
//! deletion turns the entry into a zombie. Both are resolved together by
//! [`Matrix::wait`], which removes zombies, sorts jumbled vectors and merges
//! the pending tuples. Every structural operation finalizes its inputs
//! before reading them.

use crate::accumulator::SortAccumulator;
use crate::error::Result;
use crate::ewise::union_matrices;
use crate::matrix::{flip_index, is_zombie, unflip_index, Context, Matrix, Structure};
use crate::ops::{BinaryOp, Scalar};
use crate::parallel::{map_tasks, split_by_offsets};
use crate::slice::nthreads_for;
use crate::utils::try_vec;

/// Whether a matrix has deferred work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No zombies, no pending tuples, vectors sorted
    Clean,
    /// Zombies, pending tuples or jumbled vectors remain
    Dirty,
}

/// Insertions not yet merged into the structure
///
/// Tuples are kept in arrival order as (vector, index, value). Duplicates
/// are merged in that order with `dup`, or the last one wins.
#[derive(Debug, Clone)]
pub(crate) struct Pending<T> {
    tuples: Vec<(usize, usize, T)>,
    dup: Option<BinaryOp<T>>,
}

impl<T: Scalar> Pending<T> {
    pub(crate) fn new(dup: Option<BinaryOp<T>>) -> Self {
        Self {
            tuples: Vec::new(),
            dup,
        }
    }

    pub(crate) fn push(&mut self, j: usize, i: usize, value: T) {
        self.tuples.push((j, i, value));
    }

    pub(crate) fn len(&self) -> usize {
        self.tuples.len()
    }

    pub(crate) fn dup(&self) -> Option<&BinaryOp<T>> {
        self.dup.as_ref()
    }

    fn merge(&self, older: T, newer: T) -> T {
        match &self.dup {
            Some(op) => op.apply(older, newer),
            None => newer,
        }
    }

    /// Number of distinct positions among the tuples
    pub(crate) fn distinct_count(&self) -> usize {
        let mut keys: Vec<(usize, usize)> = self.tuples.iter().map(|&(j, i, _)| (j, i)).collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    /// The merged value of the tuples at (j, i), if any
    pub(crate) fn lookup(&self, j: usize, i: usize) -> Option<T> {
        self.tuples
            .iter()
            .filter(|&&(tj, ti, _)| tj == j && ti == i)
            .map(|&(_, _, v)| v)
            .reduce(|older, newer| self.merge(older, newer))
    }
}

impl<T: Scalar> Matrix<T> {
    /// Reports whether the matrix has deferred work
    pub fn lifecycle(&self) -> Lifecycle {
        if self.pending.is_some() || self.nzombies > 0 || self.jumbled {
            Lifecycle::Dirty
        } else {
            Lifecycle::Clean
        }
    }

    /// Sets entry (row, col) to `value`
    ///
    /// An existing entry (a zombie included) is updated in place. A new
    /// entry of a sparse matrix becomes a pending tuple; bitmap and full
    /// matrices are updated directly.
    pub fn set_element(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.ensure_valid()?;
        self.check_bounds(row, col)?;
        let (j, i) = self.stored_coords(row, col);

        if self.is_bitmap_or_full() {
            return self.write_dense(j, i, value, None);
        }
        if let Some(p) = self.find_entry(j, i) {
            self.write_slot(p, value, None)?;
            return Ok(());
        }
        if self.pending.as_ref().map_or(false, |pending| pending.dup().is_some()) {
            // earlier tuples merge with an operator; flush them first
            self.wait()?;
            return self.set_element(row, col, value);
        }
        self.pending
            .get_or_insert_with(|| Pending::new(None))
            .push(j, i, value);
        Ok(())
    }

    /// Sets entry (row, col) to `op(old, value)`, or to `value` if absent
    ///
    /// Pending insertions made this way are merged with `op` by `wait`.
    pub fn accum_element(&mut self, row: usize, col: usize, value: T, op: &BinaryOp<T>) -> Result<()> {
        self.ensure_valid()?;
        self.check_bounds(row, col)?;
        let (j, i) = self.stored_coords(row, col);

        if self.is_bitmap_or_full() {
            return self.write_dense(j, i, value, Some(op));
        }
        if let Some(p) = self.find_entry(j, i) {
            self.write_slot(p, value, Some(op))?;
            return Ok(());
        }
        let compatible = self
            .pending
            .as_ref()
            .map_or(true, |pending| pending.dup().map_or(false, |dup| dup.same_as(op)));
        if !compatible {
            self.wait()?;
            return self.accum_element(row, col, value, op);
        }
        self.pending
            .get_or_insert_with(|| Pending::new(Some(op.clone())))
            .push(j, i, value);
        Ok(())
    }

    /// Deletes entry (row, col), if present
    ///
    /// In a sparse matrix the entry becomes a zombie. A full matrix is
    /// converted to bitmap first.
    pub fn remove_element(&mut self, row: usize, col: usize) -> Result<()> {
        self.ensure_valid()?;
        self.check_bounds(row, col)?;
        if self.pending.is_some() {
            self.wait()?;
        }
        let (j, i) = self.stored_coords(row, col);
        if self.is_sparse_or_hyper() {
            if let Some(p) = self.find_entry(j, i) {
                if let Structure::Hypersparse { i: ci, .. } | Structure::Sparse { i: ci, .. } =
                    &mut self.structure
                {
                    if !is_zombie(ci[p]) {
                        ci[p] = flip_index(ci[p]);
                        self.nzombies += 1;
                    }
                }
            }
            return Ok(());
        }
        if self.is_full() {
            self.full_to_bitmap()?;
        }
        let p = j * self.vlen + i;
        if let Structure::Bitmap { b, nvals } = &mut self.structure {
            if b[p] != 0 {
                b[p] = 0;
                *nvals -= 1;
            }
        }
        Ok(())
    }

    /// Value of entry (row, col), if present; pending insertions are visible
    pub fn extract_element(&self, row: usize, col: usize) -> Result<Option<T>> {
        self.ensure_valid()?;
        self.check_bounds(row, col)?;
        Ok(self.get(row, col))
    }

    /// Finishes all deferred work
    ///
    /// Removes zombies, sorts jumbled vectors, merges pending tuples and
    /// conforms the format. Calling it on a clean matrix does nothing.
    pub fn wait(&mut self) -> Result<()> {
        self.wait_with(&Context::default())
    }

    /// [`Matrix::wait`] with an explicit context
    pub fn wait_with(&mut self, ctx: &Context) -> Result<()> {
        self.ensure_valid()?;
        if self.lifecycle() == Lifecycle::Clean {
            return Ok(());
        }
        self.finalize(ctx)?;
        self.conform_clean(ctx)
    }

    fn finalize(&mut self, ctx: &Context) -> Result<()> {
        if self.nzombies > 0 {
            self.remove_zombies();
        }
        if self.jumbled {
            self.sort_vectors(ctx);
        }
        if let Some(pending) = self.pending.take() {
            tracing::trace!(npending = pending.len(), "assembling pending tuples");
            if let Err(e) = self.assemble_pending(ctx, &pending) {
                self.pending = Some(pending);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Compacts out zombies; empty hypersparse vectors are pruned
    fn remove_zombies(&mut self) {
        let hyper = self.is_hyper();
        let (p, mut h, ci) = match &mut self.structure {
            Structure::Hypersparse { p, h, i } => (p, Some(h), i),
            Structure::Sparse { p, i } => (p, None, i),
            _ => return,
        };
        let iso = self.iso;
        let nvec = p.len() - 1;
        let mut dest = 0;
        let mut kdest = 0;
        let mut pstart = p[0];
        for k in 0..nvec {
            let pend = p[k + 1];
            let vstart = dest;
            for q in pstart..pend {
                if !is_zombie(ci[q]) {
                    ci[dest] = ci[q];
                    if !iso {
                        self.x[dest] = self.x[q];
                    }
                    dest += 1;
                }
            }
            pstart = pend;
            if hyper && dest == vstart {
                continue;
            }
            if let Some(h) = h.as_deref_mut() {
                h[kdest] = h[k];
            }
            p[kdest + 1] = dest;
            kdest += 1;
        }
        p.truncate(kdest + 1);
        if let Some(h) = h {
            h.truncate(kdest);
        }
        ci.truncate(dest);
        if !iso {
            self.x.truncate(dest);
        }
        tracing::trace!(removed = self.nzombies, "zombies removed");
        self.nzombies = 0;
    }

    /// Sorts every vector by index, carrying values along
    fn sort_vectors(&mut self, ctx: &Context) {
        let iso = self.iso;
        let (p, ci) = match &mut self.structure {
            Structure::Hypersparse { p, i, .. } | Structure::Sparse { p, i } => (&*p, i),
            _ => {
                self.jumbled = false;
                return;
            }
        };
        let nthreads = nthreads_for(ci.len() as f64, ctx.chunk, ctx.nthreads_max);
        let index_windows = split_by_offsets(ci, p);
        if iso {
            map_tasks(ctx, nthreads, index_windows, |w: &mut [usize]| w.sort_unstable());
        } else {
            let value_windows = split_by_offsets(&mut self.x, p);
            let work: Vec<_> = index_windows.into_iter().zip(value_windows).collect();
            map_tasks(ctx, nthreads, work, |(wi, wx): (&mut [usize], &mut [T])| {
                if wi.windows(2).all(|w| w[0] < w[1]) {
                    return;
                }
                let mut pairs: Vec<(usize, T)> =
                    wi.iter().copied().zip(wx.iter().copied()).collect();
                pairs.sort_unstable_by_key(|&(i, _)| i);
                for (q, (i, x)) in pairs.into_iter().enumerate() {
                    wi[q] = i;
                    wx[q] = x;
                }
            });
        }
        self.jumbled = false;
    }

    /// Merges the pending tuples into the (clean) structure
    fn assemble_pending(&mut self, ctx: &Context, pending: &Pending<T>) -> Result<()> {
        let dup = pending.dup.clone();
        let mut acc = SortAccumulator::new(pending.tuples.len());
        for &(j, i, v) in &pending.tuples {
            acc.push((j, i), v);
        }
        let (keys, values) = acc.extract_with(|older, newer| match &dup {
            Some(op) => op.apply(older, newer),
            None => newer,
        });
        let tuples = Matrix::from_sorted_keys(self.vlen, self.vdim, self.by_col, &keys, values)?;

        // entries already in the structure are combined with the same operator
        let op = dup.unwrap_or(BinaryOp::Second);
        let merged = union_matrices(ctx, self, &tuples, &op)?;
        self.replace_content(merged);
        Ok(())
    }

    /// Writes `value` (or `op(old, value)`) at position `p` of a sparse matrix
    fn write_slot(&mut self, p: usize, value: T, op: Option<&BinaryOp<T>>) -> Result<()> {
        let zombie = match &mut self.structure {
            Structure::Hypersparse { i, .. } | Structure::Sparse { i, .. } => {
                let zombie = is_zombie(i[p]);
                if zombie {
                    i[p] = unflip_index(i[p]);
                }
                zombie
            }
            _ => false,
        };
        let new = match op {
            Some(op) if !zombie => op.apply(self.value_at(p), value),
            _ => value,
        };
        if zombie {
            self.nzombies -= 1;
        }
        self.store_value(p, new)
    }

    /// Writes into a bitmap or full matrix at (j, i)
    fn write_dense(&mut self, j: usize, i: usize, value: T, op: Option<&BinaryOp<T>>) -> Result<()> {
        let p = j * self.vlen + i;
        let present = self.present_at(p);
        let new = match op {
            Some(op) if present => op.apply(self.value_at(p), value),
            _ => value,
        };
        if let Structure::Bitmap { b, nvals } = &mut self.structure {
            if b[p] == 0 {
                b[p] = 1;
                *nvals += 1;
            }
        }
        self.store_value(p, new)
    }

    /// Stores a value at position `p`, expanding an iso matrix when it differs
    fn store_value(&mut self, p: usize, value: T) -> Result<()> {
        if self.iso {
            if self.x[0] == value {
                return Ok(());
            }
            self.expand_iso()?;
        }
        self.x[p] = value;
        Ok(())
    }

    /// Converts a full matrix to a bitmap with every bit set
    pub(crate) fn full_to_bitmap(&mut self) -> Result<()> {
        let n = self.vlen * self.vdim;
        let b = try_vec(n, 1u8)?;
        self.structure = Structure::Bitmap { b, nvals: n };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Sparsity, SparsityControl};

    fn sparse_sample() -> Matrix<i64> {
        let mut m = Matrix::build(3, 3, &[0, 1, 2], &[0, 1, 2], &[1, 2, 3], None).unwrap();
        m.set_sparsity_control(SparsityControl::SPARSE);
        m.convert_to(Sparsity::Sparse).unwrap();
        m
    }

    #[test]
    fn test_set_element_goes_pending() {
        let mut m = sparse_sample();
        m.set_element(0, 2, 10).unwrap();
        m.set_element(0, 2, 11).unwrap();
        assert_eq!(m.lifecycle(), Lifecycle::Dirty);
        assert_eq!(m.npending(), 2);
        assert_eq!(m.nvals(), 4);
        assert_eq!(m.get(0, 2), Some(11));
        m.wait().unwrap();
        assert_eq!(m.lifecycle(), Lifecycle::Clean);
        assert_eq!(m.get(0, 2), Some(11));
        assert_eq!(m.nvals(), 4);
        assert!(m.check().is_ok());
    }

    #[test]
    fn test_existing_entry_updates_in_place() {
        let mut m = sparse_sample();
        m.set_element(1, 1, 20).unwrap();
        assert_eq!(m.npending(), 0);
        assert_eq!(m.get(1, 1), Some(20));
    }

    #[test]
    fn test_remove_then_revive() {
        let mut m = sparse_sample();
        m.remove_element(1, 1).unwrap();
        assert_eq!(m.nzombies(), 1);
        assert_eq!(m.nvals(), 2);
        assert_eq!(m.get(1, 1), None);
        m.set_element(1, 1, 7).unwrap();
        assert_eq!(m.nzombies(), 0);
        assert_eq!(m.get(1, 1), Some(7));

        m.remove_element(2, 2).unwrap();
        m.wait().unwrap();
        assert_eq!(m.nzombies(), 0);
        assert_eq!(m.nvals(), 2);
        assert!(m.check().is_ok());
    }

    #[test]
    fn test_accum_element_merges_pending() {
        let mut m = sparse_sample();
        m.accum_element(0, 1, 5, &BinaryOp::Plus).unwrap();
        m.accum_element(0, 1, 6, &BinaryOp::Plus).unwrap();
        m.accum_element(0, 0, 6, &BinaryOp::Plus).unwrap();
        assert_eq!(m.get(0, 1), Some(11));
        assert_eq!(m.get(0, 0), Some(7));
        m.wait().unwrap();
        assert_eq!(m.get(0, 1), Some(11));
    }

    #[test]
    fn test_remove_from_full_converts_to_bitmap() {
        let mut m = Matrix::new_full(2, 2, 3i64).unwrap();
        m.remove_element(0, 1).unwrap();
        assert_eq!(m.sparsity(), Sparsity::Bitmap);
        assert_eq!(m.nvals(), 3);
        assert_eq!(m.get(0, 1), None);
        m.set_element(0, 1, 4).unwrap();
        assert!(!m.is_iso());
        assert_eq!(m.get(0, 1), Some(4));
        assert_eq!(m.get(1, 1), Some(3));
    }

    #[test]
    fn test_wait_is_idempotent() {
        let mut m = sparse_sample();
        m.set_element(2, 0, 9).unwrap();
        m.remove_element(0, 0).unwrap();
        m.wait().unwrap();
        let once = m.tuples().unwrap();
        m.wait().unwrap();
        assert_eq!(m.tuples().unwrap(), once);
        assert_eq!(once, vec![(1, 1, 2), (2, 0, 9), (2, 2, 3)]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut m = sparse_sample();
        assert!(m.set_element(3, 0, 1).is_err());
        assert!(m.extract_element(0, 3).is_err());
        assert_eq!(m.extract_element(0, 0).unwrap(), Some(1));
    }
}
