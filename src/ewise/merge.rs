//! Merging one vector of two operands
//!
//! The same walk is used twice: once to count the output entries of each
//! vector (phase 1) and once to write them (phase 2). The [`Sink`] decides
//! which; a counting sink never evaluates the operator.

use crate::constants::INTERSECT_SEARCH_RATIO;
use crate::ewise::cursor::Cursor;
use crate::ewise::MergeKind;
use crate::mask::MaskColumn;
use crate::matrix::Matrix;
use crate::ops::{Kernel, Scalar};

/// Receives the output entries of a vector in ascending index order
pub(crate) trait Sink<T> {
    fn push<F: FnOnce() -> T>(&mut self, i: usize, value: F);
}

/// Counts entries without computing values
#[derive(Default)]
pub(crate) struct CountSink {
    pub(crate) count: usize,
}

impl<T> Sink<T> for CountSink {
    #[inline]
    fn push<F: FnOnce() -> T>(&mut self, _i: usize, _value: F) {
        self.count += 1;
    }
}

/// Writes entries into a task's window of the output arrays
///
/// With no value window the output is iso and values are not computed.
pub(crate) struct FillSink<'w, T> {
    pub(crate) ci: &'w mut [usize],
    pub(crate) cx: Option<&'w mut [T]>,
    pub(crate) next: usize,
}

impl<'w, T> FillSink<'w, T> {
    pub(crate) fn new(ci: &'w mut [usize], cx: Option<&'w mut [T]>) -> Self {
        Self { ci, cx, next: 0 }
    }
}

impl<'w, T> Sink<T> for FillSink<'w, T> {
    #[inline]
    fn push<F: FnOnce() -> T>(&mut self, i: usize, value: F) {
        self.ci[self.next] = i;
        if let Some(cx) = self.cx.as_deref_mut() {
            cx[self.next] = value();
        }
        self.next += 1;
    }
}

/// The operands and operator of a merge, resolved once per call
pub(crate) struct Merger<'a, T: Scalar> {
    pub(crate) kind: MergeKind<'a, T>,
    pub(crate) kernel: Option<Kernel<T>>,
    pub(crate) a: &'a Matrix<T>,
    pub(crate) b: &'a Matrix<T>,
}

impl<'a, T: Scalar> Merger<'a, T> {
    pub(crate) fn new(kind: MergeKind<'a, T>, a: &'a Matrix<T>, b: &'a Matrix<T>) -> Self {
        let kernel = match kind {
            MergeKind::Union(op) | MergeKind::Intersection(op) => Some(Kernel::resolve(op)),
            MergeKind::Masker { .. } => None,
        };
        Self { kind, kernel, a, b }
    }

    #[inline]
    fn combine(&self, x: T, y: T) -> T {
        match &self.kernel {
            Some(k) => k.call(x, y),
            None => y,
        }
    }

    /// Merges one vector given cursors over A and B and the mask column
    pub(crate) fn merge_vector<S: Sink<T>>(
        &self,
        mut ca: Cursor<'_>,
        mut cb: Cursor<'_>,
        mask: &mut MaskColumn<'_, T>,
        sink: &mut S,
    ) {
        match self.kind {
            MergeKind::Union(_) => self.union(&mut ca, &mut cb, mask, sink),
            MergeKind::Intersection(_) => self.intersection(&mut ca, &mut cb, mask, sink),
            MergeKind::Masker { replace } => self.masker(&mut ca, &mut cb, mask, replace, sink),
        }
    }

    fn union<S: Sink<T>>(&self, ca: &mut Cursor<'_>, cb: &mut Cursor<'_>, mask: &mut MaskColumn<'_, T>, sink: &mut S) {
        let (a, b) = (self.a, self.b);
        loop {
            let (ia, ib) = (ca.peek(), cb.peek());
            let i = match (ia, ib) {
                (None, None) => break,
                (Some(x), Some(y)) => x.min(y),
                (Some(i), None) | (None, Some(i)) => i,
            };
            let (in_a, in_b) = (ia == Some(i), ib == Some(i));
            if mask.allows(i) {
                let (pa, pb) = (ca.pos(), cb.pos());
                match (in_a, in_b) {
                    (true, true) => sink.push(i, || self.combine(a.value_at(pa), b.value_at(pb))),
                    (true, false) => sink.push(i, || a.value_at(pa)),
                    _ => sink.push(i, || b.value_at(pb)),
                }
            }
            if in_a {
                ca.advance();
            }
            if in_b {
                cb.advance();
            }
        }
    }

    fn intersection<S: Sink<T>>(
        &self,
        ca: &mut Cursor<'_>,
        cb: &mut Cursor<'_>,
        mask: &mut MaskColumn<'_, T>,
        sink: &mut S,
    ) {
        let (a, b) = (self.a, self.b);
        let (na, nb) = (ca.remaining(), cb.remaining());
        let searching = ca.is_sparse()
            && cb.is_sparse()
            && (na.saturating_mul(INTERSECT_SEARCH_RATIO) <= nb
                || nb.saturating_mul(INTERSECT_SEARCH_RATIO) <= na);
        while let (Some(ia), Some(ib)) = (ca.peek(), cb.peek()) {
            if ia < ib {
                if searching {
                    ca.seek(ib);
                } else {
                    ca.advance_to(ib);
                }
            } else if ib < ia {
                if searching {
                    cb.seek(ia);
                } else {
                    cb.advance_to(ia);
                }
            } else {
                if mask.allows(ia) {
                    let (pa, pb) = (ca.pos(), cb.pos());
                    sink.push(ia, || self.combine(a.value_at(pa), b.value_at(pb)));
                }
                ca.advance();
                cb.advance();
            }
        }
    }

    /// A is the current output C, B the new content Z
    fn masker<S: Sink<T>>(
        &self,
        cc: &mut Cursor<'_>,
        cz: &mut Cursor<'_>,
        mask: &mut MaskColumn<'_, T>,
        replace: bool,
        sink: &mut S,
    ) {
        let (c, z) = (self.a, self.b);
        loop {
            let (ic, iz) = (cc.peek(), cz.peek());
            let i = match (ic, iz) {
                (None, None) => break,
                (Some(ic), Some(iz)) => ic.min(iz),
                (Some(i), None) | (None, Some(i)) => i,
            };
            let in_c = ic == Some(i);
            let in_z = iz == Some(i);
            if mask.allows(i) {
                if in_z {
                    let pz = cz.pos();
                    sink.push(i, || z.value_at(pz));
                }
            } else if in_c && !replace {
                let pc = cc.pos();
                sink.push(i, || c.value_at(pc));
            }
            if in_c {
                cc.advance();
            }
            if in_z {
                cz.advance();
            }
        }
    }
}
