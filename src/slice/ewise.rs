//! Coarse and fine slicing for element-wise merges

use crate::constants::TASKS_PER_THREAD;
use crate::ewise::Phase0;
use crate::matrix::{Context, Matrix};
use crate::ops::Scalar;
use crate::slice::{nthreads_for, ntasks_for, FineSlice, TaskDescriptor};

/// Entries of vector `k` of `m` whose index lies in `[istart, iend)`
pub(crate) fn entries_between<T: Scalar>(
    m: &Matrix<T>,
    k: Option<usize>,
    istart: usize,
    iend: usize,
) -> (usize, usize) {
    let Some(k) = k else { return (0, 0) };
    let (ps, pe) = m.vector_range(k);
    match m.indices() {
        Some(mi) => {
            let v = &mi[ps..pe];
            (
                ps + v.partition_point(|&i| i < istart),
                ps + v.partition_point(|&i| i < iend),
            )
        }
        None => (ps + istart, ps + iend),
    }
}

fn vector_len<T: Scalar>(m: &Matrix<T>, k: Option<usize>) -> usize {
    k.map_or(0, |k| {
        let (ps, pe) = m.vector_range(k);
        pe - ps
    })
}

/// Slices the output vectors of a merge of `a` and `b` under an optional mask
///
/// The work of an output vector is the number of entries of A, B and M in
/// it. Whole vectors are grouped into coarse tasks of about equal work; a
/// vector whose work alone exceeds a task's share is cut into fine tasks at
/// index quantiles of its larger sparse operand. Returns the tasks in
/// vector order and the thread count.
pub fn ewise_slice<T: Scalar>(
    ctx: &Context,
    phase0: &Phase0,
    a: &Matrix<T>,
    b: &Matrix<T>,
    mask: Option<&Matrix<T>>,
) -> (Vec<TaskDescriptor>, usize) {
    let nvec = phase0.nvec();
    if nvec == 0 {
        return (Vec::new(), 1);
    }
    let vlen = a.vlen;

    let work: Vec<usize> = (0..nvec)
        .map(|k| {
            let wm = match mask {
                Some(m) if m.is_sparse_or_hyper() => vector_len(m, m.find_vector(phase0.ch[k])),
                _ => 0,
            };
            vector_len(a, phase0.to_a[k]) + vector_len(b, phase0.to_b[k]) + wm + 1
        })
        .collect();
    let total: usize = work.iter().sum();
    let nthreads = nthreads_for(total as f64, ctx.chunk, ctx.nthreads_max);
    if nthreads == 1 {
        return (vec![TaskDescriptor::coarse(0, nvec - 1)], 1);
    }

    let ntasks = ntasks_for(nthreads, total);
    let target = (total as f64 / ntasks as f64).max(1.0);
    let max_team = TASKS_PER_THREAD * nthreads;

    let mut tasks = Vec::with_capacity(ntasks + 1);
    let mut kstart = 0;
    let mut acc = 0.0;
    for (k, &w) in work.iter().enumerate() {
        let w = w as f64;
        if w > target && vlen > 1 {
            if kstart < k {
                tasks.push(TaskDescriptor::coarse(kstart, k - 1));
            }
            let nfine = ((w / target).ceil() as usize).clamp(2, max_team).min(vlen);
            split_vector(phase0, a, b, k, nfine, &mut tasks);
            kstart = k + 1;
            acc = 0.0;
            continue;
        }
        acc += w;
        if acc >= target {
            tasks.push(TaskDescriptor::coarse(kstart, k));
            kstart = k + 1;
            acc = 0.0;
        }
    }
    if kstart < nvec {
        tasks.push(TaskDescriptor::coarse(kstart, nvec - 1));
    }
    tracing::trace!(nthreads, ntasks = tasks.len(), total, "ewise slice");
    (tasks, nthreads)
}

/// Cuts output vector k into `nfine` tasks over its index range
fn split_vector<T: Scalar>(
    phase0: &Phase0,
    a: &Matrix<T>,
    b: &Matrix<T>,
    k: usize,
    nfine: usize,
    tasks: &mut Vec<TaskDescriptor>,
) {
    let vlen = a.vlen;
    let (ka, kb) = (phase0.to_a[k], phase0.to_b[k]);
    let len_a = if a.is_sparse_or_hyper() { vector_len(a, ka) } else { 0 };
    let len_b = if b.is_sparse_or_hyper() { vector_len(b, kb) } else { 0 };

    // the larger sparse operand drives the cut points
    let driver = if len_a >= len_b { (a, ka, len_a) } else { (b, kb, len_b) };
    let mut cuts = Vec::with_capacity(nfine + 1);
    cuts.push(0);
    for t in 1..nfine {
        let cut = match driver {
            (m, Some(km), len) if len > 0 => {
                let (ps, _) = m.vector_range(km);
                m.index_at(ps + t * len / nfine)
            }
            _ => t * vlen / nfine,
        };
        let prev = cuts[t - 1];
        cuts.push(cut.max(prev));
    }
    cuts.push(vlen);

    for w in cuts.windows(2) {
        let (istart, iend) = (w[0], w[1]);
        tasks.push(TaskDescriptor::fine(
            k,
            FineSlice {
                istart,
                iend,
                pa: entries_between(a, ka, istart, iend),
                pb: entries_between(b, kb, istart, iend),
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ewise::phase0;
    use crate::ewise::MergeKind;
    use crate::matrix::Sparsity;
    use crate::ops::BinaryOp;

    fn column_heavy(n: usize) -> Matrix<f64> {
        // column 0 full, a few entries elsewhere
        let mut rows: Vec<usize> = (0..n).collect();
        let mut cols = vec![0; n];
        rows.extend([1, 5]);
        cols.extend([1, 3]);
        let vals = vec![1.0; rows.len()];
        let mut m = Matrix::build_by_col(n, 4, &rows, &cols, &vals, None).unwrap();
        m.set_sparsity_control(crate::matrix::SparsityControl::SPARSE);
        m.convert_to(Sparsity::Sparse).unwrap();
        m
    }

    #[test]
    fn test_single_thread_is_one_coarse_task() {
        let a = column_heavy(100);
        let p0 = phase0(&a, &a, None, MergeKind::Union(&BinaryOp::Plus)).unwrap();
        let (tasks, nthreads) = ewise_slice(&Context::sequential(), &p0, &a, &a, None);
        assert_eq!(nthreads, 1);
        assert_eq!(tasks, vec![TaskDescriptor::coarse(0, 3)]);
    }

    #[test]
    fn test_heavy_vector_becomes_fine_tasks() {
        let a = column_heavy(1000);
        let b = column_heavy(1000);
        let ctx = Context::sequential().with_nthreads_max(4).with_chunk(1);
        let p0 = phase0(&a, &b, None, MergeKind::Union(&BinaryOp::Plus)).unwrap();
        let (tasks, nthreads) = ewise_slice(&ctx, &p0, &a, &b, None);
        assert_eq!(nthreads, 4);

        let fine: Vec<_> = tasks.iter().filter(|t| t.is_fine()).collect();
        assert!(fine.len() >= 2);
        assert!(fine.iter().all(|t| t.kfirst == 0));

        // fine index ranges tile [0, vlen) and entry ranges tile the vector
        let mut next_i = 0;
        let mut next_pa = 0;
        for t in &fine {
            let f = t.fine.unwrap();
            assert_eq!(f.istart, next_i);
            assert_eq!(f.pa.0, next_pa);
            next_i = f.iend;
            next_pa = f.pa.1;
        }
        assert_eq!(next_i, 1000);
        assert_eq!(next_pa, 1000);

        // every vector is covered exactly once, in order
        let mut k = 0;
        for t in &tasks {
            if t.is_fine() {
                assert!(t.kfirst == k || t.kfirst + 1 == k);
                k = t.kfirst + 1;
            } else {
                assert_eq!(t.kfirst, k);
                k = t.klast + 1;
            }
        }
        assert_eq!(k, 4);
    }
}
