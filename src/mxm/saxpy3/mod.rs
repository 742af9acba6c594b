//! saxpy3: `C = A*B` one output vector at a time
//!
//! Output vector j is `sum over k in B(:,j) of A(:,k) * B(k,j)`, gathered
//! in a workspace: Gustavson's dense array when the output vectors are
//! short enough, a hash table otherwise. Coarse tasks own whole vectors and
//! a private workspace; fine tasks of a team share the workspace of their
//! vector through atomic cells (see [`crate::accumulator::atomic`]).
//!
//! All operands here are in the orientation of the output: A's vectors
//! have the length of C's vectors and B has one vector per vector of C.
//! Hash workspaces emit vectors unsorted, in which case the result is
//! returned jumbled.

mod coarse;
mod fine;

use crate::accumulator::MaskPolicy;
use crate::error::Result;
use crate::mask::MaskView;
use crate::matrix::{AxbMethod, Context, Matrix};
use crate::ops::{Scalar, SemiringKernel};
use crate::parallel::{map_tasks, try_map_tasks};
use crate::slice::{saxpy_flops, saxpy_slice};
use crate::utils::{prune_empty, try_vec, try_with_capacity};

use coarse::CoarseOutput;

/// How mask entries scattered into a workspace are read
pub(crate) fn mask_policy<T: Scalar>(mask: Option<&MaskView<'_, T>>) -> MaskPolicy {
    match mask {
        None => MaskPolicy::Unmasked,
        Some(view) if view.complement => MaskPolicy::Exclude,
        Some(_) => MaskPolicy::Include,
    }
}

/// Emits `(i, A(i,k) * B(k,j))` for every k among B's entries `[ps, pe)`
#[inline]
pub(crate) fn multiply_range<T: Scalar, F: FnMut(usize, T)>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    (ps, pe): (usize, usize),
    kernel: &SemiringKernel<T>,
    mut emit: F,
) {
    for p in ps..pe {
        if !b.present_at(p) {
            continue;
        }
        let bkj = b.value_at(p);
        let Some(q) = a.find_vector(b.index_at(p)) else {
            continue;
        };
        let (as_, ae) = a.vector_range(q);
        for pa in as_..ae {
            if a.present_at(pa) {
                emit(a.index_at(pa), kernel.multiply(a.value_at(pa), bkj));
            }
        }
    }
}

/// Computes `C<M> = A*B` with saxpy3
pub(crate) fn saxpy3<T: Scalar>(
    ctx: &Context,
    a: &Matrix<T>,
    b: &Matrix<T>,
    mask: Option<&MaskView<'_, T>>,
    kernel: &SemiringKernel<T>,
    method: AxbMethod,
) -> Result<Matrix<T>> {
    debug_assert_eq!(a.by_col, b.by_col);
    debug_assert_eq!(a.vdim, b.vlen);
    let cvlen = a.vlen;
    let nvec = b.nvec();
    let flops = saxpy_flops(ctx, a, b)?;
    let mask_work: Vec<usize> = match mask {
        Some(view) => (0..nvec).map(|k| view.vector_len(b.vector_id(k))).collect(),
        None => Vec::new(),
    };
    let (tasks, nthreads) = saxpy_slice(ctx, a, b, &flops, &mask_work, method);
    tracing::debug!(
        ntasks = tasks.len(),
        nthreads,
        fine = tasks.iter().filter(|t| t.is_fine()).count(),
        flops = flops[nvec],
        "saxpy3"
    );

    // fine teams accumulate into shared workspaces while coarse tasks run
    let workspaces = fine::team_workspaces(&tasks, b, mask, cvlen)?;
    let outputs: Vec<Option<CoarseOutput<T>>> =
        try_map_tasks(ctx, nthreads, (0..tasks.len()).collect(), |t: usize| {
            let task = &tasks[t];
            match task.team {
                Some(team) => {
                    if let Some(ws) = &workspaces[team.leader] {
                        fine::run_fine(a, b, kernel, task, ws);
                    }
                    Ok(None)
                }
                None => coarse::run_coarse(a, b, mask, kernel, task, cvlen, ctx.mark_limit).map(Some),
            }
        })?;
    let gathered = map_tasks(ctx, nthreads, workspaces, |ws| ws.map(fine::SharedWorkspace::gather));

    // stitch the vectors together in task order
    let total: usize = outputs.iter().flatten().map(|o| o.ci.len()).sum::<usize>()
        + gathered.iter().flatten().map(|(ci, _)| ci.len()).sum::<usize>();
    let mut cp = try_vec(nvec + 1, 0usize)?;
    let mut ci = try_with_capacity(total)?;
    let mut cx = try_with_capacity(total)?;
    let mut jumbled = false;
    for ((task, out), team) in tasks.iter().zip(outputs).zip(gathered) {
        if let Some(out) = out {
            for (q, &count) in out.counts.iter().enumerate() {
                cp[task.kfirst + q + 1] = count;
            }
            ci.extend(out.ci);
            cx.extend(out.cx);
            jumbled |= !out.sorted;
        } else if let Some((vi, vx)) = team {
            cp[task.kfirst + 1] = vi.len();
            ci.extend(vi);
            cx.extend(vx);
        }
    }
    for k in 0..nvec {
        cp[k + 1] += cp[k];
    }

    let h = match b.hlist() {
        Some(h) => Some(prune_empty(h.to_vec(), &mut cp)),
        None => None,
    };
    let mut c = Matrix::from_sparse(cvlen, b.vdim, a.by_col, cp, h, ci, cx, false);
    c.jumbled = jumbled;
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{reference_mxm, Sparsity, SparsityControl};
    use crate::ops::Semiring;

    fn by_col(nrows: usize, ncols: usize, t: &[(usize, usize, i64)]) -> Matrix<i64> {
        let rows: Vec<_> = t.iter().map(|e| e.0).collect();
        let cols: Vec<_> = t.iter().map(|e| e.1).collect();
        let vals: Vec<_> = t.iter().map(|e| e.2).collect();
        let mut m = Matrix::build_by_col(nrows, ncols, &rows, &cols, &vals, None).unwrap();
        m.set_sparsity_control(SparsityControl::SPARSE);
        m.convert_to(Sparsity::Sparse).unwrap();
        m
    }

    fn banded(n: usize) -> Matrix<i64> {
        let mut t = Vec::new();
        for j in 0..n {
            for d in 0..3 {
                t.push(((j + d * 7) % n, j, (j + d) as i64 % 5 + 1));
            }
        }
        t.sort_unstable();
        t.dedup_by_key(|e| (e.0, e.1));
        by_col(n, n, &t)
    }

    fn product(ctx: &Context, method: AxbMethod, a: &Matrix<i64>, b: &Matrix<i64>) -> Vec<(usize, usize, i64)> {
        let kernel = SemiringKernel::new(&Semiring::plus_times(), false);
        let mut c = saxpy3(ctx, a, b, None, &kernel, method).unwrap();
        c.wait().unwrap();
        assert!(c.check().is_ok());
        c.tuples().unwrap()
    }

    #[test]
    fn test_workspaces_and_threads_agree() {
        let a = banded(64);
        let b = banded(64);
        let want = reference_mxm(&a, &b, &Semiring::plus_times()).unwrap().tuples();
        let seq = Context::sequential();
        let par = Context::sequential().with_nthreads_max(4).with_chunk(8);
        for method in [AxbMethod::Gustavson, AxbMethod::Hash, AxbMethod::Default] {
            assert_eq!(product(&seq, method, &a, &b), want, "{method:?}");
            assert_eq!(product(&par, method, &a, &b), want, "{method:?} parallel");
        }
    }

    #[test]
    fn test_heavy_column_uses_fine_team() {
        // B's column 0 touches every column of A
        let a = banded(40);
        let mut tb: Vec<(usize, usize, i64)> = (0..40).map(|k| (k, 0, 1)).collect();
        tb.push((3, 5, 2));
        let b = by_col(40, 6, &tb);
        let want = reference_mxm(&a, &b, &Semiring::plus_times()).unwrap().tuples();
        let par = Context::sequential().with_nthreads_max(4).with_chunk(4);
        for method in [AxbMethod::Gustavson, AxbMethod::Hash] {
            assert_eq!(product(&par, method, &a, &b), want, "{method:?}");
        }
    }

    #[test]
    fn test_masked_product() {
        let a = banded(16);
        let b = banded(16);
        let m = by_col(16, 16, &[(0, 0, 1), (7, 0, 1), (3, 3, 0), (10, 9, 1)]);
        let kernel = SemiringKernel::new(&Semiring::plus_times(), false);
        let full = reference_mxm(&a, &b, &Semiring::plus_times()).unwrap();
        for complement in [false, true] {
            let view = MaskView::new(&m, complement, false);
            for method in [AxbMethod::Gustavson, AxbMethod::Hash] {
                let mut c = saxpy3(&Context::sequential(), &a, &b, Some(&view), &kernel, method).unwrap();
                c.wait().unwrap();
                let got = c.tuples().unwrap();
                let want: Vec<_> = full
                    .tuples()
                    .into_iter()
                    .filter(|&(i, j, _)| view.allows(j, i))
                    .collect();
                assert_eq!(got, want, "complement={complement} {method:?}");
            }
        }
    }

    #[test]
    fn test_hypersparse_b_gives_hypersparse_c() {
        let a = banded(10);
        let mut b = Matrix::build_by_col(10, 1000, &[2, 4], &[3, 900], &[1i64, 1], None).unwrap();
        b.convert_to(Sparsity::Hypersparse).unwrap();
        let kernel = SemiringKernel::new(&Semiring::plus_times(), false);
        let c = saxpy3(&Context::sequential(), &a, &b, None, &kernel, AxbMethod::Default).unwrap();
        assert_eq!(c.sparsity(), Sparsity::Hypersparse);
        assert_eq!(c.hlist().unwrap(), &[3, 900]);
    }
}
