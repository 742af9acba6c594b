//! Flop-balanced slicing for saxpy3
//!
//! The work of output vector j is the number of multiply-adds it needs,
//! `flops(j) = sum over k in B(:,j) of |A(:,k)|`, plus the entries of the
//! mask in that vector. Light vectors are grouped into coarse tasks, each
//! with a private workspace. A vector heavier than a task's share is split
//! over its entries of B into a team of fine tasks sharing one workspace.

use crate::constants::{MIN_HASH_SIZE, TASKS_PER_THREAD};
use crate::error::Result;
use crate::matrix::{AxbMethod, Context, Matrix};
use crate::ops::Scalar;
use crate::parallel::map_tasks;
use crate::slice::{nthreads_for, ntasks_for, p_slice};
use crate::utils::{next_pow2, try_vec};

/// The workspace a saxpy3 task accumulates into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceKind {
    /// Dense workspace over the whole output vector
    Gustavson,
    /// Open-addressing table with `size` slots (a power of two)
    Hash { size: usize },
}

/// The fine tasks sharing one output vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    /// Position of the team's first task in the task list
    pub leader: usize,
    /// Number of tasks in the team
    pub size: usize,
}

/// One unit of work of saxpy3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaxpyTask {
    /// First and last vector of B, as positions in B's vector list
    pub kfirst: usize,
    pub klast: usize,
    /// For a fine task, its entries `[pstart, pend)` of B's vector `kfirst`
    pub fine: Option<(usize, usize)>,
    pub team: Option<Team>,
    pub workspace: WorkspaceKind,
}

impl SaxpyTask {
    pub fn is_fine(&self) -> bool {
        self.fine.is_some()
    }

    /// True for the first task of a team, and for every coarse task
    pub fn leads(&self, t: usize) -> bool {
        self.team.map_or(true, |team| team.leader == t)
    }
}

/// Entries of A's vector `k` (a vector id), or `vlen` for a dense A
#[inline]
pub(crate) fn vector_work<T: Scalar>(a: &Matrix<T>, k: usize) -> usize {
    a.find_vector(k).map_or(0, |q| {
        let (ps, pe) = a.vector_range(q);
        pe - ps
    })
}

/// Cumulative flops of C = A*B over B's stored vectors (length `nvec + 1`)
pub fn saxpy_flops<T: Scalar>(ctx: &Context, a: &Matrix<T>, b: &Matrix<T>) -> Result<Vec<usize>> {
    let nvec = b.nvec();
    let nthreads = nthreads_for(b.nnz_slots() as f64, ctx.chunk, ctx.nthreads_max);
    let ntasks = ntasks_for(nthreads, nvec);
    let per_task = nvec.div_ceil(ntasks.max(1)).max(1);
    let ranges: Vec<(usize, usize)> = (0..nvec)
        .step_by(per_task)
        .map(|k| (k, (k + per_task).min(nvec)))
        .collect();
    let parts = map_tasks(ctx, nthreads, ranges, |(k0, k1)| {
        (k0..k1)
            .map(|kb| {
                let (ps, pe) = b.vector_range(kb);
                (ps..pe)
                    .filter(|&p| b.present_at(p))
                    .map(|p| vector_work(a, b.index_at(p)))
                    .sum::<usize>()
            })
            .collect::<Vec<usize>>()
    });
    let mut flops = try_vec(nvec + 1, 0usize)?;
    for (kb, f) in parts.into_iter().flatten().enumerate() {
        flops[kb + 1] = flops[kb].saturating_add(f);
    }
    Ok(flops)
}

/// Workspace for vectors of at most `work` products and mask entries
pub fn choose_workspace(work: usize, cvlen: usize, ratio: f64, method: AxbMethod) -> WorkspaceKind {
    let size = next_pow2(2 * work.min(cvlen).max(1)).max(MIN_HASH_SIZE);
    match method {
        AxbMethod::Gustavson => WorkspaceKind::Gustavson,
        AxbMethod::Hash => WorkspaceKind::Hash { size },
        _ if size as f64 >= ratio * cvlen as f64 => WorkspaceKind::Gustavson,
        _ => WorkspaceKind::Hash { size },
    }
}

/// Slices the vectors of B into saxpy3 tasks
///
/// `flops` comes from [`saxpy_flops`]; `mask_work[k]` is the number of mask
/// entries in output vector k. Returns the tasks in vector order and the
/// thread count.
pub fn saxpy_slice<T: Scalar>(
    ctx: &Context,
    a: &Matrix<T>,
    b: &Matrix<T>,
    flops: &[usize],
    mask_work: &[usize],
    method: AxbMethod,
) -> (Vec<SaxpyTask>, usize) {
    let nvec = b.nvec();
    if nvec == 0 {
        return (Vec::new(), 1);
    }
    let cvlen = a.vlen;
    let ratio = ctx.gustavson_ratio;
    let work = |k: usize| flops[k + 1] - flops[k] + mask_work.get(k).copied().unwrap_or(0);
    let coarse = |kfirst: usize, klast: usize| {
        let max = (kfirst..=klast).map(work).max().unwrap_or(0);
        SaxpyTask {
            kfirst,
            klast,
            fine: None,
            team: None,
            workspace: choose_workspace(max, cvlen, ratio, method),
        }
    };

    let total = (0..nvec).map(|k| work(k) + 1).sum::<usize>();
    let nthreads = nthreads_for(total as f64, ctx.chunk, ctx.nthreads_max);
    if nthreads == 1 {
        return (vec![coarse(0, nvec - 1)], 1);
    }

    let ntasks = ntasks_for(nthreads, total);
    let target = (total as f64 / ntasks as f64).max(1.0);
    let max_team = TASKS_PER_THREAD * nthreads;
    let mut tasks = Vec::with_capacity(ntasks + 1);
    let mut kstart = 0;
    let mut acc = 0.0;
    for k in 0..nvec {
        let w = (work(k) + 1) as f64;
        let (ps, pe) = b.vector_range(k);
        if w > target && pe - ps > 1 {
            if kstart < k {
                tasks.push(coarse(kstart, k - 1));
            }
            let nfine = ((w / target).ceil() as usize).clamp(2, max_team).min(pe - ps);
            split_vector(a, b, k, nfine, choose_workspace(work(k), cvlen, ratio, method), &mut tasks);
            kstart = k + 1;
            acc = 0.0;
            continue;
        }
        acc += w;
        if acc >= target {
            tasks.push(coarse(kstart, k));
            kstart = k + 1;
            acc = 0.0;
        }
    }
    if kstart < nvec {
        tasks.push(coarse(kstart, nvec - 1));
    }
    tracing::trace!(nthreads, ntasks = tasks.len(), total, "saxpy3 slice");
    (tasks, nthreads)
}

/// Cuts B's vector k into a team of up to `nfine` tasks of about equal flops
fn split_vector<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    k: usize,
    nfine: usize,
    workspace: WorkspaceKind,
    tasks: &mut Vec<SaxpyTask>,
) {
    let (ps, pe) = b.vector_range(k);
    let mut cum = Vec::with_capacity(pe - ps + 1);
    cum.push(0usize);
    for p in ps..pe {
        let f = if b.present_at(p) { vector_work(a, b.index_at(p)) } else { 0 };
        // every entry counts, so no cut point falls on an empty range
        cum.push(cum[cum.len() - 1] + f + 1);
    }
    let cuts = p_slice(&cum, nfine);
    let leader = tasks.len();
    let ranges: Vec<(usize, usize)> = cuts
        .windows(2)
        .filter(|w| w[1] > w[0])
        .map(|w| (ps + w[0], ps + w[1]))
        .collect();
    let team = Team {
        leader,
        size: ranges.len(),
    };
    for range in ranges {
        tasks.push(SaxpyTask {
            kfirst: k,
            klast: k,
            fine: Some(range),
            team: Some(team),
            workspace,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{Sparsity, SparsityControl};

    fn sparse_by_col(n: usize, ncols: usize, t: &[(usize, usize)]) -> Matrix<f64> {
        let rows: Vec<_> = t.iter().map(|e| e.0).collect();
        let cols: Vec<_> = t.iter().map(|e| e.1).collect();
        let mut m = Matrix::build_by_col(n, ncols, &rows, &cols, &vec![1.0; t.len()], None).unwrap();
        m.set_sparsity_control(SparsityControl::SPARSE);
        m.convert_to(Sparsity::Sparse).unwrap();
        m
    }

    #[test]
    fn test_flops() {
        // A has 2 entries in column 0 and 1 in column 2
        let a = sparse_by_col(4, 3, &[(0, 0), (1, 0), (3, 2)]);
        let b = sparse_by_col(3, 2, &[(0, 0), (2, 0), (1, 1)]);
        let flops = saxpy_flops(&Context::sequential(), &a, &b).unwrap();
        assert_eq!(flops, vec![0, 3, 3]);
    }

    #[test]
    fn test_choose_workspace() {
        assert_eq!(choose_workspace(3, 1 << 20, 1.0 / 16.0, AxbMethod::Default), WorkspaceKind::Hash { size: 8 });
        assert_eq!(choose_workspace(3, 16, 1.0 / 16.0, AxbMethod::Default), WorkspaceKind::Gustavson);
        assert_eq!(choose_workspace(0, 1 << 20, 1.0 / 16.0, AxbMethod::Default), WorkspaceKind::Hash { size: 4 });
        assert_eq!(choose_workspace(3, 16, 1.0 / 16.0, AxbMethod::Hash), WorkspaceKind::Hash { size: 8 });
        assert_eq!(choose_workspace(3, 1 << 20, 1.0, AxbMethod::Gustavson), WorkspaceKind::Gustavson);
    }

    #[test]
    fn test_sequential_is_one_coarse_task() {
        let a = sparse_by_col(10, 10, &[(0, 0), (5, 3)]);
        let flops = saxpy_flops(&Context::sequential(), &a, &a).unwrap();
        let (tasks, nthreads) = saxpy_slice(&Context::sequential(), &a, &a, &flops, &[], AxbMethod::Default);
        assert_eq!(nthreads, 1);
        assert_eq!(tasks.len(), 1);
        assert_eq!((tasks[0].kfirst, tasks[0].klast), (0, 9));
        assert!(!tasks[0].is_fine());
    }

    #[test]
    fn test_heavy_vector_forms_a_team() {
        // A: every column has 20 entries; B: column 0 has 50 entries, others one
        let mut ta = Vec::new();
        for j in 0..50 {
            for i in 0..20 {
                ta.push(((i * 7 + j) % 100, j));
            }
        }
        ta.sort_unstable();
        ta.dedup();
        let a = sparse_by_col(100, 50, &ta);
        let mut tb: Vec<(usize, usize)> = (0..50).map(|k| (k, 0)).collect();
        tb.extend((1..8).map(|j| (j, j)));
        let b = sparse_by_col(50, 8, &tb);

        let ctx = Context::sequential().with_nthreads_max(4).with_chunk(1);
        let flops = saxpy_flops(&ctx, &a, &b).unwrap();
        let (tasks, nthreads) = saxpy_slice(&ctx, &a, &b, &flops, &[], AxbMethod::Default);
        assert_eq!(nthreads, 4);

        let team: Vec<(usize, &SaxpyTask)> = tasks.iter().enumerate().filter(|(_, t)| t.is_fine()).collect();
        assert!(team.len() >= 2);
        let leader = team[0].0;
        let mut next = b.vector_range(0).0;
        for (t, task) in &team {
            assert_eq!(task.kfirst, 0);
            assert_eq!(task.team, Some(Team { leader, size: team.len() }));
            assert_eq!(task.leads(*t), *t == leader);
            let (ps, pe) = task.fine.unwrap();
            assert_eq!(ps, next);
            assert!(pe > ps);
            next = pe;
        }
        assert_eq!(next, b.vector_range(0).1);

        // the coarse tasks cover the remaining vectors in order
        let mut k = 1;
        for task in tasks.iter().filter(|t| !t.is_fine()) {
            assert_eq!(task.kfirst, k);
            k = task.klast + 1;
        }
        assert_eq!(k, 8);
    }
}
