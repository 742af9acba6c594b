//! Phases 1 and 2 of a sparse or hypersparse merge

use std::iter;

use crate::error::Result;
use crate::ewise::cursor::Cursor;
use crate::ewise::merge::{CountSink, FillSink, Merger};
use crate::ewise::{phase0, MergeKind, Phase0};
use crate::mask::{MaskColumn, MaskView};
use crate::matrix::{Context, Matrix};
use crate::ops::Scalar;
use crate::parallel::map_tasks;
use crate::slice::{ewise_slice, task_cumsum, TaskDescriptor};
use crate::utils::{prune_empty, try_vec};

/// Cursors and mask column for output vector k, restricted to a fine slice if any
fn vector_inputs<'m, T: Scalar>(
    p0: &Phase0,
    a: &'m Matrix<T>,
    b: &'m Matrix<T>,
    mask: Option<&MaskView<'m, T>>,
    task: &TaskDescriptor,
    k: usize,
) -> (Cursor<'m>, Cursor<'m>, MaskColumn<'m, T>) {
    let (ka, kb, j) = (p0.to_a[k], p0.to_b[k], p0.ch[k]);
    match task.fine {
        Some(f) => (
            Cursor::new(a, ka, f.pa, f.istart, f.iend),
            Cursor::new(b, kb, f.pb, f.istart, f.iend),
            MaskColumn::for_vector(mask, j, f.istart),
        ),
        None => (
            Cursor::whole(a, ka),
            Cursor::whole(b, kb),
            MaskColumn::for_vector(mask, j, 0),
        ),
    }
}

pub(super) fn merge_sparse<T: Scalar>(
    ctx: &Context,
    kind: MergeKind<'_, T>,
    mask: Option<&MaskView<'_, T>>,
    a: &Matrix<T>,
    b: &Matrix<T>,
    iso: Option<T>,
) -> Result<Matrix<T>> {
    let p0 = phase0(a, b, mask, kind)?;
    let nvec = p0.nvec();
    let (mut tasks, nthreads) = ewise_slice(ctx, &p0, a, b, mask.map(|v| v.m));
    let merger = Merger::new(kind, a, b);

    // phase 1: count the entries of each vector, or of each fine slice
    let counts: Vec<Vec<usize>> = map_tasks(ctx, nthreads, tasks.clone(), |task: TaskDescriptor| {
        (task.kfirst..=task.klast)
            .map(|k| {
                let (ca, cb, mut mc) = vector_inputs(&p0, a, b, mask, &task, k);
                let mut sink = CountSink::default();
                merger.merge_vector(ca, cb, &mut mc, &mut sink);
                sink.count
            })
            .collect()
    });

    let mut cp = try_vec(nvec + 1, 0usize)?;
    let mut fine_counts = vec![0; tasks.len()];
    for (t, (task, c)) in tasks.iter().zip(&counts).enumerate() {
        if task.is_fine() {
            fine_counts[t] = c[0];
        } else {
            cp[task.kfirst..=task.klast].copy_from_slice(c);
        }
    }
    drop(counts);
    task_cumsum(&mut cp, &mut tasks, &fine_counts);
    let nnz = cp[nvec];

    // phase 2: every task fills its own range
    let mut ci = try_vec(nnz, 0usize)?;
    let mut cx = match iso {
        Some(v) => vec![v],
        None => try_vec(nnz, T::zero())?,
    };
    if !tasks.is_empty() {
        let offsets: Vec<usize> = tasks
            .iter()
            .map(|t| t.pc)
            .chain(iter::once(tasks[tasks.len() - 1].pc_end))
            .collect();
        let index_windows = crate::parallel::split_by_offsets(&mut ci, &offsets);
        let value_windows: Vec<Option<&mut [T]>> = if iso.is_some() {
            index_windows.iter().map(|_| None).collect()
        } else {
            crate::parallel::split_by_offsets(&mut cx, &offsets)
                .into_iter()
                .map(Some)
                .collect()
        };
        let work: Vec<_> = tasks
            .iter()
            .copied()
            .zip(index_windows)
            .zip(value_windows)
            .collect();
        map_tasks(ctx, nthreads, work, |((task, wi), wx): ((TaskDescriptor, &mut [usize]), Option<&mut [T]>)| {
            let mut sink = FillSink::new(wi, wx);
            for k in task.kfirst..=task.klast {
                let (ca, cb, mut mc) = vector_inputs(&p0, a, b, mask, &task, k);
                merger.merge_vector(ca, cb, &mut mc, &mut sink);
            }
            debug_assert_eq!(sink.next, task.pc_end - task.pc);
        });
    }

    let h = if p0.hyper {
        let Phase0 { ch, .. } = p0;
        Some(prune_empty(ch, &mut cp))
    } else {
        None
    };
    Ok(Matrix::from_sparse(
        a.vlen,
        a.vdim,
        a.by_col,
        cp,
        h,
        ci,
        cx,
        iso.is_some(),
    ))
}
