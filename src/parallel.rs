//! # Parallel task execution
//!
//! Every parallel region in the crate goes through this module: a list of
//! independent tasks is mapped over the rayon pool of the calling
//! [`Context`], or run inline when only one thread is warranted. Output
//! arrays are never shared between tasks; each task receives its own
//! disjoint `&mut` window carved out at prefix-sum offsets.

use rayon::prelude::*;

use crate::error::Result;
use crate::matrix::config::Context;

/// Maps `f` over `items` with up to `nthreads` threads
///
/// Results come back in the order of `items`, independent of scheduling.
pub fn map_tasks<I, R, F>(ctx: &Context, nthreads: usize, items: Vec<I>, f: F) -> Vec<R>
where
    I: Send,
    R: Send,
    F: Fn(I) -> R + Send + Sync,
{
    if nthreads <= 1 || items.len() <= 1 {
        items.into_iter().map(f).collect()
    } else {
        ctx.install(|| items.into_par_iter().map(f).collect())
    }
}

/// Like [`map_tasks`] for fallible tasks; the first error wins
pub fn try_map_tasks<I, R, F>(ctx: &Context, nthreads: usize, items: Vec<I>, f: F) -> Result<Vec<R>>
where
    I: Send,
    R: Send,
    F: Fn(I) -> Result<R> + Send + Sync,
{
    if nthreads <= 1 || items.len() <= 1 {
        items.into_iter().map(f).collect()
    } else {
        ctx.install(|| items.into_par_iter().map(f).collect())
    }
}

/// Runs `f` on each window of `data` of length `width`, with its window number
pub fn for_each_window<T, F>(ctx: &Context, nthreads: usize, data: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if width == 0 {
        return;
    }
    if nthreads <= 1 {
        data.chunks_mut(width).enumerate().for_each(|(k, w)| f(k, w));
    } else {
        ctx.install(|| {
            data.par_chunks_mut(width)
                .enumerate()
                .for_each(|(k, w)| f(k, w))
        });
    }
}

/// Splits `data` into the disjoint windows `[offsets[t], offsets[t+1])`
///
/// `offsets` must be non-decreasing and end within `data`; entries before
/// `offsets[0]` are not handed out.
pub fn split_by_offsets<'a, T>(data: &'a mut [T], offsets: &[usize]) -> Vec<&'a mut [T]> {
    let mut windows = Vec::with_capacity(offsets.len().saturating_sub(1));
    if offsets.is_empty() {
        return windows;
    }
    let (_, mut rest) = data.split_at_mut(offsets[0]);
    for w in offsets.windows(2) {
        debug_assert!(w[0] <= w[1]);
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(w[1] - w[0]);
        windows.push(head);
        rest = tail;
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_offsets() {
        let mut data: Vec<usize> = (0..10).collect();
        let windows = split_by_offsets(&mut data, &[1, 3, 3, 7]);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0], &[1, 2]);
        assert!(windows[1].is_empty());
        assert_eq!(windows[2], &[3, 4, 5, 6]);
    }

    #[test]
    fn test_map_tasks_preserves_order() {
        let ctx = Context::default();
        let out = map_tasks(&ctx, 4, (0..100).collect(), |x: usize| x * 2);
        assert_eq!(out, (0..100).map(|x| x * 2).collect::<Vec<_>>());

        let seq = map_tasks(&ctx, 1, vec![1, 2, 3], |x: i32| x + 1);
        assert_eq!(seq, vec![2, 3, 4]);
    }

    #[test]
    fn test_try_map_tasks_error() {
        let ctx = Context::default();
        let out = try_map_tasks(&ctx, 2, vec![1, 2, 3], |x: usize| {
            if x == 2 {
                Err(crate::error::Error::OutOfMemory { size: x })
            } else {
                Ok(x)
            }
        });
        assert!(out.is_err());
    }

    #[test]
    fn test_for_each_window() {
        let ctx = Context::default();
        let mut data = vec![0usize; 12];
        for_each_window(&ctx, 3, &mut data, 4, |k, w| {
            for v in w.iter_mut() {
                *v = k;
            }
        });
        assert_eq!(data, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2]);
    }
}
