//! Fine saxpy3 tasks: one output vector split across a team

use crate::accumulator::{SharedGustavson, SharedHash};
use crate::error::Result;
use crate::mask::MaskView;
use crate::matrix::Matrix;
use crate::ops::{Scalar, SemiringKernel};
use crate::slice::{SaxpyTask, WorkspaceKind};

use super::{mask_policy, multiply_range};

pub(crate) enum SharedWorkspace<T: Scalar> {
    Gustavson(SharedGustavson<T>),
    Hash(SharedHash<T>),
}

impl<T: Scalar> SharedWorkspace<T> {
    fn scatter_mask(&mut self, i: usize) {
        match self {
            SharedWorkspace::Gustavson(ws) => ws.scatter_mask(i),
            SharedWorkspace::Hash(ws) => ws.scatter_mask(i),
        }
    }

    #[inline]
    fn accumulate(&self, i: usize, val: T, kernel: &SemiringKernel<T>) {
        match self {
            SharedWorkspace::Gustavson(ws) => ws.accumulate(i, val, &kernel.add),
            SharedWorkspace::Hash(ws) => ws.accumulate(i, val, &kernel.add),
        }
    }

    /// The team's vector, sorted by index
    pub(crate) fn gather(self) -> (Vec<usize>, Vec<T>) {
        let (mut ci, mut cx) = (Vec::new(), Vec::new());
        match self {
            SharedWorkspace::Gustavson(ws) => ws.gather(&mut ci, &mut cx),
            SharedWorkspace::Hash(ws) => ws.gather(&mut ci, &mut cx),
        }
        (ci, cx)
    }
}

/// One workspace per task slot: `Some` at each team leader, `None` elsewhere
///
/// Mask entries of the team's vector are scattered before any task runs.
pub(crate) fn team_workspaces<T: Scalar>(
    tasks: &[SaxpyTask],
    b: &Matrix<T>,
    mask: Option<&MaskView<'_, T>>,
    cvlen: usize,
) -> Result<Vec<Option<SharedWorkspace<T>>>> {
    let policy = mask_policy(mask);
    let mut workspaces = Vec::with_capacity(tasks.len());
    for (t, task) in tasks.iter().enumerate() {
        if !task.is_fine() || !task.leads(t) {
            workspaces.push(None);
            continue;
        }
        let mut ws = match task.workspace {
            WorkspaceKind::Gustavson => SharedWorkspace::Gustavson(SharedGustavson::new(cvlen, policy)?),
            WorkspaceKind::Hash { size } => SharedWorkspace::Hash(SharedHash::new(size, policy)?),
        };
        if let Some(view) = mask {
            view.for_each_true(b.vector_id(task.kfirst), |i| ws.scatter_mask(i));
        }
        workspaces.push(Some(ws));
    }
    Ok(workspaces)
}

/// Accumulates the task's slice of B's vector into the team workspace
pub(crate) fn run_fine<T: Scalar>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    kernel: &SemiringKernel<T>,
    task: &SaxpyTask,
    ws: &SharedWorkspace<T>,
) {
    if let Some(range) = task.fine {
        multiply_range(a, b, range, kernel, |i, t| ws.accumulate(i, t, kernel));
    }
}
