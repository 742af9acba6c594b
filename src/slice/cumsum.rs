//! Output offsets for a mix of coarse and fine tasks

use crate::slice::TaskDescriptor;
use crate::utils::cumsum_in_place;

/// Turns per-vector counts into output pointers and gives every task its range
///
/// On entry `cp[k]` holds the entry count of vector k for vectors owned by
/// coarse tasks, and zero for vectors split into fine tasks, whose counts
/// are in `fine_counts` (indexed like `tasks`). The trailing slot of `cp`
/// is ignored. On return `cp` is the pointer array of the output and each
/// task has its disjoint output range `[pc, pc_end)`. Returns the number of
/// non-empty vectors.
pub fn task_cumsum(cp: &mut [usize], tasks: &mut [TaskDescriptor], fine_counts: &[usize]) -> usize {
    debug_assert_eq!(tasks.len(), fine_counts.len());
    let nvec = cp.len() - 1;
    cp[nvec] = 0;
    for (task, &count) in tasks.iter().zip(fine_counts) {
        if task.is_fine() {
            cp[task.kfirst] += count;
        }
    }
    let nonempty = cumsum_in_place(cp);

    // fine tasks of one vector are adjacent and ordered by index range
    let mut team_offset = 0;
    let mut team_vector = usize::MAX;
    for (task, &count) in tasks.iter_mut().zip(fine_counts) {
        if task.is_fine() {
            let k = task.kfirst;
            if k != team_vector {
                team_vector = k;
                team_offset = cp[k];
            }
            task.pc = team_offset;
            task.pc_end = team_offset + count;
            team_offset = task.pc_end;
        } else {
            team_vector = usize::MAX;
            task.pc = cp[task.kfirst];
            task.pc_end = cp[task.klast + 1];
        }
    }
    nonempty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::FineSlice;

    #[test]
    fn test_mixed_tasks_partition_the_output() {
        // vectors 0-1 coarse, vector 2 split in three, vector 3 coarse
        let mut tasks = vec![
            TaskDescriptor::coarse(0, 1),
            TaskDescriptor::fine(2, FineSlice::default()),
            TaskDescriptor::fine(2, FineSlice::default()),
            TaskDescriptor::fine(2, FineSlice::default()),
            TaskDescriptor::coarse(3, 3),
        ];
        let fine_counts = [0, 4, 0, 6, 0];
        let mut cp = vec![2, 3, 0, 1, 0];
        let nonempty = task_cumsum(&mut cp, &mut tasks, &fine_counts);

        assert_eq!(cp, vec![0, 2, 5, 15, 16]);
        assert_eq!(nonempty, 4);
        let ranges: Vec<_> = tasks.iter().map(|t| (t.pc, t.pc_end)).collect();
        assert_eq!(ranges, vec![(0, 5), (5, 9), (9, 9), (9, 15), (15, 16)]);
    }

    #[test]
    fn test_scenario_thousand_entries_four_threads() {
        use crate::slice::{ek_slice_ptr, nthreads_for};

        // one vector of 1000 entries, split into fine tasks per thread
        let nthreads = nthreads_for(1000.0, 1, 4);
        assert_eq!(nthreads, 4);
        let slices = ek_slice_ptr(&[0, 1000], nthreads);
        let mut tasks: Vec<_> = slices
            .iter()
            .map(|s| TaskDescriptor::fine(0, FineSlice { pa: (s.pstart, s.pend), ..FineSlice::default() }))
            .collect();
        let counts: Vec<usize> = slices.iter().map(|s| s.pend - s.pstart).collect();
        let mut cp = vec![0, 0];
        task_cumsum(&mut cp, &mut tasks, &counts);

        assert_eq!(cp, vec![0, 1000]);
        let mut next = 0;
        for t in &tasks {
            assert_eq!(t.pc, next);
            next = t.pc_end;
        }
        assert_eq!(next, 1000);
        assert_eq!(tasks.len(), 4);
    }
}
