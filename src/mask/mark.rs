//! Mark-generation workspace
//!
//! A dense array of marks that can be "cleared" in O(1): each pass takes a
//! fresh range of mark values, and a cell counts as set for the pass only if
//! it holds one of those values. The counter only grows, so when the next
//! pass would go past `limit` the array is zeroed and the counter restarts.

use crate::error::Result;
use crate::utils::try_vec;

/// Dense mark array with an explicit reset limit
#[derive(Debug, Clone)]
pub struct MarkWorkspace {
    marks: Vec<u32>,
    mark: u32,
    limit: u32,
    resets: usize,
}

impl MarkWorkspace {
    /// Creates a workspace of `n` cells that resets before passing `limit`
    pub fn new(n: usize, limit: u32) -> Result<Self> {
        Ok(Self {
            marks: try_vec(n, 0u32)?,
            mark: 1,
            limit: limit.max(16),
            resets: 0,
        })
    }

    /// Starts a pass using the `step` mark values `m..m+step`; returns `m`
    ///
    /// Every cell holds a value below `m` when the pass starts.
    pub fn next_pass(&mut self, step: u32) -> u32 {
        debug_assert!(step >= 1);
        let exceeds = self
            .mark
            .checked_add(step)
            .map_or(true, |end| end > self.limit);
        if exceeds {
            self.marks.iter_mut().for_each(|m| *m = 0);
            self.mark = 1;
            self.resets += 1;
        }
        let m = self.mark;
        self.mark += step;
        m
    }

    #[inline]
    pub fn get(&self, i: usize) -> u32 {
        self.marks[i]
    }

    #[inline]
    pub fn set(&mut self, i: usize, mark: u32) {
        self.marks[i] = mark;
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Number of times the marks were zeroed
    pub fn resets(&self) -> usize {
        self.resets
    }
}
