//! Workspaces shared by a team of fine tasks
//!
//! When one output vector is too heavy for a single task, its work is split
//! across a team that accumulates into one shared workspace. Each cell has
//! an atomic state byte; a task takes the cell by moving it to `LOCKED`,
//! writes the value, and publishes it by storing `FILLED` with release
//! ordering. Mask entries are scattered before the team starts and are
//! read-only afterwards.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::accumulator::hash::hash_index;
use crate::accumulator::MaskPolicy;
use crate::error::Result;
use crate::ops::{Kernel, Scalar};
use crate::utils::{next_pow2, try_with_capacity};

const EMPTY: u8 = 0;
const LOCKED: u8 = 1;
const FILLED: u8 = 2;
const BLOCKED: u8 = 3;
const ALLOWED: u8 = 4;

const NO_KEY: usize = usize::MAX;

/// Value cells written only by the task holding the cell's lock
struct Cells<T>(Vec<UnsafeCell<T>>);

// SAFETY: every access to a cell happens while its state byte is LOCKED by
// the accessing thread, or through `&mut self`.
unsafe impl<T: Send> Sync for Cells<T> {}

impl<T: Scalar> Cells<T> {
    fn new(n: usize) -> Result<Self> {
        let mut v = try_with_capacity(n)?;
        v.extend((0..n).map(|_| UnsafeCell::new(T::zero())));
        Ok(Self(v))
    }
}

fn states(n: usize) -> Result<Vec<AtomicU8>> {
    let mut v = try_with_capacity(n)?;
    v.extend((0..n).map(|_| AtomicU8::new(EMPTY)));
    Ok(v)
}

/// State a cell must be in to receive its first value
fn open_state(policy: MaskPolicy) -> u8 {
    match policy {
        MaskPolicy::Include => ALLOWED,
        MaskPolicy::Unmasked | MaskPolicy::Exclude => EMPTY,
    }
}

fn mask_state(policy: MaskPolicy) -> u8 {
    match policy {
        MaskPolicy::Include => ALLOWED,
        MaskPolicy::Unmasked | MaskPolicy::Exclude => BLOCKED,
    }
}

/// Writes `val` into the cell guarded by `state`
#[inline]
fn update_cell<T: Scalar>(state: &AtomicU8, cell: &UnsafeCell<T>, open: u8, val: T, add: &Kernel<T>) {
    loop {
        let s = state.load(Ordering::Acquire);
        if s == FILLED {
            if state
                .compare_exchange_weak(FILLED, LOCKED, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                // SAFETY: this thread holds the cell's lock
                unsafe {
                    let x = &mut *cell.get();
                    *x = add.call(*x, val);
                }
                state.store(FILLED, Ordering::Release);
                return;
            }
        } else if s == open {
            if state
                .compare_exchange_weak(open, LOCKED, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                // SAFETY: this thread holds the cell's lock
                unsafe {
                    *cell.get() = val;
                }
                state.store(FILLED, Ordering::Release);
                return;
            }
        } else if s == LOCKED {
            std::hint::spin_loop();
        } else {
            // the mask does not allow this index
            return;
        }
    }
}

/// Dense workspace of one output vector, shared by a fine team
pub struct SharedGustavson<T: Scalar> {
    states: Vec<AtomicU8>,
    values: Cells<T>,
    open: u8,
    policy: MaskPolicy,
}

impl<T: Scalar> SharedGustavson<T> {
    pub fn new(n: usize, policy: MaskPolicy) -> Result<Self> {
        Ok(Self {
            states: states(n)?,
            values: Cells::new(n)?,
            open: open_state(policy),
            policy,
        })
    }

    /// Scatters one mask entry; called before the team starts
    pub fn scatter_mask(&mut self, i: usize) {
        *self.states[i].get_mut() = mask_state(self.policy);
    }

    #[inline]
    pub fn accumulate(&self, i: usize, val: T, add: &Kernel<T>) {
        update_cell(&self.states[i], &self.values.0[i], self.open, val, add);
    }

    /// Appends the entries in ascending order of index
    pub fn gather(mut self, ci: &mut Vec<usize>, cx: &mut Vec<T>) {
        for (i, (state, cell)) in self
            .states
            .iter_mut()
            .zip(self.values.0.iter_mut())
            .enumerate()
        {
            if *state.get_mut() == FILLED {
                ci.push(i);
                cx.push(*cell.get_mut());
            }
        }
    }
}

/// Hash workspace of one output vector, shared by a fine team
///
/// With an included mask the table holds exactly the mask entries and is
/// never inserted into by the team.
pub struct SharedHash<T: Scalar> {
    keys: Vec<AtomicUsize>,
    states: Vec<AtomicU8>,
    values: Cells<T>,
    bits: usize,
    open: u8,
    policy: MaskPolicy,
}

impl<T: Scalar> SharedHash<T> {
    /// Creates a table of at least `size` slots, rounded up to a power of two
    pub fn new(size: usize, policy: MaskPolicy) -> Result<Self> {
        let size = next_pow2(size);
        let mut keys = try_with_capacity(size)?;
        keys.extend((0..size).map(|_| AtomicUsize::new(NO_KEY)));
        Ok(Self {
            keys,
            states: states(size)?,
            values: Cells::new(size)?,
            bits: size - 1,
            open: open_state(policy),
            policy,
        })
    }

    pub fn size(&self) -> usize {
        self.bits + 1
    }

    /// Scatters one mask entry; called before the team starts
    pub fn scatter_mask(&mut self, i: usize) {
        let mut h = hash_index(i, self.bits);
        loop {
            let key = self.keys[h].get_mut();
            if *key == NO_KEY || *key == i {
                *key = i;
                *self.states[h].get_mut() = mask_state(self.policy);
                return;
            }
            h = (h + 1) & self.bits;
        }
    }

    #[inline]
    pub fn accumulate(&self, i: usize, val: T, add: &Kernel<T>) {
        let insert = self.policy != MaskPolicy::Include;
        let mut h = hash_index(i, self.bits);
        loop {
            let key = self.keys[h].load(Ordering::Acquire);
            if key == i {
                break;
            }
            if key == NO_KEY {
                if !insert {
                    return;
                }
                match self.keys[h].compare_exchange(NO_KEY, i, Ordering::AcqRel, Ordering::Acquire) {
                    Ok(_) => break,
                    Err(actual) if actual == i => break,
                    Err(_) => {}
                }
            }
            h = (h + 1) & self.bits;
        }
        update_cell(&self.states[h], &self.values.0[h], self.open, val, add);
    }

    /// Appends the entries in ascending order of index
    pub fn gather(mut self, ci: &mut Vec<usize>, cx: &mut Vec<T>) {
        let mut entries: Vec<(usize, T)> = Vec::new();
        for h in 0..self.keys.len() {
            if *self.states[h].get_mut() == FILLED {
                entries.push((*self.keys[h].get_mut(), *self.values.0[h].get_mut()));
            }
        }
        entries.sort_unstable_by_key(|&(i, _)| i);
        for (i, x) in entries {
            ci.push(i);
            cx.push(x);
        }
    }
}
