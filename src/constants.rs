//! Centralized constants for the gbsparse library
//!
//! This module contains the tuning constants used throughout the codebase.
//! None of them affect results, only which algorithm or format is chosen.

// ============================================================================
// PARALLEL SCHEDULING
// ============================================================================

/// Work units a thread should have before another thread is added
pub const DEFAULT_CHUNK: usize = 64 * 1024;

/// Coarse tasks created per thread, so faster threads can steal more work
pub const TASKS_PER_THREAD: usize = 4;

// ============================================================================
// FORMAT SELECTION
// ============================================================================

/// A sparse matrix becomes hypersparse when at most this fraction of its
/// vectors are non-empty; it becomes sparse again above twice this fraction
pub const DEFAULT_HYPER_SWITCH: f64 = 0.0625;

/// A sparse matrix becomes bitmap at or above this density, and leaves the
/// bitmap format again below half of it
pub const DEFAULT_BITMAP_SWITCH: f64 = 0.40;

// ============================================================================
// MULTIPLY WORKSPACES
// ============================================================================

/// saxpy3 uses the dense Gustavson workspace when the hash table it would
/// otherwise need is at least this fraction of the output vector length
pub const DEFAULT_GUSTAVSON_RATIO: f64 = 1.0 / 16.0;

/// Smallest hash table a saxpy3 task allocates
pub const MIN_HASH_SIZE: usize = 4;

/// Multiplier of the hash function, i -> (i * 257) mod size
pub const HASH_FACTOR: usize = 257;

/// Largest mark value before the mark workspace is cleared and restarted
pub const DEFAULT_MARK_LIMIT: u32 = u32::MAX - 16;

/// Without a forced method, dot2 runs only if its bitmap output has at most
/// this many slots per stored entry of the two operands
pub const DOT2_DENSITY_FACTOR: usize = 8;

// ============================================================================
// ELEMENT-WISE MERGE
// ============================================================================

/// When one vector has this many times fewer entries than the other, the
/// intersection binary-searches the longer one instead of merging
pub const INTERSECT_SEARCH_RATIO: usize = 32;

// ============================================================================
// ENTRY ENCODING
// ============================================================================

/// Top bit of an index; set on the index of a zombie
pub const ZOMBIE_BIT: usize = 1 << (usize::BITS - 1);

/// Extents below this limit are exported with 32-bit index buffers
pub const INDEX_32_LIMIT: usize = 1 << 31;
