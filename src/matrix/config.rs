//! Configuration: per-call context, descriptors and per-matrix format controls

use std::ops::BitOr;
use std::sync::Arc;

use crate::constants::{
    DEFAULT_BITMAP_SWITCH, DEFAULT_CHUNK, DEFAULT_GUSTAVSON_RATIO, DEFAULT_HYPER_SWITCH,
    DEFAULT_MARK_LIMIT,
};
use crate::error::{Error, Result};

/// Storage format of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sparsity {
    /// Only non-empty vectors are stored, listed in `h`
    Hypersparse,
    /// Compressed vectors: pointers and indices
    Sparse,
    /// Dense presence map plus dense values
    Bitmap,
    /// Every entry present, values only
    Full,
}

/// Set of formats a matrix may take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SparsityControl(u8);

impl SparsityControl {
    pub const HYPERSPARSE: Self = Self(1);
    pub const SPARSE: Self = Self(2);
    pub const BITMAP: Self = Self(4);
    pub const FULL: Self = Self(8);
    /// Any format, chosen automatically
    pub const AUTO: Self = Self(15);

    /// Returns true if `sparsity` is in the set
    pub fn allows(self, sparsity: Sparsity) -> bool {
        let bit = match sparsity {
            Sparsity::Hypersparse => Self::HYPERSPARSE,
            Sparsity::Sparse => Self::SPARSE,
            Sparsity::Bitmap => Self::BITMAP,
            Sparsity::Full => Self::FULL,
        };
        self.0 & bit.0 != 0
    }

    /// An empty set is treated as AUTO
    pub(crate) fn normalized(self) -> Self {
        if self.0 & 15 == 0 {
            Self::AUTO
        } else {
            Self(self.0 & 15)
        }
    }
}

impl BitOr for SparsityControl {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for SparsityControl {
    fn default() -> Self {
        Self::AUTO
    }
}

/// Format controls carried by each matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatControl {
    /// Formats this matrix may take
    pub sparsity_control: SparsityControl,
    /// Fraction of non-empty vectors below which the matrix is hypersparse
    pub hyper_switch: f64,
    /// Density at or above which the matrix is bitmap
    pub bitmap_switch: f64,
}

impl Default for FormatControl {
    fn default() -> Self {
        Self {
            sparsity_control: SparsityControl::AUTO,
            hyper_switch: DEFAULT_HYPER_SWITCH,
            bitmap_switch: DEFAULT_BITMAP_SWITCH,
        }
    }
}

/// Algorithm hint for matrix multiplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxbMethod {
    /// Let the dispatcher choose
    #[default]
    Default,
    /// saxpy3 with the dense Gustavson workspace
    Gustavson,
    /// saxpy3 with hash workspaces
    Hash,
    /// saxpy3 with either workspace
    Saxpy,
    /// dot2 or dot3
    Dot,
}

/// Per-call modifiers of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Descriptor {
    /// Delete entries of C outside the mask
    pub replace: bool,
    /// Use the complement of the mask
    pub mask_complement: bool,
    /// Use only the structure of the mask, ignoring its values
    pub mask_structural: bool,
    /// Transpose the first input
    pub transpose_first: bool,
    /// Transpose the second input
    pub transpose_second: bool,
    /// Swap the operands of the multiply operator
    pub flipxy: bool,
    /// Multiply algorithm hint
    pub axb_method: AxbMethod,
}

impl Descriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replace(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn with_complement(mut self) -> Self {
        self.mask_complement = true;
        self
    }

    pub fn with_structural(mut self) -> Self {
        self.mask_structural = true;
        self
    }

    pub fn with_transpose_first(mut self) -> Self {
        self.transpose_first = true;
        self
    }

    pub fn with_transpose_second(mut self) -> Self {
        self.transpose_second = true;
        self
    }

    pub fn with_flipxy(mut self) -> Self {
        self.flipxy = true;
        self
    }

    pub fn with_method(mut self, method: AxbMethod) -> Self {
        self.axb_method = method;
        self
    }
}

/// Explicit per-call execution context
///
/// Carries the thread budget and tuning knobs that every operation reads.
/// There is no process-wide state: two contexts with different settings can
/// be used concurrently.
#[derive(Debug, Clone)]
pub struct Context {
    /// Upper bound on the number of threads an operation uses
    pub nthreads_max: usize,
    /// Work units per thread before another thread is added
    pub chunk: usize,
    /// Gustavson vs hash workspace threshold for saxpy3
    pub gustavson_ratio: f64,
    /// Mark value at which the mark workspace is reset
    pub mark_limit: u32,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            nthreads_max: num_cpus::get(), // Use all available cores
            chunk: DEFAULT_CHUNK,
            gustavson_ratio: DEFAULT_GUSTAVSON_RATIO,
            mark_limit: DEFAULT_MARK_LIMIT,
            pool: None,
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that never runs more than one thread
    pub fn sequential() -> Self {
        Self {
            nthreads_max: 1,
            ..Self::default()
        }
    }

    /// Creates a context with a dedicated pool of `nthreads` threads
    pub fn with_threads(nthreads: usize) -> Result<Self> {
        if nthreads == 0 {
            return Err(Error::invalid_value("thread count must be positive"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nthreads)
            .build()
            .map_err(|e| Error::invalid_value(format!("cannot build thread pool: {e}")))?;
        Ok(Self {
            nthreads_max: nthreads,
            pool: Some(Arc::new(pool)),
            ..Self::default()
        })
    }

    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    pub fn with_nthreads_max(mut self, nthreads_max: usize) -> Self {
        self.nthreads_max = nthreads_max.max(1);
        self
    }

    pub fn with_gustavson_ratio(mut self, ratio: f64) -> Self {
        self.gustavson_ratio = ratio;
        self
    }

    pub fn with_mark_limit(mut self, limit: u32) -> Self {
        self.mark_limit = limit;
        self
    }

    /// Runs `f` inside this context's pool, or the global pool if it has none
    pub fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparsity_control() {
        let ctl = SparsityControl::SPARSE | SparsityControl::BITMAP;
        assert!(ctl.allows(Sparsity::Sparse));
        assert!(ctl.allows(Sparsity::Bitmap));
        assert!(!ctl.allows(Sparsity::Full));
        assert!(SparsityControl::AUTO.allows(Sparsity::Hypersparse));
    }

    #[test]
    fn test_descriptor_builder() {
        let d = Descriptor::new()
            .with_replace()
            .with_complement()
            .with_method(AxbMethod::Dot);
        assert!(d.replace && d.mask_complement);
        assert!(!d.mask_structural);
        assert_eq!(d.axb_method, AxbMethod::Dot);
    }

    #[test]
    fn test_context_defaults() {
        let ctx = Context::default();
        assert!(ctx.nthreads_max >= 1);
        assert_eq!(ctx.chunk, DEFAULT_CHUNK);

        let ctx = Context::with_threads(2).unwrap().with_chunk(0);
        assert_eq!(ctx.nthreads_max, 2);
        assert_eq!(ctx.chunk, 1);
        assert_eq!(ctx.install(|| 7), 7);
        assert!(Context::with_threads(0).is_err());
    }
}
