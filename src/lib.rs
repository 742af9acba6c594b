//! # gbsparse: sparse linear algebra over semirings
//!
//! Matrices and vectors in four storage formats (full, bitmap, sparse and
//! hypersparse) combined through semiring matrix multiply, element-wise
//! union and intersection, and masked assignment, following the GraphBLAS
//! model.
//!
//! ## Overview
//!
//! - **Formats**: each [`Matrix`] picks its format from its density and its
//!   format controls, and can also be converted explicitly.
//! - **Deferred work**: insertions become pending tuples and deletions
//!   become zombies; both are resolved by [`Matrix::wait`] or by the next
//!   operation that reads the matrix.
//! - **Multiply**: [`mxm`] chooses among a Gustavson/hash saxpy, in-place
//!   saxpy kernels for a full output, and dot-product kernels, based on the
//!   formats of the operands and the mask.
//! - **Parallelism**: every operation takes a [`Context`] holding its thread
//!   budget; work is split into coarse and fine tasks run on a rayon pool.
//!
//! ## Usage
//!
//! ```
//! use gbsparse::{ewise_add, BinaryOp, Context, Descriptor, Matrix};
//!
//! let a = Matrix::build(2, 2, &[0, 1], &[0, 1], &[1.0f64, 2.0], None).unwrap();
//! let b = Matrix::build(2, 2, &[0, 1], &[1, 1], &[5.0f64, 3.0], None).unwrap();
//! let mut c = Matrix::new(2, 2);
//! ewise_add(&mut c, None, None, &BinaryOp::Plus, &a, &b, &Descriptor::new(), &Context::default())
//!     .unwrap();
//! assert_eq!(c.get(1, 1), Some(5.0));
//! assert_eq!(c.nvals(), 3);
//! ```

pub mod accumulator;
pub mod constants;
pub mod error;
pub mod ewise;
pub mod mask;
pub mod matrix;
mod mxm;
pub mod ops;
pub mod ordering;
mod parallel;
pub mod slice;
pub mod utils;
pub mod vector;

pub use error::{Error, Result};
pub use ewise::{ewise_add, ewise_mult};
pub use mask::{accum_mask, assign, assign_scalar, Indices};
pub use matrix::{
    AxbMethod, Context, Descriptor, ImportHeader, ImportMode, IndexBuffer, Lifecycle, Matrix,
    MatrixBuffers, Sparsity, SparsityControl,
};
pub use mxm::mxm;
pub use ops::{BinaryOp, Monoid, Scalar, Semiring};
pub use ordering::{check_pattern, order_with, validate_permutation, OrderStatus, OrderingProvider, Pattern};
pub use utils::{from_dense, from_sprs, to_dense, to_sprs};
pub use vector::{mxv, vxm, Vector};
