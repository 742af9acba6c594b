//! Element types, operators, monoids and semirings

pub mod binary;
pub mod kernel;
pub mod monoid;
pub mod scalar;
pub mod semiring;

pub use binary::{BinaryOp, Opcode};
pub use kernel::{lookup, BinaryFn, Kernel, SemiringKernel};
pub use monoid::Monoid;
pub use scalar::{Scalar, TypeCode};
pub use semiring::Semiring;
