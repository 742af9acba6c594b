//! Error types for gbsparse

use thiserror::Error;

/// Result type alias using gbsparse's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by matrix operations
///
/// Every public operation reports failure through one of these variants and
/// leaves its output either untouched or, for freshly created outputs, never
/// exposed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An allocation failed; all partial results have been freed
    #[error("Out of memory: failed to allocate {size} elements")]
    OutOfMemory {
        /// Number of elements requested
        size: usize,
    },

    /// A precondition on an argument was violated
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Operand dimensions do not agree
    #[error("Dimension mismatch in {op}: {detail}")]
    DimensionMismatch {
        /// The operation name
        op: &'static str,
        /// Which dimensions disagree
        detail: String,
    },

    /// A row or column index is outside the matrix
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// Size of the dimension
        size: usize,
    },

    /// A matrix failed structural validation, or its content was freed
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// An operator cannot be used in the requested role
    #[error("Domain mismatch: {0}")]
    DomainMismatch(String),
}

impl Error {
    pub(crate) fn invalid_value(msg: impl Into<String>) -> Self {
        Error::InvalidValue(msg.into())
    }

    pub(crate) fn invalid_object(msg: impl Into<String>) -> Self {
        Error::InvalidObject(msg.into())
    }

    pub(crate) fn dimension_mismatch(op: &'static str, detail: impl Into<String>) -> Self {
        Error::DimensionMismatch {
            op,
            detail: detail.into(),
        }
    }

    /// Returns true if the error is an allocation failure
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Error::OutOfMemory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::IndexOutOfBounds { index: 7, size: 3 };
        assert_eq!(e.to_string(), "Index 7 out of bounds for dimension of size 3");

        let e = Error::dimension_mismatch("mxm", "A is 2x3, B is 4x2");
        assert!(e.to_string().contains("mxm"));
        assert!(!e.is_out_of_memory());
        assert!(Error::OutOfMemory { size: 1 }.is_out_of_memory());
    }
}
