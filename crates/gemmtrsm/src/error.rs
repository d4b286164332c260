//! Error types for the blocked triangular solve.
//!
//! Only the safe outer layers (views, tiling, packed-object validation and
//! the front-end) report errors. The macro-kernel itself has no error path:
//! malformed inputs there are contract violations.

use thiserror::Error;

/// Errors that can occur when setting up a triangular solve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrsmError {
    /// Operand dimensions do not agree.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A buffer is too small for the view laid over it.
    #[error("Buffer too small: need {needed} elements, got {len}")]
    BufferTooSmall { needed: usize, len: usize },

    /// Blocksizes violate the register/cache blocking constraints.
    #[error("Invalid tiling parameters: {0}")]
    InvalidTiling(String),

    /// Strides overflow or are otherwise unusable.
    #[error("Invalid stride: {0}")]
    InvalidStride(String),

    /// The packed format cannot be used with this datatype.
    #[error("Unsupported pack format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for triangular solve operations.
pub type Result<T> = std::result::Result<T, TrsmError>;
