//! # gemmtrsm
//!
//! Triangular solve with multiple right-hand sides (BLAS `trsm`) built the
//! BLIS way: operands are packed into micro-panels, a macro-kernel walks the
//! output block by block, and two small micro-kernels do the arithmetic.
//!
//! The heart of the crate is the right-side upper-triangular macro-kernel
//! ([`solve_multiply_block`]). It classifies every column panel of the
//! triangular operand against the diagonal and sends it to either a fused
//! multiply+solve micro-kernel or a plain multiply micro-kernel, skipping
//! panels that are implicitly zero and routing ragged edge blocks through a
//! stack scratch buffer. All other side/triangle/transpose combinations are
//! reduced to it by transposing and reversing strided views.
//!
//! ## Quick Start
//!
//! ```rust
//! use gemmtrsm::{solve_triangular, Diag, Side, Uplo};
//!
//! // Solve X · U = B for X with U = [2 1; 0 4].
//! let u = [2.0f64, 1.0, 0.0, 4.0];
//! let mut b = [2.0f64, 9.0, 6.0, 19.0];
//!
//! solve_triangular(Side::Right, Uplo::Upper, Diag::NonUnit, 1.0, &u, &mut b, 2, 2).unwrap();
//! assert_eq!(b, [1.0, 2.0, 3.0, 4.0]);
//! ```
//!
//! ## Supported Types
//!
//! | Type | Register block | Cache blocks (MC/KC/NC) |
//! |------|----------------|-------------------------|
//! | `f32` | 8×4 | 256 / 256 / 8192 |
//! | `f64` | 8×8 | 1008 / 2016 / 20480 |
//! | `Complex32` | 8×4 | 128 / 256 / 4096 |
//! | `Complex64` | 8×4 | 64 / 256 / 2048 |
//!
//! ## Layers
//!
//! - [`trsm`], [`Trsm`], [`solve_triangular`]: BLAS-style front-end
//! - [`core`](crate::core): blocked driver, macro-kernel, packing, micro-kernels
//! - [`mat`]: strided matrix views
//! - [`types`]: the [`Element`] abstraction over the four datatypes
//!
//! ## Features
//!
//! - `parallel` (default): solve row blocks of the right-hand side on the
//!   rayon thread pool

mod api;
pub mod core;
pub mod error;
pub mod mat;
pub mod types;

#[cfg(test)]
mod testing;

pub use api::{solve_triangular, solve_triangular_batched, trsm, trsm_blas, Trsm};
pub use crate::core::{
    solve_multiply_block, trsm_ru_blocked, trsm_ru_ker_var2, Diag, GemmMicrokernel,
    GemmTrsmMicrokernel, KernelDispatch, PackFormat, PackedOperand, PackedOperandMut,
    PortableMicrokernel, Side, TilingParams, Transpose, Uplo,
};
pub use error::{Result, TrsmError};
pub use mat::{MatMut, MatRef};
pub use types::{Complex, Complex32, Complex64, Datatype, Element};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::api::{solve_triangular, trsm, Trsm};
    pub use crate::core::{Diag, Side, TilingParams, Transpose, Uplo};
    pub use crate::error::{Result, TrsmError};
    pub use crate::mat::{MatMut, MatRef};
    pub use crate::types::{Complex32, Complex64, Element};
}
