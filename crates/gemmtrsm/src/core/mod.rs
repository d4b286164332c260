//! Blocked triangular solve using BLIS-style layering.
//!
//! This module provides the portable implementation of the right-side
//! upper-triangular solve `X · U = alpha · C`, built from the same pieces as
//! a BLIS matrix multiply: packing, a macro-kernel and micro-kernels.
//!
//! # Algorithm Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Loop 4: for pc in 0..n step KC     (rows of U)                   │
//! │   Loop 3: for jc in 0..n step NC   (columns of U)                │
//! │     Pack U[pc:KC, jc:NC] → B̃   (skip chunks below the diagonal) │
//! │   Loop 2: for ic in 0..m step MC   (rows of C, parallel)         │
//! │     Pack C[ic:MC, pc:KC] → Ã                                     │
//! │     Macro-kernel per B̃:                                          │
//! │       for jr in 0..NC step NR     classify against the diagonal  │
//! │         for ir in 0..MC step MR                                  │
//! │           intersects → gemmtrsm(Ã, B̃) → Ã, C                    │
//! │           above      → gemm: C = alpha2*C - Ã·B̃                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Tiling Parameters
//!
//! | Parameter | Purpose | f64 default |
//! |-----------|---------|-------------|
//! | MC | Rows of C per block | 1008 |
//! | KC | Rows of U per block | 2016 |
//! | NC | Columns of U per block | 20480 |
//! | MR | Micro-kernel rows | 8 |
//! | NR | Micro-kernel columns | 8 |
//!
//! # Packing
//!
//! - [`pack_panels`]: row micro-panels of the operand being solved
//! - [`pack_upper_triangular`]: column micro-panels of the triangle, with the
//!   diagonal pre-inverted and identity-extended into the padding
//!
//! # Micro-kernels
//!
//! [`GemmMicrokernel`] and [`GemmTrsmMicrokernel`] describe one `MR × NR`
//! register block. [`PortableMicrokernel`] implements both, and
//! [`KernelDispatch`] binds each element type to its register block.
//!
//! # Module Contents
//!
//! - `blocked`: the cache-blocked driver
//! - `diag`: block classification against the diagonal
//! - `kernel`: micro-kernel traits and the portable implementation
//! - `layout`: BLAS operation specifiers
//! - `macrokernel`: the blocked traversal engine and its object-level entry
//! - `packing`: packed-operand contract and packing routines
//! - `scratch`: the edge-case scratch buffer
//! - `tiling`: blocksizes and block iteration

mod blocked;
mod diag;
mod kernel;
mod layout;
mod macrokernel;
mod packing;
mod scratch;
mod tiling;

pub use blocked::trsm_ru_blocked;
pub use diag::{
    classify_panel, intersects_diag, is_strictly_above_diag, is_strictly_below_diag,
    triangular_extent, PanelKind, PanelSpec, Panels, TriangularBlock,
};
pub use kernel::{
    AuxInfo, GemmMicrokernel, GemmTrsmMicrokernel, KernelDispatch, PortableMicrokernel,
};
pub use layout::{Diag, Side, Transpose, Uplo};
pub use macrokernel::{kernel_strides, solve_multiply_block, trsm_ru_ker_var2};
pub use packing::{
    pack_panels, pack_upper_triangular, packed_panels_len, PackFormat, PackedOperand,
    PackedOperandMut, PackedPanels, PackedTriangular,
};
pub use scratch::{EdgeBuffer, MAX_MR, MAX_NR};
pub use tiling::{cache_blocksizes, round_up, BlockIterator, TilingParams};
