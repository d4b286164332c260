//! Numeric element types.
//!
//! The blocking engine is written once, generically, over the [`Element`]
//! trait. Each implementor carries a [`Datatype`] tag so that per-datatype
//! choices (register blocksizes, cache blocksizes, packing conventions) are
//! made once per call rather than looked up in a table inside the loops.
//!
//! | Type | [`Datatype`] | BLAS prefix |
//! |------|--------------|-------------|
//! | `f32` | `Float` | `s` |
//! | `f64` | `Double` | `d` |
//! | `Complex<f32>` | `Scomplex` | `c` |
//! | `Complex<f64>` | `Dcomplex` | `z` |
//!
//! # Example
//!
//! ```rust
//! use gemmtrsm::types::{Datatype, Element};
//!
//! assert_eq!(<f64 as Element>::DATATYPE, Datatype::Double);
//! assert_eq!(Element::recip(4.0f32), 0.25);
//! assert_eq!(<f32 as Element>::minus_one(), -1.0);
//! ```

mod scalar;
mod traits;

pub use num_complex::{Complex, Complex32, Complex64};
pub use traits::{Datatype, Element};
