use std::fmt::{self, Debug};
use std::ops::{Add, Mul, Neg, Sub};

/// Datatype tag of an [`Element`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    /// Single-precision real.
    Float,
    /// Double-precision real.
    Double,
    /// Single-precision complex.
    Scomplex,
    /// Double-precision complex.
    Dcomplex,
}

impl Datatype {
    /// Whether the datatype is complex.
    #[inline]
    pub fn is_complex(self) -> bool {
        matches!(self, Datatype::Scomplex | Datatype::Dcomplex)
    }

    /// BLAS-style one-letter prefix (`s`, `d`, `c`, `z`).
    pub fn prefix(self) -> char {
        match self {
            Datatype::Float => 's',
            Datatype::Double => 'd',
            Datatype::Scomplex => 'c',
            Datatype::Dcomplex => 'z',
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Datatype::Float => "float",
            Datatype::Double => "double",
            Datatype::Scomplex => "scomplex",
            Datatype::Dcomplex => "dcomplex",
        };
        f.write_str(name)
    }
}

/// Arithmetic needed by packing, the micro-kernels and the blocking engine.
///
/// Addition, subtraction, multiplication and negation come from the
/// standard operator traits. The remaining operations are the few the
/// triangular solve needs beyond a ring: the reciprocal (diagonal
/// pre-inversion during packing) and conjugation (conjugate-transpose
/// solves).
pub trait Element:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    /// Datatype tag.
    const DATATYPE: Datatype;

    /// Additive identity.
    fn zero() -> Self;

    /// Multiplicative identity.
    fn one() -> Self;

    /// Negated multiplicative identity.
    #[inline(always)]
    fn minus_one() -> Self {
        -Self::one()
    }

    /// `1 / self`.
    fn recip(self) -> Self;

    /// Complex conjugate (identity for real types).
    fn conj(self) -> Self;

    /// Builds a value from real and imaginary parts.
    ///
    /// The imaginary part is dropped for real types.
    fn from_parts(re: f64, im: f64) -> Self;

    /// Absolute value (modulus for complex types) widened to `f64`.
    fn modulus(self) -> f64;

    /// Whether every component is finite.
    fn is_finite(self) -> bool;

    /// `self + a * b`.
    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        self + a * b
    }

    #[inline(always)]
    fn is_zero(self) -> bool {
        self == Self::zero()
    }
}
