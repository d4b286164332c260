//! BLAS operation specifiers.

/// Side on which the triangular matrix appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    /// Solve `op(A) * X = alpha * B`.
    #[default]
    Left,
    /// Solve `X * op(A) = alpha * B`.
    Right,
}

/// Which triangle of the matrix is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Uplo {
    #[default]
    Upper,
    Lower,
}

impl Uplo {
    /// The triangle obtained after transposition.
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Uplo::Upper => Uplo::Lower,
            Uplo::Lower => Uplo::Upper,
        }
    }
}

/// Operation applied to the triangular matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transpose {
    /// No transpose.
    #[default]
    NoTrans,
    /// Transpose.
    Trans,
    /// Conjugate transpose (same as `Trans` for real types).
    ConjTrans,
}

impl Transpose {
    /// Whether rows and columns are swapped.
    #[inline]
    pub fn is_transposed(self) -> bool {
        !matches!(self, Transpose::NoTrans)
    }

    /// Whether elements are conjugated.
    #[inline]
    pub fn is_conj(self) -> bool {
        matches!(self, Transpose::ConjTrans)
    }
}

/// Whether the diagonal is stored or implicitly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Diag {
    #[default]
    NonUnit,
    Unit,
}
