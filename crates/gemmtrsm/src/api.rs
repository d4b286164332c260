use crate::core::{trsm_ru_blocked, Diag, KernelDispatch, Side, TilingParams, Transpose, Uplo};
use crate::error::{Result, TrsmError};
use crate::mat::{MatMut, MatRef};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Triangular solve with multiple right-hand sides, overwriting `b`.
///
/// Solves `op(A) · X = alpha · B` for [`Side::Left`] or
/// `X · op(A) = alpha · B` for [`Side::Right`], where `A` is triangular as
/// given by `uplo` and `op` by `trans`. Only the referenced triangle of `A`
/// is read.
///
/// Every combination is reduced to the right-side upper-triangular kernel:
/// transposing moves a left-side solve to the right, and reversing the row
/// and column order turns a lower triangle into an upper one.
///
/// # Example
///
/// ```
/// use gemmtrsm::{trsm, Diag, MatMut, MatRef, Side, Transpose, Uplo};
///
/// // U = [2 1; 0 4], B = [2 9; 6 19]  →  X = B · U⁻¹ = [1 2; 3 4]
/// let u = [2.0f64, 1.0, 0.0, 4.0];
/// let mut b = [2.0f64, 9.0, 6.0, 19.0];
///
/// trsm(
///     Side::Right,
///     Uplo::Upper,
///     Transpose::NoTrans,
///     Diag::NonUnit,
///     1.0,
///     MatRef::from_row_major(&u, 2, 2).unwrap(),
///     MatMut::from_row_major(&mut b, 2, 2).unwrap(),
/// )
/// .unwrap();
/// assert_eq!(b, [1.0, 2.0, 3.0, 4.0]);
/// ```
pub fn trsm<T: KernelDispatch>(
    side: Side,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
    alpha: T,
    a: MatRef<'_, T>,
    b: MatMut<'_, T>,
) -> Result<()> {
    Trsm::new(side, uplo)
        .with_trans(trans)
        .with_diag(diag)
        .alpha(alpha)
        .execute(a, b)
}

/// Builder for configuring triangular solves.
///
/// # Example
///
/// ```
/// use gemmtrsm::{MatMut, MatRef, Side, Trsm, Uplo};
///
/// // L = [1 0; 3 1] with a unit diagonal; solve L · X = B.
/// let l = [1.0f32, 0.0, 3.0, 1.0];
/// let mut b = [1.0f32, 2.0, 5.0, 10.0];
///
/// Trsm::new(Side::Left, Uplo::Lower)
///     .unit_diag()
///     .execute(
///         MatRef::from_row_major(&l, 2, 2).unwrap(),
///         MatMut::from_row_major(&mut b, 2, 2).unwrap(),
///     )
///     .unwrap();
/// assert_eq!(b, [1.0, 2.0, 2.0, 4.0]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Trsm<T> {
    side: Side,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
    alpha: T,
    tiling: Option<TilingParams>,
}

impl<T: KernelDispatch> Trsm<T> {
    /// Create a new solve builder.
    pub fn new(side: Side, uplo: Uplo) -> Self {
        Self {
            side,
            uplo,
            trans: Transpose::NoTrans,
            diag: Diag::NonUnit,
            alpha: T::one(),
            tiling: None,
        }
    }

    /// Use `Aᵀ`.
    pub fn trans_a(self) -> Self {
        self.with_trans(Transpose::Trans)
    }

    /// Use the conjugate transpose `Aᴴ`.
    pub fn conj_trans_a(self) -> Self {
        self.with_trans(Transpose::ConjTrans)
    }

    pub fn with_trans(mut self, trans: Transpose) -> Self {
        self.trans = trans;
        self
    }

    /// Treat the diagonal of `A` as all ones without reading it.
    pub fn unit_diag(self) -> Self {
        self.with_diag(Diag::Unit)
    }

    pub fn with_diag(mut self, diag: Diag) -> Self {
        self.diag = diag;
        self
    }

    /// Scale the right-hand side.
    pub fn alpha(mut self, alpha: T) -> Self {
        self.alpha = alpha;
        self
    }

    /// Override the blocking parameters.
    pub fn tiling(mut self, params: TilingParams) -> Self {
        self.tiling = Some(params);
        self
    }

    /// Execute the solve, overwriting `b` with `X`.
    pub fn execute(self, a: MatRef<'_, T>, b: MatMut<'_, T>) -> Result<()> {
        let order = match self.side {
            Side::Left => b.nrows(),
            Side::Right => b.ncols(),
        };
        if a.nrows() != a.ncols() || a.nrows() != order {
            return Err(TrsmError::DimensionMismatch(format!(
                "{:?} solve with a {}x{} triangular matrix and a {}x{} right-hand side",
                self.side,
                a.nrows(),
                a.ncols(),
                b.nrows(),
                b.ncols()
            )));
        }

        let params = self
            .tiling
            .unwrap_or_else(TilingParams::for_kernel::<T>);

        log::debug!(
            "trsm: {}{:?}{:?}{:?}{:?} m={} n={}",
            T::DATATYPE.prefix(),
            self.side,
            self.uplo,
            self.trans,
            self.diag,
            b.nrows(),
            b.ncols()
        );

        let (tri, b, uplo) = reduce_to_right_upper(self.side, self.uplo, self.trans, a, b);
        debug_assert_eq!(uplo, Uplo::Upper);
        trsm_ru_blocked(self.diag, self.trans.is_conj(), self.alpha, tri, b, &params)
    }
}

/// Rewrites the views so that the solve becomes `X' · U = alpha · B'` with
/// `U` upper triangular. Returns the triangle, the right-hand side and the
/// triangle's orientation after the rewrite.
fn reduce_to_right_upper<'a, 'b, T>(
    side: Side,
    uplo: Uplo,
    trans: Transpose,
    a: MatRef<'a, T>,
    b: MatMut<'b, T>,
) -> (MatRef<'a, T>, MatMut<'b, T>, Uplo) {
    let (mut tri, mut uplo) = if trans.is_transposed() {
        (a.transpose(), uplo.flip())
    } else {
        (a, uplo)
    };
    let mut b = b;

    // op(A) · X = B  ⇔  Xᵀ · op(A)ᵀ = Bᵀ
    if side == Side::Left {
        tri = tri.transpose();
        uplo = uplo.flip();
        b = b.transpose();
    }

    // X · L = B  ⇔  (X J) · (J L J) = B J, J the exchange matrix.
    if uplo == Uplo::Lower {
        tri = tri.reverse_rows().reverse_cols();
        uplo = Uplo::Upper;
        b = b.reverse_cols();
    }

    (tri, b, uplo)
}

/// Triangular solve on row-major slices, overwriting `b`.
///
/// `b` is `m × n`; `a` is `m × m` for [`Side::Left`] and `n × n` for
/// [`Side::Right`].
///
/// # Example
///
/// ```
/// use gemmtrsm::{solve_triangular, Diag, Side, Uplo};
///
/// let a = [4.0f64, 0.0, 2.0, 1.0]; // lower: [4 0; 2 1]
/// let mut b = [8.0f64, 5.0];
/// solve_triangular(Side::Left, Uplo::Lower, Diag::NonUnit, 1.0, &a, &mut b, 2, 1).unwrap();
/// assert_eq!(b, [2.0, 1.0]);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn solve_triangular<T: KernelDispatch>(
    side: Side,
    uplo: Uplo,
    diag: Diag,
    alpha: T,
    a: &[T],
    b: &mut [T],
    m: usize,
    n: usize,
) -> Result<()> {
    let order = match side {
        Side::Left => m,
        Side::Right => n,
    };
    let a = MatRef::from_row_major(a, order, order)?;
    let b = MatMut::from_row_major(b, m, n)?;
    trsm(side, uplo, Transpose::NoTrans, diag, alpha, a, b)
}

/// Solves a batch of independent systems that share one triangular matrix.
///
/// Each entry of `b_batch` is an `m × n` row-major right-hand side and is
/// overwritten with its solution.
#[allow(clippy::too_many_arguments)]
pub fn solve_triangular_batched<T: KernelDispatch>(
    side: Side,
    uplo: Uplo,
    diag: Diag,
    alpha: T,
    a: &[T],
    b_batch: &mut [Vec<T>],
    m: usize,
    n: usize,
) -> Result<()> {
    #[cfg(feature = "parallel")]
    {
        b_batch
            .par_iter_mut()
            .try_for_each(|b| solve_triangular(side, uplo, diag, alpha, a, b, m, n))
    }

    #[cfg(not(feature = "parallel"))]
    {
        b_batch
            .iter_mut()
            .try_for_each(|b| solve_triangular(side, uplo, diag, alpha, a, b, m, n))
    }
}

/// BLAS-style triangular solve on column-major storage.
///
/// # Safety
/// `a` must be valid for reads of the `k × k` column-major matrix with
/// leading dimension `lda`, where `k` is `m` for [`Side::Left`] and `n` for
/// [`Side::Right`]. `b` must be valid for reads and writes of the `m × n`
/// column-major matrix with leading dimension `ldb`, and must not overlap
/// `a`.
#[allow(clippy::too_many_arguments)]
pub unsafe fn trsm_blas<T: KernelDispatch>(
    side: Side,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
    m: usize,
    n: usize,
    alpha: T,
    a: *const T,
    lda: usize,
    b: *mut T,
    ldb: usize,
) -> Result<()> {
    let order = match side {
        Side::Left => m,
        Side::Right => n,
    };
    if lda < order.max(1) || ldb < m.max(1) {
        return Err(TrsmError::InvalidStride(format!(
            "leading dimensions lda={} ldb={} too small for m={} n={}",
            lda, ldb, m, n
        )));
    }
    let a = MatRef::from_raw_parts(a, order, order, 1, lda as isize);
    let b = MatMut::from_raw_parts_mut(b, m, n, 1, ldb as isize);
    trsm(side, uplo, trans, diag, alpha, a, b)
}
