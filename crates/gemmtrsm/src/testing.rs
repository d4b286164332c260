//! Test fixtures shared by the unit tests.

use crate::core::Diag;
use crate::mat::MatRef;
use crate::types::Element;
use rand::rngs::StdRng;
use rand::Rng;

/// A value that poisons any arithmetic it takes part in.
pub fn poison<T: Element>() -> T {
    T::from_parts(f64::NAN, f64::NAN)
}

fn random_element<T: Element>(rng: &mut StdRng) -> T {
    T::from_parts(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
}

/// Random `rows × cols` column-major matrix with entries in `[-1, 1)`.
pub fn random_matrix<T: Element>(rng: &mut StdRng, rows: usize, cols: usize) -> Vec<T> {
    (0..rows * cols).map(|_| random_element(rng)).collect()
}

/// Well-conditioned `n × n` column-major upper triangular matrix.
///
/// The strictly lower part is poisoned, so any read of it shows up as NaN
/// in the result.
pub fn upper_triangular<T: Element>(rng: &mut StdRng, n: usize) -> Vec<T> {
    let scale = 1.0 / n.max(1) as f64;
    let mut u = vec![poison::<T>(); n * n];
    for j in 0..n {
        for i in 0..j {
            u[i + j * n] = T::from_parts(
                scale * rng.gen_range(-1.0..1.0),
                scale * rng.gen_range(-1.0..1.0),
            );
        }
        u[j + j * n] = T::from_parts(2.0 + rng.gen_range(0.0..1.0), rng.gen_range(-0.5..0.5));
    }
    u
}

/// Solves `X · U = alpha · C` column by column, reading only the upper
/// triangle of `u`. `c` is column-major `m × n`.
pub fn reference_trsm_ru<T: Element>(
    u: MatRef<'_, T>,
    diag: Diag,
    alpha: T,
    c: &[T],
    m: usize,
) -> Vec<T> {
    let n = u.ncols();
    let mut x = vec![T::zero(); m * n];
    for j in 0..n {
        for i in 0..m {
            let mut acc = alpha * c[i + j * m];
            for p in 0..j {
                acc = acc - x[i + p * m] * u.get(p, j);
            }
            x[i + j * m] = match diag {
                Diag::Unit => acc,
                Diag::NonUnit => acc * u.get(j, j).recip(),
            };
        }
    }
    x
}

/// `beta * C + alpha * A · B` for column-major `A` (m × k), `B` (k × n) and
/// `C` (m × n).
#[allow(clippy::too_many_arguments)]
pub fn naive_gemm_update<T: Element>(
    beta: T,
    c: &[T],
    alpha: T,
    a: &[T],
    b: &[T],
    m: usize,
    n: usize,
    k: usize,
) -> Vec<T> {
    let mut out = vec![T::zero(); m * n];
    for j in 0..n {
        for i in 0..m {
            let mut acc = T::zero();
            for p in 0..k {
                acc = acc + a[i + p * m] * b[p + j * k];
            }
            out[i + j * m] = beta * c[i + j * m] + alpha * acc;
        }
    }
    out
}

/// Largest elementwise distance; NaN anywhere yields infinity.
pub fn max_abs_diff<T: Element>(a: &[T], b: &[T]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = (x - y).modulus();
            if d.is_nan() {
                f64::INFINITY
            } else {
                d
            }
        })
        .fold(0.0, f64::max)
}
