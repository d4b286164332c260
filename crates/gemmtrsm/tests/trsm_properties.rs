//! Property-based tests for the blocked triangular solve.
//!
//! Key invariants:
//! - The solution satisfies `op(A) · X = alpha · B` (left) or
//!   `X · op(A) = alpha · B` (right) for every side/triangle/transpose
//!   combination and every valid blocking
//! - The unreferenced triangle of `A` is never read
//! - With a unit diagonal the stored diagonal is never read
//! - Entries of a strided `B` outside the view are never written

use gemmtrsm::{Complex64, Diag, Element, MatMut, MatRef, Side, TilingParams, Transpose, Trsm, Uplo};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy)]
struct Case {
    side: Side,
    uplo: Uplo,
    trans: Transpose,
    diag: Diag,
}

fn case() -> impl Strategy<Value = Case> {
    (
        prop_oneof![Just(Side::Left), Just(Side::Right)],
        prop_oneof![Just(Uplo::Upper), Just(Uplo::Lower)],
        prop_oneof![
            Just(Transpose::NoTrans),
            Just(Transpose::Trans),
            Just(Transpose::ConjTrans)
        ],
        prop_oneof![Just(Diag::NonUnit), Just(Diag::Unit)],
    )
        .prop_map(|(side, uplo, trans, diag)| Case {
            side,
            uplo,
            trans,
            diag,
        })
}

/// Cache blocks valid for an `mr × nr` kernel with `nr` dividing `mr`.
fn cache_blocks(mr: usize, nr: usize) -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..4, 1usize..4, 1usize..6).prop_map(move |(i, p, j)| (i * mr, p * mr, j * nr))
}

fn referenced(uplo: Uplo, i: usize, j: usize) -> bool {
    match uplo {
        Uplo::Upper => i <= j,
        Uplo::Lower => i >= j,
    }
}

/// `k × k` column-major triangle; everything the solve must not read is NaN.
fn triangle<T: Element>(rng: &mut StdRng, k: usize, uplo: Uplo, diag: Diag) -> Vec<T> {
    let nan = T::from_parts(f64::NAN, f64::NAN);
    let mut a = vec![nan; k * k];
    for j in 0..k {
        for i in 0..k {
            if i == j {
                if diag == Diag::NonUnit {
                    a[i + j * k] = T::from_parts(2.0 + rng.gen_range(0.0..1.0), rng.gen_range(-0.5..0.5));
                }
            } else if referenced(uplo, i, j) {
                a[i + j * k] = T::from_parts(
                    rng.gen_range(-1.0..1.0) / k as f64,
                    rng.gen_range(-1.0..1.0) / k as f64,
                );
            }
        }
    }
    a
}

fn random<T: Element>(rng: &mut StdRng, len: usize) -> Vec<T> {
    (0..len)
        .map(|_| T::from_parts(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect()
}

/// Element `(i, j)` of `op(A)` as the solve sees it.
fn op_at<T: Element>(a: &[T], k: usize, c: Case, i: usize, j: usize) -> T {
    let (r, s) = if c.trans == Transpose::NoTrans { (i, j) } else { (j, i) };
    let v = if r == s && c.diag == Diag::Unit {
        T::one()
    } else if referenced(c.uplo, r, s) {
        a[r + s * k]
    } else {
        T::zero()
    };
    if c.trans == Transpose::ConjTrans {
        v.conj()
    } else {
        v
    }
}

/// Largest entry of `op(A) · X - alpha · B` (left) or `X · op(A) - alpha · B`
/// (right); `x` and `b` are column-major `m × n`.
fn residual<T: Element>(a: &[T], c: Case, x: &[T], b: &[T], alpha: T, m: usize, n: usize) -> f64 {
    let k = if c.side == Side::Left { m } else { n };
    let mut worst = 0.0f64;
    for j in 0..n {
        for i in 0..m {
            let mut acc = T::zero();
            for p in 0..k {
                acc = acc
                    + match c.side {
                        Side::Left => op_at(a, k, c, i, p) * x[p + j * m],
                        Side::Right => x[i + p * m] * op_at(a, k, c, p, j),
                    };
            }
            let r = (acc - alpha * b[i + j * m]).modulus();
            worst = if r.is_nan() { f64::INFINITY } else { worst.max(r) };
        }
    }
    worst
}

fn solve<T: gemmtrsm::KernelDispatch>(
    a: &[T],
    c: Case,
    alpha: T,
    x: &mut [T],
    m: usize,
    n: usize,
    tiling: TilingParams,
) {
    let k = if c.side == Side::Left { m } else { n };
    Trsm::new(c.side, c.uplo)
        .with_trans(c.trans)
        .with_diag(c.diag)
        .alpha(alpha)
        .tiling(tiling)
        .execute(
            MatRef::from_col_major(a, k, k).unwrap(),
            MatMut::from_col_major(x, m, n).unwrap(),
        )
        .unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Real double precision against the defining equation.
    #[test]
    fn f64_solution_satisfies_equation(
        c in case(),
        m in 1usize..30,
        n in 1usize..30,
        blocks in cache_blocks(8, 8),
        alpha in -2.0f64..2.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let k = if c.side == Side::Left { m } else { n };
        let a: Vec<f64> = triangle(&mut rng, k, c.uplo, c.diag);
        let b: Vec<f64> = random(&mut rng, m * n);

        let mut x = b.clone();
        let (mc, kc, nc) = blocks;
        let tiling = TilingParams::for_kernel::<f64>().with_cache_blocks(mc, kc, nc);
        solve(&a, c, alpha, &mut x, m, n, tiling);

        let r = residual(&a, c, &x, &b, alpha, m, n);
        prop_assert!(r < 1e-9, "{:?} m={} n={} blocks={:?}: residual {}", c, m, n, blocks, r);
    }

    /// Single precision with the 8×4 register block.
    #[test]
    fn f32_solution_satisfies_equation(
        c in case(),
        m in 1usize..20,
        n in 1usize..20,
        blocks in cache_blocks(8, 4),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let k = if c.side == Side::Left { m } else { n };
        let a: Vec<f32> = triangle(&mut rng, k, c.uplo, c.diag);
        let b: Vec<f32> = random(&mut rng, m * n);

        let mut x = b.clone();
        let (mc, kc, nc) = blocks;
        let tiling = TilingParams::for_kernel::<f32>().with_cache_blocks(mc, kc, nc);
        solve(&a, c, 1.0, &mut x, m, n, tiling);

        let r = residual(&a, c, &x, &b, 1.0, m, n);
        prop_assert!(r < 1e-3, "{:?} m={} n={}: residual {}", c, m, n, r);
    }

    /// Double complex, including conjugate transposes.
    #[test]
    fn complex_solution_satisfies_equation(
        c in case(),
        m in 1usize..16,
        n in 1usize..16,
        blocks in cache_blocks(8, 4),
        re in -1.0f64..1.0,
        im in -1.0f64..1.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let k = if c.side == Side::Left { m } else { n };
        let a: Vec<Complex64> = triangle(&mut rng, k, c.uplo, c.diag);
        let b: Vec<Complex64> = random(&mut rng, m * n);
        let alpha = Complex64::new(re, im);

        let mut x = b.clone();
        let (mc, kc, nc) = blocks;
        let tiling = TilingParams::for_kernel::<Complex64>().with_cache_blocks(mc, kc, nc);
        solve(&a, c, alpha, &mut x, m, n, tiling);

        let r = residual(&a, c, &x, &b, alpha, m, n);
        prop_assert!(r < 1e-9, "{:?} m={} n={}: residual {}", c, m, n, r);
    }

    /// Entries between the rows of a strided right-hand side stay untouched.
    #[test]
    fn strided_rhs_gaps_untouched(
        c in case(),
        m in 1usize..12,
        n in 1usize..12,
        gap in 1usize..4,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let k = if c.side == Side::Left { m } else { n };
        let a: Vec<f64> = triangle(&mut rng, k, c.uplo, c.diag);
        let b: Vec<f64> = random(&mut rng, m * n);

        // Column-major with leading dimension m + gap.
        let ld = m + gap;
        let mut buf = vec![f64::MAX; ld * n];
        for j in 0..n {
            buf[j * ld..j * ld + m].copy_from_slice(&b[j * m..(j + 1) * m]);
        }
        Trsm::new(c.side, c.uplo)
            .with_trans(c.trans)
            .with_diag(c.diag)
            .execute(
                MatRef::from_col_major(&a, k, k).unwrap(),
                MatMut::from_slice_mut(&mut buf, m, n, 1, ld).unwrap(),
            )
            .unwrap();

        let mut x = Vec::with_capacity(m * n);
        for j in 0..n {
            prop_assert!(buf[j * ld + m..(j + 1) * ld].iter().all(|&v| v == f64::MAX));
            x.extend_from_slice(&buf[j * ld..j * ld + m]);
        }
        let r = residual(&a, c, &x, &b, 1.0, m, n);
        prop_assert!(r < 1e-9);
    }
}

#[test]
fn default_tiling_handles_large_ragged_problem() {
    let mut rng = StdRng::seed_from_u64(2024);
    let (m, n) = (37, 301);
    let c = Case {
        side: Side::Right,
        uplo: Uplo::Upper,
        trans: Transpose::NoTrans,
        diag: Diag::NonUnit,
    };
    let a: Vec<f64> = triangle(&mut rng, n, c.uplo, c.diag);
    let b: Vec<f64> = random(&mut rng, m * n);
    let mut x = b.clone();
    solve(&a, c, 1.0, &mut x, m, n, TilingParams::for_kernel::<f64>().with_cache_blocks(16, 64, 128));
    assert!(residual(&a, c, &x, &b, 1.0, m, n) < 1e-9);
}
