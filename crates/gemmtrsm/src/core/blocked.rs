use super::diag::is_strictly_below_diag;
use super::kernel::KernelDispatch;
use super::layout::Diag;
use super::macrokernel::trsm_ru_ker_var2;
use super::packing::{pack_panels, pack_upper_triangular, PackedTriangular};
use super::tiling::{BlockIterator, TilingParams};
use crate::error::{Result, TrsmError};
use crate::mat::{MatMut, MatRef};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Solves `X · U = alpha · C` in place for `X`, with `U` upper triangular.
///
/// Only the upper triangle of `U` is read. With `conj` the solve uses the
/// conjugate of `U`. `params` must carry the register block of `T`'s kernel.
///
/// ```text
/// for pc in 0..n step KC                  rows of U
///   for jc in 0..n step NC                columns of U
///     pack U[pc:KC, jc:NC] → B̃  (diagoff = pc - jc, skip if below)
///   for ic in 0..m step MC   (parallel)   rows of C
///     pack C[ic:MC, pc:KC] → Ã
///     for each B̃: macro-kernel(Ã, B̃, C[ic:MC, jc:NC])
/// ```
pub fn trsm_ru_blocked<T: KernelDispatch>(
    diag: Diag,
    conj: bool,
    alpha: T,
    u: MatRef<'_, T>,
    mut c: MatMut<'_, T>,
    params: &TilingParams,
) -> Result<()> {
    params.validate_for::<T>()?;

    let n = u.ncols();
    if u.nrows() != n {
        return Err(TrsmError::DimensionMismatch(format!(
            "triangular matrix must be square, got {}x{}",
            u.nrows(),
            n
        )));
    }
    if c.ncols() != n {
        return Err(TrsmError::DimensionMismatch(format!(
            "right-hand side has {} columns, triangular matrix has {}",
            c.ncols(),
            n
        )));
    }

    let m = c.nrows();
    log::debug!(
        "trsm_ru_blocked: {} m={} n={} diag={:?} conj={} tiling={:?}",
        T::DATATYPE,
        m,
        n,
        diag,
        conj,
        params
    );
    if m == 0 || n == 0 {
        return Ok(());
    }

    let kernel = T::kernel();
    let TilingParams { mc, kc, nc, mr, nr } = *params;

    for (pc, kc_cur) in BlockIterator::new(n, kc) {
        // alpha is folded in on the first pass; later passes see scaled C.
        let scale = if pc == 0 { alpha } else { T::one() };
        let u_rows = u.submatrix(pc, 0, kc_cur, n);

        let chunks: Vec<(usize, usize, PackedTriangular<T>)> = BlockIterator::new(n, nc)
            .filter(|&(jc, nc_cur)| {
                !is_strictly_below_diag(pc as isize - jc as isize, kc_cur, nc_cur)
            })
            .map(|(jc, nc_cur)| {
                let block = u_rows.submatrix(0, jc, kc_cur, nc_cur);
                let packed =
                    pack_upper_triangular(block, pc as isize - jc as isize, nr, diag, conj);
                (jc, nc_cur, packed)
            })
            .collect();

        log::trace!(
            "kc block {}..{}: {} packed column chunks",
            pc,
            pc + kc_cur,
            chunks.len()
        );

        let solve_rows = |mut c_blk: MatMut<'_, T>| -> Result<()> {
            let rows = c_blk.nrows();
            let mut a = pack_panels(c_blk.rb().submatrix(0, pc, rows, kc_cur), mr, nr, scale);
            for (jc, nc_cur, b) in &chunks {
                let c_chunk = c_blk.rb_mut().submatrix(0, *jc, rows, *nc_cur);
                trsm_ru_ker_var2(&mut a, b, scale, c_chunk, &kernel, &kernel)?;
            }
            Ok(())
        };

        let row_blocks = c.rb_mut().row_blocks(mc);

        #[cfg(feature = "parallel")]
        row_blocks.into_par_iter().try_for_each(solve_rows)?;

        #[cfg(not(feature = "parallel"))]
        row_blocks.into_iter().try_for_each(solve_rows)?;
    }

    Ok(())
}
