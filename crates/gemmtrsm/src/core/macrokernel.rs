//! The right-side upper-triangular solve macro-kernel.
//!
//! The engine walks the output `C` in `NR`-column panels and, within each,
//! in `MR`-row register blocks. Every column panel of the packed triangular
//! operand `B` is classified against the diagonal:
//!
//! ```text
//!            B (k × n, upper)                 per column panel j
//!   ┌────────────────────────────┐
//!   │ ▒▒▒▒ ████ ████ ████ ████    │   ▒ skipped (left of the diagonal)
//!   │      ◣███ ████ ████ ████    │   ◣ intersects → gemmtrsm
//!   │           ◣███ ████ ████    │   █ strictly above → gemm
//!   │                ◣███ ████    │
//!   └────────────────────────────┘
//! ```
//!
//! Intersecting panels go through the fused multiply+solve kernel, which also
//! writes the solved block back into the packed `A` so later panels see it.
//! Panels strictly above the diagonal are a plain `C = alpha2*C - A·B`
//! update. Register blocks that hang off the bottom or right edge of `C` are
//! computed into an [`EdgeBuffer`] and copied out.

use super::diag::{PanelKind, TriangularBlock};
use super::kernel::{AuxInfo, GemmMicrokernel, GemmTrsmMicrokernel};
use super::packing::{PackFormat, PackedOperand, PackedOperandMut};
use super::scratch::{EdgeBuffer, MAX_MR, MAX_NR};
use crate::error::{Result, TrsmError};
use crate::mat::MatMut;
use crate::types::Element;

/// Solves the packed `m × k` operand `A` against the packed `k × n` upper
/// triangular operand `B` and updates `C`, one register block at a time.
///
/// `alpha1` scales the block of `A` being solved; `alpha2` scales `C` where
/// `B` is strictly above the diagonal.
///
/// # Safety
/// - `a` must point at `ceil(m / MR)` micro-panels of `ps_a` elements laid
///   out as produced by [`pack_panels`](super::pack_panels) with at least
///   `k` rounded up to `NR` columns; it is read and written
/// - `b` must point at the panels produced by
///   [`pack_upper_triangular`](super::pack_upper_triangular) for the same
///   `diagoffb`, `k`, `n` and `NR`
/// - `c + i*rs_c + j*cs_c` must be valid for reads and writes for
///   `i < m`, `j < n`, and must not overlap `a` or `b`
/// - `pd_a`, `pd_b`, `cs_a` and `rs_b` must match the kernels' `MR`/`NR`
#[allow(clippy::too_many_arguments)]
pub unsafe fn solve_multiply_block<T, F, G>(
    diagoffb: isize,
    m: usize,
    n: usize,
    k: usize,
    alpha1: T,
    a: *mut T,
    cs_a: isize,
    pd_a: usize,
    ps_a: isize,
    b: *const T,
    rs_b: isize,
    pd_b: usize,
    ps_b: isize,
    alpha2: T,
    c: *mut T,
    rs_c: isize,
    cs_c: isize,
    gemmtrsm_ukr: &F,
    gemm_ukr: &G,
) where
    T: Element,
    F: GemmTrsmMicrokernel<T>,
    G: GemmMicrokernel<T>,
{
    let mr = pd_a;
    let nr = pd_b;
    let packmr = cs_a;
    let packnr = rs_b;
    debug_assert_eq!(mr, <G as GemmMicrokernel<T>>::MR);
    debug_assert_eq!(nr, <G as GemmMicrokernel<T>>::NR);
    debug_assert_eq!(mr, <F as GemmTrsmMicrokernel<T>>::MR);
    debug_assert_eq!(nr, <F as GemmTrsmMicrokernel<T>>::NR);
    debug_assert!(mr <= MAX_MR && nr <= MAX_NR);

    if m == 0 || n == 0 || k == 0 {
        return;
    }
    debug_assert!(diagoffb % nr as isize == 0, "diagonal offset must be a multiple of NR");

    // Also covers a block that lies entirely below the diagonal.
    let Some(blk) = TriangularBlock::normalize(diagoffb, k, n, nr) else {
        return;
    };

    // ss_b absorbs any storage inflation baked into ps_b.
    let ss_b = ps_b / blk.k_full as isize;
    let c = c.wrapping_offset(blk.skipped_cols as isize * cs_c);
    let k = blk.k;

    let mut ct = EdgeBuffer::<T>::zeroed();
    let rs_ct = EdgeBuffer::<T>::ROW_STRIDE;
    let cs_ct = EdgeBuffer::<T>::COL_STRIDE;

    let m_iter = m.div_ceil(mr);
    let m_left = m % mr;
    let n_iter = blk.num_panels(nr);

    let rstep_a = ps_a;
    let rstep_c = rs_c * mr as isize;
    let cstep_c = cs_c * nr as isize;

    let minus_one = T::minus_one();
    let zero = T::zero();

    let mut aux = AuxInfo {
        ps_a,
        ..AuxInfo::default()
    };

    let mut b1 = b;
    let mut c1 = c;

    for panel in blk.panels(nr) {
        let n_cur = panel.width;
        let panel_len = panel.k_b0111 as isize * ss_b;
        let is_last_j = panel.index + 1 == n_iter;

        let b01 = b1;
        let b11 = b1.wrapping_offset(panel.k_b01 as isize * packnr);
        let mut b2 = b1;
        aux.ps_b = panel_len;

        let mut a1 = a;
        let mut c11 = c1;

        match panel.kind {
            PanelKind::Intersects => {
                for i in 0..m_iter {
                    let m_cur = if i + 1 == m_iter && m_left != 0 { m_left } else { mr };

                    let a10 = a1;
                    let a11 = a1.wrapping_offset(panel.k_b01 as isize * packmr);

                    let mut a2 = a1.wrapping_offset(rstep_a);
                    if i + 1 == m_iter {
                        a2 = a;
                        b2 = if is_last_j { b } else { b1.wrapping_offset(panel_len) };
                    }
                    aux.next_a = a2;
                    aux.next_b = b2;

                    if m_cur == mr && n_cur == nr {
                        gemmtrsm_ukr.gemmtrsm(
                            panel.k_b01, alpha1, b01, b11, a10, a11, c11, rs_c, cs_c, &aux,
                        );
                    } else {
                        gemmtrsm_ukr.gemmtrsm(
                            panel.k_b01,
                            alpha1,
                            b01,
                            b11,
                            a10,
                            a11,
                            ct.as_mut_ptr(),
                            rs_ct,
                            cs_ct,
                            &aux,
                        );
                        ct.copy_to(m_cur, n_cur, c11, rs_c, cs_c);
                    }

                    a1 = a1.wrapping_offset(rstep_a);
                    c11 = c11.wrapping_offset(rstep_c);
                }
            }
            PanelKind::StrictlyAbove => {
                for i in 0..m_iter {
                    let m_cur = if i + 1 == m_iter && m_left != 0 { m_left } else { mr };

                    let mut a2 = a1.wrapping_offset(rstep_a);
                    if i + 1 == m_iter {
                        a2 = a;
                        // Next panel's real start; BLIS steps by ps_b here.
                        b2 = if is_last_j { b } else { b1.wrapping_offset(panel_len) };
                    }
                    aux.next_a = a2;
                    aux.next_b = b2;

                    if m_cur == mr && n_cur == nr {
                        gemm_ukr.gemm(k, minus_one, a1, b1, alpha2, c11, rs_c, cs_c, &aux);
                    } else {
                        gemm_ukr.gemm(
                            k,
                            minus_one,
                            a1,
                            b1,
                            zero,
                            ct.as_mut_ptr(),
                            rs_ct,
                            cs_ct,
                            &aux,
                        );
                        ct.xpby_to(m_cur, n_cur, alpha2, c11, rs_c, cs_c);
                    }

                    a1 = a1.wrapping_offset(rstep_a);
                    c11 = c11.wrapping_offset(rstep_c);
                }
            }
            // Not packed and implicitly zero.
            PanelKind::StrictlyBelow => {}
        }

        b1 = b1.wrapping_offset(panel_len);
        c1 = c1.wrapping_offset(cstep_c);
    }
}

/// Column stride of `A` and row stride of `B` as the kernels must see them.
///
/// Interleaved complex formats store real-valued entries, so strides
/// expressed in those units are halved when the engine indexes in complex
/// elements.
pub fn kernel_strides(format: PackFormat, cs_a: isize, rs_b: isize) -> (isize, isize) {
    if format.is_interleaved() {
        (cs_a / 2, rs_b / 2)
    } else {
        (cs_a, rs_b)
    }
}

/// Object-level entry point: queries the packed operands, checks them
/// against each other, `C` and the kernels, then runs the macro-kernel.
///
/// The scalar attached to `a` scales the blocks being solved. `alpha2`
/// scales `C` where `b` is strictly above its diagonal.
pub fn trsm_ru_ker_var2<T, A, B, F, G>(
    a: &mut A,
    b: &B,
    alpha2: T,
    mut c: MatMut<'_, T>,
    gemmtrsm_ukr: &F,
    gemm_ukr: &G,
) -> Result<()>
where
    T: Element,
    A: PackedOperandMut<T> + ?Sized,
    B: PackedOperand<T> + ?Sized,
    F: GemmTrsmMicrokernel<T>,
    G: GemmMicrokernel<T>,
{
    let (m, n, k) = (c.nrows(), c.ncols(), a.cols());

    if a.rows() != m || b.cols() != n || b.rows() != k {
        return Err(TrsmError::DimensionMismatch(format!(
            "A is {}x{}, B is {}x{}, C is {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols(),
            m,
            n
        )));
    }

    let mr = <G as GemmMicrokernel<T>>::MR;
    let nr = <G as GemmMicrokernel<T>>::NR;
    if <F as GemmTrsmMicrokernel<T>>::MR != mr || <F as GemmTrsmMicrokernel<T>>::NR != nr {
        return Err(TrsmError::InvalidTiling(format!(
            "gemm kernel is {}x{} but gemmtrsm kernel is {}x{}",
            mr,
            nr,
            <F as GemmTrsmMicrokernel<T>>::MR,
            <F as GemmTrsmMicrokernel<T>>::NR
        )));
    }
    if a.panel_dim() != mr || b.panel_dim() != nr {
        return Err(TrsmError::InvalidTiling(format!(
            "operands packed for {}x{}, kernels use {}x{}",
            a.panel_dim(),
            b.panel_dim(),
            mr,
            nr
        )));
    }

    let diagoffb = b.diag_offset();
    if diagoffb % nr as isize != 0 {
        return Err(TrsmError::InvalidTiling(format!(
            "diagonal offset {} is not a multiple of nr = {}",
            diagoffb, nr
        )));
    }

    let datatype = a.datatype();
    if datatype != T::DATATYPE || b.datatype() != datatype {
        return Err(TrsmError::UnsupportedFormat(format!(
            "operands tagged {} and {} for {} elements",
            datatype,
            b.datatype(),
            T::DATATYPE
        )));
    }
    let format = a.format();
    if format.is_interleaved() && !datatype.is_complex() {
        return Err(TrsmError::UnsupportedFormat(format!(
            "{:?} packing requires a complex datatype, got {}",
            format, datatype
        )));
    }
    if b.format() != format {
        return Err(TrsmError::UnsupportedFormat(format!(
            "A is packed as {:?} but B as {:?}",
            format,
            b.format()
        )));
    }

    let (cs_a, rs_b) = kernel_strides(format, a.col_stride(), b.row_stride());
    if a.row_stride() != 1 || cs_a != mr as isize || b.col_stride() != 1 || rs_b != nr as isize {
        return Err(TrsmError::InvalidStride(format!(
            "packed strides A ({}, {}) and B ({}, {}) do not match the {}x{} kernels",
            a.row_stride(),
            cs_a,
            rs_b,
            b.col_stride(),
            mr,
            nr
        )));
    }

    if m == 0 || n == 0 || k == 0 {
        return Ok(());
    }
    let Some(blk) = TriangularBlock::normalize(diagoffb, k, n, nr) else {
        return Ok(());
    };

    let ps_a = a.panel_stride();
    let ps_b = b.panel_stride();
    let ss_b = ps_b / blk.k_full as isize;
    if ps_a < (mr * blk.k_full) as isize || ss_b < nr as isize {
        return Err(TrsmError::InvalidStride(format!(
            "panel strides ({}, {}) too small for k = {}",
            ps_a, ps_b, k
        )));
    }

    let needed_a = m.div_ceil(mr) * ps_a as usize;
    if a.buffer_len() < needed_a {
        return Err(TrsmError::BufferTooSmall {
            needed: needed_a,
            len: a.buffer_len(),
        });
    }
    let needed_b = blk.packed_rows(nr) * ss_b as usize;
    if b.buffer_len() < needed_b {
        return Err(TrsmError::BufferTooSmall {
            needed: needed_b,
            len: b.buffer_len(),
        });
    }

    let alpha1 = a.scalar();
    unsafe {
        solve_multiply_block(
            diagoffb,
            m,
            n,
            k,
            alpha1,
            a.as_mut_ptr(),
            cs_a,
            mr,
            ps_a,
            b.as_ptr(),
            rs_b,
            nr,
            ps_b,
            alpha2,
            c.as_mut_ptr(),
            c.row_stride(),
            c.col_stride(),
            gemmtrsm_ukr,
            gemm_ukr,
        );
    }
    Ok(())
}
