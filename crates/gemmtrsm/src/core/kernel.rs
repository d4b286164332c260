use crate::types::{Complex32, Complex64, Element};
use std::ptr;

/// Hints passed along with every micro-kernel call.
///
/// `next_a` and `next_b` point at the micro-panels the engine will hand to
/// the kernel next, so an optimized kernel can prefetch them. `ps_a` and
/// `ps_b` are the strides of the panels currently being read. The portable
/// kernels ignore all of it.
#[derive(Debug)]
pub struct AuxInfo<T> {
    pub next_a: *const T,
    pub next_b: *const T,
    pub ps_a: isize,
    pub ps_b: isize,
}

impl<T> Clone for AuxInfo<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AuxInfo<T> {}

impl<T> Default for AuxInfo<T> {
    fn default() -> Self {
        Self {
            next_a: ptr::null(),
            next_b: ptr::null(),
            ps_a: 0,
            ps_b: 0,
        }
    }
}

/// Plain multiply micro-kernel on one `MR × NR` register block.
///
/// `a` is a packed micro-panel with element `(i, p)` at `a[p * MR + i]` and
/// `b` a packed micro-panel with element `(p, j)` at `b[p * NR + j]`.
pub trait GemmMicrokernel<T: Element> {
    /// Rows of the register block.
    const MR: usize;
    /// Columns of the register block.
    const NR: usize;

    /// `C = beta * C + alpha * (A · B)` over the full `MR × NR` block.
    ///
    /// When `beta` is zero `C` is not read, so it may hold garbage.
    ///
    /// # Safety
    /// - `a` must be valid for `k * MR` reads and `b` for `k * NR` reads
    /// - `c + i*rs_c + j*cs_c` must be valid for reads and writes for
    ///   `i < MR`, `j < NR`
    #[allow(clippy::too_many_arguments)]
    unsafe fn gemm(
        &self,
        k: usize,
        alpha: T,
        a: *const T,
        b: *const T,
        beta: T,
        c: *mut T,
        rs_c: isize,
        cs_c: isize,
        aux: &AuxInfo<T>,
    );
}

/// Fused multiply then triangular solve on one `MR × NR` register block.
pub trait GemmTrsmMicrokernel<T: Element> {
    const MR: usize;
    const NR: usize;

    /// Computes `a11 = alpha * a11 - a10 · b01`, then solves
    /// `X · b11 = a11` for `X` and stores `X` into both `a11` and `c11`.
    ///
    /// `a10` (`MR × k`) and `a11` (`MR × NR`) are consecutive pieces of one
    /// packed micro-panel of the multiply operand. `b01` (`k × NR`) and `b11`
    /// (`NR × NR`, upper triangular) are consecutive pieces of one packed
    /// panel of the triangular operand; the diagonal of `b11` holds
    /// reciprocals.
    ///
    /// # Safety
    /// - `a10`, `b01` valid for `k * MR` and `k * NR` reads
    /// - `a11` valid for `NR * MR` reads and writes, `b11` for `NR * NR` reads
    /// - `c11 + i*rs_c + j*cs_c` valid for writes for `i < MR`, `j < NR`
    #[allow(clippy::too_many_arguments)]
    unsafe fn gemmtrsm(
        &self,
        k: usize,
        alpha: T,
        b01: *const T,
        b11: *const T,
        a10: *const T,
        a11: *mut T,
        c11: *mut T,
        rs_c: isize,
        cs_c: isize,
        aux: &AuxInfo<T>,
    );
}

/// Portable scalar micro-kernels with an `MR × NR` register block.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableMicrokernel<const MR: usize, const NR: usize>;

impl<T: Element, const MR: usize, const NR: usize> GemmMicrokernel<T>
    for PortableMicrokernel<MR, NR>
{
    const MR: usize = MR;
    const NR: usize = NR;

    #[inline]
    unsafe fn gemm(
        &self,
        k: usize,
        alpha: T,
        a: *const T,
        b: *const T,
        beta: T,
        c: *mut T,
        rs_c: isize,
        cs_c: isize,
        _aux: &AuxInfo<T>,
    ) {
        let mut acc = [[T::zero(); NR]; MR];

        for p in 0..k {
            let a_col = a.add(p * MR);
            let b_row = b.add(p * NR);
            for (i, acc_row) in acc.iter_mut().enumerate() {
                let a_ip = *a_col.add(i);
                for (j, acc_ij) in acc_row.iter_mut().enumerate() {
                    *acc_ij = acc_ij.mul_add(a_ip, *b_row.add(j));
                }
            }
        }

        let beta_is_zero = beta.is_zero();
        for (i, acc_row) in acc.iter().enumerate() {
            for (j, &acc_ij) in acc_row.iter().enumerate() {
                let cij = c.offset(i as isize * rs_c + j as isize * cs_c);
                *cij = if beta_is_zero {
                    alpha * acc_ij
                } else {
                    beta * *cij + alpha * acc_ij
                };
            }
        }
    }
}

impl<T: Element, const MR: usize, const NR: usize> GemmTrsmMicrokernel<T>
    for PortableMicrokernel<MR, NR>
{
    const MR: usize = MR;
    const NR: usize = NR;

    unsafe fn gemmtrsm(
        &self,
        k: usize,
        alpha: T,
        b01: *const T,
        b11: *const T,
        a10: *const T,
        a11: *mut T,
        c11: *mut T,
        rs_c: isize,
        cs_c: isize,
        aux: &AuxInfo<T>,
    ) {
        // a11 is column-major inside the packed micro-panel.
        GemmMicrokernel::<T>::gemm(
            self,
            k,
            T::minus_one(),
            a10,
            b01,
            alpha,
            a11,
            1,
            MR as isize,
            aux,
        );

        // Forward substitution over the columns of the upper triangle.
        for j in 0..NR {
            let inv_bjj = *b11.add(j * NR + j);
            for i in 0..MR {
                let mut x = *a11.add(j * MR + i);
                for p in 0..j {
                    x = x - *a11.add(p * MR + i) * *b11.add(p * NR + j);
                }
                let x = x * inv_bjj;
                *a11.add(j * MR + i) = x;
                *c11.offset(i as isize * rs_c + j as isize * cs_c) = x;
            }
        }
    }
}

/// Binds an element type to its micro-kernels.
///
/// Resolved at compile time, once per call of the driver.
pub trait KernelDispatch: Element {
    type Kernel: GemmMicrokernel<Self> + GemmTrsmMicrokernel<Self> + Default + Sync;

    fn kernel() -> Self::Kernel {
        Self::Kernel::default()
    }
}

impl KernelDispatch for f32 {
    type Kernel = PortableMicrokernel<8, 4>;
}

impl KernelDispatch for f64 {
    type Kernel = PortableMicrokernel<8, 8>;
}

impl KernelDispatch for Complex32 {
    type Kernel = PortableMicrokernel<8, 4>;
}

impl KernelDispatch for Complex64 {
    type Kernel = PortableMicrokernel<8, 4>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_cols<const MR: usize>(a: &[[f64; MR]]) -> Vec<f64> {
        a.iter().flat_map(|col| col.iter().copied()).collect()
    }

    #[test]
    fn test_gemm_2x2() {
        let kernel = PortableMicrokernel::<2, 2>;
        // A = [1 2; 3 4] packed by columns, B = [5 6; 7 8] packed by rows.
        let a = pack_cols(&[[1.0, 3.0], [2.0, 4.0]]);
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0f64; 4];

        unsafe {
            GemmMicrokernel::<f64>::gemm(
                &kernel,
                2,
                1.0,
                a.as_ptr(),
                b.as_ptr(),
                0.0,
                c.as_mut_ptr(),
                2,
                1,
                &AuxInfo::default(),
            );
        }
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_gemm_beta_zero_ignores_c() {
        let kernel = PortableMicrokernel::<1, 1>;
        let mut c = [f64::NAN];
        unsafe {
            GemmMicrokernel::<f64>::gemm(
                &kernel,
                1,
                -1.0,
                [2.0].as_ptr(),
                [3.0].as_ptr(),
                0.0,
                c.as_mut_ptr(),
                1,
                1,
                &AuxInfo::default(),
            );
        }
        assert_eq!(c, [-6.0]);
    }

    #[test]
    fn test_gemm_accumulates_with_beta() {
        let kernel = PortableMicrokernel::<1, 2>;
        let mut c = [1.0f32, 2.0];
        unsafe {
            GemmMicrokernel::<f32>::gemm(
                &kernel,
                1,
                -1.0,
                [1.0].as_ptr(),
                [3.0, 4.0].as_ptr(),
                2.0,
                c.as_mut_ptr(),
                0,
                1,
                &AuxInfo::default(),
            );
        }
        assert_eq!(c, [-1.0, 0.0]);
    }

    #[test]
    fn test_gemmtrsm_solves_block() {
        let kernel = PortableMicrokernel::<2, 2>;
        // b11 = [2 1; 0 4] with the diagonal stored inverted.
        let b11 = [0.5, 1.0, 0.0, 0.25];
        // X = [1 2; 3 4] gives X·b11 = [2 9; 6 19].
        let mut a11 = pack_cols(&[[2.0, 6.0], [9.0, 19.0]]);
        let mut c = [0.0f64; 4];

        unsafe {
            GemmTrsmMicrokernel::<f64>::gemmtrsm(
                &kernel,
                0,
                1.0,
                ptr::null(),
                b11.as_ptr(),
                ptr::null(),
                a11.as_mut_ptr(),
                c.as_mut_ptr(),
                2,
                1,
                &AuxInfo::default(),
            );
        }
        assert_eq!(c, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a11, pack_cols(&[[1.0, 3.0], [2.0, 4.0]]));
    }

    #[test]
    fn test_gemmtrsm_subtracts_update_and_scales() {
        let kernel = PortableMicrokernel::<1, 1>;
        // alpha * a11 - a10 · b01 = 3*4 - 2*1 = 10, divided by 5.
        let mut a = [2.0f64, 4.0];
        let b = [1.0, 0.2];
        let mut c = [0.0f64];
        unsafe {
            let a_ptr = a.as_mut_ptr();
            GemmTrsmMicrokernel::<f64>::gemmtrsm(
                &kernel,
                1,
                3.0,
                b.as_ptr(),
                b.as_ptr().add(1),
                a_ptr,
                a_ptr.add(1),
                c.as_mut_ptr(),
                1,
                1,
                &AuxInfo::default(),
            );
        }
        assert!((c[0] - 2.0).abs() < 1e-12);
        assert!((a[1] - 2.0).abs() < 1e-12);
        assert_eq!(a[0], 2.0);
    }

    #[test]
    fn test_dispatch_register_blocks() {
        assert_eq!(<<f32 as KernelDispatch>::Kernel as GemmMicrokernel<f32>>::NR, 4);
        assert_eq!(<<f64 as KernelDispatch>::Kernel as GemmMicrokernel<f64>>::NR, 8);
        assert_eq!(
            <<Complex64 as KernelDispatch>::Kernel as GemmTrsmMicrokernel<Complex64>>::MR,
            8
        );
    }
}
