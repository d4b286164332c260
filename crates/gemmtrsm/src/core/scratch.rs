use crate::types::Element;

/// Largest register block row count any kernel may use.
pub const MAX_MR: usize = 16;
/// Largest register block column count any kernel may use.
pub const MAX_NR: usize = 16;

/// Stack scratch tile for register blocks that hang off the edge of the
/// output.
///
/// Column-major with a fixed column stride of [`MAX_MR`], so any `mr × nr`
/// kernel can write a full block into it. The engine clears it once per call
/// and reuses it for every edge block; entries outside the valid region are
/// never copied out.
#[repr(C, align(64))]
pub struct EdgeBuffer<T> {
    data: [T; MAX_MR * MAX_NR],
}

impl<T: Element> EdgeBuffer<T> {
    pub const ROW_STRIDE: isize = 1;
    pub const COL_STRIDE: isize = MAX_MR as isize;

    pub fn zeroed() -> Self {
        Self {
            data: [T::zero(); MAX_MR * MAX_NR],
        }
    }

    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i + j * MAX_MR]
    }

    /// `c[i, j] = self[i, j]` over the leading `m × n` region.
    ///
    /// # Safety
    /// `c + i*rs_c + j*cs_c` must be valid for writes for `i < m`, `j < n`.
    #[inline]
    pub unsafe fn copy_to(&self, m: usize, n: usize, c: *mut T, rs_c: isize, cs_c: isize) {
        debug_assert!(m <= MAX_MR && n <= MAX_NR);
        for j in 0..n {
            for i in 0..m {
                *c.offset(i as isize * rs_c + j as isize * cs_c) = self.get(i, j);
            }
        }
    }

    /// `c[i, j] = self[i, j] + beta * c[i, j]` over the leading `m × n`
    /// region.
    ///
    /// # Safety
    /// `c + i*rs_c + j*cs_c` must be valid for reads and writes for `i < m`,
    /// `j < n`.
    #[inline]
    pub unsafe fn xpby_to(
        &self,
        m: usize,
        n: usize,
        beta: T,
        c: *mut T,
        rs_c: isize,
        cs_c: isize,
    ) {
        debug_assert!(m <= MAX_MR && n <= MAX_NR);
        for j in 0..n {
            for i in 0..m {
                let cij = c.offset(i as isize * rs_c + j as isize * cs_c);
                *cij = self.get(i, j) + beta * *cij;
            }
        }
    }
}
