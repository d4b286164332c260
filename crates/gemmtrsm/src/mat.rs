//! Strided matrix views.
//!
//! [`MatRef`] and [`MatMut`] describe a `nrows × ncols` matrix laid over a
//! buffer with arbitrary signed row and column strides. Transposition and
//! reversal are free: they only rewrite the pointer and strides. This is
//! what lets every side/triangle combination of the front-end run through
//! the single right-side upper-triangular engine.
//!
//! ```rust
//! use gemmtrsm::{MatMut, MatRef};
//!
//! let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let a = MatRef::from_row_major(&data, 2, 3).unwrap();
//! assert_eq!(a.get(1, 0), 4.0);
//! assert_eq!(a.transpose().get(0, 1), 4.0);
//! assert_eq!(a.reverse_cols().get(0, 0), 3.0);
//!
//! let mut buf = [0.0f64; 4];
//! let mut c = MatMut::from_col_major(&mut buf, 2, 2).unwrap();
//! c.set(1, 0, 9.0);
//! assert_eq!(buf[1], 9.0);
//! ```

use crate::error::{Result, TrsmError};
use std::marker::PhantomData;

/// Number of elements a strided view with non-negative strides spans.
fn required_len(nrows: usize, ncols: usize, rs: usize, cs: usize) -> Result<usize> {
    if nrows == 0 || ncols == 0 {
        return Ok(0);
    }
    (nrows - 1)
        .checked_mul(rs)
        .and_then(|r| (ncols - 1).checked_mul(cs).and_then(|c| r.checked_add(c)))
        .and_then(|last| last.checked_add(1))
        .ok_or_else(|| {
            TrsmError::InvalidStride(format!(
                "{}x{} view with strides ({}, {}) overflows",
                nrows, ncols, rs, cs
            ))
        })
}

fn check_strides(nrows: usize, ncols: usize, rs: usize, cs: usize, len: usize) -> Result<()> {
    if rs > isize::MAX as usize || cs > isize::MAX as usize {
        return Err(TrsmError::InvalidStride(format!(
            "strides ({}, {}) exceed isize::MAX",
            rs, cs
        )));
    }
    let needed = required_len(nrows, ncols, rs, cs)?;
    if needed > len {
        return Err(TrsmError::BufferTooSmall { needed, len });
    }
    Ok(())
}

/// Rejects stride pairs under which two distinct indices share an element.
///
/// Sufficient condition: along the smaller stride the whole extent fits
/// strictly inside one step of the larger stride.
fn check_injective(nrows: usize, ncols: usize, rs: usize, cs: usize) -> Result<()> {
    if nrows <= 1 || ncols <= 1 {
        if (nrows > 1 && rs == 0) || (ncols > 1 && cs == 0) {
            return Err(TrsmError::InvalidStride(
                "zero stride would alias elements of a mutable view".into(),
            ));
        }
        return Ok(());
    }
    let ((s_small, n_small), (s_big, _)) = if rs <= cs {
        ((rs, nrows), (cs, ncols))
    } else {
        ((cs, ncols), (rs, nrows))
    };
    // Both extents are at least two here.
    let span = s_small.checked_mul(n_small - 1);
    if s_small == 0 || span.map_or(true, |span| span >= s_big) {
        return Err(TrsmError::InvalidStride(format!(
            "strides ({}, {}) alias elements of a {}x{} mutable view",
            rs, cs, nrows, ncols
        )));
    }
    Ok(())
}

/// Immutable strided view over a matrix.
pub struct MatRef<'a, T> {
    ptr: *const T,
    nrows: usize,
    ncols: usize,
    rs: isize,
    cs: isize,
    _marker: PhantomData<&'a [T]>,
}

impl<T> Clone for MatRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MatRef<'_, T> {}

unsafe impl<T: Sync> Send for MatRef<'_, T> {}
unsafe impl<T: Sync> Sync for MatRef<'_, T> {}

impl<'a, T> MatRef<'a, T> {
    /// Creates a view from a pointer to element `(0, 0)`, the dimensions and
    /// the strides.
    ///
    /// # Safety
    /// Every `ptr + i*rs + j*cs` for `i < nrows`, `j < ncols` must be valid
    /// for reads for the lifetime `'a`.
    pub unsafe fn from_raw_parts(
        ptr: *const T,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self {
            ptr,
            nrows,
            ncols,
            rs: row_stride,
            cs: col_stride,
            _marker: PhantomData,
        }
    }

    /// Creates a view over a slice with the given strides.
    pub fn from_slice(
        data: &'a [T],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Result<Self> {
        check_strides(nrows, ncols, row_stride, col_stride, data.len())?;
        Ok(unsafe {
            Self::from_raw_parts(
                data.as_ptr(),
                nrows,
                ncols,
                row_stride as isize,
                col_stride as isize,
            )
        })
    }

    /// Creates a view over row-major data.
    pub fn from_row_major(data: &'a [T], nrows: usize, ncols: usize) -> Result<Self> {
        Self::from_slice(data, nrows, ncols, ncols, 1)
    }

    /// Creates a view over column-major data.
    pub fn from_col_major(data: &'a [T], nrows: usize, ncols: usize) -> Result<Self> {
        Self::from_slice(data, nrows, ncols, 1, nrows)
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn row_stride(&self) -> isize {
        self.rs
    }

    #[inline]
    pub fn col_stride(&self) -> isize {
        self.cs
    }

    /// Pointer to element `(0, 0)`.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// Returns the transposed view.
    pub fn transpose(self) -> Self {
        unsafe { Self::from_raw_parts(self.ptr, self.ncols, self.nrows, self.cs, self.rs) }
    }

    /// Returns the view with the row order reversed.
    pub fn reverse_rows(self) -> Self {
        if self.nrows == 0 || self.ncols == 0 {
            return self;
        }
        let last = (self.nrows - 1) as isize * self.rs;
        unsafe {
            Self::from_raw_parts(
                self.ptr.wrapping_offset(last),
                self.nrows,
                self.ncols,
                -self.rs,
                self.cs,
            )
        }
    }

    /// Returns the view with the column order reversed.
    pub fn reverse_cols(self) -> Self {
        self.transpose().reverse_rows().transpose()
    }

    /// Returns the `nrows × ncols` block starting at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the block does not fit in the view.
    pub fn submatrix(self, row: usize, col: usize, nrows: usize, ncols: usize) -> Self {
        assert!(
            row + nrows <= self.nrows && col + ncols <= self.ncols,
            "submatrix ({}, {}) of size {}x{} out of bounds for {}x{} view",
            row,
            col,
            nrows,
            ncols,
            self.nrows,
            self.ncols
        );
        unsafe {
            Self::from_raw_parts(
                self.ptr_at(row, col),
                nrows,
                ncols,
                self.rs,
                self.cs,
            )
        }
    }

    #[inline(always)]
    fn ptr_at(&self, i: usize, j: usize) -> *const T {
        self.ptr
            .wrapping_offset(i as isize * self.rs + j as isize * self.cs)
    }
}

impl<T: Copy> MatRef<'_, T> {
    /// Reads element `(i, j)`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.nrows && j < self.ncols,
            "index ({}, {}) out of bounds for {}x{} view",
            i,
            j,
            self.nrows,
            self.ncols
        );
        unsafe { self.get_unchecked(i, j) }
    }

    /// Reads element `(i, j)` without bounds checking.
    ///
    /// # Safety
    /// `i < nrows` and `j < ncols`.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.nrows && j < self.ncols);
        *self.ptr_at(i, j)
    }

    /// Copies the view into a column-major `Vec`.
    pub fn to_col_major(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.nrows * self.ncols);
        for j in 0..self.ncols {
            for i in 0..self.nrows {
                out.push(unsafe { self.get_unchecked(i, j) });
            }
        }
        out
    }
}

/// Mutable strided view over a matrix.
pub struct MatMut<'a, T> {
    ptr: *mut T,
    nrows: usize,
    ncols: usize,
    rs: isize,
    cs: isize,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for MatMut<'_, T> {}
unsafe impl<T: Sync> Sync for MatMut<'_, T> {}

impl<'a, T> MatMut<'a, T> {
    /// Creates a mutable view from raw parts.
    ///
    /// # Safety
    /// Every `ptr + i*rs + j*cs` for `i < nrows`, `j < ncols` must be valid
    /// for reads and writes for the lifetime `'a`, distinct indices must map
    /// to distinct elements, and nothing else may access them meanwhile.
    pub unsafe fn from_raw_parts_mut(
        ptr: *mut T,
        nrows: usize,
        ncols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self {
            ptr,
            nrows,
            ncols,
            rs: row_stride,
            cs: col_stride,
            _marker: PhantomData,
        }
    }

    /// Creates a mutable view over a slice with the given strides.
    ///
    /// Returns [`TrsmError::InvalidStride`] if distinct indices could map to
    /// the same element, e.g. a zero stride or `rs = cs = 1`.
    pub fn from_slice_mut(
        data: &'a mut [T],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Result<Self> {
        check_injective(nrows, ncols, row_stride, col_stride)?;
        check_strides(nrows, ncols, row_stride, col_stride, data.len())?;
        Ok(unsafe {
            Self::from_raw_parts_mut(
                data.as_mut_ptr(),
                nrows,
                ncols,
                row_stride as isize,
                col_stride as isize,
            )
        })
    }

    /// Creates a mutable view over row-major data.
    pub fn from_row_major(data: &'a mut [T], nrows: usize, ncols: usize) -> Result<Self> {
        Self::from_slice_mut(data, nrows, ncols, ncols.max(1), 1)
    }

    /// Creates a mutable view over column-major data.
    pub fn from_col_major(data: &'a mut [T], nrows: usize, ncols: usize) -> Result<Self> {
        Self::from_slice_mut(data, nrows, ncols, 1, nrows.max(1))
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn row_stride(&self) -> isize {
        self.rs
    }

    #[inline]
    pub fn col_stride(&self) -> isize {
        self.cs
    }

    /// Pointer to element `(0, 0)`.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }

    /// Reborrows as an immutable view.
    pub fn rb(&self) -> MatRef<'_, T> {
        unsafe { MatRef::from_raw_parts(self.ptr, self.nrows, self.ncols, self.rs, self.cs) }
    }

    /// Reborrows as a shorter-lived mutable view.
    pub fn rb_mut(&mut self) -> MatMut<'_, T> {
        unsafe { MatMut::from_raw_parts_mut(self.ptr, self.nrows, self.ncols, self.rs, self.cs) }
    }

    /// Returns the transposed view.
    pub fn transpose(self) -> Self {
        unsafe { Self::from_raw_parts_mut(self.ptr, self.ncols, self.nrows, self.cs, self.rs) }
    }

    /// Returns the view with the row order reversed.
    pub fn reverse_rows(self) -> Self {
        if self.nrows == 0 || self.ncols == 0 {
            return self;
        }
        let last = (self.nrows - 1) as isize * self.rs;
        unsafe {
            Self::from_raw_parts_mut(
                self.ptr.wrapping_offset(last),
                self.nrows,
                self.ncols,
                -self.rs,
                self.cs,
            )
        }
    }

    /// Returns the view with the column order reversed.
    pub fn reverse_cols(self) -> Self {
        self.transpose().reverse_rows().transpose()
    }

    /// Returns the `nrows × ncols` block starting at `(row, col)`.
    ///
    /// # Panics
    /// Panics if the block does not fit in the view.
    pub fn submatrix(self, row: usize, col: usize, nrows: usize, ncols: usize) -> Self {
        assert!(
            row + nrows <= self.nrows && col + ncols <= self.ncols,
            "submatrix ({}, {}) of size {}x{} out of bounds for {}x{} view",
            row,
            col,
            nrows,
            ncols,
            self.nrows,
            self.ncols
        );
        let ptr = self
            .ptr
            .wrapping_offset(row as isize * self.rs + col as isize * self.cs);
        unsafe { Self::from_raw_parts_mut(ptr, nrows, ncols, self.rs, self.cs) }
    }

    /// Splits into rows `[0, row)` and `[row, nrows)`.
    pub fn split_at_row(self, row: usize) -> (Self, Self) {
        assert!(row <= self.nrows, "split row {} > {}", row, self.nrows);
        let top = unsafe { Self::from_raw_parts_mut(self.ptr, row, self.ncols, self.rs, self.cs) };
        let ptr = self.ptr.wrapping_offset(row as isize * self.rs);
        let bottom =
            unsafe { Self::from_raw_parts_mut(ptr, self.nrows - row, self.ncols, self.rs, self.cs) };
        (top, bottom)
    }

    /// Splits into consecutive row blocks of at most `block` rows.
    pub fn row_blocks(self, block: usize) -> Vec<Self> {
        assert!(block > 0, "row block size must be positive");
        let mut blocks = Vec::with_capacity(self.nrows.div_ceil(block));
        let mut rest = self;
        while rest.nrows > block {
            let (top, bottom) = rest.split_at_row(block);
            blocks.push(top);
            rest = bottom;
        }
        if rest.nrows > 0 {
            blocks.push(rest);
        }
        blocks
    }

    #[inline(always)]
    fn ptr_at(&self, i: usize, j: usize) -> *mut T {
        self.ptr
            .wrapping_offset(i as isize * self.rs + j as isize * self.cs)
    }
}

impl<T: Copy> MatMut<'_, T> {
    /// Reads element `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> T {
        self.rb().get(i, j)
    }

    /// Writes element `(i, j)`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(
            i < self.nrows && j < self.ncols,
            "index ({}, {}) out of bounds for {}x{} view",
            i,
            j,
            self.nrows,
            self.ncols
        );
        unsafe { *self.ptr_at(i, j) = value }
    }
}
