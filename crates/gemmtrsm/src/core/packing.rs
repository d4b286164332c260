//! Packing of the two operands into micro-panel buffers.
//!
//! The multiply operand is stored as row micro-panels of `mr` rows, each
//! `k_pad` columns long with element `(i, p)` at `p * mr + i`. The
//! triangular operand is stored as column micro-panels of `nr` columns with
//! element `(p, q)` at `p * nr + q`; each panel only keeps the rows that can
//! be nonzero, its diagonal holds reciprocals, and the diagonal continues as
//! ones into the zero padding.
//!
//! The engine reads both buffers through [`PackedOperand`], which is how a
//! caller-provided packing (for instance an interleaved complex format) can
//! be plugged in instead of the routines here.

use super::diag::TriangularBlock;
use super::layout::Diag;
use super::tiling::round_up;
use crate::mat::MatRef;
use crate::types::{Datatype, Element};

/// Storage convention of a packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackFormat {
    /// One element per logical entry.
    #[default]
    Standard,
    /// Complex entries split into real and imaginary micro-panels, for the
    /// 4m method.
    Interleaved4m,
    /// As [`PackFormat::Interleaved4m`] plus a panel of `re + im` sums, for
    /// the 3m method.
    Interleaved3m,
}

impl PackFormat {
    /// Whether complex entries are split across real-valued panels.
    #[inline]
    pub fn is_interleaved(self) -> bool {
        !matches!(self, PackFormat::Standard)
    }
}

/// Read access to a packed operand, as consumed by the engine.
///
/// # Safety
/// Implementors guarantee that `as_ptr()` is valid for `buffer_len()` reads,
/// and that the strides, panel dimension and panel stride describe that
/// buffer. The engine dereferences it without further checks.
pub unsafe trait PackedOperand<T: Element> {
    /// Logical rows.
    fn rows(&self) -> usize;
    /// Logical columns.
    fn cols(&self) -> usize;
    /// Distance between rows inside a micro-panel.
    fn row_stride(&self) -> isize;
    /// Distance between columns inside a micro-panel.
    fn col_stride(&self) -> isize;
    /// `mr` or `nr`.
    fn panel_dim(&self) -> usize;
    /// Distance between consecutive micro-panels.
    fn panel_stride(&self) -> isize;
    /// Offset of the diagonal, for triangular operands.
    fn diag_offset(&self) -> isize {
        0
    }
    fn as_ptr(&self) -> *const T;
    /// Scalar attached to the operand but not yet applied.
    fn scalar(&self) -> T {
        T::one()
    }
    fn format(&self) -> PackFormat {
        PackFormat::Standard
    }
    fn datatype(&self) -> Datatype {
        T::DATATYPE
    }
    /// Elements addressable from `as_ptr()`.
    fn buffer_len(&self) -> usize;
}

/// A packed operand the engine may overwrite.
///
/// # Safety
/// `as_mut_ptr()` must be valid for `buffer_len()` reads and writes.
pub unsafe trait PackedOperandMut<T: Element>: PackedOperand<T> {
    fn as_mut_ptr(&mut self) -> *mut T;
}

/// Size of the buffer [`pack_panels`] produces.
pub fn packed_panels_len(m: usize, k: usize, mr: usize, k_align: usize) -> usize {
    m.div_ceil(mr) * mr * round_up(k, k_align)
}

/// An `m × k` operand packed into row micro-panels.
#[derive(Debug, Clone)]
pub struct PackedPanels<T> {
    data: Vec<T>,
    m: usize,
    k: usize,
    mr: usize,
    k_pad: usize,
    scalar: T,
}

impl<T: Element> PackedPanels<T> {
    /// Number of micro-panels.
    pub fn num_panels(&self) -> usize {
        self.m.div_ceil(self.mr)
    }

    /// Reads logical element `(i, p)`.
    pub fn get(&self, i: usize, p: usize) -> T {
        assert!(i < self.m && p < self.k, "({}, {}) out of bounds", i, p);
        let (r, ii) = (i / self.mr, i % self.mr);
        self.data[r * self.mr * self.k_pad + p * self.mr + ii]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

unsafe impl<T: Element> PackedOperand<T> for PackedPanels<T> {
    fn rows(&self) -> usize {
        self.m
    }
    fn cols(&self) -> usize {
        self.k
    }
    fn row_stride(&self) -> isize {
        1
    }
    fn col_stride(&self) -> isize {
        self.mr as isize
    }
    fn panel_dim(&self) -> usize {
        self.mr
    }
    fn panel_stride(&self) -> isize {
        (self.mr * self.k_pad) as isize
    }
    fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }
    fn scalar(&self) -> T {
        self.scalar
    }
    fn buffer_len(&self) -> usize {
        self.data.len()
    }
}

unsafe impl<T: Element> PackedOperandMut<T> for PackedPanels<T> {
    fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }
}

/// Packs `src` into row micro-panels of `mr` rows.
///
/// The column count is padded to a multiple of `k_align` and the row count
/// to a multiple of `mr`; padding is zero. `scalar` is attached to the
/// result without being applied.
pub fn pack_panels<T: Element>(
    src: MatRef<'_, T>,
    mr: usize,
    k_align: usize,
    scalar: T,
) -> PackedPanels<T> {
    assert!(mr > 0 && k_align > 0, "panel dimensions must be positive");
    let (m, k) = (src.nrows(), src.ncols());
    let k_pad = round_up(k, k_align);
    let ps = mr * k_pad;
    let mut data = vec![T::zero(); packed_panels_len(m, k, mr, k_align)];

    for (r, panel) in data.chunks_exact_mut(ps.max(1)).enumerate() {
        let rows = (m - r * mr).min(mr);
        for p in 0..k {
            for i in 0..rows {
                panel[p * mr + i] = unsafe { src.get_unchecked(r * mr + i, p) };
            }
        }
    }

    PackedPanels {
        data,
        m,
        k,
        mr,
        k_pad,
        scalar,
    }
}

/// A `k × n` upper triangular operand packed into column micro-panels.
#[derive(Debug, Clone)]
pub struct PackedTriangular<T> {
    data: Vec<T>,
    k: usize,
    n: usize,
    nr: usize,
    diagoff: isize,
    k_full: usize,
}

impl<T: Element> PackedTriangular<T> {
    /// Leading columns that lie entirely below the diagonal and were not
    /// stored.
    pub fn skipped_cols(&self) -> usize {
        TriangularBlock::normalize(self.diagoff, self.k, self.n, self.nr)
            .map_or(self.n, |blk| blk.skipped_cols)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

unsafe impl<T: Element> PackedOperand<T> for PackedTriangular<T> {
    fn rows(&self) -> usize {
        self.k
    }
    fn cols(&self) -> usize {
        self.n
    }
    fn row_stride(&self) -> isize {
        self.nr as isize
    }
    fn col_stride(&self) -> isize {
        1
    }
    fn panel_dim(&self) -> usize {
        self.nr
    }
    fn panel_stride(&self) -> isize {
        (self.k_full * self.nr) as isize
    }
    fn diag_offset(&self) -> isize {
        self.diagoff
    }
    fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }
    fn buffer_len(&self) -> usize {
        self.data.len()
    }
}

/// Packs the upper triangle of the `k × n` block `src`, whose diagonal sits
/// at offset `diagoff`, into column micro-panels of `nr` columns.
///
/// Only entries on or above the diagonal are read. With `conj` every read
/// entry is conjugated first. Diagonal entries are stored as reciprocals, or
/// as one when `diag` is [`Diag::Unit`].
pub fn pack_upper_triangular<T: Element>(
    src: MatRef<'_, T>,
    diagoff: isize,
    nr: usize,
    diag: Diag,
    conj: bool,
) -> PackedTriangular<T> {
    assert!(nr > 0, "panel dimension must be positive");
    let (k, n) = (src.nrows(), src.ncols());
    let k_full = round_up(k, nr);

    let data = match TriangularBlock::normalize(diagoff, k, n, nr) {
        None => Vec::new(),
        Some(blk) => {
            let mut data = vec![T::zero(); blk.packed_rows(nr) * nr];
            let read = |i: usize, j: usize| {
                let v = unsafe { src.get_unchecked(i, j) };
                if conj {
                    v.conj()
                } else {
                    v
                }
            };

            let mut offset = 0;
            for panel in blk.panels(nr) {
                let buf = &mut data[offset..offset + panel.k_b0111 * nr];
                for p in 0..panel.k_b0111 {
                    for q in 0..nr {
                        let rel = (panel.index * nr + q) as isize - p as isize - blk.diagoff;
                        let col = blk.skipped_cols + panel.index * nr + q;
                        let in_bounds = p < k && col < n;
                        buf[p * nr + q] = match (rel.signum(), in_bounds) {
                            (-1, _) => T::zero(),
                            (0, true) => match diag {
                                Diag::Unit => T::one(),
                                Diag::NonUnit => read(p, col).recip(),
                            },
                            (0, false) => T::one(),
                            (_, true) => read(p, col),
                            (_, false) => T::zero(),
                        };
                    }
                }
                offset += panel.k_b0111 * nr;
            }
            data
        }
    };

    PackedTriangular {
        data,
        k,
        n,
        nr,
        diagoff,
        k_full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Complex64;

    #[test]
    fn test_pack_panels_layout() {
        // 3x2 row-major: [1 2; 3 4; 5 6]
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let src = MatRef::from_row_major(&data, 3, 2).unwrap();
        let packed = pack_panels(src, 2, 4, 1.0);

        assert_eq!(packed.num_panels(), 2);
        assert_eq!(packed.panel_stride(), 8);
        assert_eq!(packed.col_stride(), 2);
        assert_eq!(packed.buffer_len(), 16);
        assert_eq!(
            packed.as_slice(),
            &[
                1.0, 3.0, 2.0, 4.0, 0.0, 0.0, 0.0, 0.0, //
                5.0, 0.0, 6.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            ]
        );
        assert_eq!(packed.get(2, 1), 6.0);
    }

    #[test]
    fn test_pack_panels_keeps_scalar_unapplied() {
        let data = [2.0f32; 4];
        let src = MatRef::from_col_major(&data, 2, 2).unwrap();
        let packed = pack_panels(src, 2, 2, 3.0);
        assert_eq!(packed.scalar(), 3.0);
        assert!(packed.as_slice().iter().all(|&x| x == 2.0));
    }

    #[test]
    fn test_pack_panels_empty() {
        let data: [f64; 0] = [];
        let src = MatRef::from_col_major(&data, 0, 3).unwrap();
        assert_eq!(pack_panels(src, 4, 4, 1.0).buffer_len(), 0);
    }

    #[test]
    fn test_pack_upper_triangular_square() {
        // U = [2 1 3; . 4 5; . . 8], lower part poisoned.
        let data = [2.0f64, 1.0, 3.0, f64::NAN, 4.0, 5.0, f64::NAN, f64::NAN, 8.0];
        let src = MatRef::from_row_major(&data, 3, 3).unwrap();
        let packed = pack_upper_triangular(src, 0, 2, Diag::NonUnit, false);

        // Panel 0: 2 rows. Panel 1: 4 rows with the identity extended into
        // the padding column.
        assert_eq!(
            packed.as_slice(),
            &[
                0.5, 1.0, //
                0.0, 0.25, //
                3.0, 0.0, //
                5.0, 0.0, //
                0.125, 0.0, //
                0.0, 1.0,
            ]
        );
        assert_eq!(packed.panel_stride(), 8);
        assert_eq!(packed.skipped_cols(), 0);
        assert!(packed.as_slice().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_pack_upper_triangular_unit_diag() {
        let data = [0.0f64, 7.0, f64::NAN, 0.0];
        let src = MatRef::from_row_major(&data, 2, 2).unwrap();
        let packed = pack_upper_triangular(src, 0, 2, Diag::Unit, false);
        assert_eq!(packed.as_slice(), &[1.0, 7.0, 0.0, 1.0]);
    }

    #[test]
    fn test_pack_upper_triangular_skips_leading_panels() {
        // 2x6 block whose diagonal starts at column 4.
        let data: Vec<f64> = (1..=12).map(|x| x as f64).collect();
        let src = MatRef::from_row_major(&data, 2, 6).unwrap();
        let packed = pack_upper_triangular(src, 4, 2, Diag::NonUnit, false);
        assert_eq!(packed.skipped_cols(), 4);
        assert_eq!(packed.as_slice(), &[1.0 / 5.0, 6.0, 0.0, 1.0 / 12.0]);
    }

    #[test]
    fn test_pack_upper_triangular_below_is_empty() {
        let data = [1.0f64; 4];
        let src = MatRef::from_row_major(&data, 2, 2).unwrap();
        let packed = pack_upper_triangular(src, 2, 2, Diag::NonUnit, false);
        assert_eq!(packed.buffer_len(), 0);
    }

    #[test]
    fn test_pack_upper_triangular_conj() {
        let data = [Complex64::new(0.0, 2.0), Complex64::new(1.0, 1.0)];
        let src = MatRef::from_row_major(&data, 1, 2).unwrap();
        let packed = pack_upper_triangular(src, 0, 2, Diag::NonUnit, true);
        let s = packed.as_slice();
        // conj(2i) = -2i, whose reciprocal is 0.5i.
        assert_eq!(s[0], Complex64::new(0.0, 0.5));
        assert_eq!(s[1], Complex64::new(1.0, -1.0));
        assert_eq!(s[3], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_pack_format() {
        assert!(!PackFormat::Standard.is_interleaved());
        assert!(PackFormat::Interleaved3m.is_interleaved());
    }
}
