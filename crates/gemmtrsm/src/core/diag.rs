//! Classification of blocks against the diagonal of a triangular operand.
//!
//! A block of the triangular operand with diagonal offset `d` has its
//! element `(i, j)` on the diagonal when `j - i == d`. For an upper
//! triangular operand, everything with `j - i < d` is implicitly zero.
//!
//! The packer and the engine both walk column panels through
//! [`TriangularBlock::panels`], so their idea of which panels exist and how
//! long each one is cannot drift apart.

use super::tiling::round_up;

/// Whether an `m × n` block lies strictly above the diagonal.
#[inline]
pub fn is_strictly_above_diag(diagoff: isize, m: usize, _n: usize) -> bool {
    m as isize <= -diagoff
}

/// Whether an `m × n` block lies strictly below the diagonal.
#[inline]
pub fn is_strictly_below_diag(diagoff: isize, _m: usize, n: usize) -> bool {
    n as isize <= diagoff
}

/// Whether an `m × n` block contains at least one diagonal element.
#[inline]
pub fn intersects_diag(diagoff: isize, m: usize, n: usize) -> bool {
    !is_strictly_above_diag(diagoff, m, n) && !is_strictly_below_diag(diagoff, m, n)
}

/// Where a `k × nr` column panel sits relative to the diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    /// Contains diagonal elements: fused multiply+solve.
    Intersects,
    /// Fully above the diagonal: plain multiply.
    StrictlyAbove,
    /// Fully below the diagonal: implicitly zero, never touched.
    StrictlyBelow,
}

/// Classifies the `k × nr` panel whose diagonal offset is `diagoff_j`.
#[inline]
pub fn classify_panel(diagoff_j: isize, k: usize, nr: usize) -> PanelKind {
    if is_strictly_above_diag(diagoff_j, k, nr) {
        PanelKind::StrictlyAbove
    } else if is_strictly_below_diag(diagoff_j, k, nr) {
        PanelKind::StrictlyBelow
    } else {
        PanelKind::Intersects
    }
}

/// Returns `(k_b01, k_b0111)` for a panel with diagonal offset `diagoff_j`.
///
/// `k_b0111` is the number of rows of the panel that can be nonzero and
/// `k_b01` the length of the rectangular part above the `nr × nr` triangular
/// block. For a panel strictly above the diagonal `k_b0111 == k`.
#[inline]
pub fn triangular_extent(diagoff_j: isize, k: usize, nr: usize) -> (isize, isize) {
    let k_b0111 = (k as isize).min(-diagoff_j + nr as isize);
    (k_b0111 - nr as isize, k_b0111)
}

/// A `k × n` upper triangular block after its leading implicitly-zero
/// column panels and trailing implicitly-zero rows have been discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangularBlock {
    /// Diagonal offset relative to the first retained column, `< nr`.
    pub diagoff: isize,
    /// Retained columns.
    pub n: usize,
    /// Retained rows, a multiple of `nr`.
    pub k: usize,
    /// Leading columns skipped, a multiple of `nr`.
    pub skipped_cols: usize,
    /// The original `k` rounded up to a multiple of `nr`.
    pub k_full: usize,
}

impl TriangularBlock {
    /// Normalizes a `k × n` block with diagonal offset `diagoff`.
    ///
    /// Returns `None` when there is nothing to do: an empty block, or one
    /// that lies entirely below the diagonal.
    pub fn normalize(diagoff: isize, k: usize, n: usize, nr: usize) -> Option<Self> {
        debug_assert!(nr > 0);
        if k == 0 || n == 0 || is_strictly_below_diag(diagoff, k, n) {
            return None;
        }

        let k_full = round_up(k, nr);
        let mut diagoff = diagoff;
        let mut n = n;
        let mut skipped_cols = 0;

        if diagoff > 0 {
            skipped_cols = (diagoff as usize / nr) * nr;
            n -= skipped_cols;
            diagoff %= nr as isize;
        }

        // Rows below the point where the diagonal leaves the last column
        // only multiply zeros.
        let mut k = k;
        if -diagoff + (n as isize) < k as isize {
            k = (-diagoff + n as isize) as usize;
        }
        let k = round_up(k, nr);

        Some(Self {
            diagoff,
            n,
            k,
            skipped_cols,
            k_full,
        })
    }

    /// Number of `nr`-wide column panels.
    pub fn num_panels(&self, nr: usize) -> usize {
        self.n.div_ceil(nr)
    }

    /// Iterates the column panels in order.
    pub fn panels(&self, nr: usize) -> Panels {
        Panels {
            block: *self,
            nr,
            index: 0,
            count: self.num_panels(nr),
        }
    }

    /// Total packed rows over all panels, `Σ k_b0111`.
    pub fn packed_rows(&self, nr: usize) -> usize {
        self.panels(nr).map(|p| p.k_b0111).sum()
    }
}

/// Description of one column panel of a [`TriangularBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSpec {
    /// Panel index `j`.
    pub index: usize,
    /// Width of the panel (`nr`, or the remainder on the last one).
    pub width: usize,
    /// `diagoff - j * nr`.
    pub diagoff: isize,
    pub kind: PanelKind,
    /// Rows above the triangular `nr × nr` block (intersecting panels).
    pub k_b01: usize,
    /// Rows that are stored for this panel.
    pub k_b0111: usize,
}

/// Iterator returned by [`TriangularBlock::panels`].
#[derive(Debug, Clone)]
pub struct Panels {
    block: TriangularBlock,
    nr: usize,
    index: usize,
    count: usize,
}

impl Iterator for Panels {
    type Item = PanelSpec;

    fn next(&mut self) -> Option<PanelSpec> {
        if self.index >= self.count {
            return None;
        }
        let j = self.index;
        self.index += 1;

        let nr = self.nr;
        let diagoff = self.block.diagoff - (j * nr) as isize;
        let kind = classify_panel(diagoff, self.block.k, nr);
        let (k_b01, k_b0111) = triangular_extent(diagoff, self.block.k, nr);
        let width = (self.block.n - j * nr).min(nr);

        Some(PanelSpec {
            index: j,
            width,
            diagoff,
            kind,
            k_b01: k_b01.max(0) as usize,
            k_b0111: k_b0111.max(0) as usize,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.count - self.index;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for Panels {}
