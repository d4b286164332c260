use super::kernel::{GemmMicrokernel, KernelDispatch};
use super::scratch::{MAX_MR, MAX_NR};
use crate::error::{Result, TrsmError};
use crate::types::Datatype;

/// Rounds `x` up to the next multiple of `to`.
#[inline]
pub fn round_up(x: usize, to: usize) -> usize {
    debug_assert!(to > 0);
    x.div_ceil(to) * to
}

/// Cache blocksizes `(mc, kc, nc)` of the reference configuration.
pub fn cache_blocksizes(dt: Datatype) -> (usize, usize, usize) {
    match dt {
        Datatype::Float => (256, 256, 8192),
        Datatype::Double => (1008, 2016, 20480),
        Datatype::Scomplex => (128, 256, 4096),
        Datatype::Dcomplex => (64, 256, 2048),
    }
}

/// Blocking parameters for the triangular solve.
///
/// `mr × nr` is the register block of the micro-kernels. `mc`, `kc` and `nc`
/// block the rows of the output, the rows of the triangular operand and its
/// columns, respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilingParams {
    /// Rows of the output per cache block.
    pub mc: usize,
    /// Rows of the triangular operand per cache block.
    pub kc: usize,
    /// Columns of the triangular operand per cache block.
    pub nc: usize,
    /// Micro-kernel rows.
    pub mr: usize,
    /// Micro-kernel columns.
    pub nr: usize,
}

impl TilingParams {
    pub const fn new(mc: usize, kc: usize, nc: usize, mr: usize, nr: usize) -> Self {
        Self { mc, kc, nc, mr, nr }
    }

    /// Default parameters for the kernel bound to `T`.
    pub fn for_kernel<T: KernelDispatch>() -> Self {
        let (mc, kc, nc) = cache_blocksizes(T::DATATYPE);
        Self::new(
            mc,
            kc,
            nc,
            <T::Kernel as GemmMicrokernel<T>>::MR,
            <T::Kernel as GemmMicrokernel<T>>::NR,
        )
    }

    /// Replaces the cache blocksizes, keeping the register block.
    pub fn with_cache_blocks(self, mc: usize, kc: usize, nc: usize) -> Self {
        Self { mc, kc, nc, ..self }
    }

    /// Checks the blocking constraints and that the register block matches
    /// the kernel bound to `T`.
    pub fn validate_for<T: KernelDispatch>(&self) -> Result<()> {
        let (kmr, knr) = (
            <T::Kernel as GemmMicrokernel<T>>::MR,
            <T::Kernel as GemmMicrokernel<T>>::NR,
        );
        if self.mr != kmr || self.nr != knr {
            return Err(TrsmError::InvalidTiling(format!(
                "register block {}x{} does not match the {} kernel ({}x{})",
                self.mr,
                self.nr,
                T::DATATYPE,
                kmr,
                knr
            )));
        }
        self.validate()
    }

    /// Checks the blocking constraints.
    pub fn validate(&self) -> Result<()> {
        let Self { mc, kc, nc, mr, nr } = *self;
        if mr == 0 || nr == 0 || mc == 0 || kc == 0 || nc == 0 {
            return Err(TrsmError::InvalidTiling(format!(
                "blocksizes must be positive: {:?}",
                self
            )));
        }
        if mr > MAX_MR || nr > MAX_NR {
            return Err(TrsmError::InvalidTiling(format!(
                "register block {}x{} exceeds the {}x{} edge buffer",
                mr, nr, MAX_MR, MAX_NR
            )));
        }
        if kc % mr != 0 || kc % nr != 0 {
            return Err(TrsmError::InvalidTiling(format!(
                "kc = {} must be a multiple of both mr = {} and nr = {}",
                kc, mr, nr
            )));
        }
        if mc % mr != 0 {
            return Err(TrsmError::InvalidTiling(format!(
                "mc = {} must be a multiple of mr = {}",
                mc, mr
            )));
        }
        if nc % nr != 0 {
            return Err(TrsmError::InvalidTiling(format!(
                "nc = {} must be a multiple of nr = {}",
                nc, nr
            )));
        }
        Ok(())
    }
}

/// Iterator over `(start, len)` blocks of a dimension.
#[derive(Debug, Clone)]
pub struct BlockIterator {
    total: usize,
    block: usize,
    current: usize,
}

impl BlockIterator {
    pub fn new(total: usize, block: usize) -> Self {
        assert!(block > 0, "block size must be positive");
        Self {
            total,
            block,
            current: 0,
        }
    }
}

impl Iterator for BlockIterator {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.total {
            return None;
        }
        let start = self.current;
        let len = self.block.min(self.total - start);
        self.current += len;
        Some((start, len))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = (self.total - self.current).div_ceil(self.block);
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for BlockIterator {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Complex64;

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(0, 4), 0);
        assert_eq!(round_up(1, 4), 4);
        assert_eq!(round_up(8, 4), 8);
        assert_eq!(round_up(9, 8), 16);
    }

    #[test]
    fn test_block_iterator() {
        let blocks: Vec<_> = BlockIterator::new(10, 4).collect();
        assert_eq!(blocks, vec![(0, 4), (4, 4), (8, 2)]);
        assert_eq!(BlockIterator::new(10, 4).len(), 3);
        assert_eq!(BlockIterator::new(0, 4).count(), 0);
    }

    #[test]
    fn test_reference_defaults_are_valid() {
        TilingParams::for_kernel::<f32>().validate_for::<f32>().unwrap();
        TilingParams::for_kernel::<f64>().validate_for::<f64>().unwrap();
        TilingParams::for_kernel::<Complex64>()
            .validate_for::<Complex64>()
            .unwrap();
        let p = TilingParams::for_kernel::<f64>();
        assert_eq!((p.mc, p.kc, p.nc, p.mr, p.nr), (1008, 2016, 20480, 8, 8));
    }

    #[test]
    fn test_validate_rejects_bad_blocks() {
        let base = TilingParams::for_kernel::<f64>();
        assert!(base.with_cache_blocks(1008, 12, 20480).validate().is_err());
        assert!(base.with_cache_blocks(1001, 2016, 20480).validate().is_err());
        assert!(base.with_cache_blocks(1008, 2016, 20).validate().is_err());
        assert!(base.with_cache_blocks(0, 2016, 20480).validate().is_err());
        assert!(TilingParams::new(32, 32, 32, 32, 8).validate().is_err());
    }

    #[test]
    fn test_validate_for_checks_kernel_dims() {
        let p = TilingParams::new(64, 64, 64, 8, 4);
        assert!(p.validate_for::<f32>().is_ok());
        assert!(matches!(
            p.validate_for::<f64>(),
            Err(TrsmError::InvalidTiling(_))
        ));
    }
}
