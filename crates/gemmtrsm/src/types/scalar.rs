//! [`Element`] implementations for the four BLAS datatypes.

use super::traits::{Datatype, Element};
use num_complex::Complex;

macro_rules! impl_real_element {
    ($($t:ty => $dt:expr),* $(,)?) => {
        $(
            impl Element for $t {
                const DATATYPE: Datatype = $dt;

                #[inline(always)]
                fn zero() -> Self {
                    0.0
                }

                #[inline(always)]
                fn one() -> Self {
                    1.0
                }

                #[inline(always)]
                fn recip(self) -> Self {
                    1.0 / self
                }

                #[inline(always)]
                fn conj(self) -> Self {
                    self
                }

                #[inline]
                fn from_parts(re: f64, _im: f64) -> Self {
                    re as $t
                }

                #[inline]
                fn modulus(self) -> f64 {
                    <$t>::abs(self) as f64
                }

                #[inline]
                fn is_finite(self) -> bool {
                    <$t>::is_finite(self)
                }
            }
        )*
    };
}

macro_rules! impl_complex_element {
    ($($t:ty => $dt:expr),* $(,)?) => {
        $(
            impl Element for Complex<$t> {
                const DATATYPE: Datatype = $dt;

                #[inline(always)]
                fn zero() -> Self {
                    Complex::new(0.0, 0.0)
                }

                #[inline(always)]
                fn one() -> Self {
                    Complex::new(1.0, 0.0)
                }

                #[inline(always)]
                fn recip(self) -> Self {
                    Complex::inv(&self)
                }

                #[inline(always)]
                fn conj(self) -> Self {
                    Complex::conj(&self)
                }

                #[inline]
                fn from_parts(re: f64, im: f64) -> Self {
                    Complex::new(re as $t, im as $t)
                }

                #[inline]
                fn modulus(self) -> f64 {
                    Complex::norm(self) as f64
                }

                #[inline]
                fn is_finite(self) -> bool {
                    Complex::is_finite(self)
                }
            }
        )*
    };
}

impl_real_element! {
    f32 => Datatype::Float,
    f64 => Datatype::Double,
}

impl_complex_element! {
    f32 => Datatype::Scomplex,
    f64 => Datatype::Dcomplex,
}
