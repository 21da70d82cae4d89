//! Defines the [`FieldElement`] trait, which lets the averaging machinery
//! treat real-valued and complex-valued fields uniformly.
//!
//! Every reduction in this crate operates on `f64` values. A complex field
//! is reduced by treating its real and imaginary parts as two independent
//! real-valued fields and recombining the results afterwards. This trait
//! provides exactly the hooks needed to do that.

use num_complex::Complex64;

/// A single sample of a field.
///
/// This is implemented for [`f64`] and [`Complex64`]. The parts of a real
/// value are `(value, 0.0)`.
pub trait FieldElement: Copy + Default + core::fmt::Debug + 'static {
    /// `true` when the imaginary part carries information
    const IS_COMPLEX: bool;

    fn re(self) -> f64;

    fn im(self) -> f64;

    /// reassemble an element from its parts. Implementations for real types
    /// drop `im`.
    fn from_parts(re: f64, im: f64) -> Self;

    #[inline]
    fn nan() -> Self {
        Self::from_parts(f64::NAN, f64::NAN)
    }

    #[inline]
    fn is_nan(self) -> bool {
        self.re().is_nan() || self.im().is_nan()
    }

    /// multiply both parts by a real scalar
    #[inline]
    fn scale(self, factor: f64) -> Self {
        Self::from_parts(self.re() * factor, self.im() * factor)
    }
}

impl FieldElement for f64 {
    const IS_COMPLEX: bool = false;

    #[inline(always)]
    fn re(self) -> f64 {
        self
    }

    #[inline(always)]
    fn im(self) -> f64 {
        0.0
    }

    #[inline(always)]
    fn from_parts(re: f64, _im: f64) -> Self {
        re
    }
}

impl FieldElement for Complex64 {
    const IS_COMPLEX: bool = true;

    #[inline(always)]
    fn re(self) -> f64 {
        self.re
    }

    #[inline(always)]
    fn im(self) -> f64 {
        self.im
    }

    #[inline(always)]
    fn from_parts(re: f64, im: f64) -> Self {
        Complex64::new(re, im)
    }
}
