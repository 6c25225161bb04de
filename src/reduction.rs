//! Power-of-two reduction factors for multi-resolution sources.

use core::fmt;

use crate::error::{OperationError, Result};
use crate::geometry::Dimension;

/// A pre-scaled tier of a pyramidal source: factor `f` means the tier is
/// `2^-f` of the full size. Factor 0 is the full-resolution image.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReductionFactor(u8);

impl ReductionFactor {
    /// Tolerance used by [`for_scale`](Self::for_scale).
    pub const DEFAULT_TOLERANCE: f64 = 0.0001;

    /// Deepest factor ever returned. Past this the tier would be narrower
    /// than one pixel for any image a `u32` can describe.
    pub const MAX: Self = Self(31);

    pub fn new(factor: u8) -> Result<Self> {
        if factor > Self::MAX.0 {
            return Err(OperationError::InvalidParameter(format!(
                "reduction factor must be at most {} (got {factor})",
                Self::MAX.0
            )));
        }
        Ok(Self(factor))
    }

    pub fn factor(&self) -> u8 {
        self.0
    }

    /// `2^-f`.
    pub fn scale(&self) -> f64 {
        1.0 / f64::from(1u32 << self.0)
    }

    /// Deepest tier that still holds at least `scale` of the full size,
    /// with [`DEFAULT_TOLERANCE`](Self::DEFAULT_TOLERANCE) slack.
    ///
    /// `for_scale(0.25)` is 2 and `for_scale(0.125)` is 3. A scale just
    /// above a boundary, like 0.125001, is treated as on it and also gives 3.
    pub fn for_scale(scale: f64) -> Self {
        Self::for_scale_with_tolerance(scale, Self::DEFAULT_TOLERANCE)
    }

    /// Like [`for_scale`](Self::for_scale) with explicit slack: the result
    /// is the largest `f` with `scale <= 2^-f + tolerance`.
    ///
    /// With a tolerance of zero, `0.125001` does not reach the 1/8 tier
    /// and the result is 2.
    pub fn for_scale_with_tolerance(scale: f64, tolerance: f64) -> Self {
        let mut factor = 0u8;
        let mut next = 0.5;
        while factor < Self::MAX.0 && scale <= next + tolerance {
            next /= 2.0;
            factor += 1;
        }
        Self(factor)
    }

    /// The shallower of `self` and `max`.
    pub fn clamped(self, max: Self) -> Self {
        self.min(max)
    }

    /// Size of this tier given the full size.
    pub fn reduced_size(&self, full: Dimension) -> Dimension {
        full.scaled(self.scale())
    }
}

impl fmt::Display for ReductionFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
