//! Arbitrary-angle rotation.

use core::fmt;

use serde_json::{Value, json};

use crate::error::{OperationError, Result};
use crate::geometry::Dimension;

/// Angles closer than this to a whole turn count as no rotation.
const NO_OP_TOLERANCE: f64 = 0.0001;

/// Clockwise rotation by `degrees` in `[0, 360)`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rotate {
    degrees: f64,
}

impl Rotate {
    pub fn new(degrees: f64) -> Result<Self> {
        let mut rotate = Self::default();
        rotate.set_degrees(degrees)?;
        Ok(rotate)
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    pub fn set_degrees(&mut self, degrees: f64) -> Result<()> {
        if !(0.0..360.0).contains(&degrees) {
            return Err(OperationError::InvalidParameter(format!(
                "degrees must be in [0, 360) (got {degrees})"
            )));
        }
        self.degrees = degrees;
        Ok(())
    }

    /// Add to the current angle, wrapping at a full turn.
    pub fn add_degrees(&mut self, degrees: f64) -> Result<()> {
        if !degrees.is_finite() {
            return Err(OperationError::InvalidParameter(format!(
                "degrees must be finite (got {degrees})"
            )));
        }
        self.degrees = (self.degrees + degrees).rem_euclid(360.0);
        Ok(())
    }

    /// Bounding box of the rotated image.
    pub fn resulting_size(&self, size: Dimension) -> Dimension {
        if !self.has_effect() {
            return size;
        }
        let radians = self.degrees.to_radians();
        let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
        let (w, h) = (size.width(), size.height());
        Dimension::raw(w * cos + h * sin, w * sin + h * cos)
    }

    pub fn has_effect(&self) -> bool {
        let off = self.degrees.min(360.0 - self.degrees);
        off > NO_OP_TOLERANCE
    }

    pub fn to_map(&self) -> Value {
        json!({"class": "Rotate", "degrees": self.degrees})
    }
}

impl fmt::Display for Rotate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range() {
        assert!(Rotate::new(-1.0).is_err());
        assert!(Rotate::new(360.0).is_err());
        assert!(Rotate::new(f64::NAN).is_err());
        assert!(Rotate::new(359.9).is_ok());
    }

    #[test]
    fn add_degrees_wraps() {
        let mut r = Rotate::new(300.0).unwrap();
        r.add_degrees(90.0).unwrap();
        assert_eq!(r.degrees(), 30.0);
        r.add_degrees(-60.0).unwrap();
        assert_eq!(r.degrees(), 330.0);
        assert!(r.add_degrees(f64::INFINITY).is_err());
    }

    #[test]
    fn bounding_box() {
        // 300×200 at 30°: 300·cos + 200·sin by 300·sin + 200·cos
        let size = Rotate::new(30.0).unwrap().resulting_size(Dimension::from_px(300, 200));
        assert_eq!(size.int_width(), 360);
        assert_eq!(size.int_height(), 323);
    }

    #[test]
    fn quarter_turn_swaps() {
        let size = Rotate::new(90.0).unwrap().resulting_size(Dimension::from_px(300, 200));
        assert_eq!(size.rounded(), Dimension::from_px(200, 300));
    }

    #[test]
    fn no_op_tolerance() {
        assert!(!Rotate::new(0.0).unwrap().has_effect());
        assert!(!Rotate::new(0.00001).unwrap().has_effect());
        assert!(Rotate::new(0.001).unwrap().has_effect());
        assert!(!Rotate::new(359.99999).unwrap().has_effect());
    }
}
