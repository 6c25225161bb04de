//! Crop regions and their resolution against concrete image sizes.
//!
//! A crop is addressed in the coordinate space the client sees: upright
//! (after the source orientation is applied) and, for pixel crops, scaled by
//! the scale constraint. Resolving a crop means translating that request
//! into a rectangle of a concrete stored image, which may be the full-size
//! image or a reduced pyramid tier:
//!
//! ```text
//!     client space ──×(rf / sc)──▶ upright tier ──orientation──▶ stored tier ──clamp──▶ rect
//! ```
//!
//! All three `rectangle*` forms share that path, so a crop resolved against
//! a tier agrees with the full-size rectangle scaled down to the tier.

use core::fmt;

use serde_json::{Value, json};

use crate::error::{OperationError, Result, ValidationError};
use crate::geometry::{Dimension, Rectangle};
use crate::orientation::Orientation;
use crate::reduction::ReductionFactor;
use crate::scale_constraint::ScaleConstraint;

/// What part of the image a [`Crop`] keeps.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CropRegion {
    /// The whole image. Never has an effect.
    Full,
    /// Pixel region in scale-constrained upright coordinates.
    Pixels {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Fractions of the upright image: `x`, `y` in `[0, 1)`, `width`,
    /// `height` in `(0, 1]`.
    Percent {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Centered square with the side of the shorter edge.
    Square,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Crop {
    region: CropRegion,
    orientation: Orientation,
}

impl Crop {
    pub fn full() -> Self {
        Self::from_region(CropRegion::Full)
    }

    pub fn square() -> Self {
        Self::from_region(CropRegion::Square)
    }

    /// Pixel crop. Width and height must be positive.
    pub fn pixels(x: u32, y: u32, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(OperationError::InvalidParameter(format!(
                "crop width and height must be positive (got {width}x{height})"
            )));
        }
        Ok(Self::from_region(CropRegion::Pixels {
            x,
            y,
            width,
            height,
        }))
    }

    /// Fractional crop, e.g. `percent(0.2, 0.2, 0.5, 0.5)` for the middle quarter.
    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        let origin = 0.0..1.0;
        for (name, v) in [("x", x), ("y", y)] {
            if !origin.contains(&v) {
                return Err(OperationError::InvalidParameter(format!(
                    "crop {name} must be in [0, 1) (got {v})"
                )));
            }
        }
        for (name, v) in [("width", width), ("height", height)] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(OperationError::InvalidParameter(format!(
                    "crop {name} must be in (0, 1] (got {v})"
                )));
            }
        }
        Ok(Self::from_region(CropRegion::Percent {
            x,
            y,
            width,
            height,
        }))
    }

    fn from_region(region: CropRegion) -> Self {
        Self {
            region,
            orientation: Orientation::Rotate0,
        }
    }

    /// Orientation of the source the crop will be applied to.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn region(&self) -> CropRegion {
        self.region
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Resolved rectangle within the full-size image.
    pub fn rectangle(&self, full: Dimension) -> Rectangle {
        self.rectangle_constrained(full, ScaleConstraint::IDENTITY)
    }

    /// Resolved rectangle within the full-size image, reading pixel
    /// coordinates in the constrained space.
    pub fn rectangle_constrained(&self, full: Dimension, sc: ScaleConstraint) -> Rectangle {
        self.rectangle_reduced(full, ReductionFactor::default(), sc)
    }

    /// Resolved rectangle within a reduced tier whose size is `reduced`.
    pub fn rectangle_reduced(
        &self,
        reduced: Dimension,
        rf: ReductionFactor,
        sc: ScaleConstraint,
    ) -> Rectangle {
        let upright = self.upright_region(reduced, rf, sc);
        self.orientation.apply_to(upright, reduced).clamp_to(reduced)
    }

    /// The requested region in the upright space of the stored image, unclamped.
    fn upright_region(
        &self,
        stored: Dimension,
        rf: ReductionFactor,
        sc: ScaleConstraint,
    ) -> Rectangle {
        let upright = self.orientation.adjusted_size(stored);
        let (uw, uh) = (upright.width(), upright.height());
        match self.region {
            CropRegion::Full => Rectangle::of_size(upright),
            CropRegion::Pixels {
                x,
                y,
                width,
                height,
            } => {
                let s = rf.scale() / sc.value();
                Rectangle::raw(
                    f64::from(x) * s,
                    f64::from(y) * s,
                    f64::from(width) * s,
                    f64::from(height) * s,
                )
            }
            CropRegion::Percent {
                x,
                y,
                width,
                height,
            } => Rectangle::raw(x * uw, y * uh, width * uw, height * uh),
            CropRegion::Square => {
                let side = uw.min(uh);
                Rectangle::raw(
                    ((uw - side) / 2.0).floor(),
                    ((uh - side) / 2.0).floor(),
                    side,
                    side,
                )
            }
        }
    }

    pub fn resulting_size(&self, input: Dimension, sc: ScaleConstraint) -> Dimension {
        self.rectangle_constrained(input, sc).size()
    }

    /// Context-free no-op test. Pixel crops can only be judged against an
    /// image size, so they always report an effect here.
    pub fn has_effect(&self) -> bool {
        match self.region {
            CropRegion::Full => false,
            CropRegion::Percent {
                x,
                y,
                width,
                height,
            } => !(x == 0.0 && y == 0.0 && width == 1.0 && height == 1.0),
            CropRegion::Pixels { .. } | CropRegion::Square => true,
        }
    }

    /// Whether the crop removes anything from an image of size `working`.
    pub fn has_effect_at(&self, working: Dimension, sc: ScaleConstraint) -> bool {
        self.has_effect() && !self.rectangle_constrained(working, sc).covers(working)
    }

    /// Reject regions that start outside the image or resolve to nothing.
    pub fn validate(
        &self,
        full: Dimension,
        sc: ScaleConstraint,
    ) -> core::result::Result<(), ValidationError> {
        let upright = self.orientation.adjusted_size(full);
        let requested = self.upright_region(full, ReductionFactor::default(), sc);
        let starts_outside = requested.x() >= upright.width() || requested.y() >= upright.height();
        if starts_outside || self.rectangle_constrained(full, sc).is_empty() {
            tracing::debug!(crop = %self, %full, "crop region out of bounds");
            return Err(ValidationError::CropOutOfBounds {
                region: self.to_string(),
                width: full.int_width(),
                height: full.int_height(),
            });
        }
        Ok(())
    }

    pub fn class_name(&self) -> &'static str {
        match self.region {
            CropRegion::Full => "CropFull",
            CropRegion::Pixels { .. } => "CropByPixels",
            CropRegion::Percent { .. } => "CropByPercent",
            CropRegion::Square => "CropToSquare",
        }
    }

    pub fn to_map(&self, full: Dimension, sc: ScaleConstraint) -> Value {
        let r = self.rectangle_constrained(full, sc);
        json!({
            "class": self.class_name(),
            "x": r.int_x(),
            "y": r.int_y(),
            "width": r.int_width(),
            "height": r.int_height(),
        })
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.region {
            CropRegion::Full => f.write_str("full"),
            CropRegion::Square => f.write_str("square"),
            CropRegion::Pixels {
                x,
                y,
                width,
                height,
            } => write!(f, "{x},{y},{width},{height}"),
            CropRegion::Percent {
                x,
                y,
                width,
                height,
            } => write!(f, "pct:{x},{y},{width},{height}"),
        }
    }
}
