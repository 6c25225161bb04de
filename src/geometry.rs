//! Real-valued sizes and regions.
//!
//! Sizes stay fractional through the whole pipeline: a 1:3 scale constraint
//! on a 1000-pixel-wide image is 333.33… pixels wide, and rounding that early
//! would make crops resolved at different reduction factors disagree.
//! Conversion to whole pixels happens only at the decode boundary, through
//! the `int_*` accessors, which round half up.

use core::fmt;

use num_traits::ToPrimitive;

use crate::error::{OperationError, Result};

/// Tolerance used by the tolerant equality of [`Dimension`] and [`Rectangle`].
pub const DELTA: f64 = 0.00000001;

/// Round half up to a whole pixel count, saturating at the `u32` range.
pub(crate) fn round_px(value: f64) -> u32 {
    value.round().to_u32().unwrap_or(if value > 0.0 { u32::MAX } else { 0 })
}

fn check_length(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(OperationError::InvalidParameter(format!(
            "{name} must be a finite, non-negative number (got {value})"
        )))
    }
}

/// Width and height of an image, in possibly fractional pixels.
#[derive(Copy, Clone, Debug, Default)]
pub struct Dimension {
    width: f64,
    height: f64,
}

impl Dimension {
    /// Create a dimension. Negative, NaN, and infinite lengths are rejected.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        Ok(Self {
            width: check_length("width", width)?,
            height: check_length("height", height)?,
        })
    }

    /// Create a dimension from whole pixel counts. Infallible.
    pub fn from_px(width: u32, height: u32) -> Self {
        Self {
            width: f64::from(width),
            height: f64::from(height),
        }
    }

    /// Internal constructor for values derived from already-valid dimensions.
    pub(crate) fn raw(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Width rounded half up.
    pub fn int_width(&self) -> u32 {
        round_px(self.width)
    }

    /// Height rounded half up.
    pub fn int_height(&self) -> u32 {
        round_px(self.height)
    }

    /// Both axes rounded half up, kept as a `Dimension`.
    pub fn rounded(&self) -> Self {
        Self::from_px(self.int_width(), self.int_height())
    }

    /// Uniformly scaled copy.
    pub fn scaled(&self, factor: f64) -> Self {
        self.scaled_xy(factor, factor)
    }

    /// Per-axis scaled copy.
    pub fn scaled_xy(&self, x_factor: f64, y_factor: f64) -> Self {
        Self::raw(self.width * x_factor, self.height * y_factor)
    }

    /// Width and height exchanged.
    pub fn swapped(&self) -> Self {
        Self::raw(self.height, self.width)
    }

    /// Number of pixels once rounded to whole pixels.
    pub fn area(&self) -> u64 {
        u64::from(self.int_width()) * u64::from(self.int_height())
    }

    /// Whether either axis rounds to zero pixels.
    pub fn is_empty(&self) -> bool {
        self.int_width() == 0 || self.int_height() == 0
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        (self.width - other.width).abs() < DELTA && (self.height - other.height).abs() < DELTA
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A region in the coordinate space of one particular image.
///
/// A rectangle carries no record of *which* image it belongs to: a region of
/// the full-size image and a region of a half-size pyramid tier are both
/// plain `Rectangle`s, and the caller is responsible for not mixing them.
#[derive(Copy, Clone, Debug, Default)]
pub struct Rectangle {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Rectangle {
    /// Create a rectangle. Origin coordinates may be any finite value;
    /// width and height must be non-negative.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(OperationError::InvalidParameter(format!(
                "rectangle origin must be finite (got {x},{y})"
            )));
        }
        Ok(Self {
            x,
            y,
            width: check_length("width", width)?,
            height: check_length("height", height)?,
        })
    }

    pub(crate) fn raw(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Rectangle at the origin covering `size`.
    pub fn of_size(size: Dimension) -> Self {
        Self::raw(0.0, 0.0, size.width(), size.height())
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn int_x(&self) -> u32 {
        round_px(self.x)
    }

    pub fn int_y(&self) -> u32 {
        round_px(self.y)
    }

    pub fn int_width(&self) -> u32 {
        round_px(self.width)
    }

    pub fn int_height(&self) -> u32 {
        round_px(self.height)
    }

    pub fn size(&self) -> Dimension {
        Dimension::raw(self.width, self.height)
    }

    /// Scale origin and extent uniformly.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::raw(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Whether either axis rounds to zero pixels.
    pub fn is_empty(&self) -> bool {
        self.int_width() == 0 || self.int_height() == 0
    }

    /// Whether the point lies inside this rectangle (right and bottom edges excluded).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    /// Whether the two rectangles share any area.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    /// Intersect with `[0, 0, size.width, size.height]`.
    ///
    /// A rectangle lying entirely outside the bounds comes back with zero
    /// width and/or height. That is deliberately not corrected here: the
    /// caller decides whether an empty region is an error.
    pub fn clamp_to(&self, size: Dimension) -> Self {
        let x0 = self.x.clamp(0.0, size.width());
        let y0 = self.y.clamp(0.0, size.height());
        let x1 = (self.x + self.width).clamp(0.0, size.width());
        let y1 = (self.y + self.height).clamp(0.0, size.height());
        Self::raw(x0, y0, x1 - x0, y1 - y0)
    }

    /// Whether this rectangle covers all of `size`.
    pub fn covers(&self, size: Dimension) -> bool {
        self.x.abs() < DELTA
            && self.y.abs() < DELTA
            && self.width + DELTA >= size.width()
            && self.height + DELTA >= size.height()
    }
}

impl PartialEq for Rectangle {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < DELTA
            && (self.y - other.y).abs() < DELTA
            && (self.width - other.width).abs() < DELTA
            && (self.height - other.height).abs() < DELTA
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}/{}x{}", self.x, self.y, self.width, self.height)
    }
}
