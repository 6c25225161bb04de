//! Source orientation and the crop-coordinate remapping it implies.

use crate::geometry::{Dimension, Rectangle};

/// How far the *stored* pixels must be rotated to reach the upright view.
///
/// This is metadata about the source (typically the EXIF orientation tag),
/// not a requested operation. Clients address crops in upright
/// coordinates, so every crop is remapped through
/// [`apply_to`](Self::apply_to) before it reaches the decoder.
///
/// ```text
///     stored     Rotate90     Rotate180    Rotate270
///     ┌───┐      ┌────┐       ┌───┐        ┌────┐
///     │ F │      │  F │       │   │        │ Ꟊ  │
///     │   │      └────┘       │ Ꟊ │        └────┘
///     └───┘                   └───┘
/// ```
///
/// Mirrored EXIF orientations (2, 4, 5, 7) are not representable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    const ALL: [Self; 4] = [
        Self::Rotate0,
        Self::Rotate90,
        Self::Rotate180,
        Self::Rotate270,
    ];

    /// Create from an EXIF orientation tag. Only the four pure rotations
    /// (1, 3, 6, 8) map; anything else returns `None`.
    pub fn from_exif(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Rotate0),
            3 => Some(Self::Rotate180),
            6 => Some(Self::Rotate90),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    pub fn to_exif(self) -> u8 {
        match self {
            Self::Rotate0 => 1,
            Self::Rotate90 => 6,
            Self::Rotate180 => 3,
            Self::Rotate270 => 8,
        }
    }

    /// Create from a whole number of degrees. Must be a multiple of 90
    /// (negative values and values of 360 or more wrap).
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Self::ALL[(degrees / 90).rem_euclid(4) as usize])
    }

    pub fn degrees(self) -> u16 {
        self.quarter_turns() as u16 * 90
    }

    fn quarter_turns(self) -> u8 {
        match self {
            Self::Rotate0 => 0,
            Self::Rotate90 => 1,
            Self::Rotate180 => 2,
            Self::Rotate270 => 3,
        }
    }

    pub fn is_identity(self) -> bool {
        self == Self::Rotate0
    }

    /// Whether the upright image has width and height exchanged.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }

    /// Apply `self` first, then `other`.
    pub fn compose(self, other: Self) -> Self {
        Self::ALL[((self.quarter_turns() + other.quarter_turns()) & 3) as usize]
    }

    /// `self.compose(self.inverse()) == Rotate0`.
    pub fn inverse(self) -> Self {
        Self::ALL[((4 - self.quarter_turns()) & 3) as usize]
    }

    /// Size of the upright image given the stored size.
    pub fn adjusted_size(self, stored: Dimension) -> Dimension {
        if self.swaps_axes() {
            stored.swapped()
        } else {
            stored
        }
    }

    /// Remap a region given in upright coordinates into the coordinate
    /// space of the stored image, whose size is `stored`.
    pub fn apply_to(self, rect: Rectangle, stored: Dimension) -> Rectangle {
        let (x, y, w, h) = (rect.x(), rect.y(), rect.width(), rect.height());
        let (sw, sh) = (stored.width(), stored.height());

        match self {
            Self::Rotate0 => rect,
            Self::Rotate90 => Rectangle::raw(y, sh - x - w, h, w),
            Self::Rotate180 => Rectangle::raw(sw - x - w, sh - y - h, w, h),
            Self::Rotate270 => Rectangle::raw(sw - y - h, x, h, w),
        }
    }
}
