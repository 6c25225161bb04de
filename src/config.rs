//! Processing defaults applied to an operation list before it is frozen.
//!
//! Plain data: the caller loads it however it likes (the struct derives
//! `Deserialize`, every field has a default) and passes it in explicitly.
//!
//! ```
//! use zenops::ProcessingConfig;
//!
//! let config: ProcessingConfig =
//!     serde_json::from_str(r#"{"max_pixels": 10000000, "jpg_quality": 90}"#).unwrap();
//! assert_eq!(config.jpg_quality, 90);
//! assert!(!config.jpg_progressive);
//! ```

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::format::{Compression, Format};
use crate::geometry::Dimension;
use crate::operation::Filter;
use crate::orientation::Orientation;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Largest permitted output area in pixels. 0 is unlimited.
    pub max_pixels: u64,
    /// Resample filter for downscales, when the request names none.
    pub downscale_filter: Option<Filter>,
    /// Resample filter for upscales, when the request names none.
    pub upscale_filter: Option<Filter>,
    /// Sharpen amount added before encoding. 0 adds nothing.
    pub sharpen: f64,
    pub jpg_quality: u8,
    pub jpg_progressive: bool,
    pub tif_compression: Compression,
    /// Flattening color for formats without alpha.
    pub background_color: Option<Color>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_pixels: 0,
            downscale_filter: None,
            upscale_filter: None,
            sharpen: 0.0,
            jpg_quality: 80,
            jpg_progressive: false,
            tif_compression: Compression::Lzw,
            background_color: None,
        }
    }
}

/// What is known about the source image once it has been opened.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub size: Dimension,
    pub orientation: Orientation,
    pub format: Option<Format>,
}

impl SourceInfo {
    pub fn new(size: Dimension) -> Self {
        Self {
            size,
            orientation: Orientation::Rotate0,
            format: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}
