//! Output encoding settings.

use core::fmt;

use serde_json::{Value, json};

use crate::color::Color;
use crate::error::{OperationError, Result};
use crate::format::{Compression, Format};

/// How the derivative is serialized. Carries no geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Encode {
    format: Format,
    compression: Compression,
    quality: u8,
    interlace: bool,
    background_color: Option<Color>,
    max_component_size: u32,
}

impl Encode {
    pub const MAX_QUALITY: u8 = 100;

    pub fn new(format: Format) -> Self {
        Self {
            format,
            compression: Compression::Undefined,
            quality: Self::MAX_QUALITY,
            interlace: false,
            background_color: None,
            max_component_size: 0,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn interlace(&self) -> bool {
        self.interlace
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    /// Bits per sample cap; 0 is unlimited.
    pub fn max_component_size(&self) -> u32 {
        self.max_component_size
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    pub fn set_compression(&mut self, compression: Compression) {
        self.compression = compression;
    }

    /// Quality in `1..=100`.
    pub fn set_quality(&mut self, quality: u8) -> Result<()> {
        if !(1..=Self::MAX_QUALITY).contains(&quality) {
            return Err(OperationError::InvalidParameter(format!(
                "quality must be in 1..=100 (got {quality})"
            )));
        }
        self.quality = quality;
        Ok(())
    }

    pub fn set_interlace(&mut self, interlace: bool) {
        self.interlace = interlace;
    }

    pub fn set_background_color(&mut self, color: Option<Color>) {
        self.background_color = color;
    }

    pub fn set_max_component_size(&mut self, size: u32) {
        self.max_component_size = size;
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Result<Self> {
        self.set_quality(quality)?;
        Ok(self)
    }

    pub fn with_interlace(mut self, interlace: bool) -> Self {
        self.interlace = interlace;
        self
    }

    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_max_component_size(mut self, size: u32) -> Self {
        self.max_component_size = size;
        self
    }

    pub fn to_map(&self) -> Value {
        let mut map = json!({
            "class": "Encode",
            "compression": self.compression.name(),
            "format": self.format.media_type(),
            "interlace": self.interlace,
            "quality": self.quality,
            "max_component_size": self.max_component_size,
        });
        if let Some(color) = self.background_color {
            map["background_color"] = json!(color.to_rgb_hex());
        }
        map
    }
}

impl fmt::Display for Encode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.format.preferred_extension())?;
        if self.compression != Compression::Undefined {
            write!(f, "_{}", self.compression)?;
        }
        if self.quality < Self::MAX_QUALITY {
            write!(f, "_{}", self.quality)?;
        }
        if self.interlace {
            f.write_str("_interlace")?;
        }
        if let Some(color) = self.background_color {
            write!(f, "_{}", color.to_rgb_hex())?;
        }
        if self.max_component_size > 0 {
            write!(f, "_{}", self.max_component_size)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let e = Encode::new(Format::Png);
        assert_eq!(e.quality(), 100);
        assert_eq!(e.compression(), Compression::Undefined);
        assert!(!e.interlace());
        assert_eq!(e.max_component_size(), 0);
        assert_eq!(e.to_string(), "png");
    }

    #[test]
    fn quality_range() {
        let mut e = Encode::new(Format::Jpg);
        assert!(e.set_quality(0).is_err());
        assert!(e.set_quality(101).is_err());
        assert_eq!(e.quality(), 100, "failed setter leaves the value alone");
        assert!(e.set_quality(1).is_ok());
    }

    #[test]
    fn canonical_string() {
        let e = Encode::new(Format::Jpg)
            .with_compression(Compression::Jpeg)
            .with_quality(80)
            .unwrap()
            .with_interlace(true)
            .with_background_color(Color::WHITE)
            .with_max_component_size(8);
        assert_eq!(e.to_string(), "jpg_jpeg_80_interlace_#ffffff_8");
    }

    #[test]
    fn map_keys() {
        let e = Encode::new(Format::Tif).with_compression(Compression::Lzw);
        assert_eq!(
            e.to_map(),
            json!({
                "class": "Encode",
                "compression": "lzw",
                "format": "image/tiff",
                "interlace": false,
                "quality": 100,
                "max_component_size": 0,
            })
        );
        let e = e.with_background_color(Color::BLACK);
        assert_eq!(e.to_map()["background_color"], "#000000");
    }
}
