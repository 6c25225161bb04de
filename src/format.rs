//! Output format vocabulary.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OperationError;

/// Image formats an operation list can target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Avif,
    Gif,
    Jp2,
    Jpg,
    Pdf,
    Png,
    Tif,
    Webp,
    Unknown,
}

impl Format {
    pub fn preferred_extension(&self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Gif => "gif",
            Self::Jp2 => "jp2",
            Self::Jpg => "jpg",
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Tif => "tif",
            Self::Webp => "webp",
            Self::Unknown => "unknown",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Avif => "image/avif",
            Self::Gif => "image/gif",
            Self::Jp2 => "image/jp2",
            Self::Jpg => "image/jpeg",
            Self::Pdf => "application/pdf",
            Self::Png => "image/png",
            Self::Tif => "image/tiff",
            Self::Webp => "image/webp",
            Self::Unknown => "unknown/unknown",
        }
    }

    /// Whether the format can carry an alpha channel. Formats that cannot
    /// need a background color to flatten onto.
    pub fn supports_transparency(&self) -> bool {
        matches!(
            self,
            Self::Avif | Self::Gif | Self::Jp2 | Self::Png | Self::Tif | Self::Webp
        )
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.preferred_extension())
    }
}

impl FromStr for Format {
    type Err = OperationError;

    /// Parse a file extension (with or without the dot) or a media type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.').to_ascii_lowercase();
        let format = match s.as_str() {
            "avif" | "image/avif" => Self::Avif,
            "gif" | "image/gif" => Self::Gif,
            "jp2" | "j2k" | "jpx" | "image/jp2" => Self::Jp2,
            "jpg" | "jpeg" | "image/jpeg" => Self::Jpg,
            "pdf" | "application/pdf" => Self::Pdf,
            "png" | "image/png" => Self::Png,
            "tif" | "tiff" | "ptif" | "image/tiff" => Self::Tif,
            "webp" | "image/webp" => Self::Webp,
            _ => {
                return Err(OperationError::InvalidParameter(format!(
                    "unknown format: {s:?}"
                )));
            }
        };
        Ok(format)
    }
}

/// Compression scheme hint for formats that offer more than one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Undefined,
    Deflate,
    Jpeg,
    Lzw,
    Rle,
    Zip,
}

impl Compression {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Deflate => "deflate",
            Self::Jpeg => "jpeg",
            Self::Lzw => "lzw",
            Self::Rle => "rle",
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
