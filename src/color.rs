//! sRGB colors for encode backgrounds.
//!
//! Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA`, CSS `rgb(r, g, b)` /
//! `rgba(r, g, b, a)` and the CSS basic color keywords.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OperationError;

/// An 8-bit sRGB color with alpha.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 128, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const ORANGE: Self = Self::rgb(255, 165, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_rgb_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `#rrggbbaa`.
    pub fn to_rgba_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            f.write_str(&self.to_rgb_hex())
        } else {
            f.write_str(&self.to_rgba_hex())
        }
    }
}

impl FromStr for Color {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if let Some(hex) = s.strip_prefix('#') {
            parse_hex(hex)
        } else if let Some(args) = function_args(s, "rgba") {
            parse_components(args, true)
        } else if let Some(args) = function_args(s, "rgb") {
            parse_components(args, false)
        } else {
            lookup_named(s)
        };
        parsed.ok_or_else(|| OperationError::InvalidParameter(format!("unrecognized color: {s:?}")))
    }
}

impl TryFrom<String> for Color {
    type Error = OperationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            // #abc is #aabbcc
            let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|n| n * 17);
            Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

/// `name(...)` → the text between the parentheses.
fn function_args<'a>(s: &'a str, name: &str) -> Option<&'a str> {
    let rest = s.get(..name.len())?.eq_ignore_ascii_case(name).then(|| &s[name.len()..])?;
    rest.trim_start().strip_prefix('(')?.strip_suffix(')')
}

fn parse_components(args: &str, with_alpha: bool) -> Option<Color> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }
    let r = parts[0].parse().ok()?;
    let g = parts[1].parse().ok()?;
    let b = parts[2].parse().ok()?;
    let a = match parts.get(3) {
        // CSS alpha is 0.0..=1.0
        Some(alpha) => {
            let alpha: f64 = alpha.parse().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            (alpha * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Color::rgba(r, g, b, a))
}

fn lookup_named(name: &str) -> Option<Color> {
    let lower = name.to_ascii_lowercase();
    NAMED
        .binary_search_by_key(&lower.as_str(), |&(n, _)| n)
        .ok()
        .map(|i| NAMED[i].1)
}

/// CSS basic color keywords plus `orange` and `transparent`, sorted for binary search.
const NAMED: &[(&str, Color)] = &[
    ("aqua", Color::rgb(0, 255, 255)),
    ("black", Color::BLACK),
    ("blue", Color::BLUE),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("gray", Color::rgb(128, 128, 128)),
    ("green", Color::GREEN),
    ("lime", Color::rgb(0, 255, 0)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("navy", Color::rgb(0, 0, 128)),
    ("olive", Color::rgb(128, 128, 0)),
    ("orange", Color::ORANGE),
    ("purple", Color::rgb(128, 0, 128)),
    ("red", Color::RED),
    ("silver", Color::rgb(192, 192, 192)),
    ("teal", Color::rgb(0, 128, 128)),
    ("transparent", Color::rgba(0, 0, 0, 0)),
    ("white", Color::WHITE),
    ("yellow", Color::rgb(255, 255, 0)),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_table_is_sorted() {
        for w in NAMED.windows(2) {
            assert!(w[0].0 < w[1].0, "{:?} >= {:?}", w[0].0, w[1].0);
        }
    }

    #[test]
    fn hex_forms() {
        assert_eq!("#0af".parse::<Color>().unwrap(), Color::rgb(0, 170, 255));
        assert_eq!("#FF8000".parse::<Color>().unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(
            "#ff000080".parse::<Color>().unwrap(),
            Color::rgba(255, 0, 0, 128)
        );
    }

    #[test]
    fn bad_hex_is_rejected() {
        for s in ["#ff", "#ggg", "#12345", "ff0000", ""] {
            assert!(s.parse::<Color>().is_err(), "{s:?}");
        }
    }

    #[test]
    fn css_functions() {
        assert_eq!(
            "rgb(12, 34, 56)".parse::<Color>().unwrap(),
            Color::rgb(12, 34, 56)
        );
        assert_eq!(
            "RGBA(255,255,255,0.5)".parse::<Color>().unwrap(),
            Color::rgba(255, 255, 255, 128)
        );
        // components must fit a byte
        assert!("rgb(256, 0, 0)".parse::<Color>().is_err());
        assert!("rgba(0, 0, 0, 2)".parse::<Color>().is_err());
        assert!("rgb(0, 0)".parse::<Color>().is_err());
    }

    #[test]
    fn named_case_insensitive() {
        assert_eq!("Orange".parse::<Color>().unwrap(), Color::ORANGE);
        assert_eq!("transparent".parse::<Color>().unwrap().a, 0);
        assert!("rebeccapurple".parse::<Color>().is_err());
    }

    #[test]
    fn hex_output() {
        assert_eq!(Color::ORANGE.to_rgb_hex(), "#ffa500");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_rgba_hex(), "#01020304");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_string(), "#01020304");
        assert_eq!(Color::WHITE.to_string(), "#ffffff");
    }

    #[test]
    fn serde_uses_strings() {
        let c: Color = serde_json::from_str("\"#ffffff\"").unwrap();
        assert_eq!(c, Color::WHITE);
        assert_eq!(serde_json::to_string(&Color::BLACK).unwrap(), "\"#000000\"");
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }
}
