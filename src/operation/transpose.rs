//! Mirroring.

use core::fmt;

use serde_json::{Value, json};

/// Mirror across the vertical (`Horizontal`) or horizontal (`Vertical`) axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Transpose {
    Horizontal,
    Vertical,
}

impl Transpose {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Horizontal => "h",
            Self::Vertical => "v",
        }
    }

    pub fn to_map(&self) -> Value {
        let axis = match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        };
        json!({"class": "Transpose", "axis": axis})
    }
}

impl fmt::Display for Transpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
