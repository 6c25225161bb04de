//! Color reduction.

use core::fmt;

use serde_json::{Value, json};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColorTransform {
    Bitonal,
    Gray,
}

impl ColorTransform {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bitonal => "bitonal",
            Self::Gray => "gray",
        }
    }

    pub fn to_map(&self) -> Value {
        json!({"class": "ColorTransform", "type": self.name()})
    }
}

impl fmt::Display for ColorTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
