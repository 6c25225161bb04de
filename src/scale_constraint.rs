//! Rational resolution caps.

use core::fmt;

use serde_json::{Value, json};

use crate::error::{OperationError, Result};
use crate::geometry::Dimension;

/// Exact fraction with positive terms.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: u64,
    denominator: u64,
}

impl Rational {
    pub fn new(numerator: u64, denominator: u64) -> Result<Self> {
        if denominator == 0 {
            return Err(OperationError::InvalidParameter(
                "denominator must be positive".into(),
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Lowest terms.
    pub fn reduced(&self) -> Self {
        let g = gcd(self.numerator, self.denominator).max(1);
        Self {
            numerator: self.numerator / g,
            denominator: self.denominator / g,
        }
    }

    /// Exact product, in lowest terms.
    pub fn multiply(&self, other: &Self) -> Self {
        let a = self.reduced();
        let b = other.reduced();
        // cross-reduce first to keep the terms small
        let g1 = gcd(a.numerator, b.denominator).max(1);
        let g2 = gcd(b.numerator, a.denominator).max(1);
        Self {
            numerator: (a.numerator / g1) * (b.numerator / g2),
            denominator: (a.denominator / g2) * (b.denominator / g1),
        }
    }

    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// The largest scale, relative to the true full size, a client may see.
///
/// Used for tiered access: an identifier suffixed with `-1:2` exposes the
/// image as if it were half its real size. Pixel crop coordinates and
/// fit-to targets are interpreted in that virtual space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScaleConstraint {
    numerator: u32,
    denominator: u32,
}

impl Default for ScaleConstraint {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ScaleConstraint {
    /// 1:1, i.e. no constraint.
    pub const IDENTITY: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Requires `0 < numerator <= denominator`.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(OperationError::InvalidParameter(format!(
                "scale constraint terms must be positive (got {numerator}:{denominator})"
            )));
        }
        if numerator > denominator {
            return Err(OperationError::InvalidParameter(format!(
                "scale constraint must not exceed 1 (got {numerator}:{denominator})"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> u32 {
        self.numerator
    }

    pub fn denominator(&self) -> u32 {
        self.denominator
    }

    /// The raw fraction, for exact composition with other fractions.
    pub fn rational(&self) -> Rational {
        Rational {
            numerator: u64::from(self.numerator),
            denominator: u64::from(self.denominator),
        }
    }

    /// Same constraint in lowest terms (2:4 becomes 1:2).
    pub fn reduced(&self) -> Self {
        let g = gcd(u64::from(self.numerator), u64::from(self.denominator)) as u32;
        Self {
            numerator: self.numerator / g,
            denominator: self.denominator / g,
        }
    }

    pub fn value(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    pub fn has_effect(&self) -> bool {
        self.numerator != self.denominator
    }

    /// The virtual full size a client sees.
    pub fn constrained_size(&self, full: Dimension) -> Dimension {
        full.scaled(self.value())
    }

    /// Parse the `-n:d` suffix some identifiers carry, returning the bare
    /// identifier and the constraint. Identifiers without a well-formed
    /// suffix come back unchanged with the identity constraint.
    pub fn from_identifier_suffix<'a>(identifier: &'a str, delimiter: &str) -> (&'a str, Self) {
        let parse = || {
            let (base, suffix) = identifier.rsplit_once(delimiter)?;
            let (n, d) = suffix.split_once(':')?;
            let sc = Self::new(n.parse().ok()?, d.parse().ok()?).ok()?;
            Some((base, sc))
        };
        parse().unwrap_or((identifier, Self::IDENTITY))
    }

    /// `-n:d` style suffix, or an empty string when the constraint has no effect.
    pub fn to_identifier_suffix(&self, delimiter: &str) -> String {
        if self.has_effect() {
            format!("{delimiter}{}:{}", self.numerator, self.denominator)
        } else {
            String::new()
        }
    }

    pub fn to_map(&self) -> Value {
        json!({
            "numerator": self.numerator,
            "denominator": self.denominator,
        })
    }
}

impl fmt::Display for ScaleConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}
