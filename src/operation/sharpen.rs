//! Unsharp-mask amount.

use core::fmt;

use serde_json::{Value, json};

use crate::error::{OperationError, Result};
use crate::geometry::DELTA;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sharpen {
    amount: f64,
}

impl Sharpen {
    /// `amount` must be non-negative. Zero is a no-op.
    pub fn new(amount: f64) -> Result<Self> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(OperationError::InvalidParameter(format!(
                "sharpen amount must be non-negative (got {amount})"
            )));
        }
        Ok(Self { amount })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn has_effect(&self) -> bool {
        self.amount > DELTA
    }

    pub fn to_map(&self) -> Value {
        json!({"class": "Sharpen", "amount": self.amount})
    }
}

impl fmt::Display for Sharpen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount)
    }
}
