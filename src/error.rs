//! Error types.

use thiserror::Error;

/// Convenient result alias for fallible operation-list calls.
pub type Result<T> = std::result::Result<T, OperationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    /// A constructor or setter was handed an out-of-range value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A mutator was called on a frozen operation list.
    #[error("operation list is frozen")]
    Frozen,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller asked for something the operation cannot express,
    /// such as a single uniform scale from a non-aspect fill.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

/// A request that is well-formed but does not fit the source image.
///
/// These are client-input errors, reported once by
/// [`OperationList::validate`](crate::OperationList::validate).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("operation list has no identifier")]
    MissingIdentifier,

    #[error("operation list has no encode operation")]
    MissingEncode,

    #[error("crop region {region} lies outside the {width}x{height} image")]
    CropOutOfBounds {
        region: String,
        width: u32,
        height: u32,
    },

    #[error("resulting image would be empty ({width}x{height})")]
    EmptyResult { width: u32, height: u32 },

    #[error("requested scale {requested} exceeds the maximum allowed {allowed}")]
    ScaleExceedsConstraint { requested: f64, allowed: f64 },

    #[error("{width}x{height} exceeds the {max_pixels} pixel limit")]
    TooManyPixels {
        width: u32,
        height: u32,
        max_pixels: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_converts_into_operation_error() {
        let err: OperationError = ValidationError::EmptyResult {
            width: 0,
            height: 10,
        }
        .into();
        assert!(matches!(err, OperationError::Validation(_)));
        assert_eq!(err.to_string(), "resulting image would be empty (0x10)");
    }

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            OperationError::InvalidParameter("quality must be 1..=100".into()).to_string(),
            "invalid parameter: quality must be 1..=100"
        );
        assert_eq!(
            OperationError::Frozen.to_string(),
            "operation list is frozen"
        );
    }
}
