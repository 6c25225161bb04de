//! IIIF-style image operation lists: crop and scale geometry, reduction
//! factors for pyramidal sources, and derivative cache keys.
//!
//! Pure geometry and bookkeeping. No pixels are decoded or resampled here;
//! the crate tells a decoder *which region of which tier* to read and what
//! residual scale remains, and tells a cache *what to call* the result.
//!
//! # Modules
//!
//! - [`geometry`]: fractional [`Dimension`] and [`Rectangle`]
//! - [`orientation`]: source orientation and crop remapping
//! - [`scale_constraint`]: rational caps on client-visible resolution
//! - [`reduction`]: power-of-two [`ReductionFactor`]s
//! - [`operation`]: the [`Operation`] sum type and its variants
//! - [`operation_list`]: ordered, freezable [`OperationList`], canonical forms, cache keys
//! - [`plan`](mod@plan): decode planning and decoder negotiation
//! - [`config`]: processing defaults
//!
//! # Example
//!
//! ```
//! use zenops::{Crop, Dimension, OperationList, ReductionFactor, Rotate, Scale};
//!
//! let mut list = OperationList::builder()
//!     .identifier("page-17.tif")
//!     .operation(Crop::full())
//!     .operation(Scale::percent(1.0).unwrap())
//!     .operation(Rotate::new(0.0).unwrap())
//!     .build();
//! let full = Dimension::from_px(600, 400);
//! assert!(list.is_no_op(full));
//!
//! let before = list.to_filename();
//! list.add(Rotate::new(45.0).unwrap()).unwrap();
//! assert!(list.has_effect(full));
//! assert_ne!(list.to_filename(), before);
//!
//! assert_eq!(ReductionFactor::for_scale(0.25).factor(), 2);
//! ```

#![forbid(unsafe_code)]

pub mod color;
pub mod config;
pub mod error;
pub mod format;
pub mod geometry;
pub mod operation;
pub mod operation_list;
pub mod orientation;
pub mod plan;
pub mod reduction;
pub mod scale_constraint;

pub use color::Color;
pub use config::{ProcessingConfig, SourceInfo};
pub use error::{OperationError, Result, ValidationError};
pub use format::{Compression, Format};
pub use geometry::{Dimension, Rectangle};
pub use operation::{
    ColorTransform, Crop, CropRegion, Encode, Filter, Operation, OperationKind, Rotate, Scale,
    ScaleByPercent, ScaleByPixels, ScaleMode, Sharpen, Transpose,
};
pub use operation_list::{OperationList, OperationListBuilder};
pub use orientation::Orientation;
pub use plan::{DecodePlan, DecoderOffer, DecoderRequest, plan};
pub use reduction::ReductionFactor;
pub use scale_constraint::{Rational, ScaleConstraint};
