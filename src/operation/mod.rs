//! Operations an [`OperationList`](crate::OperationList) is made of.
//!
//! [`Operation`] is a closed sum type. Every variant answers the same four
//! questions, dispatched by `match`:
//!
//! - what size does it produce from a given input size,
//! - is it a no-op (context-free, or against a concrete working size),
//! - what is its JSON-ready map form,
//! - what is its canonical string form (`Display`).

mod color_transform;
mod crop;
mod encode;
mod rotate;
mod scale;
mod sharpen;
mod transpose;

use core::fmt;

use serde_json::{Value, json};

pub use color_transform::ColorTransform;
pub use crop::{Crop, CropRegion};
pub use encode::Encode;
pub use rotate::Rotate;
pub use scale::{Filter, Scale, ScaleByPercent, ScaleByPixels, ScaleMode};
pub use sharpen::Sharpen;
pub use transpose::Transpose;

use crate::error::ValidationError;
use crate::geometry::Dimension;
use crate::operation_list::OperationList;
use crate::scale_constraint::ScaleConstraint;

/// Discriminant of [`Operation`], for positional lookups like
/// [`OperationList::add_after`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Crop,
    Scale,
    Rotate,
    Transpose,
    ColorTransform,
    Normalize,
    Sharpen,
    MetadataCopy,
    Encode,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Scale => "scale",
            Self::Rotate => "rotate",
            Self::Transpose => "transpose",
            Self::ColorTransform => "colortransform",
            Self::Normalize => "normalize",
            Self::Sharpen => "sharpen",
            Self::MetadataCopy => "metadatacopy",
            Self::Encode => "encode",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    Crop(Crop),
    Scale(Scale),
    Rotate(Rotate),
    Transpose(Transpose),
    ColorTransform(ColorTransform),
    /// Stretch the histogram. Size-neutral.
    Normalize,
    Sharpen(Sharpen),
    /// Carry source metadata into the derivative. Size-neutral.
    MetadataCopy,
    Encode(Encode),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Crop(_) => OperationKind::Crop,
            Self::Scale(_) => OperationKind::Scale,
            Self::Rotate(_) => OperationKind::Rotate,
            Self::Transpose(_) => OperationKind::Transpose,
            Self::ColorTransform(_) => OperationKind::ColorTransform,
            Self::Normalize => OperationKind::Normalize,
            Self::Sharpen(_) => OperationKind::Sharpen,
            Self::MetadataCopy => OperationKind::MetadataCopy,
            Self::Encode(_) => OperationKind::Encode,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Size produced from an input of size `input`. Crops and scales read
    /// their parameters through `sc`; everything else ignores it.
    pub fn resulting_size(&self, input: Dimension, sc: ScaleConstraint) -> Dimension {
        match self {
            Self::Crop(crop) => crop.resulting_size(input, sc),
            Self::Scale(scale) => scale.resulting_size(input, sc),
            Self::Rotate(rotate) => rotate.resulting_size(input),
            Self::Transpose(_)
            | Self::ColorTransform(_)
            | Self::Normalize
            | Self::Sharpen(_)
            | Self::MetadataCopy
            | Self::Encode(_) => input,
        }
    }

    /// Whether the operation would change anything, judged without an image.
    ///
    /// May report a false positive (a pixel crop that happens to cover the
    /// whole image) but never a false negative.
    pub fn has_effect(&self) -> bool {
        match self {
            Self::Crop(crop) => crop.has_effect(),
            Self::Scale(scale) => scale.has_effect(),
            Self::Rotate(rotate) => rotate.has_effect(),
            Self::Sharpen(sharpen) => sharpen.has_effect(),
            Self::Transpose(_)
            | Self::ColorTransform(_)
            | Self::Normalize
            | Self::MetadataCopy
            | Self::Encode(_) => true,
        }
    }

    /// Whether the operation would change an image of size `working`, the
    /// output of everything before it.
    pub fn has_effect_at(&self, working: Dimension, sc: ScaleConstraint) -> bool {
        match self {
            Self::Crop(crop) => crop.has_effect_at(working, sc),
            Self::Scale(scale) => scale.has_effect_at(working, sc),
            _ => self.has_effect(),
        }
    }

    /// Whether the operation would change anything when applied as part of
    /// `list` to a source of size `full`.
    ///
    /// The working size is `full` folded through the operations preceding
    /// this one in `list`. An operation not found in `list` is judged
    /// against `full`.
    pub fn has_effect_in(&self, full: Dimension, list: &OperationList) -> bool {
        let working = list.working_size_before(self, full);
        self.has_effect_at(working, list.scale_constraint())
    }

    /// Check the operation against an input of size `input`.
    pub fn validate(
        &self,
        input: Dimension,
        sc: ScaleConstraint,
    ) -> Result<(), ValidationError> {
        match self {
            Self::Crop(crop) => crop.validate(input, sc),
            _ => Ok(()),
        }
    }

    /// JSON-ready form with a `"class"` discriminator. Sizes are resolved
    /// against `input`, in pixels.
    pub fn to_map(&self, input: Dimension, sc: ScaleConstraint) -> Value {
        match self {
            Self::Crop(crop) => crop.to_map(input, sc),
            Self::Scale(scale) => scale.to_map(input, sc),
            Self::Rotate(rotate) => rotate.to_map(),
            Self::Transpose(transpose) => transpose.to_map(),
            Self::ColorTransform(transform) => transform.to_map(),
            Self::Normalize => json!({"class": "Normalize"}),
            Self::Sharpen(sharpen) => sharpen.to_map(),
            Self::MetadataCopy => json!({"class": "MetadataCopy"}),
            Self::Encode(encode) => encode.to_map(),
        }
    }

    pub fn as_crop(&self) -> Option<&Crop> {
        match self {
            Self::Crop(crop) => Some(crop),
            _ => None,
        }
    }

    pub fn as_scale(&self) -> Option<&Scale> {
        match self {
            Self::Scale(scale) => Some(scale),
            _ => None,
        }
    }

    pub fn as_encode(&self) -> Option<&Encode> {
        match self {
            Self::Encode(encode) => Some(encode),
            _ => None,
        }
    }
}

/// Canonical form: `kind:parameters`, or just `kind` for parameterless
/// operations. Used verbatim in list strings and cache keys.
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::Crop(crop) => write!(f, "{name}:{crop}"),
            Self::Scale(scale) => write!(f, "{name}:{scale}"),
            Self::Rotate(rotate) => write!(f, "{name}:{rotate}"),
            Self::Transpose(transpose) => write!(f, "{name}:{transpose}"),
            Self::ColorTransform(transform) => write!(f, "{name}:{transform}"),
            Self::Sharpen(sharpen) => write!(f, "{name}:{sharpen}"),
            Self::Encode(encode) => write!(f, "{name}:{encode}"),
            Self::Normalize | Self::MetadataCopy => f.write_str(name),
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident),*) => {$(
        impl From<$variant> for Operation {
            fn from(op: $variant) -> Self {
                Self::$variant(op)
            }
        }
    )*};
}

impl_from!(Crop, Scale, Rotate, Transpose, ColorTransform, Sharpen, Encode);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    #[test]
    fn size_neutral_operations() {
        let size = Dimension::from_px(600, 400);
        let ops: [Operation; 6] = [
            Transpose::Horizontal.into(),
            ColorTransform::Gray.into(),
            Operation::Normalize,
            Sharpen::new(0.5).unwrap().into(),
            Operation::MetadataCopy,
            Encode::new(Format::Png).into(),
        ];
        for op in ops {
            assert_eq!(op.resulting_size(size, ScaleConstraint::IDENTITY), size, "{op}");
        }
    }

    #[test]
    fn no_op_detection() {
        assert!(!Operation::from(Crop::full()).has_effect());
        assert!(!Operation::from(Scale::percent(1.0).unwrap()).has_effect());
        assert!(!Operation::from(Rotate::new(0.0).unwrap()).has_effect());
        assert!(Operation::from(Rotate::new(0.001).unwrap()).has_effect());
        assert!(Operation::from(Transpose::Vertical).has_effect());
    }

    #[test]
    fn tagged_display() {
        assert_eq!(Operation::from(Rotate::new(45.0).unwrap()).to_string(), "rotate:45");
        assert_eq!(Operation::from(Sharpen::new(45.0).unwrap()).to_string(), "sharpen:45");
        assert_eq!(Operation::from(Transpose::Horizontal).to_string(), "transpose:h");
        assert_eq!(Operation::Normalize.to_string(), "normalize");
        assert_eq!(
            Operation::from(Crop::pixels(0, 0, 10, 10).unwrap()).to_string(),
            "crop:0,0,10,10"
        );
    }

    #[test]
    fn maps_carry_class() {
        let size = Dimension::from_px(600, 400);
        let ops: [Operation; 4] = [
            ColorTransform::Bitonal.into(),
            Operation::MetadataCopy,
            Transpose::Vertical.into(),
            Rotate::new(90.0).unwrap().into(),
        ];
        let classes: Vec<_> = ops
            .iter()
            .map(|op| op.to_map(size, ScaleConstraint::IDENTITY)["class"].clone())
            .collect();
        assert_eq!(
            classes,
            [
                json!("ColorTransform"),
                json!("MetadataCopy"),
                json!("Transpose"),
                json!("Rotate")
            ]
        );
    }
}
