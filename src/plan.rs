//! Decode planning and decoder negotiation.
//!
//! Planning happens in two phases, like any negotiation with a decoder
//! that may not honor every request:
//!
//! 1. [`plan`] picks the deepest reduction factor the source offers that
//!    still avoids a decode-stage upscale, and resolves the crop region in
//!    that tier. [`DecodePlan::request`] is what gets sent to the decoder.
//! 2. The decoder reports what it actually did as a [`DecoderOffer`].
//!    [`DecodePlan::finalize`] re-resolves the region and residual scale
//!    against the tier that was really decoded.
//!
//! ```
//! use zenops::{Crop, Dimension, OperationList, ReductionFactor, Scale, plan};
//! use zenops::plan::DecoderOffer;
//!
//! let list = OperationList::builder()
//!     .operation(Crop::pixels(0, 0, 2000, 2000).unwrap())
//!     .operation(Scale::to_width(250).unwrap())
//!     .build();
//! let full = Dimension::from_px(4000, 3000);
//!
//! let ideal = plan(&list, full, ReductionFactor::new(5).unwrap());
//! assert_eq!(ideal.reduction_factor.factor(), 3);
//! assert_eq!(ideal.region.int_width(), 250);
//!
//! // the decoder could only manage the half-size tier
//! let offer = DecoderOffer::new(ReductionFactor::new(1).unwrap());
//! let plan = ideal.finalize(&list, &offer);
//! assert_eq!(plan.region.int_width(), 1000);
//! assert_eq!(plan.differential_scales, (0.25, 0.25));
//! ```

use crate::geometry::{Dimension, Rectangle};
use crate::operation::{Crop, Scale};
use crate::operation_list::OperationList;
use crate::reduction::ReductionFactor;
use crate::scale_constraint::ScaleConstraint;

/// What the planner wants the decoder to do.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DecoderRequest {
    /// Tier to decode.
    pub reduction_factor: ReductionFactor,
    /// Region of that tier, in the tier's stored (pre-orientation) coordinates.
    pub region: Rectangle,
}

/// What the decoder actually did.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DecoderOffer {
    /// Tier the decoder delivered.
    pub reduction_factor: ReductionFactor,
}

impl DecoderOffer {
    pub fn new(reduction_factor: ReductionFactor) -> Self {
        Self { reduction_factor }
    }

    /// Default offer: the decoder ignored the reduction factor and decoded
    /// full resolution.
    pub fn full_decode() -> Self {
        Self::new(ReductionFactor::default())
    }
}

/// How to get from the source to the requested output through a decoder.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DecodePlan {
    /// True full size of the source.
    pub full_size: Dimension,
    pub reduction_factor: ReductionFactor,
    /// Size of the tier at `reduction_factor`.
    pub reduced_size: Dimension,
    /// Crop region within the tier.
    pub region: Rectangle,
    /// Scale still to apply to `region` after decoding, per axis.
    pub differential_scales: (f64, f64),
    /// Final output size of the whole list.
    pub resulting_size: Dimension,
}

/// Plan the decode of `list` against a source of size `full` whose deepest
/// available tier is `max_reduction` (0 for a single-resolution source).
///
/// Only the first crop and the first scale take part in the decode split;
/// the rest of the list runs on the decoded pixels.
pub fn plan(list: &OperationList, full: Dimension, max_reduction: ReductionFactor) -> DecodePlan {
    let sc = list.scale_constraint();
    let input = scale_input(list.first_crop(), full, sc);
    let rf = match list.first_scale() {
        Some(scale) => scale.reduction_factor(input, sc, max_reduction),
        None if sc.has_effect() => ReductionFactor::for_scale(sc.value()).clamped(max_reduction),
        None => ReductionFactor::default(),
    };
    let plan = DecodePlan::at(list, full, rf);
    tracing::debug!(
        rf = %plan.reduction_factor,
        max = %max_reduction,
        region = %plan.region,
        "decode planned"
    );
    plan
}

/// Size entering the scale: the crop region in full-size pixels.
fn scale_input(crop: Option<&Crop>, full: Dimension, sc: ScaleConstraint) -> Dimension {
    crop.map_or(full, |c| c.rectangle_constrained(full, sc).size().rounded())
}

fn differential_scales(
    scale: Option<&Scale>,
    input: Dimension,
    rf: ReductionFactor,
    sc: ScaleConstraint,
) -> (f64, f64) {
    match scale {
        Some(scale) => scale.differential_scales(input, rf, sc),
        None => {
            let s = sc.value() / rf.scale();
            (s, s)
        }
    }
}

impl DecodePlan {
    /// Resolve `list` against the tier at `rf`, whatever it is.
    pub fn at(list: &OperationList, full: Dimension, rf: ReductionFactor) -> Self {
        let sc = list.scale_constraint();
        let crop = list.first_crop();
        let reduced_size = rf.reduced_size(full);
        let region = crop.map_or(Rectangle::of_size(reduced_size), |c| {
            c.rectangle_reduced(reduced_size, rf, sc)
        });
        let input = scale_input(crop, full, sc);
        Self {
            full_size: full,
            reduction_factor: rf,
            reduced_size,
            region,
            differential_scales: differential_scales(list.first_scale(), input, rf, sc),
            resulting_size: list.resulting_size(full),
        }
    }

    pub fn request(&self) -> DecoderRequest {
        DecoderRequest {
            reduction_factor: self.reduction_factor,
            region: self.region,
        }
    }

    /// Re-plan for the tier the decoder actually delivered.
    pub fn finalize(&self, list: &OperationList, offer: &DecoderOffer) -> Self {
        if offer.reduction_factor == self.reduction_factor {
            return *self;
        }
        tracing::debug!(
            requested = %self.reduction_factor,
            delivered = %offer.reduction_factor,
            "decoder delivered a different tier"
        );
        Self::at(list, self.full_size, offer.reduction_factor)
    }

    /// Size after the differential scale, before any later operation.
    pub fn scaled_size(&self) -> Dimension {
        let (sx, sy) = self.differential_scales;
        self.region.size().scaled_xy(sx, sy).rounded()
    }

    /// Whether the residual scale is the identity on both axes.
    pub fn scale_is_identity(&self) -> bool {
        let (sx, sy) = self.differential_scales;
        (sx - 1.0).abs() < 1e-9 && (sy - 1.0).abs() < 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Orientation;

    fn rf(f: u8) -> ReductionFactor {
        ReductionFactor::new(f).unwrap()
    }

    fn sc(n: u32, d: u32) -> ScaleConstraint {
        ScaleConstraint::new(n, d).unwrap()
    }

    #[test]
    fn no_scale_decodes_full_resolution() {
        let list = OperationList::with_operations("id", [Crop::square().into()]);
        let p = plan(&list, Dimension::from_px(300, 200), rf(4));
        assert_eq!(p.reduction_factor, rf(0));
        assert_eq!(p.region, Rectangle::new(50.0, 0.0, 200.0, 200.0).unwrap());
        assert!(p.scale_is_identity());
    }

    #[test]
    fn constraint_alone_picks_a_tier() {
        let list = OperationList::builder().scale_constraint(sc(1, 4)).build();
        let p = plan(&list, Dimension::from_px(1000, 800), rf(4));
        assert_eq!(p.reduction_factor, rf(2));
        assert_eq!(p.reduced_size, Dimension::from_px(250, 200));
        assert_eq!(p.differential_scales, (1.0, 1.0));
        assert_eq!(p.scaled_size(), p.resulting_size);
    }

    #[test]
    fn single_resolution_source_never_reduces() {
        let list = OperationList::with_operations("id", [Scale::percent(0.1).unwrap().into()]);
        let p = plan(&list, Dimension::from_px(1000, 800), rf(0));
        assert_eq!(p.reduction_factor, rf(0));
        assert_eq!(p.differential_scales, (0.1, 0.1));
    }

    #[test]
    fn region_follows_crop_orientation() {
        let crop = Crop::pixels(100, 100, 200, 200)
            .unwrap()
            .with_orientation(Orientation::Rotate90);
        let list = OperationList::builder()
            .operation(crop)
            .operation(Scale::to_width(50).unwrap())
            .scale_constraint(sc(1, 2))
            .build();
        let p = plan(&list, Dimension::from_px(2000, 2000), rf(5));
        // crop is 400×400 of the full image, 50 wide is 1/8
        assert_eq!(p.reduction_factor, rf(3));
        assert_eq!(p.region, Rectangle::new(25.0, 175.0, 50.0, 50.0).unwrap());
        assert_eq!(p.differential_scales, (1.0, 1.0));
    }

    #[test]
    fn finalize_with_same_tier_is_unchanged() {
        let list = OperationList::with_operations("id", [Scale::percent(0.25).unwrap().into()]);
        let ideal = plan(&list, Dimension::from_px(800, 800), rf(3));
        let offer = DecoderOffer::new(ideal.reduction_factor);
        assert_eq!(ideal.finalize(&list, &offer), ideal);
        assert_eq!(ideal.request().reduction_factor, rf(2));
    }

    #[test]
    fn finalize_after_full_decode() {
        let list = OperationList::with_operations("id", [Scale::percent(0.25).unwrap().into()]);
        let ideal = plan(&list, Dimension::from_px(800, 800), rf(3));
        let actual = ideal.finalize(&list, &DecoderOffer::full_decode());
        assert_eq!(actual.reduction_factor, rf(0));
        assert_eq!(actual.region.size(), Dimension::from_px(800, 800));
        assert_eq!(actual.differential_scales, (0.25, 0.25));
        assert_eq!(actual.scaled_size(), ideal.scaled_size());
    }
}
