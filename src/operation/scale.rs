//! Scaling, reduction-factor selection, and differential scales.
//!
//! Fit targets (`to_width`, `fit_inside`, …) are absolute output sizes, so
//! the scale constraint does not change the resulting scale for them; it
//! only matters for [`ScaleMode::Full`] and percentage scales, which are
//! relative to what the client is allowed to see.
//!
//! Decoding a pyramidal source happens in two steps:
//!
//! ```text
//!     full ──decode at rf (×2^-rf)──▶ tier ──differential scale──▶ result
//! ```
//!
//! [`Scale::reduction_factor`] picks the deepest tier that is still at least
//! as large as the result, so the differential scale is never an upscale
//! unless the request itself is one.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{OperationError, Result};
use crate::geometry::{DELTA, Dimension};
use crate::reduction::ReductionFactor;
use crate::scale_constraint::ScaleConstraint;

/// Resampling kernel hint passed through to the resampler.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    Bell,
    Bicubic,
    Box,
    Bspline,
    Hermite,
    Lanczos3,
    Mitchell,
    Triangle,
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bell => "bell",
            Self::Bicubic => "bicubic",
            Self::Box => "box",
            Self::Bspline => "bspline",
            Self::Hermite => "hermite",
            Self::Lanczos3 => "lanczos3",
            Self::Mitchell => "mitchell",
            Self::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self> {
        let filter = match s.to_ascii_lowercase().replace('-', "").as_str() {
            "bell" => Self::Bell,
            "bicubic" => Self::Bicubic,
            "box" => Self::Box,
            "bspline" => Self::Bspline,
            "hermite" => Self::Hermite,
            "lanczos3" => Self::Lanczos3,
            "mitchell" => Self::Mitchell,
            "triangle" => Self::Triangle,
            _ => {
                return Err(OperationError::InvalidParameter(format!(
                    "unknown resample filter: {s:?}"
                )));
            }
        };
        Ok(filter)
    }
}

/// How a [`ScaleByPixels`] target is fitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScaleMode {
    /// Keep the (constrained) full size.
    Full,
    /// Uniform scale to the target width.
    AspectFitWidth,
    /// Uniform scale to the target height.
    AspectFitHeight,
    /// Largest uniform scale that fits inside the target box.
    AspectFitInside,
    /// Stretch each axis to the target independently.
    NonAspectFill,
}

impl ScaleMode {
    fn name(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::AspectFitWidth => "aspect_fit_width",
            Self::AspectFitHeight => "aspect_fit_height",
            Self::AspectFitInside => "aspect_fit_inside",
            Self::NonAspectFill => "non_aspect_fill",
        }
    }
}

/// Scale to a target in output pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScaleByPixels {
    width: Option<u32>,
    height: Option<u32>,
    mode: ScaleMode,
    max_scale: Option<f64>,
    filter: Option<Filter>,
}

impl ScaleByPixels {
    /// Each mode needs exactly the axes it fits: width for
    /// `AspectFitWidth`, height for `AspectFitHeight`, both for
    /// `AspectFitInside` and `NonAspectFill`, none for `Full`.
    pub fn new(width: Option<u32>, height: Option<u32>, mode: ScaleMode) -> Result<Self> {
        if width == Some(0) || height == Some(0) {
            return Err(OperationError::InvalidParameter(
                "scale width and height must be positive".into(),
            ));
        }
        let (need_w, need_h) = match mode {
            ScaleMode::Full => (false, false),
            ScaleMode::AspectFitWidth => (true, false),
            ScaleMode::AspectFitHeight => (false, true),
            ScaleMode::AspectFitInside | ScaleMode::NonAspectFill => (true, true),
        };
        if width.is_some() != need_w || height.is_some() != need_h {
            return Err(OperationError::InvalidParameter(format!(
                "{} scale requires {}",
                mode.name(),
                match (need_w, need_h) {
                    (false, false) => "no dimensions",
                    (true, false) => "a width only",
                    (false, true) => "a height only",
                    (true, true) => "both width and height",
                }
            )));
        }
        Ok(Self {
            width,
            height,
            mode,
            max_scale: None,
            filter: None,
        })
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn max_scale(&self) -> Option<f64> {
        self.max_scale
    }

    fn resulting_scales(&self, size: Dimension, sc: ScaleConstraint) -> (f64, f64) {
        let sx = ratio(self.width, size.width());
        let sy = ratio(self.height, size.height());
        match self.mode {
            ScaleMode::Full => (sc.value(), sc.value()),
            ScaleMode::AspectFitWidth => (sx, sx),
            ScaleMode::AspectFitHeight => (sy, sy),
            ScaleMode::AspectFitInside => {
                let s = sx.min(sy);
                let s = self.max_scale.map_or(s, |max| s.min(max));
                (s, s)
            }
            ScaleMode::NonAspectFill => (sx, sy),
        }
    }
}

fn ratio(target: Option<u32>, length: f64) -> f64 {
    match target {
        Some(t) if length > 0.0 => f64::from(t) / length,
        _ => 1.0,
    }
}

/// Scale by a fraction of the (constrained) input size. `1.0` is 100%.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScaleByPercent {
    percent: f64,
    filter: Option<Filter>,
}

impl ScaleByPercent {
    pub fn new(percent: f64) -> Result<Self> {
        if !(percent.is_finite() && percent > 0.0) {
            return Err(OperationError::InvalidParameter(format!(
                "scale percent must be positive (got {percent})"
            )));
        }
        Ok(Self {
            percent,
            filter: None,
        })
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scale {
    ByPixels(ScaleByPixels),
    ByPercent(ScaleByPercent),
}

impl Scale {
    /// No explicit target: the constrained full size.
    pub fn full() -> Self {
        Self::ByPixels(ScaleByPixels {
            width: None,
            height: None,
            mode: ScaleMode::Full,
            max_scale: None,
            filter: None,
        })
    }

    pub fn to_width(width: u32) -> Result<Self> {
        ScaleByPixels::new(Some(width), None, ScaleMode::AspectFitWidth).map(Self::ByPixels)
    }

    pub fn to_height(height: u32) -> Result<Self> {
        ScaleByPixels::new(None, Some(height), ScaleMode::AspectFitHeight).map(Self::ByPixels)
    }

    pub fn fit_inside(width: u32, height: u32) -> Result<Self> {
        ScaleByPixels::new(Some(width), Some(height), ScaleMode::AspectFitInside)
            .map(Self::ByPixels)
    }

    pub fn non_aspect_fill(width: u32, height: u32) -> Result<Self> {
        ScaleByPixels::new(Some(width), Some(height), ScaleMode::NonAspectFill)
            .map(Self::ByPixels)
    }

    pub fn by_pixels(width: Option<u32>, height: Option<u32>, mode: ScaleMode) -> Result<Self> {
        ScaleByPixels::new(width, height, mode).map(Self::ByPixels)
    }

    pub fn percent(percent: f64) -> Result<Self> {
        ScaleByPercent::new(percent).map(Self::ByPercent)
    }

    pub fn filter(&self) -> Option<Filter> {
        match self {
            Self::ByPixels(s) => s.filter,
            Self::ByPercent(s) => s.filter,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.set_filter(Some(filter));
        self
    }

    pub fn set_filter(&mut self, filter: Option<Filter>) {
        match self {
            Self::ByPixels(s) => s.filter = filter,
            Self::ByPercent(s) => s.filter = filter,
        }
    }

    /// Cap on the uniform scale of an [`AspectFitInside`](ScaleMode::AspectFitInside)
    /// scale. Must be positive. Other modes reject it.
    pub fn set_max_scale(&mut self, max_scale: f64) -> Result<()> {
        if !(max_scale.is_finite() && max_scale > 0.0) {
            return Err(OperationError::InvalidParameter(format!(
                "max scale must be positive (got {max_scale})"
            )));
        }
        match self {
            Self::ByPixels(s) if s.mode == ScaleMode::AspectFitInside => {
                s.max_scale = Some(max_scale);
                Ok(())
            }
            _ => Err(OperationError::Unsupported(
                "max scale applies only to aspect-fit-inside scales",
            )),
        }
    }

    pub fn with_max_scale(mut self, max_scale: f64) -> Result<Self> {
        self.set_max_scale(max_scale)?;
        Ok(self)
    }

    pub fn is_non_aspect(&self) -> bool {
        matches!(self, Self::ByPixels(s) if s.mode == ScaleMode::NonAspectFill)
    }

    /// Horizontal and vertical scale relative to `size`, the input of this
    /// operation in full-resolution pixels.
    pub fn resulting_scales(&self, size: Dimension, sc: ScaleConstraint) -> (f64, f64) {
        match self {
            Self::ByPixels(s) => s.resulting_scales(size, sc),
            Self::ByPercent(s) => {
                let v = s.percent * sc.value();
                (v, v)
            }
        }
    }

    /// Uniform scale relative to `size`. Non-aspect fills have none.
    pub fn resulting_scale(&self, size: Dimension, sc: ScaleConstraint) -> Result<f64> {
        if self.is_non_aspect() {
            return Err(OperationError::Unsupported(
                "non-aspect fill has no uniform scale; use resulting_scales",
            ));
        }
        Ok(self.resulting_scales(size, sc).0)
    }

    pub fn resulting_size(&self, size: Dimension, sc: ScaleConstraint) -> Dimension {
        let (sx, sy) = self.resulting_scales(size, sc);
        size.scaled_xy(sx, sy)
    }

    /// Deepest reduction factor whose tier is still no smaller than the
    /// result, never deeper than `max`, the deepest tier the source offers.
    ///
    /// For a non-aspect fill the larger axis scale decides, so neither axis
    /// needs upscaling after the decode.
    pub fn reduction_factor(
        &self,
        size: Dimension,
        sc: ScaleConstraint,
        max: ReductionFactor,
    ) -> ReductionFactor {
        let (sx, sy) = self.resulting_scales(size, sc);
        let target = sx.max(sy);
        let rf = ReductionFactor::for_scale(target).clamped(max);
        tracing::trace!(target, %rf, %max, "reduction factor for scale");
        rf
    }

    /// Scales still to apply after decoding `full` at `rf`.
    pub fn differential_scales(
        &self,
        full: Dimension,
        rf: ReductionFactor,
        sc: ScaleConstraint,
    ) -> (f64, f64) {
        let (sx, sy) = self.resulting_scales(full, sc);
        (sx / rf.scale(), sy / rf.scale())
    }

    /// Uniform form of [`differential_scales`](Self::differential_scales).
    pub fn differential_scale(
        &self,
        full: Dimension,
        rf: ReductionFactor,
        sc: ScaleConstraint,
    ) -> Result<f64> {
        Ok(self.resulting_scale(full, sc)? / rf.scale())
    }

    pub fn is_up(&self, size: Dimension, sc: ScaleConstraint) -> bool {
        self.is_width_up(size, sc) || self.is_height_up(size, sc)
    }

    pub fn is_width_up(&self, size: Dimension, sc: ScaleConstraint) -> bool {
        self.resulting_scales(size, sc).0 > 1.0 + DELTA
    }

    pub fn is_height_up(&self, size: Dimension, sc: ScaleConstraint) -> bool {
        self.resulting_scales(size, sc).1 > 1.0 + DELTA
    }

    /// Context-free no-op test: a full-size or 100% scale.
    pub fn has_effect(&self) -> bool {
        match self {
            Self::ByPixels(s) => s.mode != ScaleMode::Full,
            Self::ByPercent(s) => (s.percent - 1.0).abs() > DELTA,
        }
    }

    /// Whether the scale changes an input of size `working`. Any effective
    /// scale constraint counts as a change.
    pub fn has_effect_at(&self, working: Dimension, sc: ScaleConstraint) -> bool {
        if sc.has_effect() {
            return true;
        }
        let (sx, sy) = self.resulting_scales(working, sc);
        (sx - 1.0).abs() > DELTA || (sy - 1.0).abs() > DELTA
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Self::ByPixels(_) => "ScaleByPixels",
            Self::ByPercent(_) => "ScaleByPercent",
        }
    }

    pub fn to_map(&self, size: Dimension, sc: ScaleConstraint) -> Value {
        let result = self.resulting_size(size, sc);
        let mut map = json!({
            "class": self.class_name(),
            "width": result.int_width(),
            "height": result.int_height(),
        });
        match self {
            Self::ByPixels(s) => map["mode"] = json!(s.mode.name()),
            Self::ByPercent(s) => map["percent"] = json!(s.percent),
        }
        if let Some(filter) = self.filter() {
            map["filter"] = json!(filter.name());
        }
        map
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByPixels(s) if s.mode == ScaleMode::Full => f.write_str("none")?,
            Self::ByPixels(s) => {
                if s.mode == ScaleMode::AspectFitInside {
                    f.write_str("!")?;
                }
                if let Some(w) = s.width {
                    write!(f, "{w}")?;
                }
                f.write_str(",")?;
                if let Some(h) = s.height {
                    write!(f, "{h}")?;
                }
                if let Some(max) = s.max_scale {
                    write!(f, ",max{max}")?;
                }
            }
            Self::ByPercent(s) => write!(f, "{}%", s.percent * 100.0)?,
        }
        if let Some(filter) = self.filter() {
            write!(f, ",{filter}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(w: f64, h: f64) -> Dimension {
        Dimension::new(w, h).unwrap()
    }

    fn sc(n: u32, d: u32) -> ScaleConstraint {
        ScaleConstraint::new(n, d).unwrap()
    }

    fn rf(f: u8) -> ReductionFactor {
        ReductionFactor::new(f).unwrap()
    }

    const ID: ScaleConstraint = ScaleConstraint::IDENTITY;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    // ── construction ──

    #[test]
    fn modes_require_their_axes() {
        assert!(Scale::by_pixels(Some(100), None, ScaleMode::AspectFitWidth).is_ok());
        assert!(Scale::by_pixels(None, Some(100), ScaleMode::AspectFitWidth).is_err());
        assert!(Scale::by_pixels(Some(100), None, ScaleMode::AspectFitInside).is_err());
        assert!(Scale::by_pixels(Some(100), Some(50), ScaleMode::Full).is_err());
        assert!(Scale::by_pixels(None, None, ScaleMode::Full).is_ok());
    }

    #[test]
    fn rejects_non_positive() {
        assert!(Scale::to_width(0).is_err());
        assert!(Scale::fit_inside(10, 0).is_err());
        assert!(Scale::percent(0.0).is_err());
        assert!(Scale::percent(-0.5).is_err());
        assert!(Scale::percent(f64::NAN).is_err());
        assert!(Scale::percent(2.5).is_ok());
    }

    #[test]
    fn max_scale_only_for_fit_inside() {
        assert!(Scale::fit_inside(10, 10).unwrap().with_max_scale(1.0).is_ok());
        assert!(Scale::fit_inside(10, 10).unwrap().with_max_scale(0.0).is_err());
        assert!(matches!(
            Scale::to_width(10).unwrap().with_max_scale(1.0),
            Err(OperationError::Unsupported(_))
        ));
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("B-Spline".parse::<Filter>().unwrap(), Filter::Bspline);
        assert_eq!("LANCZOS3".parse::<Filter>().unwrap(), Filter::Lanczos3);
        assert!("nearest".parse::<Filter>().is_err());
    }

    // ── resulting sizes ──

    #[test]
    fn fit_width_rounds_half_up() {
        // 600×400 → 400 wide keeps 3:2, height 266.67
        let result = Scale::to_width(400).unwrap().resulting_size(size(600.0, 400.0), ID);
        assert_eq!(result.int_width(), 400);
        assert_eq!(result.int_height(), 267);
    }

    #[test]
    fn fit_height() {
        let result = Scale::to_height(200).unwrap().resulting_size(size(600.0, 400.0), sc(1, 2));
        assert_eq!(result.rounded(), size(300.0, 200.0));
    }

    #[test]
    fn fit_inside_upscale() {
        let result = Scale::fit_inside(1200, 600).unwrap().resulting_size(size(600.0, 400.0), ID);
        assert_eq!(result.rounded(), size(900.0, 600.0));
    }

    #[test]
    fn fit_inside_clamped_by_max_scale() {
        let scale = Scale::fit_inside(1200, 600).unwrap().with_max_scale(1.0).unwrap();
        let result = scale.resulting_size(size(600.0, 400.0), ID);
        assert_eq!(result.rounded(), size(600.0, 400.0));
    }

    #[test]
    fn non_aspect_fill_stretches() {
        let fill = Scale::non_aspect_fill(900, 300).unwrap();
        let result = fill.resulting_size(size(600.0, 400.0), ID);
        assert_eq!(result.rounded(), size(900.0, 300.0));
    }

    #[test]
    fn full_and_percent_follow_constraint() {
        let full = size(600.0, 400.0);
        assert_eq!(Scale::full().resulting_size(full, sc(1, 2)), size(300.0, 200.0));
        assert_eq!(
            Scale::percent(0.5).unwrap().resulting_size(full, sc(1, 2)),
            size(150.0, 100.0)
        );
    }

    #[test]
    fn uniform_scale_unsupported_for_non_aspect() {
        let scale = Scale::non_aspect_fill(200, 150).unwrap();
        assert!(matches!(
            scale.resulting_scale(size(1000.0, 800.0), ID),
            Err(OperationError::Unsupported(_))
        ));
        assert!(matches!(
            scale.differential_scale(size(1000.0, 800.0), rf(1), ID),
            Err(OperationError::Unsupported(_))
        ));
    }

    // ── reduction factors ──

    #[test]
    fn reduction_factor_ignores_constraint_for_fit_targets() {
        let size = size(300.0, 300.0);
        let max = ReductionFactor::MAX;
        for scale in [
            Scale::to_width(145).unwrap(),
            Scale::to_height(145).unwrap(),
            Scale::fit_inside(145, 145).unwrap(),
            Scale::non_aspect_fill(145, 145).unwrap(),
        ] {
            assert_eq!(scale.reduction_factor(size, ID, max), rf(1), "{scale}");
            assert_eq!(scale.reduction_factor(size, sc(1, 2), max), rf(1), "{scale}");
        }
    }

    #[test]
    fn reduction_factor_for_percent_composes_constraint() {
        let size = size(1000.0, 1000.0);
        let scale = Scale::percent(0.5).unwrap();
        assert_eq!(scale.reduction_factor(size, ID, ReductionFactor::MAX), rf(1));
        assert_eq!(scale.reduction_factor(size, sc(1, 4), ReductionFactor::MAX), rf(3));
    }

    #[test]
    fn reduction_factor_capped_by_source() {
        let scale = Scale::percent(0.01).unwrap();
        assert_eq!(scale.reduction_factor(size(10000.0, 10000.0), ID, rf(2)), rf(2));
    }

    #[test]
    fn non_aspect_reduction_uses_larger_axis() {
        // 0.2 horizontally, 0.6 vertically: only rf 0 avoids upscaling the height
        let scale = Scale::non_aspect_fill(200, 480).unwrap();
        assert_eq!(
            scale.reduction_factor(size(1000.0, 800.0), ID, ReductionFactor::MAX),
            rf(0)
        );
    }

    #[test]
    fn upscale_never_reduces() {
        let scale = Scale::fit_inside(1200, 600).unwrap();
        assert_eq!(
            scale.reduction_factor(size(600.0, 400.0), ID, ReductionFactor::MAX),
            rf(0)
        );
    }

    // ── differential scales ──

    #[test]
    fn differential_scales_after_reduced_decode() {
        // client sees 250×200, reader returns the rf=2 tier, also 250×200
        let full = size(1000.0, 800.0);
        let sc = sc(1, 4);
        let cases = [
            (Scale::to_width(200).unwrap(), (0.8, 0.8)),
            (Scale::to_height(150).unwrap(), (0.75, 0.75)),
            (Scale::fit_inside(200, 150).unwrap(), (0.75, 0.75)),
            (Scale::non_aspect_fill(200, 150).unwrap(), (0.8, 0.75)),
        ];
        for (scale, (wx, wy)) in cases {
            let (dx, dy) = scale.differential_scales(full, rf(2), sc);
            assert_close(dx, wx);
            assert_close(dy, wy);
        }
        assert_close(
            Scale::to_width(200).unwrap().differential_scale(full, rf(2), sc).unwrap(),
            0.8,
        );
    }

    // ── direction ──

    #[test]
    fn up_per_axis() {
        let full = size(600.0, 400.0);
        let scale = Scale::non_aspect_fill(900, 300).unwrap();
        assert!(scale.is_up(full, ID));
        assert!(scale.is_width_up(full, ID));
        assert!(!scale.is_height_up(full, ID));

        let scale = Scale::to_width(300).unwrap();
        assert!(!scale.is_up(full, ID));
        assert!(!Scale::percent(1.0).unwrap().is_up(full, ID));
    }

    // ── no-op detection ──

    #[test]
    fn context_free_effect() {
        assert!(!Scale::full().has_effect());
        assert!(!Scale::percent(1.0).unwrap().has_effect());
        assert!(Scale::percent(0.999).unwrap().has_effect());
        assert!(Scale::to_width(600).unwrap().has_effect());
    }

    #[test]
    fn effect_against_working_size() {
        let working = size(600.0, 400.0);
        assert!(!Scale::to_width(600).unwrap().has_effect_at(working, ID));
        assert!(!Scale::fit_inside(600, 400).unwrap().has_effect_at(working, ID));
        assert!(!Scale::fit_inside(900, 400).unwrap().has_effect_at(working, ID));
        assert!(Scale::non_aspect_fill(600, 401).unwrap().has_effect_at(working, ID));
        assert!(!Scale::percent(1.0).unwrap().has_effect_at(working, ID));
        assert!(Scale::percent(1.0).unwrap().has_effect_at(working, sc(1, 2)));
    }

    // ── canonical forms ──

    #[test]
    fn display_forms() {
        assert_eq!(Scale::full().to_string(), "none");
        assert_eq!(Scale::to_width(400).unwrap().to_string(), "400,");
        assert_eq!(Scale::to_height(300).unwrap().to_string(), ",300");
        assert_eq!(Scale::fit_inside(400, 300).unwrap().to_string(), "!400,300");
        assert_eq!(Scale::non_aspect_fill(400, 300).unwrap().to_string(), "400,300");
        assert_eq!(Scale::percent(0.5).unwrap().to_string(), "50%");
        assert_eq!(
            Scale::percent(0.5).unwrap().with_filter(Filter::Bicubic).to_string(),
            "50%,bicubic"
        );
    }

    #[test]
    fn map_has_resolved_size() {
        let map = Scale::to_width(400).unwrap().to_map(size(600.0, 400.0), ID);
        assert_eq!(
            map,
            json!({
                "class": "ScaleByPixels",
                "width": 400,
                "height": 267,
                "mode": "aspect_fit_width",
            })
        );
    }
}
