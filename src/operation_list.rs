//! Ordered, freezable operation lists and their canonical forms.
//!
//! An [`OperationList`] is built up by the request layer, optionally has
//! processing defaults applied, and is then [frozen](OperationList::freeze).
//! From that point on it is a read-only value: every mutator returns
//! [`OperationError::Frozen`] and leaves the list untouched, so a frozen
//! list can be shared between threads and used as a cache key.
//!
//! # Example
//!
//! ```
//! use zenops::{Crop, Dimension, Encode, Format, OperationList, Scale};
//!
//! let mut list = OperationList::builder()
//!     .identifier("cats.jpg")
//!     .operation(Crop::percent(0.2, 0.2, 0.5, 0.5).unwrap())
//!     .operation(Scale::to_width(400).unwrap())
//!     .operation(Encode::new(Format::Jpg))
//!     .build();
//! list.freeze();
//!
//! let full = Dimension::from_px(1000, 500);
//! list.validate(full).unwrap();
//! assert_eq!(list.resulting_size(full), Dimension::from_px(400, 200));
//! assert!(list.add(Scale::percent(0.5).unwrap()).is_err());
//! assert!(list.to_filename().ends_with(".jpg"));
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::config::{ProcessingConfig, SourceInfo};
use crate::error::{OperationError, Result, ValidationError};
use crate::format::{Compression, Format};
use crate::geometry::Dimension;
use crate::operation::{Crop, Encode, Operation, OperationKind, Rotate, Scale, Sharpen};
use crate::scale_constraint::ScaleConstraint;

#[derive(Clone, Debug, Default)]
pub struct OperationList {
    identifier: String,
    page_index: u32,
    operations: Vec<Operation>,
    options: BTreeMap<String, String>,
    scale_constraint: ScaleConstraint,
    frozen: bool,
}

impl OperationList {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    pub fn with_operations(
        identifier: impl Into<String>,
        operations: impl IntoIterator<Item = Operation>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            operations: operations.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn builder() -> OperationListBuilder {
        OperationListBuilder::default()
    }

    // ── lifecycle ──

    /// Make the list permanently read-only. Calling it again does nothing.
    pub fn freeze(&mut self) {
        if !self.frozen {
            self.frozen = true;
            tracing::debug!(list = %self, "operation list frozen");
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn check_frozen(&self) -> Result<()> {
        if self.frozen {
            Err(OperationError::Frozen)
        } else {
            Ok(())
        }
    }

    // ── accessors ──

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_identifier(&mut self, identifier: impl Into<String>) -> Result<()> {
        self.check_frozen()?;
        self.identifier = identifier.into();
        Ok(())
    }

    /// Zero-based page of a multi-page source.
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn set_page_index(&mut self, page_index: u32) -> Result<()> {
        self.check_frozen()?;
        self.page_index = page_index;
        Ok(())
    }

    pub fn scale_constraint(&self) -> ScaleConstraint {
        self.scale_constraint
    }

    pub fn set_scale_constraint(&mut self, sc: ScaleConstraint) -> Result<()> {
        self.check_frozen()?;
        self.scale_constraint = sc;
        Ok(())
    }

    /// Free-form options. Iteration order is by key, never by insertion.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn options_mut(&mut self) -> Result<&mut BTreeMap<String, String>> {
        self.check_frozen()?;
        Ok(&mut self.options)
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.options_mut()?.insert(key.into(), value.into());
        Ok(())
    }

    // ── operations ──

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn iter_mut(&mut self) -> Result<std::slice::IterMut<'_, Operation>> {
        self.check_frozen()?;
        Ok(self.operations.iter_mut())
    }

    pub fn add(&mut self, op: impl Into<Operation>) -> Result<()> {
        self.check_frozen()?;
        self.operations.push(op.into());
        Ok(())
    }

    /// Insert after the last operation of `kind`, or append if there is none.
    pub fn add_after(&mut self, op: impl Into<Operation>, kind: OperationKind) -> Result<()> {
        self.check_frozen()?;
        self.insert_after(op.into(), kind);
        Ok(())
    }

    /// Insert before the first operation of `kind`, or append if there is none.
    pub fn add_before(&mut self, op: impl Into<Operation>, kind: OperationKind) -> Result<()> {
        self.check_frozen()?;
        self.insert_before(op.into(), kind);
        Ok(())
    }

    fn insert_after(&mut self, op: Operation, kind: OperationKind) {
        match self.operations.iter().rposition(|o| o.kind() == kind) {
            Some(i) => self.operations.insert(i + 1, op),
            None => self.operations.push(op),
        }
    }

    fn insert_before(&mut self, op: Operation, kind: OperationKind) {
        match self.position(kind) {
            Some(i) => self.operations.insert(i, op),
            None => self.operations.push(op),
        }
    }

    pub fn remove(&mut self, index: usize) -> Result<Operation> {
        self.check_frozen()?;
        if index >= self.operations.len() {
            return Err(OperationError::InvalidParameter(format!(
                "no operation at index {index} (list has {})",
                self.operations.len()
            )));
        }
        Ok(self.operations.remove(index))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.check_frozen()?;
        self.operations.clear();
        Ok(())
    }

    fn position(&self, kind: OperationKind) -> Option<usize> {
        self.operations.iter().position(|o| o.kind() == kind)
    }

    /// First operation of `kind`.
    pub fn first(&self, kind: OperationKind) -> Option<&Operation> {
        self.operations.iter().find(|o| o.kind() == kind)
    }

    pub fn first_mut(&mut self, kind: OperationKind) -> Result<Option<&mut Operation>> {
        self.check_frozen()?;
        Ok(self.operations.iter_mut().find(|o| o.kind() == kind))
    }

    pub fn first_crop(&self) -> Option<&Crop> {
        self.operations.iter().find_map(Operation::as_crop)
    }

    pub fn first_scale(&self) -> Option<&Scale> {
        self.operations.iter().find_map(Operation::as_scale)
    }

    pub fn first_encode(&self) -> Option<&Encode> {
        self.operations.iter().find_map(Operation::as_encode)
    }

    /// Format of the first [`Encode`], if any.
    pub fn output_format(&self) -> Option<Format> {
        self.first_encode().map(Encode::format)
    }

    // ── resolution ──

    fn step(&self, op: &Operation, size: Dimension, sc: ScaleConstraint) -> Dimension {
        op.resulting_size(size, sc).rounded()
    }

    /// Size of the image entering `op`: `full` folded through everything
    /// before it. `op` is located by address first, then by value. Falls
    /// back to `full` when it is not in the list.
    pub(crate) fn working_size_before(&self, op: &Operation, full: Dimension) -> Dimension {
        let sc = self.scale_constraint;
        let index = self
            .operations
            .iter()
            .position(|o| std::ptr::eq(o, op))
            .or_else(|| self.operations.iter().position(|o| o == op));
        let Some(index) = index else {
            return full;
        };
        self.operations[..index]
            .iter()
            .fold(full, |size, o| self.step(o, size, sc))
    }

    /// Output size for a source of size `full`.
    pub fn resulting_size(&self, full: Dimension) -> Dimension {
        self.resulting_size_with(full, self.scale_constraint)
    }

    /// Output size under an explicit scale constraint.
    ///
    /// Each operation's output is rounded half up before it feeds the next
    /// one. A list with an effective constraint but no scale is reduced by
    /// the constraint at the end.
    pub fn resulting_size_with(&self, full: Dimension, sc: ScaleConstraint) -> Dimension {
        let mut size = full;
        for op in &self.operations {
            size = self.step(op, size, sc);
        }
        if sc.has_effect() && self.first_scale().is_none() {
            size = sc.constrained_size(size).rounded();
        }
        size
    }

    /// Reject lists that cannot be served from a source of size `full`:
    /// no identifier, no [`Encode`], crops outside the image, scales beyond
    /// the scale constraint, and empty results.
    pub fn validate(&self, full: Dimension) -> Result<()> {
        if self.identifier.is_empty() {
            return Err(ValidationError::MissingIdentifier.into());
        }
        if self.first_encode().is_none() {
            return Err(ValidationError::MissingEncode.into());
        }
        let sc = self.scale_constraint;
        let mut size = full;
        for op in &self.operations {
            op.validate(size, sc)?;
            if let Operation::Scale(scale) = op
                && sc.has_effect()
            {
                check_constraint(scale, size, sc)?;
            }
            size = self.step(op, size, sc);
        }
        let result = self.resulting_size(full);
        if result.is_empty() {
            return Err(ValidationError::EmptyResult {
                width: result.int_width(),
                height: result.int_height(),
            }
            .into());
        }
        Ok(())
    }

    /// [`validate`](Self::validate), plus the pixel budget of `config`.
    /// A list that does nothing is never over budget.
    pub fn validate_with(&self, full: Dimension, config: &ProcessingConfig) -> Result<()> {
        self.validate(full)?;
        if config.max_pixels > 0 && self.has_effect(full) {
            let result = self.resulting_size(full);
            if result.area() > config.max_pixels {
                tracing::debug!(%result, max_pixels = config.max_pixels, "over pixel budget");
                return Err(ValidationError::TooManyPixels {
                    width: result.int_width(),
                    height: result.int_height(),
                    max_pixels: config.max_pixels,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Whether processing would change the pixels of a source of size `full`.
    ///
    /// [`Encode`] governs serialization only and is not considered; see
    /// [`has_effect_for_format`](Self::has_effect_for_format).
    pub fn has_effect(&self, full: Dimension) -> bool {
        let sc = self.scale_constraint;
        if sc.has_effect() {
            return true;
        }
        let mut size = full;
        for op in &self.operations {
            if !matches!(op, Operation::Encode(_)) && op.has_effect_at(size, sc) {
                return true;
            }
            size = self.step(op, size, sc);
        }
        false
    }

    /// Like [`has_effect`](Self::has_effect), but also true when the output
    /// format differs from `source_format`.
    pub fn has_effect_for_format(&self, full: Dimension, source_format: Format) -> bool {
        if let Some(format) = self.output_format()
            && format != source_format
        {
            return true;
        }
        self.has_effect(full)
    }

    pub fn is_no_op(&self, full: Dimension) -> bool {
        !self.has_effect(full)
    }

    // ── canonical forms ──

    /// JSON-ready description for a source of size `full`. Only operations
    /// with an effect are listed, with sizes resolved to pixels.
    ///
    /// The value is an owned snapshot: changing it cannot affect the list.
    pub fn to_map(&self, full: Dimension) -> Value {
        let sc = self.scale_constraint;
        let mut size = full;
        let mut operations = Vec::new();
        for op in &self.operations {
            if op.has_effect_at(size, sc) {
                operations.push(op.to_map(size, sc));
            }
            size = self.step(op, size, sc);
        }
        let encode = self.first_encode();
        json!({
            "identifier": self.identifier,
            "page_index": self.page_index,
            "scale_constraint": sc.to_map(),
            "operations": operations,
            "options": self.options,
            "output_format": encode.map(|e| e.format().media_type()),
            "quality": encode.map(Encode::quality),
            "interlace": encode.map(Encode::interlace),
            "compression": encode.map(|e| e.compression().name()),
        })
    }

    /// Derivative-cache filename:
    /// `sha256(identifier)_sha256(operations and options).extension`.
    ///
    /// Only operations that report an effect contribute, so lists that
    /// differ only by no-ops share a filename. Parts and options are hashed
    /// as a JSON document, so no option text can pass for another entry.
    /// The digest is stable across runs.
    pub fn to_filename(&self) -> String {
        let mut parts = Vec::new();
        if self.scale_constraint.has_effect() {
            parts.push(format!("sc:{}", self.scale_constraint.reduced()));
        }
        if self.page_index > 0 {
            parts.push(format!("page:{}", self.page_index));
        }
        parts.extend(
            self.operations
                .iter()
                .filter(|op| op.has_effect())
                .map(Operation::to_string),
        );

        let extension = self
            .output_format()
            .unwrap_or(Format::Unknown)
            .preferred_extension();
        format!(
            "{}_{}.{}",
            sha256_hex(self.identifier.as_bytes()),
            sha256_hex(json!([parts, self.options]).to_string().as_bytes()),
            extension
        )
    }

    // ── processing defaults ──

    /// Fill in server-side defaults once the source is known: a
    /// placeholder scale for constrained lists, orientation correction,
    /// resample filter, sharpening, and format-specific encode settings.
    ///
    /// All or nothing: when any default is rejected the list is left as it
    /// was.
    pub fn apply_processing_config(
        &mut self,
        source: &SourceInfo,
        config: &ProcessingConfig,
    ) -> Result<()> {
        self.check_frozen()?;
        let mut next = self.clone();
        next.apply_defaults(source, config)?;
        *self = next;
        tracing::trace!(list = %self, "processing defaults applied");
        Ok(())
    }

    fn apply_defaults(&mut self, source: &SourceInfo, config: &ProcessingConfig) -> Result<()> {
        let sc = self.scale_constraint;

        // A constrained list needs a scale for the constraint to act through.
        if sc.has_effect() && self.first_scale().is_none() {
            let scale = Operation::from(Scale::percent(1.0)?);
            if self.position(OperationKind::Crop).is_some() {
                self.insert_after(scale, OperationKind::Crop);
            } else {
                self.operations.insert(0, scale);
            }
        }

        // Crops are addressed upright; the stored pixels get rotated back.
        let orientation = source.orientation;
        for op in &mut self.operations {
            if let Operation::Crop(crop) = op {
                crop.set_orientation(orientation);
            }
        }
        if !orientation.is_identity() {
            if self.position(OperationKind::Rotate).is_none() {
                let rotate = Operation::from(Rotate::default());
                if self.position(OperationKind::Scale).is_some() {
                    self.insert_after(rotate, OperationKind::Scale);
                } else if self.position(OperationKind::Crop).is_some() {
                    self.insert_after(rotate, OperationKind::Crop);
                } else {
                    self.insert_before(rotate, OperationKind::Encode);
                }
            }
            if let Some(Operation::Rotate(rotate)) = self.first_mut(OperationKind::Rotate)? {
                rotate.add_degrees(f64::from(orientation.degrees()))?;
            }
        }

        if let Some(index) = self.position(OperationKind::Scale) {
            let input = self.working_size_before(&self.operations[index], source.size);
            if let Operation::Scale(scale) = &mut self.operations[index]
                && scale.filter().is_none()
            {
                // upscale filter only when no axis shrinks
                let (sx, sy) = scale.resulting_scales(input, sc);
                let filter = if sx.min(sy) > 1.0 {
                    config.upscale_filter
                } else {
                    config.downscale_filter
                };
                scale.set_filter(filter);
            }
        }

        if config.sharpen > 0.0 {
            self.insert_before(Sharpen::new(config.sharpen)?.into(), OperationKind::Encode);
        }

        if let Some(Operation::Encode(encode)) = self.first_mut(OperationKind::Encode)? {
            match encode.format() {
                Format::Jpg => {
                    encode.set_compression(Compression::Jpeg);
                    encode.set_quality(config.jpg_quality)?;
                    encode.set_interlace(config.jpg_progressive);
                }
                Format::Tif => encode.set_compression(config.tif_compression),
                _ => {}
            }
            if !encode.format().supports_transparency() && encode.background_color().is_none() {
                encode.set_background_color(config.background_color);
            }
        }
        Ok(())
    }
}

fn check_constraint(scale: &Scale, input: Dimension, sc: ScaleConstraint) -> Result<()> {
    let (sx, sy) = scale.resulting_scales(input, sc);
    // one pixel of slack
    let delta = (1.0 / input.width()).max(1.0 / input.height());
    let requested = sx.max(sy);
    if requested - delta > sc.value() {
        return Err(ValidationError::ScaleExceedsConstraint {
            requested,
            allowed: sc.value(),
        }
        .into());
    }
    Ok(())
}

impl OperationList {
    /// The string equality, hashing and ordering are defined by. Unlike
    /// `Display` every part is quoted, so an identifier or option value
    /// cannot imitate another part.
    fn canonical(&self) -> String {
        let operations: Vec<String> = self.operations.iter().map(Operation::to_string).collect();
        json!([
            self.identifier,
            self.scale_constraint.to_string(),
            self.page_index,
            operations,
            self.options,
        ])
        .to_string()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// `identifier[_sc][_page]_op…_key:value…`, for logs and debugging.
impl fmt::Display for OperationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)?;
        if self.scale_constraint.has_effect() {
            write!(f, "_{}", self.scale_constraint)?;
        }
        if self.page_index > 0 {
            write!(f, "_p{}", self.page_index)?;
        }
        for op in &self.operations {
            write!(f, "_{op}")?;
        }
        for (k, v) in &self.options {
            write!(f, "_{k}:{v}")?;
        }
        Ok(())
    }
}

impl PartialEq for OperationList {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for OperationList {}

impl Hash for OperationList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for OperationList {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OperationList {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl<'a> IntoIterator for &'a OperationList {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Accumulates the parts of an [`OperationList`].
#[derive(Clone, Debug, Default)]
pub struct OperationListBuilder {
    list: OperationList,
}

impl OperationListBuilder {
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.list.identifier = identifier.into();
        self
    }

    pub fn operation(mut self, op: impl Into<Operation>) -> Self {
        self.list.operations.push(op.into());
        self
    }

    pub fn operations(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        self.list.operations.extend(ops);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.list.options.insert(key.into(), value.into());
        self
    }

    pub fn page_index(mut self, page_index: u32) -> Self {
        self.list.page_index = page_index;
        self
    }

    pub fn scale_constraint(mut self, sc: ScaleConstraint) -> Self {
        self.list.scale_constraint = sc;
        self
    }

    /// The list, still mutable.
    pub fn build(self) -> OperationList {
        self.list
    }

    /// The list, already frozen.
    pub fn build_frozen(self) -> OperationList {
        let mut list = self.list;
        list.freeze();
        list
    }
}
