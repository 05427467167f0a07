//! Per-attribute extraction configuration.

use alloc::{boxed::Box, string::String};
use core::fmt;

use serde_json::Value;

/// Structural type of a tracked attribute's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ValueKind {
    /// The attribute's value is a JSON object, emitted whole.
    Object,
    /// The attribute's value is a JSON array, emitted element-wise.
    Array,
}

/// How a tracked attribute's value is segmented and emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ExtractMode {
    /// Emit the whole object as a single value. Object attributes only.
    SingleObject,
    /// Accumulate array elements past `skip` and emit a batch every
    /// `batch_size` elements, continuing for the entire array. A final
    /// short batch is flushed when the array ends.
    BatchAndProcess,
    /// Emit each array element past `skip` individually; stop early once
    /// `batch_size` elements have been emitted (or stream the whole array
    /// if `batch_size` is unset).
    SkipAndStream,
    /// Accumulate `batch_size` elements past `skip`, emit them as one
    /// batch, and stop early. Only the first qualifying batch is produced.
    SkipAndBatch,
}

impl ExtractMode {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::SingleObject => "SingleObject",
            Self::BatchAndProcess => "BatchAndProcess",
            Self::SkipAndStream => "SkipAndStream",
            Self::SkipAndBatch => "SkipAndBatch",
        }
    }
}

/// Shape of the emitted `data` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OutputShape {
    /// Decode each emission with the JSON decoder before handing it out.
    #[default]
    Decoded,
    /// Hand out the raw fragment text without decoding it.
    RawText,
}

/// Caller-supplied predicate applied to the decoded first element (or
/// whole object) of an attribute, used to confirm the detected attribute
/// is the intended one before anything is emitted for it.
pub struct Validator(Box<dyn Fn(&Value) -> bool + Send + Sync>);

impl Validator {
    /// Wraps a predicate over the decoded first value.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    pub(crate) fn check(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Immutable configuration for one tracked top-level attribute.
///
/// # Examples
///
/// ```rust
/// use jsonsieve::{AttributeSpec, ExtractMode, OutputShape};
///
/// let spec = AttributeSpec::array("records", ExtractMode::SkipAndBatch)
///     .with_skip(100)
///     .with_batch_size(25)
///     .with_output(OutputShape::RawText);
/// assert_eq!(spec.name, "records");
/// ```
#[derive(Debug)]
pub struct AttributeSpec {
    /// The top-level key this attribute is detected by.
    pub name: String,
    /// Whether the value is an object or an array.
    pub kind: ValueKind,
    /// Segmentation and emission policy.
    pub mode: ExtractMode,
    /// Batch size for batching modes; emission quota for `SkipAndStream`.
    pub batch_size: Option<usize>,
    /// Leading array elements to ignore. Array modes only.
    pub skip: Option<usize>,
    /// Whether emissions are decoded values or raw fragment text.
    pub output: OutputShape,
    /// Optional first-element validator.
    pub validator: Option<Validator>,
}

impl AttributeSpec {
    /// An object attribute extracted whole with [`ExtractMode::SingleObject`].
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::Object,
            mode: ExtractMode::SingleObject,
            batch_size: None,
            skip: None,
            output: OutputShape::Decoded,
            validator: None,
        }
    }

    /// An array attribute extracted element-wise with the given mode.
    pub fn array(name: impl Into<String>, mode: ExtractMode) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::Array,
            mode,
            batch_size: None,
            skip: None,
            output: OutputShape::Decoded,
            validator: None,
        }
    }

    /// Sets the batch size (batching modes) or emission quota
    /// (`SkipAndStream`).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Sets the number of leading array elements to ignore.
    #[must_use]
    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the output shape.
    #[must_use]
    pub fn with_output(mut self, output: OutputShape) -> Self {
        self.output = output;
        self
    }

    /// Attaches a first-element validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// Extractor-wide configuration.
///
/// The logging collaborator is the global [`log`] facade; install any
/// `log`-compatible backend in the host program to receive the extractor's
/// progress telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractorOptions {
    /// Whether to emit [`ExtractEvent::Close`](crate::ExtractEvent::Close)
    /// once all attributes are resolved, signalling downstream that output
    /// is permanently finished even while upstream may still be producing
    /// bytes.
    ///
    /// # Default
    ///
    /// `false`
    pub close_on_done: bool,
}
