//! Values and events produced by the extractor.

use alloc::string::String;

use serde_json::Value;

/// Payload of an emission, shaped per the attribute's
/// [`OutputShape`](crate::OutputShape).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Payload {
    /// A decoded value: the object, a single element, or a batch array.
    Decoded(Value),
    /// The raw fragment text, undecoded.
    Raw(String),
}

impl Payload {
    /// Returns the decoded value, if this payload was decoded.
    #[must_use]
    pub fn as_decoded(&self) -> Option<&Value> {
        match self {
            Self::Decoded(v) => Some(v),
            Self::Raw(_) => None,
        }
    }

    /// Returns the raw text, if this payload is raw.
    #[must_use]
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Self::Decoded(_) => None,
            Self::Raw(s) => Some(s),
        }
    }
}

/// One value produced for a tracked attribute.
///
/// For array attributes, `amount` counts the logical elements represented
/// by this emission and `start_index`/`end_index` (0-based, end exclusive)
/// locate them within the attribute's array. Object attributes carry none
/// of the three.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EmittedValue {
    /// Name of the attribute this value belongs to.
    pub attribute: String,
    /// The emitted data.
    pub data: Payload,
    /// Count of logical elements in this emission.
    pub amount: Option<usize>,
    /// Offset of the first element covered by this emission.
    pub start_index: Option<usize>,
    /// One past the offset of the last element covered by this emission.
    pub end_index: Option<usize>,
}

/// Extractor output, drained in document order through the event iterator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ExtractEvent {
    /// A value produced for a tracked attribute.
    Data(EmittedValue),
    /// Every requested attribute is resolved, or the input ended. Safe to
    /// stop feeding chunks.
    Done,
    /// Output is permanently finished; only emitted when
    /// [`close_on_done`](crate::ExtractorOptions::close_on_done) is set.
    Close,
}
