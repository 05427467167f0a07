use alloc::string::String;

use thiserror::Error;

/// Rejected [`AttributeSpec`](crate::AttributeSpec) set, reported
/// synchronously by [`Extractor::new`](crate::Extractor::new).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("attribute spec list must not be empty")]
    EmptySpecs,
    #[error("duplicate attribute name \"{0}\"")]
    DuplicateAttribute(String),
    #[error("attribute \"{0}\": mode {1} requires an object attribute")]
    ObjectModeOnArray(String, &'static str),
    #[error("attribute \"{0}\": mode {1} requires an array attribute")]
    ArrayModeOnObject(String, &'static str),
    #[error("attribute \"{0}\": mode {1} requires a batch size of at least 1")]
    MissingBatchSize(String, &'static str),
    #[error("attribute \"{0}\": skip is only meaningful for array attributes")]
    SkipOnObject(String),
}

/// Fatal extraction failure, yielded once through the event iterator.
///
/// After an `ExtractError` is produced the run is over: the iterator is
/// fused empty and further input is discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The first fragment of an attribute failed to decode as JSON or was
    /// rejected by the caller-supplied validator.
    #[error("attribute \"{attribute}\" failed first-element validation")]
    Validation { attribute: String },
    /// A completed fragment failed to decode after initial validation had
    /// already passed.
    #[error("attribute \"{attribute}\": failed to decode emitted value")]
    Decode { attribute: String },
    /// An internal state-machine invariant was violated.
    #[error("invariant violated: {0}")]
    InvalidState(&'static str),
}
