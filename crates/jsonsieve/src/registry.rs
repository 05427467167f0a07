//! Tracks which attributes are pending, in progress, and fully processed.

use alloc::{string::String, vec::Vec};

use crate::{
    error::ExtractError,
    options::{AttributeSpec, ValueKind},
};

/// Literal match text for one remaining attribute: the `"name":` prefix
/// plus the bracket byte expected after it (whitespace-tolerant in
/// between).
#[derive(Debug, Clone)]
pub(crate) struct DetectionPattern {
    pub(crate) spec: usize,
    pub(crate) text: Vec<u8>,
    pub(crate) bracket: u8,
}

impl DetectionPattern {
    fn new(spec: usize, attr: &AttributeSpec) -> Self {
        let mut text = Vec::with_capacity(attr.name.len() + 3);
        text.push(b'"');
        text.extend_from_slice(attr.name.as_bytes());
        text.extend_from_slice(b"\":");
        let bracket = match attr.kind {
            ValueKind::Object => b'{',
            ValueKind::Array => b'[',
        };
        Self {
            spec,
            text,
            bracket,
        }
    }
}

/// Outcome of probing for an attribute's value start after its key text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueStart {
    /// Index of the first character inside the value, just past the
    /// opening bracket.
    At(usize),
    /// Something other than whitespace or the expected bracket follows.
    NotHere,
    /// The buffer ends before the bracket could be confirmed.
    Incomplete,
}

/// Scans forward from `from` for the first occurrence of `bracket`,
/// tolerating JSON whitespace on the way, and returns the index
/// immediately after it.
pub(crate) fn start_offset(buffer: &[u8], from: usize, bracket: u8) -> ValueStart {
    let mut i = from;
    while i < buffer.len() {
        match buffer[i] {
            b' ' | b'\t' | b'\n' | b'\r' => i += 1,
            b if b == bracket => return ValueStart::At(i + 1),
            _ => return ValueStart::NotHere,
        }
    }
    ValueStart::Incomplete
}

/// Ordered attribute set with single-attribute-at-a-time progression.
///
/// An attribute is in progress XOR fully processed XOR untouched.
#[derive(Debug)]
pub(crate) struct AttributeRegistry {
    specs: Vec<AttributeSpec>,
    processed: Vec<bool>,
    in_progress: Option<usize>,
}

impl AttributeRegistry {
    pub(crate) fn new(specs: Vec<AttributeSpec>) -> Self {
        let processed = specs.iter().map(|_| false).collect();
        Self {
            specs,
            processed,
            in_progress: None,
        }
    }

    /// Names of attributes not yet fully processed, in insertion order.
    pub(crate) fn remaining(&self) -> impl Iterator<Item = &str> {
        self.specs
            .iter()
            .zip(&self.processed)
            .filter(|(_, done)| !**done)
            .map(|(spec, _)| spec.name.as_str())
    }

    /// Detection patterns for attributes still worth seeking.
    pub(crate) fn detection_patterns(&self) -> Vec<DetectionPattern> {
        self.specs
            .iter()
            .enumerate()
            .filter(|(idx, _)| !self.processed[*idx] && self.in_progress != Some(*idx))
            .map(|(idx, spec)| DetectionPattern::new(idx, spec))
            .collect()
    }

    /// Length of the longest detection pattern, bracket included. Sizes the
    /// scanner's lookback window.
    pub(crate) fn longest_pattern(&self) -> usize {
        self.specs
            .iter()
            .map(|s| s.name.len() + 4)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn mark_in_progress(&mut self, idx: usize) -> Result<(), ExtractError> {
        if self.in_progress.is_some() {
            return Err(ExtractError::InvalidState(
                "attribute marked in progress while another is active",
            ));
        }
        self.in_progress = Some(idx);
        Ok(())
    }

    pub(crate) fn current(&self) -> Option<&AttributeSpec> {
        self.in_progress.map(|idx| &self.specs[idx])
    }

    /// Mutable access to the in-progress spec, so its validator can be
    /// handed to the segmentation engine.
    pub(crate) fn current_mut(&mut self) -> Option<&mut AttributeSpec> {
        self.in_progress.map(|idx| &mut self.specs[idx])
    }

    /// Moves the in-progress attribute, if any, into the processed set.
    pub(crate) fn mark_completed(&mut self) {
        if let Some(idx) = self.in_progress.take() {
            self.processed[idx] = true;
        }
    }

    pub(crate) fn all_processed(&self) -> bool {
        self.in_progress.is_none() && self.processed.iter().all(|done| *done)
    }

    pub(crate) fn unresolved_count(&self) -> usize {
        self.processed.iter().filter(|done| !**done).count()
    }

    pub(crate) fn name_of(&self, idx: usize) -> &str {
        &self.specs[idx].name
    }

    pub(crate) fn kind_of(&self, idx: usize) -> ValueKind {
        self.specs[idx].kind
    }
}

/// Validates an attribute spec set at construction time.
pub(crate) fn validate_specs(specs: &[AttributeSpec]) -> Result<(), crate::ConfigError> {
    use crate::{ConfigError, ExtractMode};

    if specs.is_empty() {
        return Err(ConfigError::EmptySpecs);
    }
    for (idx, spec) in specs.iter().enumerate() {
        if specs[..idx].iter().any(|other| other.name == spec.name) {
            return Err(ConfigError::DuplicateAttribute(spec.name.clone()));
        }
        match (spec.mode, spec.kind) {
            (ExtractMode::SingleObject, ValueKind::Array) => {
                return Err(ConfigError::ObjectModeOnArray(
                    spec.name.clone(),
                    spec.mode.name(),
                ));
            }
            (
                ExtractMode::BatchAndProcess | ExtractMode::SkipAndStream | ExtractMode::SkipAndBatch,
                ValueKind::Object,
            ) => {
                return Err(ConfigError::ArrayModeOnObject(
                    spec.name.clone(),
                    spec.mode.name(),
                ));
            }
            _ => {}
        }
        if matches!(
            spec.mode,
            ExtractMode::BatchAndProcess | ExtractMode::SkipAndBatch
        ) && spec.batch_size.is_none_or(|b| b == 0)
        {
            return Err(ConfigError::MissingBatchSize(
                spec.name.clone(),
                spec.mode.name(),
            ));
        }
        if spec.batch_size == Some(0) {
            return Err(ConfigError::MissingBatchSize(
                spec.name.clone(),
                spec.mode.name(),
            ));
        }
        if spec.kind == ValueKind::Object && spec.skip.is_some() {
            return Err(ConfigError::SkipOnObject(spec.name.clone()));
        }
    }
    Ok(())
}

pub(crate) fn joined_names(registry: &AttributeRegistry) -> String {
    let mut out = String::new();
    for name in registry.remaining() {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(name);
    }
    out
}
