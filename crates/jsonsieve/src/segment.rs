//! The element segmentation and emission engine.
//!
//! One instance lives per in-progress attribute. It receives each complete
//! fragment isolated by the scanner, validates the first one, applies the
//! attribute's mode (single emit, skip+stream, batch, skip+batch) to decide
//! what to buffer and when to emit, and reports progress through the
//! logging facade.

use alloc::{collections::VecDeque, string::String, vec::Vec};

use log::{debug, error, info};
use serde_json::Value;

use crate::{
    error::ExtractError,
    event::{EmittedValue, ExtractEvent, Payload},
    options::{AttributeSpec, ExtractMode, OutputShape, Validator},
};

/// Whether scanning of the current attribute should carry on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    /// The mode's quota is satisfied; stop without consuming the rest of
    /// the array.
    Stop,
}

/// Per-attribute emission state. Created when the attribute goes in
/// progress, discarded when it completes or the stream ends; any batch
/// remainder is flushed at that point.
#[derive(Debug)]
pub(crate) struct Segmenter {
    name: String,
    mode: ExtractMode,
    output: OutputShape,
    batch_size: Option<usize>,
    skip: usize,
    validator: Option<Validator>,
    element_count: usize,
    relevant_count: usize,
    pending: Vec<String>,
}

impl Segmenter {
    /// Builds the engine from the in-progress spec, taking ownership of
    /// its validator (each attribute is validated at most once).
    pub(crate) fn new(spec: &mut AttributeSpec) -> Self {
        Self {
            name: spec.name.clone(),
            mode: spec.mode,
            output: spec.output,
            batch_size: spec.batch_size,
            skip: spec.skip.unwrap_or(0),
            validator: spec.validator.take(),
            element_count: 0,
            relevant_count: 0,
            pending: Vec::new(),
        }
    }

    pub(crate) fn handle_fragment(
        &mut self,
        fragment: String,
        out: &mut VecDeque<ExtractEvent>,
    ) -> Result<Flow, ExtractError> {
        if self.element_count == 0 {
            self.validate_first(&fragment)?;
        }
        self.element_count += 1;

        let flow = match self.mode {
            ExtractMode::SingleObject => {
                self.emit(fragment, None, None, None, out)?;
                Flow::Continue
            }
            ExtractMode::BatchAndProcess => {
                if self.element_count > self.skip {
                    self.relevant_count += 1;
                    self.pending.push(fragment);
                    if Some(self.relevant_count) == self.batch_size {
                        self.flush_pending(out)?;
                    }
                }
                Flow::Continue
            }
            ExtractMode::SkipAndBatch => {
                let mut flow = Flow::Continue;
                if self.element_count > self.skip {
                    self.relevant_count += 1;
                    self.pending.push(fragment);
                    if Some(self.relevant_count) == self.batch_size {
                        self.flush_pending(out)?;
                        flow = Flow::Stop;
                    }
                }
                flow
            }
            ExtractMode::SkipAndStream => {
                let mut flow = Flow::Continue;
                if self.element_count > self.skip {
                    self.relevant_count += 1;
                    self.emit(fragment, Some(1), None, None, out)?;
                    if Some(self.relevant_count) == self.batch_size {
                        flow = Flow::Stop;
                    }
                }
                flow
            }
        };
        self.log_progress();
        Ok(flow)
    }

    /// Flushes a batch remainder, so nothing buffered is dropped when the
    /// array ends short of a full batch.
    pub(crate) fn finish(&mut self, out: &mut VecDeque<ExtractEvent>) -> Result<(), ExtractError> {
        if matches!(
            self.mode,
            ExtractMode::BatchAndProcess | ExtractMode::SkipAndBatch
        ) && !self.pending.is_empty()
        {
            self.flush_pending(out)?;
        }
        Ok(())
    }

    fn validate_first(&mut self, fragment: &str) -> Result<(), ExtractError> {
        info!("attribute \"{}\": validating first fragment", self.name);
        let Ok(value) = serde_json::from_str::<Value>(fragment) else {
            error!(
                "attribute \"{}\": first fragment is not decodable JSON",
                self.name
            );
            return Err(ExtractError::Validation {
                attribute: self.name.clone(),
            });
        };
        if let Some(validator) = &self.validator {
            if !validator.check(&value) {
                error!("attribute \"{}\": validator rejected first value", self.name);
                return Err(ExtractError::Validation {
                    attribute: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    fn flush_pending(&mut self, out: &mut VecDeque<ExtractEvent>) -> Result<(), ExtractError> {
        let amount = self.relevant_count;
        let start = self.element_count - self.relevant_count;
        let end = self.element_count;

        let mut body = String::with_capacity(
            2 + self.pending.iter().map(|p| p.len() + 1).sum::<usize>(),
        );
        body.push('[');
        for (idx, element) in self.pending.iter().enumerate() {
            if idx > 0 {
                body.push(',');
            }
            body.push_str(element);
        }
        body.push(']');

        self.pending.clear();
        self.relevant_count = 0;
        self.emit(body, Some(amount), Some(start), Some(end), out)
    }

    fn emit(
        &self,
        text: String,
        amount: Option<usize>,
        start_index: Option<usize>,
        end_index: Option<usize>,
        out: &mut VecDeque<ExtractEvent>,
    ) -> Result<(), ExtractError> {
        let data = match self.output {
            OutputShape::Decoded => match serde_json::from_str(&text) {
                Ok(value) => Payload::Decoded(value),
                Err(_) => {
                    error!("attribute \"{}\": emitted value failed to decode", self.name);
                    return Err(ExtractError::Decode {
                        attribute: self.name.clone(),
                    });
                }
            },
            OutputShape::RawText => Payload::Raw(text),
        };
        out.push_back(ExtractEvent::Data(EmittedValue {
            attribute: self.name.clone(),
            data,
            amount,
            start_index,
            end_index,
        }));
        Ok(())
    }

    fn log_progress(&self) {
        if self.element_count == 1 {
            info!("attribute \"{}\": found first element", self.name);
        }
        if self.relevant_count == 1 && self.element_count == self.skip + 1 {
            info!("attribute \"{}\": found first relevant element", self.name);
        }
        if self.relevant_count > 0 && self.relevant_count % 1000 == 0 {
            debug!(
                "attribute \"{}\": relevant element {} (element {})",
                self.name, self.relevant_count, self.element_count
            );
        } else if self.element_count % 1000 == 0 {
            debug!(
                "attribute \"{}\": element {}",
                self.name, self.element_count
            );
        }
    }
}
