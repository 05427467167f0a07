//! The transform coordinator.
//!
//! Drives the detection and segmentation engines against chunked input:
//! feed a chunk, the coordinator advances the state machine until the
//! chunk is exhausted, switching attributes as they complete, and queues
//! events the caller drains through the iterator.

use alloc::{collections::VecDeque, vec::Vec};

use log::{debug, info, warn};

use crate::{
    error::{ConfigError, ExtractError},
    event::ExtractEvent,
    options::{AttributeSpec, ExtractorOptions},
    registry::{self, AttributeRegistry},
    scanner::{Extracted, Scanner, SeekOutcome},
    segment::{Flow, Segmenter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Seeking,
    Extracting,
    Draining,
    Done,
}

/// The attribute-selective streaming extractor.
///
/// Feed it chunks of one JSON document with [`feed`](Extractor::feed) and
/// drain the queued [`ExtractEvent`]s through the `Iterator`
/// implementation. All scanning for a chunk happens synchronously before
/// `feed` returns, so events are always flushed, in document order, before
/// the next chunk is accepted.
///
/// # Examples
///
/// ```rust
/// use jsonsieve::{AttributeSpec, ExtractEvent, ExtractMode, Extractor, ExtractorOptions};
///
/// let specs = vec![
///     AttributeSpec::array("f", ExtractMode::SkipAndBatch)
///         .with_skip(1)
///         .with_batch_size(2),
/// ];
/// let mut extractor = Extractor::new(specs, ExtractorOptions::default()).unwrap();
/// extractor.feed(r#"{"a":true,"b":{"x":1},"f":[{"i":0},{"i":1},{"i":2}]}"#);
/// let events: Vec<_> = extractor.finish().map(Result::unwrap).collect();
/// assert!(matches!(events.last(), Some(ExtractEvent::Done)));
/// ```
#[derive(Debug)]
pub struct Extractor {
    registry: AttributeRegistry,
    scanner: Scanner,
    segmenter: Option<Segmenter>,
    phase: Phase,
    close_on_done: bool,
    events: VecDeque<ExtractEvent>,
    failure: Option<ExtractError>,
}

impl Extractor {
    /// Creates an extractor for the given attribute specs.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an empty spec list, duplicate
    /// attribute names, or an inconsistent mode/type combination.
    pub fn new(
        specs: Vec<AttributeSpec>,
        options: ExtractorOptions,
    ) -> Result<Self, ConfigError> {
        registry::validate_specs(&specs)?;
        let registry = AttributeRegistry::new(specs);
        let scanner = Scanner::new(registry.longest_pattern());
        Ok(Self {
            registry,
            scanner,
            segmenter: None,
            phase: Phase::Seeking,
            close_on_done: options.close_on_done,
            events: VecDeque::new(),
            failure: None,
        })
    }

    /// Feeds the next piece of input.
    ///
    /// An empty chunk signals end-of-input. Chunks fed after the run is
    /// done (or has failed) are discarded.
    pub fn feed(&mut self, chunk: &str) {
        if chunk.is_empty() {
            self.end_input();
            return;
        }
        if self.phase == Phase::Done || self.failure.is_some() {
            debug!("discarding {} bytes fed after completion", chunk.len());
            return;
        }
        self.scanner.push(chunk);
        self.pump();
    }

    /// Signals end-of-input and returns an iterator over the remaining
    /// events.
    #[must_use]
    pub fn finish(mut self) -> ClosedExtractor {
        self.end_input();
        ClosedExtractor { extractor: self }
    }

    /// External cancellation: finalizes at the current safe boundary,
    /// flushing any batch remainder, as if the stream had completed.
    pub fn stop(&mut self) {
        if self.phase == Phase::Done || self.failure.is_some() {
            return;
        }
        info!("stop requested by caller");
        self.complete_run();
    }

    fn end_input(&mut self) {
        if self.phase == Phase::Done || self.failure.is_some() {
            return;
        }
        self.scanner.set_end_of_input();
        self.pump();
        if self.phase != Phase::Done && self.failure.is_none() {
            if self.scanner.mid_fragment() {
                // Truncated input: the unterminated fragment is never
                // emitted, and completion stays clean.
                debug!("input ended mid-fragment; discarding unterminated fragment");
            }
            self.complete_run();
        }
    }

    /// Advances the state machine until the buffered input is exhausted or
    /// the run completes.
    fn pump(&mut self) {
        loop {
            match self.phase {
                Phase::Seeking => {
                    let patterns = self.registry.detection_patterns();
                    if patterns.is_empty() {
                        self.complete_run();
                        return;
                    }
                    match self.scanner.seek(&patterns) {
                        SeekOutcome::Found(idx) => {
                            info!(
                                "detected start of attribute \"{}\"",
                                self.registry.name_of(idx)
                            );
                            if let Err(err) = self.registry.mark_in_progress(idx) {
                                self.fail(err);
                                return;
                            }
                            self.scanner.begin_value(self.registry.kind_of(idx));
                            let Some(spec) = self.registry.current_mut() else {
                                self.fail(ExtractError::InvalidState(
                                    "no attribute in progress after detection",
                                ));
                                return;
                            };
                            self.segmenter = Some(Segmenter::new(spec));
                            self.phase = Phase::Extracting;
                        }
                        SeekOutcome::RootClosed => {
                            warn!(
                                "document root closed with {} unresolved attribute(s): {}",
                                self.registry.unresolved_count(),
                                registry::joined_names(&self.registry)
                            );
                            self.complete_run();
                            return;
                        }
                        SeekOutcome::NeedMore => return,
                    }
                }
                Phase::Extracting => match self.scanner.next_fragment() {
                    Extracted::Fragment(text) => {
                        let Some(segmenter) = self.segmenter.as_mut() else {
                            self.fail(ExtractError::InvalidState(
                                "fragment produced with no segmentation engine",
                            ));
                            return;
                        };
                        match segmenter.handle_fragment(text, &mut self.events) {
                            Ok(Flow::Continue) => {}
                            Ok(Flow::Stop) => self.finish_attribute(true),
                            Err(err) => {
                                self.fail(err);
                                return;
                            }
                        }
                    }
                    Extracted::Complete => self.finish_attribute(false),
                    Extracted::Pending => return,
                },
                Phase::Draining => {
                    if self.scanner.drain_value() {
                        debug!("drained remainder of stopped attribute");
                        self.phase = Phase::Seeking;
                    } else {
                        return;
                    }
                }
                Phase::Done => return,
            }
        }
    }

    /// Completes the in-progress attribute and decides what runs next.
    fn finish_attribute(&mut self, stopped: bool) {
        if let Some(name) = self.registry.current().map(|spec| spec.name.clone()) {
            info!("attribute \"{name}\" complete");
        }
        if let Some(mut segmenter) = self.segmenter.take() {
            if let Err(err) = segmenter.finish(&mut self.events) {
                self.fail(err);
                return;
            }
        }
        self.registry.mark_completed();
        if self.registry.all_processed() {
            self.complete_run();
        } else if stopped && self.scanner.begin_drain() {
            self.phase = Phase::Draining;
        } else {
            self.phase = Phase::Seeking;
        }
    }

    /// Finalizes the run: flushes a pending batch remainder, queues the
    /// terminal events, and drops the buffers.
    fn complete_run(&mut self) {
        if self.phase == Phase::Done {
            return;
        }
        if let Some(mut segmenter) = self.segmenter.take() {
            if let Err(err) = segmenter.finish(&mut self.events) {
                self.fail(err);
                return;
            }
            self.registry.mark_completed();
        }
        info!("extraction done");
        self.events.push_back(ExtractEvent::Done);
        if self.close_on_done {
            self.events.push_back(ExtractEvent::Close);
        }
        self.phase = Phase::Done;
        self.scanner.release();
    }

    /// Fatal error: the run stops scanning; events queued so far still
    /// drain, then the error surfaces once and the iterator fuses empty.
    fn fail(&mut self, err: ExtractError) {
        self.failure = Some(err);
        self.phase = Phase::Done;
        self.scanner.release();
    }
}

impl Iterator for Extractor {
    type Item = Result<ExtractEvent, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.events.pop_front() {
            return Some(Ok(event));
        }
        self.failure.take().map(Err)
    }
}

/// An [`Extractor`] whose input has ended.
///
/// Returned by [`Extractor::finish`]; iterates the remaining events.
#[derive(Debug)]
pub struct ClosedExtractor {
    extractor: Extractor,
}

impl Iterator for ClosedExtractor {
    type Item = Result<ExtractEvent, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.extractor.next()
    }
}
