//! The buffer/detection engine.
//!
//! A single-pass state machine over the incoming character stream with two
//! modes. While *seeking*, it looks for the earliest detection pattern of
//! any remaining attribute, running the quote/escape/bracket tracker over
//! every structural character on the way so that a key inside a string or
//! nested structure is never mistaken for a top-level attribute. While
//! *extracting*, it isolates complete fragments (array elements, or the
//! whole object value) by watching the bracket depth return to zero.
//!
//! Every byte is run through the tracker exactly once. The only bytes ever
//! retained unprocessed are a pending candidate match cut by the chunk
//! edge, bounded by the lookback cap; everything consumed is dropped from
//! the buffer before control returns to the caller.

use alloc::string::String;

use bstr::ByteSlice;

use crate::{
    options::ValueKind,
    registry::{self, DetectionPattern, ValueStart},
};

/// Structural bytes that affect the tracker while seeking.
const SEEK_INTEREST: &[u8] = b"{}[]\"\\";
/// Same, plus the element separator, while extracting.
const ELEMENT_INTEREST: &[u8] = b"{}[]\"\\,";

/// Result of one seeking round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeekOutcome {
    /// A detection pattern matched at top level; the buffer now starts at
    /// the first character inside the attribute's value.
    Found(usize),
    /// The document's root bracket closed; the remaining attributes cannot
    /// appear.
    RootClosed,
    /// The buffer is exhausted (or holds only a pending candidate).
    NeedMore,
}

/// Result of one extraction round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Extracted {
    /// One complete fragment: an array element or the whole object value.
    Fragment(String),
    /// The attribute's value is fully consumed.
    Complete,
    /// The buffer is exhausted mid-value.
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementState {
    /// Expecting an element start or the closing `]`.
    Before,
    /// Inside a braced/bracketed element, or the whole object value.
    Container,
    /// Inside a bracketless element; ends at a top-level `,` or `]`.
    Scalar,
    /// A fragment just closed; expecting `,` or `]`.
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Hit { spec: usize, value_from: usize },
    Need,
    No,
}

/// Owns the raw incoming characters and the quote/escape/bracket tracker.
#[derive(Debug)]
pub(crate) struct Scanner {
    buffer: String,
    lookback_cap: usize,
    in_string: bool,
    /// The previous byte was an unescaped backslash; the next byte is
    /// consumed without structural effect, even across a chunk edge.
    escaped: bool,
    /// While seeking: nesting below top level. While extracting: nesting
    /// within the current fragment.
    depth: usize,
    /// The document's own opening bracket is not counted, so top-level
    /// content sits at depth zero.
    root_consumed: bool,
    element: ElementState,
    kind: ValueKind,
    fragment: String,
    /// A completed value still owes the caller an `Extracted::Complete`.
    pending_close: bool,
    end_of_input: bool,
}

impl Scanner {
    pub(crate) fn new(longest_pattern: usize) -> Self {
        Self {
            buffer: String::new(),
            lookback_cap: (longest_pattern * 2).max(32),
            in_string: false,
            escaped: false,
            depth: 0,
            root_consumed: false,
            element: ElementState::Before,
            kind: ValueKind::Array,
            fragment: String::new(),
            pending_close: false,
            end_of_input: false,
        }
    }

    pub(crate) fn push(&mut self, chunk: &str) {
        self.buffer.push_str(chunk);
    }

    pub(crate) fn set_end_of_input(&mut self) {
        self.end_of_input = true;
    }

    pub(crate) fn release(&mut self) {
        self.buffer = String::new();
        self.fragment = String::new();
    }

    /// Mode A: scan for the earliest detection pattern at top level.
    pub(crate) fn seek(&mut self, patterns: &[DetectionPattern]) -> SeekOutcome {
        let len = self.buffer.len();
        let mut i = 0;

        // A backslash at the previous chunk edge escapes our first byte.
        if self.escaped && i < len {
            self.escaped = false;
            i += 1;
        }

        while i < len {
            let bytes = self.buffer.as_bytes();
            let Some(off) = bytes[i..].find_byteset(SEEK_INTEREST) else {
                break;
            };
            i += off;
            let b = bytes[i];

            if self.in_string {
                match b {
                    b'\\' => {
                        if i + 1 < len {
                            i += 2;
                        } else {
                            self.escaped = true;
                            i = len;
                        }
                    }
                    b'"' => {
                        self.in_string = false;
                        i += 1;
                    }
                    _ => i += 1,
                }
                continue;
            }

            match b {
                b'\\' => {
                    if i + 1 < len {
                        i += 2;
                    } else {
                        self.escaped = true;
                        i = len;
                    }
                }
                b'"' => {
                    if self.root_consumed && self.depth == 0 {
                        match Self::probe(bytes, i, patterns) {
                            Probe::Hit { spec, value_from } => {
                                self.buffer.drain(..value_from);
                                return SeekOutcome::Found(spec);
                            }
                            Probe::Need => {
                                // An undecided candidate is held back so a
                                // match straddling the chunk edge can be
                                // stitched together. Candidates stretched
                                // past the lookback cap (a pathological
                                // whitespace run) are abandoned.
                                if !self.end_of_input && len - i <= self.lookback_cap {
                                    self.buffer.drain(..i);
                                    return SeekOutcome::NeedMore;
                                }
                                self.in_string = true;
                                i += 1;
                            }
                            Probe::No => {
                                self.in_string = true;
                                i += 1;
                            }
                        }
                    } else {
                        self.in_string = true;
                        i += 1;
                    }
                }
                b'{' | b'[' => {
                    if self.root_consumed {
                        self.depth += 1;
                    } else {
                        self.root_consumed = true;
                    }
                    i += 1;
                }
                b'}' | b']' => {
                    if self.depth == 0 {
                        self.buffer.drain(..=i);
                        return SeekOutcome::RootClosed;
                    }
                    self.depth -= 1;
                    i += 1;
                }
                _ => i += 1,
            }
        }

        self.buffer.clear();
        SeekOutcome::NeedMore
    }

    /// Checks whether any detection pattern starts at `at`, which holds an
    /// opening quote seen at top level.
    fn probe(bytes: &[u8], at: usize, patterns: &[DetectionPattern]) -> Probe {
        let rest = &bytes[at..];
        let mut need = false;
        for pattern in patterns {
            if rest.len() < pattern.text.len() {
                if pattern.text.starts_with(rest) {
                    need = true;
                }
                continue;
            }
            if !rest.starts_with(&pattern.text) {
                continue;
            }
            match registry::start_offset(bytes, at + pattern.text.len(), pattern.bracket) {
                ValueStart::At(value_from) => {
                    return Probe::Hit {
                        spec: pattern.spec,
                        value_from,
                    };
                }
                ValueStart::NotHere => {}
                ValueStart::Incomplete => need = true,
            }
        }
        if need { Probe::Need } else { Probe::No }
    }

    /// Arms extraction for the attribute whose opening bracket was just
    /// consumed by detection.
    pub(crate) fn begin_value(&mut self, kind: ValueKind) {
        self.kind = kind;
        self.in_string = false;
        self.escaped = false;
        self.fragment.clear();
        self.pending_close = false;
        match kind {
            ValueKind::Object => {
                // The consumed brace is re-seeded so the fragment decodes
                // as a complete object.
                self.fragment.push('{');
                self.depth = 1;
                self.element = ElementState::Container;
            }
            ValueKind::Array => {
                self.depth = 0;
                self.element = ElementState::Before;
            }
        }
    }

    /// Mode B: scan until one fragment completes, the value closes, or the
    /// buffer runs dry.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn next_fragment(&mut self) -> Extracted {
        if self.pending_close {
            self.pending_close = false;
            self.value_done();
            return Extracted::Complete;
        }

        let len = self.buffer.len();
        let mut i = 0;
        let mut seg = 0;

        if self.escaped && i < len {
            self.escaped = false;
            i += 1;
        }

        while i < len {
            match self.element {
                ElementState::Before => {
                    let b = self.buffer.as_bytes()[i];
                    match b {
                        b' ' | b'\t' | b'\n' | b'\r' | b',' => i += 1,
                        b']' => {
                            self.value_done();
                            self.buffer.drain(..=i);
                            return Extracted::Complete;
                        }
                        b'{' | b'[' => {
                            self.depth = 1;
                            self.element = ElementState::Container;
                            seg = i;
                            i += 1;
                        }
                        b'"' => {
                            self.in_string = true;
                            self.element = ElementState::Scalar;
                            seg = i;
                            i += 1;
                        }
                        _ => {
                            self.element = ElementState::Scalar;
                            seg = i;
                            i += 1;
                        }
                    }
                }
                ElementState::After => {
                    let b = self.buffer.as_bytes()[i];
                    match b {
                        b' ' | b'\t' | b'\n' | b'\r' => i += 1,
                        b',' => {
                            self.element = ElementState::Before;
                            i += 1;
                        }
                        b']' => {
                            self.value_done();
                            self.buffer.drain(..=i);
                            return Extracted::Complete;
                        }
                        // A missing separator is tolerated; the decode step
                        // owns malformation.
                        _ => self.element = ElementState::Before,
                    }
                }
                ElementState::Container | ElementState::Scalar => {
                    let bytes = self.buffer.as_bytes();
                    let Some(off) = bytes[i..].find_byteset(ELEMENT_INTEREST) else {
                        i = len;
                        break;
                    };
                    i += off;
                    let b = bytes[i];

                    if self.in_string {
                        match b {
                            b'\\' => {
                                if i + 1 < len {
                                    i += 2;
                                } else {
                                    self.escaped = true;
                                    i = len;
                                }
                            }
                            b'"' => {
                                self.in_string = false;
                                i += 1;
                            }
                            _ => i += 1,
                        }
                        continue;
                    }

                    match b {
                        b'\\' => {
                            if i + 1 < len {
                                i += 2;
                            } else {
                                self.escaped = true;
                                i = len;
                            }
                        }
                        b'"' => {
                            self.in_string = true;
                            i += 1;
                        }
                        b'{' | b'[' => {
                            self.depth += 1;
                            self.element = ElementState::Container;
                            i += 1;
                        }
                        b']' if self.element == ElementState::Scalar && self.depth == 0 => {
                            // The scalar and the whole array end together.
                            self.fragment.push_str(&self.buffer[seg..i]);
                            let text = Self::take_scalar(&mut self.fragment);
                            self.pending_close = true;
                            self.buffer.drain(..=i);
                            return Extracted::Fragment(text);
                        }
                        b',' if self.element == ElementState::Scalar && self.depth == 0 => {
                            self.fragment.push_str(&self.buffer[seg..i]);
                            let text = Self::take_scalar(&mut self.fragment);
                            self.element = ElementState::Before;
                            self.buffer.drain(..=i);
                            return Extracted::Fragment(text);
                        }
                        b'}' | b']' => {
                            if self.depth > 0 {
                                self.depth -= 1;
                            }
                            i += 1;
                            if self.depth == 0 && self.element == ElementState::Container {
                                self.fragment.push_str(&self.buffer[seg..i]);
                                let text = core::mem::take(&mut self.fragment);
                                if self.kind == ValueKind::Object {
                                    self.pending_close = true;
                                } else {
                                    self.element = ElementState::After;
                                }
                                self.buffer.drain(..i);
                                return Extracted::Fragment(text);
                            }
                        }
                        _ => i += 1,
                    }
                }
            }
        }

        // Preserve the partial fragment across the chunk edge.
        if matches!(
            self.element,
            ElementState::Container | ElementState::Scalar
        ) {
            self.fragment.push_str(&self.buffer[seg..]);
        }
        self.buffer.clear();
        Extracted::Pending
    }

    /// Prepares to silently consume the remainder of an early-stopped
    /// array before seeking resumes. Returns `false` when there is nothing
    /// left to drain because the final fragment closed the array itself.
    pub(crate) fn begin_drain(&mut self) -> bool {
        self.fragment.clear();
        if self.pending_close {
            self.pending_close = false;
            self.value_done();
            return false;
        }
        self.element = ElementState::Before;
        self.depth = 0;
        true
    }

    /// Consumes buffered input up to and including the stopped array's
    /// closing bracket. Returns `true` once the array is fully consumed.
    pub(crate) fn drain_value(&mut self) -> bool {
        let len = self.buffer.len();
        let mut i = 0;

        if self.escaped && i < len {
            self.escaped = false;
            i += 1;
        }

        while i < len {
            let bytes = self.buffer.as_bytes();
            let Some(off) = bytes[i..].find_byteset(ELEMENT_INTEREST) else {
                break;
            };
            i += off;
            let b = bytes[i];

            if self.in_string {
                match b {
                    b'\\' => {
                        if i + 1 < len {
                            i += 2;
                        } else {
                            self.escaped = true;
                            i = len;
                        }
                    }
                    b'"' => {
                        self.in_string = false;
                        i += 1;
                    }
                    _ => i += 1,
                }
                continue;
            }

            match b {
                b'\\' => {
                    if i + 1 < len {
                        i += 2;
                    } else {
                        self.escaped = true;
                        i = len;
                    }
                }
                b'"' => {
                    self.in_string = true;
                    i += 1;
                }
                b'{' | b'[' => {
                    self.depth += 1;
                    i += 1;
                }
                b']' if self.depth == 0 => {
                    self.value_done();
                    self.buffer.drain(..=i);
                    return true;
                }
                b'}' | b']' => {
                    if self.depth > 0 {
                        self.depth -= 1;
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }

        self.buffer.clear();
        false
    }

    /// True while an extraction round left a fragment partially
    /// accumulated.
    pub(crate) fn mid_fragment(&self) -> bool {
        !self.fragment.is_empty()
            && matches!(
                self.element,
                ElementState::Container | ElementState::Scalar
            )
    }

    fn value_done(&mut self) {
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
        self.element = ElementState::Before;
        self.fragment.clear();
    }

    fn take_scalar(fragment: &mut String) -> String {
        let text = core::mem::take(fragment);
        let trimmed = text.trim_end();
        if trimmed.len() == text.len() {
            text
        } else {
            String::from(trimmed)
        }
    }
}
