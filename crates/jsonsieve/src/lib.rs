//! An incremental, attribute-selective JSON extractor.
//!
//! `jsonsieve` scans one large JSON document arriving as arbitrarily
//! fragmented chunks, locates configured top-level attributes by key, and
//! emits their values — whole objects, or array elements one-by-one or in
//! batches — while skipping everything else in the document. The document is
//! never buffered in full: only the fragment currently being isolated and a
//! bounded lookback window are held in memory.
//!
//! ```rust
//! use jsonsieve::{AttributeSpec, ExtractEvent, ExtractMode, Extractor, ExtractorOptions};
//!
//! let specs = vec![AttributeSpec::array("items", ExtractMode::SkipAndStream)];
//! let mut extractor = Extractor::new(specs, ExtractorOptions::default()).unwrap();
//! extractor.feed(r#"{"meta":{"k":1},"items":[{"id":0},{"id":1}]}"#);
//! for event in extractor.finish() {
//!     match event.unwrap() {
//!         ExtractEvent::Data(value) => println!("{}: {:?}", value.attribute, value.data),
//!         ExtractEvent::Done => println!("all attributes resolved"),
//!         ExtractEvent::Close => {}
//!     }
//! }
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod error;
mod event;
mod extractor;
mod options;
mod registry;
mod scanner;
mod segment;

#[cfg(test)]
mod tests;

pub use error::{ConfigError, ExtractError};
pub use event::{EmittedValue, ExtractEvent, Payload};
pub use extractor::{ClosedExtractor, Extractor};
pub use options::{AttributeSpec, ExtractMode, ExtractorOptions, OutputShape, Validator, ValueKind};

/// The decoded JSON value type handed to validators and produced by
/// [`OutputShape::Decoded`].
pub use serde_json::Value;
