#![allow(missing_docs)]

mod common;

use jsonsieve::{
    AttributeSpec, ExtractEvent, ExtractMode, Extractor, ExtractorOptions,
};
use serde_json::json;

fn specs() -> Vec<AttributeSpec> {
    vec![
        AttributeSpec::array("records", ExtractMode::SkipAndStream),
        AttributeSpec::object("summary"),
    ]
}

fn collect(chunks: &[&str]) -> Vec<ExtractEvent> {
    let mut extractor = Extractor::new(specs(), ExtractorOptions::default()).unwrap();
    let mut events = Vec::new();
    for chunk in chunks {
        extractor.feed(chunk);
        for event in extractor.by_ref() {
            events.push(event.unwrap());
        }
    }
    for event in extractor.finish() {
        events.push(event.unwrap());
    }
    events
}

#[test]
fn hostile_seams_extract_cleanly() {
    let events = collect(&common::STREAM);
    let data: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ExtractEvent::Data(value) => Some(value),
            _ => None,
        })
        .collect();

    assert_eq!(data.len(), 4);
    assert_eq!(data[0].attribute, "records");
    assert_eq!(
        data[0].data.as_decoded().unwrap(),
        &json!({"id": 0, "tag": "a]}"})
    );
    assert_eq!(
        data[2].data.as_decoded().unwrap(),
        &json!({"id": 2, "tag": "c"})
    );
    assert_eq!(data[3].attribute, "summary");
    assert_eq!(data[3].data.as_decoded().unwrap(), &json!({"status": "ok"}));
    assert_eq!(events.last(), Some(&ExtractEvent::Done));
}

#[test]
fn seam_cut_stream_matches_single_feed() {
    let original = common::original();
    let whole = collect(&[original.as_str()]);
    let seamed = collect(&common::STREAM);
    assert_eq!(whole, seamed);
}
