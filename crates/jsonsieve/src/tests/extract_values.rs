use alloc::{format, string::ToString, vec, vec::Vec};

use rstest::rstest;
use serde_json::{Value, json};

use crate::{
    AttributeSpec, ExtractEvent, ExtractMode, ExtractorOptions, OutputShape,
};

use super::fixture::{data_events, drive, flatten_decoded, sample_document, sample_value};

#[rstest]
#[case(1)]
#[case(4)]
#[case(12)]
fn single_object(#[case] parts: usize) {
    let doc = sample_document(3);
    let events = drive(
        vec![AttributeSpec::object("e")],
        ExtractorOptions::default(),
        &doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].attribute, "e");
    assert_eq!(data[0].data.as_decoded().unwrap(), &sample_value(3)["e"]);
    assert_eq!(data[0].amount, None);
    assert_eq!(data[0].start_index, None);
    assert_eq!(data[0].end_index, None);
    assert_eq!(events.last(), Some(&ExtractEvent::Done));
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(12)]
fn multiple_objects_emit_in_document_order(#[case] parts: usize) {
    let doc = sample_document(3);
    // Registered e before b; the document has b before e.
    let events = drive(
        vec![AttributeSpec::object("e"), AttributeSpec::object("b")],
        ExtractorOptions::default(),
        &doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].attribute, "b");
    assert_eq!(data[0].data.as_decoded().unwrap(), &sample_value(3)["b"]);
    assert_eq!(data[1].attribute, "e");
    assert_eq!(data[1].data.as_decoded().unwrap(), &sample_value(3)["e"]);
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(12)]
fn batch_and_process_without_skip(#[case] parts: usize) {
    let doc = sample_document(50);
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::BatchAndProcess).with_batch_size(10),
        ],
        ExtractorOptions::default(),
        &doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 5);
    let positions: Vec<_> = data
        .iter()
        .map(|d| (d.start_index, d.end_index, d.amount))
        .collect();
    for (idx, position) in positions.iter().enumerate() {
        assert_eq!(
            *position,
            (Some(idx * 10), Some(idx * 10 + 10), Some(10))
        );
    }
    assert_eq!(
        flatten_decoded(&data),
        sample_value(50)["f"].as_array().unwrap().clone()
    );
}

#[test]
fn batch_and_process_with_skip() {
    let doc = sample_document(50);
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::BatchAndProcess)
                .with_skip(20)
                .with_batch_size(10),
        ],
        ExtractorOptions::default(),
        &doc,
        4,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 3);
    let positions: Vec<_> = data
        .iter()
        .map(|d| (d.start_index, d.end_index, d.amount))
        .collect();
    assert_eq!(
        positions,
        vec![
            (Some(20), Some(30), Some(10)),
            (Some(30), Some(40), Some(10)),
            (Some(40), Some(50), Some(10)),
        ]
    );
    assert_eq!(
        flatten_decoded(&data),
        sample_value(50)["f"].as_array().unwrap()[20..].to_vec()
    );
}

#[test]
fn batch_and_process_flushes_short_remainder() {
    let doc = sample_document(50);
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::BatchAndProcess).with_batch_size(15),
        ],
        ExtractorOptions::default(),
        &doc,
        4,
    );
    let data = data_events(&events);
    let amounts: Vec<_> = data.iter().map(|d| d.amount).collect();
    assert_eq!(
        amounts,
        vec![Some(15), Some(15), Some(15), Some(5)]
    );
    assert_eq!(data[3].start_index, Some(45));
    assert_eq!(data[3].end_index, Some(50));
    assert_eq!(
        flatten_decoded(&data),
        sample_value(50)["f"].as_array().unwrap().clone()
    );
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(12)]
fn skip_and_stream_without_skip(#[case] parts: usize) {
    let doc = sample_document(50);
    let events = drive(
        vec![AttributeSpec::array("f", ExtractMode::SkipAndStream).with_skip(0)],
        ExtractorOptions::default(),
        &doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 50);
    assert!(data.iter().all(|d| d.amount == Some(1)));
    assert_eq!(
        flatten_decoded(&data),
        sample_value(50)["f"].as_array().unwrap().clone()
    );
}

#[test]
fn skip_and_stream_with_skip() {
    let doc = sample_document(50);
    let events = drive(
        vec![AttributeSpec::array("f", ExtractMode::SkipAndStream).with_skip(20)],
        ExtractorOptions::default(),
        &doc,
        4,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 30);
    assert_eq!(
        flatten_decoded(&data),
        sample_value(50)["f"].as_array().unwrap()[20..].to_vec()
    );
}

#[test]
fn skip_and_stream_stops_at_quota() {
    let doc = sample_document(50);
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::SkipAndStream)
                .with_skip(2)
                .with_batch_size(5),
        ],
        ExtractorOptions::default(),
        &doc,
        4,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 5);
    assert_eq!(
        flatten_decoded(&data),
        sample_value(50)["f"].as_array().unwrap()[2..7].to_vec()
    );
    assert_eq!(events.last(), Some(&ExtractEvent::Done));
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(12)]
fn skip_and_batch_without_skip(#[case] parts: usize) {
    let doc = sample_document(50);
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::SkipAndBatch)
                .with_skip(0)
                .with_batch_size(10),
        ],
        ExtractorOptions::default(),
        &doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].amount, Some(10));
    assert_eq!(
        flatten_decoded(&data),
        sample_value(50)["f"].as_array().unwrap()[..10].to_vec()
    );
}

#[test]
fn skip_and_batch_with_skip() {
    let doc = sample_document(50);
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::SkipAndBatch)
                .with_skip(20)
                .with_batch_size(10),
        ],
        ExtractorOptions::default(),
        &doc,
        4,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].start_index, Some(20));
    assert_eq!(data[0].end_index, Some(30));
    assert_eq!(
        flatten_decoded(&data),
        sample_value(50)["f"].as_array().unwrap()[20..30].to_vec()
    );
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(12)]
fn skip_and_batch_concrete_scenario(#[case] parts: usize) {
    let doc = r#"{"a":true,"b":{"x":1},"f":[{"i":0},{"i":1},{"i":2}]}"#;
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::SkipAndBatch)
                .with_skip(1)
                .with_batch_size(2),
        ],
        ExtractorOptions::default(),
        doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 1);
    assert_eq!(
        data[0].data.as_decoded().unwrap(),
        &json!([{"i":1},{"i":2}])
    );
    assert_eq!(data[0].amount, Some(2));
    assert_eq!(events.last(), Some(&ExtractEvent::Done));
}

#[test]
fn raw_text_output_is_undecoded() {
    let doc = r#"{"e":{"k":"v"},"f":[{"i":0},{"i":1}]}"#;
    let events = drive(
        vec![
            AttributeSpec::object("e").with_output(OutputShape::RawText),
            AttributeSpec::array("f", ExtractMode::SkipAndBatch)
                .with_batch_size(2)
                .with_output(OutputShape::RawText),
        ],
        ExtractorOptions::default(),
        doc,
        3,
    );
    let data = data_events(&events);
    assert_eq!(data[0].data.as_raw(), Some(r#"{"k":"v"}"#));
    assert_eq!(data[1].data.as_raw(), Some(r#"[{"i":0},{"i":1}]"#));
}

#[test]
fn empty_array_completes_without_data() {
    let doc = r#"{"f":[],"e":{"k":1}}"#;
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::BatchAndProcess).with_batch_size(5),
            AttributeSpec::object("e"),
        ],
        ExtractorOptions::default(),
        doc,
        2,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].attribute, "e");
    assert_eq!(events.last(), Some(&ExtractEvent::Done));
}

#[test]
fn skip_beyond_length_emits_nothing() {
    let doc = sample_document(5);
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::SkipAndBatch)
                .with_skip(100)
                .with_batch_size(10),
        ],
        ExtractorOptions::default(),
        &doc,
        3,
    );
    assert!(data_events(&events).is_empty());
    assert_eq!(events.last(), Some(&ExtractEvent::Done));
}

#[test]
fn close_on_done_discards_later_chunks() {
    let doc = sample_document(50);
    let specs = vec![
        AttributeSpec::array("f", ExtractMode::SkipAndBatch)
            .with_skip(0)
            .with_batch_size(2),
    ];
    let mut extractor = crate::Extractor::new(
        specs,
        ExtractorOptions {
            close_on_done: true,
        },
    )
    .unwrap();
    extractor.feed(&doc);
    let events: Vec<_> = extractor.by_ref().map(Result::unwrap).collect();
    let data = data_events(&events);
    assert_eq!(data.len(), 1);
    let tail: Vec<_> = events.iter().rev().take(2).collect();
    assert_eq!(*tail[0], ExtractEvent::Close);
    assert_eq!(*tail[1], ExtractEvent::Done);

    // Upstream keeps producing; everything after close is discarded.
    extractor.feed(r#"{"f":[{"elementNumber":99}]}"#);
    assert_eq!(extractor.by_ref().count(), 0);
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(12)]
fn attribute_following_early_stopped_array(#[case] parts: usize) {
    // e sits after f in the document, and f stops after one batch; the
    // rest of f must be consumed without emissions before e is found.
    let f: Vec<Value> = (0..30).map(|e| json!({"n": e})).collect();
    let doc = json!({"f": f, "e": {"k": "v"}}).to_string();
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::SkipAndBatch)
                .with_skip(3)
                .with_batch_size(2),
            AttributeSpec::object("e"),
        ],
        ExtractorOptions::default(),
        &doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].attribute, "f");
    assert_eq!(data[0].data.as_decoded().unwrap(), &json!([{"n":3},{"n":4}]));
    assert_eq!(data[1].attribute, "e");
    assert_eq!(data[1].data.as_decoded().unwrap(), &json!({"k":"v"}));
}

#[test]
fn decoy_key_inside_string_value_is_ignored() {
    let doc = r#"{"d":"not here: \"f\":[{\"i\":9}]","f":[{"i":0}]}"#;
    let events = drive(
        vec![AttributeSpec::array("f", ExtractMode::SkipAndStream)],
        ExtractorOptions::default(),
        doc,
        5,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].data.as_decoded().unwrap(), &json!({"i":0}));
}

#[rstest]
#[case(1)]
#[case(7)]
fn nested_key_at_depth_is_ignored(#[case] parts: usize) {
    // The fixture's b object carries its own "f" array at depth one.
    let doc = sample_document(3);
    let events = drive(
        vec![AttributeSpec::array("f", ExtractMode::SkipAndStream)],
        ExtractorOptions::default(),
        &doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 3);
    for (idx, value) in data.iter().enumerate() {
        assert_eq!(
            value.data.as_decoded().unwrap(),
            &json!({"elementNumber": idx})
        );
    }
}

#[rstest]
#[case(1)]
#[case(4)]
fn scalar_array_elements_stream(#[case] parts: usize) {
    let doc = sample_document(3);
    let events = drive(
        vec![AttributeSpec::array("c", ExtractMode::SkipAndStream)],
        ExtractorOptions::default(),
        &doc,
        parts,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 3);
    let values: Vec<_> = data
        .iter()
        .map(|d| d.data.as_decoded().unwrap().clone())
        .collect();
    assert_eq!(values, vec![json!("1"), json!("2"), json!("3")]);
}

#[test]
fn whitespace_between_colon_and_bracket() {
    let doc = "{\"a\":1,\"f\": \n\t [{\"i\":0},{\"i\":1}]}";
    let events = drive(
        vec![AttributeSpec::array("f", ExtractMode::SkipAndStream)],
        ExtractorOptions::default(),
        doc,
        6,
    );
    assert_eq!(data_events(&events).len(), 2);
}

#[test]
fn truncated_document_finishes_cleanly() {
    let doc = sample_document(50);
    // Cut inside the middle of the f array, mid-element.
    let cut = doc.len() - doc.len() / 4;
    let events = drive(
        vec![AttributeSpec::array("f", ExtractMode::SkipAndStream)],
        ExtractorOptions::default(),
        &doc[..cut],
        3,
    );
    // Only complete elements are emitted, the unterminated one never is,
    // and the run still ends with done.
    assert!(!data_events(&events).is_empty());
    assert_eq!(events.last(), Some(&ExtractEvent::Done));
}

#[test]
fn truncated_document_still_flushes_batch_remainder() {
    let f: Vec<Value> = (0..7).map(|e| json!({"n": e})).collect();
    let doc = json!({"f": f}).to_string();
    // Keep the first five elements and cut mid-sixth.
    let keep = doc.find(r#"{"n":5}"#).unwrap() + 3;
    let events = drive(
        vec![
            AttributeSpec::array("f", ExtractMode::BatchAndProcess).with_batch_size(4),
        ],
        ExtractorOptions::default(),
        &doc[..keep],
        2,
    );
    let data = data_events(&events);
    assert_eq!(data.len(), 2);
    assert_eq!(data[0].amount, Some(4));
    // The remainder flush covers the fifth element only.
    assert_eq!(data[1].amount, Some(1));
    assert_eq!(data[1].start_index, Some(4));
    assert_eq!(data[1].end_index, Some(5));
}

#[test]
fn stop_finalizes_at_safe_boundary() {
    let doc = sample_document(50);
    let specs = vec![
        AttributeSpec::array("f", ExtractMode::BatchAndProcess).with_batch_size(12),
    ];
    let mut extractor = crate::Extractor::new(specs, ExtractorOptions::default()).unwrap();
    // Feed roughly half the document, then cancel.
    let half = doc.len() / 2;
    let mut boundary = half;
    while !doc.is_char_boundary(boundary) {
        boundary += 1;
    }
    extractor.feed(&doc[..boundary]);
    extractor.stop();
    let events: Vec<_> = extractor.by_ref().map(Result::unwrap).collect();
    assert_eq!(events.last(), Some(&ExtractEvent::Done));
    // Whatever was batched is flushed, nothing is lost or duplicated.
    let data = data_events(&events);
    let total: usize = data.iter().map(|d| d.amount.unwrap()).sum();
    let expected = flatten_decoded(&data).len();
    assert_eq!(total, expected);
}

#[rstest]
#[case(4)]
#[case(12)]
fn chunking_does_not_change_emissions(#[case] parts: usize) {
    let doc = sample_document(37);
    let specs = || {
        vec![
            AttributeSpec::object("e"),
            AttributeSpec::array("f", ExtractMode::BatchAndProcess)
                .with_skip(5)
                .with_batch_size(8),
        ]
    };
    let reference = drive(specs(), ExtractorOptions::default(), &doc, 1);
    let chunked = drive(specs(), ExtractorOptions::default(), &doc, parts);
    assert_eq!(
        format!("{reference:?}"),
        format!("{chunked:?}"),
        "emissions must not depend on chunk boundaries"
    );
}
