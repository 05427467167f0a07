//! Feed a document through the extractor in small chunks and print every
//! emission. Run with `RUST_LOG=debug` to watch the progress telemetry.

use jsonsieve::{AttributeSpec, ExtractEvent, ExtractMode, Extractor, ExtractorOptions};

fn main() {
    env_logger::init();

    let records: Vec<_> = (0..10)
        .map(|n| serde_json::json!({"id": n, "score": n * 3}))
        .collect();
    let document = serde_json::json!({
        "meta": {"source": "demo", "version": 1},
        "records": records,
        "summary": {"status": "ok"}
    })
    .to_string();

    let specs = vec![
        AttributeSpec::array("records", ExtractMode::BatchAndProcess)
            .with_skip(2)
            .with_batch_size(3),
        AttributeSpec::object("summary"),
    ];
    let mut extractor =
        Extractor::new(specs, ExtractorOptions::default()).expect("specs are consistent");

    for chunk in document.as_bytes().chunks(16) {
        extractor.feed(std::str::from_utf8(chunk).expect("document is ASCII"));
        for event in extractor.by_ref() {
            report(&event.expect("extraction succeeds"));
        }
    }
    for event in extractor.finish() {
        report(&event.expect("extraction succeeds"));
    }
}

fn report(event: &ExtractEvent) {
    match event {
        ExtractEvent::Data(value) => println!(
            "{} [{:?}..{:?}] -> {:?}",
            value.attribute, value.start_index, value.end_index, value.data
        ),
        ExtractEvent::Done => println!("done"),
        ExtractEvent::Close => println!("close"),
    }
}
