//! Parse a document, walk it, edit it, and write it back out.
//!
//! Run with: `cargo run --example basic_parse`
#![allow(clippy::expect_used)]

use jebixml::serial::{serialize_with_options, SerializeOptions};
use jebixml::tree::NodeKind;
use jebixml::Document;

fn main() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- station log -->
<station code="KSEA">
  <reading hour="06"><temp unit="C">9.5</temp><wind>calm</wind></reading>
  <reading hour="12"><temp unit="C">14.0</temp><wind>NW 12</wind></reading>
</station>"#;

    let mut doc = Document::parse_str(xml).expect("failed to parse XML");
    let station = doc.root_element().expect("no root element");

    println!(
        "<{}> code={}",
        doc.node_name(station).unwrap_or("?"),
        doc.attribute_value(station, "code").unwrap_or("-")
    );

    for reading in doc.children(station) {
        if !matches!(doc.kind(reading), NodeKind::Element { .. }) {
            continue;
        }
        let hour = doc.attribute_value(reading, "hour").unwrap_or("?");
        let summary = doc.string_value(reading).unwrap_or_default();
        println!("  hour {hour}: {summary}");
    }

    // Append a new reading and drop the comment before the root.
    let reading = doc.create_element("reading");
    let hour = doc.create_attribute("hour", "18");
    doc.add_attribute(reading, hour).expect("fresh attribute");
    let temp = doc.create_element_with_text("temp", "11.2");
    doc.add_child(reading, temp).expect("fresh element");
    doc.add_child(station, reading).expect("fresh reading");

    if let Some(comment) = doc.first_child(doc.root()) {
        if matches!(doc.kind(comment), NodeKind::Comment { .. }) {
            doc.detach(comment);
        }
    }

    let pretty = SerializeOptions::default().indent(true);
    println!("\n{}", serialize_with_options(&doc, &pretty));
}
