//! Querying a document with the supported `XPath` subset.
//!
//! Run with: `cargo run --example xpath_query`
#![allow(clippy::expect_used)]

use jebixml::xpath::{compile, evaluate, XPathContext, XPathValue};
use jebixml::Document;

fn main() {
    let xml = r#"<library>
  <shelf topic="astronomy">
    <book year="1980"><title>Cosmos</title></book>
    <book year="1988"><title>A Brief History of Time</title></book>
  </shelf>
  <shelf topic="fiction">
    <book year="1965"><title>Dune</title></book>
  </shelf>
</library>"#;

    let doc = Document::parse_str(xml).expect("failed to parse XML");
    let top = doc.root();

    let titles = doc
        .nodes_for_xpath(top, "//book[@year > 1970]/title")
        .expect("query failed");
    println!("Published after 1970:");
    for title in titles {
        println!("  {}", doc.string_value(title).unwrap_or_default());
    }

    let last = doc
        .nodes_for_xpath(top, "/library/shelf[@topic='astronomy']/book[last()]")
        .expect("query failed");
    println!("Last astronomy book: {}", doc.xml_string(last[0]));

    match evaluate(&doc, top, "count(//book)").expect("query failed") {
        XPathValue::Number(n) => println!("Books: {n}"),
        other => println!("Unexpected result: {other}"),
    }

    // Compile once, evaluate against each shelf.
    let per_shelf = compile("count(book)").expect("compile failed");
    for shelf in doc.nodes_for_xpath(top, "//shelf").expect("query failed") {
        let count = XPathContext::new(&doc, shelf)
            .evaluate(&per_shelf)
            .expect("evaluation failed");
        println!(
            "Shelf {}: {count} book(s)",
            doc.attribute_value(shelf, "topic").unwrap_or("?")
        );
    }

    if let Err(e) = evaluate(&doc, top, "//book[1 + 1]") {
        println!("Rejected: {e}");
    }
}
