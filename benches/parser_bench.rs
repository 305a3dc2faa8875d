#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jebixml::encoding;
use jebixml::serial::{serialize, serialize_with_options, SerializeOptions};
use jebixml::xpath::{compile, nodes_for_xpath, XPathContext};
use jebixml::Document;
use std::fmt::Write;

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// An inventory with `count` items, each carrying attributes and children.
fn make_inventory(count: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<inventory>\n");
    for i in 0..count {
        let _ = writeln!(
            xml,
            "  <item sku=\"S{i:05}\" bin=\"{}\"><label>Part {i}</label>\
             <qty>{}</qty><!-- restock {i} --></item>",
            i % 12,
            i * 7 % 100
        );
    }
    xml.push_str("</inventory>\n");
    xml
}

/// Nested sections `depth` levels deep.
fn make_nested(depth: usize) -> String {
    let mut xml = String::new();
    for _ in 0..depth {
        xml.push_str("<section>");
    }
    xml.push_str("core");
    for _ in 0..depth {
        xml.push_str("</section>");
    }
    xml
}

/// Text-heavy content that exercises escaping and entity expansion.
fn make_escaped(count: usize) -> String {
    let mut xml = String::from("<notes>");
    for i in 0..count {
        let _ = write!(
            xml,
            "<n t=\"a &lt; b &amp; c\">{i} &gt; {} &#x263A; <![CDATA[raw <{i}>]]></n>",
            i + 1
        );
    }
    xml.push_str("</notes>");
    xml
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let small = make_inventory(10);
    let large = make_inventory(1000);
    let nested = make_nested(200);
    let escaped = make_escaped(200);

    c.bench_function("parse_inventory_small", |b| {
        b.iter(|| Document::parse_str(black_box(&small)));
    });
    c.bench_function("parse_inventory_large", |b| {
        b.iter(|| Document::parse_str(black_box(&large)));
    });
    c.bench_function("parse_deeply_nested", |b| {
        b.iter(|| Document::parse_str(black_box(&nested)));
    });
    c.bench_function("parse_escaped_text", |b| {
        b.iter(|| Document::parse_str(black_box(&escaped)));
    });
}

fn bench_parse_latin1(c: &mut Criterion) {
    let text = make_inventory(500).replace("UTF-8", "ISO-8859-1").replace("Part", "Pièce");
    let bytes = encoding::encode(&text, "ISO-8859-1").expect("encodable");
    c.bench_function("parse_latin1_bytes", |b| {
        b.iter(|| Document::parse_bytes(black_box(&bytes)));
    });
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

fn bench_serialize(c: &mut Criterion) {
    let doc = Document::parse_str(&make_inventory(1000)).expect("parse inventory");
    let pretty = SerializeOptions::default().indent(true);

    c.bench_function("serialize_inventory", |b| {
        b.iter(|| serialize(black_box(&doc)));
    });
    c.bench_function("serialize_inventory_indented", |b| {
        b.iter(|| serialize_with_options(black_box(&doc), &pretty));
    });
}

// ---------------------------------------------------------------------------
// XPath
// ---------------------------------------------------------------------------

fn bench_xpath(c: &mut Criterion) {
    let doc = Document::parse_str(&make_inventory(1000)).expect("parse inventory");
    let root = doc.root();

    c.bench_function("xpath_descendant_name", |b| {
        b.iter(|| nodes_for_xpath(&doc, root, black_box("//label")));
    });
    c.bench_function("xpath_attribute_predicate", |b| {
        b.iter(|| nodes_for_xpath(&doc, root, black_box("/inventory/item[@bin='3']")));
    });
    c.bench_function("xpath_positional", |b| {
        b.iter(|| nodes_for_xpath(&doc, root, black_box("//item[last()]/label")));
    });

    let expr = compile("count(//item[qty > 50])").expect("compile");
    c.bench_function("xpath_precompiled_count", |b| {
        b.iter(|| XPathContext::new(&doc, root).evaluate(black_box(&expr)));
    });
}

criterion_group!(benches, bench_parse, bench_parse_latin1, bench_serialize, bench_xpath);
criterion_main!(benches);
