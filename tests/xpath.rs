//! `XPath` tests against a small order-processing document.

#![allow(clippy::unwrap_used)]

use jebixml::xpath::{compile, evaluate, nodes_for_xpath, XPathContext, XPathError, XPathValue};
use jebixml::{Document, NodeId};
use pretty_assertions::assert_eq;

const ORDERS: &str = r#"<?xml version="1.0"?>
<orders region="west">
  <order id="o1" status="shipped"><item sku="A" qty="2"/><item sku="B" qty="1"/><note>rush</note></order>
  <order id="o2" status="pending"><item sku="C" qty="5"/></order>
  <!-- archived below -->
  <order id="o3" status="shipped"><item sku="A" qty="9"/><?audit ok?></order>
</orders>"#;

fn doc() -> Document {
    Document::parse_str(ORDERS).unwrap()
}

fn ids(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .map(|&n| {
            doc.attribute_value(n, "id")
                .or_else(|| doc.attribute_value(n, "sku"))
                .unwrap_or("?")
                .to_string()
        })
        .collect()
}

fn select(doc: &Document, expr: &str) -> Vec<NodeId> {
    nodes_for_xpath(doc, doc.root(), expr).unwrap_or_else(|e| panic!("{expr}: {e}"))
}

#[test]
fn test_absolute_child_path() {
    let doc = doc();
    assert_eq!(ids(&doc, &select(&doc, "/orders/order")), vec!["o1", "o2", "o3"]);
}

#[test]
fn test_attribute_predicates() {
    let doc = doc();
    assert_eq!(
        ids(&doc, &select(&doc, "//order[@status='shipped']")),
        vec!["o1", "o3"]
    );
    assert_eq!(ids(&doc, &select(&doc, "//item[@qty > 2]")), vec!["C", "A"]);
    assert_eq!(
        ids(&doc, &select(&doc, "//order[item/@sku = 'A' and not(note)]")),
        vec!["o3"]
    );
}

#[test]
fn test_positional_predicates() {
    let doc = doc();
    assert_eq!(ids(&doc, &select(&doc, "//order[2]")), vec!["o2"]);
    assert_eq!(ids(&doc, &select(&doc, "/orders/order[last()]")), vec!["o3"]);
    // Position is relative to each parent's item children.
    assert_eq!(ids(&doc, &select(&doc, "//item[1]")), vec!["A", "C", "A"]);
    assert_eq!(ids(&doc, &select(&doc, "(//item)[1]")), vec!["A"]);
}

#[test]
fn test_attribute_axis_results() {
    let doc = doc();
    let attrs = select(&doc, "/orders/order[1]/@*");
    let values: Vec<_> = attrs
        .iter()
        .map(|&a| doc.string_value(a).unwrap())
        .collect();
    assert_eq!(values, vec!["o1", "shipped"]);
    assert_eq!(doc.xml_string(attrs[1]), "status=\"shipped\"");
}

#[test]
fn test_reverse_and_sibling_axes() {
    let doc = doc();
    let o3 = select(&doc, "//order[@id='o3']")[0];
    let nearest = nodes_for_xpath(&doc, o3, "preceding-sibling::order[1]").unwrap();
    assert_eq!(ids(&doc, &nearest), vec!["o2"]);

    let after = nodes_for_xpath(&doc, select(&doc, "//order[1]")[0], "following-sibling::*").unwrap();
    assert_eq!(ids(&doc, &after), vec!["o2", "o3"]);

    let item = select(&doc, "//item[@sku='C']")[0];
    let up = nodes_for_xpath(&doc, item, "ancestor::*").unwrap();
    assert_eq!(
        up.iter().map(|&n| doc.node_name(n).unwrap()).collect::<Vec<_>>(),
        vec!["orders", "order"]
    );
    assert_eq!(
        nodes_for_xpath(&doc, item, "..").unwrap(),
        select(&doc, "//order[@id='o2']")
    );
}

#[test]
fn test_node_type_tests() {
    let doc = doc();
    assert_eq!(select(&doc, "//comment()").len(), 1);
    assert_eq!(select(&doc, "//processing-instruction('audit')").len(), 1);
    assert_eq!(select(&doc, "//processing-instruction('other')").len(), 0);
    let texts = select(&doc, "//note/text()");
    assert_eq!(doc.string_value(texts[0]).as_deref(), Some("rush"));
}

#[test]
fn test_union_is_in_document_order() {
    let doc = doc();
    let nodes = select(&doc, "//note | //order[@id='o1'] | //comment()");
    let names: Vec<_> = nodes
        .iter()
        .map(|&n| doc.node_name(n).unwrap_or("#comment"))
        .collect();
    assert_eq!(names, vec!["order", "note", "#comment"]);
}

#[test]
fn test_scalar_functions() {
    let doc = doc();
    let root = doc.root();
    assert_eq!(
        evaluate(&doc, root, "count(//item)").unwrap(),
        XPathValue::Number(4.0)
    );
    assert_eq!(
        evaluate(&doc, root, "string(//order[2]/@status)").unwrap(),
        XPathValue::String("pending".to_string())
    );
    assert_eq!(
        evaluate(&doc, root, "name(/*)").unwrap(),
        XPathValue::String("orders".to_string())
    );
    assert_eq!(
        evaluate(&doc, root, "contains(//note, 'us') and starts-with(/orders/@region, 'we')")
            .unwrap(),
        XPathValue::Boolean(true)
    );
    assert_eq!(
        evaluate(&doc, root, "//order/@status != 'shipped'").unwrap(),
        XPathValue::Boolean(true)
    );
}

#[test]
fn test_precompiled_expression_per_context() {
    let doc = doc();
    let expr = compile("count(item)").unwrap();
    let counts: Vec<_> = select(&doc, "//order")
        .into_iter()
        .map(|order| XPathContext::new(&doc, order).evaluate(&expr).unwrap())
        .collect();
    assert_eq!(
        counts,
        vec![
            XPathValue::Number(2.0),
            XPathValue::Number(1.0),
            XPathValue::Number(1.0)
        ]
    );
}

#[test]
fn test_queries_see_mutations() {
    let mut doc = doc();
    let o2 = select(&doc, "//order[@id='o2']")[0];
    doc.detach(o2);
    assert_eq!(ids(&doc, &select(&doc, "//order")), vec!["o1", "o3"]);
    assert_eq!(
        nodes_for_xpath(&doc, o2, "item"),
        Err(XPathError::OrphanedContext)
    );
}

#[test]
fn test_error_reporting() {
    let doc = doc();
    let root = doc.root();
    assert!(matches!(
        evaluate(&doc, root, "//order[@id="),
        Err(XPathError::InvalidExpression { .. })
    ));
    assert!(matches!(
        evaluate(&doc, root, "$total"),
        Err(XPathError::Unsupported { .. })
    ));
    assert!(matches!(
        evaluate(&doc, root, "//item/following::item"),
        Err(XPathError::Unsupported { .. })
    ));
    assert!(matches!(
        evaluate(&doc, root, "sum(//item/@qty)"),
        Err(XPathError::UndefinedFunction { .. })
    ));
    assert!(matches!(
        evaluate(&doc, root, "count()"),
        Err(XPathError::InvalidArgCount { .. })
    ));
    assert!(matches!(
        nodes_for_xpath(&doc, root, "1 = 1"),
        Err(XPathError::TypeError { .. })
    ));
}

#[test]
fn test_deeply_nested_expression_is_an_error() {
    let doc = doc();
    let depth = 200_000;
    let expr = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert!(matches!(
        evaluate(&doc, doc.root(), &expr),
        Err(XPathError::InvalidExpression { .. })
    ));
    let expr = format!("count({}//item{})", "(".repeat(50), ")".repeat(50));
    assert_eq!(evaluate(&doc, doc.root(), &expr).unwrap(), XPathValue::Number(4.0));
}
