//! `XPath` query subset.
//!
//! Supports location paths over the child, descendant, descendant-or-self,
//! self, parent, ancestor, ancestor-or-self, attribute, following-sibling
//! and preceding-sibling axes, with predicates built from comparisons,
//! `and`/`or`, and a small function library (`last`, `position`, `count`,
//! `not`, `true`, `false`, `string`, `name`, `local-name`, `contains`,
//! `starts-with`). Anything else in `XPath` 1.0 fails to compile with
//! [`XPathError::Unsupported`].
//!
//! # Quick Start
//!
//! ```
//! use jebixml::Document;
//! use jebixml::xpath::nodes_for_xpath;
//!
//! let doc = Document::parse_str("<r><i k=\"a\">1</i><i k=\"b\">2</i></r>").unwrap();
//! let hits = nodes_for_xpath(&doc, doc.root(), "/r/i[@k='b']").unwrap();
//! assert_eq!(doc.string_value(hits[0]).as_deref(), Some("2"));
//! ```
//!
//! Name tests compare qualified names literally; prefixes are not resolved
//! against namespace declarations.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod types;

pub use ast::Expr;
pub use eval::XPathContext;
pub use types::{XPathError, XPathValue};

use tracing::trace;

use crate::tree::{Document, NodeId};

/// Compiles an expression for repeated evaluation with [`XPathContext`].
///
/// # Errors
///
/// Returns [`XPathError`] if the expression is malformed, outside the
/// supported subset, or calls an unknown function.
pub fn compile(expression: &str) -> Result<Expr, XPathError> {
    let expr = parser::parse(expression)?;
    trace!(expression, "compiled xpath");
    Ok(expr)
}

/// Evaluates an expression against a context node.
///
/// # Examples
///
/// ```
/// use jebixml::Document;
/// use jebixml::xpath::{evaluate, XPathValue};
///
/// let doc = Document::parse_str("<root><a/><b/></root>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(evaluate(&doc, root, "count(*)").unwrap(), XPathValue::Number(2.0));
/// ```
///
/// # Errors
///
/// Returns [`XPathError`] if compilation fails, the context node is not
/// attached to the document, or an operand has the wrong type.
pub fn evaluate(doc: &Document, context: NodeId, expression: &str) -> Result<XPathValue, XPathError> {
    let expr = compile(expression)?;
    let value = XPathContext::new(doc, context).evaluate(&expr)?;
    trace!(expression, result = value.type_name(), "evaluated xpath");
    Ok(value)
}

/// Selects the nodes matched by an expression, in document order.
///
/// The bare path `/` selects the document node itself.
///
/// # Errors
///
/// As [`evaluate`], plus [`XPathError::TypeError`] when the expression
/// yields a scalar instead of a node-set.
pub fn nodes_for_xpath(
    doc: &Document,
    context: NodeId,
    expression: &str,
) -> Result<Vec<NodeId>, XPathError> {
    let expr = compile(expression)?;
    let nodes = XPathContext::new(doc, context).select(&expr)?;
    trace!(expression, matches = nodes.len(), "selected nodes");
    Ok(nodes)
}

impl Document {
    /// Selects nodes relative to `context`. See [`nodes_for_xpath`].
    ///
    /// # Errors
    ///
    /// See [`nodes_for_xpath`].
    pub fn nodes_for_xpath(&self, context: NodeId, expression: &str) -> Result<Vec<NodeId>, XPathError> {
        nodes_for_xpath(self, context, expression)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HELLO: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<x a=\"y\">Hello, World!</x>\n";

    #[test]
    fn test_bare_root_selects_document_node() {
        let doc = Document::parse_str(HELLO).unwrap();
        let nodes = doc.nodes_for_xpath(doc.root(), "/").unwrap();
        assert_eq!(nodes, vec![doc.root()]);
        assert_eq!(
            doc.string_value(nodes[0]).as_deref(),
            Some("Hello, World!")
        );
    }

    #[test]
    fn test_root_wildcard_selects_root_element() {
        let doc = Document::parse_str(HELLO).unwrap();
        let nodes = doc.nodes_for_xpath(doc.root(), "/*").unwrap();
        assert_eq!(nodes, vec![doc.root_element().unwrap()]);
        assert_eq!(doc.attribute_value(nodes[0], "a"), Some("y"));
    }

    #[test]
    fn test_absolute_path_from_any_context() {
        let doc = Document::parse_str("<r><a><b/></a></r>").unwrap();
        let b = doc.nodes_for_xpath(doc.root(), "//b").unwrap()[0];
        let from_b = doc.nodes_for_xpath(b, "/r/a").unwrap();
        assert_eq!(doc.node_name(from_b[0]), Some("a"));
    }

    #[test]
    fn test_descendant_text() {
        let doc = Document::parse_str("<r>one<a>two</a><b><c>three</c></b></r>").unwrap();
        let texts: Vec<String> = doc
            .nodes_for_xpath(doc.root(), "//text()")
            .unwrap()
            .into_iter()
            .map(|n| doc.string_value(n).unwrap())
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_scalar_result_is_type_error_for_node_query() {
        let doc = Document::parse_str("<r/>").unwrap();
        assert!(matches!(
            nodes_for_xpath(&doc, doc.root(), "count(*)"),
            Err(XPathError::TypeError { .. })
        ));
        assert_eq!(
            evaluate(&doc, doc.root(), "count(*)").unwrap(),
            XPathValue::Number(1.0)
        );
    }

    #[test]
    fn test_compile_once_evaluate_many() {
        let doc = Document::parse_str("<r><i>1</i><g><i>2</i><i>3</i></g></r>").unwrap();
        let expr = compile("count(i)").unwrap();
        let root = doc.root_element().unwrap();
        let g = doc.nodes_for_xpath(root, "g").unwrap()[0];
        assert_eq!(
            XPathContext::new(&doc, root).evaluate(&expr).unwrap(),
            XPathValue::Number(1.0)
        );
        assert_eq!(
            XPathContext::new(&doc, g).evaluate(&expr).unwrap(),
            XPathValue::Number(2.0)
        );
    }
}
