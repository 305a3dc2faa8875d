//! `XPath` expression evaluator.
//!
//! Walks an [`Expr`] against a [`Document`]. Node-sets are kept in document
//! order without duplicates. Document order is a preorder walk from the
//! document node in which an element's attributes follow the element and
//! precede its children; it is computed on first use and cached for the
//! lifetime of the context.

use std::cell::OnceCell;
use std::collections::HashMap;

use tracing::trace;

use super::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::types::{parse_xpath_number, XPathError, XPathValue};
use crate::tree::{Document, NodeId, NodeKind};
use crate::util::qname;

/// Supported functions with their minimum and maximum argument counts.
const FUNCTIONS: &[(&str, usize, usize)] = &[
    ("last", 0, 0),
    ("position", 0, 0),
    ("count", 1, 1),
    ("not", 1, 1),
    ("true", 0, 0),
    ("false", 0, 0),
    ("string", 0, 1),
    ("name", 0, 1),
    ("local-name", 0, 1),
    ("contains", 2, 2),
    ("starts-with", 2, 2),
];

/// Checks that `name` is a supported function taking `argc` arguments.
pub(crate) fn check_function(name: &str, argc: usize) -> Result<(), XPathError> {
    let Some(&(_, min, max)) = FUNCTIONS.iter().find(|(n, _, _)| *n == name) else {
        return Err(XPathError::UndefinedFunction {
            name: name.to_owned(),
        });
    };
    if argc < min || argc > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} or {max}")
        };
        return Err(XPathError::InvalidArgCount {
            function: name.to_owned(),
            expected,
            found: argc,
        });
    }
    Ok(())
}

/// Evaluation context for compiled expressions.
///
/// Holds the document and the context node. Reuse one context to evaluate
/// several expressions against the same node without recomputing document
/// order.
///
/// # Examples
///
/// ```
/// use jebixml::Document;
/// use jebixml::xpath::{compile, XPathContext};
///
/// let doc = Document::parse_str("<r><a/><b/><a/></r>").unwrap();
/// let root = doc.root_element().unwrap();
/// let expr = compile("a").unwrap();
/// let ctx = XPathContext::new(&doc, root);
/// assert_eq!(ctx.select(&expr).unwrap().len(), 2);
/// ```
pub struct XPathContext<'a> {
    doc: &'a Document,
    context_node: NodeId,
    order: OnceCell<HashMap<NodeId, usize>>,
}

/// The node, position, and size an expression is evaluated against.
#[derive(Debug, Clone, Copy)]
struct Focus {
    node: NodeId,
    position: usize,
    size: usize,
}

impl<'a> XPathContext<'a> {
    /// Creates a context rooted at `context_node`.
    #[must_use]
    pub fn new(doc: &'a Document, context_node: NodeId) -> Self {
        Self {
            doc,
            context_node,
            order: OnceCell::new(),
        }
    }

    /// Evaluates a compiled expression.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError::OrphanedContext`] if the context node is not
    /// attached to the document node, or a type error if an operand has the
    /// wrong type.
    pub fn evaluate(&self, expr: &Expr) -> Result<XPathValue, XPathError> {
        if self.doc.owner_document_node(self.context_node).is_none() {
            return Err(XPathError::OrphanedContext);
        }
        self.eval_expr(
            expr,
            Focus {
                node: self.context_node,
                position: 1,
                size: 1,
            },
        )
    }

    /// Evaluates a compiled expression that must yield a node-set.
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate), plus [`XPathError::TypeError`] when
    /// the result is a scalar.
    pub fn select(&self, expr: &Expr) -> Result<Vec<NodeId>, XPathError> {
        self.evaluate(expr)?.into_node_set()
    }

    fn eval_expr(&self, expr: &Expr, focus: Focus) -> Result<XPathValue, XPathError> {
        match expr {
            Expr::Number(n) => Ok(XPathValue::Number(*n)),
            Expr::String(s) => Ok(XPathValue::String(s.clone())),
            Expr::BinaryOp { op, left, right } => self.eval_binary_op(*op, left, right, focus),
            Expr::FunctionCall { name, args } => self.eval_function(name, args, focus),
            Expr::Path { steps } => self.eval_steps(vec![focus.node], steps),
            Expr::RootPath { steps } => self.eval_steps(vec![self.doc.root()], steps),
            Expr::Filter { expr, predicates } => {
                let mut nodes = self.eval_node_set(expr, focus)?;
                for predicate in predicates {
                    nodes = self.apply_predicate(nodes, predicate)?;
                }
                Ok(XPathValue::NodeSet(nodes))
            }
            Expr::FilterPath { base, steps } => {
                let nodes = self.eval_node_set(base, focus)?;
                self.eval_steps(nodes, steps)
            }
            Expr::Union(left, right) => {
                let mut nodes = self.eval_node_set(left, focus)?;
                nodes.extend(self.eval_node_set(right, focus)?);
                self.sort_document_order(&mut nodes);
                Ok(XPathValue::NodeSet(nodes))
            }
        }
    }

    fn eval_node_set(&self, expr: &Expr, focus: Focus) -> Result<Vec<NodeId>, XPathError> {
        self.eval_expr(expr, focus)?.into_node_set()
    }

    fn eval_binary_op(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        focus: Focus,
    ) -> Result<XPathValue, XPathError> {
        let lv = self.eval_expr(left, focus)?;
        let result = match op {
            BinaryOp::And => lv.to_boolean() && self.eval_expr(right, focus)?.to_boolean(),
            BinaryOp::Or => lv.to_boolean() || self.eval_expr(right, focus)?.to_boolean(),
            BinaryOp::Eq => self.compare_equality(&lv, &self.eval_expr(right, focus)?),
            BinaryOp::Neq => self.compare_inequality(&lv, &self.eval_expr(right, focus)?),
            BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                self.compare_relational(op, &lv, &self.eval_expr(right, focus)?)
            }
        };
        Ok(XPathValue::Boolean(result))
    }

    // --- Location paths ---

    fn eval_steps(&self, mut nodes: Vec<NodeId>, steps: &[Step]) -> Result<XPathValue, XPathError> {
        for step in steps {
            nodes = self.apply_step(&nodes, step)?;
        }
        Ok(XPathValue::NodeSet(nodes))
    }

    /// Applies a step to every input node. Predicates see candidates in axis
    /// order, so `preceding-sibling::*[1]` is the nearest sibling.
    fn apply_step(&self, input: &[NodeId], step: &Step) -> Result<Vec<NodeId>, XPathError> {
        let mut result = Vec::new();
        for &node in input {
            let mut selected: Vec<NodeId> = self
                .axis_nodes(node, step.axis)
                .into_iter()
                .filter(|&id| self.node_matches(id, &step.node_test, step.axis))
                .collect();
            for predicate in &step.predicates {
                selected = self.apply_predicate(selected, predicate)?;
            }
            result.extend(selected);
        }
        self.sort_document_order(&mut result);
        trace!(
            axis = step.axis.as_str(),
            input = input.len(),
            output = result.len(),
            "applied step"
        );
        Ok(result)
    }

    /// Returns the nodes along `axis` from `node`, nearest first.
    fn axis_nodes(&self, node: NodeId, axis: Axis) -> Vec<NodeId> {
        let doc = self.doc;
        match axis {
            Axis::Child => doc.children(node).collect(),
            Axis::Descendant => doc.descendants(node).collect(),
            Axis::DescendantOrSelf => std::iter::once(node).chain(doc.descendants(node)).collect(),
            Axis::Self_ => vec![node],
            Axis::Parent => doc.parent(node).into_iter().collect(),
            Axis::Ancestor => doc.ancestors(node).skip(1).collect(),
            Axis::AncestorOrSelf => doc.ancestors(node).collect(),
            Axis::Attribute => doc.attributes(node).to_vec(),
            Axis::FollowingSibling => {
                std::iter::successors(doc.next_sibling(node), |&s| doc.next_sibling(s)).collect()
            }
            Axis::PrecedingSibling => {
                std::iter::successors(doc.prev_sibling(node), |&s| doc.prev_sibling(s)).collect()
            }
        }
    }

    /// Tests a candidate node. Name tests and `*` select the principal node
    /// type of the axis: attributes on the attribute axis, elements
    /// elsewhere. Document type nodes are outside the data model and never
    /// match.
    fn node_matches(&self, id: NodeId, test: &NodeTest, axis: Axis) -> bool {
        let kind = self.doc.kind(id);
        let principal_name = match kind {
            NodeKind::Attribute { name, .. } if axis == Axis::Attribute => Some(name.as_str()),
            NodeKind::Element { name, .. } if axis != Axis::Attribute => Some(name.as_str()),
            _ => None,
        };
        match test {
            NodeTest::Name(expected) => principal_name == Some(expected.as_str()),
            NodeTest::Wildcard => principal_name.is_some(),
            NodeTest::PrefixWildcard(prefix) => principal_name
                .and_then(|name| qname::split_qname(name).0)
                .is_some_and(|p| p == prefix),
            NodeTest::Node => !matches!(kind, NodeKind::DocumentType { .. }),
            NodeTest::Text => matches!(kind, NodeKind::Text { .. } | NodeKind::CData { .. }),
            NodeTest::Comment => matches!(kind, NodeKind::Comment { .. }),
            NodeTest::ProcessingInstruction(expected) => match kind {
                NodeKind::ProcessingInstruction { target, .. } => {
                    expected.as_ref().map_or(true, |t| t == target)
                }
                _ => false,
            },
        }
    }

    /// Keeps the nodes for which `predicate` holds. A numeric result is
    /// compared against the node's position.
    #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
    fn apply_predicate(&self, nodes: Vec<NodeId>, predicate: &Expr) -> Result<Vec<NodeId>, XPathError> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (i, node) in nodes.into_iter().enumerate() {
            let focus = Focus {
                node,
                position: i + 1,
                size,
            };
            let keep = match self.eval_expr(predicate, focus)? {
                XPathValue::Number(n) => n == (i + 1) as f64,
                other => other.to_boolean(),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    fn document_order(&self) -> &HashMap<NodeId, usize> {
        self.order.get_or_init(|| {
            let doc = self.doc;
            let root = doc.root();
            let mut order = HashMap::with_capacity(doc.node_count());
            order.insert(root, 0);
            for id in doc.descendants(root) {
                order.insert(id, order.len());
                for &attr in doc.attributes(id) {
                    order.insert(attr, order.len());
                }
            }
            order
        })
    }

    fn sort_document_order(&self, nodes: &mut Vec<NodeId>) {
        let order = self.document_order();
        nodes.sort_by_key(|id| order.get(id).copied().unwrap_or(usize::MAX));
        nodes.dedup();
    }

    // --- Functions ---

    #[allow(clippy::cast_precision_loss)]
    fn eval_function(&self, name: &str, args: &[Expr], focus: Focus) -> Result<XPathValue, XPathError> {
        check_function(name, args.len())?;
        let value = match name {
            "last" => XPathValue::Number(focus.size as f64),
            "position" => XPathValue::Number(focus.position as f64),
            "count" => XPathValue::Number(self.eval_node_set(&args[0], focus)?.len() as f64),
            "not" => XPathValue::Boolean(!self.eval_expr(&args[0], focus)?.to_boolean()),
            "true" => XPathValue::Boolean(true),
            "false" => XPathValue::Boolean(false),
            "string" => {
                let s = match args.first() {
                    Some(arg) => self.value_to_string(&self.eval_expr(arg, focus)?),
                    None => self.string_value(focus.node),
                };
                XPathValue::String(s)
            }
            "name" | "local-name" => {
                let node = match args.first() {
                    Some(arg) => self.eval_node_set(arg, focus)?.first().copied(),
                    None => Some(focus.node),
                };
                let node_name = node.and_then(|n| {
                    if name == "name" {
                        self.doc.node_name(n)
                    } else {
                        self.doc.local_name(n)
                    }
                });
                XPathValue::String(node_name.unwrap_or_default().to_owned())
            }
            "contains" | "starts-with" => {
                let haystack = self.value_to_string(&self.eval_expr(&args[0], focus)?);
                let needle = self.value_to_string(&self.eval_expr(&args[1], focus)?);
                XPathValue::Boolean(if name == "contains" {
                    haystack.contains(&needle)
                } else {
                    haystack.starts_with(&needle)
                })
            }
            _ => {
                return Err(XPathError::UndefinedFunction {
                    name: name.to_owned(),
                })
            }
        };
        Ok(value)
    }

    // --- Conversions and comparisons ---

    fn string_value(&self, node: NodeId) -> String {
        self.doc.string_value(node).unwrap_or_default()
    }

    fn value_to_string(&self, val: &XPathValue) -> String {
        match val {
            XPathValue::NodeSet(ns) => ns
                .first()
                .map_or_else(String::new, |&n| self.string_value(n)),
            other => other.to_string(),
        }
    }

    fn value_to_number(&self, val: &XPathValue) -> f64 {
        match val {
            XPathValue::Number(n) => *n,
            XPathValue::Boolean(b) => f64::from(u8::from(*b)),
            other => parse_xpath_number(&self.value_to_string(other)),
        }
    }

    /// `=` per `XPath` 1.0 section 3.4. A node-set compares true if any of
    /// its members' string-values satisfies the comparison.
    #[allow(clippy::float_cmp)]
    fn compare_equality(&self, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        match (lhs, rhs) {
            (XPathValue::NodeSet(lns), XPathValue::NodeSet(rns)) => {
                let rstrings: Vec<String> = rns.iter().map(|&n| self.string_value(n)).collect();
                lns.iter()
                    .any(|&n| rstrings.contains(&self.string_value(n)))
            }
            (XPathValue::NodeSet(ns), XPathValue::Boolean(b))
            | (XPathValue::Boolean(b), XPathValue::NodeSet(ns)) => ns.is_empty() != *b,
            (XPathValue::NodeSet(ns), XPathValue::Number(x))
            | (XPathValue::Number(x), XPathValue::NodeSet(ns)) => ns
                .iter()
                .any(|&n| parse_xpath_number(&self.string_value(n)) == *x),
            (XPathValue::NodeSet(ns), XPathValue::String(s))
            | (XPathValue::String(s), XPathValue::NodeSet(ns)) => {
                ns.iter().any(|&n| self.string_value(n) == *s)
            }
            (XPathValue::Boolean(_), _) | (_, XPathValue::Boolean(_)) => {
                lhs.to_boolean() == rhs.to_boolean()
            }
            (XPathValue::Number(_), _) | (_, XPathValue::Number(_)) => {
                self.value_to_number(lhs) == self.value_to_number(rhs)
            }
            _ => self.value_to_string(lhs) == self.value_to_string(rhs),
        }
    }

    /// `!=` is existential over node-sets too, so it is not the negation of
    /// `=` when a node-set is involved.
    #[allow(clippy::float_cmp)]
    fn compare_inequality(&self, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        match (lhs, rhs) {
            (XPathValue::NodeSet(lns), XPathValue::NodeSet(rns)) => lns.iter().any(|&l| {
                let ls = self.string_value(l);
                rns.iter().any(|&r| self.string_value(r) != ls)
            }),
            (XPathValue::NodeSet(ns), XPathValue::Number(x))
            | (XPathValue::Number(x), XPathValue::NodeSet(ns)) => ns
                .iter()
                .any(|&n| parse_xpath_number(&self.string_value(n)) != *x),
            (XPathValue::NodeSet(ns), XPathValue::String(s))
            | (XPathValue::String(s), XPathValue::NodeSet(ns)) => {
                ns.iter().any(|&n| self.string_value(n) != *s)
            }
            _ => !self.compare_equality(lhs, rhs),
        }
    }

    fn compare_relational(&self, op: BinaryOp, lhs: &XPathValue, rhs: &XPathValue) -> bool {
        let cmp = |a: f64, b: f64| match op {
            BinaryOp::Lt => a < b,
            BinaryOp::Lte => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
        let numbers = |val: &XPathValue| -> Vec<f64> {
            match val {
                XPathValue::NodeSet(ns) => ns
                    .iter()
                    .map(|&n| parse_xpath_number(&self.string_value(n)))
                    .collect(),
                other => vec![self.value_to_number(other)],
            }
        };
        let (lnums, rnums) = (numbers(lhs), numbers(rhs));
        lnums.iter().any(|&l| rnums.iter().any(|&r| cmp(l, r)))
    }
}
