//! Arena-based XML document tree.
//!
//! All nodes live in a contiguous arena owned by the `Document`
//! and are referenced by `NodeId`, a newtype over `NonZeroU32`. Navigation
//! links (parent, first\_child, last\_child, next\_sibling, prev\_sibling)
//! are arena indices, so parent back-references never own anything and the
//! whole tree is freed at once when the `Document` is dropped.
//!
//! # Ownership
//!
//! A node's parent link is its only ownership edge. Nodes created through
//! the `create_*` constructors start out unowned; detaching a node turns it
//! into the root of an independent fragment that still lives in the arena.
//! Attribute nodes are owned by their element through its attribute list
//! and never appear in a child sequence.

mod mutate;
mod node;

pub use mutate::MutationError;
pub use node::NodeKind;

use crate::error::{Error, ParseError};
use crate::parser::{self, ParseOptions};
use crate::util::qname;
use std::collections::HashMap;
use std::iter;
use std::num::NonZeroU32;

/// The namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A typed index into the document's node arena.
///
/// Ids are only meaningful for the `Document` that issued them.
/// `Option<NodeId>` is the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Ids are slot numbers shifted up by one so zero is never used.
    #[allow(clippy::expect_used)]
    fn for_slot(slot: usize) -> Self {
        let raw = u32::try_from(slot + 1).ok().and_then(NonZeroU32::new);
        Self(raw.expect("document holds more than u32::MAX nodes"))
    }

    fn slot(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// One arena entry: a node's payload plus its tree links.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub kind: NodeKind,
    /// `None` for the document node and the top of a detached fragment.
    pub parent: Option<NodeId>,
    pub first: Option<NodeId>,
    pub last: Option<NodeId>,
    pub next: Option<NodeId>,
    pub prev: Option<NodeId>,
}

impl Slot {
    fn unlinked(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first: None,
            last: None,
            next: None,
            prev: None,
        }
    }
}

/// An XML document.
///
/// The `Document` owns all nodes in an arena and is also the factory for new
/// nodes. Navigation goes through `&Document`, mutation through
/// `&mut Document`.
///
/// # Examples
///
/// ```
/// use jebixml::Document;
///
/// let doc = Document::parse_str("<root a=\"1\">hi</root>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(root), Some("root"));
/// assert_eq!(doc.string_value(root).as_deref(), Some("hi"));
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Slot>,
    /// The document node id (not the root element).
    root: NodeId,
    /// XML version from the XML declaration (e.g., "1.0").
    ///
    /// A document only serializes an XML declaration when this is set.
    pub version: Option<String>,
    /// Encoding from the XML declaration (e.g., "UTF-8").
    pub encoding: Option<String>,
    /// Standalone flag from the XML declaration.
    pub standalone: Option<bool>,
    /// Whitespace read between document-level markup. `None` for documents
    /// built in memory, which serialize with one line break per item.
    layout: Option<Layout>,
}

/// Document-level whitespace as it appeared in the parsed input.
#[derive(Debug, Clone, Default)]
struct Layout {
    /// Before the first top-level node (after the XML declaration, if any).
    prolog: String,
    /// After each top-level node.
    after: HashMap<NodeId, String>,
}

impl Document {
    /// Creates a new empty document containing only the document node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Slot::unlinked(NodeKind::Document)],
            root: NodeId::for_slot(0),
            version: None,
            encoding: None,
            standalone: None,
            layout: None,
        }
    }

    /// Parses a byte buffer, resolving its encoding first.
    ///
    /// The encoding is taken from the BOM, then the XML declaration, then
    /// `options.encoding`, then defaults to UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the bytes cannot be decoded and
    /// [`Error::Parse`] if the decoded text is not well-formed.
    ///
    /// # Examples
    ///
    /// ```
    /// use jebixml::{Document, ParseOptions};
    ///
    /// let opts = ParseOptions::default().encoding("ISO-8859-1");
    /// let doc = Document::parse(b"<r>caf\xE9</r>", &opts).unwrap();
    /// let root = doc.root_element().unwrap();
    /// assert_eq!(doc.string_value(root).as_deref(), Some("caf\u{e9}"));
    /// ```
    pub fn parse(bytes: &[u8], options: &ParseOptions) -> Result<Self, Error> {
        parser::parse_bytes_with_options(bytes, options)
    }

    /// Parses raw bytes with default options.
    ///
    /// # Errors
    ///
    /// See [`Document::parse`].
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::parse(bytes, &ParseOptions::default())
    }

    /// Parses an already-decoded string with default options.
    ///
    /// An encoding named in the XML declaration is recorded but not applied,
    /// since the text is already Unicode.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the input is not well-formed XML.
    pub fn parse_str(input: &str) -> Result<Self, ParseError> {
        parser::parse_str_with_options(input, &ParseOptions::default())
    }

    /// Returns the document node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the document element (the single top-level element).
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| matches!(self.slot(id).kind, NodeKind::Element { .. }))
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by another document.
    pub(crate) fn slot(&self, id: NodeId) -> &Slot {
        &self.nodes[id.slot()]
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> &mut Slot {
        &mut self.nodes[id.slot()]
    }

    /// Returns the kind and payload of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.slot(id).kind
    }

    /// Returns the qualified name of a node, if it has one.
    ///
    /// Elements and attributes return their qualified name, processing
    /// instructions their target. Other kinds return `None`.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.slot(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::Attribute { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the local part of the node's name.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        match &self.slot(id).kind {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => {
                Some(qname::local_part(name))
            }
            NodeKind::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Returns the namespace prefix of an element or attribute name.
    #[must_use]
    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        match &self.slot(id).kind {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => {
                qname::split_qname(name).0
            }
            _ => None,
        }
    }

    /// Resolves the namespace URI of an element or attribute.
    ///
    /// Elements resolve their prefix (or the default namespace when they have
    /// none) against the `xmlns` declarations in scope. Unprefixed attributes
    /// are never in a namespace. An empty declaration (`xmlns=""`) undeclares
    /// the default namespace.
    #[must_use]
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let (prefix, scope) = match &self.slot(id).kind {
            NodeKind::Element { name, .. } => (qname::split_qname(name).0.unwrap_or(""), id),
            NodeKind::Attribute { name, .. } => {
                let prefix = qname::split_qname(name).0?;
                if prefix == "xmlns" {
                    return None;
                }
                (prefix, self.parent(id)?)
            }
            _ => return None,
        };
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.lookup_namespace(scope, prefix)
    }

    /// Finds the URI bound to `prefix` (`""` for the default namespace) in
    /// scope at `id`.
    #[must_use]
    pub fn lookup_namespace(&self, id: NodeId, prefix: &str) -> Option<&str> {
        for ancestor in self.ancestors(id) {
            for &attr in self.attributes(ancestor) {
                if let NodeKind::Attribute { name, value } = &self.slot(attr).kind {
                    if qname::declared_prefix(name) == Some(prefix) {
                        return (!value.is_empty()).then_some(value.as_str());
                    }
                }
            }
        }
        None
    }

    /// Returns the string value of a node.
    ///
    /// For elements and the document node this is the concatenation of all
    /// descendant text and CDATA content in document order. Attributes yield
    /// their value, character data and comments their content, processing
    /// instructions their data. Document type nodes have no string value.
    #[must_use]
    pub fn string_value(&self, id: NodeId) -> Option<String> {
        match &self.slot(id).kind {
            NodeKind::Document | NodeKind::Element { .. } => {
                let mut buf = String::new();
                self.collect_text(id, &mut buf);
                Some(buf)
            }
            NodeKind::Attribute { value, .. } => Some(value.clone()),
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Comment { content } => Some(content.clone()),
            NodeKind::ProcessingInstruction { data, .. } => {
                Some(data.clone().unwrap_or_default())
            }
            NodeKind::DocumentType { .. } => None,
        }
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        for child in self.children(id) {
            match &self.slot(child).kind {
                NodeKind::Text { content } | NodeKind::CData { content } => {
                    buf.push_str(content);
                }
                NodeKind::Element { .. } => self.collect_text(child, buf),
                _ => {}
            }
        }
    }

    /// Returns the attribute nodes of an element, in insertion order.
    ///
    /// Returns an empty slice for non-element nodes.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        match &self.slot(id).kind {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Looks up an attribute node by name.
    ///
    /// A prefixed attribute matches only when both prefix and local name
    /// agree with `name`. An unprefixed attribute matches only an
    /// unprefixed `name`. Returns the first match.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.attributes(id).iter().copied().find(|&attr| {
            matches!(
                &self.slot(attr).kind,
                NodeKind::Attribute { name: candidate, .. }
                    if qname::attribute_name_matches(candidate, name)
            )
        })
    }

    /// Returns the value of the attribute matching `name`, if any.
    #[must_use]
    pub fn attribute_value(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.slot(self.attribute(id, name)?).kind {
            NodeKind::Attribute { value, .. } => Some(value),
            _ => None,
        }
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).first
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).last
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).next
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).prev
    }

    /// Iterates over the children of a node in order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.first_child(id), move |&child| self.next_sibling(child))
    }

    /// Returns the number of children of a node.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Iterates from `id` up through its ancestors, `id` first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(Some(id), move |&node| self.parent(node))
    }

    /// Iterates over the descendants of `id` in document order.
    ///
    /// Attributes are not descendants.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.first_child(id), move |&node| self.next_within(node, id))
    }

    /// The node after `node` in document order, or `None` once the walk
    /// would leave the subtree rooted at `scope`.
    fn next_within(&self, node: NodeId, scope: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(node) {
            return Some(child);
        }
        let mut current = node;
        while current != scope {
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
        None
    }

    /// Returns the document node if `id` is attached to it.
    ///
    /// Detached fragments have no owning document node.
    #[must_use]
    pub fn owner_document_node(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).last().filter(|&top| top == self.root)
    }

    // --- Construction ---

    /// Allocates a new, unowned node in the arena.
    pub(crate) fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Slot::unlinked(kind));
        NodeId::for_slot(self.nodes.len() - 1)
    }

    /// Creates an unowned element with no children and no attributes.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Element {
            name: name.into(),
            attributes: Vec::new(),
        })
    }

    /// Creates an unowned element whose only child is a text node.
    ///
    /// An empty `value` yields a childless element.
    pub fn create_element_with_text(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let element = self.create_element(name);
        let value = value.into();
        if !value.is_empty() {
            let text = self.create_text(value);
            self.append_child(element, text);
        }
        element
    }

    /// Creates an unowned attribute node.
    pub fn create_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Attribute {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Creates an unowned text node.
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Text {
            content: content.into(),
        })
    }

    /// Creates an unowned CDATA section.
    pub fn create_cdata(&mut self, content: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::CData {
            content: content.into(),
        })
    }

    /// Creates an unowned comment.
    pub fn create_comment(&mut self, content: impl Into<String>) -> NodeId {
        self.create_node(NodeKind::Comment {
            content: content.into(),
        })
    }

    /// Creates an unowned processing instruction.
    pub fn create_processing_instruction(
        &mut self,
        target: impl Into<String>,
        data: Option<String>,
    ) -> NodeId {
        self.create_node(NodeKind::ProcessingInstruction {
            target: target.into(),
            data,
        })
    }

    /// Deep-copies a subtree from `other` into this document.
    ///
    /// The copy is unowned. Document nodes cannot be imported; import their
    /// root element instead.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::InvalidChild`] when `id` is a document node.
    pub fn import_node(&mut self, other: &Document, id: NodeId) -> Result<NodeId, MutationError> {
        let copy = match &other.slot(id).kind {
            NodeKind::Document => {
                return Err(MutationError::InvalidChild {
                    reason: "a document node cannot be imported".to_string(),
                });
            }
            NodeKind::Element { name, attributes } => {
                let element = self.create_element(name.clone());
                for &attr in attributes {
                    let attr_copy = self.import_node(other, attr)?;
                    self.push_attribute(element, attr_copy);
                }
                element
            }
            kind => self.create_node(kind.clone()),
        };
        for child in other.children(id) {
            let child_copy = self.import_node(other, child)?;
            self.append_child(copy, child_copy);
        }
        Ok(copy)
    }

    // --- Raw linking. Callers check ownership and cycles first. ---

    /// Links an unowned node into `parent`'s children, before `before` or
    /// at the end.
    pub(crate) fn link_child(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        debug_assert!(self.parent(child).is_none(), "linking a node that is still owned");
        let prev = match before {
            Some(next) => self.prev_sibling(next),
            None => self.last_child(parent),
        };
        {
            let slot = self.slot_mut(child);
            slot.parent = Some(parent);
            slot.prev = prev;
            slot.next = before;
        }
        match prev {
            Some(prev) => self.slot_mut(prev).next = Some(child),
            None => self.slot_mut(parent).first = Some(child),
        }
        match before {
            Some(next) => self.slot_mut(next).prev = Some(child),
            None => self.slot_mut(parent).last = Some(child),
        }
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.link_child(parent, child, None);
    }

    /// Adds an unowned attribute node to the end of an element's attribute list.
    pub(crate) fn push_attribute(&mut self, element: NodeId, attr: NodeId) {
        let pushed = match &mut self.slot_mut(element).kind {
            NodeKind::Element { attributes, .. } => {
                attributes.push(attr);
                true
            }
            _ => false,
        };
        if pushed {
            self.slot_mut(attr).parent = Some(element);
        }
    }

    /// Records whitespace seen at document level. It belongs after the
    /// document node's current last child, or to the prolog when there is
    /// none yet.
    pub(crate) fn record_document_space(&mut self, space: &str) {
        let last = self.last_child(self.root);
        let layout = self.layout.get_or_insert_with(Layout::default);
        match last {
            Some(node) => layout.after.entry(node).or_default().push_str(space),
            None => layout.prolog.push_str(space),
        }
    }

    /// Whitespace the parser saw before the first top-level node.
    pub(crate) fn prolog_space(&self) -> Option<&str> {
        self.layout.as_ref().map(|layout| layout.prolog.as_str())
    }

    /// Whitespace the parser saw after a top-level node.
    pub(crate) fn space_after(&self, id: NodeId) -> Option<&str> {
        self.layout
            .as_ref()
            .and_then(|layout| layout.after.get(&id))
            .map(String::as_str)
    }

    /// Returns the total number of nodes in the arena, detached ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text_children(doc: &mut Document, parent: NodeId, texts: &[&str]) -> Vec<NodeId> {
        texts
            .iter()
            .map(|t| {
                let id = doc.create_text(*t);
                doc.append_child(parent, id);
                id
            })
            .collect()
    }

    #[test]
    fn test_new_document_has_root() {
        let doc = Document::new();
        assert!(matches!(doc.kind(doc.root()), NodeKind::Document));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.root_element(), None);
    }

    #[test]
    fn test_append_links_siblings() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let ids = text_children(&mut doc, p, &["A", "B", "C"]);
        let (a, b, c) = (ids[0], ids[1], ids[2]);

        assert_eq!(doc.first_child(p), Some(a));
        assert_eq!(doc.last_child(p), Some(c));
        assert_eq!(doc.next_sibling(a), Some(b));
        assert_eq!(doc.prev_sibling(c), Some(b));
        assert_eq!(doc.prev_sibling(a), None);
        assert_eq!(doc.children(p).collect::<Vec<_>>(), ids);
        assert_eq!(doc.child_count(p), 3);
    }

    #[test]
    fn test_link_before_first_and_middle() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let ids = text_children(&mut doc, p, &["B", "D"]);
        let a = doc.create_text("A");
        let c = doc.create_text("C");
        doc.link_child(p, a, Some(ids[0]));
        doc.link_child(p, c, Some(ids[1]));

        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![a, ids[0], c, ids[1]]);
        assert_eq!(doc.prev_sibling(a), None);
        assert_eq!(doc.prev_sibling(c), Some(ids[0]));
        assert_eq!(doc.last_child(p), Some(ids[1]));
        assert_eq!(doc.parent(c), Some(p));
    }

    #[test]
    fn test_ancestors_and_owner() {
        let mut doc = Document::new();
        let root = doc.root();
        let parent = doc.create_element("parent");
        let child = doc.create_element("child");
        doc.append_child(root, parent);
        doc.append_child(parent, child);

        assert_eq!(doc.ancestors(child).collect::<Vec<_>>(), vec![child, parent, root]);
        assert_eq!(doc.owner_document_node(child), Some(root));

        let orphan = doc.create_element("orphan");
        assert_eq!(doc.owner_document_node(orphan), None);
    }

    #[test]
    fn test_descendants_stop_at_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.create_element("p");
        let b = doc.create_element("b");
        let after = doc.create_element("after");
        doc.append_child(root, p);
        doc.append_child(root, after);
        let a = doc.create_text("hello ");
        doc.append_child(p, a);
        doc.append_child(p, b);
        let w = doc.create_text("world");
        doc.append_child(b, w);

        assert_eq!(doc.descendants(p).collect::<Vec<_>>(), vec![a, b, w]);
        assert_eq!(doc.descendants(root).collect::<Vec<_>>(), vec![p, a, b, w, after]);
    }

    #[test]
    fn test_string_value_concatenates_descendant_text() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let hello = doc.create_text("hello ");
        let bold = doc.create_element("b");
        let cdata = doc.create_cdata("wor");
        let comment = doc.create_comment("skipped");
        let ld = doc.create_text("ld");
        doc.append_child(p, hello);
        doc.append_child(p, bold);
        doc.append_child(bold, cdata);
        doc.append_child(p, comment);
        doc.append_child(p, ld);

        assert_eq!(doc.string_value(p).as_deref(), Some("hello world"));
        assert_eq!(doc.string_value(comment).as_deref(), Some("skipped"));
    }

    #[test]
    fn test_create_element_with_text() {
        let mut doc = Document::new();
        let a = doc.create_element_with_text("a", "v");
        assert_eq!(doc.node_name(a), Some("a"));
        assert_eq!(doc.string_value(a).as_deref(), Some("v"));

        let empty = doc.create_element_with_text("e", "");
        assert_eq!(doc.first_child(empty), None);
    }

    #[test]
    fn test_attribute_lookup_honors_prefix() {
        let mut doc = Document::new();
        let e = doc.create_element("e");
        let plain = doc.create_attribute("id", "main");
        let lang = doc.create_attribute("xml:lang", "en");
        doc.push_attribute(e, plain);
        doc.push_attribute(e, lang);

        assert_eq!(doc.attribute(e, "id"), Some(plain));
        assert_eq!(doc.attribute(e, "p:id"), None);
        assert_eq!(doc.attribute(e, "xml:lang"), Some(lang));
        assert_eq!(doc.attribute(e, "lang"), None);
        assert_eq!(doc.attribute_value(e, "id"), Some("main"));
        assert_eq!(doc.parent(plain), Some(e));
        assert_eq!(doc.children(e).count(), 0);
    }

    #[test]
    fn test_names_and_namespaces() {
        let doc = Document::parse_str(
            r#"<root xmlns="urn:d" xmlns:s="urn:s"><s:rect s:w="1" h="2"/><plain xmlns=""/></root>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        let rect = doc.first_child(root).unwrap();
        let plain = doc.next_sibling(rect).unwrap();

        assert_eq!(doc.local_name(rect), Some("rect"));
        assert_eq!(doc.prefix(rect), Some("s"));
        assert_eq!(doc.namespace_uri(root), Some("urn:d"));
        assert_eq!(doc.namespace_uri(rect), Some("urn:s"));
        assert_eq!(doc.namespace_uri(plain), None);

        let w = doc.attribute(rect, "s:w").unwrap();
        let h = doc.attribute(rect, "h").unwrap();
        assert_eq!(doc.namespace_uri(w), Some("urn:s"));
        assert_eq!(doc.namespace_uri(h), None);
    }

    #[test]
    fn test_import_node_deep_copies() {
        let source = Document::parse_str(r#"<a x="1"><b>text</b><!--c--></a>"#).unwrap();
        let mut target = Document::new();
        let copy = target
            .import_node(&source, source.root_element().unwrap())
            .unwrap();

        assert_eq!(target.parent(copy), None);
        assert_eq!(target.attribute_value(copy, "x"), Some("1"));
        assert_eq!(target.string_value(copy).as_deref(), Some("text"));
        assert_eq!(target.child_count(copy), 2);
        assert!(target.import_node(&source, source.root()).is_err());
    }
}
