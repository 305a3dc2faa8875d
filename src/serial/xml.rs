//! XML serializer.
//!
//! Serializes a `Document`, or any subtree of one, into well-formed XML text.
//!
//! A whole document is written as its XML declaration (when the document has
//! one), then its top-level nodes. Whitespace between them is reproduced as
//! the parser read it. A document built in memory gets a line break after
//! the declaration and after each top-level node.

use tracing::trace;

use crate::encoding::{self, EncodingError};
use crate::tree::{Document, NodeId, NodeKind};

/// Options controlling XML serialization output.
///
/// # Examples
///
/// ```
/// use jebixml::Document;
/// use jebixml::serial::{serialize_with_options, SerializeOptions};
///
/// let doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
/// let xml = serialize_with_options(&doc, &SerializeOptions::default().indent(true));
/// assert_eq!(xml, "<root>\n  <child>Hello</child>\n</root>");
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Whether to produce indented (pretty-printed) output.
    /// Defaults to `false`.
    pub indent: bool,
    /// The indentation string used for each level when `indent` is `true`.
    /// Defaults to two spaces.
    pub indent_str: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: false,
            indent_str: "  ".to_string(),
        }
    }
}

impl SerializeOptions {
    /// Enables or disables indented output.
    ///
    /// Only elements whose children are all elements, comments, or
    /// processing instructions (ignoring blank text) are indented. Mixed
    /// content is written untouched.
    #[must_use]
    pub fn indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }
}

/// Serializes a document to an XML string.
///
/// # Examples
///
/// ```
/// use jebixml::Document;
/// use jebixml::serial::serialize;
///
/// let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<x a=\"y\">Hello, World!</x>\n";
/// let doc = Document::parse_str(input).unwrap();
/// assert_eq!(serialize(&doc), input);
/// ```
#[must_use]
pub fn serialize(doc: &Document) -> String {
    serialize_with_options(doc, &SerializeOptions::default())
}

/// Serializes a document to an XML string with the given options.
#[must_use]
pub fn serialize_with_options(doc: &Document, options: &SerializeOptions) -> String {
    serialize_node_with_options(doc, doc.root(), options)
}

/// Serializes a single node and its subtree.
///
/// Serializing the document node is the same as [`serialize`]. An
/// attribute node is written as `name="value"`.
#[must_use]
pub fn serialize_node(doc: &Document, id: NodeId) -> String {
    serialize_node_with_options(doc, id, &SerializeOptions::default())
}

/// Serializes a single node and its subtree with the given options.
#[must_use]
pub fn serialize_node_with_options(doc: &Document, id: NodeId, options: &SerializeOptions) -> String {
    let mut writer = Writer {
        doc,
        options,
        out: String::new(),
    };
    if matches!(doc.kind(id), NodeKind::Document) {
        writer.write_document();
    } else {
        writer.write_node(id, 0, false);
    }
    trace!(bytes = writer.out.len(), "serialized node");
    writer.out
}

/// Serializes a document and encodes it in its declared encoding.
///
/// Documents without an encoding declaration are written as UTF-8.
///
/// # Errors
///
/// Returns `EncodingError` if the declared encoding is unknown.
pub fn serialize_to_bytes(doc: &Document) -> Result<Vec<u8>, EncodingError> {
    let text = serialize(doc);
    match doc.encoding.as_deref() {
        None => Ok(text.into_bytes()),
        Some(label) => encoding::encode(&text, label),
    }
}

impl Document {
    /// Returns the serialized form of a node's subtree.
    ///
    /// See [`serialize_node`].
    #[must_use]
    pub fn xml_string(&self, id: NodeId) -> String {
        serialize_node(self, id)
    }

    /// Serializes the whole document in its declared encoding.
    ///
    /// # Errors
    ///
    /// See [`serialize_to_bytes`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        serialize_to_bytes(self)
    }
}

struct Writer<'a> {
    doc: &'a Document,
    options: &'a SerializeOptions,
    out: String,
}

impl Writer<'_> {
    fn write_document(&mut self) {
        let doc = self.doc;
        if let Some(version) = &doc.version {
            self.out.push_str("<?xml version=\"");
            self.out.push_str(version);
            self.out.push('"');
            if let Some(encoding) = &doc.encoding {
                self.out.push_str(" encoding=\"");
                self.out.push_str(encoding);
                self.out.push('"');
            }
            if let Some(standalone) = doc.standalone {
                self.out.push_str(" standalone=\"");
                self.out.push_str(if standalone { "yes" } else { "no" });
                self.out.push('"');
            }
            self.out.push_str("?>");
        }
        let prolog = match doc.prolog_space() {
            Some(space) => space,
            None if doc.version.is_some() => "\n",
            None => "",
        };
        self.out.push_str(prolog);
        for child in doc.children(doc.root()) {
            self.write_node(child, 0, false);
            self.out.push_str(doc.space_after(child).unwrap_or("\n"));
        }
    }

    fn write_indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str(&self.options.indent_str);
        }
    }

    /// Writes one node. `pretty` is set when the parent is element-only and
    /// indentation is on, in which case the node owns a whole line.
    fn write_node(&mut self, id: NodeId, depth: usize, pretty: bool) {
        let doc = self.doc;
        if pretty {
            self.write_indent(depth);
        }
        match doc.kind(id) {
            NodeKind::Element { name, attributes } => {
                self.out.push('<');
                self.out.push_str(name);
                for &attr in attributes {
                    self.out.push(' ');
                    self.write_node(attr, depth, false);
                }
                if doc.first_child(id).is_none() {
                    self.out.push_str("/>");
                } else {
                    self.out.push('>');
                    let element_only = self.options.indent && is_element_only(doc, id);
                    if element_only {
                        self.out.push('\n');
                    }
                    for child in doc.children(id) {
                        if element_only && is_blank_text(doc, child) {
                            continue;
                        }
                        self.write_node(child, depth + 1, element_only);
                    }
                    if element_only {
                        self.write_indent(depth);
                    }
                    self.out.push_str("</");
                    self.out.push_str(name);
                    self.out.push('>');
                }
            }
            NodeKind::Attribute { name, value } => {
                self.out.push_str(name);
                self.out.push_str("=\"");
                write_escaped_attr(&mut self.out, value);
                self.out.push('"');
            }
            NodeKind::Text { content } => write_escaped_text(&mut self.out, content),
            NodeKind::CData { content } => {
                self.out.push_str("<![CDATA[");
                self.out.push_str(content);
                self.out.push_str("]]>");
            }
            NodeKind::Comment { content } => {
                self.out.push_str("<!--");
                self.out.push_str(content);
                self.out.push_str("-->");
            }
            NodeKind::ProcessingInstruction { target, data } => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if let Some(data) = data {
                    self.out.push(' ');
                    self.out.push_str(data);
                }
                self.out.push_str("?>");
            }
            NodeKind::DocumentType {
                name,
                system_id,
                public_id,
                internal_subset,
            } => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(name);
                match (public_id, system_id) {
                    (Some(public_id), Some(system_id)) => {
                        self.out.push_str(" PUBLIC ");
                        write_quoted_literal(&mut self.out, public_id);
                        self.out.push(' ');
                        write_quoted_literal(&mut self.out, system_id);
                    }
                    (None, Some(system_id)) => {
                        self.out.push_str(" SYSTEM ");
                        write_quoted_literal(&mut self.out, system_id);
                    }
                    _ => {}
                }
                if let Some(subset) = internal_subset {
                    self.out.push_str(" [");
                    self.out.push_str(subset);
                    self.out.push(']');
                }
                self.out.push('>');
            }
            NodeKind::Document => self.write_document(),
        }
        if pretty {
            self.out.push('\n');
        }
    }
}

/// Returns `true` if the element has at least one element child and no
/// character data other than blank text, so it is safe to indent.
fn is_element_only(doc: &Document, id: NodeId) -> bool {
    let mut has_element_child = false;
    for child in doc.children(id) {
        match doc.kind(child) {
            NodeKind::Element { .. } => has_element_child = true,
            NodeKind::Text { .. } if is_blank_text(doc, child) => {}
            NodeKind::Text { .. } | NodeKind::CData { .. } => return false,
            _ => {}
        }
    }
    has_element_child
}

fn is_blank_text(doc: &Document, id: NodeId) -> bool {
    matches!(doc.kind(id), NodeKind::Text { content } if content.trim().is_empty())
}

/// Writes a SYSTEM or PUBLIC literal, choosing a quote it does not contain.
fn write_quoted_literal(out: &mut String, value: &str) {
    let quote = if value.contains('"') { '\'' } else { '"' };
    out.push(quote);
    out.push_str(value);
    out.push(quote);
}

/// Escapes special characters in text content.
///
/// `&`, `<`, and `>` become entity references. A carriage return is written
/// as `&#13;` so that line-end normalization does not eat it on reparse.
pub(crate) fn write_escaped_text(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes special characters in a double-quoted attribute value.
///
/// Tabs and line breaks are written as character references so that
/// attribute value normalization does not turn them into spaces on reparse.
pub(crate) fn write_escaped_attr(out: &mut String, s: &str) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
}
