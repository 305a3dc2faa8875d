//! Node type definitions.
//!
//! The `NodeKind` enum is the tagged variant every node carries. Callers
//! inspect a node by matching on its kind rather than by downcasting.

/// The kind of an XML node and its associated data.
///
/// This enum carries the payload for each node type. Navigation links
/// (parent, children, siblings) are stored in the arena slot, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. Each `Document` has exactly one.
    Document,

    /// An element node, e.g., `<svg:rect class="x">`.
    Element {
        /// The qualified name, including any prefix.
        name: String,
        /// Attribute nodes in insertion order. Each has this element as parent.
        attributes: Vec<super::NodeId>,
    },

    /// An attribute node. Lives in its element's attribute list, never in a
    /// child sequence.
    Attribute {
        /// The qualified name, including any prefix.
        name: String,
        /// The attribute value with references already resolved.
        value: String,
    },

    /// A text node containing character data.
    Text {
        /// The text content (already decoded, character references resolved).
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The CDATA content (no escaping applied).
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text (without the `<!--` and `-->` delimiters).
        content: String,
    },

    /// A processing instruction, e.g., `<?target data?>`.
    ProcessingInstruction {
        /// The PI target (e.g., `"xml-stylesheet"`).
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },

    /// A document type declaration, e.g., `<!DOCTYPE note SYSTEM "note.dtd">`.
    ///
    /// Preserved for round-tripping only; it is never validated against.
    DocumentType {
        /// The root element name declared in the DOCTYPE.
        name: String,
        /// The SYSTEM identifier (URI), if any.
        system_id: Option<String>,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
        /// The raw internal subset between `[` and `]`, if any.
        internal_subset: Option<String>,
    },
}

impl NodeKind {
    /// Returns `true` for kinds that can never have children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Document | Self::Element { .. })
    }

    /// A short lowercase name for the kind, used in error messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Element { .. } => "element",
            Self::Attribute { .. } => "attribute",
            Self::Text { .. } => "text",
            Self::CData { .. } => "cdata",
            Self::Comment { .. } => "comment",
            Self::ProcessingInstruction { .. } => "processing instruction",
            Self::DocumentType { .. } => "document type",
        }
    }
}
