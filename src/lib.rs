//! # jebixml
//!
//! An in-memory XML document object model: a well-formedness checking
//! parser, an arena-backed tree with validated mutation, a round-tripping
//! serializer, and an `XPath` query subset.
//!
//! ## Quick Start
//!
//! ```
//! use jebixml::Document;
//!
//! let mut doc = Document::parse_str("<root><child>Hello</child></root>").unwrap();
//! let root = doc.root_element().unwrap();
//! assert_eq!(doc.node_name(root), Some("root"));
//!
//! let extra = doc.create_element_with_text("child", "World");
//! doc.add_child(root, extra).unwrap();
//!
//! let hits = doc.nodes_for_xpath(root, "child[2]").unwrap();
//! assert_eq!(doc.xml_string(hits[0]), "<child>World</child>");
//! ```
//!
//! ## Modules
//!
//! - [`parser`]: decoding and parsing byte or string input.
//! - [`tree`]: the [`Document`] arena, navigation, and mutation.
//! - [`serial`]: serialization back to text or encoded bytes.
//! - [`xpath`]: compiling and evaluating queries.
//! - [`encoding`]: encoding detection and transcoding.
//! - [`error`]: the error types.

pub mod encoding;
pub mod error;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod util;
pub mod xpath;

// Re-export primary types at the crate root for convenience.
pub use error::Error;
pub use parser::ParseOptions;
pub use serial::{serialize, serialize_node};
pub use tree::{Document, NodeId, NodeKind};
pub use xpath::{evaluate, nodes_for_xpath, XPathValue};
