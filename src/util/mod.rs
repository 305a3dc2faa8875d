//! Utility modules for jebixml.
//!
//! Character classes shared by the document parser and the `XPath` lexer,
//! and qualified name handling shared by the tree and `XPath` code.

pub mod chars;
pub mod qname;
