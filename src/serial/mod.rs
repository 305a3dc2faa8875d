//! XML serialization.
//!
//! Turns a `Document`, or any node within one, back into XML text with
//! proper escaping. [`serialize_to_bytes`] additionally encodes the text in
//! the document's declared encoding.

pub mod xml;

pub use xml::{
    serialize, serialize_node, serialize_node_with_options, serialize_to_bytes,
    serialize_with_options, SerializeOptions,
};
