//! XML 1.0 parser.
//!
//! A hand-written, non-recursive parser that builds a [`Document`] tree.
//! Parsing is all-or-nothing: the first well-formedness violation aborts
//! with a [`ParseError`] carrying its source location.
//!
//! Byte input goes through [`crate::encoding::decode`] first; string input
//! is taken as already decoded.

mod cursor;
mod xml;

use tracing::debug;

use crate::encoding;
use crate::error::{Error, ParseError};
use crate::tree::Document;

use cursor::{DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NAME_LENGTH};

/// Parse options controlling decoding, whitespace handling, and security
/// limits.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use jebixml::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .encoding("ISO-8859-1")
///     .no_blanks(true)
///     .max_depth(128);
/// assert_eq!(opts.max_depth, 128);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Encoding to assume when the input has neither a BOM nor an encoding
    /// declaration. `None` means UTF-8.
    pub encoding: Option<String>,
    /// If true, drop whitespace-only text nodes inside elements.
    pub no_blanks: bool,

    // -- Security limits --
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum number of attributes on a single element (default: 256).
    pub max_attributes: u32,
    /// Maximum length in bytes of an element or attribute name (default: 50,000).
    pub max_name_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            encoding: None,
            no_blanks: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Sets the fallback encoding label.
    #[must_use]
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Enables or disables stripping of blank text nodes.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum number of attributes per element.
    #[must_use]
    pub fn max_attributes(mut self, max: u32) -> Self {
        self.max_attributes = max;
        self
    }

    /// Sets the maximum element/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }
}

/// Parses an XML string with default options.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML.
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_options(input, &ParseOptions::default())
}

/// Parses an XML string with the given options.
///
/// A leading U+FEFF is skipped. `options.encoding` is ignored because the
/// text is already decoded.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML.
pub fn parse_str_with_options(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    debug!(bytes = input.len(), "parsing document");
    let doc = xml::TreeBuilder::new(input, options).build()?;
    debug!(nodes = doc.node_count(), "parsed document");
    Ok(doc)
}

/// Decodes and parses a byte buffer with the given options.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if decoding fails and [`Error::Parse`] if the
/// decoded text is not well-formed.
pub fn parse_bytes_with_options(bytes: &[u8], options: &ParseOptions) -> Result<Document, Error> {
    let decoded = encoding::decode(bytes, options.encoding.as_deref())?;
    debug!(encoding = decoded.encoding, "decoded input");
    Ok(parse_str_with_options(&decoded.text, options)?)
}
