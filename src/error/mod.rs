//! Error types for parsing, querying, and mutating documents.
//!
//! Every fallible operation in the crate returns one of the typed errors in
//! this module. Parse errors carry line, column, and byte offset information
//! for precise diagnostics. Parsing is all-or-nothing: there is no recovery
//! mode, so a `ParseError` always means no document was produced.
//!
//! The crate-level [`Error`] aggregates the per-component errors so that
//! callers chaining several operations can propagate with `?`.

use std::fmt;

use thiserror::Error;

pub use crate::encoding::EncodingError;
pub use crate::tree::MutationError;
pub use crate::xpath::XPathError;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset into the decoded (UTF-8) input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The category of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Malformed markup: bad references, illegal characters, unterminated
    /// constructs, duplicate attributes, and similar.
    Syntax,
    /// An end tag did not match the innermost open start tag.
    MismatchedTag {
        /// The name of the open element.
        expected: String,
        /// The name found in the end tag.
        found: String,
    },
    /// The input contained no document element.
    NoRoot,
    /// A second top-level element followed the document element.
    MultipleRoots,
    /// A configured limit (nesting depth, attribute count, name length)
    /// was exceeded.
    LimitExceeded,
}

/// The error type returned when XML parsing fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// What went wrong, structurally.
    pub kind: ParseErrorKind,
    /// The human-readable error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

impl ParseError {
    /// Creates a syntax error at the given location.
    pub(crate) fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind: ParseErrorKind::Syntax,
            message: message.into(),
            location,
        }
    }
}

/// Any error produced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The input bytes could not be decoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// The decoded input was not well-formed XML.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An `XPath` expression failed to compile or evaluate.
    #[error(transparent)]
    Query(#[from] XPathError),
    /// A structural mutation would have broken a tree invariant.
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::syntax(
            "unexpected end of input",
            SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
        );
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn test_crate_error_is_transparent() {
        let err: Error = ParseError {
            kind: ParseErrorKind::NoRoot,
            message: "no document element".to_string(),
            location: SourceLocation::default(),
        }
        .into();
        assert_eq!(err.to_string(), "parse error at 0:0: no document element");
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_parse_error_is_error_trait() {
        let err = ParseError::syntax("test", SourceLocation::default());
        let _: &dyn std::error::Error = &err;
    }
}
