//! `XPath` value and error types.
//!
//! An expression evaluates to one of the four `XPath` 1.0 data types:
//! boolean, number, string, or node-set.

use std::fmt;

use crate::tree::NodeId;

/// An `XPath` value.
#[derive(Debug, Clone)]
pub enum XPathValue {
    /// A boolean value.
    Boolean(bool),
    /// An IEEE 754 double.
    Number(f64),
    /// A string.
    String(String),
    /// A node-set in document order without duplicates.
    NodeSet(Vec<NodeId>),
}

impl XPathValue {
    /// Converts this value to a boolean.
    ///
    /// Numbers are true unless zero or NaN, strings and node-sets are true
    /// unless empty.
    #[must_use]
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::NodeSet(nodes) => !nodes.is_empty(),
        }
    }

    /// Returns the node-set if this value is one.
    #[must_use]
    pub fn as_node_set(&self) -> Option<&[NodeId]> {
        match self {
            Self::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Consumes the value and returns the node-set it holds.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError::TypeError`] for scalar values.
    pub fn into_node_set(self) -> Result<Vec<NodeId>, XPathError> {
        match self {
            Self::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::TypeError {
                expected: "node-set",
                found: other.type_name(),
            }),
        }
    }

    /// Returns the `XPath` name of this value's type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::NodeSet(_) => "node-set",
        }
    }
}

impl fmt::Display for XPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&format_xpath_number(*n)),
            Self::String(s) => f.write_str(s),
            Self::NodeSet(nodes) => write!(f, "<node-set of {} nodes>", nodes.len()),
        }
    }
}

impl PartialEq for XPathValue {
    #[allow(clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::NodeSet(a), Self::NodeSet(b)) => a == b,
            _ => false,
        }
    }
}

/// Formats a number the way the `string()` function does.
///
/// Integers print without a decimal point, NaN as `NaN`, infinities as
/// `Infinity` and `-Infinity`, and negative zero as `0`.
#[must_use]
pub fn format_xpath_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n.is_sign_positive() {
            "Infinity".to_owned()
        } else {
            "-Infinity".to_owned()
        };
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    if n.fract() == 0.0 && n.abs() < 1e18 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

/// Converts a string to a number; anything unparseable is NaN.
pub(crate) fn parse_xpath_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// An error raised while compiling or evaluating an `XPath` expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XPathError {
    /// The expression is syntactically malformed.
    #[error("invalid XPath expression at offset {position}: {message}")]
    InvalidExpression {
        /// What went wrong.
        message: String,
        /// Byte offset in the expression.
        position: usize,
    },

    /// The expression is valid `XPath` 1.0 but outside the supported subset.
    #[error("unsupported XPath feature: {feature}")]
    Unsupported {
        /// The construct that was rejected.
        feature: String,
    },

    /// A function call names no known function.
    #[error("undefined function: {name}()")]
    UndefinedFunction {
        /// The function name.
        name: String,
    },

    /// A function was called with the wrong number of arguments.
    #[error("invalid argument count for {function}(): expected {expected}, found {found}")]
    InvalidArgCount {
        /// The function name.
        function: String,
        /// The accepted argument count, e.g. `1` or `0 or 1`.
        expected: String,
        /// The number of arguments given.
        found: usize,
    },

    /// A value of the wrong type was used where another was required.
    #[error("type error: expected {expected}, found {found}")]
    TypeError {
        /// The required type.
        expected: &'static str,
        /// The actual type.
        found: &'static str,
    },

    /// The context node is not attached to its document.
    #[error("context node is not attached to a document")]
    OrphanedContext,
}
