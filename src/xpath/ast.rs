//! Abstract syntax tree for compiled `XPath` expressions.
//!
//! Location paths are sequences of [`Step`]s, each an [`Axis`], a
//! [`NodeTest`], and zero or more predicates.

use std::fmt;

/// A compiled `XPath` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A numeric literal.
    Number(f64),

    /// A string literal.
    String(String),

    /// A comparison or logical operation.
    BinaryOp {
        /// The operator.
        op: BinaryOp,
        /// The left operand.
        left: Box<Expr>,
        /// The right operand.
        right: Box<Expr>,
    },

    /// A function call such as `contains(., 'x')`.
    FunctionCall {
        /// The function name.
        name: String,
        /// The argument expressions.
        args: Vec<Expr>,
    },

    /// A relative location path evaluated from the context node.
    Path {
        /// The steps, applied left to right.
        steps: Vec<Step>,
    },

    /// An absolute location path evaluated from the document node.
    ///
    /// Empty `steps` is the bare `/`.
    RootPath {
        /// The steps following the leading `/`.
        steps: Vec<Step>,
    },

    /// A primary expression filtered by predicates, e.g. `(//a)[1]`.
    Filter {
        /// The filtered expression. Must yield a node-set.
        expr: Box<Expr>,
        /// The predicates.
        predicates: Vec<Expr>,
    },

    /// A primary expression followed by further steps, e.g. `(a|b)/c`.
    FilterPath {
        /// The expression producing the starting node-set.
        base: Box<Expr>,
        /// The steps applied to each node of `base`.
        steps: Vec<Step>,
    },

    /// The union `a | b`.
    Union(Box<Expr>, Box<Expr>),
}

/// A comparison or logical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `and`
    And,
    /// `or`
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "and",
            Self::Or => "or",
        })
    }
}

/// A single location step, e.g. `child::item[@id='a']`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// The axis to walk.
    pub axis: Axis,
    /// The test each candidate must pass.
    pub node_test: NodeTest,
    /// Predicates, applied in order with positions along the axis.
    pub predicates: Vec<Expr>,
}

impl Step {
    pub(crate) fn new(axis: Axis, node_test: NodeTest) -> Self {
        Self {
            axis,
            node_test,
            predicates: Vec::new(),
        }
    }
}

/// A supported axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Direct children.
    Child,
    /// All descendants, attributes excluded.
    Descendant,
    /// The context node and its descendants.
    DescendantOrSelf,
    /// The context node.
    Self_,
    /// The parent. For an attribute this is its element.
    Parent,
    /// All ancestors, nearest first.
    Ancestor,
    /// The context node and its ancestors.
    AncestorOrSelf,
    /// Attributes of an element.
    Attribute,
    /// Later siblings.
    FollowingSibling,
    /// Earlier siblings, nearest first.
    PrecedingSibling,
}

impl Axis {
    /// Returns the axis name as written in `XPath`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::DescendantOrSelf => "descendant-or-self",
            Self::Self_ => "self",
            Self::Parent => "parent",
            Self::Ancestor => "ancestor",
            Self::AncestorOrSelf => "ancestor-or-self",
            Self::Attribute => "attribute",
            Self::FollowingSibling => "following-sibling",
            Self::PrecedingSibling => "preceding-sibling",
        }
    }

    /// Parses a supported axis name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Self::Child),
            "descendant" => Some(Self::Descendant),
            "descendant-or-self" => Some(Self::DescendantOrSelf),
            "self" => Some(Self::Self_),
            "parent" => Some(Self::Parent),
            "ancestor" => Some(Self::Ancestor),
            "ancestor-or-self" => Some(Self::AncestorOrSelf),
            "attribute" => Some(Self::Attribute),
            "following-sibling" => Some(Self::FollowingSibling),
            "preceding-sibling" => Some(Self::PrecedingSibling),
            _ => None,
        }
    }

    /// Returns `true` for axes whose proximity order runs backwards through
    /// the document.
    #[must_use]
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Self::Ancestor | Self::AncestorOrSelf | Self::PrecedingSibling
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A qualified name, compared literally against the node name.
    Name(String),
    /// `*`: any node of the axis' principal type.
    Wildcard,
    /// `prefix:*`: any principal node whose name carries `prefix`.
    PrefixWildcard(String),
    /// `node()`
    Node,
    /// `text()`, which also matches CDATA sections.
    Text,
    /// `comment()`
    Comment,
    /// `processing-instruction()` with an optional target literal.
    ProcessingInstruction(Option<String>),
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Wildcard => f.write_str("*"),
            Self::PrefixWildcard(prefix) => write!(f, "{prefix}:*"),
            Self::Node => f.write_str("node()"),
            Self::Text => f.write_str("text()"),
            Self::Comment => f.write_str("comment()"),
            Self::ProcessingInstruction(None) => f.write_str("processing-instruction()"),
            Self::ProcessingInstruction(Some(target)) => {
                write!(f, "processing-instruction('{target}')")
            }
        }
    }
}
