//! `XPath` expression parser.
//!
//! A recursive descent parser over the lexer's token stream. Precedence,
//! lowest first:
//!
//! 1. `or`
//! 2. `and`
//! 3. `=`, `!=`
//! 4. `<`, `<=`, `>`, `>=`
//! 5. `|`
//! 6. path and filter expressions
//!
//! Arithmetic, variables, and the `following`, `preceding`, and `namespace`
//! axes are recognized and rejected with [`XPathError::Unsupported`].

use super::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use super::eval::check_function;
use super::lexer::{Lexer, SpannedToken, Token};
use super::types::XPathError;

/// Axes of `XPath` 1.0 outside the supported subset.
const UNSUPPORTED_AXES: &[&str] = &["following", "preceding", "namespace"];

/// Deepest nesting accepted, counting parenthesized, argument and predicate
/// expressions as well as each operator in a chain. Parsing, evaluation and
/// dropping of the AST all recurse along this depth.
pub const MAX_NESTING: u32 = 128;

/// Parses an expression into an AST.
///
/// Function names and arities are checked here, so a compiled expression
/// only fails at evaluation time on type errors or an orphaned context.
///
/// # Errors
///
/// Returns [`XPathError`] if the expression is malformed or uses syntax
/// outside the supported subset.
///
/// # Examples
///
/// ```
/// use jebixml::xpath::parser::parse;
///
/// assert!(parse("//item[@id='a']/text()").is_ok());
/// assert!(parse("//item[").is_err());
/// ```
pub fn parse(input: &str) -> Result<Expr, XPathError> {
    let tokens = Lexer::new(input).tokenize()?;
    if tokens.is_empty() {
        return Err(XPathError::InvalidExpression {
            message: "empty XPath expression".to_string(),
            position: 0,
        });
    }

    let mut parser = ExprParser {
        tokens,
        pos: 0,
        end: input.len(),
        depth: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        Some(token) => Err(parser.error(format!("unexpected token '{token}' after expression"))),
        None => Ok(expr),
    }
}

/// Binding levels of the binary operators, loosest first. Level
/// [`OPERAND_LEVEL`] is a union expression.
fn binary_op(token: &Token, level: u8) -> Option<BinaryOp> {
    Some(match (level, token) {
        (0, Token::Or) => BinaryOp::Or,
        (1, Token::And) => BinaryOp::And,
        (2, Token::Equal) => BinaryOp::Eq,
        (2, Token::NotEqual) => BinaryOp::Neq,
        (3, Token::LessThan) => BinaryOp::Lt,
        (3, Token::LessThanEqual) => BinaryOp::Lte,
        (3, Token::GreaterThan) => BinaryOp::Gt,
        (3, Token::GreaterThanEqual) => BinaryOp::Gte,
        _ => return None,
    })
}

const OPERAND_LEVEL: u8 = 4;

struct ExprParser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    /// Length of the input, reported as the offset of errors at the end.
    end: usize,
    depth: u32,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Consumes the current token if `pick` maps it to a value.
    fn take<T>(&mut self, pick: impl FnOnce(&Token) -> Option<T>) -> Option<T> {
        let value = self.peek().and_then(pick)?;
        self.pos += 1;
        Some(value)
    }

    fn eat(&mut self, token: &Token) -> bool {
        self.take(|t| (t == token).then_some(())).is_some()
    }

    fn expect(&mut self, token: &Token) -> Result<(), XPathError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{token}'")))
        }
    }

    fn unexpected(&self, wanted: &str) -> XPathError {
        let found = self
            .peek()
            .map_or_else(|| "end of expression".to_string(), |t| format!("'{t}'"));
        self.error(format!("expected {wanted}, found {found}"))
    }

    fn error(&self, message: String) -> XPathError {
        XPathError::InvalidExpression {
            message,
            position: self.tokens.get(self.pos).map_or(self.end, |t| t.offset),
        }
    }

    fn enter(&mut self) -> Result<(), XPathError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!(
                "expression nested too deeply (maximum {MAX_NESTING})"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr, XPathError> {
        let depth = self.depth;
        self.enter()?;
        let expr = self.binary(0)?;
        self.depth = depth;
        Ok(expr)
    }

    /// Left-associative binary expressions at `level` and tighter.
    fn binary(&mut self, level: u8) -> Result<Expr, XPathError> {
        if level == OPERAND_LEVEL {
            return self.operand();
        }
        let depth = self.depth;
        let mut left = self.binary(level + 1)?;
        while let Some(op) = self.take(|t| binary_op(t, level)) {
            self.enter()?;
            let right = self.binary(level + 1)?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.depth = depth;
        Ok(left)
    }

    /// A union expression with arithmetic rejected on either side.
    fn operand(&mut self) -> Result<Expr, XPathError> {
        self.reject_arithmetic()?;
        let depth = self.depth;
        let mut expr = self.path()?;
        while self.eat(&Token::Pipe) {
            self.enter()?;
            let right = self.path()?;
            expr = Expr::Union(Box::new(expr), Box::new(right));
        }
        self.depth = depth;
        self.reject_arithmetic()?;
        Ok(expr)
    }

    fn reject_arithmetic(&self) -> Result<(), XPathError> {
        match self.peek() {
            Some(op @ (Token::Plus | Token::Minus | Token::Star | Token::Div | Token::Mod)) => {
                Err(XPathError::Unsupported {
                    feature: format!("arithmetic operator '{op}'"),
                })
            }
            _ => Ok(()),
        }
    }

    /// ```text
    /// PathExpr ::= LocationPath
    ///            | FilterExpr (('/' | '//') RelativeLocationPath)?
    /// ```
    fn path(&mut self) -> Result<Expr, XPathError> {
        if self.eat(&Token::Slash) {
            let steps = if self.at_step() {
                self.relative_steps(Vec::new())?
            } else {
                Vec::new()
            };
            return Ok(Expr::RootPath { steps });
        }
        if self.eat(&Token::DoubleSlash) {
            let steps = self.relative_steps(vec![descendant_or_self()])?;
            return Ok(Expr::RootPath { steps });
        }
        if self.at_step() {
            let steps = self.relative_steps(Vec::new())?;
            return Ok(Expr::Path { steps });
        }

        let base = self.primary()?;
        let predicates = self.predicates()?;
        let base = if predicates.is_empty() {
            base
        } else {
            Expr::Filter {
                expr: Box::new(base),
                predicates,
            }
        };
        let steps = if self.eat(&Token::DoubleSlash) {
            vec![descendant_or_self()]
        } else if self.eat(&Token::Slash) {
            Vec::new()
        } else {
            return Ok(base);
        };
        Ok(Expr::FilterPath {
            base: Box::new(base),
            steps: self.relative_steps(steps)?,
        })
    }

    fn primary(&mut self) -> Result<Expr, XPathError> {
        match self.peek().cloned() {
            Some(Token::VariableReference(name)) => Err(XPathError::Unsupported {
                feature: format!("variable reference ${name}"),
            }),
            Some(Token::Literal(value)) => {
                self.pos += 1;
                Ok(Expr::String(value))
            }
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(Expr::Number(value))
            }
            Some(Token::LeftParen) => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(&Token::RightParen)?;
                Ok(inner)
            }
            Some(Token::FunctionName(name)) => {
                self.pos += 1;
                self.function_call(name)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn function_call(&mut self, name: String) -> Result<Expr, XPathError> {
        self.expect(&Token::LeftParen)?;
        let mut args = Vec::new();
        if !self.eat(&Token::RightParen) {
            loop {
                args.push(self.expr()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RightParen)?;
        }
        check_function(&name, args.len())?;
        Ok(Expr::FunctionCall { name, args })
    }

    /// Appends `step (('/' | '//') step)*` to `steps`.
    fn relative_steps(&mut self, mut steps: Vec<Step>) -> Result<Vec<Step>, XPathError> {
        loop {
            steps.push(self.step()?);
            if self.eat(&Token::DoubleSlash) {
                steps.push(descendant_or_self());
            } else if !self.eat(&Token::Slash) {
                return Ok(steps);
            }
        }
    }

    fn at_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Dot
                    | Token::DotDot
                    | Token::At
                    | Token::Name(_)
                    | Token::NodeType(_)
                    | Token::AxisName(_)
            )
        )
    }

    fn step(&mut self) -> Result<Step, XPathError> {
        if self.eat(&Token::Dot) {
            return Ok(Step::new(Axis::Self_, NodeTest::Node));
        }
        if self.eat(&Token::DotDot) {
            return Ok(Step::new(Axis::Parent, NodeTest::Node));
        }
        let mut step = Step::new(self.axis()?, self.node_test()?);
        step.predicates = self.predicates()?;
        Ok(step)
    }

    /// Reads `@` or `name::`; anything else means the child axis.
    fn axis(&mut self) -> Result<Axis, XPathError> {
        if self.eat(&Token::At) {
            return Ok(Axis::Attribute);
        }
        let Some(Token::AxisName(name)) = self.peek() else {
            return Ok(Axis::Child);
        };
        if let Some(axis) = Axis::parse(name) {
            // The lexer emits the `::` as its own token.
            self.pos += 2;
            return Ok(axis);
        }
        if UNSUPPORTED_AXES.contains(&name.as_str()) {
            return Err(XPathError::Unsupported {
                feature: format!("{name} axis"),
            });
        }
        Err(self.error(format!("unknown axis '{name}'")))
    }

    fn node_test(&mut self) -> Result<NodeTest, XPathError> {
        if let Some(name) = self.take(|t| match t {
            Token::Name(name) => Some(name.clone()),
            _ => None,
        }) {
            if name == "*" {
                return Ok(NodeTest::Wildcard);
            }
            if let Some(prefix) = name.strip_suffix(":*") {
                return Ok(NodeTest::PrefixWildcard(prefix.to_string()));
            }
            return Ok(NodeTest::Name(name));
        }

        let Some(kind) = self.take(|t| match t {
            Token::NodeType(kind) => Some(kind.clone()),
            _ => None,
        }) else {
            return Err(self.unexpected("a node test"));
        };
        self.expect(&Token::LeftParen)?;
        let test = match kind.as_str() {
            "node" => NodeTest::Node,
            "text" => NodeTest::Text,
            "comment" => NodeTest::Comment,
            _ => NodeTest::ProcessingInstruction(self.take(|t| match t {
                Token::Literal(target) => Some(target.clone()),
                _ => None,
            })),
        };
        self.expect(&Token::RightParen)?;
        Ok(test)
    }

    fn predicates(&mut self) -> Result<Vec<Expr>, XPathError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LeftBracket) {
            predicates.push(self.expr()?);
            self.expect(&Token::RightBracket)?;
        }
        Ok(predicates)
    }
}

fn descendant_or_self() -> Step {
    Step::new(Axis::DescendantOrSelf, NodeTest::Node)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(input: &str) -> Expr {
        parse(input).unwrap()
    }

    fn child(name: &str) -> Step {
        Step::new(Axis::Child, NodeTest::Name(name.to_string()))
    }

    #[test]
    fn test_parse_root_only() {
        assert_eq!(p("/"), Expr::RootPath { steps: vec![] });
    }

    #[test]
    fn test_parse_root_wildcard() {
        assert_eq!(
            p("/*"),
            Expr::RootPath {
                steps: vec![Step::new(Axis::Child, NodeTest::Wildcard)]
            }
        );
    }

    #[test]
    fn test_parse_descendant_text() {
        assert_eq!(
            p("//text()"),
            Expr::RootPath {
                steps: vec![
                    Step::new(Axis::DescendantOrSelf, NodeTest::Node),
                    Step::new(Axis::Child, NodeTest::Text),
                ]
            }
        );
    }

    #[test]
    fn test_parse_relative_path_with_abbreviations() {
        assert_eq!(
            p("../a//b/."),
            Expr::Path {
                steps: vec![
                    Step::new(Axis::Parent, NodeTest::Node),
                    child("a"),
                    Step::new(Axis::DescendantOrSelf, NodeTest::Node),
                    child("b"),
                    Step::new(Axis::Self_, NodeTest::Node),
                ]
            }
        );
    }

    #[test]
    fn test_parse_attribute_equality_predicate() {
        let mut step = child("item");
        step.predicates.push(Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: Box::new(Expr::Path {
                steps: vec![Step::new(Axis::Attribute, NodeTest::Name("id".to_string()))],
            }),
            right: Box::new(Expr::String("a".to_string())),
        });
        assert_eq!(p("item[@id='a']"), Expr::Path { steps: vec![step] });
    }

    #[test]
    fn test_parse_explicit_axes() {
        let Expr::Path { steps } = p("ancestor-or-self::node()/preceding-sibling::x:*") else {
            panic!("expected relative path");
        };
        assert_eq!(steps[0].axis, Axis::AncestorOrSelf);
        assert_eq!(steps[0].node_test, NodeTest::Node);
        assert_eq!(steps[1].axis, Axis::PrecedingSibling);
        assert_eq!(steps[1].node_test, NodeTest::PrefixWildcard("x".to_string()));
    }

    #[test]
    fn test_parse_processing_instruction_target() {
        let Expr::Path { steps } = p("processing-instruction('style')") else {
            panic!("expected relative path");
        };
        assert_eq!(
            steps[0].node_test,
            NodeTest::ProcessingInstruction(Some("style".to_string()))
        );
    }

    #[test]
    fn test_parse_precedence() {
        let expr = p("a = 'x' or b and c");
        let Expr::BinaryOp { op, right, .. } = expr else {
            panic!("expected binary op");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(*right, Expr::BinaryOp { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_parse_filter_and_filter_path() {
        assert!(matches!(p("(//a)[1]"), Expr::Filter { .. }));
        assert!(matches!(p("(a | b)/c"), Expr::FilterPath { .. }));
    }

    #[test]
    fn test_parse_union() {
        assert!(matches!(p("a | b | c"), Expr::Union(..)));
    }

    #[test]
    fn test_parse_errors() {
        for input in ["", "   ", "/a[", "a/", "child::", "a[]", "a b", "(a", "@"] {
            assert!(
                matches!(parse(input), Err(XPathError::InvalidExpression { .. })),
                "expected invalid expression for {input:?}"
            );
        }
    }

    #[test]
    fn test_error_position_points_at_token() {
        assert_eq!(
            parse("/a ]"),
            Err(XPathError::InvalidExpression {
                message: "unexpected token ']' after expression".to_string(),
                position: 3,
            })
        );
    }

    #[test]
    fn test_unknown_axis_is_invalid() {
        assert!(matches!(
            parse("sideways::a"),
            Err(XPathError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_unsupported_constructs() {
        for input in ["following::a", "namespace::*", "$x", "1 + 2", "-1", "a * 2", "3 div 4"] {
            assert!(
                matches!(parse(input), Err(XPathError::Unsupported { .. })),
                "expected unsupported for {input:?}"
            );
        }
    }

    #[test]
    fn test_function_checks() {
        assert_eq!(
            parse("frobnicate(1)"),
            Err(XPathError::UndefinedFunction {
                name: "frobnicate".to_string()
            })
        );
        assert_eq!(
            parse("count()"),
            Err(XPathError::InvalidArgCount {
                function: "count".to_string(),
                expected: "1".to_string(),
                found: 0,
            })
        );
        assert!(parse("name()").is_ok());
        assert!(parse("name(.)").is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert!(parse(&nested(MAX_NESTING as usize - 1)).is_ok());
        assert!(matches!(
            parse(&nested(200_000)),
            Err(XPathError::InvalidExpression { .. })
        ));

        let chain = vec!["1"; MAX_NESTING as usize + 2].join(" = ");
        assert!(matches!(parse(&chain), Err(XPathError::InvalidExpression { .. })));
        let union = vec!["a"; MAX_NESTING as usize + 2].join(" | ");
        assert!(matches!(parse(&union), Err(XPathError::InvalidExpression { .. })));
        assert!(parse("a | b | c = 1 or (d and e[f = (1)])").is_ok());
    }
}
