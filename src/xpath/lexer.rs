//! `XPath` expression tokenizer.
//!
//! Names are read raw and reclassified in a second pass, following the
//! `XPath` 1.0 disambiguation rules (section 3.7):
//!
//! - `*` and the names `and`, `or`, `div`, `mod` are operators when the
//!   preceding token can end an operand.
//! - A name followed by `(` is a function name or node type test.
//! - A name followed by `::` is an axis name.

use std::fmt;

use super::types::XPathError;
use crate::util::chars::{is_name_char, is_name_start_char};

const NODE_TYPE_NAMES: &[&str] = &["comment", "text", "processing-instruction", "node"];

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `@`
    At,
    /// `,`
    Comma,
    /// `::`
    ColonColon,
    /// `/`
    Slash,
    /// `//`
    DoubleSlash,
    /// `|`
    Pipe,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*` in operator position.
    Star,
    /// `=`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,
    /// `and`
    And,
    /// `or`
    Or,
    /// `mod`
    Mod,
    /// `div`
    Div,
    /// A numeric literal.
    Number(f64),
    /// A quoted string literal, without its quotes.
    Literal(String),
    /// A name test: `foo`, `p:foo`, `*` or `p:*`.
    Name(String),
    /// `$name`, without the `$`.
    VariableReference(String),
    /// A name followed by `(`.
    FunctionName(String),
    /// `node`, `text`, `comment` or `processing-instruction` followed by `(`.
    NodeType(String),
    /// A name followed by `::`.
    AxisName(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeftParen => f.write_str("("),
            Self::RightParen => f.write_str(")"),
            Self::LeftBracket => f.write_str("["),
            Self::RightBracket => f.write_str("]"),
            Self::Dot => f.write_str("."),
            Self::DotDot => f.write_str(".."),
            Self::At => f.write_str("@"),
            Self::Comma => f.write_str(","),
            Self::ColonColon => f.write_str("::"),
            Self::Slash => f.write_str("/"),
            Self::DoubleSlash => f.write_str("//"),
            Self::Pipe => f.write_str("|"),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Star => f.write_str("*"),
            Self::Equal => f.write_str("="),
            Self::NotEqual => f.write_str("!="),
            Self::LessThan => f.write_str("<"),
            Self::LessThanEqual => f.write_str("<="),
            Self::GreaterThan => f.write_str(">"),
            Self::GreaterThanEqual => f.write_str(">="),
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
            Self::Mod => f.write_str("mod"),
            Self::Div => f.write_str("div"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Literal(s) => write!(f, "\"{s}\""),
            Self::Name(s) | Self::FunctionName(s) | Self::NodeType(s) | Self::AxisName(s) => {
                f.write_str(s)
            }
            Self::VariableReference(s) => write!(f, "${s}"),
        }
    }
}

/// A token with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Byte offset in the expression.
    pub offset: usize,
}

/// `XPath` expression tokenizer.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over an expression.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Tokenizes the whole expression.
    ///
    /// # Errors
    ///
    /// Returns [`XPathError::InvalidExpression`] for an unexpected character
    /// or an unterminated literal.
    pub fn tokenize(&mut self) -> Result<Vec<SpannedToken>, XPathError> {
        let mut tokens: Vec<SpannedToken> = Vec::new();
        loop {
            self.skip_whitespace();
            let offset = self.pos;
            let Some(ch) = self.peek_char() else {
                break;
            };
            let token = self.next_raw_token(ch)?;
            tokens.push(SpannedToken { token, offset });
        }
        disambiguate(&mut tokens);
        Ok(tokens)
    }

    fn next_raw_token(&mut self, ch: char) -> Result<Token, XPathError> {
        let single = match ch {
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            '@' => Some(Token::At),
            ',' => Some(Token::Comma),
            '|' => Some(Token::Pipe),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '=' => Some(Token::Equal),
            '*' => Some(Token::Star),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(token);
        }

        match ch {
            '.' => self.read_dot_or_number(),
            '/' => Ok(self.read_pair('/', Token::Slash, Token::DoubleSlash)),
            '<' => Ok(self.read_pair('=', Token::LessThan, Token::LessThanEqual)),
            '>' => Ok(self.read_pair('=', Token::GreaterThan, Token::GreaterThanEqual)),
            '!' => {
                let start = self.pos;
                self.pos += 1;
                if self.eat('=') {
                    Ok(Token::NotEqual)
                } else {
                    Err(make_error(start, "expected '=' after '!'"))
                }
            }
            ':' => {
                let start = self.pos;
                self.pos += 1;
                if self.eat(':') {
                    Ok(Token::ColonColon)
                } else {
                    Err(make_error(start, "expected ':' after ':'"))
                }
            }
            '"' | '\'' => self.read_string_literal(ch),
            '$' => {
                let start = self.pos;
                self.pos += 1;
                if !self.peek_char().is_some_and(is_ncname_start) {
                    return Err(make_error(start, "expected name after '$'"));
                }
                Ok(Token::VariableReference(self.read_qname().to_string()))
            }
            '0'..='9' => self.read_number(),
            _ if is_ncname_start(ch) => Ok(self.read_name()),
            _ => Err(self.error(&format!("unexpected character '{ch}'"))),
        }
    }

    fn read_pair(&mut self, second: char, one: Token, two: Token) -> Token {
        self.pos += 1;
        if self.eat(second) {
            two
        } else {
            one
        }
    }

    fn read_dot_or_number(&mut self) -> Result<Token, XPathError> {
        let start = self.pos;
        self.pos += 1;
        if self.eat('.') {
            return Ok(Token::DotDot);
        }
        if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_while(|c| c.is_ascii_digit());
            return self.number_from(start);
        }
        Ok(Token::Dot)
    }

    fn read_number(&mut self) -> Result<Token, XPathError> {
        let start = self.pos;
        self.advance_while(|c| c.is_ascii_digit());
        if self.eat('.') {
            self.advance_while(|c| c.is_ascii_digit());
        }
        self.number_from(start)
    }

    fn number_from(&self, start: usize) -> Result<Token, XPathError> {
        let text = &self.input[start..self.pos];
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| make_error(start, &format!("invalid number literal: {text}")))
    }

    fn read_string_literal(&mut self, quote: char) -> Result<Token, XPathError> {
        let start = self.pos;
        self.pos += quote.len_utf8();
        let content_start = self.pos;
        self.advance_while(|c| c != quote);
        if self.pos >= self.input.len() {
            return Err(make_error(start, "unterminated string literal"));
        }
        let content = self.input[content_start..self.pos].to_string();
        self.pos += quote.len_utf8();
        Ok(Token::Literal(content))
    }

    /// Reads a name test: an `NCName`, a `QName`, or `prefix:*`.
    ///
    /// A colon followed by another colon is left alone so that `child::x`
    /// lexes as an axis name.
    fn read_name(&mut self) -> Token {
        let start = self.pos;
        self.advance_while(is_ncname_char);
        let rest = &self.input[self.pos..];
        if rest.starts_with(":*") {
            self.pos += 2;
        } else if rest.starts_with(':')
            && rest[1..].chars().next().is_some_and(is_ncname_start)
        {
            self.pos += 1;
            self.advance_while(is_ncname_char);
        }
        Token::Name(self.input[start..self.pos].to_string())
    }

    fn read_qname(&mut self) -> &'a str {
        let input = self.input;
        let start = self.pos;
        self.advance_while(is_ncname_char);
        let rest = &input[self.pos..];
        if rest.starts_with(':') && rest[1..].chars().next().is_some_and(is_ncname_start) {
            self.pos += 1;
            self.advance_while(is_ncname_char);
        }
        &input[start..self.pos]
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        self.advance_while(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    }

    fn error(&self, message: &str) -> XPathError {
        make_error(self.pos, message)
    }
}

fn make_error(position: usize, message: &str) -> XPathError {
    XPathError::InvalidExpression {
        message: message.to_string(),
        position,
    }
}

fn is_ncname_start(c: char) -> bool {
    c != ':' && is_name_start_char(c)
}

fn is_ncname_char(c: char) -> bool {
    c != ':' && is_name_char(c)
}

/// Reclassifies raw `*` and name tokens by their neighbours.
fn disambiguate(tokens: &mut [SpannedToken]) {
    for i in 0..tokens.len() {
        let after_operand = i > 0 && is_operand_ending(&tokens[i - 1].token);
        let next_is_paren = matches!(tokens.get(i + 1), Some(t) if t.token == Token::LeftParen);
        let next_is_axis_sep = matches!(tokens.get(i + 1), Some(t) if t.token == Token::ColonColon);

        let replacement = match &tokens[i].token {
            Token::Star if !after_operand => Some(Token::Name("*".to_string())),
            Token::Name(name) if after_operand => match name.as_str() {
                "and" => Some(Token::And),
                "or" => Some(Token::Or),
                "mod" => Some(Token::Mod),
                "div" => Some(Token::Div),
                _ => None,
            },
            Token::Name(name) if next_is_paren => {
                if NODE_TYPE_NAMES.contains(&name.as_str()) {
                    Some(Token::NodeType(name.clone()))
                } else {
                    Some(Token::FunctionName(name.clone()))
                }
            }
            Token::Name(name) if next_is_axis_sep => Some(Token::AxisName(name.clone())),
            _ => None,
        };
        if let Some(token) = replacement {
            tokens[i].token = token;
        }
    }
}

/// Returns `true` if the token can end an operand, making a following `*`
/// or operator name an operator.
fn is_operand_ending(token: &Token) -> bool {
    matches!(
        token,
        Token::RightParen
            | Token::RightBracket
            | Token::Dot
            | Token::DotDot
            | Token::Number(_)
            | Token::Literal(_)
            | Token::Name(_)
            | Token::VariableReference(_)
    )
}
