//! Position-tracking cursor over decoded input.
//!
//! The tree builder is written against [`Cursor`]. It owns the line and
//! column bookkeeping, line-end normalization (XML 1.0 §2.11), reference
//! resolution, and the limits that apply below the element level: nesting
//! depth and name length.
//!
//! Only the five predefined entities and character references are
//! recognized. DTD entities are never expanded and nothing external is
//! loaded.

use crate::error::{ParseError, ParseErrorKind, SourceLocation};
use crate::util::chars::{is_name_char, is_name_start_char, is_xml_char, is_xml_whitespace};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum number of attributes on a single element.
pub(crate) const DEFAULT_MAX_ATTRIBUTES: u32 = 256;

/// Default maximum length (in bytes) of an element or attribute name.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// The pseudo-attributes of an XML declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<bool>,
}

pub(crate) struct Cursor<'a> {
    src: &'a str,
    /// Byte offset into `src`, always on a character boundary.
    offset: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
    max_name_length: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str, max_depth: u32, max_name_length: usize) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth,
            max_name_length,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.offset,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.src.len()
    }

    fn remaining(&self) -> &'a str {
        &self.src[self.offset..]
    }

    pub fn byte(&self) -> Option<u8> {
        self.byte_at(0)
    }

    pub fn byte_at(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.offset + ahead).copied()
    }

    fn current_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    pub fn starts_with(&self, token: &str) -> bool {
        self.remaining().starts_with(token)
    }

    /// Moves past one character. A lone `\r` counts as a line break; the
    /// `\r` of a `\r\n` pair does not.
    fn track(&mut self, ch: char) {
        let newline = ch == '\n' || (ch == '\r' && self.byte_at(1) != Some(b'\n'));
        if newline {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.offset += ch.len_utf8();
    }

    /// Moves past `count` characters without validating them.
    pub fn bump(&mut self, count: usize) {
        for _ in 0..count {
            match self.current_char() {
                Some(ch) => self.track(ch),
                None => return,
            }
        }
    }

    /// Consumes one character, validating it against the `Char` production
    /// and folding `\r\n` and lone `\r` into `\n`.
    pub fn read_char(&mut self) -> Result<char, ParseError> {
        let Some(ch) = self.current_char() else {
            return Err(self.syntax_error("unexpected end of input"));
        };
        if !is_xml_char(ch) {
            return Err(self.syntax_error(format!(
                "invalid XML character: U+{:04X}",
                u32::from(ch)
            )));
        }
        self.track(ch);
        if ch == '\r' {
            if self.byte() == Some(b'\n') {
                self.track('\n');
            }
            return Ok('\n');
        }
        Ok(ch)
    }

    /// Consumes `token` if the input starts with it.
    pub fn eat(&mut self, token: &str) -> bool {
        if self.starts_with(token) {
            self.bump(token.chars().count());
            true
        } else {
            false
        }
    }

    /// Consumes `token` or fails naming what was found instead.
    pub fn require(&mut self, token: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            return Ok(());
        }
        let found = self
            .current_char()
            .map_or_else(|| "end of input".to_string(), |c| format!("'{c}'"));
        Err(self.syntax_error(format!("expected '{token}', found {found}")))
    }

    /// Skips whitespace. Returns `true` if any was consumed.
    pub fn skip_ws(&mut self) -> bool {
        let start = self.offset;
        while let Some(b) = self.byte().filter(|&b| is_xml_whitespace(b)) {
            self.track(char::from(b));
        }
        self.offset > start
    }

    /// Consumes whitespace and returns it as written.
    pub fn whitespace(&mut self) -> &'a str {
        let start = self.offset;
        self.skip_ws();
        &self.src[start..self.offset]
    }

    pub fn require_ws(&mut self, context: &str) -> Result<(), ParseError> {
        if self.skip_ws() {
            Ok(())
        } else {
            Err(self.syntax_error(format!("whitespace required {context}")))
        }
    }

    // --- Nesting ---

    pub fn enter_element(&mut self) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(self.limit_error(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave_element(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // --- Lexical productions ---

    /// `Name ::= NameStartChar (NameChar)*`
    pub fn name(&mut self) -> Result<String, ParseError> {
        let rest = self.remaining();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if is_name_start_char(c) => {}
            Some((_, c)) => {
                return Err(self.syntax_error(format!("invalid name start character: '{c}'")));
            }
            None => return Err(self.syntax_error("expected a name, found end of input")),
        }
        let len = chars
            .find(|&(_, c)| !is_name_char(c))
            .map_or(rest.len(), |(i, _)| i);
        if len > self.max_name_length {
            return Err(self.limit_error(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            )));
        }
        let name = &rest[..len];
        self.bump(name.chars().count());
        Ok(name.to_owned())
    }

    /// Resolves `&name;`, `&#N;` or `&#xH;` to the character it stands for.
    pub fn reference(&mut self) -> Result<char, ParseError> {
        self.require("&")?;
        if self.eat("#") {
            return self.char_reference();
        }
        let name = self.name()?;
        self.require(";")?;
        predefined_entity(&name)
            .ok_or_else(|| self.syntax_error(format!("unknown entity reference: &{name};")))
    }

    fn char_reference(&mut self) -> Result<char, ParseError> {
        let hex = self.eat("x");
        let digits_len = self
            .remaining()
            .bytes()
            .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
            .count();
        let digits = &self.remaining()[..digits_len];
        if digits.is_empty() {
            return Err(self.syntax_error("empty character reference"));
        }
        let code = u32::from_str_radix(digits, if hex { 16 } else { 10 }).ok();
        self.bump(digits_len);
        self.require(";")?;
        code.and_then(char::from_u32)
            .filter(|&c| is_xml_char(c))
            .ok_or_else(|| {
                let marker = if hex { "x" } else { "" };
                self.syntax_error(format!(
                    "character reference &#{marker}{digits}; is not a legal XML character"
                ))
            })
    }

    fn open_quote(&mut self) -> Result<u8, ParseError> {
        match self.byte() {
            Some(quote @ (b'"' | b'\'')) => {
                self.bump(1);
                Ok(quote)
            }
            _ => Err(self.syntax_error("expected a quoted value")),
        }
    }

    /// Reads a quoted attribute value, resolving references and turning
    /// literal tabs and line breaks into spaces (XML 1.0 §3.3.3). The same
    /// characters written as references are kept.
    pub fn attribute_value(&mut self) -> Result<String, ParseError> {
        let quote = self.open_quote()?;
        let mut value = String::new();
        loop {
            match self.byte() {
                None => return Err(self.syntax_error("unexpected end of input in attribute value")),
                Some(b) if b == quote => {
                    self.bump(1);
                    return Ok(value);
                }
                Some(b'&') => value.push(self.reference()?),
                Some(b'<') => return Err(self.syntax_error("'<' not allowed in attribute values")),
                Some(_) => {
                    let ch = self.read_char()?;
                    value.push(if matches!(ch, '\n' | '\t') { ' ' } else { ch });
                }
            }
        }
    }

    /// Reads a quoted literal verbatim (system and public identifiers,
    /// declaration pseudo-attributes).
    pub fn literal(&mut self) -> Result<String, ParseError> {
        let quote = char::from(self.open_quote()?);
        let rest = self.remaining();
        let Some(len) = rest.find(quote) else {
            return Err(self.syntax_error("unterminated quoted value"));
        };
        let value = &rest[..len];
        self.bump(value.chars().count() + 1);
        Ok(value.to_owned())
    }

    /// Reads characters up to and including `terminator`, returning the text
    /// before it.
    pub fn text_until(&mut self, terminator: &str, context: &str) -> Result<String, ParseError> {
        let mut content = String::new();
        while !self.eat(terminator) {
            if self.is_eof() {
                return Err(self.syntax_error(format!("unexpected end of input in {context}")));
            }
            content.push(self.read_char()?);
        }
        Ok(content)
    }

    // --- Markup ---

    /// `Comment ::= '<!--' ((Char - '-') | ('-' (Char - '-')))* '-->'`
    pub fn comment(&mut self) -> Result<String, ParseError> {
        self.require("<!--")?;
        let mut content = String::new();
        loop {
            if self.eat("-->") {
                return Ok(content);
            }
            if self.starts_with("--") {
                return Err(self.syntax_error("'--' not allowed inside comments"));
            }
            if self.is_eof() {
                return Err(self.syntax_error("unexpected end of input in comment"));
            }
            content.push(self.read_char()?);
        }
    }

    pub fn cdata(&mut self) -> Result<String, ParseError> {
        self.require("<![CDATA[")?;
        self.text_until("]]>", "CDATA section")
    }

    /// Returns the target and, if non-empty, the data of `<?target data?>`.
    pub fn processing_instruction(&mut self) -> Result<(String, Option<String>), ParseError> {
        self.require("<?")?;
        let target = self.name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.syntax_error("processing instruction target 'xml' is reserved"));
        }
        if self.eat("?>") {
            return Ok((target, None));
        }
        self.require_ws("after processing instruction target")?;
        let data = self.text_until("?>", "processing instruction")?;
        Ok((target, (!data.is_empty()).then_some(data)))
    }

    /// `XMLDecl ::= '<?xml' VersionInfo EncodingDecl? SDDecl? S? '?>'`
    pub fn xml_declaration(&mut self) -> Result<XmlDeclaration, ParseError> {
        self.require("<?xml")?;
        self.require_ws("in XML declaration")?;

        let version = self.pseudo_attribute("version")?;
        if !is_version_num(&version) {
            return Err(self.syntax_error(format!("invalid version number: '{version}'")));
        }
        let mut decl = XmlDeclaration {
            version,
            encoding: None,
            standalone: None,
        };

        let mut spaced = self.skip_ws();
        if spaced && self.starts_with("encoding") {
            let label = self.pseudo_attribute("encoding")?;
            if !is_enc_name(&label) {
                return Err(self.syntax_error(format!("invalid encoding name: '{label}'")));
            }
            decl.encoding = Some(label);
            spaced = self.skip_ws();
        }
        if spaced && self.starts_with("standalone") {
            decl.standalone = Some(match self.pseudo_attribute("standalone")?.as_str() {
                "yes" => true,
                "no" => false,
                _ => return Err(self.syntax_error("standalone must be 'yes' or 'no'")),
            });
            self.skip_ws();
        }
        self.require("?>")?;
        Ok(decl)
    }

    fn pseudo_attribute(&mut self, name: &str) -> Result<String, ParseError> {
        self.require(name)?;
        self.skip_ws();
        self.require("=")?;
        self.skip_ws();
        self.literal()
    }

    // --- Errors ---

    pub fn syntax_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::syntax(message, self.location())
    }

    pub fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        ParseError {
            kind,
            message: message.into(),
            location: self.location(),
        }
    }

    pub fn limit_error(&self, message: impl Into<String>) -> ParseError {
        self.error(ParseErrorKind::LimitExceeded, message)
    }
}

fn predefined_entity(name: &str) -> Option<char> {
    Some(match name {
        "lt" => '<',
        "gt" => '>',
        "amp" => '&',
        "apos" => '\'',
        "quot" => '"',
        _ => return None,
    })
}

/// `VersionNum ::= '1.' [0-9]+`
fn is_version_num(s: &str) -> bool {
    s.strip_prefix("1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// `EncName ::= [A-Za-z] ([A-Za-z0-9._] | '-')*`
fn is_enc_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
