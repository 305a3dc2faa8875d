//! Builds a [`Document`] from XML 1.0 text.
//!
//! Element content is driven by an explicit stack of open elements, so the
//! depth of the input never translates into native recursion. Productions
//! below the element level live on [`Cursor`].

use crate::error::{ParseError, ParseErrorKind};
use crate::tree::{Document, NodeId, NodeKind};
use crate::util::chars::is_xml_whitespace;

use super::cursor::Cursor;
use super::ParseOptions;

pub(crate) struct TreeBuilder<'a> {
    cursor: Cursor<'a>,
    doc: Document,
    /// Elements whose start tag has been read but not their end tag.
    open: Vec<(NodeId, String)>,
    no_blanks: bool,
    max_attributes: u32,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(text: &'a str, options: &ParseOptions) -> Self {
        Self {
            cursor: Cursor::new(text, options.max_depth, options.max_name_length),
            doc: Document::new(),
            open: Vec::new(),
            no_blanks: options.no_blanks,
            max_attributes: options.max_attributes,
        }
    }

    /// `document ::= prolog element Misc*`
    pub fn build(mut self) -> Result<Document, ParseError> {
        self.prolog()?;

        if self.at_start_tag() {
            self.element_tree()?;
        } else if self.cursor.is_eof() {
            return Err(self
                .cursor
                .error(ParseErrorKind::NoRoot, "no document element found"));
        } else {
            return Err(self
                .cursor
                .syntax_error("unexpected content before document element"));
        }

        self.misc()?;
        if self.cursor.is_eof() {
            Ok(self.doc)
        } else if self.at_start_tag() {
            Err(self.cursor.error(
                ParseErrorKind::MultipleRoots,
                "only one top-level element is allowed",
            ))
        } else {
            Err(self.cursor.syntax_error("content after document element"))
        }
    }

    fn at_start_tag(&self) -> bool {
        self.cursor.byte() == Some(b'<')
            && self
                .cursor
                .byte_at(1)
                .is_some_and(|b| !matches!(b, b'!' | b'?' | b'/'))
    }

    fn at_xml_declaration(&self) -> bool {
        self.cursor.starts_with("<?xml") && self.cursor.byte_at(5).is_some_and(is_xml_whitespace)
    }

    fn prolog(&mut self) -> Result<(), ParseError> {
        if self.at_xml_declaration() {
            let decl = self.cursor.xml_declaration()?;
            self.doc.version = Some(decl.version);
            self.doc.encoding = decl.encoding;
            self.doc.standalone = decl.standalone;
        }
        self.misc()?;
        if self.cursor.starts_with("<!DOCTYPE") {
            self.doctype()?;
            self.misc()?;
        }
        Ok(())
    }

    /// Comments and PIs outside the document element. The whitespace
    /// between them is recorded on the document, not as text nodes.
    fn misc(&mut self) -> Result<(), ParseError> {
        let document = self.doc.root();
        loop {
            let space = self.cursor.whitespace();
            self.doc.record_document_space(space);
            if self.cursor.starts_with("<!--") {
                self.comment(document)?;
            } else if self.at_xml_declaration() {
                return Err(self
                    .cursor
                    .syntax_error("XML declaration must be at the start of the document"));
            } else if self.cursor.starts_with("<?") {
                self.processing_instruction(document)?;
            } else {
                return Ok(());
            }
        }
    }

    // --- Document type declaration ---

    fn doctype(&mut self) -> Result<(), ParseError> {
        self.cursor.require("<!DOCTYPE")?;
        self.cursor.require_ws("after '<!DOCTYPE'")?;
        let name = self.cursor.name()?;
        self.cursor.skip_ws();
        let (public_id, system_id) = self.external_id()?;
        self.cursor.skip_ws();
        let internal_subset = if self.cursor.eat("[") {
            let subset = self.internal_subset()?;
            self.cursor.skip_ws();
            Some(subset)
        } else {
            None
        };
        self.cursor.require(">")?;

        let node = self.doc.create_node(NodeKind::DocumentType {
            name,
            system_id,
            public_id,
            internal_subset,
        });
        let document = self.doc.root();
        self.doc.append_child(document, node);
        Ok(())
    }

    /// Returns `(public_id, system_id)`.
    fn external_id(&mut self) -> Result<(Option<String>, Option<String>), ParseError> {
        if self.cursor.eat("SYSTEM") {
            self.cursor.require_ws("after 'SYSTEM'")?;
            let system = self.cursor.literal()?;
            return Ok((None, Some(system)));
        }
        if self.cursor.eat("PUBLIC") {
            self.cursor.require_ws("after 'PUBLIC'")?;
            let public = self.cursor.literal()?;
            self.cursor.require_ws("between public and system identifiers")?;
            let system = self.cursor.literal()?;
            return Ok((Some(public), Some(system)));
        }
        Ok((None, None))
    }

    /// Copies the internal subset verbatim up to its closing `]`, stepping
    /// over quoted literals and comments so a `]` inside them does not end
    /// it. Declarations are not interpreted.
    fn internal_subset(&mut self) -> Result<String, ParseError> {
        let mut subset = String::new();
        let mut quote: Option<char> = None;
        loop {
            if self.cursor.is_eof() {
                return Err(self.cursor.syntax_error("unexpected end of input in DOCTYPE"));
            }
            if quote.is_none() && self.cursor.starts_with("<!--") {
                let comment = self.cursor.comment()?;
                subset.push_str("<!--");
                subset.push_str(&comment);
                subset.push_str("-->");
                continue;
            }
            let ch = self.cursor.read_char()?;
            match quote {
                None if ch == ']' => return Ok(subset),
                None if matches!(ch, '"' | '\'') => quote = Some(ch),
                Some(q) if q == ch => quote = None,
                _ => {}
            }
            subset.push(ch);
        }
    }

    // --- Elements ---

    /// Reads the document element and everything inside it.
    fn element_tree(&mut self) -> Result<(), ParseError> {
        let document = self.doc.root();
        self.start_tag(document)?;

        while let Some(parent) = self.open.last().map(|(id, _)| *id) {
            if self.cursor.is_eof() {
                let name = self.open.last().map_or("", |(_, name)| name.as_str());
                return Err(self.cursor.syntax_error(format!(
                    "unexpected end of input: element '{name}' is not closed"
                )));
            }
            if self.cursor.starts_with("</") {
                self.end_tag()?;
            } else if self.cursor.starts_with("<!--") {
                self.comment(parent)?;
            } else if self.cursor.starts_with("<![CDATA[") {
                let content = self.cursor.cdata()?;
                let node = self.doc.create_cdata(content);
                self.doc.append_child(parent, node);
            } else if self.cursor.starts_with("<?") {
                self.processing_instruction(parent)?;
            } else if self.cursor.starts_with("<!") {
                return Err(self
                    .cursor
                    .syntax_error("markup declaration not allowed in content"));
            } else if self.cursor.byte() == Some(b'<') {
                self.start_tag(parent)?;
            } else {
                self.char_data(parent)?;
            }
        }
        Ok(())
    }

    /// Reads `<name attrs...>` or `<name attrs.../>` and appends the element
    /// to `parent`. A non-empty element stays open until its end tag.
    fn start_tag(&mut self, parent: NodeId) -> Result<(), ParseError> {
        self.cursor.enter_element()?;
        self.cursor.require("<")?;
        let name = self.cursor.name()?;
        let element = self.doc.create_element(name.as_str());
        self.doc.append_child(parent, element);

        let mut count = 0u32;
        loop {
            let spaced = self.cursor.skip_ws();
            if self.cursor.eat("/>") {
                self.cursor.leave_element();
                return Ok(());
            }
            if self.cursor.eat(">") {
                self.open.push((element, name));
                return Ok(());
            }
            if self.cursor.is_eof() {
                return Err(self.cursor.syntax_error("unexpected end of input in start tag"));
            }
            if !spaced {
                return Err(self.cursor.syntax_error("whitespace required between attributes"));
            }
            count += 1;
            if count > self.max_attributes {
                return Err(self.cursor.limit_error(format!(
                    "too many attributes on element '{name}' (maximum {})",
                    self.max_attributes
                )));
            }
            self.attribute(element)?;
        }
    }

    /// `Attribute ::= Name Eq AttValue`, rejecting repeated names.
    fn attribute(&mut self, element: NodeId) -> Result<(), ParseError> {
        let name = self.cursor.name()?;
        self.cursor.skip_ws();
        self.cursor.require("=")?;
        self.cursor.skip_ws();
        let value = self.cursor.attribute_value()?;
        let repeated = self
            .doc
            .attributes(element)
            .iter()
            .any(|&attr| self.doc.node_name(attr) == Some(name.as_str()));
        if repeated {
            return Err(self.cursor.syntax_error(format!("duplicate attribute: '{name}'")));
        }
        let attr = self.doc.create_attribute(name, value);
        self.doc.push_attribute(element, attr);
        Ok(())
    }

    fn end_tag(&mut self) -> Result<(), ParseError> {
        self.cursor.require("</")?;
        let location = self.cursor.location();
        let found = self.cursor.name()?;
        let Some((_, expected)) = self.open.pop() else {
            return Err(self.cursor.syntax_error(format!("unexpected end tag '</{found}>'")));
        };
        if found != expected {
            return Err(ParseError {
                message: format!("expected '</{expected}>', found '</{found}>'"),
                kind: ParseErrorKind::MismatchedTag { expected, found },
                location,
            });
        }
        self.cursor.skip_ws();
        self.cursor.require(">")?;
        self.cursor.leave_element();
        Ok(())
    }

    // --- Leaf nodes ---

    fn char_data(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let mut text = String::new();
        loop {
            match self.cursor.byte() {
                None | Some(b'<') => break,
                Some(b'&') => text.push(self.cursor.reference()?),
                Some(b']') if self.cursor.starts_with("]]>") => {
                    return Err(self
                        .cursor
                        .syntax_error("']]>' not allowed in character data"));
                }
                Some(_) => text.push(self.cursor.read_char()?),
            }
        }
        if self.no_blanks && text.bytes().all(is_xml_whitespace) {
            return Ok(());
        }
        let node = self.doc.create_text(text);
        self.doc.append_child(parent, node);
        Ok(())
    }

    fn comment(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let content = self.cursor.comment()?;
        let node = self.doc.create_comment(content);
        self.doc.append_child(parent, node);
        Ok(())
    }

    fn processing_instruction(&mut self, parent: NodeId) -> Result<(), ParseError> {
        let (target, data) = self.cursor.processing_instruction()?;
        let node = self.doc.create_processing_instruction(target, data);
        self.doc.append_child(parent, node);
        Ok(())
    }
}
