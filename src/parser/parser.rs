//! Recursive descent parser for policy files
//!
//! Builds the typed tree directly from the token stream. Trivia is not
//! stored in tokens of its own; every node instead records the byte
//! ranges of its text, of the trivia in front of it and of its
//! separator, see [`Layout`].

use smol_str::SmolStr;

use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use crate::base::{LineIndex, Span, TextSize};
use crate::error::{PolicyError, Result};
use crate::syntax::ast::{
    Action, AttrValue, Attribute, Definition, Element, ElementRef, Forest, ListDef, NamedUnion,
    NetworkDef, ProtocolDef, Rule, ServiceDef, StructDef, Value, split_typed_name,
};
use crate::syntax::layout::{Frame, Layout};

/// Parse a complete policy file.
pub fn parse_file(source: &str, file: &str) -> Result<Forest> {
    let mut parser = Parser::new(source, file);
    parser.parse_forest()
}

/// Parse an element list such as `host:a, network:b & !host:c`.
pub fn parse_union(text: &str) -> Result<Vec<Element>> {
    let mut parser = Parser::new(text, "union");
    parser.parse_fragment_union()
}

/// Parse exactly one toplevel definition supplied inline.
///
/// The result is detached from `text` and renders canonically.
pub fn parse_definition(text: &str) -> Result<Definition> {
    let mut parser = Parser::new(text, "definition");
    let mut forest = parser.parse_forest()?;
    if forest.definitions.len() != 1 {
        return Err(PolicyError::invalid(format!(
            "Expected exactly one definition, got {}",
            forest.definitions.len()
        )));
    }
    let mut def = forest.definitions.remove(0);
    def.detach();
    Ok(def)
}

/// Tracks the positional layout of a container's items while parsing.
struct Items {
    header_end: TextSize,
    lead_start: TextSize,
    first: Option<TextSize>,
    trailing: bool,
    len: usize,
}

impl Items {
    fn new(header_end: TextSize) -> Self {
        Self {
            header_end,
            lead_start: header_end,
            first: None,
            trailing: false,
            len: 0,
        }
    }

    fn layout(&mut self, start: TextSize, end: TextSize) -> Layout {
        let lead = match self.first {
            None => {
                self.first = Some(start);
                None
            }
            Some(_) => Some(Span::new(self.lead_start, start)),
        };
        self.lead_start = end;
        self.trailing = false;
        self.len += 1;
        Layout {
            span: Some(Span::new(start, end)),
            lead,
            sep: None,
        }
    }

    fn sep(&mut self, layout: &mut Layout, comma_end: TextSize) {
        layout.sep = Some(Span::new(self.lead_start, comma_end));
        self.lead_start = comma_end;
        self.trailing = true;
    }

    /// Extend the separator of the last item over a comment on the rest
    /// of its line, so the comment moves with the item.
    fn comment_tail(&mut self, layout: &mut Layout, source: &str) {
        let start = usize::from(self.lead_start);
        let rest = source.get(start..).unwrap_or_default();
        if !rest.trim_start_matches([' ', '\t']).starts_with('#') {
            return;
        }
        let line_len = rest.find('\n').unwrap_or(rest.len());
        let end = TextSize::new((start + line_len) as u32);
        let sep_start = layout.sep.map_or(self.lead_start, |sep| sep.start());
        layout.sep = Some(Span::new(sep_start, end));
        self.lead_start = end;
    }

    /// Finish the container; `terminator` is the offset of the closing token.
    fn frame(&self, terminator: TextSize) -> Frame {
        match self.first {
            None => Frame {
                header_end: self.header_end,
                first: terminator,
                close_start: terminator,
                trailing_sep: false,
                len: 0,
            },
            Some(first) => Frame {
                header_end: self.header_end,
                first,
                close_start: self.lead_start,
                trailing_sep: self.trailing,
                len: self.len,
            },
        }
    }
}

/// The parser state
struct Parser<'a> {
    source: &'a str,
    file: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    prev_end: TextSize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, file: &'a str) -> Self {
        let tokens = Lexer::new(source).filter(|t| !t.kind.is_trivia()).collect();
        Self {
            source,
            file,
            tokens,
            pos: 0,
            prev_end: TextSize::new(0),
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<SyntaxKind> {
        self.current().map(|t| t.kind)
    }

    /// Offset of the current token, or the end of input.
    fn offset(&self) -> TextSize {
        self.current()
            .map_or_else(|| TextSize::of(self.source), |t| t.offset)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn at_word(&self, word: &str) -> bool {
        self.current()
            .is_some_and(|t| t.kind == SyntaxKind::WORD && t.text == word)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    /// The current token starts right where the previous one ended.
    fn at_adjacent(&self, kind: SyntaxKind) -> bool {
        self.at(kind) && self.offset() == self.prev_end
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.prev_end = token.end();
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind) -> Result<Token<'a>> {
        if self.at(kind) {
            if let Some(token) = self.bump() {
                return Ok(token);
            }
        }
        Err(self.unexpected(kind.describe()))
    }

    fn expect_word(&mut self, word: &str) -> Result<Token<'a>> {
        if self.at_word(word) {
            return self.expect(SyntaxKind::WORD);
        }
        Err(self.unexpected(&format!("'{word}'")))
    }

    // =========================================================================
    // Errors
    // =========================================================================

    fn error(&self, message: &str) -> PolicyError {
        self.error_at(self.offset(), message)
    }

    fn error_at(&self, offset: TextSize, message: &str) -> PolicyError {
        let position = LineIndex::new(self.source).position(offset);
        PolicyError::Parse {
            file: self.file.to_string(),
            line: position.line,
            column: position.column,
            message: message.to_string(),
        }
    }

    fn unexpected(&self, expected: &str) -> PolicyError {
        let found = match self.current() {
            Some(token) if token.kind == SyntaxKind::WORD => format!("'{}'", token.text),
            Some(token) => token.kind.describe().to_string(),
            None => "end of file".to_string(),
        };
        self.error(&format!("Expected {expected}, found {found}"))
    }

    // =========================================================================
    // Toplevel
    // =========================================================================

    fn parse_forest(&mut self) -> Result<Forest> {
        let mut items = Items::new(TextSize::new(0));
        let mut definitions = Vec::new();
        while !self.at_eof() {
            let start = self.offset();
            let mut def = self.parse_toplevel()?;
            *def.layout_mut() = items.layout(start, self.prev_end);
            definitions.push(def);
        }
        Ok(Forest {
            definitions,
            frame: Some(items.frame(TextSize::of(self.source))),
        })
    }

    fn parse_toplevel(&mut self) -> Result<Definition> {
        if !self.at(SyntaxKind::WORD) {
            return Err(self.unexpected("definition"));
        }
        let name_token = self.expect(SyntaxKind::WORD)?;
        let name = SmolStr::new(name_token.text);
        let typ = match split_typed_name(&name) {
            Some((typ, ident)) if !typ.is_empty() && !ident.is_empty() => typ.to_string(),
            _ => {
                let message = format!("Expected 'type:name', found '{name}'");
                return Err(self.error_at(name_token.offset, &message));
            }
        };
        self.expect(SyntaxKind::EQ)?;
        let def = match typ.as_str() {
            "group" | "pathrestriction" => Definition::List(self.parse_list(name)?),
            "service" => Definition::Service(self.parse_service(name)?),
            "network" => {
                let (description, attributes, frame) = self.parse_block_body()?;
                Definition::Network(NetworkDef {
                    name,
                    description,
                    attributes,
                    layout: Layout::default(),
                    frame: Some(frame),
                })
            }
            _ if self.at(SyntaxKind::L_BRACE) => {
                let (description, attributes, frame) = self.parse_block_body()?;
                Definition::Struct(StructDef {
                    name,
                    description,
                    attributes,
                    layout: Layout::default(),
                    frame: Some(frame),
                })
            }
            _ => {
                let (values, frame) = self.parse_values(self.prev_end)?;
                Definition::Protocol(ProtocolDef {
                    name,
                    values,
                    layout: Layout::default(),
                    frame: Some(frame),
                })
            }
        };
        Ok(def)
    }

    /// `description = <rest of line>`; the line ends the header.
    fn parse_description(&mut self) -> Result<Option<SmolStr>> {
        if !(self.at_word("description") && self.nth(1) == Some(SyntaxKind::EQ)) {
            return Ok(None);
        }
        self.bump();
        self.expect(SyntaxKind::EQ)?;
        let rest_start = usize::from(self.prev_end);
        let rest = self.source.get(rest_start..).unwrap_or_default();
        let line_len = rest.find('\n').unwrap_or(rest.len());
        let line = rest[..line_len].trim();
        let text = line.strip_suffix(';').unwrap_or(line).trim_end();
        let line_end = TextSize::new((rest_start + line_len) as u32);
        while self.current().is_some_and(|t| t.offset < line_end) {
            self.pos += 1;
        }
        self.prev_end = line_end;
        Ok(Some(SmolStr::new(text)))
    }

    fn parse_list(&mut self, name: SmolStr) -> Result<ListDef> {
        let description = self.parse_description()?;
        let (elements, frame) = self.parse_union_items(self.prev_end, SyntaxKind::SEMICOLON)?;
        Ok(ListDef {
            name,
            description,
            elements,
            layout: Layout::default(),
            frame: Some(frame),
        })
    }

    /// `{ description? attribute* }`
    fn parse_block_body(&mut self) -> Result<(Option<SmolStr>, Vec<Attribute>, Frame)> {
        self.expect(SyntaxKind::L_BRACE)?;
        let description = self.parse_description()?;
        let (attributes, frame) = self.parse_statements(self.prev_end)?;
        Ok((description, attributes, frame))
    }

    fn parse_service(&mut self, name: SmolStr) -> Result<ServiceDef> {
        self.expect(SyntaxKind::L_BRACE)?;
        let description = self.parse_description()?;
        let mut items = Items::new(self.prev_end);

        let mut attributes = Vec::new();
        while !(self.at_word("user") && self.nth(1) == Some(SyntaxKind::EQ)) {
            if self.at(SyntaxKind::R_BRACE) || self.at_eof() {
                return Err(self.unexpected("'user'"));
            }
            let start = self.offset();
            let mut attribute = self.parse_attribute()?;
            attribute.layout = items.layout(start, self.prev_end);
            items.comment_tail(&mut attribute.layout, self.source);
            attributes.push(attribute);
        }

        let start = self.offset();
        let mut user = self.parse_named_union("user")?;
        user.layout = items.layout(start, self.prev_end);
        items.comment_tail(&mut user.layout, self.source);

        let mut rules = Vec::new();
        while !self.at(SyntaxKind::R_BRACE) {
            let start = self.offset();
            let mut rule = self.parse_rule()?;
            rule.layout = items.layout(start, self.prev_end);
            items.comment_tail(&mut rule.layout, self.source);
            rules.push(rule);
        }
        let frame = items.frame(self.offset());
        self.expect(SyntaxKind::R_BRACE)?;

        Ok(ServiceDef {
            name,
            description,
            attributes,
            user,
            rules,
            layout: Layout::default(),
            frame: Some(frame),
        })
    }

    fn parse_rule(&mut self) -> Result<Rule> {
        let action = match self.current() {
            Some(token) if token.kind == SyntaxKind::WORD => Action::from_keyword(token.text),
            _ => None,
        };
        let Some(action) = action else {
            return Err(self.unexpected("'permit' or 'deny'"));
        };
        self.bump();
        let mut items = Items::new(self.prev_end);

        let start = self.offset();
        let mut src = self.parse_named_union("src")?;
        src.layout = items.layout(start, self.prev_end);

        let start = self.offset();
        let mut dst = self.parse_named_union("dst")?;
        dst.layout = items.layout(start, self.prev_end);

        let start = self.offset();
        if !self.at_word("prt") {
            return Err(self.unexpected("'prt'"));
        }
        let mut prt = self.parse_attribute()?;
        prt.layout = items.layout(start, self.prev_end);

        let log = if self.at_word("log") {
            let start = self.offset();
            let mut log = self.parse_attribute()?;
            log.layout = items.layout(start, self.prev_end);
            Some(log)
        } else {
            None
        };

        Ok(Rule {
            action,
            src,
            dst,
            prt,
            log,
            layout: Layout::default(),
            frame: Some(items.frame(self.prev_end)),
        })
    }

    // =========================================================================
    // Attributes and values
    // =========================================================================

    /// Attributes up to and including the closing `}`.
    fn parse_statements(&mut self, header_end: TextSize) -> Result<(Vec<Attribute>, Frame)> {
        let mut items = Items::new(header_end);
        let mut attributes = Vec::new();
        while !self.at(SyntaxKind::R_BRACE) {
            if self.at_eof() {
                return Err(self.unexpected("'}'"));
            }
            let start = self.offset();
            let mut attribute = self.parse_attribute()?;
            attribute.layout = items.layout(start, self.prev_end);
            items.comment_tail(&mut attribute.layout, self.source);
            attributes.push(attribute);
        }
        let frame = items.frame(self.offset());
        self.expect(SyntaxKind::R_BRACE)?;
        Ok((attributes, frame))
    }

    fn parse_attribute(&mut self) -> Result<Attribute> {
        if !self.at(SyntaxKind::WORD) {
            return Err(self.unexpected("attribute"));
        }
        let name = self.expect(SyntaxKind::WORD)?.text;
        if self.eat(SyntaxKind::SEMICOLON) {
            return Ok(Attribute::new(name, AttrValue::Flag));
        }
        self.expect(SyntaxKind::EQ)?;
        let (value, frame) = if self.eat(SyntaxKind::L_BRACE) {
            let (attributes, frame) = self.parse_statements(self.prev_end)?;
            (AttrValue::Complex(attributes), frame)
        } else {
            let (values, frame) = self.parse_values(self.prev_end)?;
            (AttrValue::Values(values), frame)
        };
        let mut attribute = Attribute::new(name, value);
        attribute.frame = Some(frame);
        Ok(attribute)
    }

    /// Comma separated values up to and including the closing `;`.
    fn parse_values(&mut self, header_end: TextSize) -> Result<(Vec<Value>, Frame)> {
        let mut items = Items::new(header_end);
        let mut values = Vec::new();
        while !self.at(SyntaxKind::SEMICOLON) {
            let start = self.offset();
            self.skip_value()?;
            let span = Span::new(start, self.prev_end);
            let mut value = Value {
                text: SmolStr::new(&self.source[span]),
                layout: items.layout(start, self.prev_end),
            };
            if self.eat(SyntaxKind::COMMA) {
                items.sep(&mut value.layout, self.prev_end);
                items.comment_tail(&mut value.layout, self.source);
            } else if !self.at(SyntaxKind::SEMICOLON) {
                return Err(self.unexpected("',' or ';'"));
            }
            values.push(value);
        }
        let frame = items.frame(self.offset());
        self.expect(SyntaxKind::SEMICOLON)?;
        Ok((values, frame))
    }

    /// Consume the tokens of one value, stopping at `,` or `;` outside
    /// of brackets.
    fn skip_value(&mut self) -> Result<()> {
        let mut depth = 0usize;
        let mut consumed = false;
        while let Some(kind) = self.current_kind() {
            let inside = match kind {
                SyntaxKind::COMMA | SyntaxKind::SEMICOLON | SyntaxKind::EQ => depth > 0,
                SyntaxKind::L_BRACKET => {
                    depth += 1;
                    true
                }
                SyntaxKind::R_BRACKET if depth > 0 => {
                    depth -= 1;
                    true
                }
                SyntaxKind::WORD | SyntaxKind::AMP | SyntaxKind::BANG => true,
                _ => false,
            };
            if !inside {
                break;
            }
            self.bump();
            consumed = true;
        }
        if !consumed {
            return Err(self.unexpected("value"));
        }
        Ok(())
    }

    // =========================================================================
    // Element unions
    // =========================================================================

    /// `name = [foreach] union;`
    fn parse_named_union(&mut self, name: &str) -> Result<NamedUnion> {
        self.expect_word(name)?;
        self.expect(SyntaxKind::EQ)?;
        let foreach = name == "user"
            && self.at_word("foreach")
            && matches!(self.nth(1), Some(SyntaxKind::WORD | SyntaxKind::BANG));
        if foreach {
            self.bump();
        }
        let (elements, frame) = self.parse_union_items(self.prev_end, SyntaxKind::SEMICOLON)?;
        Ok(NamedUnion {
            name: SmolStr::new(name),
            foreach,
            elements,
            layout: Layout::default(),
            frame: Some(frame),
        })
    }

    /// Elements up to and including `terminator`.
    fn parse_union_items(
        &mut self,
        header_end: TextSize,
        terminator: SyntaxKind,
    ) -> Result<(Vec<ElementRef>, Frame)> {
        let mut items = Items::new(header_end);
        let mut elements = Vec::new();
        while !self.at(terminator) {
            let start = self.offset();
            let element = self.parse_intersection()?;
            let mut layout = items.layout(start, self.prev_end);
            if self.eat(SyntaxKind::COMMA) {
                items.sep(&mut layout, self.prev_end);
                items.comment_tail(&mut layout, self.source);
            } else if !self.at(terminator) {
                return Err(self.unexpected(&format!("',' or {}", terminator.describe())));
            }
            elements.push(ElementRef { element, layout });
        }
        let frame = items.frame(self.offset());
        self.expect(terminator)?;
        Ok((elements, frame))
    }

    fn parse_fragment_union(&mut self) -> Result<Vec<Element>> {
        let mut elements = Vec::new();
        while !self.at_eof() {
            elements.push(self.parse_intersection()?);
            if !self.eat(SyntaxKind::COMMA) && !self.at_eof() {
                return Err(self.unexpected("','"));
            }
        }
        Ok(elements)
    }

    fn parse_intersection(&mut self) -> Result<Element> {
        let first = self.parse_complement()?;
        if !self.at(SyntaxKind::AMP) {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.eat(SyntaxKind::AMP) {
            parts.push(self.parse_complement()?);
        }
        Ok(Element::Intersection(parts))
    }

    fn parse_complement(&mut self) -> Result<Element> {
        if self.eat(SyntaxKind::BANG) {
            let inner = self.parse_element()?;
            return Ok(Element::Complement(Box::new(inner)));
        }
        self.parse_element()
    }

    fn parse_element(&mut self) -> Result<Element> {
        if !self.at(SyntaxKind::WORD) {
            return Err(self.unexpected("element"));
        }
        let token = self.expect(SyntaxKind::WORD)?;
        if token.text == "user" {
            return Ok(Element::User);
        }
        let Some((typ, name)) = split_typed_name(token.text) else {
            let message = format!("Expected 'type:name', found '{}'", token.text);
            return Err(self.error_at(token.offset, &message));
        };
        if name.is_empty() && self.at_adjacent(SyntaxKind::L_BRACKET) {
            return self.parse_auto(typ);
        }
        if name.is_empty() {
            return Err(self.error_at(token.offset, &format!("Missing name after '{typ}:'")));
        }
        // interface:r.[all]
        if name.ends_with('.') && self.at_adjacent(SyntaxKind::L_BRACKET) {
            let selector = self.parse_selector()?;
            return Ok(Element::named(typ, format!("{name}[{selector}]")));
        }
        Ok(Element::named(typ, name))
    }

    /// `type:[managed & ip = x & union].[selector]`
    fn parse_auto(&mut self, typ: &str) -> Result<Element> {
        self.expect(SyntaxKind::L_BRACKET)?;
        let managed = self.at_word("managed") && self.nth(1) == Some(SyntaxKind::AMP);
        if managed {
            self.bump();
            self.bump();
        }
        let ip = if self.at_word("ip") && self.nth(1) == Some(SyntaxKind::EQ) {
            self.bump();
            self.bump();
            let ip = self.expect(SyntaxKind::WORD)?.text;
            self.expect(SyntaxKind::AMP)?;
            Some(SmolStr::new(ip))
        } else {
            None
        };
        let (elements, _) = self.parse_union_items(self.prev_end, SyntaxKind::R_BRACKET)?;
        let selector = if self.at_word(".") && self.offset() == self.prev_end {
            self.bump();
            if !self.at_adjacent(SyntaxKind::L_BRACKET) {
                return Err(self.unexpected("'['"));
            }
            Some(self.parse_selector()?)
        } else {
            None
        };
        Ok(Element::Auto {
            typ: SmolStr::new(typ),
            managed,
            ip,
            elements: elements.into_iter().map(|e| e.element).collect(),
            selector,
        })
    }

    /// `[word]`
    fn parse_selector(&mut self) -> Result<SmolStr> {
        self.expect(SyntaxKind::L_BRACKET)?;
        let selector = self.expect(SyntaxKind::WORD)?.text;
        self.expect(SyntaxKind::R_BRACKET)?;
        Ok(SmolStr::new(selector))
    }
}
