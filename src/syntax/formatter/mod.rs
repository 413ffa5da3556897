//! Layout-preserving printer for policy files
//!
//! Nodes that still carry a span are copied byte for byte from the
//! source they were parsed from. Containers copy their header, opening
//! gap and footer and render their items one by one, so an edit deep
//! inside a definition only changes the bytes of the edited node.
//! Nodes without a span are synthesized in canonical form.

mod options;

#[cfg(test)]
#[path = "tests/tests_formatter.rs"]
mod tests;

pub use options::FormatOptions;

use std::ops::Range;

use crate::base::{Span, TextSize};
use crate::syntax::ast::{
    AttrValue, Attribute, Definition, Element, ElementRef, Forest, NamedUnion, Rule, Value,
};
use crate::syntax::layout::{Frame, Layout};

/// Render a forest against the source it was parsed from.
pub fn render(forest: &Forest, source: &str) -> String {
    render_with_options(forest, source, &FormatOptions::default())
}

pub fn render_with_options(forest: &Forest, source: &str, options: &FormatOptions) -> String {
    let mut printer = Printer::new(source, options);
    printer.forest(forest);
    printer.out
}

/// Canonical text of a single definition without source reuse.
pub fn render_definition(def: &Definition) -> String {
    let options = FormatOptions::default();
    let mut printer = Printer::new("", &options);
    printer.canonical_definition(def);
    printer.out
}

/// Canonical text of one element, e.g. `host:a` or `interface:r.[all]`.
pub fn render_element(element: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, element);
    out
}

fn write_element(out: &mut String, element: &Element) {
    match element {
        Element::User => out.push_str("user"),
        Element::Named { typ, name } => {
            out.push_str(typ);
            out.push(':');
            out.push_str(name);
        }
        Element::Auto {
            typ,
            managed,
            ip,
            elements,
            selector,
        } => {
            out.push_str(typ);
            out.push_str(":[");
            if *managed {
                out.push_str("managed & ");
            }
            if let Some(ip) = ip {
                out.push_str("ip = ");
                out.push_str(ip);
                out.push_str(" & ");
            }
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_element(out, element);
            }
            out.push(']');
            if let Some(selector) = selector {
                out.push_str(".[");
                out.push_str(selector);
                out.push(']');
            }
        }
        Element::Intersection(parts) => {
            for (i, part) in parts.iter().enumerate() {
                match part {
                    Element::Complement(inner) if i > 0 => {
                        out.push_str(" &! ");
                        write_element(out, inner);
                    }
                    _ => {
                        if i > 0 {
                            out.push_str(" & ");
                        }
                        write_element(out, part);
                    }
                }
            }
        }
        Element::Complement(inner) => {
            out.push('!');
            write_element(out, inner);
        }
    }
}

// =========================================================================
// Items and list styles
// =========================================================================

/// One entry of a container body.
#[derive(Clone, Copy)]
enum Item<'t> {
    Value(&'t Value),
    Element(&'t ElementRef),
    Attribute(&'t Attribute),
    Union(&'t NamedUnion),
    Rule(&'t Rule),
}

impl<'t> Item<'t> {
    fn layout(self) -> &'t Layout {
        match self {
            Self::Value(v) => &v.layout,
            Self::Element(e) => &e.layout,
            Self::Attribute(a) => &a.layout,
            Self::Union(u) => &u.layout,
            Self::Rule(r) => &r.layout,
        }
    }
}

#[derive(Clone, Copy)]
struct ListStyle {
    /// Items are separated by `,`.
    comma: bool,
    /// Default for the trailing comma when the list had no items.
    trailing: bool,
}

const STATEMENTS: ListStyle = ListStyle {
    comma: false,
    trailing: false,
};
const VALUES: ListStyle = ListStyle {
    comma: true,
    trailing: false,
};
const GROUP: ListStyle = ListStyle {
    comma: true,
    trailing: true,
};

fn definition_body(def: &Definition) -> (Option<Frame>, Vec<Item<'_>>, ListStyle) {
    match def {
        Definition::Struct(d) => (
            d.frame,
            d.attributes.iter().map(Item::Attribute).collect(),
            STATEMENTS,
        ),
        Definition::Network(d) => (
            d.frame,
            d.attributes.iter().map(Item::Attribute).collect(),
            STATEMENTS,
        ),
        Definition::List(d) => (d.frame, d.elements.iter().map(Item::Element).collect(), GROUP),
        Definition::Protocol(d) => (d.frame, d.values.iter().map(Item::Value).collect(), VALUES),
        Definition::Service(d) => {
            let mut items: Vec<Item<'_>> = d.attributes.iter().map(Item::Attribute).collect();
            items.push(Item::Union(&d.user));
            items.extend(d.rules.iter().map(Item::Rule));
            (d.frame, items, STATEMENTS)
        }
    }
}

fn rule_body(rule: &Rule) -> Vec<Item<'_>> {
    let mut items = vec![
        Item::Union(&rule.src),
        Item::Union(&rule.dst),
        Item::Attribute(&rule.prt),
    ];
    if let Some(log) = &rule.log {
        items.push(Item::Attribute(log));
    }
    items
}

/// The text from the first comment of `trivia` onwards.
fn comment_part(trivia: &str) -> Option<&str> {
    trivia.find('#').map(|pos| &trivia[pos..])
}

/// Whitespace following the last newline of `text`.
fn indent_after_newline(text: &str) -> Option<&str> {
    let (_, tail) = text.rsplit_once('\n')?;
    let end = tail.len() - tail.trim_start_matches([' ', '\t']).len();
    Some(&tail[..end])
}

// =========================================================================
// Printer
// =========================================================================

struct Printer<'a> {
    source: &'a str,
    options: &'a FormatOptions,
    out: String,
}

impl<'a> Printer<'a> {
    fn new(source: &'a str, options: &'a FormatOptions) -> Self {
        Self {
            source,
            options,
            out: String::with_capacity(source.len()),
        }
    }

    fn text(&self, span: Span) -> &'a str {
        let range: Range<usize> = span.into();
        self.source.get(range).unwrap_or_default()
    }

    fn copy(&mut self, span: Span) {
        let text = self.text(span);
        self.out.push_str(text);
    }

    /// Indentation of the source line containing `offset`.
    fn line_indent(&self, offset: TextSize) -> &'a str {
        let head = self.source.get(..usize::from(offset)).unwrap_or_default();
        let start = head.rfind('\n').map_or(0, |pos| pos + 1);
        let line = self.source.get(start..).unwrap_or_default();
        let end = line.len() - line.trim_start_matches([' ', '\t']).len();
        &line[..end]
    }

    // =====================================================================
    // Files and definitions
    // =====================================================================

    fn forest(&mut self, forest: &Forest) {
        let Some(frame) = forest.frame else {
            for (i, def) in forest.definitions.iter().enumerate() {
                if i > 0 {
                    self.out.push_str("\n\n");
                }
                self.definition(def);
            }
            if !forest.definitions.is_empty() {
                self.out.push('\n');
            }
            return;
        };

        self.copy(frame.gap());
        for (i, def) in forest.definitions.iter().enumerate() {
            match def.layout().lead {
                Some(lead) if i > 0 => self.copy(lead),
                // Moved to the front: the blank lines go, its comments stay.
                Some(lead) => {
                    if let Some(comment) = comment_part(self.text(lead)) {
                        self.out.push_str(comment);
                    }
                }
                None if i > 0 => self.out.push_str("\n\n"),
                None => {}
            }
            self.definition(def);
        }
        let footer = self.text(Span::new(frame.close_start, TextSize::of(self.source)));
        let appended = forest
            .definitions
            .last()
            .is_some_and(|d| d.layout().is_synthesized());
        if appended && !footer.starts_with('\n') {
            self.out.push('\n');
        }
        self.out.push_str(footer);
    }

    fn definition(&mut self, def: &Definition) {
        let Some(span) = def.layout().span else {
            return self.canonical_definition(def);
        };
        let (frame, items, style) = definition_body(def);
        let Some(frame) = frame else {
            return self.copy(span);
        };
        // A one-line definition that gained a child is unfolded.
        if !self.text(span).contains('\n') && items.len() > frame.len {
            return self.canonical_definition(def);
        }
        self.framed(span, frame, &items, style);
    }

    fn canonical_definition(&mut self, def: &Definition) {
        let indent = self.options.indent(1);
        match def {
            Definition::Struct(d) => {
                self.canonical_struct(&d.name, d.description.as_deref(), &d.attributes)
            }
            Definition::Network(d) => {
                self.canonical_struct(&d.name, d.description.as_deref(), &d.attributes)
            }
            Definition::List(d) => {
                self.out.push_str(&d.name);
                self.out.push_str(" =");
                if d.elements.is_empty() && d.description.is_none() {
                    self.out.push_str(" ;");
                    return;
                }
                if let Some(description) = &d.description {
                    self.description_line(&indent, description);
                }
                for element in &d.elements {
                    self.out.push('\n');
                    self.out.push_str(&indent);
                    self.item(Item::Element(element));
                    self.out.push(',');
                }
                self.out.push_str("\n;");
            }
            Definition::Protocol(d) => {
                self.out.push_str(&d.name);
                self.out.push_str(" = ");
                self.inline_values(&d.values);
                self.out.push(';');
            }
            Definition::Service(d) => {
                self.out.push_str(&d.name);
                self.out.push_str(" = {");
                if let Some(description) = &d.description {
                    self.description_line(&indent, description);
                }
                for attribute in &d.attributes {
                    self.out.push('\n');
                    self.out.push_str(&indent);
                    self.attribute(attribute);
                }
                self.out.push('\n');
                self.out.push_str(&indent);
                self.union(&d.user);
                for rule in &d.rules {
                    self.out.push('\n');
                    self.out.push_str(&indent);
                    self.rule(rule);
                }
                self.out.push_str("\n}");
            }
        }
    }

    fn canonical_struct(&mut self, name: &str, description: Option<&str>, attributes: &[Attribute]) {
        let indent = self.options.indent(1);
        self.out.push_str(name);
        self.out.push_str(" = {");
        if let Some(description) = description {
            self.description_line(&indent, description);
        }
        for attribute in attributes {
            self.out.push('\n');
            self.out.push_str(&indent);
            self.attribute(attribute);
        }
        self.out.push_str("\n}");
    }

    fn description_line(&mut self, indent: &str, description: &str) {
        self.out.push('\n');
        self.out.push_str(indent);
        self.out.push_str("description = ");
        self.out.push_str(description);
    }

    // =====================================================================
    // Containers
    // =====================================================================

    /// Render a parsed container whose items may have been edited.
    fn framed(&mut self, span: Span, frame: Frame, items: &[Item<'_>], style: ListStyle) {
        self.copy(frame.header(span));
        let gap = self.text(frame.gap());
        // Items of a list that was empty go in front of its line break.
        let unfold = frame.was_empty() && gap.contains('\n');
        if !unfold {
            let moved = items
                .first()
                .and_then(|item| item.layout().lead)
                .map(|lead| self.text(lead))
                .filter(|lead| lead.contains('#'));
            match moved {
                Some(lead) if gap.contains('\n') => {
                    self.out.push_str(gap);
                    self.out.push_str(comment_part(lead).unwrap_or_default());
                }
                Some(lead) => self.out.push_str(lead),
                None => self.out.push_str(gap),
            }
        }
        let trailing = if frame.was_empty() {
            style.trailing && unfold
        } else {
            frame.trailing_sep
        };
        for (i, item) in items.iter().enumerate() {
            if i > 0 || unfold {
                let lead = self.lead(span, frame, items, i);
                self.out.push_str(&lead);
            }
            self.item(*item);
            let sep = item.layout().sep;
            if !style.comma {
                if let Some(sep) = sep {
                    self.copy(sep);
                }
            } else if i + 1 < items.len() || trailing {
                match sep {
                    Some(sep) => self.copy(sep),
                    None => self.out.push(','),
                }
            } else if let Some(comment) = sep.and_then(|sep| comment_part(self.text(sep))) {
                // New last item: drop the comma, keep its comment.
                self.out.push(' ');
                self.out.push_str(comment);
                if !self.text(frame.close(span)).starts_with(['\n', '\r']) {
                    let indent = self.line_indent(span.start());
                    self.out.push('\n');
                    self.out.push_str(indent);
                }
            }
        }
        if unfold {
            self.out.push_str(gap);
        }
        self.copy(frame.close(span));
    }

    /// Trivia in front of the item at `index`, taken from the source or
    /// derived from its neighbours.
    fn lead(&self, span: Span, frame: Frame, items: &[Item<'_>], index: usize) -> String {
        if let Some(lead) = items[index].layout().lead {
            return self.text(lead).to_string();
        }
        let sibling = items
            .iter()
            .filter_map(|item| item.layout().lead)
            .filter_map(|lead| indent_after_newline(self.text(lead)))
            .last();
        if let Some(indent) = sibling {
            return format!("\n{indent}");
        }
        let gap = indent_after_newline(self.text(frame.gap())).filter(|_| !frame.was_empty());
        if let Some(indent) = gap {
            return format!("\n{indent}");
        }
        if self.text(span).contains('\n') {
            return format!(
                "\n{}{}",
                self.line_indent(span.start()),
                self.options.indent(1)
            );
        }
        " ".to_string()
    }

    fn item(&mut self, item: Item<'_>) {
        match item {
            Item::Value(value) => match value.layout.span {
                Some(span) => self.copy(span),
                None => self.out.push_str(&value.text),
            },
            Item::Element(element) => match element.layout.span {
                Some(span) => self.copy(span),
                None => write_element(&mut self.out, &element.element),
            },
            Item::Attribute(attribute) => self.attribute(attribute),
            Item::Union(union) => self.union(union),
            Item::Rule(rule) => self.rule(rule),
        }
    }

    fn inline_values(&mut self, values: &[Value]) {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.item(Item::Value(value));
        }
    }

    // =====================================================================
    // Attributes, unions and rules
    // =====================================================================

    fn attribute(&mut self, attribute: &Attribute) {
        match (attribute.layout.span, attribute.frame) {
            (Some(span), Some(frame)) => match &attribute.value {
                AttrValue::Flag => self.copy(span),
                AttrValue::Values(values) => {
                    let items: Vec<_> = values.iter().map(Item::Value).collect();
                    self.framed(span, frame, &items, VALUES);
                }
                AttrValue::Complex(attributes) => {
                    let items: Vec<_> = attributes.iter().map(Item::Attribute).collect();
                    self.framed(span, frame, &items, STATEMENTS);
                }
            },
            (Some(span), None) => self.copy(span),
            (None, _) => {
                self.out.push_str(&attribute.name);
                match &attribute.value {
                    AttrValue::Flag => self.out.push(';'),
                    AttrValue::Values(values) => {
                        self.out.push_str(" = ");
                        self.inline_values(values);
                        self.out.push(';');
                    }
                    AttrValue::Complex(attributes) => {
                        self.out.push_str(" = {");
                        for attribute in attributes {
                            self.out.push(' ');
                            self.attribute(attribute);
                        }
                        self.out.push_str(" }");
                    }
                }
            }
        }
    }

    fn union(&mut self, union: &NamedUnion) {
        match (union.layout.span, union.frame) {
            (Some(span), Some(frame)) => {
                let items: Vec<_> = union.elements.iter().map(Item::Element).collect();
                self.framed(span, frame, &items, VALUES);
            }
            (Some(span), None) => self.copy(span),
            (None, _) => {
                self.out.push_str(&union.name);
                self.out.push_str(" = ");
                if union.foreach {
                    self.out.push_str("foreach ");
                }
                for (i, element) in union.elements.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.item(Item::Element(element));
                }
                self.out.push(';');
            }
        }
    }

    fn rule(&mut self, rule: &Rule) {
        match (rule.layout.span, rule.frame) {
            (Some(span), Some(frame)) => {
                let items = rule_body(rule);
                self.framed(span, frame, &items, STATEMENTS);
            }
            (Some(span), None) => self.copy(span),
            (None, _) => {
                self.out.push_str(rule.action.as_str());
                for item in rule_body(rule) {
                    self.out.push(' ');
                    self.item(item);
                }
            }
        }
    }
}
