//! Typed tree of a policy file.
//!
//! Every node owns its semantic content plus a [`Layout`] pointing back
//! into the source buffer. Nodes built by jobs start with an empty
//! layout and are rendered canonically.

use smol_str::SmolStr;

use super::layout::{Frame, Layout};

/// A scalar token list entry, e.g. `10.1.1.0/24` or `tcp 80`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub text: SmolStr,
    pub layout: Layout,
}

impl Value {
    pub fn new(text: impl Into<SmolStr>) -> Self {
        Self {
            text: text.into(),
            layout: Layout::default(),
        }
    }

    /// Text with runs of whitespace collapsed, used to compare values.
    pub fn normalized(&self) -> String {
        normalize_value(&self.text)
    }
}

pub fn normalize_value(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Object reference inside a union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// The keyword `user`, standing for the service's user set.
    User,
    /// `type:name`
    Named { typ: SmolStr, name: SmolStr },
    /// `type:[...]`, optionally with a `.[selector]` suffix.
    Auto {
        typ: SmolStr,
        managed: bool,
        ip: Option<SmolStr>,
        elements: Vec<Element>,
        selector: Option<SmolStr>,
    },
    /// `a & b & !c`
    Intersection(Vec<Element>),
    /// `!a`
    Complement(Box<Element>),
}

impl Element {
    pub fn named(typ: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self::Named {
            typ: typ.into(),
            name: name.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User)
    }
}

/// An [`Element`] positioned in a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    pub element: Element,
    pub layout: Layout,
}

impl ElementRef {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            layout: Layout::default(),
        }
    }
}

/// Named element list: a service's `user` or a rule's `src`/`dst`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedUnion {
    pub name: SmolStr,
    /// `user = foreach ...;`
    pub foreach: bool,
    pub elements: Vec<ElementRef>,
    pub layout: Layout,
    pub frame: Option<Frame>,
}

impl NamedUnion {
    pub fn new(name: impl Into<SmolStr>, elements: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            foreach: false,
            elements: elements.into_iter().map(ElementRef::new).collect(),
            layout: Layout::default(),
            frame: None,
        }
    }

    /// The union consists of the bare `user` keyword only.
    pub fn is_user_only(&self) -> bool {
        matches!(self.elements.as_slice(), [e] if e.element.is_user())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `name;`
    Flag,
    /// `name = v1, v2;`
    Values(Vec<Value>),
    /// `name = { a = 1; b; }`
    Complex(Vec<Attribute>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: AttrValue,
    pub layout: Layout,
    pub frame: Option<Frame>,
}

impl Attribute {
    pub fn new(name: impl Into<SmolStr>, value: AttrValue) -> Self {
        Self {
            name: name.into(),
            value,
            layout: Layout::default(),
            frame: None,
        }
    }

    pub fn values<I, S>(name: impl Into<SmolStr>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let values = values.into_iter().map(Value::new).collect();
        Self::new(name, AttrValue::Values(values))
    }

    pub fn complex(name: impl Into<SmolStr>, attributes: Vec<Attribute>) -> Self {
        Self::new(name, AttrValue::Complex(attributes))
    }

    /// First value of a scalar attribute.
    pub fn first_value(&self) -> Option<&str> {
        match &self.value {
            AttrValue::Values(values) => values.first().map(|v| v.text.as_str()),
            _ => None,
        }
    }

    pub fn sub_attributes(&self) -> &[Attribute] {
        match &self.value {
            AttrValue::Complex(attributes) => attributes,
            _ => &[],
        }
    }

    pub fn sub_attributes_mut(&mut self) -> Option<&mut Vec<Attribute>> {
        match &mut self.value {
            AttrValue::Complex(attributes) => Some(attributes),
            _ => None,
        }
    }

    pub fn is_host(&self) -> bool {
        self.name.starts_with("host:")
    }
}

/// Generic structured definition: owner, router, area, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: SmolStr,
    pub description: Option<SmolStr>,
    pub attributes: Vec<Attribute>,
    pub layout: Layout,
    pub frame: Option<Frame>,
}

impl StructDef {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            description: None,
            attributes: Vec::new(),
            layout: Layout::default(),
            frame: None,
        }
    }
}

/// Named element set: `group:` and `pathrestriction:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDef {
    pub name: SmolStr,
    pub description: Option<SmolStr>,
    pub elements: Vec<ElementRef>,
    pub layout: Layout,
    pub frame: Option<Frame>,
}

/// `network:` with its attributes and `host:` entries in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDef {
    pub name: SmolStr,
    pub description: Option<SmolStr>,
    pub attributes: Vec<Attribute>,
    pub layout: Layout,
    pub frame: Option<Frame>,
}

impl NetworkDef {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is_host())
    }

    pub fn host_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes
            .iter_mut()
            .find(|a| a.is_host() && a.name == name)
    }
}

/// Value list definition: `protocol:` and `protocolgroup:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDef {
    pub name: SmolStr,
    pub values: Vec<Value>,
    pub layout: Layout,
    pub frame: Option<Frame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Permit,
    Deny,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permit => "permit",
            Self::Deny => "deny",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "permit" => Some(Self::Permit),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub action: Action,
    pub src: NamedUnion,
    pub dst: NamedUnion,
    pub prt: Attribute,
    pub log: Option<Attribute>,
    pub layout: Layout,
    pub frame: Option<Frame>,
}

impl Rule {
    pub fn new(action: Action, src: Vec<Element>, dst: Vec<Element>, prt: Vec<SmolStr>) -> Self {
        Self {
            action,
            src: NamedUnion::new("src", src),
            dst: NamedUnion::new("dst", dst),
            prt: Attribute::values("prt", prt),
            log: None,
            layout: Layout::default(),
            frame: None,
        }
    }

    pub fn is_deny(&self) -> bool {
        self.action == Action::Deny
    }

    /// The protocol list, `None` when `prt` was written without values.
    pub fn protocols_mut(&mut self) -> Option<&mut Vec<Value>> {
        match &mut self.prt.value {
            AttrValue::Values(values) => Some(values),
            AttrValue::Flag | AttrValue::Complex(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDef {
    pub name: SmolStr,
    pub description: Option<SmolStr>,
    pub attributes: Vec<Attribute>,
    pub user: NamedUnion,
    pub rules: Vec<Rule>,
    pub layout: Layout,
    pub frame: Option<Frame>,
}

impl ServiceDef {
    pub fn new(name: impl Into<SmolStr>, user: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            description: None,
            attributes: Vec::new(),
            user: NamedUnion::new("user", user),
            rules: Vec::new(),
            layout: Layout::default(),
            frame: None,
        }
    }
}

/// One toplevel unit of a policy file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Struct(StructDef),
    List(ListDef),
    Network(NetworkDef),
    Service(ServiceDef),
    Protocol(ProtocolDef),
}

impl Definition {
    /// Fully qualified name, `type:identifier`.
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(d) => &d.name,
            Self::List(d) => &d.name,
            Self::Network(d) => &d.name,
            Self::Service(d) => &d.name,
            Self::Protocol(d) => &d.name,
        }
    }

    /// The `type` part of the name.
    pub fn type_name(&self) -> &str {
        split_typed_name(self.name()).map_or("", |(typ, _)| typ)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Struct(_) => StructDef::KIND,
            Self::List(_) => ListDef::KIND,
            Self::Network(_) => NetworkDef::KIND,
            Self::Service(_) => ServiceDef::KIND,
            Self::Protocol(_) => ProtocolDef::KIND,
        }
    }

    pub fn layout(&self) -> &Layout {
        match self {
            Self::Struct(d) => &d.layout,
            Self::List(d) => &d.layout,
            Self::Network(d) => &d.layout,
            Self::Service(d) => &d.layout,
            Self::Protocol(d) => &d.layout,
        }
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        match self {
            Self::Struct(d) => &mut d.layout,
            Self::List(d) => &mut d.layout,
            Self::Network(d) => &mut d.layout,
            Self::Service(d) => &mut d.layout,
            Self::Protocol(d) => &mut d.layout,
        }
    }

    /// Drop every source reference so the whole tree renders canonically.
    ///
    /// Needed for definitions parsed from job text: their spans point
    /// into the job, not into the file they are inserted into.
    pub fn detach(&mut self) {
        match self {
            Self::Struct(d) => {
                d.layout = Layout::default();
                d.frame = None;
                d.attributes.iter_mut().for_each(Attribute::detach);
            }
            Self::List(d) => {
                d.layout = Layout::default();
                d.frame = None;
                d.elements.iter_mut().for_each(|e| e.layout = Layout::default());
            }
            Self::Network(d) => {
                d.layout = Layout::default();
                d.frame = None;
                d.attributes.iter_mut().for_each(Attribute::detach);
            }
            Self::Service(d) => {
                d.layout = Layout::default();
                d.frame = None;
                d.attributes.iter_mut().for_each(Attribute::detach);
                d.user.detach();
                for rule in &mut d.rules {
                    rule.layout = Layout::default();
                    rule.frame = None;
                    rule.src.detach();
                    rule.dst.detach();
                    rule.prt.detach();
                    if let Some(log) = &mut rule.log {
                        log.detach();
                    }
                }
            }
            Self::Protocol(d) => {
                d.layout = Layout::default();
                d.frame = None;
                d.values.iter_mut().for_each(|v| v.layout = Layout::default());
            }
        }
    }
}

impl Attribute {
    fn detach(&mut self) {
        self.layout = Layout::default();
        self.frame = None;
        match &mut self.value {
            AttrValue::Flag => {}
            AttrValue::Values(values) => values.iter_mut().for_each(|v| v.layout = Layout::default()),
            AttrValue::Complex(attributes) => attributes.iter_mut().for_each(Attribute::detach),
        }
    }
}

impl NamedUnion {
    fn detach(&mut self) {
        self.layout = Layout::default();
        self.frame = None;
        self.elements.iter_mut().for_each(|e| e.layout = Layout::default());
    }
}

/// Access to one [`Definition`] variant, for typed lookups.
pub trait Variant: Sized {
    const KIND: &'static str;

    fn cast(def: &Definition) -> Option<&Self>;
    fn cast_mut(def: &mut Definition) -> Option<&mut Self>;
}

macro_rules! impl_variant {
    ($ty:ident, $variant:ident, $kind:literal) => {
        impl Variant for $ty {
            const KIND: &'static str = $kind;

            fn cast(def: &Definition) -> Option<&Self> {
                match def {
                    Definition::$variant(d) => Some(d),
                    _ => None,
                }
            }

            fn cast_mut(def: &mut Definition) -> Option<&mut Self> {
                match def {
                    Definition::$variant(d) => Some(d),
                    _ => None,
                }
            }
        }
    };
}

impl_variant!(StructDef, Struct, "structured definition");
impl_variant!(ListDef, List, "element list");
impl_variant!(NetworkDef, Network, "network");
impl_variant!(ServiceDef, Service, "service");
impl_variant!(ProtocolDef, Protocol, "protocol definition");

/// Split `type:name` at the first colon.
pub fn split_typed_name(full: &str) -> Option<(&str, &str)> {
    full.split_once(':')
}

/// One parsed or generated policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    pub definitions: Vec<Definition>,
    /// `header_end` is always 0; the gap holds leading file comments.
    pub frame: Option<Frame>,
}

impl Forest {
    pub fn find(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.definitions.iter().position(|d| d.name() == name)
    }
}
