//! Tree model of the policy language: typed nodes, source layout,
//! canonical ordering, edit primitives and the printer.

pub mod ast;
pub mod edit;
pub mod formatter;
pub mod layout;
pub mod order;

pub use ast::{
    Action, AttrValue, Attribute, Definition, Element, ElementRef, Forest, ListDef, NamedUnion,
    NetworkDef, ProtocolDef, Rule, ServiceDef, StructDef, Value, Variant,
};
pub use formatter::{FormatOptions, render, render_definition, render_element};
pub use layout::{Frame, Layout};

pub use crate::base::{Position, Span};
