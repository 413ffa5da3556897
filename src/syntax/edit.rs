//! In-place edit primitives.
//!
//! Edits keep the layout of surrounding nodes. A changed node loses its
//! span and is synthesized by the printer; its position trivia stays.

use tracing::trace;

use super::ast::{AttrValue, Attribute, Element, ElementRef, Value, normalize_value};
use super::formatter::render_element;
use super::order;

/// Set a scalar attribute, keeping its position if it already exists.
///
/// An existing value list keeps its frame so only the values change.
pub fn set_values(attributes: &mut Vec<Attribute>, name: &str, values: Vec<Value>) {
    match attributes.iter_mut().find(|a| a.name == name) {
        Some(attribute) => {
            trace!(attribute = name, "replace values");
            if !matches!(attribute.value, AttrValue::Values(_)) {
                attribute.layout = attribute.layout.replaced();
                attribute.frame = None;
            }
            attribute.value = AttrValue::Values(values);
        }
        None => {
            trace!(attribute = name, "add attribute");
            attributes.push(Attribute::new(name, AttrValue::Values(values)));
        }
    }
}

/// Set `name` to the alphabetized `names`.
pub fn set_sorted_values<S: AsRef<str>>(attributes: &mut Vec<Attribute>, name: &str, names: &[S]) {
    let mut values: Vec<Value> = names.iter().map(|n| Value::new(n.as_ref())).collect();
    order::sort_values(&mut values);
    set_values(attributes, name, values);
}

/// Remove every attribute called `name`; returns whether one existed.
pub fn remove_attribute(attributes: &mut Vec<Attribute>, name: &str) -> bool {
    let before = attributes.len();
    attributes.retain(|a| a.name != name);
    let removed = attributes.len() != before;
    if removed {
        trace!(attribute = name, "remove attribute");
    }
    removed
}

/// Remove the first element rendering like `element`.
pub fn remove_element(elements: &mut Vec<ElementRef>, element: &Element) -> bool {
    let wanted = render_element(element);
    match elements
        .iter()
        .position(|e| render_element(&e.element) == wanted)
    {
        Some(index) => {
            elements.remove(index);
            trace!(element = %wanted, "remove element");
            true
        }
        None => false,
    }
}

/// Remove the first value equal to `text` up to whitespace.
pub fn remove_value(values: &mut Vec<Value>, text: &str) -> bool {
    let wanted = normalize_value(text);
    match values.iter().position(|v| v.normalized() == wanted) {
        Some(index) => {
            values.remove(index);
            trace!(value = %wanted, "remove value");
            true
        }
        None => false,
    }
}

/// Split a comma separated protocol list, e.g. `"tcp 80, udp 53"`.
pub fn split_values(text: &str) -> Vec<Value> {
    text.split(',')
        .map(normalize_value)
        .filter(|v| !v.is_empty())
        .map(Value::new)
        .collect()
}
