//! Canonical ordering of element lists, host entries and rules.
//!
//! Only the node touched by an edit is reordered; untouched lists keep
//! whatever order their file has.

use std::cmp::Ordering;

use super::ast::{
    Attribute, Definition, Element, ElementRef, NamedUnion, Rule, Value, split_typed_name,
};
use super::formatter::render_element;

/// Sort key of an element: lowercase type, then lowercase name.
pub fn element_key(element: &Element) -> (String, String) {
    match element {
        Element::User => ("user".to_string(), String::new()),
        Element::Named { typ, name } => (typ.to_lowercase(), name.to_lowercase()),
        Element::Auto { .. } => typed_key(&render_element(element)),
        Element::Intersection(parts) => parts.first().map_or_else(Default::default, element_key),
        Element::Complement(inner) => element_key(inner),
    }
}

fn typed_key(full: &str) -> (String, String) {
    match split_typed_name(full) {
        Some((typ, name)) => (typ.to_lowercase(), name.to_lowercase()),
        None => (full.to_lowercase(), String::new()),
    }
}

/// Stable sort by [`element_key`]; equal keys keep insertion order.
pub fn sort_elements(elements: &mut [ElementRef]) {
    elements.sort_by_cached_key(|e| element_key(&e.element));
}

pub fn normalize_union(union: &mut NamedUnion) {
    sort_elements(&mut union.elements);
}

/// Sort the `host:` entries of a network among themselves. Other
/// attributes stay in their slots.
pub fn sort_hosts(attributes: &mut [Attribute]) {
    let slots: Vec<usize> = attributes
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_host())
        .map(|(i, _)| i)
        .collect();
    let mut hosts: Vec<Attribute> = slots.iter().map(|&i| attributes[i].clone()).collect();
    hosts.sort_by_cached_key(|host| typed_key(&host.name));
    for (slot, host) in slots.into_iter().zip(hosts) {
        attributes[slot] = host;
    }
}

/// Alphabetical order for `admins`/`watchers` style value lists.
pub fn sort_values(values: &mut [Value]) {
    values.sort_by(|a, b| a.text.cmp(&b.text));
}

/// All `deny` rules before all `permit` rules, stable within each class.
pub fn normalize_rules(rules: &mut [Rule]) {
    rules.sort_by_key(|rule| !rule.is_deny());
}

/// Insert a rule at its canonical position: a `deny` rule directly after
/// the last existing `deny` rule, a `permit` rule at the end.
pub fn insert_rule(rules: &mut Vec<Rule>, rule: Rule) -> usize {
    let index = if rule.is_deny() {
        rules.iter().rposition(Rule::is_deny).map_or(0, |i| i + 1)
    } else {
        rules.len()
    };
    rules.insert(index, rule);
    index
}

/// Canonical ordering of the element lists owned by `def`.
pub fn normalize(def: &mut Definition) {
    match def {
        Definition::List(d) => sort_elements(&mut d.elements),
        Definition::Network(d) => sort_hosts(&mut d.attributes),
        Definition::Service(d) => {
            normalize_union(&mut d.user);
            for rule in &mut d.rules {
                normalize_union(&mut rule.src);
                normalize_union(&mut rule.dst);
            }
            normalize_rules(&mut d.rules);
        }
        Definition::Struct(_) | Definition::Protocol(_) => {}
    }
}

/// Position for a new definition: before the first definition of the
/// same type whose name compares greater, else at the end.
pub fn insertion_index(definitions: &[Definition], new: &Definition) -> usize {
    let typ = new.type_name();
    let name = new.name().to_lowercase();
    definitions
        .iter()
        .position(|d| {
            d.type_name() == typ && d.name().to_lowercase().cmp(&name) == Ordering::Greater
        })
        .unwrap_or(definitions.len())
}
