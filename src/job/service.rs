//! Service and rule methods.

use std::path::PathBuf;

use super::params::{
    AddRule, ByName, CreateService, DeleteRule, RuleEdit, RuleParams, UserEdit,
};
use super::toplevel::create_definition;
use super::{qualify, rule_index};
use crate::error::{PolicyError, Result};
use crate::project::Repository;
use crate::syntax::ast::{Action, Definition, Element, ElementRef, NamedUnion, Rule, ServiceDef, Value};
use crate::syntax::edit;
use crate::syntax::formatter::render_element;
use crate::syntax::order;

/// File for a new service: `rule/<first letter>`, or `rule/other`.
pub(super) fn service_path(bare_name: &str) -> PathBuf {
    let bucket = match bare_name.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() => c.to_ascii_uppercase().to_string(),
        _ => "other".to_string(),
    };
    PathBuf::from("rule").join(bucket)
}

pub(super) fn parse_action(action: &str) -> Result<Action> {
    Action::from_keyword(action)
        .ok_or_else(|| PolicyError::invalid(format!("Invalid 'action': '{action}'")))
}

fn build_rule(p: &RuleParams) -> Result<Rule> {
    let prt = p.prt.values().into_iter().map(|v| v.text).collect();
    let mut rule = Rule::new(parse_action(&p.action)?, p.src.elements()?, p.dst.elements()?, prt);
    order::normalize_union(&mut rule.src);
    order::normalize_union(&mut rule.dst);
    Ok(rule)
}

pub(super) fn create_service(repo: &mut Repository, p: CreateService) -> Result<()> {
    let name = qualify("service", &p.name);
    let file = service_path(name.trim_start_matches("service:"));
    let mut service = ServiceDef::new(name.as_str(), p.user.elements()?);
    service.description = p.description.as_deref().map(Into::into);
    for rule in &p.rules {
        order::insert_rule(&mut service.rules, build_rule(rule)?);
    }
    create_definition(repo, &file, Definition::Service(service), p.ok_if_exists)
}

pub(super) fn delete_service(repo: &mut Repository, p: ByName) -> Result<()> {
    repo.delete(&qualify("service", &p.name)).map(drop)
}

/// Edit rule `rule_num` of `service`.
pub(super) fn modify_rule<F>(repo: &mut Repository, service: &str, rule_num: i64, edit: F) -> Result<()>
where
    F: FnOnce(&mut Rule) -> Result<()>,
{
    repo.modify_by_name(service, |sv: &mut ServiceDef| {
        let index = rule_index(service, sv.rules.len(), rule_num)?;
        edit(&mut sv.rules[index])
    })
}

pub(super) fn add_elements(union: &mut NamedUnion, elements: Vec<Element>) {
    union.elements.extend(elements.into_iter().map(ElementRef::new));
    order::normalize_union(union);
}

/// Remove every element from `union`; the first missing one is an error
/// naming `context`.
pub(super) fn remove_elements(union: &mut NamedUnion, elements: &[Element], context: &str) -> Result<()> {
    for element in elements {
        if !edit::remove_element(&mut union.elements, element) {
            return Err(PolicyError::not_found(format!(
                "{} in '{}' of {context}",
                render_element(element),
                union.name
            )));
        }
    }
    Ok(())
}

/// Protocols of `rule` for editing; a bare `prt;` has no list to edit.
pub(super) fn protocols<'r>(rule: &'r mut Rule, context: &str) -> Result<&'r mut Vec<Value>> {
    rule.protocols_mut()
        .ok_or_else(|| PolicyError::invalid(format!("'prt' of {context} is not a value list")))
}

pub(super) fn remove_values(values: &mut Vec<Value>, remove: &[Value], context: &str) -> Result<()> {
    for value in remove {
        if !edit::remove_value(values, &value.text) {
            return Err(PolicyError::not_found(format!(
                "'{}' in 'prt' of {context}",
                value.text
            )));
        }
    }
    Ok(())
}

pub(super) fn add_to_rule(repo: &mut Repository, p: RuleEdit) -> Result<()> {
    let service = qualify("service", &p.service);
    let context = format!("rule {} of {service}", p.rule_num);
    let src = p.src.as_ref().map(|t| t.elements()).transpose()?;
    let dst = p.dst.as_ref().map(|t| t.elements()).transpose()?;
    let prt = p.prt.as_ref().map(|t| t.values());
    modify_rule(repo, &service, p.rule_num, |rule| {
        if let Some(prt) = prt {
            protocols(rule, &context)?.extend(prt);
        }
        if let Some(src) = src {
            add_elements(&mut rule.src, src);
        }
        if let Some(dst) = dst {
            add_elements(&mut rule.dst, dst);
        }
        Ok(())
    })
}

pub(super) fn remove_from_rule(repo: &mut Repository, p: RuleEdit) -> Result<()> {
    let service = qualify("service", &p.service);
    let context = format!("rule {} of {service}", p.rule_num);
    let src = p.src.as_ref().map(|t| t.elements()).transpose()?;
    let dst = p.dst.as_ref().map(|t| t.elements()).transpose()?;
    let prt = p.prt.as_ref().map(|t| t.values());
    modify_rule(repo, &service, p.rule_num, |rule| {
        if let Some(src) = &src {
            remove_elements(&mut rule.src, src, &context)?;
        }
        if let Some(dst) = &dst {
            remove_elements(&mut rule.dst, dst, &context)?;
        }
        if let Some(prt) = &prt {
            remove_values(protocols(rule, &context)?, prt, &context)?;
        }
        Ok(())
    })
}

pub(super) fn add_rule(repo: &mut Repository, p: AddRule) -> Result<()> {
    let rule = build_rule(&p.rule)?;
    repo.modify_by_name(&qualify("service", &p.service), |sv: &mut ServiceDef| {
        order::insert_rule(&mut sv.rules, rule);
        Ok(())
    })
}

pub(super) fn delete_rule(repo: &mut Repository, p: DeleteRule) -> Result<()> {
    let service = qualify("service", &p.service);
    repo.modify_by_name(&service, |sv: &mut ServiceDef| {
        let index = rule_index(&service, sv.rules.len(), p.rule_num)?;
        sv.rules.remove(index);
        Ok(())
    })
}

pub(super) fn add_to_user(repo: &mut Repository, p: UserEdit) -> Result<()> {
    let elements = p.user.elements()?;
    repo.modify_by_name(&qualify("service", &p.service), |sv: &mut ServiceDef| {
        add_elements(&mut sv.user, elements);
        Ok(())
    })
}

pub(super) fn remove_from_user(repo: &mut Repository, p: UserEdit) -> Result<()> {
    let service = qualify("service", &p.service);
    let elements = p.user.elements()?;
    repo.modify_by_name(&service, |sv: &mut ServiceDef| {
        remove_elements(&mut sv.user, &elements, &service)
    })
}
