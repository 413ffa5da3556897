//! Older service methods taking one object or protocol per job.

use super::params::{ServiceObject, ServiceRule, ServiceRuleNum, ServiceRuleObject, ServiceRuleProtocol};
use super::service::{
    add_elements, modify_rule, parse_action, protocols, remove_elements, remove_values,
};
use super::{qualify, rule_index};
use crate::error::{PolicyError, Result};
use crate::parser::parse_union;
use crate::project::Repository;
use crate::syntax::ast::{Element, NamedUnion, Rule, ServiceDef};
use crate::syntax::edit::{self, split_values};
use crate::syntax::order;

pub(super) fn add_service_user(repo: &mut Repository, p: ServiceObject) -> Result<()> {
    let elements = parse_union(&p.object)?;
    repo.modify_by_name(&qualify("service", &p.name), |sv: &mut ServiceDef| {
        add_elements(&mut sv.user, elements);
        Ok(())
    })
}

pub(super) fn delete_service_user(repo: &mut Repository, p: ServiceObject) -> Result<()> {
    let service = qualify("service", &p.name);
    let elements = parse_union(&p.object)?;
    repo.modify_by_name(&service, |sv: &mut ServiceDef| {
        remove_elements(&mut sv.user, &elements, &service)
    })
}

pub(super) fn add_service_protocol(repo: &mut Repository, p: ServiceRuleProtocol) -> Result<()> {
    let service = qualify("service", &p.name);
    let context = format!("rule {} of {service}", p.rule_num);
    let values = split_values(&p.prt);
    modify_rule(repo, &service, p.rule_num, |rule| {
        protocols(rule, &context)?.extend(values);
        Ok(())
    })
}

pub(super) fn delete_service_protocol(repo: &mut Repository, p: ServiceRuleProtocol) -> Result<()> {
    let service = qualify("service", &p.name);
    let context = format!("rule {} of {service}", p.rule_num);
    let values = split_values(&p.prt);
    modify_rule(repo, &service, p.rule_num, |rule| {
        remove_values(protocols(rule, &context)?, &values, &context)
    })
}

/// Add `object` to the server side of a rule. A side holding only `user`
/// is the user side and stays untouched.
pub(super) fn add_service_server(repo: &mut Repository, p: ServiceRuleObject) -> Result<()> {
    let service = qualify("service", &p.name);
    let elements = parse_union(&p.object)?;
    modify_rule(repo, &service, p.rule_num, |rule| {
        for side in [&mut rule.src, &mut rule.dst] {
            if !side.is_user_only() {
                add_elements(side, elements.clone());
            }
        }
        Ok(())
    })
}

pub(super) fn delete_service_server(repo: &mut Repository, p: ServiceRuleObject) -> Result<()> {
    let service = qualify("service", &p.name);
    let elements = parse_union(&p.object)?;
    modify_rule(repo, &service, p.rule_num, |rule| {
        let mut found = false;
        for element in &elements {
            for side in [&mut rule.src, &mut rule.dst] {
                found |= edit::remove_element(&mut side.elements, element);
            }
        }
        if !found {
            return Err(PolicyError::not_found(format!(
                "{} in rule {} of {service}",
                p.object, p.rule_num
            )));
        }
        Ok(())
    })
}

pub(super) fn add_service_rule(repo: &mut Repository, p: ServiceRule) -> Result<()> {
    let action = parse_action(&p.action)?;
    let mut objects = Vec::new();
    for object in &p.objects {
        objects.extend(parse_union(object)?);
    }
    let user = vec![Element::User];
    let (src, dst) = match p.user.as_str() {
        "src" => (user, objects),
        "dst" => (objects, user),
        other => return Err(PolicyError::invalid(format!("Invalid 'user': '{other}'"))),
    };
    let prt = p
        .protocols
        .iter()
        .flat_map(|protocol| split_values(protocol))
        .map(|v| v.text)
        .collect();
    let mut rule = Rule::new(action, src, dst, prt);
    order::normalize_union(&mut rule.src);
    order::normalize_union(&mut rule.dst);
    repo.modify_by_name(&qualify("service", &p.name), |sv: &mut ServiceDef| {
        order::insert_rule(&mut sv.rules, rule);
        Ok(())
    })
}

pub(super) fn delete_service_rule(repo: &mut Repository, p: ServiceRuleNum) -> Result<()> {
    let service = qualify("service", &p.name);
    repo.modify_by_name(&service, |sv: &mut ServiceDef| {
        let index = rule_index(&service, sv.rules.len(), p.rule_num)?;
        sv.rules.remove(index);
        Ok(())
    })
}
