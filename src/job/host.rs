use std::net::Ipv4Addr;

use tracing::debug;

use super::params::{CreateHost, ModifyHost};
use super::qualify;
use crate::error::{PolicyError, Result};
use crate::project::Repository;
use crate::syntax::ast::{Attribute, Definition, NetworkDef, Value};
use crate::syntax::{edit, order};

/// Network selector of `create_host` meaning "the network containing ip".
const AUTO_NETWORK: &str = "[auto]";

/// Split an ID host `id:a.b@c.d.net` into host name and network.
///
/// Other host names are returned unchanged, without network.
fn split_id_host(name: &str) -> (&str, Option<String>) {
    if name.starts_with("id:") {
        if let Some((host, network)) = name.rsplit_once('.') {
            return (host, Some(qualify("network", network)));
        }
    }
    (name, None)
}

/// Network address of `ip` under `mask` in `a.b.c.d/len` notation.
fn network_address(ip: &str, mask: Option<&str>) -> Result<String> {
    let ip: Ipv4Addr = ip
        .parse()
        .map_err(|_| PolicyError::invalid(format!("Invalid IP address: '{ip}'")))?;
    let mask_text = mask.unwrap_or_default();
    let mask = mask_text
        .parse::<Ipv4Addr>()
        .ok()
        .map(u32::from)
        .filter(|m| m.leading_ones() + m.trailing_zeros() == 32)
        .ok_or_else(|| PolicyError::invalid(format!("Invalid IP mask: '{mask_text}'")))?;
    let network = Ipv4Addr::from(u32::from(ip) & mask);
    Ok(format!("{network}/{}", mask.leading_ones()))
}

fn attribute_value<'a>(network: &'a NetworkDef, name: &str) -> Option<&'a str> {
    network.attribute(name).and_then(Attribute::first_value)
}

pub(super) fn create_host(repo: &mut Repository, p: CreateHost) -> Result<()> {
    let (host_name, scope) = split_id_host(&p.name);
    let host = format!("host:{host_name}");
    let (network, address) = if p.network == AUTO_NETWORK {
        (scope, Some(network_address(&p.ip, p.mask.as_deref())?))
    } else {
        (Some(qualify("network", &p.network)), None)
    };

    let selected = |net: &NetworkDef| {
        network.as_deref().is_none_or(|name| net.name == name)
            && address
                .as_deref()
                .is_none_or(|addr| attribute_value(net, "ip") == Some(addr))
    };
    let touched = repo.modify_matching(
        |def| matches!(def, Definition::Network(net) if selected(net)),
        |def| match def {
            Definition::Network(net) => add_host(net, &host, &p.ip, p.owner.as_deref()),
            _ => Ok(()),
        },
    )?;
    if touched == 0 {
        return Err(match (network, address) {
            (_, Some(address)) => {
                PolicyError::not_found(format!("network with 'ip = {address}'"))
            }
            (Some(network), None) => PolicyError::not_found(network),
            (None, None) => PolicyError::not_found("network"),
        });
    }
    Ok(())
}

fn add_host(network: &mut NetworkDef, host: &str, ip: &str, owner: Option<&str>) -> Result<()> {
    if network.hosts().any(|h| h.name == host) {
        return Err(PolicyError::AlreadyExists(format!(
            "{host} in {}",
            network.name
        )));
    }
    // An owner equal to the network's owner is inherited anyway.
    let owner = owner
        .filter(|o| !o.is_empty())
        .filter(|o| attribute_value(network, "owner") != Some(*o));
    let mut attributes = vec![Attribute::values("ip", [ip])];
    if let Some(owner) = owner {
        attributes.push(Attribute::values("owner", [owner]));
    }
    debug!(host, network = %network.name, "add host");
    network.attributes.push(Attribute::complex(host, attributes));
    order::sort_hosts(&mut network.attributes);
    Ok(())
}

pub(super) fn modify_host(repo: &mut Repository, p: ModifyHost) -> Result<()> {
    let (host_name, scope) = split_id_host(&p.name);
    let host = format!("host:{host_name}");
    let owner = p.owner.as_deref().filter(|o| !o.is_empty());

    let in_scope = |net: &NetworkDef| {
        scope.as_deref().is_none_or(|name| net.name == name) && net.hosts().any(|h| h.name == host)
    };
    let touched = repo.modify_matching(
        |def| matches!(def, Definition::Network(net) if in_scope(net)),
        |def| {
            let Definition::Network(net) = def else {
                return Ok(());
            };
            let Some(entry) = net.host_mut(&host) else {
                return Ok(());
            };
            let attributes = entry.sub_attributes_mut().ok_or_else(|| {
                PolicyError::invalid(format!("{host} has no attribute block"))
            })?;
            match owner {
                Some(owner) => edit::set_values(attributes, "owner", vec![Value::new(owner)]),
                None => {
                    edit::remove_attribute(attributes, "owner");
                }
            }
            Ok(())
        },
    )?;
    if touched == 0 {
        return Err(PolicyError::not_found(host));
    }
    Ok(())
}
