//! Generic toplevel methods: create, delete, group membership.

use std::path::Path;

use tracing::debug;

use super::params::{AddToGroup, ByName, CreateToplevel};
use super::qualify;
use crate::error::Result;
use crate::parser::parse_definition;
use crate::project::Repository;
use crate::syntax::ast::{Definition, ElementRef, ListDef};
use crate::syntax::order;

pub(super) fn create_toplevel(repo: &mut Repository, p: CreateToplevel) -> Result<()> {
    let def = parse_definition(&p.definition)?;
    create_definition(repo, &p.file, def, p.ok_if_exists)
}

/// Insert `def` into `file`, or do nothing if `ok_if_exists` and the
/// name is already taken.
pub(super) fn create_definition(
    repo: &mut Repository,
    file: &Path,
    mut def: Definition,
    ok_if_exists: bool,
) -> Result<()> {
    if ok_if_exists && repo.contains(def.name()) {
        debug!(name = def.name(), "already exists");
        return Ok(());
    }
    order::normalize(&mut def);
    repo.create(file, def)
}

pub(super) fn delete_toplevel(repo: &mut Repository, p: ByName) -> Result<()> {
    repo.delete(&p.name).map(drop)
}

pub(super) fn add_to_group(repo: &mut Repository, p: AddToGroup) -> Result<()> {
    let elements = p.object.elements()?;
    repo.modify_by_name(&qualify("group", &p.name), |group: &mut ListDef| {
        group
            .elements
            .extend(elements.into_iter().map(ElementRef::new));
        order::sort_elements(&mut group.elements);
        Ok(())
    })
}
