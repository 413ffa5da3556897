use std::path::Path;

use super::params::{ByName, CreateOwner, ModifyOwner};
use super::qualify;
use super::toplevel::create_definition;
use crate::error::Result;
use crate::project::Repository;
use crate::syntax::ast::{Attribute, Definition, StructDef};
use crate::syntax::edit;

/// Owners used as API tokens live in their own file.
fn owner_file(name: &str) -> &'static Path {
    if name.starts_with("DA_TOKEN_") {
        Path::new("owner-token")
    } else {
        Path::new("owner")
    }
}

pub(super) fn create_owner(repo: &mut Repository, p: CreateOwner) -> Result<()> {
    let name = qualify("owner", &p.name);
    let bare = name.trim_start_matches("owner:");
    let mut owner = StructDef::new(name.as_str());
    edit::set_sorted_values(&mut owner.attributes, "admins", &p.admins);
    if let Some(watchers) = p.watchers.as_deref() {
        edit::set_sorted_values(&mut owner.attributes, "watchers", watchers);
    }
    create_definition(repo, owner_file(bare), Definition::Struct(owner), p.ok_if_exists)
}

pub(super) fn modify_owner(repo: &mut Repository, p: ModifyOwner) -> Result<()> {
    repo.modify_by_name(&qualify("owner", &p.name), |owner: &mut StructDef| {
        change_list(&mut owner.attributes, "admins", p.admins.as_deref());
        change_list(&mut owner.attributes, "watchers", p.watchers.as_deref());
        Ok(())
    })
}

/// `None` keeps the attribute, an empty list removes it, anything else
/// replaces it.
fn change_list(attributes: &mut Vec<Attribute>, name: &str, list: Option<&[String]>) {
    match list {
        None => {}
        Some([]) => {
            edit::remove_attribute(attributes, name);
        }
        Some(list) => edit::set_sorted_values(attributes, name, list),
    }
}

pub(super) fn delete_owner(repo: &mut Repository, p: ByName) -> Result<()> {
    repo.delete(&qualify("owner", &p.name)).map(drop)
}
