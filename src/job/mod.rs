//! Job interpreter: decodes change requests and applies them to a
//! [`Repository`] as tree edits.
//!
//! Every failure aborts the whole run. Edits only live in memory until
//! [`run`] writes the dirty files after the last job succeeded.

mod host;
mod legacy;
mod owner;
pub mod params;
mod service;
mod toplevel;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PolicyError, Result};
use crate::project::Repository;
use params::decode;

/// One change request as stored in a job file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    /// Change request id, passed through for the commit message.
    #[serde(default)]
    pub crq: Option<String>,
}

impl Job {
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params: Some(params),
            crq: None,
        }
    }
}

/// All methods understood by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    MultiJob,
    CreateToplevel,
    DeleteToplevel,
    CreateOwner,
    ModifyOwner,
    DeleteOwner,
    CreateHost,
    ModifyHost,
    AddToGroup,
    CreateService,
    DeleteService,
    AddToRule,
    RemoveFromRule,
    AddRule,
    DeleteRule,
    AddToUser,
    RemoveFromUser,
    AddServiceUser,
    DeleteServiceUser,
    AddServiceProtocol,
    DeleteServiceProtocol,
    AddServiceServer,
    DeleteServiceServer,
    AddServiceRule,
    DeleteServiceRule,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        let method = match name {
            "multi_job" => Self::MultiJob,
            "create_toplevel" => Self::CreateToplevel,
            "delete_toplevel" => Self::DeleteToplevel,
            "create_owner" => Self::CreateOwner,
            "modify_owner" => Self::ModifyOwner,
            "delete_owner" => Self::DeleteOwner,
            "create_host" => Self::CreateHost,
            "modify_host" => Self::ModifyHost,
            "add_to_group" => Self::AddToGroup,
            "create_service" => Self::CreateService,
            "delete_service" => Self::DeleteService,
            "add_to_rule" => Self::AddToRule,
            "remove_from_rule" => Self::RemoveFromRule,
            "add_rule" => Self::AddRule,
            "delete_rule" => Self::DeleteRule,
            "add_to_user" => Self::AddToUser,
            "remove_from_user" => Self::RemoveFromUser,
            "add_service_user" => Self::AddServiceUser,
            "delete_service_user" => Self::DeleteServiceUser,
            "add_service_protocol" => Self::AddServiceProtocol,
            "delete_service_protocol" => Self::DeleteServiceProtocol,
            "add_service_server" => Self::AddServiceServer,
            "delete_service_server" => Self::DeleteServiceServer,
            "add_service_rule" => Self::AddServiceRule,
            "delete_service_rule" => Self::DeleteServiceRule,
            _ => return None,
        };
        Some(method)
    }
}

/// Apply one job, recursing into `multi_job`.
pub fn apply(repo: &mut Repository, job: &Job) -> Result<()> {
    let method = Method::from_name(&job.method)
        .ok_or_else(|| PolicyError::invalid(format!("Unknown method '{}'", job.method)))?;
    info!(method = %job.method, crq = job.crq.as_deref().unwrap_or("-"), "apply job");
    match method {
        Method::MultiJob => {
            let p: params::MultiJob = decode(job)?;
            for sub in &p.jobs {
                apply(repo, sub)?;
            }
            Ok(())
        }
        Method::CreateToplevel => toplevel::create_toplevel(repo, decode(job)?),
        Method::DeleteToplevel => toplevel::delete_toplevel(repo, decode(job)?),
        Method::AddToGroup => toplevel::add_to_group(repo, decode(job)?),
        Method::CreateOwner => owner::create_owner(repo, decode(job)?),
        Method::ModifyOwner => owner::modify_owner(repo, decode(job)?),
        Method::DeleteOwner => owner::delete_owner(repo, decode(job)?),
        Method::CreateHost => host::create_host(repo, decode(job)?),
        Method::ModifyHost => host::modify_host(repo, decode(job)?),
        Method::CreateService => service::create_service(repo, decode(job)?),
        Method::DeleteService => service::delete_service(repo, decode(job)?),
        Method::AddToRule => service::add_to_rule(repo, decode(job)?),
        Method::RemoveFromRule => service::remove_from_rule(repo, decode(job)?),
        Method::AddRule => service::add_rule(repo, decode(job)?),
        Method::DeleteRule => service::delete_rule(repo, decode(job)?),
        Method::AddToUser => service::add_to_user(repo, decode(job)?),
        Method::RemoveFromUser => service::remove_from_user(repo, decode(job)?),
        Method::AddServiceUser => legacy::add_service_user(repo, decode(job)?),
        Method::DeleteServiceUser => legacy::delete_service_user(repo, decode(job)?),
        Method::AddServiceProtocol => legacy::add_service_protocol(repo, decode(job)?),
        Method::DeleteServiceProtocol => legacy::delete_service_protocol(repo, decode(job)?),
        Method::AddServiceServer => legacy::add_service_server(repo, decode(job)?),
        Method::DeleteServiceServer => legacy::delete_service_server(repo, decode(job)?),
        Method::AddServiceRule => legacy::add_service_rule(repo, decode(job)?),
        Method::DeleteServiceRule => legacy::delete_service_rule(repo, decode(job)?),
    }
}

pub fn read_job_file(path: &Path) -> Result<Job> {
    let data = std::fs::read_to_string(path).map_err(|e| PolicyError::io(path, e))?;
    serde_json::from_str(&data).map_err(|source| PolicyError::Json {
        context: format!("In JSON file {}", path.display()),
        source,
    })
}

/// Load the policy below `root`, apply all job files in order and write
/// the changed files. With `dry_run` nothing is written.
///
/// Returns the paths of the changed files.
pub fn run(root: &Path, job_files: &[PathBuf], dry_run: bool) -> Result<Vec<PathBuf>> {
    let mut repo = Repository::load(root)?;
    for path in job_files {
        let job = read_job_file(path)?;
        apply(&mut repo, &job)?;
    }
    if dry_run {
        return Ok(repo
            .dirty_paths()
            .into_iter()
            .map(|p| repo.root().join(p))
            .collect());
    }
    repo.write_back()
}

/// `name` with a `typ:` prefix, unless it already has one.
fn qualify(typ: &str, name: &str) -> String {
    match name.strip_prefix(typ).and_then(|rest| rest.strip_prefix(':')) {
        Some(_) => name.to_string(),
        None => format!("{typ}:{name}"),
    }
}

/// 1-based rule number to index.
fn rule_index(service: &str, count: usize, rule_num: i64) -> Result<usize> {
    usize::try_from(rule_num)
        .ok()
        .filter(|n| (1..=count).contains(n))
        .map(|n| n - 1)
        .ok_or_else(|| {
            PolicyError::not_found(format!(
                "rule {rule_num} of {service}: invalid rule_num {rule_num}, have {count} rules"
            ))
        })
}
