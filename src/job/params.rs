//! Typed parameters of each job method.

use std::path::PathBuf;

use serde::Deserialize;
use serde::de::{DeserializeOwned, Deserializer};

use super::Job;
use crate::error::{PolicyError, Result};
use crate::parser::parse_union;
use crate::syntax::ast::{Element, Value, normalize_value};
use crate::syntax::edit::split_values;

/// Decode the params of `job` into `T`. Absent params decode like `{}`.
pub fn decode<T: DeserializeOwned>(job: &Job) -> Result<T> {
    let params = job
        .params
        .clone()
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
    serde_json::from_value(params)
        .map_err(|e| PolicyError::invalid(format!("Invalid params of '{}': {e}", job.method)))
}

/// A string or a list of strings, e.g. `"host:a, host:b"` or
/// `["host:a", "host:b"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Text {
    One(String),
    Many(Vec<String>),
}

impl Text {
    pub fn elements(&self) -> Result<Vec<Element>> {
        match self {
            Self::One(text) => parse_union(text),
            Self::Many(parts) => {
                let mut elements = Vec::new();
                for part in parts {
                    elements.extend(parse_union(part)?);
                }
                Ok(elements)
            }
        }
    }

    /// Protocol tokens; a single string may hold a comma separated list.
    pub fn values(&self) -> Vec<Value> {
        match self {
            Self::One(text) => split_values(text),
            Self::Many(parts) => parts
                .iter()
                .map(|p| normalize_value(p))
                .filter(|p| !p.is_empty())
                .map(Value::new)
                .collect(),
        }
    }
}

/// `ok_if_exists` arrives as a boolean or as `0`/`1`.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        None => false,
    })
}

#[derive(Debug, Deserialize)]
pub struct MultiJob {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
pub struct ByName {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateToplevel {
    pub definition: String,
    pub file: PathBuf,
    #[serde(default, deserialize_with = "flag")]
    pub ok_if_exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateOwner {
    pub name: String,
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub watchers: Option<Vec<String>>,
    #[serde(default, deserialize_with = "flag")]
    pub ok_if_exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct ModifyOwner {
    pub name: String,
    #[serde(default)]
    pub admins: Option<Vec<String>>,
    #[serde(default)]
    pub watchers: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateHost {
    pub network: String,
    pub name: String,
    pub ip: String,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModifyHost {
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddToGroup {
    pub name: String,
    pub object: Text,
}

#[derive(Debug, Deserialize)]
pub struct RuleParams {
    pub action: String,
    pub src: Text,
    pub dst: Text,
    pub prt: Text,
}

#[derive(Debug, Deserialize)]
pub struct CreateService {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub user: Text,
    #[serde(default)]
    pub rules: Vec<RuleParams>,
    #[serde(default, deserialize_with = "flag")]
    pub ok_if_exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct RuleEdit {
    pub service: String,
    pub rule_num: i64,
    #[serde(default)]
    pub src: Option<Text>,
    #[serde(default)]
    pub dst: Option<Text>,
    #[serde(default)]
    pub prt: Option<Text>,
}

#[derive(Debug, Deserialize)]
pub struct AddRule {
    pub service: String,
    #[serde(flatten)]
    pub rule: RuleParams,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRule {
    pub service: String,
    pub rule_num: i64,
}

#[derive(Debug, Deserialize)]
pub struct UserEdit {
    pub service: String,
    pub user: Text,
}

// Parameters of the older service methods.

#[derive(Debug, Deserialize)]
pub struct ServiceObject {
    pub name: String,
    pub object: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRuleObject {
    pub name: String,
    pub rule_num: i64,
    pub object: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRuleProtocol {
    pub name: String,
    pub rule_num: i64,
    pub prt: String,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRuleNum {
    pub name: String,
    pub rule_num: i64,
}

#[derive(Debug, Deserialize)]
pub struct ServiceRule {
    pub name: String,
    pub action: String,
    pub user: String,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub protocols: Vec<String>,
}
