//! Policy root configuration, read from `<root>/config`.

use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::{PolicyError, Result};

/// Base names never loaded as policy files.
pub const DEFAULT_IGNORE_FILES: &str = r"^(CVS|RCS|\.#.*|.*~)$";

/// Name of the configuration file inside the policy root.
pub const CONFIG_FILE: &str = "config";

#[derive(Debug, Clone)]
pub struct RepoConfig {
    /// Matched against the base name of every file and directory.
    pub ignore_files: Regex,
}

impl RepoConfig {
    pub fn with_defaults() -> Result<Self> {
        Ok(Self {
            ignore_files: compile_ignore(DEFAULT_IGNORE_FILES)?,
        })
    }

    /// Read `<root>/config`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            return Self::with_defaults();
        }
        let text = std::fs::read_to_string(&path).map_err(|e| PolicyError::io(&path, e))?;
        Self::parse(&text)
    }

    /// Parse lines of the form `key = value;`. Lines starting with `#`
    /// are comments.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::with_defaults()?;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(PolicyError::Config(format!("Expected 'key = value;', got '{line}'")));
            };
            let key = key.trim();
            let value = value.trim();
            let value = value.strip_suffix(';').unwrap_or(value).trim_end();
            match key {
                "ignore_files" => {
                    config.ignore_files = compile_ignore(value)?;
                }
                _ => debug!(key, "ignoring unknown config key"),
            }
        }
        Ok(config)
    }

    pub fn is_ignored(&self, base_name: &str) -> bool {
        self.ignore_files.is_match(base_name)
    }
}

fn compile_ignore(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| PolicyError::Config(format!("Invalid regex for ignore_files: {e}")))
}
