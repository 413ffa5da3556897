//! Discovery, reading and atomic writing of policy files.

use std::io::Write;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::config::{CONFIG_FILE, RepoConfig};
use crate::error::{PolicyError, Result};

/// Directory below the root holding unprocessed device configs.
pub const RAW_DIR: &str = "raw";

/// Collect all policy files below `root`, as paths relative to `root`,
/// in sorted walk order.
pub fn collect_file_paths(root: &Path, config: &RepoConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PolicyError::not_found(format!(
            "policy directory {}",
            root.display()
        )));
    }
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry, config));

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory loop"));
            PolicyError::io(path, source)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            paths.push(relative.to_path_buf());
        }
    }
    Ok(paths)
}

fn is_skipped(entry: &DirEntry, config: &RepoConfig) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let Some(name) = entry.file_name().to_str() else {
        return true;
    };
    if name.starts_with('.') || config.is_ignored(name) {
        return true;
    }
    entry.depth() == 1
        && ((name == CONFIG_FILE && entry.file_type().is_file())
            || (name == RAW_DIR && entry.file_type().is_dir()))
}

pub fn load_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| PolicyError::io(path, e))
}

/// Replace `path` with `content` through a temporary file in the same
/// directory. Missing parent directories are created.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| PolicyError::io(parent, e))?;

    let mut temp_file =
        tempfile::NamedTempFile::new_in(parent).map_err(|e| PolicyError::io(parent, e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| PolicyError::io(temp_file.path(), e))?;
    temp_file
        .persist(path)
        .map_err(|e| PolicyError::io(path, e.error))?;
    Ok(())
}
