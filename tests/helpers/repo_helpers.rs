//! Helpers for building policy repositories and applying jobs.

use std::fs;
use std::path::{Path, PathBuf};

use netspoc_edit::{Job, Repository, apply};
use serde_json::Value;
use tempfile::TempDir;

use super::policy_fixtures::POLICY;

/// In-memory repository over the fixture policy.
pub fn fixture_repo() -> Repository {
    Repository::from_sources("netspoc", POLICY).expect("fixture policy should parse")
}

/// Write `files` below a fresh temporary policy root.
pub fn policy_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for (relative, content) in files {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, content).expect("write policy file");
    }
    dir
}

pub fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).expect("read policy file")
}

/// Store a job as JSON file `name` inside `dir`.
pub fn job_file(dir: &Path, name: &str, job: Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, job.to_string()).expect("write job file");
    path
}

/// Apply a job given as JSON `{"method": ..., "params": ...}`.
pub fn apply_json(repo: &mut Repository, job: Value) -> netspoc_edit::Result<()> {
    let job: Job = serde_json::from_value(job).expect("job JSON");
    apply(repo, &job)
}

/// Rendered text of one file of `repo`.
pub fn rendered(repo: &Repository, path: &str) -> String {
    repo.file(path)
        .unwrap_or_else(|| panic!("no file {path}"))
        .render()
}

/// Paths of all dirty files, as strings.
pub fn dirty(repo: &Repository) -> Vec<String> {
    repo.dirty_paths()
        .into_iter()
        .map(|p| p.display().to_string())
        .collect()
}
