//! Whole worker runs against a policy directory on disk

use netspoc_edit::{PolicyError, run};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

use crate::helpers::policy_fixtures::{GROUPS, OWNERS, POLICY, TOPOLOGY};
use crate::helpers::repo_helpers::{job_file, policy_dir, read};

#[test]
fn test_run_writes_only_changed_files() {
    let policy = policy_dir(&POLICY);
    let jobs = TempDir::new().unwrap();
    let job = job_file(
        jobs.path(),
        "job1",
        json!({"method": "add_to_group", "params": {"name": "g1", "object": "network:n1"}}),
    );

    let written = run(policy.path(), &[job], false).unwrap();

    assert_eq!(written, [policy.path().join("group")]);
    assert_eq!(
        read(policy.path(), "group"),
        "# Server groups\ngroup:g1 =\n host:h10,\n network:n1,\n network:n2,\n;\n"
    );
    assert_eq!(read(policy.path(), "topology"), TOPOLOGY);
    assert_eq!(read(policy.path(), "owner"), OWNERS);
}

#[test]
fn test_dry_run_leaves_files_alone() {
    let policy = policy_dir(&POLICY);
    let jobs = TempDir::new().unwrap();
    let job = job_file(
        jobs.path(),
        "job1",
        json!({"method": "delete_owner", "params": {"name": "o2"}}),
    );

    let changed = run(policy.path(), &[job], true).unwrap();

    assert_eq!(changed, [policy.path().join("owner")]);
    assert_eq!(read(policy.path(), "owner"), OWNERS);
}

#[test]
fn test_failing_job_discards_earlier_jobs() {
    let policy = policy_dir(&POLICY);
    let jobs = TempDir::new().unwrap();
    let first = job_file(
        jobs.path(),
        "job1",
        json!({"method": "add_to_group", "params": {"name": "g1", "object": "network:n1"}}),
    );
    let second = job_file(
        jobs.path(),
        "job2",
        json!({"method": "delete_owner", "params": {"name": "o9"}}),
    );

    let err = run(policy.path(), &[first, second], false).unwrap_err();

    assert!(matches!(err, PolicyError::NotFound(_)));
    assert_eq!(read(policy.path(), "group"), GROUPS);
}

#[rstest]
fn test_failing_sub_job_leaves_every_file_unchanged(#[values(0, 1, 2, 3)] failing: usize) {
    let policy = policy_dir(&POLICY);
    let jobs = TempDir::new().unwrap();
    let mut sub_jobs = vec![
        json!({"method": "add_to_group", "params": {"name": "g1", "object": "network:n1"}}),
        json!({"method": "create_owner", "params": {"name": "o3", "admins": ["d@example.com"]}}),
        json!({"method": "add_to_user", "params": {"service": "s1", "user": "host:h10"}}),
        json!({"method": "create_service", "params": {"name": "web", "user": "network:n1"}}),
    ];
    sub_jobs.insert(
        failing,
        json!({"method": "delete_owner", "params": {"name": "o9"}}),
    );
    let job = job_file(
        jobs.path(),
        "job1",
        json!({"method": "multi_job", "params": {"jobs": sub_jobs}}),
    );

    let err = run(policy.path(), &[job], false).unwrap_err();

    assert!(matches!(err, PolicyError::NotFound(_)));
    for (relative, content) in POLICY {
        assert_eq!(read(policy.path(), relative), content, "{relative}");
    }
    assert!(!policy.path().join("rule/W").exists());
}

#[test]
fn test_new_file_is_created_on_disk() {
    let policy = policy_dir(&POLICY);
    let jobs = TempDir::new().unwrap();
    let job = job_file(
        jobs.path(),
        "job1",
        json!({"method": "create_service", "params": {"name": "web", "user": "network:n1"}}),
    );

    run(policy.path(), &[job], false).unwrap();

    assert_eq!(
        read(policy.path(), "rule/W"),
        "service:web = {\n user = network:n1;\n}\n"
    );
}

#[test]
fn test_bad_job_file() {
    let policy = policy_dir(&POLICY);
    let jobs = TempDir::new().unwrap();
    let path = jobs.path().join("broken");
    std::fs::write(&path, "{\"method\": ").unwrap();

    let err = run(policy.path(), &[path.clone()], false).unwrap_err();

    assert!(matches!(err, PolicyError::Json { .. }));
    assert!(
        err.to_string().starts_with(&format!("In JSON file {}", path.display())),
        "{err}"
    );
}

#[test]
fn test_missing_job_file() {
    let policy = policy_dir(&POLICY);
    let err = run(policy.path(), &[policy.path().join("no-such-job")], false).unwrap_err();
    assert!(matches!(err, PolicyError::Io { .. }));
}
