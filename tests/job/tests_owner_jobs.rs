//! create_owner, modify_owner and delete_owner

use netspoc_edit::{PolicyError, Repository};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use crate::helpers::policy_fixtures::OWNERS;
use crate::helpers::repo_helpers::{apply_json, dirty, fixture_repo, rendered};

#[test]
fn test_create_owner_sorted_at_end() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "create_owner", "params": {
            "name": "o3", "admins": ["z@example.com", "d@example.com"],
        }}),
    )
    .unwrap();
    let expected = format!(
        "{}\n\nowner:o3 = {{\n admins = d@example.com, z@example.com;\n}}\n",
        OWNERS.trim_end()
    );
    assert_eq!(rendered(&repo, "owner"), expected);
}

#[test]
fn test_create_owner_in_front() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "create_owner", "params": {
            "name": "o0", "admins": ["x@example.com"], "watchers": ["v@example.com"],
        }}),
    )
    .unwrap();
    let expected = format!(
        "owner:o0 = {{\n admins = x@example.com;\n watchers = v@example.com;\n}}\n\n{OWNERS}"
    );
    assert_eq!(rendered(&repo, "owner"), expected);
}

#[rstest]
#[case::empty_lists(
    json!({"name": "o9", "admins": [], "watchers": []}),
    "owner:o9 = {\n admins = ;\n watchers = ;\n}\n"
)]
#[case::empty_watchers(
    json!({"name": "o9", "admins": ["a"], "watchers": []}),
    "owner:o9 = {\n admins = a;\n watchers = ;\n}\n"
)]
#[case::null_watchers(
    json!({"name": "o9", "admins": ["a"], "watchers": null}),
    "owner:o9 = {\n admins = a;\n}\n"
)]
#[case::no_admins(json!({"name": "o9"}), "owner:o9 = {\n admins = ;\n}\n")]
fn test_create_owner_keeps_empty_lists(#[case] params: serde_json::Value, #[case] owner: &str) {
    let mut repo = fixture_repo();
    apply_json(&mut repo, json!({"method": "create_owner", "params": params})).unwrap();
    assert_eq!(rendered(&repo, "owner"), format!("{}\n\n{owner}", OWNERS.trim_end()));
}

#[test]
fn test_token_owner_goes_to_own_file() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "create_owner", "params": {"name": "DA_TOKEN_abc", "admins": ["t@example.com"]}}),
    )
    .unwrap();
    assert_eq!(
        rendered(&repo, "owner-token"),
        "owner:DA_TOKEN_abc = {\n admins = t@example.com;\n}\n"
    );
    assert_eq!(dirty(&repo), ["owner-token"]);
}

#[test]
fn test_create_existing_owner() {
    let mut repo = fixture_repo();
    let job = |ok_if_exists| {
        json!({"method": "create_owner", "params": {
            "name": "o1", "admins": ["new@example.com"], "ok_if_exists": ok_if_exists,
        }})
    };
    let err = apply_json(&mut repo, job(0)).unwrap_err();
    assert_eq!(err.to_string(), "Duplicate definition of owner:o1");
    apply_json(&mut repo, job(1)).unwrap();
    assert!(dirty(&repo).is_empty());
    assert_eq!(rendered(&repo, "owner"), OWNERS);
}

#[test]
fn test_modify_owner_replace_and_remove() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "modify_owner", "params": {
            "name": "o2", "admins": ["e@example.com", "d@example.com"], "watchers": [],
        }}),
    )
    .unwrap();
    let expected = OWNERS.replace(
        " admins = b@example.com, c@example.com;\n watchers = w@example.com;\n",
        " admins = d@example.com, e@example.com;\n",
    );
    assert_eq!(rendered(&repo, "owner"), expected);
}

#[test]
fn test_modify_owner_null_keeps_and_new_attribute_appends() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "modify_owner", "params": {"name": "o1", "watchers": ["w@example.com"]}}),
    )
    .unwrap();
    let expected = OWNERS.replace(
        " admins = a@example.com;\n",
        " admins = a@example.com;\n watchers = w@example.com;\n",
    );
    assert_eq!(rendered(&repo, "owner"), expected);
}

#[test]
fn test_delete_owner() {
    let mut repo = fixture_repo();
    apply_json(&mut repo, json!({"method": "delete_owner", "params": {"name": "o1"}})).unwrap();
    let expected = OWNERS.split_once("\n\n").unwrap().1;
    assert_eq!(rendered(&repo, "owner"), expected);

    let err = apply_json(&mut repo, json!({"method": "delete_owner", "params": {"name": "o1"}}))
        .unwrap_err();
    assert!(matches!(err, PolicyError::NotFound(_)));
}

#[test]
fn test_delete_first_owner_keeps_comment_of_next() {
    let source = "owner:a = {\n admins = a;\n}\n\n# owner b is the boss\nowner:b = {\n admins = b;\n}\n";
    let mut repo = Repository::from_sources("netspoc", [("owner", source)]).unwrap();
    apply_json(&mut repo, json!({"method": "delete_owner", "params": {"name": "a"}})).unwrap();
    assert_eq!(
        rendered(&repo, "owner"),
        "# owner b is the boss\nowner:b = {\n admins = b;\n}\n"
    );
}
