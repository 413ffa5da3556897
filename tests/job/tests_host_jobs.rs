//! create_host and modify_host

use netspoc_edit::PolicyError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use crate::helpers::policy_fixtures::TOPOLOGY;
use crate::helpers::repo_helpers::{apply_json, dirty, fixture_repo, rendered};

#[test]
fn test_host_in_single_line_network_unfolds_it() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "create_host", "params": {"network": "n2", "name": "h20", "ip": "10.1.2.20"}}),
    )
    .unwrap();
    let expected = TOPOLOGY.replace(
        "network:n2 = { ip = 10.1.2.0/24; }",
        "network:n2 = {\n ip = 10.1.2.0/24;\n host:h20 = { ip = 10.1.2.20; }\n}",
    );
    assert_eq!(rendered(&repo, "topology"), expected);
    assert_eq!(dirty(&repo), ["topology"]);
}

#[rstest]
#[case::owner_of_network_is_skipped(
    "o1",
    " host:h10 = { ip = 10.1.1.10; }\n host:h11 = { ip = 10.1.1.11; }\n"
)]
#[case::other_owner_is_kept(
    "o2",
    " host:h10 = { ip = 10.1.1.10; }\n host:h11 = { ip = 10.1.1.11; owner = o2; }\n"
)]
fn test_auto_network_by_ip_and_mask(#[case] owner: &str, #[case] hosts: &str) {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "create_host", "params": {
            "network": "[auto]", "name": "h11", "ip": "10.1.1.11",
            "mask": "255.255.255.0", "owner": owner,
        }}),
    )
    .unwrap();
    let expected = TOPOLOGY.replace(" host:h10 = { ip = 10.1.1.10; }\n", hosts);
    assert_eq!(rendered(&repo, "topology"), expected);
}

#[test]
fn test_hosts_stay_sorted() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "create_host", "params": {"network": "n1", "name": "h09", "ip": "10.1.1.9"}}),
    )
    .unwrap();
    let expected = TOPOLOGY.replace(
        " host:h10 = { ip = 10.1.1.10; }\n",
        " host:h09 = { ip = 10.1.1.9; }\n host:h10 = { ip = 10.1.1.10; }\n",
    );
    assert_eq!(rendered(&repo, "topology"), expected);
}

#[test]
fn test_id_host_is_scoped_to_its_network() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "create_host", "params": {
            "network": "[auto]", "name": "id:alice@example.com.n1",
            "ip": "10.1.1.12", "mask": "255.255.255.0",
        }}),
    )
    .unwrap();
    assert!(rendered(&repo, "topology").contains(
        " host:h10 = { ip = 10.1.1.10; }\n host:id:alice@example.com = { ip = 10.1.1.12; }\n"
    ));
}

#[rstest]
#[case::no_matching_ip(
    json!({"network": "[auto]", "name": "h", "ip": "10.9.9.9", "mask": "255.255.255.0"}),
    "Can't find network with 'ip = 10.9.9.0/24'"
)]
#[case::unknown_network(
    json!({"network": "n9", "name": "h", "ip": "10.9.9.9"}),
    "Can't find network:n9"
)]
#[case::duplicate_host(
    json!({"network": "n1", "name": "h10", "ip": "10.1.1.10"}),
    "Duplicate definition of host:h10 in network:n1"
)]
#[case::bad_mask(
    json!({"network": "[auto]", "name": "h", "ip": "10.1.1.9", "mask": "255.0.255.0"}),
    "Invalid IP mask: '255.0.255.0'"
)]
fn test_create_host_errors(#[case] params: serde_json::Value, #[case] message: &str) {
    let mut repo = fixture_repo();
    let err = apply_json(&mut repo, json!({"method": "create_host", "params": params})).unwrap_err();
    assert_eq!(err.to_string(), message);
}

#[test]
fn test_modify_host_sets_and_removes_owner() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "modify_host", "params": {"name": "h10", "owner": "o2"}}),
    )
    .unwrap();
    assert!(rendered(&repo, "topology").contains(" host:h10 = { ip = 10.1.1.10; owner = o2; }\n"));

    apply_json(
        &mut repo,
        json!({"method": "modify_host", "params": {"name": "h10", "owner": ""}}),
    )
    .unwrap();
    assert_eq!(rendered(&repo, "topology"), TOPOLOGY);
}

#[test]
fn test_modify_unknown_host() {
    let mut repo = fixture_repo();
    let err = apply_json(
        &mut repo,
        json!({"method": "modify_host", "params": {"name": "h99", "owner": "o2"}}),
    )
    .unwrap_err();
    assert!(matches!(err, PolicyError::NotFound(ref what) if what == "host:h99"));
}
