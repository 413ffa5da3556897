//! Older per-object service methods

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use crate::helpers::policy_fixtures::SERVICES;
use crate::helpers::repo_helpers::{apply_json, dirty, fixture_repo, rendered};

const PERMIT: &str = " permit src = user;\n        dst = host:h10;\n        prt = tcp 80;\n";

#[test]
fn test_add_service_server_skips_user_side() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "add_service_server", "params": {"name": "s1", "rule_num": 1, "object": "host:h11"}}),
    )
    .unwrap();
    assert_eq!(
        rendered(&repo, "rule/S"),
        SERVICES.replace("dst = host:h10;", "dst = host:h10, host:h11;")
    );
}

#[test]
fn test_delete_service_server() {
    let mut repo = fixture_repo();
    let err = apply_json(
        &mut repo,
        json!({"method": "delete_service_server", "params": {"name": "s1", "rule_num": 1, "object": "host:zz"}}),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Can't find host:zz in rule 1 of service:s1");

    apply_json(
        &mut repo,
        json!({"method": "delete_service_server", "params": {"name": "s1", "rule_num": 1, "object": "host:h10"}}),
    )
    .unwrap();
    assert_eq!(
        rendered(&repo, "rule/S"),
        SERVICES.replace("dst = host:h10;", "dst = ;")
    );
}

#[test]
fn test_add_service_rule_on_dst_user() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "add_service_rule", "params": {
            "name": "s1", "action": "permit", "user": "dst",
            "objects": ["host:h10"], "protocols": ["tcp 22"],
        }}),
    )
    .unwrap();
    assert_eq!(
        rendered(&repo, "rule/S"),
        SERVICES.replace(
            PERMIT,
            &format!("{PERMIT} permit src = host:h10; dst = user; prt = tcp 22;\n")
        )
    );
}

#[rstest]
#[case::bad_user(json!({"name": "s1", "action": "permit", "user": "both"}), "Invalid 'user': 'both'")]
#[case::bad_action(json!({"name": "s1", "action": "drop", "user": "src"}), "Invalid 'action': 'drop'")]
fn test_add_service_rule_errors(#[case] params: serde_json::Value, #[case] message: &str) {
    let mut repo = fixture_repo();
    let err = apply_json(&mut repo, json!({"method": "add_service_rule", "params": params}))
        .unwrap_err();
    assert_eq!(err.to_string(), message);
    assert!(dirty(&repo).is_empty());
}

#[test]
fn test_service_protocol_edits() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "add_service_protocol", "params": {"name": "s1", "rule_num": 1, "prt": "udp 53"}}),
    )
    .unwrap();
    assert_eq!(
        rendered(&repo, "rule/S"),
        SERVICES.replace("prt = tcp 80;", "prt = tcp 80, udp 53;")
    );

    let err = apply_json(
        &mut repo,
        json!({"method": "delete_service_protocol", "params": {"name": "s1", "rule_num": 1, "prt": "udp 1"}}),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Can't find 'udp 1' in 'prt' of rule 1 of service:s1");

    apply_json(
        &mut repo,
        json!({"method": "delete_service_protocol", "params": {"name": "s1", "rule_num": 1, "prt": "tcp 80"}}),
    )
    .unwrap();
    assert_eq!(
        rendered(&repo, "rule/S"),
        SERVICES.replace("prt = tcp 80;", "prt = udp 53;")
    );
}

#[test]
fn test_service_user_edits() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "add_service_user", "params": {"name": "s1", "object": "host:h10"}}),
    )
    .unwrap();
    assert_eq!(
        rendered(&repo, "rule/S"),
        SERVICES.replace("user = network:n2;", "user = host:h10, network:n2;")
    );

    let err = apply_json(
        &mut repo,
        json!({"method": "delete_service_user", "params": {"name": "s1", "object": "host:h99"}}),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Can't find host:h99 in 'user' of service:s1");

    apply_json(
        &mut repo,
        json!({"method": "delete_service_user", "params": {"name": "s1", "object": "host:h10"}}),
    )
    .unwrap();
    assert_eq!(rendered(&repo, "rule/S"), SERVICES);
}

#[test]
fn test_delete_service_rule() {
    let mut repo = fixture_repo();
    apply_json(
        &mut repo,
        json!({"method": "delete_service_rule", "params": {"name": "s1", "rule_num": 1}}),
    )
    .unwrap();
    assert_eq!(
        rendered(&repo, "rule/S"),
        "service:s1 = {\n description = Web access\n user = network:n2;\n}\n"
    );
}
