//! Parse and render without edits must reproduce every file exactly.

use netspoc_edit::parser::parse_file;
use netspoc_edit::syntax::{Definition, render, render_definition};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::helpers::policy_fixtures::{GROUPS, OWNERS, SERVICES, TOPOLOGY};

#[rstest]
#[case::topology(TOPOLOGY)]
#[case::owners(OWNERS)]
#[case::groups(GROUPS)]
#[case::services(SERVICES)]
fn test_fixture_round_trip(#[case] source: &str) {
    let forest = parse_file(source, "fixture").unwrap();
    assert_eq!(render(&forest, source), source);
}

#[test]
fn test_round_trip_of_irregular_layout() {
    let source = "\
   # leading blank and comment


service:odd={user=host:a,host:b,;permit src=user;dst=
   network:n,   # trailing
   network:m;prt=tcp 80,udp;}
group:empty = ;
group:multi =
;   # done";
    let forest = parse_file(source, "odd").unwrap();
    assert_eq!(forest.definitions.len(), 3);
    assert_eq!(render(&forest, source), source);
}

#[test]
fn test_canonical_text_reparses_to_equal_tree() {
    let source = "\
service:s = {
 description = Canonical
 user = host:b, host:a;
 deny src = user; dst = network:n; prt = udp 53;
 permit src = user; dst = interface:r.[all], network:[area:x]; prt = tcp;
}
";
    let mut def = parse_file(source, "s").unwrap().definitions.remove(0);
    def.detach();
    let text = render_definition(&def);
    let mut again = parse_file(&text, "again").unwrap().definitions.remove(0);
    again.detach();
    assert_eq!(again, def);
    assert!(matches!(again, Definition::Service(_)));
}
