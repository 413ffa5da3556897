//! Parser tests: definition variants, element unions and error reporting.

use netspoc_edit::PolicyError;
use netspoc_edit::parser::{parse_definition, parse_file, parse_union};
use netspoc_edit::syntax::{AttrValue, Definition, Element};
use rstest::rstest;

fn single(source: &str) -> Definition {
    let mut forest = parse_file(source, "test").unwrap();
    assert_eq!(forest.definitions.len(), 1, "expected one definition");
    forest.definitions.remove(0)
}

#[rstest]
#[case("owner:o = { admins = a; }", "structured definition")]
#[case("router:r = { managed; }", "structured definition")]
#[case("network:n = { ip = 10.1.1.0/24; }", "network")]
#[case("group:g = host:a;", "element list")]
#[case("pathrestriction:p = interface:r.n1, interface:r.n2;", "element list")]
#[case("protocol:http = tcp 80;", "protocol definition")]
#[case("protocolgroup:web = protocol:http, tcp 443;", "protocol definition")]
#[case(
    "service:s = { user = host:a; permit src = user; dst = host:b; prt = tcp; }",
    "service"
)]
fn test_definition_variant(#[case] source: &str, #[case] kind: &str) {
    assert_eq!(single(source).kind_name(), kind);
}

#[test]
fn test_service_parts() {
    let source = "\
service:s = {
 description = Access to b # not a comment
 disable_at = 2030-01-01;
 user = foreach host:a, host:c;
 deny src = user; dst = host:b; prt = udp;
 permit src = user; dst = host:b; prt = tcp 80, tcp 443; log = l1;
}
";
    let Definition::Service(service) = single(source) else {
        panic!("expected service");
    };
    assert_eq!(
        service.description.as_deref(),
        Some("Access to b # not a comment")
    );
    assert_eq!(service.attributes.len(), 1);
    assert_eq!(service.attributes[0].first_value(), Some("2030-01-01"));
    assert!(service.user.foreach);
    assert_eq!(service.user.elements.len(), 2);
    assert_eq!(service.rules.len(), 2);
    assert!(service.rules[0].is_deny());
    let permit = &service.rules[1];
    assert!(permit.src.is_user_only());
    let AttrValue::Values(prt) = &permit.prt.value else {
        panic!("expected prt values");
    };
    let prt: Vec<_> = prt.iter().map(|v| v.text.as_str()).collect();
    assert_eq!(prt, ["tcp 80", "tcp 443"]);
    assert!(permit.log.is_some());
}

#[test]
fn test_network_hosts() {
    let source = "\
network:n = {
 ip = 10.1.1.0/24;
 host:a = { ip = 10.1.1.10; owner = o; }
 host:range = { range = 10.1.1.16 - 10.1.1.31; }
}
";
    let Definition::Network(network) = single(source) else {
        panic!("expected network");
    };
    let hosts: Vec<_> = network.hosts().map(|h| h.name.as_str()).collect();
    assert_eq!(hosts, ["host:a", "host:range"]);
    let range = network.hosts().nth(1).unwrap();
    assert_eq!(
        range.sub_attributes()[0].first_value(),
        Some("10.1.1.16 - 10.1.1.31")
    );
}

#[rstest]
#[case("host:a", Element::named("host", "a"))]
#[case("user", Element::User)]
#[case("interface:r1.[all]", Element::named("interface", "r1.[all]"))]
#[case(
    "network:[area:a]",
    Element::Auto {
        typ: "network".into(),
        managed: false,
        ip: None,
        elements: vec![Element::named("area", "a")],
        selector: None,
    }
)]
#[case(
    "group:g &! host:x",
    Element::Intersection(vec![
        Element::named("group", "g"),
        Element::Complement(Box::new(Element::named("host", "x"))),
    ])
)]
fn test_union_element(#[case] text: &str, #[case] expected: Element) {
    assert_eq!(parse_union(text).unwrap(), vec![expected]);
}

#[test]
fn test_union_list_allows_trailing_comma() {
    let elements = parse_union("host:a, network:b,").unwrap();
    assert_eq!(elements.len(), 2);
    assert!(parse_union("").unwrap().is_empty());
}

#[test]
fn test_parse_definition_requires_exactly_one() {
    assert!(parse_definition("owner:a = { admins = x; }").is_ok());
    for text in ["", "owner:a = {} owner:b = {}"] {
        assert!(matches!(
            parse_definition(text),
            Err(PolicyError::InvalidArgument(_))
        ));
    }
}

#[rstest]
#[case("owner:a = {\n admins = x\n}", 3, 1, "Expected ',' or ';', found '}'")]
#[case("group:g = host:a", 1, 17, "Expected ',' or ';', found end of file")]
#[case("noname = { }", 1, 1, "Expected 'type:name', found 'noname'")]
#[case("service:s = {\n}", 2, 1, "Expected 'user', found '}'")]
#[case("group:g = host:;", 1, 11, "Missing name after 'host:'")]
fn test_parse_errors(
    #[case] source: &str,
    #[case] line: usize,
    #[case] column: usize,
    #[case] message: &str,
) {
    let err = parse_file(source, "bad").unwrap_err();
    let PolicyError::Parse {
        file,
        line: l,
        column: c,
        message: m,
    } = err
    else {
        panic!("expected parse error");
    };
    assert_eq!(file, "bad");
    assert_eq!((l, c, m.as_str()), (line, column, message));
}
