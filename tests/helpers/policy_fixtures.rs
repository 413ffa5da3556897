//! A small policy tree shared by the repository and job tests.

pub const TOPOLOGY: &str = "\
# Networks of site A
network:n1 = {
 ip = 10.1.1.0/24;
 owner = o1;
 host:h10 = { ip = 10.1.1.10; }
}

network:n2 = { ip = 10.1.2.0/24; }

router:r1 = {
 interface:n1 = { ip = 10.1.1.1; hardware = e0; }
 interface:n2 = { ip = 10.1.2.1; hardware = e1; }
}
";

pub const OWNERS: &str = "\
owner:o1 = {
 admins = a@example.com;
}

owner:o2 = {
 admins = b@example.com, c@example.com;
 watchers = w@example.com;
}
";

pub const GROUPS: &str = "\
# Server groups
group:g1 =
 host:h10,
 network:n2,
;
";

pub const SERVICES: &str = "\
service:s1 = {
 description = Web access
 user = network:n2;
 permit src = user;
        dst = host:h10;
        prt = tcp 80;
}
";

/// Relative path and content of every fixture file.
pub const POLICY: [(&str, &str); 4] = [
    ("topology", TOPOLOGY),
    ("owner", OWNERS),
    ("group", GROUPS),
    ("rule/S", SERVICES),
];
