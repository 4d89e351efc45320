use ldapmock::directory::SearchScope;
use ldapmock::ldap::SearchRequest;
use ldapmock::yaml::parse_fixture;
use ldapmock::{LdapOperations, MockLdap, Registry};

fn directory(registry: &Registry) -> MockLdap {
    let yaml_content = r#"
entries:
  - dn: "dc=example,dc=com"
    objectClass: ["top", "domain"]
    dc: "example"

  - dn: "ou=users,dc=example,dc=com"
    objectClass: ["top", "organizationalUnit"]
    ou: "users"

  - dn: "uid=john,ou=users,dc=example,dc=com"
    objectClass: ["top", "person", "inetOrgPerson"]
    uid: "john"
    cn: "John Doe"
    sn: "Doe"
    mail: "john@example.com"
    userPassword: "password123"
"#;

    parse_fixture(yaml_content)
        .unwrap()
        .open(registry, "ldap://undefined.test")
        .unwrap()
}

fn count(ldap: &mut MockLdap, filter: &str) -> usize {
    let response = ldap.search(SearchRequest::new(
        "dc=example,dc=com",
        SearchScope::WholeSubtree,
        filter,
    ));
    assert!(response.is_success(), "{filter}: {response}");
    response.count()
}

#[test]
fn test_undefined_attribute_in_filter() {
    let registry = Registry::new();
    let mut ldap = directory(&registry);

    // Absent attributes never match, whatever the assertion
    assert_eq!(count(&mut ldap, "(employeeType=*)"), 0);
    assert_eq!(count(&mut ldap, "(employeeType=manager)"), 0);
    assert_eq!(count(&mut ldap, "(employeeType=*anage*)"), 0);
    assert_eq!(count(&mut ldap, "(employeeType>=a)"), 0);
    assert_eq!(count(&mut ldap, "(employeeType<=z)"), 0);
    assert_eq!(count(&mut ldap, "(employeeType~=manager)"), 0);
}

#[test]
fn test_negated_undefined_attribute_matches_everything() {
    let registry = Registry::new();
    let mut ldap = directory(&registry);

    assert_eq!(count(&mut ldap, "(!(employeeType=manager))"), 3);
    assert_eq!(count(&mut ldap, "(!(employeeType=*))"), 3);
}

#[test]
fn test_undefined_attribute_in_composite_filters() {
    let registry = Registry::new();
    let mut ldap = directory(&registry);

    assert_eq!(count(&mut ldap, "(&(uid=john)(employeeType=*))"), 0);
    assert_eq!(count(&mut ldap, "(|(uid=john)(employeeType=*))"), 1);
    assert_eq!(count(&mut ldap, "(&(uid=john)(!(nonExistentAttr=value)))"), 1);
}

#[test]
fn test_requesting_undefined_attributes() {
    let registry = Registry::new();
    let mut ldap = directory(&registry);
    let request = |attrs: &[&str]| {
        SearchRequest::new(
            "uid=john,ou=users,dc=example,dc=com",
            SearchScope::BaseObject,
            "(objectClass=*)",
        )
        .attrs(attrs.iter().copied())
    };

    let response = ldap.search(request(&["cn", "employeeType", "departmentNumber"]));
    assert_eq!(response.count(), 1);
    let entry = response.entry(0).unwrap();
    assert_eq!(entry.get_values("cn"), ["John Doe"]);
    assert!(!entry.has_attribute("employeeType"));
    assert_eq!(entry.attributes().len(), 1);

    let response = ldap.search(request(&["employeeType"]));
    assert_eq!(response.count(), 1, "the entry is returned without attributes");
    assert!(response.entry(0).unwrap().attributes().is_empty());

    let response = ldap.search(request(&["1.1"]));
    assert!(response.entry(0).unwrap().attributes().is_empty());

    let response = ldap.search(request(&["*"]));
    assert_eq!(response.entry(0).unwrap().attributes().len(), 6);
}

#[test]
fn test_attribute_names_are_case_insensitive() {
    let registry = Registry::new();
    let mut ldap = directory(&registry);

    assert_eq!(count(&mut ldap, "(MAIL=john@example.com)"), 1);
    assert_eq!(count(&mut ldap, "(objectclass=inetorgperson)"), 1);

    let response = ldap.search(
        SearchRequest::new(
            "uid=john,ou=users,dc=example,dc=com",
            SearchScope::BaseObject,
            "(objectClass=*)",
        )
        .attrs(["SN"]),
    );
    let entry = response.entry(0).unwrap();
    assert_eq!(entry.attributes()[0].name, "sn");
}
