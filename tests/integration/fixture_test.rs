use crate::common::{sample, sample_path, search, BASE};
use ldapmock::directory::SearchScope;
use ldapmock::yaml::{load_fixture_file, parse_fixture};
use ldapmock::{MockLdap, MockLdapError, Registry};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_sample_fixture_loads() {
    let fixture = load_fixture_file(&sample_path()).unwrap();
    assert_eq!(fixture.target.as_deref(), Some("ldap://sample.example.com"));
    assert!(fixture.schema.is_some());
    assert_eq!(fixture.entries.len(), 10);
}

#[test]
fn test_fixture_seeds_its_own_target() {
    let registry = Registry::new();
    let ldap = sample(&registry);
    assert_eq!(ldap.target_key().to_string(), "ldap://sample.example.com:389");

    let mut other = MockLdap::with_registry(&registry, "sample.example.com").unwrap();
    assert!(other.shares_target(&ldap));
    let response = search(&mut other, BASE, SearchScope::WholeSubtree, "(objectClass=*)");
    assert_eq!(response.count(), 10);

    let mut default = MockLdap::with_registry(&registry, "ldap://localhost").unwrap();
    let response = search(&mut default, BASE, SearchScope::WholeSubtree, "(objectClass=*)");
    assert_eq!(response.count(), 0);
}

#[test]
fn test_fixture_without_target_uses_default() {
    let yaml = r#"
entries:
  - dn: dc=test
    dc: test
    active: true
    uidNumber: 42
"#;
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(yaml.as_bytes()).unwrap();

    let registry = Registry::new();
    let ldap = load_fixture_file(temp_file.path())
        .unwrap()
        .open(&registry, "ldap://fixture.test:1389")
        .unwrap();
    assert_eq!(ldap.target_key().to_string(), "ldap://fixture.test:1389");

    let entry = ldap.entry("dc=test").unwrap();
    assert_eq!(entry.get_values("active"), ["TRUE"]);
    assert_eq!(entry.get_values("uidNumber"), ["42"]);
}

#[test]
fn test_seeding_twice_reports_duplicates() {
    let registry = Registry::new();
    let fixture = load_fixture_file(&sample_path()).unwrap();
    fixture.open(&registry, "ldap://localhost").unwrap();

    let result = fixture.open(&registry, "ldap://localhost");
    assert!(matches!(result, Err(MockLdapError::Fixture(_))));
}

#[test]
fn test_seed_into_existing_handle() {
    let registry = Registry::new();
    let mut ldap = MockLdap::with_registry(&registry, "ldap://seeded.test").unwrap();
    let fixture = parse_fixture(
        r#"
entries:
  - dn: dc=example,dc=com
    dc: example
  - dn: ou=people,dc=example,dc=com
    ou: people
"#,
    )
    .unwrap();

    assert_eq!(fixture.seed(&mut ldap).unwrap(), 2);
    assert_eq!(ldap.entries().len(), 2);
}

#[test]
fn test_invalid_fixtures() {
    let cases = [
        "entries:\n  - dn: \"\"\n    cn: x\n",
        "entries:\n  - dn: not a dn\n",
        "entries:\n  - dn: dc=a\n  - dn: DC=A\n",
        "entries:\n  - dn: dc=a\n    cn:\n      nested: value\n",
    ];
    for yaml in cases {
        assert!(
            matches!(parse_fixture(yaml), Err(MockLdapError::Fixture(_))),
            "{yaml}"
        );
    }

    assert!(matches!(
        parse_fixture("target: http://nope\nentries: []\n"),
        Err(MockLdapError::Target(_))
    ));
    assert!(matches!(
        parse_fixture("entries: [unterminated"),
        Err(MockLdapError::YamlParse(_))
    ));
}
