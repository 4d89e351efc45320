//! The process-wide registry is shared by every test in this binary, so each
//! test works on a target name nobody else uses.

use ldapmock::directory::SearchScope;
use ldapmock::ldap::{AddRequest, SearchRequest};
use ldapmock::{LdapOperations, MockLdap, MockLdapError, Registry, TargetKey};

fn count(ldap: &mut MockLdap) -> usize {
    ldap.search(SearchRequest::new("dc=example,dc=com", SearchScope::WholeSubtree, "(objectClass=*)"))
        .count()
}

#[test]
fn test_global_handles_share_directory() {
    let mut first = MockLdap::new("ldap://global-share.test").unwrap();
    let mut second = MockLdap::new("LDAP://Global-Share.Test:389/").unwrap();
    assert!(first.shares_target(&second));

    first.add(AddRequest::new("dc=example,dc=com").attr("dc", ["example"]));
    assert_eq!(count(&mut second), 1);

    let key = TargetKey::parse("ldap://global-share.test").unwrap();
    assert!(Registry::global().keys().contains(&key));
}

#[test]
fn test_global_ports_and_schemes_are_isolated() {
    let mut plain = MockLdap::new("ldap://global-ports.test").unwrap();
    let mut other_port = MockLdap::new("ldap://global-ports.test:1389").unwrap();
    let mut secure = MockLdap::new("ldaps://global-ports.test").unwrap();
    let mut secure_default = MockLdap::new("ldaps://global-ports.test:636").unwrap();

    plain.add(AddRequest::new("dc=example,dc=com"));
    assert_eq!(count(&mut plain), 1);
    assert_eq!(count(&mut other_port), 0);
    assert_eq!(count(&mut secure), 0);
    assert!(secure.shares_target(&secure_default));
    assert_eq!(count(&mut secure_default), 0);
}

#[test]
fn test_socket_targets() {
    let a = MockLdap::new("ldapi://%2Ftmp%2Fglobal-socket").unwrap();
    let b = MockLdap::new("ldapi://%2ftmp%2fglobal-socket").unwrap();
    let c = MockLdap::new("ldapi://%2Ftmp%2Fother-socket").unwrap();
    assert!(a.shares_target(&b));
    assert!(!a.shares_target(&c));
    assert_eq!(a.target_key(), &TargetKey::Socket { path: "/tmp/global-socket".into() });
}

#[test]
fn test_remove_starts_fresh() {
    let mut ldap = MockLdap::new("ldap://global-remove.test").unwrap();
    ldap.add(AddRequest::new("dc=example,dc=com"));

    assert!(Registry::global().remove("ldap://global-remove.test").unwrap());
    assert!(!Registry::global().remove("ldap://global-remove.test").unwrap());

    // The old handle keeps its tree; new handles start empty
    assert_eq!(count(&mut ldap), 1);
    let mut fresh = MockLdap::new("ldap://global-remove.test").unwrap();
    assert!(!fresh.shares_target(&ldap));
    assert_eq!(count(&mut fresh), 0);
}

#[test]
fn test_invalid_targets() {
    for target in ["", "http://example.com", "ldap://", "ldap://host:notaport"] {
        assert!(
            matches!(MockLdap::new(target), Err(MockLdapError::Target(_))),
            "{target:?}"
        );
    }
}

#[test]
fn test_private_registry_reset() {
    let registry = Registry::new();
    let mut ldap = MockLdap::with_registry(&registry, "ldap://reset.test").unwrap();
    ldap.add(AddRequest::new("dc=example,dc=com"));
    MockLdap::with_registry(&registry, "ldap://reset.test:1389").unwrap();
    assert_eq!(registry.len(), 2);

    registry.reset();
    assert!(registry.is_empty());
    let mut fresh = MockLdap::with_registry(&registry, "ldap://reset.test").unwrap();
    assert_eq!(count(&mut fresh), 0);
}
