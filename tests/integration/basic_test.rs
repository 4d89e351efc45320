use crate::common::{dns, sample, search, BASE};
use ldapmock::directory::SearchScope;
use ldapmock::ldap::{AddRequest, ModDnRequest, SearchRequest};
use ldapmock::{LdapOperations, LdapResultCode, MockLdap, Registry};
use std::collections::HashSet;

#[test]
fn test_add_then_search_one_level() {
    let registry = Registry::new();
    let mut ldap = MockLdap::with_registry(&registry, "ldap://basic.test").unwrap();

    let response = ldap.add(AddRequest::new("uid=user1,dc=example,dc=com").attr("sn", ["User"]));
    assert!(response.is_success());

    let response = search(&mut ldap, BASE, SearchScope::SingleLevel, "(uid=*)");
    assert!(response.is_success());
    assert_eq!(response.count(), 1);
    let entry = response.entry(0).unwrap();
    assert_eq!(entry.dn(), "uid=user1,dc=example,dc=com");
    assert_eq!(entry.get_values("sn"), ["User"]);
    assert_eq!(entry.get_values("uid"), ["user1"]);

    let response = ldap.add(AddRequest::new("uid=user1,dc=example,dc=com").attr("sn", ["Other"]));
    assert_eq!(response.code(), LdapResultCode::EntryAlreadyExists);
    assert_eq!(ldap.entry("uid=user1,dc=example,dc=com").unwrap().get_values("sn"), ["User"]);
}

#[test]
fn test_add_then_search_with_uid() {
    let registry = Registry::new();
    let mut ldap = MockLdap::with_registry(&registry, "ldap://basic.test").unwrap();
    ldap.add(
        AddRequest::new("uid=user1,dc=example,dc=com")
            .attr("uid", ["user1"])
            .attr("sn", ["User"]),
    );

    let response = search(&mut ldap, BASE, SearchScope::SingleLevel, "(uid=*)");
    assert_eq!(dns(&response), vec!["uid=user1,dc=example,dc=com"]);
    assert_eq!(response.entry(0).unwrap().get_value("sn"), Some("User"));
}

#[test]
fn test_empty_target_search_succeeds() {
    let registry = Registry::new();
    let mut ldap = MockLdap::with_registry(&registry, "ldap://never-touched.test").unwrap();
    for scope in [SearchScope::BaseObject, SearchScope::SingleLevel, SearchScope::WholeSubtree] {
        let response = search(&mut ldap, BASE, scope, "(objectClass=*)");
        assert!(response.is_success());
        assert_eq!(response.count(), 0);
    }
}

#[test]
fn test_one_level_returns_only_children() {
    let registry = Registry::new();
    let mut ldap = sample(&registry);
    let base = "ou=users,dc=example,dc=com";

    let response = search(&mut ldap, base, SearchScope::SingleLevel, "(objectClass=*)");
    let found = dns(&response);
    assert_eq!(found.len(), 5);
    assert!(!found.iter().any(|dn| dn == base));
    for dn in &found {
        assert!(dn.ends_with(",ou=users,dc=example,dc=com"));
        assert_eq!(dn.matches(',').count(), 3, "{dn} is not one level below {base}");
    }
}

#[test]
fn test_scopes_nest() {
    let registry = Registry::new();
    let ldap = sample(&registry);

    for base in [BASE, "ou=users,dc=example,dc=com", "uid=jdoe,ou=users,dc=example,dc=com", "dc=missing"] {
        let set = |scope| -> HashSet<String> {
            dns(&search(&mut ldap.clone(), base, scope, "(objectClass=*)"))
                .into_iter()
                .collect()
        };
        let base_set = set(SearchScope::BaseObject);
        let one_set = set(SearchScope::SingleLevel);
        let sub_set = set(SearchScope::WholeSubtree);

        assert!(sub_set.is_superset(&one_set), "{base}");
        assert!(sub_set.is_superset(&base_set), "{base}");
        assert!(base_set.len() <= 1);
    }
}

#[test]
fn test_results_follow_insertion_order() {
    let registry = Registry::new();
    let mut ldap = sample(&registry);
    let response = search(&mut ldap, BASE, SearchScope::WholeSubtree, "(objectClass=groupOfNames)");
    assert_eq!(
        dns(&response),
        vec![
            "cn=developers,ou=groups,dc=example,dc=com",
            "cn=admins,ou=groups,dc=example,dc=com"
        ]
    );
}

#[test]
fn test_rename_preserves_subtree() {
    let registry = Registry::new();
    let mut ldap = MockLdap::with_registry(&registry, "ldap://rename.test").unwrap();
    ldap.add(AddRequest::new("dc=x").attr("dc", ["x"]));
    ldap.add(AddRequest::new("ou=a,dc=x").attr("ou", ["a"]));
    ldap.add(AddRequest::new("uid=1,ou=a,dc=x").attr("uid", ["1"]));

    let response = ldap.modify_dn(ModDnRequest::new("ou=a,dc=x", "ou=b").delete_old_rdn(true));
    assert!(response.is_success(), "{response}");

    let all = dns(&ldap.search(SearchRequest::new("dc=x", SearchScope::WholeSubtree, "(objectClass=*)")));
    assert_eq!(all, vec!["dc=x", "ou=b,dc=x", "uid=1,ou=b,dc=x"]);
    assert!(!all.iter().any(|dn| dn.ends_with("ou=a,dc=x")));
    assert_eq!(ldap.entry("ou=b,dc=x").unwrap().get_values("ou"), ["b"]);
}

#[test]
fn test_rename_collision_keeps_tree() {
    let registry = Registry::new();
    let mut ldap = MockLdap::with_registry(&registry, "ldap://rename.test").unwrap();
    ldap.add(AddRequest::new("ou=a,dc=x"));
    ldap.add(AddRequest::new("ou=b,dc=x"));
    ldap.add(AddRequest::new("uid=1,ou=a,dc=x"));

    let response = ldap.modify_dn(ModDnRequest::new("ou=a,dc=x", "ou=b"));
    assert_eq!(response.code(), LdapResultCode::EntryAlreadyExists);
    assert!(ldap.entry("uid=1,ou=a,dc=x").is_some());

    let response = ldap.modify_dn(ModDnRequest::new("ou=missing,dc=x", "ou=c"));
    assert_eq!(response.code(), LdapResultCode::NoSuchObject);
}
