use crate::common::{sample, search, BASE};
use ldapmock::directory::SearchScope;
use ldapmock::ldap::{AddRequest, ModifyRequest, Override, SearchRequest};
use ldapmock::registry::SessionOperation;
use ldapmock::{LdapOperations, LdapResultCode, MockLdap, Registry};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_concurrent_client_connections() {
    let registry = Registry::new();
    let ldap = sample(&registry);

    let num_clients = 10;
    let barrier = Arc::new(Barrier::new(num_clients));

    let handles: Vec<_> = (0..num_clients)
        .map(|client_id| {
            let mut ldap = ldap.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    let response = search(&mut ldap, BASE, SearchScope::WholeSubtree, "(objectClass=person)");
                    assert!(response.is_success(), "client {client_id}: {response}");
                    assert_eq!(response.count(), 4);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_writers_on_fresh_handles() {
    let registry = Arc::new(Registry::new());
    let num_writers = 8;
    let per_writer = 25;

    let handles: Vec<_> = (0..num_writers)
        .map(|writer| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                // Each thread resolves its own handle on the shared target
                let mut ldap = MockLdap::with_registry(&registry, "ldap://concurrent.test").unwrap();
                for i in 0..per_writer {
                    let dn = format!("uid=w{writer}-{i},ou=load,dc=example,dc=com");
                    let response = ldap.add(AddRequest::new(dn).attr("objectClass", ["person"]));
                    assert!(response.is_success());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut ldap = MockLdap::with_registry(&registry, "ldap://concurrent.test").unwrap();
    let response = ldap.search(SearchRequest::new(
        "ou=load,dc=example,dc=com",
        SearchScope::SingleLevel,
        "(objectClass=person)",
    ));
    assert_eq!(response.count(), num_writers * per_writer);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_concurrent_duplicate_adds_single_winner() {
    let registry = Registry::new();
    let ldap = MockLdap::with_registry(&registry, "ldap://race.test").unwrap();
    let barrier = Arc::new(Barrier::new(6));

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let mut ldap = ldap.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                ldap.add(AddRequest::new("cn=contended,dc=example,dc=com")).code()
            })
        })
        .collect();

    let codes: Vec<LdapResultCode> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(codes.iter().filter(|c| **c == LdapResultCode::Success).count(), 1);
    assert_eq!(
        codes
            .iter()
            .filter(|c| **c == LdapResultCode::EntryAlreadyExists)
            .count(),
        5
    );
}

#[test]
fn test_readers_and_writers_interleave() {
    let registry = Registry::new();
    let ldap = sample(&registry);
    let jdoe = "uid=jdoe,ou=users,dc=example,dc=com";

    let writer = {
        let mut ldap = ldap.clone();
        thread::spawn(move || {
            for i in 0..100 {
                let response = ldap.modify(ModifyRequest::new(jdoe).replace("description", [format!("rev {i}")]));
                assert!(response.is_success());
            }
        })
    };
    let reader = {
        let mut ldap = ldap.clone();
        thread::spawn(move || {
            for _ in 0..100 {
                let response = ldap.search(SearchRequest::new(jdoe, SearchScope::BaseObject, "(uid=jdoe)"));
                assert_eq!(response.count(), 1);
                let entry = response.entry(0).unwrap();
                assert!(entry.get_values("description").len() <= 1);
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(ldap.entry(jdoe).unwrap().get_value("description"), Some("rev 99"));
}

#[test]
fn test_override_visible_across_threads() {
    let registry = Registry::new();
    let ldap = MockLdap::with_registry(&registry, "ldap://override.test").unwrap();
    ldap.set_override(SessionOperation::Bind, Override::code(LdapResultCode::Busy));

    let mut remote = ldap.clone();
    let code = thread::spawn(move || remote.simple_bind("cn=x", "y").code())
        .join()
        .unwrap();
    assert_eq!(code, LdapResultCode::Busy);
}
