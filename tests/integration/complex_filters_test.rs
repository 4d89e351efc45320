use crate::common::{dns, sample, search, uids, BASE};
use ldapmock::directory::SearchScope;
use ldapmock::ldap::AddRequest;
use ldapmock::{LdapOperations, LdapResultCode, Registry};

fn sub_uids(filter: &str) -> Vec<String> {
    let registry = Registry::new();
    let mut ldap = sample(&registry);
    let response = search(&mut ldap, BASE, SearchScope::WholeSubtree, filter);
    assert!(response.is_success(), "{filter}: {response}");
    uids(&response)
}

#[test]
fn test_and_filter() {
    assert_eq!(sub_uids("(&(objectClass=person)(sn=Doe))"), ["jdoe", "janedoe"]);
    assert_eq!(sub_uids("(&(objectClass=person)(sn=Doe)(givenName=Jane))"), ["janedoe"]);
    assert!(sub_uids("(&(objectClass=person)(objectClass=account))").is_empty());
}

#[test]
fn test_or_filter() {
    assert_eq!(sub_uids("(|(uid=jdoe)(uid=admin))"), ["jdoe", "admin"]);
    assert_eq!(sub_uids("(|(uid=nobody)(cn=Guest Account))"), ["guest"]);
}

#[test]
fn test_not_filter() {
    assert_eq!(
        sub_uids("(&(uid=*)(!(objectClass=inetOrgPerson)))"),
        ["guest"]
    );
    assert_eq!(sub_uids("(&(objectClass=person)(!(sn=Doe)))"), ["rjones", "admin"]);
}

#[test]
fn test_nested_filters() {
    let filter = "(&(objectClass=person)(|(&(sn=Doe)(givenName=John))(uid=rjones)))";
    assert_eq!(sub_uids(filter), ["jdoe", "rjones"]);

    let filter = "(|(&(objectClass=person)(!(|(sn=Doe)(sn=Jones))))(uid=guest))";
    assert_eq!(sub_uids(filter), ["admin", "guest"]);
}

#[test]
fn test_substring_filters() {
    assert_eq!(sub_uids("(cn=*Doe)"), ["jdoe", "janedoe"]);
    assert_eq!(sub_uids("(cn=J*)"), ["jdoe", "janedoe"]);
    assert_eq!(sub_uids("(mail=*@example.com)").len(), 4);
    assert_eq!(sub_uids("(cn=r*ert*jon*)"), ["rjones"], "substrings match case-insensitively");
    assert_eq!(sub_uids("(mail=*.doe@*)"), ["jdoe", "janedoe"]);
}

#[test]
fn test_substring_metacharacters_are_literal() {
    assert_eq!(sub_uids("(mail=john.doe*)"), ["jdoe"]);
    assert!(sub_uids("(mail=john?doe*)").is_empty());
    assert!(sub_uids("(cn=.*)").is_empty());
}

#[test]
fn test_escaped_filter_values() {
    let registry = Registry::new();
    let mut ldap = sample(&registry);
    ldap.add(
        AddRequest::new("cn=special,ou=groups,dc=example,dc=com")
            .attr("objectClass", ["top", "groupOfNames"])
            .attr("cn", ["special"])
            .attr("description", ["a*b (c) back\\slash"]),
    );

    let filter = r"(description=a\2ab \28c\29 back\5cslash)";
    let response = search(&mut ldap, BASE, SearchScope::WholeSubtree, filter);
    assert_eq!(dns(&response), ["cn=special,ou=groups,dc=example,dc=com"]);

    let response = search(&mut ldap, BASE, SearchScope::WholeSubtree, r"(description=a\2a*)");
    assert_eq!(response.count(), 1);

    let response = search(&mut ldap, BASE, SearchScope::WholeSubtree, "(description=a*b*)");
    assert_eq!(response.count(), 1);
}

#[test]
fn test_empty_composites() {
    let registry = Registry::new();
    let mut ldap = sample(&registry);
    let all = search(&mut ldap, BASE, SearchScope::WholeSubtree, "(objectClass=*)").count();
    assert_eq!(search(&mut ldap, BASE, SearchScope::WholeSubtree, "(&)").count(), all);
    assert_eq!(search(&mut ldap, BASE, SearchScope::WholeSubtree, "(|)").count(), 0);
}

#[test]
fn test_invalid_filters_fail() {
    let registry = Registry::new();
    let mut ldap = sample(&registry);
    for filter in [
        "(uid=jdoe",
        "uid=jdoe)",
        "(&(uid=jdoe)(cn=John Doe)",
        "(!(uid=a)(uid=b))",
        "(=value)",
        "(u id=jdoe)",
        "(&(uid=jdoe)junk)",
    ] {
        let response = search(&mut ldap, BASE, SearchScope::WholeSubtree, filter);
        assert_eq!(response.code(), LdapResultCode::FilterError, "{filter}");
        assert_eq!(response.count(), 0);
    }
}

#[test]
fn test_filter_respects_scope() {
    let registry = Registry::new();
    let mut ldap = sample(&registry);
    let filter = "(|(objectClass=organizationalUnit)(uid=jdoe))";

    let response = search(&mut ldap, BASE, SearchScope::SingleLevel, filter);
    assert_eq!(
        dns(&response),
        ["ou=users,dc=example,dc=com", "ou=groups,dc=example,dc=com"]
    );

    let response = search(&mut ldap, "ou=users,dc=example,dc=com", SearchScope::BaseObject, filter);
    assert_eq!(dns(&response), ["ou=users,dc=example,dc=com"]);
}
