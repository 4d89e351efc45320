#![no_main]

use ldapmock::directory::LdapEntry;
use ldapmock::ldap::parse_ldap_filter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Non-UTF-8 input can never reach the parser
    if let Ok(filter_str) = std::str::from_utf8(data) {
        // Malformed filters must be rejected without panicking, and whatever
        // parses must evaluate
        if let Ok(filter) = parse_ldap_filter(filter_str) {
            let mut entry = LdapEntry::new("uid=fuzz,dc=example,dc=com");
            entry.add_attribute("uid", ["fuzz"]);
            entry.add_attribute("cn", ["Fuzz Target", "*()\\"]);
            let _ = filter.matches(&entry, None);
        }
    }
});
