use super::filters::parse_ldap_filter;
use super::protocol::{CompareRequest, LdapResponse, LdapResultCode, SearchRequest};
use crate::directory::schema::equality_rule;
use crate::directory::{Directory, Dn};
use tracing::debug;

/// Runs a search against `directory`. A base that names no entry yields an
/// empty successful result, not `noSuchObject`.
pub fn handle_search(directory: &Directory, request: &SearchRequest) -> LdapResponse {
    let base = match Dn::parse(&request.base_dn) {
        Ok(base) => base,
        Err(e) => return LdapResponse::error(LdapResultCode::InvalidDNSyntax, e.to_string()),
    };

    let ldap_filter = match parse_ldap_filter(&request.filter) {
        Ok(f) => f,
        Err(e) => {
            return LdapResponse::error(
                LdapResultCode::FilterError,
                format!("Invalid filter: {}", e),
            )
        }
    };

    let schema = directory.schema();
    let entries: Vec<_> = directory
        .search_entries(&base, request.scope, |entry| ldap_filter.matches(entry, schema))
        .into_iter()
        .map(|entry| entry.project(&request.attributes))
        .collect();

    debug!(
        "Search base={:?} scope={:?} filter={} matched {} entries",
        request.base_dn,
        request.scope,
        request.filter,
        entries.len()
    );

    LdapResponse::success().with_entries(entries)
}

pub fn handle_compare(directory: &Directory, request: &CompareRequest) -> LdapResponse {
    let dn = match Dn::parse(&request.dn) {
        Ok(dn) => dn,
        Err(e) => return LdapResponse::error(LdapResultCode::InvalidDNSyntax, e.to_string()),
    };

    let Some(entry) = directory.get(&dn) else {
        return LdapResponse::error(
            LdapResultCode::NoSuchObject,
            format!("Entry {} not found", request.dn),
        );
    };

    let rule = equality_rule(directory.schema(), &request.attribute);
    let matches = entry
        .get_values(&request.attribute)
        .iter()
        .any(|v| rule.equals(v, &request.value));

    let code = if matches {
        LdapResultCode::CompareTrue
    } else {
        LdapResultCode::CompareFalse
    };
    LdapResponse::new(code, String::new()).with_matched_dn(entry.dn())
}
