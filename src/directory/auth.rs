use super::dn::Dn;
use super::storage::Directory;
use crate::crypto::passwords::verify_password;
use crate::ldap::protocol::{LdapResponse, LdapResultCode};
use tracing::debug;

/// Checks a simple bind against the `userPassword` values stored in the tree.
pub fn authenticate(directory: &Directory, dn: &str, password: &str) -> LdapResponse {
    if dn.is_empty() {
        return if password.is_empty() {
            LdapResponse::success()
        } else {
            LdapResponse::error(
                LdapResultCode::InappropriateAuthentication,
                "Password supplied without a bind DN",
            )
        };
    }

    let parsed = match Dn::parse(dn) {
        Ok(parsed) => parsed,
        Err(e) => return LdapResponse::error(LdapResultCode::InvalidDNSyntax, e.to_string()),
    };

    if password.is_empty() {
        return LdapResponse::error(
            LdapResultCode::InappropriateAuthentication,
            "Unauthenticated bind is not allowed",
        );
    }

    let Some(entry) = directory.get(&parsed) else {
        return LdapResponse::error(LdapResultCode::InvalidCredentials, "Invalid credentials");
    };

    let Some(password_attr) = entry.get_attribute("userPassword") else {
        return LdapResponse::error(
            LdapResultCode::InappropriateAuthentication,
            format!("Entry {dn} has no userPassword"),
        );
    };

    for stored in &password_attr.values {
        match verify_password(password, stored) {
            Ok(true) => return LdapResponse::success(),
            Ok(false) => {}
            Err(e) => debug!("Skipping unreadable userPassword value on {}: {}", dn, e),
        }
    }

    LdapResponse::error(LdapResultCode::InvalidCredentials, "Invalid credentials")
}
