//! Write operations. Each handler validates its request in a fixed order and
//! reports the first failure as an LDAP result code; nothing is changed
//! unless the whole request is accepted.

use super::protocol::{
    AddRequest, DeleteRequest, LdapResponse, LdapResultCode, ModDnRequest, Modification,
    ModifyRequest,
};
use crate::directory::{Directory, Dn, LdapEntry, Rdn, RenameError, RenameOptions};
use tracing::debug;

fn parse_dn(dn: &str) -> Result<Dn, LdapResponse> {
    Dn::parse(dn).map_err(|e| LdapResponse::error(LdapResultCode::InvalidDNSyntax, e.to_string()))
}

fn no_such_object(dn: &str) -> LdapResponse {
    LdapResponse::error(LdapResultCode::NoSuchObject, format!("Entry {dn} not found"))
}

pub fn handle_add(directory: &mut Directory, request: &AddRequest) -> LdapResponse {
    if request.dn.trim().is_empty() {
        return LdapResponse::error(LdapResultCode::ParamError, "Entry DN must not be empty");
    }
    let dn = match parse_dn(&request.dn) {
        Ok(dn) => dn,
        Err(response) => return response,
    };
    if directory.contains(&dn) {
        return LdapResponse::error(
            LdapResultCode::EntryAlreadyExists,
            format!("Entry {} already exists", request.dn),
        );
    }

    let mut entry = LdapEntry::new(dn.to_string());
    for (name, values) in &request.attributes {
        entry.add_attribute(name, values.iter().cloned());
    }
    // The naming values are always part of the entry
    if let Some(rdn) = dn.rdn() {
        for ava in rdn.avas() {
            entry.add_values(&ava.attr, &[ava.value.clone()]);
        }
    }
    debug!("Adding {} with {} attributes", dn, entry.attributes().len());
    directory.put(dn, entry);

    LdapResponse::success()
}

/// Applies the changes in order. Deleting values or attributes that are not
/// present is not an error.
pub fn handle_modify(directory: &mut Directory, request: &ModifyRequest) -> LdapResponse {
    let dn = match parse_dn(&request.dn) {
        Ok(dn) => dn,
        Err(response) => return response,
    };
    let Some(entry) = directory.get_mut(&dn) else {
        return no_such_object(&request.dn);
    };

    for change in &request.changes {
        match change {
            Modification::Add(name, values) => entry.add_values(name, values),
            Modification::Delete(name, values) => entry.delete_values(name, values),
            Modification::Replace(name, values) => entry.replace_values(name, values),
        }
    }
    debug!("Applied {} changes to {}", request.changes.len(), dn);

    LdapResponse::success()
}

/// Removes exactly one entry; children are left in place.
pub fn handle_delete(directory: &mut Directory, request: &DeleteRequest) -> LdapResponse {
    let dn = match parse_dn(&request.dn) {
        Ok(dn) => dn,
        Err(response) => return response,
    };
    match directory.remove(&dn) {
        Some(_) => LdapResponse::success(),
        None => no_such_object(&request.dn),
    }
}

pub fn handle_modify_dn(directory: &mut Directory, request: &ModDnRequest) -> LdapResponse {
    let dn = match parse_dn(&request.dn) {
        Ok(dn) => dn,
        Err(response) => return response,
    };
    let new_rdn = match Rdn::parse(&request.new_rdn) {
        Ok(rdn) => rdn,
        Err(e) => return LdapResponse::error(LdapResultCode::InvalidDNSyntax, e.to_string()),
    };
    let new_superior = match request.new_superior.as_deref().map(parse_dn).transpose() {
        Ok(superior) => superior,
        Err(response) => return response,
    };

    let options = RenameOptions {
        delete_old_rdn: request.delete_old_rdn,
        new_superior,
    };
    match directory.rename(&dn, &new_rdn, &options) {
        Ok(new_dn) => {
            debug!("Renamed {} to {}", dn, new_dn);
            LdapResponse::success()
        }
        Err(e) => {
            let code = match e {
                RenameError::NoSuchObject(_) => LdapResultCode::NoSuchObject,
                RenameError::IntoOwnSubtree(_) => LdapResultCode::UnwillingToPerform,
                RenameError::AlreadyExists(_) => LdapResultCode::EntryAlreadyExists,
            };
            LdapResponse::error(code, e.to_string())
        }
    }
}
