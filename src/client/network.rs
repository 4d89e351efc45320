use super::LdapOperations;
use crate::directory::LdapEntry;
use crate::ldap::protocol::{
    AddRequest, BindRequest, CompareRequest, DeleteRequest, LdapResponse, LdapResultCode,
    ModDnRequest, Modification, ModifyRequest, RawControl, SearchRequest, SearchScope,
};
use crate::registry::TargetKey;
use ldap3::{controls, LdapConn, LdapResult, Mod, Scope, SearchEntry};
use std::collections::HashSet;
use tracing::{debug, info};

/// [`LdapOperations`] over a real connection, via the `ldap3` blocking client.
pub struct NetworkLdap {
    conn: LdapConn,
    key: TargetKey,
}

impl std::fmt::Debug for NetworkLdap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkLdap").field("target", &self.key).finish_non_exhaustive()
    }
}

fn to_response(result: ldap3::result::Result<LdapResult>) -> LdapResponse {
    match result {
        Ok(result) => LdapResponse::new(LdapResultCode::from_code(result.rc), result.text)
            .with_matched_dn(result.matched),
        Err(e) => transport_error(e),
    }
}

fn transport_error(e: ldap3::LdapError) -> LdapResponse {
    debug!("LDAP transport error: {}", e);
    LdapResponse::error(LdapResultCode::Unavailable, e.to_string())
}

fn to_raw_controls(controls: &[RawControl]) -> Vec<controls::RawControl> {
    controls
        .iter()
        .map(|c| controls::RawControl {
            ctype: c.oid.clone(),
            crit: c.critical,
            val: c.value.clone(),
        })
        .collect()
}

fn to_entry(entry: SearchEntry) -> LdapEntry {
    let mut result = LdapEntry::new(entry.dn);
    // Server attribute order is lost in the map; sort for stable output
    let mut attrs: Vec<_> = entry.attrs.into_iter().collect();
    attrs.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, values) in attrs {
        result.add_attribute(&name, values);
    }
    let mut bin_attrs: Vec<_> = entry.bin_attrs.into_iter().collect();
    bin_attrs.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, values) in bin_attrs {
        result.add_attribute(
            &name,
            values.iter().map(|v| String::from_utf8_lossy(v).into_owned()),
        );
    }
    result
}

fn value_set(values: &[String]) -> HashSet<String> {
    values.iter().cloned().collect()
}

impl NetworkLdap {
    pub fn connect(target: &str) -> crate::Result<Self> {
        let key = TargetKey::parse(target)?;
        let conn = LdapConn::new(&key.url())?;
        info!("Connected to {}", key);
        Ok(Self { conn, key })
    }

    pub fn target_key(&self) -> &TargetKey {
        &self.key
    }

    fn apply_controls(&mut self, controls: &[RawControl]) {
        if !controls.is_empty() {
            self.conn.with_controls(to_raw_controls(controls));
        }
    }
}

impl LdapOperations for NetworkLdap {
    fn search(&mut self, mut request: SearchRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.apply_controls(&request.controls);
        let scope = match request.scope {
            SearchScope::BaseObject => Scope::Base,
            SearchScope::SingleLevel => Scope::OneLevel,
            SearchScope::WholeSubtree => Scope::Subtree,
        };
        let response = match self.conn.search(
            &request.base_dn,
            scope,
            &request.filter,
            request.attributes.clone(),
        ) {
            Ok(ldap3::SearchResult(entries, result)) => {
                let entries = entries
                    .into_iter()
                    .map(|e| to_entry(SearchEntry::construct(e)))
                    .collect();
                to_response(Ok(result)).with_entries(entries)
            }
            Err(e) => transport_error(e),
        };
        hook.notify(response)
    }

    fn compare(&mut self, mut request: CompareRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.apply_controls(&request.controls);
        let result = self
            .conn
            .compare(&request.dn, &request.attribute, request.value.as_bytes())
            .map(|r| r.0);
        hook.notify(to_response(result))
    }

    fn add(&mut self, mut request: AddRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.apply_controls(&request.controls);
        let attrs: Vec<(String, HashSet<String>)> = request
            .attributes
            .iter()
            .map(|(name, values)| (name.clone(), value_set(values)))
            .collect();
        hook.notify(to_response(self.conn.add(&request.dn, attrs)))
    }

    fn modify(&mut self, mut request: ModifyRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.apply_controls(&request.controls);
        let mods: Vec<Mod<String>> = request
            .changes
            .iter()
            .map(|change| match change {
                Modification::Add(name, values) => Mod::Add(name.clone(), value_set(values)),
                Modification::Delete(name, values) => Mod::Delete(name.clone(), value_set(values)),
                Modification::Replace(name, values) => {
                    Mod::Replace(name.clone(), value_set(values))
                }
            })
            .collect();
        hook.notify(to_response(self.conn.modify(&request.dn, mods)))
    }

    fn delete(&mut self, mut request: DeleteRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.apply_controls(&request.controls);
        hook.notify(to_response(self.conn.delete(&request.dn)))
    }

    fn modify_dn(&mut self, mut request: ModDnRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.apply_controls(&request.controls);
        let result = self.conn.modifydn(
            &request.dn,
            &request.new_rdn,
            request.delete_old_rdn,
            request.new_superior.as_deref(),
        );
        hook.notify(to_response(result))
    }

    fn bind(&mut self, request: BindRequest) -> LdapResponse {
        self.apply_controls(&request.controls);
        to_response(self.conn.simple_bind(
            request.dn.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        ))
    }

    fn unbind(&mut self) -> LdapResponse {
        match self.conn.unbind() {
            Ok(()) => LdapResponse::success(),
            Err(e) => transport_error(e),
        }
    }

    fn abandon(&mut self, message_id: i32) -> LdapResponse {
        match self.conn.abandon(message_id) {
            Ok(()) => LdapResponse::success(),
            Err(e) => transport_error(e),
        }
    }
}
