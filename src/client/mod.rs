//! Client handles. [`LdapOperations`] is the call surface; [`MockLdap`]
//! answers from the in-memory registry and [`NetworkLdap`] forwards to a
//! real server, so code under test can take either.

mod network;

pub use network::NetworkLdap;

use crate::directory::{Directory, LdapEntry, Schema};
use crate::ldap::bind::{check_credentials, resolve_override, Override, OverrideArgs};
use crate::ldap::protocol::{
    AddRequest, BindRequest, CompareRequest, DeleteRequest, LdapResponse, ModDnRequest,
    ModifyRequest, RawControl, ResponseHook, SearchRequest,
};
use crate::ldap::{mutations, operations};
use crate::registry::{Registry, SessionOperation, Target, TargetKey};
use std::sync::Arc;
use tracing::{debug, warn};

pub trait LdapOperations {
    fn search(&mut self, request: SearchRequest) -> LdapResponse;

    fn compare(&mut self, request: CompareRequest) -> LdapResponse;

    fn add(&mut self, request: AddRequest) -> LdapResponse;

    fn modify(&mut self, request: ModifyRequest) -> LdapResponse;

    fn delete(&mut self, request: DeleteRequest) -> LdapResponse;

    fn modify_dn(&mut self, request: ModDnRequest) -> LdapResponse;

    fn bind(&mut self, request: BindRequest) -> LdapResponse;

    fn unbind(&mut self) -> LdapResponse;

    fn abandon(&mut self, message_id: i32) -> LdapResponse;

    fn simple_bind(&mut self, dn: &str, password: &str) -> LdapResponse {
        self.bind(BindRequest::simple(dn, password))
    }
}

/// In-memory client handle. Handles on the same target share one tree.
#[derive(Debug, Clone)]
pub struct MockLdap {
    target: Arc<Target>,
}

impl MockLdap {
    /// Handle on `target` in the process-wide registry.
    pub fn new(target: &str) -> crate::Result<Self> {
        Self::with_registry(Registry::global(), target)
    }

    pub fn with_registry(registry: &Registry, target: &str) -> crate::Result<Self> {
        Ok(Self {
            target: registry.resolve(target)?,
        })
    }

    pub fn target_key(&self) -> &TargetKey {
        self.target.key()
    }

    /// True when both handles operate on the same tree.
    pub fn shares_target(&self, other: &MockLdap) -> bool {
        Arc::ptr_eq(&self.target, &other.target)
    }

    pub fn set_override(&self, operation: SessionOperation, configured: Override) {
        debug!("Installing {} override on {}: {:?}", operation, self.target.key(), configured);
        self.target.overrides_mut().set(operation, configured);
    }

    pub fn clear_override(&self, operation: SessionOperation) {
        self.target.overrides_mut().clear(operation);
    }

    pub fn clear_overrides(&self) {
        self.target.overrides_mut().clear_all();
    }

    /// Attaches (or with `None` detaches) filter-matching rules.
    pub fn set_schema(&self, schema: Option<Schema>) {
        self.target.directory_mut().set_schema(schema);
    }

    pub fn entry(&self, dn: &str) -> Option<LdapEntry> {
        self.target.directory().get_entry(dn)
    }

    /// Every entry, in insertion order.
    pub fn entries(&self) -> Vec<LdapEntry> {
        self.target.directory().iter().cloned().collect()
    }

    /// Removes every entry; overrides and schema are kept.
    pub fn clear_entries(&self) {
        self.target.directory_mut().clear();
    }

    fn read<F>(&self, operation: &str, dn: &str, controls: &[RawControl], hook: ResponseHook, f: F) -> LdapResponse
    where
        F: FnOnce(&Directory) -> LdapResponse,
    {
        log_controls(operation, controls);
        let response = f(&self.target.directory());
        self.finish(operation, dn, hook, response)
    }

    fn write<F>(&self, operation: &str, dn: &str, controls: &[RawControl], hook: ResponseHook, f: F) -> LdapResponse
    where
        F: FnOnce(&mut Directory) -> LdapResponse,
    {
        log_controls(operation, controls);
        let response = f(&mut self.target.directory_mut());
        self.finish(operation, dn, hook, response)
    }

    // Runs after the directory lock is released
    fn finish(&self, operation: &str, dn: &str, hook: ResponseHook, response: LdapResponse) -> LdapResponse {
        debug!(
            "{} {:?} on {} -> {}",
            operation,
            dn,
            self.target.key(),
            response.code()
        );
        hook.notify(response)
    }

    fn session(&self, operation: SessionOperation, args: OverrideArgs) -> LdapResponse {
        let configured = self.target.overrides().get(operation).cloned();
        let response = resolve_override(configured.as_ref(), &args, || {
            check_credentials(&self.target.directory(), &args)
        });

        if response.is_success() {
            debug!("{} on {} -> {}", operation, self.target.key(), response.code());
        } else {
            warn!(
                "{} on {} overridden with {}",
                operation,
                self.target.key(),
                response
            );
        }
        response
    }
}

fn log_controls(operation: &str, controls: &[RawControl]) {
    for control in controls {
        debug!(
            "Ignoring control {} (critical: {}) on {}",
            control.oid, control.critical, operation
        );
    }
}

impl LdapOperations for MockLdap {
    fn search(&mut self, mut request: SearchRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.read("search", &request.base_dn, &request.controls, hook, |dir| {
            operations::handle_search(dir, &request)
        })
    }

    fn compare(&mut self, mut request: CompareRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.read("compare", &request.dn, &request.controls, hook, |dir| {
            operations::handle_compare(dir, &request)
        })
    }

    fn add(&mut self, mut request: AddRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.write("add", &request.dn, &request.controls, hook, |dir| {
            mutations::handle_add(dir, &request)
        })
    }

    fn modify(&mut self, mut request: ModifyRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.write("modify", &request.dn, &request.controls, hook, |dir| {
            mutations::handle_modify(dir, &request)
        })
    }

    fn delete(&mut self, mut request: DeleteRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.write("delete", &request.dn, &request.controls, hook, |dir| {
            mutations::handle_delete(dir, &request)
        })
    }

    fn modify_dn(&mut self, mut request: ModDnRequest) -> LdapResponse {
        let hook = std::mem::take(&mut request.callback);
        self.write("moddn", &request.dn, &request.controls, hook, |dir| {
            mutations::handle_modify_dn(dir, &request)
        })
    }

    fn bind(&mut self, request: BindRequest) -> LdapResponse {
        log_controls("bind", &request.controls);
        self.session(
            SessionOperation::Bind,
            OverrideArgs::Bind {
                dn: request.dn,
                password: request.password,
            },
        )
    }

    fn unbind(&mut self) -> LdapResponse {
        self.session(SessionOperation::Unbind, OverrideArgs::Unbind)
    }

    fn abandon(&mut self, message_id: i32) -> LdapResponse {
        self.session(SessionOperation::Abandon, OverrideArgs::Abandon { message_id })
    }
}
