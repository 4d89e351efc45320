pub mod bind;
pub mod filters;
pub mod ldif;
pub mod mutations;
pub mod operations;
pub mod protocol;

pub use bind::{resolve_override, CallbackOutcome, Override, OverrideArgs};
pub use filters::{parse_ldap_filter, FilterError, LdapFilter};
pub use mutations::{handle_add, handle_delete, handle_modify, handle_modify_dn};
pub use operations::{handle_compare, handle_search};
pub use protocol::{
    AddRequest, BindRequest, CompareRequest, DeleteRequest, LdapResponse, LdapResultCode,
    ModDnRequest, Modification, ModifyRequest, RawControl, SearchRequest, SearchScope,
};
