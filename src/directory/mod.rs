pub mod auth;
pub mod dn;
pub mod entry;
pub mod schema;
pub mod storage;

pub use dn::{Dn, DnError, Rdn};
pub use entry::{LdapAttribute, LdapEntry};
pub use schema::{MatchingRule, Schema};
pub use storage::{Directory, RenameError, RenameOptions, SearchScope};
