use crate::directory::LdapEntry;
pub use crate::directory::SearchScope;
use std::fmt;

macro_rules! result_codes {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// LDAP result codes (RFC 4511 plus the client-side codes tests rely on).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum LdapResultCode {
            $($variant,)*
            /// Any code without a named variant.
            Unknown(u32),
        }

        impl LdapResultCode {
            pub fn code(self) -> u32 {
                match self {
                    $(Self::$variant => $code,)*
                    Self::Unknown(code) => code,
                }
            }

            pub fn from_code(code: u32) -> Self {
                match code {
                    $($code => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }

            /// Symbolic name, e.g. `LDAP_NO_SUCH_OBJECT`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                    Self::Unknown(_) => "LDAP_UNKNOWN",
                }
            }
        }
    };
}

result_codes! {
    Success = 0 => "LDAP_SUCCESS",
    OperationsError = 1 => "LDAP_OPERATIONS_ERROR",
    ProtocolError = 2 => "LDAP_PROTOCOL_ERROR",
    TimeLimitExceeded = 3 => "LDAP_TIMELIMIT_EXCEEDED",
    SizeLimitExceeded = 4 => "LDAP_SIZELIMIT_EXCEEDED",
    CompareFalse = 5 => "LDAP_COMPARE_FALSE",
    CompareTrue = 6 => "LDAP_COMPARE_TRUE",
    AuthMethodNotSupported = 7 => "LDAP_AUTH_METHOD_NOT_SUPPORTED",
    StrongerAuthRequired = 8 => "LDAP_STRONG_AUTH_REQUIRED",
    NoSuchAttribute = 16 => "LDAP_NO_SUCH_ATTRIBUTE",
    UndefinedAttributeType = 17 => "LDAP_UNDEFINED_TYPE",
    InappropriateMatching = 18 => "LDAP_INAPPROPRIATE_MATCHING",
    ConstraintViolation = 19 => "LDAP_CONSTRAINT_VIOLATION",
    AttributeOrValueExists = 20 => "LDAP_TYPE_OR_VALUE_EXISTS",
    InvalidAttributeSyntax = 21 => "LDAP_INVALID_SYNTAX",
    NoSuchObject = 32 => "LDAP_NO_SUCH_OBJECT",
    AliasProblem = 33 => "LDAP_ALIAS_PROBLEM",
    InvalidDNSyntax = 34 => "LDAP_INVALID_DN_SYNTAX",
    InappropriateAuthentication = 48 => "LDAP_INAPPROPRIATE_AUTH",
    InvalidCredentials = 49 => "LDAP_INVALID_CREDENTIALS",
    InsufficientAccessRights = 50 => "LDAP_INSUFFICIENT_ACCESS",
    Busy = 51 => "LDAP_BUSY",
    Unavailable = 52 => "LDAP_UNAVAILABLE",
    UnwillingToPerform = 53 => "LDAP_UNWILLING_TO_PERFORM",
    LoopDetect = 54 => "LDAP_LOOP_DETECT",
    NamingViolation = 64 => "LDAP_NAMING_VIOLATION",
    ObjectClassViolation = 65 => "LDAP_OBJECT_CLASS_VIOLATION",
    NotAllowedOnNonLeaf = 66 => "LDAP_NOT_ALLOWED_ON_NONLEAF",
    NotAllowedOnRDN = 67 => "LDAP_NOT_ALLOWED_ON_RDN",
    EntryAlreadyExists = 68 => "LDAP_ALREADY_EXISTS",
    ObjectClassModsProhibited = 69 => "LDAP_NO_OBJECT_CLASS_MODS",
    Other = 80 => "LDAP_OTHER",
    FilterError = 87 => "LDAP_FILTER_ERROR",
    ParamError = 89 => "LDAP_PARAM_ERROR",
}

impl fmt::Display for LdapResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl From<u32> for LdapResultCode {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

/// The outcome of one directory operation.
#[derive(Debug, Clone, PartialEq)]
pub struct LdapResponse {
    pub result_code: LdapResultCode,
    pub matched_dn: String,
    pub diagnostic_message: String,
    pub entries: Vec<LdapEntry>,
}

impl LdapResponse {
    pub fn success() -> Self {
        Self::new(LdapResultCode::Success, String::new())
    }

    pub fn error(code: LdapResultCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn new(code: LdapResultCode, message: impl Into<String>) -> Self {
        Self {
            result_code: code,
            matched_dn: String::new(),
            diagnostic_message: message.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_entries(mut self, entries: Vec<LdapEntry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn with_matched_dn(mut self, matched_dn: impl Into<String>) -> Self {
        self.matched_dn = matched_dn.into();
        self
    }

    pub fn code(&self) -> LdapResultCode {
        self.result_code
    }

    /// Numeric result code.
    pub fn rc(&self) -> u32 {
        self.result_code.code()
    }

    pub fn error_text(&self) -> &str {
        &self.diagnostic_message
    }

    pub fn matched_dn(&self) -> &str {
        &self.matched_dn
    }

    pub fn is_success(&self) -> bool {
        self.result_code == LdapResultCode::Success
    }

    /// True for `compareTrue`; every other code (including errors) is false.
    pub fn is_compare_true(&self) -> bool {
        self.result_code == LdapResultCode::CompareTrue
    }

    pub fn entries(&self) -> &[LdapEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&LdapEntry> {
        self.entries.get(index)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for LdapResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.result_code)?;
        if !self.diagnostic_message.is_empty() {
            write!(f, ": {}", self.diagnostic_message)?;
        }
        Ok(())
    }
}

/// A request control. Controls are carried on every request but have no
/// effect on the in-memory directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawControl {
    pub oid: String,
    pub critical: bool,
    pub value: Option<Vec<u8>>,
}

pub type ResponseCallback = Box<dyn FnOnce(&LdapResponse) + Send>;

/// Optional observer invoked once with the finished response.
#[derive(Default)]
pub struct ResponseHook(Option<ResponseCallback>);

impl ResponseHook {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(&LdapResponse) + Send + 'static,
    {
        Self(Some(Box::new(callback)))
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Runs the callback, if any, and hands the response back.
    pub fn notify(self, response: LdapResponse) -> LdapResponse {
        if let Some(callback) = self.0 {
            callback(&response);
        }
        response
    }
}

impl fmt::Debug for ResponseHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_set() { "ResponseHook(set)" } else { "ResponseHook(none)" })
    }
}

/// Builder methods shared by every request carrying controls and a hook.
macro_rules! request_common {
    ($($request:ident),*) => {$(
        impl $request {
            pub fn control(mut self, control: RawControl) -> Self {
                self.controls.push(control);
                self
            }

            pub fn on_response<F>(mut self, callback: F) -> Self
            where
                F: FnOnce(&LdapResponse) + Send + 'static,
            {
                self.callback = ResponseHook::new(callback);
                self
            }
        }
    )*};
}

#[derive(Debug)]
pub struct SearchRequest {
    pub base_dn: String,
    pub scope: SearchScope,
    pub filter: String,
    pub attributes: Vec<String>,
    pub controls: Vec<RawControl>,
    pub callback: ResponseHook,
}

impl SearchRequest {
    pub fn new(base_dn: impl Into<String>, scope: SearchScope, filter: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope,
            filter: filter.into(),
            attributes: Vec::new(),
            controls: Vec::new(),
            callback: ResponseHook::default(),
        }
    }

    pub fn attrs<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug)]
pub struct CompareRequest {
    pub dn: String,
    pub attribute: String,
    pub value: String,
    pub controls: Vec<RawControl>,
    pub callback: ResponseHook,
}

impl CompareRequest {
    pub fn new(dn: impl Into<String>, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attribute: attribute.into(),
            value: value.into(),
            controls: Vec::new(),
            callback: ResponseHook::default(),
        }
    }
}

#[derive(Debug)]
pub struct AddRequest {
    pub dn: String,
    pub attributes: Vec<(String, Vec<String>)>,
    pub controls: Vec<RawControl>,
    pub callback: ResponseHook,
}

impl AddRequest {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
            controls: Vec::new(),
            callback: ResponseHook::default(),
        }
    }

    pub fn attr<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }
}

impl From<&LdapEntry> for AddRequest {
    fn from(entry: &LdapEntry) -> Self {
        entry
            .attributes()
            .iter()
            .fold(AddRequest::new(entry.dn()), |request, attr| {
                request.attr(attr.name.clone(), attr.values.clone())
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    Add(String, Vec<String>),
    /// An empty value list removes the whole attribute.
    Delete(String, Vec<String>),
    /// An empty value list removes the whole attribute.
    Replace(String, Vec<String>),
}

#[derive(Debug)]
pub struct ModifyRequest {
    pub dn: String,
    pub changes: Vec<Modification>,
    pub controls: Vec<RawControl>,
    pub callback: ResponseHook,
}

impl ModifyRequest {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            changes: Vec::new(),
            controls: Vec::new(),
            callback: ResponseHook::default(),
        }
    }

    pub fn add<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change(Modification::Add(name.into(), collect(values)))
    }

    pub fn delete<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change(Modification::Delete(name.into(), collect(values)))
    }

    pub fn replace<I, S>(self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.change(Modification::Replace(name.into(), collect(values)))
    }

    pub fn change(mut self, change: Modification) -> Self {
        self.changes.push(change);
        self
    }
}

fn collect<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

#[derive(Debug)]
pub struct DeleteRequest {
    pub dn: String,
    pub controls: Vec<RawControl>,
    pub callback: ResponseHook,
}

impl DeleteRequest {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            controls: Vec::new(),
            callback: ResponseHook::default(),
        }
    }
}

#[derive(Debug)]
pub struct ModDnRequest {
    pub dn: String,
    pub new_rdn: String,
    pub delete_old_rdn: bool,
    pub new_superior: Option<String>,
    pub controls: Vec<RawControl>,
    pub callback: ResponseHook,
}

impl ModDnRequest {
    pub fn new(dn: impl Into<String>, new_rdn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            new_rdn: new_rdn.into(),
            delete_old_rdn: false,
            new_superior: None,
            controls: Vec::new(),
            callback: ResponseHook::default(),
        }
    }

    pub fn delete_old_rdn(mut self, delete: bool) -> Self {
        self.delete_old_rdn = delete;
        self
    }

    pub fn new_superior(mut self, superior: impl Into<String>) -> Self {
        self.new_superior = Some(superior.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindRequest {
    pub dn: Option<String>,
    pub password: Option<String>,
    pub controls: Vec<RawControl>,
}

impl BindRequest {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn simple(dn: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            dn: Some(dn.into()),
            password: Some(password.into()),
            controls: Vec::new(),
        }
    }
}

request_common!(
    SearchRequest,
    CompareRequest,
    AddRequest,
    ModifyRequest,
    DeleteRequest,
    ModDnRequest
);
