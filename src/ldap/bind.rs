use super::protocol::{LdapResponse, LdapResultCode};
use crate::directory::auth::authenticate;
use crate::directory::Directory;
use std::fmt;
use std::sync::Arc;

/// Arguments of a session operation, handed to override callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideArgs {
    Bind {
        dn: Option<String>,
        password: Option<String>,
    },
    Unbind,
    Abandon {
        message_id: i32,
    },
}

/// What an override callback decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(LdapResultCode),
    CodeMessage(LdapResultCode, String),
}

impl From<LdapResultCode> for CallbackOutcome {
    fn from(code: LdapResultCode) -> Self {
        Self::Code(code)
    }
}

impl<S: Into<String>> From<(LdapResultCode, S)> for CallbackOutcome {
    fn from((code, message): (LdapResultCode, S)) -> Self {
        Self::CodeMessage(code, message.into())
    }
}

pub type OverrideCallback = Arc<dyn Fn(&OverrideArgs) -> Option<CallbackOutcome> + Send + Sync>;

/// Replacement behavior for bind, unbind or abandon on one target.
#[derive(Clone)]
pub enum Override {
    /// Fixed result code, optionally with a message.
    Fixed {
        code: LdapResultCode,
        message: Option<String>,
    },
    /// A prepared response; `message`, when set, replaces its own text.
    Response {
        response: LdapResponse,
        message: Option<String>,
    },
    /// Decided per call. `message` is used whenever the callback supplies none.
    Callback {
        callback: OverrideCallback,
        message: Option<String>,
    },
    /// Checks simple-bind credentials against stored `userPassword` values.
    Credentials,
}

impl Override {
    pub fn code(code: LdapResultCode) -> Self {
        Self::Fixed { code, message: None }
    }

    pub fn code_with_message(code: LdapResultCode, message: impl Into<String>) -> Self {
        Self::Fixed {
            code,
            message: Some(message.into()),
        }
    }

    pub fn response(response: LdapResponse) -> Self {
        Self::Response {
            response,
            message: None,
        }
    }

    pub fn callback<F, R>(callback: F) -> Self
    where
        F: Fn(&OverrideArgs) -> Option<R> + Send + Sync + 'static,
        R: Into<CallbackOutcome>,
    {
        let callback: OverrideCallback = Arc::new(move |args: &OverrideArgs| {
            callback(args).map(Into::<CallbackOutcome>::into)
        });
        Self::Callback {
            callback,
            message: None,
        }
    }

    /// Sets the replacement (response) or fallback (callback) message.
    pub fn with_message(self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match self {
            Self::Fixed { code, .. } => Self::Fixed { code, message: text },
            Self::Response { response, .. } => Self::Response {
                response,
                message: text,
            },
            Self::Callback { callback, .. } => Self::Callback {
                callback,
                message: text,
            },
            Self::Credentials => Self::Credentials,
        }
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed { code, message } => f
                .debug_struct("Fixed")
                .field("code", code)
                .field("message", message)
                .finish(),
            Self::Response { response, message } => f
                .debug_struct("Response")
                .field("response", response)
                .field("message", message)
                .finish(),
            Self::Callback { message, .. } => f
                .debug_struct("Callback")
                .field("message", message)
                .finish_non_exhaustive(),
            Self::Credentials => f.write_str("Credentials"),
        }
    }
}

/// Produces the response for a session operation. Without an override the
/// operation succeeds.
///
/// The callback's code always wins; its message wins over the fallback
/// message. A callback returning nothing yields success.
pub fn resolve_override(
    configured: Option<&Override>,
    args: &OverrideArgs,
    credentials: impl FnOnce() -> Option<LdapResponse>,
) -> LdapResponse {
    let Some(configured) = configured else {
        return LdapResponse::success();
    };

    match configured {
        Override::Fixed { code, message } => {
            LdapResponse::new(*code, message.clone().unwrap_or_default())
        }
        Override::Response { response, message } => {
            let mut response = response.clone();
            if let Some(message) = message {
                response.diagnostic_message = message.clone();
            }
            response
        }
        Override::Callback { callback, message } => {
            let fallback = message.clone().unwrap_or_default();
            match callback(args) {
                None => LdapResponse::new(LdapResultCode::Success, fallback),
                Some(CallbackOutcome::Code(code)) => LdapResponse::new(code, fallback),
                Some(CallbackOutcome::CodeMessage(code, message)) => LdapResponse::new(code, message),
            }
        }
        Override::Credentials => credentials().unwrap_or_else(LdapResponse::success),
    }
}

/// Credential check used by [`Override::Credentials`]. Only bind carries
/// credentials; unbind and abandon are not checked.
pub fn check_credentials(directory: &Directory, args: &OverrideArgs) -> Option<LdapResponse> {
    match args {
        OverrideArgs::Bind { dn, password } => Some(authenticate(
            directory,
            dn.as_deref().unwrap_or_default(),
            password.as_deref().unwrap_or_default(),
        )),
        OverrideArgs::Unbind | OverrideArgs::Abandon { .. } => None,
    }
}
