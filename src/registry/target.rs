use crate::MockLdapError;
use std::fmt;
use url::Url;

const DEFAULT_LDAPI_PATH: &str = "/var/run/ldapi";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Ldap,
    Ldaps,
}

impl Scheme {
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Ldap => 389,
            Scheme::Ldaps => 636,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Ldap => "ldap",
            Scheme::Ldaps => "ldaps",
        }
    }
}

/// Normalized connection endpoint; handles with equal keys share one tree.
///
/// `host`, `host:389`, `ldap://HOST` and `ldap://host:389/` are all the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetKey {
    Network {
        scheme: Scheme,
        host: String,
        port: u16,
    },
    Socket {
        path: String,
    },
}

impl TargetKey {
    pub fn parse(target: &str) -> crate::Result<Self> {
        let target = target.trim();
        if target.is_empty() {
            return Err(MockLdapError::Target("empty target".to_string()));
        }

        let url = if target.contains("://") {
            Url::parse(target)
        } else {
            Url::parse(&format!("ldap://{target}"))
        }
        .map_err(|e| MockLdapError::Target(format!("{target}: {e}")))?;

        let scheme = match url.scheme() {
            "ldap" => Scheme::Ldap,
            "ldaps" => Scheme::Ldaps,
            "ldapi" => {
                let path = match url.host_str().filter(|h| !h.is_empty()) {
                    Some(encoded) => urlencoding::decode(encoded)
                        .map_err(|e| {
                            MockLdapError::Target(format!("{target}: invalid socket path: {e}"))
                        })?
                        .into_owned(),
                    None => DEFAULT_LDAPI_PATH.to_string(),
                };
                return Ok(TargetKey::Socket { path });
            }
            other => {
                return Err(MockLdapError::Target(format!(
                    "{target}: unsupported scheme {other:?}"
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MockLdapError::Target(format!("{target}: missing host")))?
            .to_lowercase();
        let port = url.port().unwrap_or(scheme.default_port());

        Ok(TargetKey::Network { scheme, host, port })
    }

    /// URL form accepted by network clients.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKey::Network { scheme, host, port } => {
                write!(f, "{}://{}:{}", scheme.as_str(), host, port)
            }
            TargetKey::Socket { path } => write!(f, "ldapi://{}", urlencoding::encode(path)),
        }
    }
}

impl std::str::FromStr for TargetKey {
    type Err = MockLdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
