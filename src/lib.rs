pub mod client;
pub mod config;
pub mod crypto;
pub mod directory;
pub mod ldap;
pub mod registry;
pub mod yaml;

pub use client::{LdapOperations, MockLdap, NetworkLdap};
pub use config::Config;
pub use ldap::{LdapResponse, LdapResultCode};
pub use registry::{Registry, TargetKey};

#[derive(thiserror::Error, Debug)]
pub enum MockLdapError {
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Invalid target: {0}")]
    Target(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LDAP client error: {0}")]
    Ldap(#[from] ldap3::LdapError),
}

pub type Result<T> = std::result::Result<T, MockLdapError>;
