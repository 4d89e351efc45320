use crate::crypto::passwords::HASH_METHODS;
use crate::ldap::SearchScope;
use crate::registry::TargetKey;
use crate::MockLdapError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ldapmock")]
#[command(about = "Query an in-memory LDAP directory seeded from a YAML fixture")]
#[command(version)]
pub struct CliArgs {
    /// Path to a YAML fixture file
    #[arg(short, long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Target the directory is registered under, when the fixture names none
    #[arg(short, long, default_value = "ldap://localhost")]
    pub target: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level: debug, info, warn, error
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search the directory and print the result as LDIF
    Search {
        /// Search base DN
        #[arg(short, long, default_value = "")]
        base: String,

        /// Search scope: base, one, sub
        #[arg(short, long, default_value = "sub")]
        scope: String,

        /// Search filter
        #[arg(long, default_value = "(objectClass=*)")]
        filter: String,

        /// Attributes to return, comma separated
        #[arg(short, long, value_delimiter = ',')]
        attrs: Vec<String>,
    },

    /// Print a userPassword value for a fixture
    HashPassword {
        /// Hash method: plain, sha, ssha, sha256, bcrypt
        #[arg(short, long, default_value = "ssha")]
        method: String,

        password: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Search {
        base: String,
        scope: SearchScope,
        filter: String,
        attrs: Vec<String>,
    },
    HashPassword {
        method: String,
        password: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub fixture: Option<PathBuf>,
    pub target: TargetKey,
    pub log_level: tracing::Level,
    pub action: Action,
}

impl Config {
    pub fn from_cli_args(args: CliArgs) -> crate::Result<Self> {
        let target = TargetKey::parse(&args.target)?;

        let log_level = if args.verbose {
            tracing::Level::DEBUG
        } else {
            match args.log_level.to_lowercase().as_str() {
                "debug" => tracing::Level::DEBUG,
                "info" => tracing::Level::INFO,
                "warn" => tracing::Level::WARN,
                "error" => tracing::Level::ERROR,
                _ => tracing::Level::INFO,
            }
        };

        let action = match args.command {
            Command::Search {
                base,
                scope,
                filter,
                attrs,
            } => Action::Search {
                base,
                scope: scope.parse().map_err(MockLdapError::Config)?,
                filter,
                attrs,
            },
            Command::HashPassword { method, password } => {
                let method = method.to_lowercase();
                if !HASH_METHODS.contains(&method.as_str()) {
                    return Err(MockLdapError::Config(format!(
                        "Unknown hash method {}, expected one of: {}",
                        method,
                        HASH_METHODS.join(", ")
                    )));
                }
                Action::HashPassword { method, password }
            }
        };

        Ok(Config {
            fixture: args.fixture,
            target,
            log_level,
            action,
        })
    }
}
