use clap::Parser;
use ldapmock::config::{Action, CliArgs};
use ldapmock::crypto::passwords::hash_password;
use ldapmock::ldap::ldif::entries_to_ldif;
use ldapmock::ldap::SearchRequest;
use ldapmock::yaml::load_fixture_file;
use ldapmock::{Config, LdapOperations, MockLdap, Registry};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = CliArgs::parse();
    let config = Config::from_cli_args(args)?;

    // Logs go to stderr so stdout carries only command output
    FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();

    match config.action {
        Action::HashPassword { method, password } => {
            println!("{}", hash_password(&password, &method)?);
        }
        Action::Search {
            base,
            scope,
            filter,
            attrs,
        } => {
            let target = config.target.to_string();
            let mut ldap = match &config.fixture {
                Some(path) => load_fixture_file(path)?.open(Registry::global(), &target)?,
                None => MockLdap::new(&target)?,
            };

            let response = ldap.search(SearchRequest::new(base, scope, filter).attrs(attrs));
            if !response.is_success() {
                anyhow::bail!("Search failed: {}", response);
            }
            print!("{}", entries_to_ldif(response.entries()));
        }
    }

    Ok(())
}
