use super::schema::{Fixture, YamlEntry};
use crate::directory::Dn;
use crate::MockLdapError;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

pub fn load_fixture_file(path: &Path) -> crate::Result<Fixture> {
    debug!("Reading fixture {}", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_fixture(&content)
}

pub fn parse_fixture(content: &str) -> crate::Result<Fixture> {
    let fixture: Fixture = serde_yaml::from_str(content)?;

    if let Some(target) = &fixture.target {
        crate::registry::TargetKey::parse(target)?;
    }
    validate_entries(&fixture.entries)?;

    Ok(fixture)
}

fn validate_entries(entries: &[YamlEntry]) -> crate::Result<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        if entry.dn.trim().is_empty() {
            return Err(MockLdapError::Fixture("Entry DN cannot be empty".to_string()));
        }

        let dn = Dn::parse(&entry.dn)
            .map_err(|e| MockLdapError::Fixture(format!("Entry {}: {}", entry.dn, e)))?;

        if !seen.insert(dn.normalized()) {
            return Err(MockLdapError::Fixture(format!(
                "Entry {} is defined more than once",
                entry.dn
            )));
        }

        entry.attribute_values()?;
    }

    Ok(())
}
