use crate::client::{LdapOperations, MockLdap};
use crate::directory::Schema;
use crate::ldap::AddRequest;
use crate::registry::Registry;
use crate::MockLdapError;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use tracing::info;

/// A fixture file: optional target and schema plus the entries to seed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub entries: Vec<YamlEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YamlEntry {
    pub dn: String,
    #[serde(flatten)]
    pub attributes: Mapping,
}

impl YamlEntry {
    /// Attributes in file order with every value rendered as a string.
    /// Null values and empty lists are skipped.
    pub fn attribute_values(&self) -> crate::Result<Vec<(String, Vec<String>)>> {
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for (key, value) in &self.attributes {
            let name = key.as_str().ok_or_else(|| {
                MockLdapError::Fixture(format!("Entry {}: attribute names must be strings", self.dn))
            })?;
            let values = match value {
                Value::Sequence(items) => items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| self.scalar(name, v))
                    .collect::<crate::Result<Vec<_>>>()?,
                Value::Null => Vec::new(),
                other => vec![self.scalar(name, other)?],
            };
            if !values.is_empty() {
                attributes.push((name.to_string(), values));
            }
        }
        Ok(attributes)
    }

    fn scalar(&self, name: &str, value: &Value) -> crate::Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
            _ => Err(MockLdapError::Fixture(format!(
                "Entry {}: attribute {} must hold scalars or a list of scalars",
                self.dn, name
            ))),
        }
    }

    pub fn to_add_request(&self) -> crate::Result<AddRequest> {
        Ok(self
            .attribute_values()?
            .into_iter()
            .fold(AddRequest::new(&self.dn), |request, (name, values)| {
                request.attr(name, values)
            }))
    }
}

impl Fixture {
    /// Attaches the schema (when the file has one) and adds every entry
    /// through `ldap`. Returns the number of entries added.
    pub fn seed(&self, ldap: &mut MockLdap) -> crate::Result<usize> {
        if self.schema.is_some() {
            ldap.set_schema(self.schema.clone());
        }
        for entry in &self.entries {
            let response = ldap.add(entry.to_add_request()?);
            if !response.is_success() {
                return Err(MockLdapError::Fixture(format!(
                    "Failed to add {}: {}",
                    entry.dn, response
                )));
            }
        }
        info!("Loaded {} entries into {}", self.entries.len(), ldap.target_key());
        Ok(self.entries.len())
    }

    /// Opens a handle on the fixture's own target, or `default_target` when
    /// the file names none, and seeds it.
    pub fn open(&self, registry: &Registry, default_target: &str) -> crate::Result<MockLdap> {
        let target = self.target.as_deref().unwrap_or(default_target);
        let mut ldap = MockLdap::with_registry(registry, target)?;
        self.seed(&mut ldap)?;
        Ok(ldap)
    }
}
