//! Optional attribute-type information used only when matching filters and
//! compare assertions. It never restricts what can be stored.

use super::dn::Dn;
use super::entry::eq_ignore_case;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchingRule {
    #[default]
    #[serde(rename = "caseIgnoreMatch", alias = "2.5.13.2")]
    CaseIgnore,
    #[serde(rename = "caseExactMatch", alias = "2.5.13.5")]
    CaseExact,
    #[serde(rename = "integerMatch", alias = "2.5.13.14")]
    Integer,
    #[serde(rename = "booleanMatch", alias = "2.5.13.13")]
    Boolean,
    #[serde(rename = "distinguishedNameMatch", alias = "2.5.13.1")]
    DistinguishedName,
}

impl MatchingRule {
    /// Resolves a rule by name or OID, as used in extensible filters.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "caseignorematch" | "2.5.13.2" => Some(Self::CaseIgnore),
            "caseexactmatch" | "2.5.13.5" => Some(Self::CaseExact),
            "integermatch" | "2.5.13.14" => Some(Self::Integer),
            "booleanmatch" | "2.5.13.13" => Some(Self::Boolean),
            "distinguishednamematch" | "2.5.13.1" => Some(Self::DistinguishedName),
            _ => None,
        }
    }

    pub fn equals(self, stored: &str, assertion: &str) -> bool {
        match self {
            Self::CaseIgnore => eq_ignore_case(stored.trim(), assertion.trim()),
            Self::CaseExact => stored.trim() == assertion.trim(),
            Self::Integer => match (parse_int(stored), parse_int(assertion)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            Self::Boolean => eq_ignore_case(stored.trim(), assertion.trim()),
            Self::DistinguishedName => match (Dn::parse(stored), Dn::parse(assertion)) {
                (Ok(a), Ok(b)) => a == b,
                _ => eq_ignore_case(stored, assertion),
            },
        }
    }

    /// Ordering of a stored value against an assertion value; `None` when the
    /// two cannot be compared under this rule.
    pub fn compare(self, stored: &str, assertion: &str) -> Option<Ordering> {
        match self {
            Self::Integer => Some(parse_int(stored)?.cmp(&parse_int(assertion)?)),
            Self::CaseExact => Some(stored.cmp(assertion)),
            _ => Some(stored.to_lowercase().cmp(&assertion.to_lowercase())),
        }
    }
}

fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTypeDef {
    #[serde(default)]
    pub equality: MatchingRule,
    #[serde(default)]
    pub single_value: bool,
}

/// Schema as written in a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub attributes: HashMap<String, AttributeTypeDef>,
}

/// Attribute type definitions keyed by lowercase attribute name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SchemaConfig")]
pub struct Schema {
    attributes: HashMap<String, AttributeTypeDef>,
}

impl From<SchemaConfig> for Schema {
    fn from(config: SchemaConfig) -> Self {
        let mut schema = Schema::new();
        for (name, def) in config.attributes {
            schema.define(&name, def);
        }
        schema
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, equality: MatchingRule) -> Self {
        self.define(
            name,
            AttributeTypeDef {
                equality,
                single_value: false,
            },
        );
        self
    }

    pub fn define(&mut self, name: &str, def: AttributeTypeDef) {
        self.attributes.insert(name.to_lowercase(), def);
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeTypeDef> {
        self.attributes.get(&name.to_lowercase())
    }

    pub fn equality_rule(&self, name: &str) -> MatchingRule {
        self.attribute(name).map(|d| d.equality).unwrap_or_default()
    }
}

/// Equality rule for `attr`, falling back to case-insensitive matching.
pub fn equality_rule(schema: Option<&Schema>, attr: &str) -> MatchingRule {
    schema.map(|s| s.equality_rule(attr)).unwrap_or_default()
}
