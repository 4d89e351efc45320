use crate::directory::dn::Dn;
use crate::directory::entry::LdapEntry;
use crate::directory::schema::{equality_rule, MatchingRule, Schema};
use regex::RegexBuilder;
use std::cmp::Ordering;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Bad filter: {0}")]
pub struct FilterError(pub String);

#[derive(Debug, Clone, PartialEq)]
pub enum LdapFilter {
    Present(String),                    // (attr=*)
    Equality(String, String),           // (attr=value)
    Substring(String, SubstringFilter), // (attr=*value*)
    GreaterOrEqual(String, String),     // (attr>=value)
    LessOrEqual(String, String),        // (attr<=value)
    Approximate(String, String),        // (attr~=value)
    Extensible(ExtensibleFilter),       // (attr:dn:rule:=value)
    And(Vec<LdapFilter>),               // (&(filter1)(filter2))
    Or(Vec<LdapFilter>),                // (|(filter1)(filter2))
    Not(Box<LdapFilter>),               // (!(filter))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubstringFilter {
    pub initial: Option<String>,
    pub any: Vec<String>,
    pub final_: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensibleFilter {
    pub attribute: Option<String>,
    pub matching_rule: Option<String>,
    pub value: String,
    pub dn_attributes: bool,
}

impl LdapFilter {
    /// Evaluates the filter against `entry`. `schema`, when present, selects
    /// the matching rule per attribute type; otherwise matching ignores case.
    ///
    /// `And` stops at the first non-matching branch, `Or` at the first match.
    pub fn matches(&self, entry: &LdapEntry, schema: Option<&Schema>) -> bool {
        match self {
            LdapFilter::Present(attr) => entry.has_attribute(attr),

            LdapFilter::Equality(attr, value) => {
                let rule = equality_rule(schema, attr);
                any_value(entry, attr, |v| rule.equals(v, value))
            }

            LdapFilter::Substring(attr, substring) => {
                let rule = equality_rule(schema, attr);
                any_value(entry, attr, |v| substring.matches_with(v, rule))
            }

            LdapFilter::GreaterOrEqual(attr, value) => {
                let rule = equality_rule(schema, attr);
                any_value(entry, attr, |v| {
                    matches!(rule.compare(v, value), Some(Ordering::Greater | Ordering::Equal))
                })
            }

            LdapFilter::LessOrEqual(attr, value) => {
                let rule = equality_rule(schema, attr);
                any_value(entry, attr, |v| {
                    matches!(rule.compare(v, value), Some(Ordering::Less | Ordering::Equal))
                })
            }

            LdapFilter::Approximate(attr, value) => {
                any_value(entry, attr, |v| approximate_match(v, value))
            }

            LdapFilter::Extensible(extensible) => extensible.matches(entry, schema),

            LdapFilter::And(filters) => filters.iter().all(|f| f.matches(entry, schema)),

            LdapFilter::Or(filters) => filters.iter().any(|f| f.matches(entry, schema)),

            LdapFilter::Not(filter) => !filter.matches(entry, schema),
        }
    }

    /// Extract all attribute names referenced in this filter
    pub fn get_referenced_attributes(&self) -> std::collections::HashSet<String> {
        let mut attributes = std::collections::HashSet::new();
        self.collect_attributes(&mut attributes);
        attributes
    }

    fn collect_attributes(&self, attributes: &mut std::collections::HashSet<String>) {
        match self {
            LdapFilter::Present(attr)
            | LdapFilter::Equality(attr, _)
            | LdapFilter::Substring(attr, _)
            | LdapFilter::GreaterOrEqual(attr, _)
            | LdapFilter::LessOrEqual(attr, _)
            | LdapFilter::Approximate(attr, _) => {
                attributes.insert(attr.to_lowercase());
            }
            LdapFilter::Extensible(ext) => {
                if let Some(attr) = &ext.attribute {
                    attributes.insert(attr.to_lowercase());
                }
            }
            LdapFilter::And(filters) | LdapFilter::Or(filters) => {
                for filter in filters {
                    filter.collect_attributes(attributes);
                }
            }
            LdapFilter::Not(filter) => {
                filter.collect_attributes(attributes);
            }
        }
    }
}

impl std::str::FromStr for LdapFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_ldap_filter(s)
    }
}

fn any_value<F>(entry: &LdapEntry, attr: &str, mut predicate: F) -> bool
where
    F: FnMut(&str) -> bool,
{
    entry
        .get_attribute(attr)
        .is_some_and(|attribute| attribute.values.iter().any(|v| predicate(v)))
}

impl SubstringFilter {
    /// Case-insensitive substring match.
    pub fn matches(&self, value: &str) -> bool {
        self.matches_with(value, MatchingRule::CaseIgnore)
    }

    pub fn matches_with(&self, value: &str, rule: MatchingRule) -> bool {
        let mut pattern = String::from("^");

        if let Some(initial) = &self.initial {
            pattern.push_str(&regex::escape(initial));
        }
        pattern.push_str(".*");

        for any in &self.any {
            pattern.push_str(&regex::escape(any));
            pattern.push_str(".*");
        }

        if let Some(final_) = &self.final_ {
            pattern.push_str(&regex::escape(final_));
        }
        pattern.push('$');

        RegexBuilder::new(&pattern)
            .case_insensitive(rule != MatchingRule::CaseExact)
            .dot_matches_new_line(true)
            .build()
            .map(|re| re.is_match(value))
            .unwrap_or(false)
    }
}

impl ExtensibleFilter {
    pub fn matches(&self, entry: &LdapEntry, schema: Option<&Schema>) -> bool {
        let rule = |attr: &str| {
            self.matching_rule
                .as_deref()
                .and_then(MatchingRule::from_name)
                .unwrap_or_else(|| equality_rule(schema, attr))
        };

        let in_attribute = self.attribute.as_deref().is_some_and(|attr| {
            let rule = rule(attr);
            any_value(entry, attr, |v| rule.equals(v, &self.value))
        });
        let attribute_less = self.attribute.is_none()
            && entry
                .attributes()
                .iter()
                .any(|a| a.values.iter().any(|v| rule(&a.name).equals(v, &self.value)));

        in_attribute || attribute_less || (self.dn_attributes && self.matches_dn_components(entry, &rule))
    }

    fn matches_dn_components<R>(&self, entry: &LdapEntry, rule: &R) -> bool
    where
        R: Fn(&str) -> MatchingRule,
    {
        let Ok(dn) = Dn::parse(entry.dn()) else {
            return false;
        };
        dn.rdns()
            .iter()
            .flat_map(|rdn| rdn.avas())
            .filter(|ava| {
                self.attribute
                    .as_deref()
                    .map_or(true, |attr| ava.attr.eq_ignore_ascii_case(attr))
            })
            .any(|ava| rule(&ava.attr).equals(&ava.value, &self.value))
    }
}

/// Loose match: ignores case and whitespace, and accepts a contained value.
fn approximate_match(value: &str, pattern: &str) -> bool {
    let squash = |s: &str| {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect::<String>()
    };
    squash(value).contains(&squash(pattern))
}

/// Decodes `\XX` hex escapes; sequences of escapes may form one UTF-8 char.
fn unescape_filter_value(value: &str) -> Result<String, FilterError> {
    let mut bytes = Vec::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let hex: String = chars.by_ref().take(2).collect();
            let byte = (hex.len() == 2)
                .then(|| u8::from_str_radix(&hex, 16).ok())
                .flatten()
                .ok_or_else(|| FilterError(format!("invalid escape sequence in {value:?}")))?;
            bytes.push(byte);
        } else {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        }
    }

    String::from_utf8(bytes).map_err(|_| FilterError(format!("escaped value {value:?} is not UTF-8")))
}

pub fn parse_ldap_filter(filter_str: &str) -> Result<LdapFilter, FilterError> {
    let filter_str = filter_str.trim();

    if filter_str.is_empty() {
        return Err(FilterError("Empty filter string".to_string()));
    }

    // Bare "attr=value" is accepted and treated as if it were parenthesised
    if !filter_str.starts_with('(') {
        return parse_ldap_filter(&format!("({filter_str})"));
    }

    if !filter_str.ends_with(')') || filter_str.len() < 2 {
        return Err(FilterError("Filter must be wrapped in parentheses".to_string()));
    }

    let inner = filter_str[1..filter_str.len() - 1].trim();

    if let Some(rest) = inner.strip_prefix('&') {
        return Ok(LdapFilter::And(parse_composite_filters(rest)?));
    } else if let Some(rest) = inner.strip_prefix('|') {
        return Ok(LdapFilter::Or(parse_composite_filters(rest)?));
    } else if let Some(rest) = inner.strip_prefix('!') {
        let mut filters = parse_composite_filters(rest)?;
        if filters.len() != 1 {
            return Err(FilterError("NOT takes exactly one filter".to_string()));
        }
        return Ok(LdapFilter::Not(Box::new(filters.remove(0))));
    }

    parse_item(inner)
}

fn parse_item(inner: &str) -> Result<LdapFilter, FilterError> {
    if inner.contains(['(', ')']) {
        return Err(FilterError(format!("Unbalanced parentheses in ({inner})")));
    }
    let eq_pos = inner
        .find('=')
        .ok_or_else(|| FilterError(format!("Invalid filter format: ({inner})")))?;
    let (left, raw_value) = (&inner[..eq_pos], &inner[eq_pos + 1..]);

    if let Some(attr) = left.strip_suffix(':') {
        return parse_extensible_filter(attr, raw_value);
    }

    let (attr, op) = match left.char_indices().last() {
        Some((i, '~')) => (&left[..i], Some('~')),
        Some((i, '>')) => (&left[..i], Some('>')),
        Some((i, '<')) => (&left[..i], Some('<')),
        _ => (left, None),
    };
    let attr = validate_attribute(attr)?;

    match op {
        Some('~') => Ok(LdapFilter::Approximate(attr, unescape_filter_value(raw_value)?)),
        Some('>') => Ok(LdapFilter::GreaterOrEqual(attr, unescape_filter_value(raw_value)?)),
        Some('<') => Ok(LdapFilter::LessOrEqual(attr, unescape_filter_value(raw_value)?)),
        _ if raw_value == "*" => Ok(LdapFilter::Present(attr)),
        _ if raw_value.contains('*') => {
            let parts: Vec<&str> = raw_value.split('*').collect();
            let optional = |s: &str| -> Result<Option<String>, FilterError> {
                if s.is_empty() {
                    Ok(None)
                } else {
                    unescape_filter_value(s).map(Some)
                }
            };
            let any = parts[1..parts.len() - 1]
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| unescape_filter_value(s))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(LdapFilter::Substring(
                attr,
                SubstringFilter {
                    initial: optional(parts[0])?,
                    any,
                    final_: optional(parts[parts.len() - 1])?,
                },
            ))
        }
        _ => Ok(LdapFilter::Equality(attr, unescape_filter_value(raw_value)?)),
    }
}

fn validate_attribute(attr: &str) -> Result<String, FilterError> {
    let attr = attr.trim();
    let valid = !attr.is_empty()
        && attr
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == ';');
    if valid {
        Ok(attr.to_string())
    } else {
        Err(FilterError(format!("Invalid attribute description {attr:?}")))
    }
}

// Format: [attr][:dn][:matchingRule]:=value
fn parse_extensible_filter(left: &str, raw_value: &str) -> Result<LdapFilter, FilterError> {
    let value = unescape_filter_value(raw_value)?;
    let parts: Vec<&str> = left.split(':').collect();

    let mut attribute = None;
    let mut matching_rule = None;
    let mut dn_attributes = false;

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }

        if part.eq_ignore_ascii_case("dn") && i > 0 {
            dn_attributes = true;
        } else if i == 0 {
            attribute = Some(validate_attribute(part)?);
        } else {
            matching_rule = Some(part.to_string());
        }
    }

    if attribute.is_none() && matching_rule.is_none() {
        return Err(FilterError(
            "Extensible filter must specify an attribute or a matching rule".to_string(),
        ));
    }

    Ok(LdapFilter::Extensible(ExtensibleFilter {
        attribute,
        matching_rule,
        value,
        dn_attributes,
    }))
}

fn parse_composite_filters(s: &str) -> Result<Vec<LdapFilter>, FilterError> {
    let mut filters = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '(' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| FilterError("Unbalanced parentheses in filter".to_string()))?;
                if depth == 0 {
                    filters.push(parse_ldap_filter(&s[start..=i])?);
                }
            }
            c if depth == 0 && !c.is_whitespace() => {
                return Err(FilterError(format!("Unexpected {c:?} between filters")));
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(FilterError("Unbalanced parentheses in filter".to_string()));
    }

    Ok(filters)
}
