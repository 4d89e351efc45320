use super::dn::Dn;

/// Case-insensitive equality of attribute values, with the same Unicode
/// lowercasing DN keys use.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct LdapAttribute {
    pub name: String,
    pub values: Vec<String>,
}

impl LdapAttribute {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| eq_ignore_case(v, value))
    }
}

/// A directory record. Attributes keep the order in which they were added.
#[derive(Debug, Clone, PartialEq)]
pub struct LdapEntry {
    pub dn: String,
    attributes: Vec<LdapAttribute>,
}

impl LdapEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn attributes(&self) -> &[LdapAttribute] {
        &self.attributes
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    pub fn get_attribute(&self, name: &str) -> Option<&LdapAttribute> {
        self.attributes.iter().find(|a| a.matches_name(name))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// First value of `name`, if any.
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.get_attribute(name)
            .and_then(|a| a.values.first())
            .map(String::as_str)
    }

    /// All values of `name`; empty when the attribute is absent.
    pub fn get_values(&self, name: &str) -> &[String] {
        self.get_attribute(name)
            .map(|a| a.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn matches_dn(&self, dn: &str) -> bool {
        match (Dn::parse(&self.dn), Dn::parse(dn)) {
            (Ok(a), Ok(b)) => a == b,
            _ => eq_ignore_case(&self.dn, dn),
        }
    }

    /// Appends `values` to `name`, creating the attribute when needed.
    /// Duplicate values are kept as supplied.
    pub fn add_attribute<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return;
        }
        match self.attributes.iter_mut().find(|a| a.matches_name(name)) {
            Some(attr) => attr.values.extend(values),
            None => self.attributes.push(LdapAttribute::new(name, values)),
        }
    }

    /// Appends the values not already present (case-insensitively).
    pub fn add_values(&mut self, name: &str, values: &[String]) {
        let index = match self.attributes.iter().position(|a| a.matches_name(name)) {
            Some(index) => index,
            None => {
                self.attributes.push(LdapAttribute::new(name, Vec::new()));
                self.attributes.len() - 1
            }
        };
        let attr = &mut self.attributes[index];
        for value in values {
            if !attr.contains_value(value) {
                attr.values.push(value.clone());
            }
        }
        if attr.values.is_empty() {
            self.attributes.remove(index);
        }
    }

    /// Removes the given values, or the whole attribute when `values` is
    /// empty. Missing attributes and values are ignored.
    pub fn delete_values(&mut self, name: &str, values: &[String]) {
        let Some(index) = self.attributes.iter().position(|a| a.matches_name(name)) else {
            return;
        };
        if values.is_empty() {
            self.attributes.remove(index);
            return;
        }
        let attr = &mut self.attributes[index];
        attr.values
            .retain(|existing| !values.iter().any(|v| eq_ignore_case(v, existing)));
        if attr.values.is_empty() {
            self.attributes.remove(index);
        }
    }

    /// Replaces every value of `name`. An empty list removes the attribute;
    /// an existing attribute keeps its position.
    pub fn replace_values(&mut self, name: &str, values: &[String]) {
        let position = self.attributes.iter().position(|a| a.matches_name(name));
        match (position, values.is_empty()) {
            (Some(index), true) => {
                self.attributes.remove(index);
            }
            (Some(index), false) => self.attributes[index].values = values.to_vec(),
            (None, true) => {}
            (None, false) => self
                .attributes
                .push(LdapAttribute::new(name, values.to_vec())),
        }
    }

    /// Copy restricted to the requested attributes, in stored order.
    ///
    /// An empty request or `*` keeps everything; `1.1` keeps nothing.
    pub fn project(&self, requested: &[String]) -> LdapEntry {
        if requested.is_empty() || requested.iter().any(|r| r == "*") {
            return self.clone();
        }
        let attributes = self
            .attributes
            .iter()
            .filter(|a| requested.iter().any(|r| a.matches_name(r)))
            .cloned()
            .collect();
        LdapEntry {
            dn: self.dn.clone(),
            attributes,
        }
    }
}
