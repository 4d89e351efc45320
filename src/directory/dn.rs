//! Distinguished name parsing and normalization (RFC 4514 string form).
//!
//! A [`Dn`] keeps the values as written (minus insignificant whitespace) for
//! display and derives a lowercase key for comparison. Parent/child
//! relationships are computed purely from the RDN sequence.

use std::fmt;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid DN syntax: {0}")]
pub struct DnError(pub String);

/// One `type=value` pair inside an RDN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ava {
    pub attr: String,
    pub value: String,
}

impl Ava {
    fn normalized(&self) -> String {
        format!(
            "{}={}",
            self.attr.to_lowercase(),
            escape_value(&self.value.to_lowercase())
        )
    }
}

/// A relative distinguished name; more than one AVA when written with `+`.
#[derive(Debug, Clone)]
pub struct Rdn {
    avas: Vec<Ava>,
}

impl Rdn {
    pub fn parse(s: &str) -> Result<Self, DnError> {
        let dn = Dn::parse(s)?;
        let mut rdns = dn.rdns.into_iter();
        match (rdns.next(), rdns.next()) {
            (Some(rdn), None) => Ok(rdn),
            (None, _) => Err(DnError("empty RDN".to_string())),
            (Some(_), Some(_)) => Err(DnError(format!("{s:?} contains more than one RDN"))),
        }
    }

    pub fn avas(&self) -> &[Ava] {
        &self.avas
    }

    /// Comparison key: lowercase, AVAs in sorted order.
    pub fn normalized(&self) -> String {
        let mut parts: Vec<String> = self.avas.iter().map(Ava::normalized).collect();
        parts.sort();
        parts.join("+")
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Rdn {}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ava) in self.avas.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{}={}", ava.attr, escape_value(&ava.value))?;
        }
        Ok(())
    }
}

/// A parsed distinguished name, most specific RDN first.
#[derive(Debug, Clone, Default)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// The zero-length DN naming the root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(s: &str) -> Result<Self, DnError> {
        if s.trim().is_empty() {
            return Ok(Self::root());
        }
        let mut parser = Parser::new(s);
        let mut rdns = Vec::new();
        loop {
            let (rdn, more) = parser.rdn()?;
            rdns.push(rdn);
            if !more {
                break;
            }
        }
        Ok(Self { rdns })
    }

    pub fn from_rdns(rdns: Vec<Rdn>) -> Self {
        Self { rdns }
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    pub fn rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    pub fn is_root(&self) -> bool {
        self.rdns.is_empty()
    }

    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.is_empty() {
            None
        } else {
            Some(Self {
                rdns: self.rdns[1..].to_vec(),
            })
        }
    }

    /// `rdn` placed directly below `parent`.
    pub fn child_of(rdn: Rdn, parent: &Dn) -> Dn {
        let mut rdns = Vec::with_capacity(parent.rdns.len() + 1);
        rdns.push(rdn);
        rdns.extend(parent.rdns.iter().cloned());
        Self { rdns }
    }

    /// Key used to store and look up entries.
    pub fn normalized(&self) -> String {
        self.rdns
            .iter()
            .map(Rdn::normalized)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// True when `ancestor` is a proper suffix of this DN.
    pub fn is_descendant_of(&self, ancestor: &Dn) -> bool {
        self.rdns.len() > ancestor.rdns.len() && self.ends_with(ancestor)
    }

    /// True when this DN is exactly one RDN below `parent`.
    pub fn is_child_of(&self, parent: &Dn) -> bool {
        self.rdns.len() == parent.rdns.len() + 1 && self.ends_with(parent)
    }

    fn ends_with(&self, suffix: &Dn) -> bool {
        let offset = self.rdns.len() - suffix.rdns.len().min(self.rdns.len());
        suffix.rdns.len() <= self.rdns.len()
            && self.rdns[offset..]
                .iter()
                .zip(&suffix.rdns)
                .all(|(a, b)| a == b)
    }

    /// Swaps the `old` suffix for `new`, keeping the leading RDNs as they are.
    /// Returns `None` when `old` is not a suffix of this DN.
    pub fn replace_suffix(&self, old: &Dn, new: &Dn) -> Option<Dn> {
        if !self.ends_with(old) {
            return None;
        }
        let keep = self.rdns.len() - old.rdns.len();
        let mut rdns = self.rdns[..keep].to_vec();
        rdns.extend(new.rdns.iter().cloned());
        Some(Self { rdns })
    }
}

impl PartialEq for Dn {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for Dn {}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{rdn}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Dn {
    type Err = DnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Escapes an attribute value for the string form of a DN.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, ch) in value.chars().enumerate() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                out.push('\\');
                out.push(ch);
            }
            '#' if i == 0 => out.push_str("\\#"),
            ' ' if i == 0 || i == last => out.push_str("\\ "),
            '\0' => out.push_str("\\00"),
            _ => out.push(ch),
        }
    }
    out
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn error(&self, message: &str) -> DnError {
        DnError(format!("{message} in {:?}", self.input))
    }

    fn skip_spaces(&mut self) {
        while matches!(self.chars.peek(), Some((_, ' '))) {
            self.chars.next();
        }
    }

    /// Parses one RDN; the flag reports whether a `,` separator followed.
    fn rdn(&mut self) -> Result<(Rdn, bool), DnError> {
        let mut avas = Vec::new();
        loop {
            let attr = self.attribute_type()?;
            let value = self.attribute_value()?;
            avas.push(Ava { attr, value });
            match self.chars.next() {
                Some((_, '+')) => continue,
                Some((_, ',' | ';')) => return Ok((Rdn { avas }, true)),
                None => return Ok((Rdn { avas }, false)),
                Some((_, ch)) => return Err(self.error(&format!("unexpected {ch:?}"))),
            }
        }
    }

    fn attribute_type(&mut self) -> Result<String, DnError> {
        self.skip_spaces();
        let mut attr = String::new();
        loop {
            match self.chars.next() {
                Some((_, '=')) => break,
                Some((_, ch)) if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' => {
                    attr.push(ch);
                }
                Some((_, ' ')) => {
                    self.skip_spaces();
                    match self.chars.next() {
                        Some((_, '=')) => break,
                        _ => return Err(self.error("expected '=' after attribute type")),
                    }
                }
                Some((_, ch)) => {
                    return Err(self.error(&format!("invalid character {ch:?} in attribute type")))
                }
                None => return Err(self.error("missing '='")),
            }
        }
        if attr.is_empty() {
            return Err(self.error("empty attribute type"));
        }
        if !attr.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(self.error(&format!("attribute type {attr:?} must start with a letter or digit")));
        }
        Ok(attr)
    }

    fn attribute_value(&mut self) -> Result<String, DnError> {
        self.skip_spaces();
        if matches!(self.chars.peek(), Some((_, '"'))) {
            return self.quoted_value();
        }
        let mut bytes: Vec<u8> = Vec::new();
        // Length of the value up to the last escaped or non-space character.
        let mut significant = 0;
        while let Some(&(_, ch)) = self.chars.peek() {
            match ch {
                ',' | '+' | ';' => break,
                '\\' => {
                    self.chars.next();
                    self.escape(&mut bytes)?;
                    significant = bytes.len();
                }
                '"' | '<' | '>' => {
                    return Err(self.error(&format!("unescaped {ch:?} in attribute value")));
                }
                _ => {
                    self.chars.next();
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    if ch != ' ' {
                        significant = bytes.len();
                    }
                }
            }
        }
        bytes.truncate(significant);
        String::from_utf8(bytes).map_err(|_| self.error("escaped bytes are not valid UTF-8"))
    }

    fn quoted_value(&mut self) -> Result<String, DnError> {
        self.chars.next();
        let mut bytes: Vec<u8> = Vec::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => break,
                Some((_, '\\')) => self.escape(&mut bytes)?,
                Some((_, ch)) => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                }
                None => return Err(self.error("unterminated quoted value")),
            }
        }
        self.skip_spaces();
        String::from_utf8(bytes).map_err(|_| self.error("escaped bytes are not valid UTF-8"))
    }

    fn escape(&mut self, bytes: &mut Vec<u8>) -> Result<(), DnError> {
        match self.chars.next() {
            Some((_, ch @ (',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' | '#' | ' '))) => {
                bytes.push(ch as u8);
                Ok(())
            }
            Some((_, hi)) if hi.is_ascii_hexdigit() => match self.chars.next() {
                Some((_, lo)) if lo.is_ascii_hexdigit() => {
                    let pair = format!("{hi}{lo}");
                    let byte = u8::from_str_radix(&pair, 16)
                        .map_err(|_| self.error("invalid hex escape"))?;
                    bytes.push(byte);
                    Ok(())
                }
                _ => Err(self.error("incomplete hex escape")),
            },
            Some((_, ch)) => Err(self.error(&format!("invalid escape \\{ch}"))),
            None => Err(self.error("trailing backslash")),
        }
    }
}
