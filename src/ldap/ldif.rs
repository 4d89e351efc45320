//! LDIF rendering of search results, in the shape `ldapsearch -LLL` prints.

use crate::directory::LdapEntry;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// True when `value` may be written after `attr: ` without base64 encoding.
fn is_safe(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return true;
    };
    !matches!(first, ' ' | ':' | '<')
        && !value.ends_with(' ')
        && value
            .chars()
            .all(|c| c.is_ascii() && !matches!(c, '\0' | '\n' | '\r'))
}

fn write_line(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    if is_safe(value) {
        out.push_str(": ");
        out.push_str(value);
    } else {
        out.push_str(":: ");
        out.push_str(&BASE64.encode(value));
    }
    out.push('\n');
}

pub fn entry_to_ldif(entry: &LdapEntry) -> String {
    let mut out = String::new();
    write_line(&mut out, "dn", entry.dn());
    for attr in entry.attributes() {
        for value in &attr.values {
            write_line(&mut out, &attr.name, value);
        }
    }
    out
}

/// Entries separated by a blank line.
pub fn entries_to_ldif<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = &'a LdapEntry>,
{
    entries
        .into_iter()
        .map(entry_to_ldif)
        .collect::<Vec<_>>()
        .join("\n")
}
