//! `userPassword` schemes understood by credential-checking binds, and the
//! matching hash generator used to write fixtures.

use crate::MockLdapError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Hash methods accepted by [`hash_password`].
pub const HASH_METHODS: &[&str] = &["plain", "sha", "ssha", "sha256", "bcrypt"];

const SHA1_LEN: usize = 20;

pub fn verify_password(password: &str, stored: &str) -> crate::Result<bool> {
    if let Some(encoded) = strip_scheme(stored, "{SSHA}") {
        verify_ssha(password, encoded)
    } else if let Some(encoded) = strip_scheme(stored, "{SHA}") {
        verify_sha(password, encoded)
    } else if let Some(encoded) = strip_scheme(stored, "{SHA256}") {
        verify_sha256(password, encoded)
    } else if let Some(hash) = strip_scheme(stored, "{BCRYPT}") {
        verify_bcrypt(password, hash)
    } else if stored.starts_with("$2") {
        verify_bcrypt(password, stored)
    } else {
        Ok(password == stored)
    }
}

/// Scheme tags are case-insensitive (`{ssha}` and `{SSHA}` are the same).
fn strip_scheme<'a>(stored: &'a str, scheme: &str) -> Option<&'a str> {
    let prefix = stored.get(..scheme.len())?;
    prefix
        .eq_ignore_ascii_case(scheme)
        .then(|| &stored[scheme.len()..])
}

fn decode(encoded: &str, scheme: &str) -> crate::Result<Vec<u8>> {
    BASE64
        .decode(encoded.trim())
        .map_err(|e| MockLdapError::Auth(format!("Invalid {scheme} encoding: {e}")))
}

fn verify_ssha(password: &str, encoded: &str) -> crate::Result<bool> {
    let decoded = decode(encoded, "SSHA")?;
    if decoded.len() < SHA1_LEN {
        return Err(MockLdapError::Auth("Invalid SSHA hash length".to_string()));
    }

    let (hash, salt) = decoded.split_at(SHA1_LEN);

    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);
    Ok(hasher.finalize().as_slice() == hash)
}

fn verify_sha(password: &str, encoded: &str) -> crate::Result<bool> {
    let decoded = decode(encoded, "SHA")?;
    Ok(Sha1::digest(password.as_bytes()).as_slice() == decoded)
}

fn verify_sha256(password: &str, encoded: &str) -> crate::Result<bool> {
    let decoded = decode(encoded, "SHA256")?;
    Ok(Sha256::digest(password.as_bytes()).as_slice() == decoded)
}

fn verify_bcrypt(password: &str, hash: &str) -> crate::Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| MockLdapError::Auth(format!("Bcrypt verification failed: {e}")))
}

pub fn hash_password(password: &str, method: &str) -> crate::Result<String> {
    match method.to_ascii_lowercase().as_str() {
        "plain" => Ok(password.to_string()),
        "sha" => Ok(format!(
            "{{SHA}}{}",
            BASE64.encode(Sha1::digest(password.as_bytes()))
        )),
        "ssha" => {
            use rand::Rng;
            let salt: [u8; 8] = rand::thread_rng().gen();

            let mut hasher = Sha1::new();
            hasher.update(password.as_bytes());
            hasher.update(salt);

            let mut result = hasher.finalize().to_vec();
            result.extend_from_slice(&salt);

            Ok(format!("{{SSHA}}{}", BASE64.encode(result)))
        }
        "sha256" => Ok(format!(
            "{{SHA256}}{}",
            BASE64.encode(Sha256::digest(password.as_bytes()))
        )),
        "bcrypt" => {
            let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
                .map_err(|e| MockLdapError::Auth(format!("Bcrypt hashing failed: {e}")))?;
            Ok(format!("{{BCRYPT}}{hash}"))
        }
        _ => Err(MockLdapError::Auth(format!(
            "Unknown password hash method: {method}"
        ))),
    }
}
