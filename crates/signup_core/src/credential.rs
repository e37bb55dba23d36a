//! Credential derivation for stored account secrets.
//!
//! # Responsibility
//! - Turn a plaintext sign-up secret into a one-way digest before storage.
//! - Keep the digest primitive behind a trait seam so callers can inject it.
//!
//! # Invariants
//! - Output is the lowercase hex SHA-256 of the secret's UTF-8 bytes (64 chars).
//! - Derivation is deterministic and has no side effects.
//!
//! # Non-production notice
//! This is storage obfuscation for a demo flow, not a credential store. There
//! is no salt and no work factor, so equal secrets produce equal digests and
//! brute force is cheap. A real deployment needs a slow, salted, server-side
//! scheme (for example Argon2id with per-record salts).

use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Hex length of a SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Errors raised while deriving a credential digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The digest primitive could not be used in this environment.
    CryptoUnavailable(String),
}

impl Display for CredentialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CryptoUnavailable(details) => {
                write!(f, "credential digest unavailable: {details}")
            }
        }
    }
}

impl Error for CredentialError {}

/// One-way digest standing in for a plaintext secret.
///
/// `Debug` is redacted so the digest never lands in logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialDigest(String);

impl CredentialDigest {
    /// Wraps an already-computed hex digest.
    ///
    /// Returns `None` unless `hex` is exactly 64 lowercase hex characters.
    pub fn from_hex(hex: impl Into<String>) -> Option<Self> {
        let hex = hex.into();
        let valid = hex.len() == DIGEST_HEX_LEN
            && hex
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
        valid.then_some(Self(hex))
    }

    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub(crate) fn into_inner(self) -> String {
        self.0
    }
}

impl Debug for CredentialDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialDigest(<redacted>)")
    }
}

/// Seam for the digest primitive used by the registration engine.
///
/// Implementations are storage-obfuscation only; see the module notice.
pub trait CredentialDeriver {
    fn derive(&self, secret: &str) -> Result<CredentialDigest, CredentialError>;
}

/// Unsalted single-round SHA-256 deriver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Deriver;

impl CredentialDeriver for Sha256Deriver {
    fn derive(&self, secret: &str) -> Result<CredentialDigest, CredentialError> {
        Ok(derive_sha256_hex(secret))
    }
}

/// Computes the lowercase hex SHA-256 of `secret`.
pub fn derive_sha256_hex(secret: &str) -> CredentialDigest {
    let digest = Sha256::digest(secret.as_bytes());
    CredentialDigest(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::{derive_sha256_hex, CredentialDeriver, CredentialDigest, Sha256Deriver};

    #[test]
    fn derive_matches_known_sha256_vector() {
        let digest = derive_sha256_hex("abc");
        assert_eq!(
            digest.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn derive_is_deterministic_and_64_lowercase_hex() {
        let first = Sha256Deriver.derive("s3cret").unwrap();
        let second = Sha256Deriver.derive("s3cret").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.as_str().len(), 64);
        assert!(CredentialDigest::from_hex(first.as_str()).is_some());
    }

    #[test]
    fn from_hex_rejects_uppercase_and_wrong_length() {
        assert!(CredentialDigest::from_hex("AB".repeat(32)).is_none());
        assert!(CredentialDigest::from_hex("ab").is_none());
    }

    #[test]
    fn debug_output_is_redacted() {
        let digest = derive_sha256_hex("s3cret");
        let rendered = format!("{digest:?}");
        assert!(!rendered.contains(digest.as_str()));
    }
}
