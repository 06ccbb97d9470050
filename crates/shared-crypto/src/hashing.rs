//! # SHA-256 Hashing
//!
//! One-shot digests and a canonical field hasher for hash-chained records.
//!
//! ## Canonical Encoding
//!
//! `CanonicalHasher` starts from a domain tag and appends each field as
//! `[len: u64 LE][bytes]`. Integers are appended as fixed-width LE bytes.
//! A location of `"a|b"` and a location of `"a"` followed by an actor `"b"`
//! therefore never collide.

use sha2::{Digest, Sha256};

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Stateful SHA-256 hasher over length-prefixed fields.
#[derive(Clone)]
pub struct CanonicalHasher {
    inner: Sha256,
}

impl CanonicalHasher {
    /// Create a hasher bound to a domain tag (e.g. `"pas.ledger.v1"`).
    pub fn new(domain: &str) -> Self {
        let mut hasher = Self {
            inner: Sha256::new(),
        };
        hasher.field_str(domain);
        hasher
    }

    /// Append a string field.
    pub fn field_str(&mut self, value: &str) -> &mut Self {
        self.field_bytes(value.as_bytes())
    }

    /// Append a raw byte field.
    pub fn field_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.inner.update((value.len() as u64).to_le_bytes());
        self.inner.update(value);
        self
    }

    /// Append an unsigned integer field.
    pub fn field_u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    /// Append a signed integer field.
    pub fn field_i64(&mut self, value: i64) -> &mut Self {
        self.inner.update(value.to_le_bytes());
        self
    }

    /// Finalize and return the digest.
    pub fn finalize(&self) -> Hash {
        self.inner.clone().finalize().into()
    }

    /// Finalize and return the lowercase hex digest (64 chars).
    pub fn finalize_hex(&self) -> String {
        hex::encode(self.finalize())
    }
}

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash data with SHA-256 and hex-encode the digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Whether `s` looks like a lowercase hex SHA-256 digest.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_canonical_deterministic() {
        let h1 = CanonicalHasher::new("t").field_str("a").field_u64(7).finalize();
        let h2 = CanonicalHasher::new("t").field_str("a").field_u64(7).finalize();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_length_prefix_prevents_ambiguity() {
        let joined = CanonicalHasher::new("t").field_str("ab").field_str("c").finalize();
        let split = CanonicalHasher::new("t").field_str("a").field_str("bc").finalize();
        assert_ne!(joined, split);
    }

    #[test]
    fn test_domain_separation() {
        let h1 = CanonicalHasher::new("ledger").field_str("x").finalize();
        let h2 = CanonicalHasher::new("scan").field_str("x").finalize();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_is_hex_digest() {
        assert!(is_hex_digest(&sha256_hex(b"x")));
        assert!(!is_hex_digest("ABCDEF"));
        assert!(!is_hex_digest(&"G".repeat(64)));
    }
}
