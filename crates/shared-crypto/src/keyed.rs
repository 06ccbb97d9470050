//! # Keyed Hashing (HMAC-SHA256)
//!
//! Server-secret authentication hashes and nonces.
//!
//! ## Security Properties
//!
//! - Secrets are zeroized on drop
//! - Verification is constant-time (`Mac::verify_slice`)
//! - A malformed presented hash fails verification, it never errors

use crate::errors::CryptoError;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Length of an [`AuthSecret`] in bytes.
pub const SECRET_LEN: usize = 32;

/// 32-byte server secret used to key authentication hashes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AuthSecret {
    bytes: [u8; SECRET_LEN],
}

impl AuthSecret {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: [u8; SECRET_LEN]) -> Self {
        Self { bytes }
    }

    /// Parse a 64-char hex secret.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let decoded = hex::decode(s.trim()).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let bytes: [u8; SECRET_LEN] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: SECRET_LEN,
                    actual: decoded.len(),
                })?;
        Ok(Self { bytes })
    }

    /// Generate a fresh random secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// The all-zero development default.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    /// Raw key material.
    pub fn as_bytes(&self) -> &[u8; SECRET_LEN] {
        &self.bytes
    }
}

impl Default for AuthSecret {
    fn default() -> Self {
        Self {
            bytes: [0u8; SECRET_LEN],
        }
    }
}

impl fmt::Debug for AuthSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthSecret([REDACTED])")
    }
}

fn mac_for(secret: &AuthSecret, message: &[u8]) -> Result<HmacSha256, CryptoError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).map_err(|_| {
        CryptoError::InvalidKeyLength {
            expected: SECRET_LEN,
            actual: secret.as_bytes().len(),
        }
    })?;
    mac.update(message);
    Ok(mac)
}

/// `hex(HMAC-SHA256(secret, message))`.
pub fn keyed_hash_hex(secret: &AuthSecret, message: &[u8]) -> Result<String, CryptoError> {
    let mac = mac_for(secret, message)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a presented hex HMAC.
pub fn verify_keyed_hash(secret: &AuthSecret, message: &[u8], presented_hex: &str) -> bool {
    let Ok(presented) = hex::decode(presented_hex) else {
        return false;
    };
    match mac_for(secret, message) {
        Ok(mac) => mac.verify_slice(&presented).is_ok(),
        Err(_) => false,
    }
}

/// `len` random bytes, hex-encoded.
pub fn random_nonce_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
