//! # Serial Generator Service
//!
//! Implements [`SerialGeneratorApi`] with an HMAC-SHA256 keyed by the server
//! auth secret.

use crate::domain::entities::UnitCredentials;
use crate::domain::errors::SerialError;
use crate::ports::inbound::SerialGeneratorApi;
use shared_crypto::{keyed_hash_hex, random_nonce_hex, verify_keyed_hash, AuthSecret};
use tracing::trace;

/// Nonce length in bytes (hex-encoded to 32 chars).
pub const NONCE_LEN: usize = 16;

pub struct SerialGenerator {
    secret: AuthSecret,
}

impl SerialGenerator {
    pub fn new(secret: AuthSecret) -> Self {
        Self { secret }
    }

    fn message(serial_code: &str, nonce: &str) -> Vec<u8> {
        format!("{}:{}", serial_code, nonce).into_bytes()
    }
}

impl SerialGeneratorApi for SerialGenerator {
    fn issue(&self, serial_code: &str) -> Result<UnitCredentials, SerialError> {
        let nonce = random_nonce_hex(NONCE_LEN);
        let auth_hash = self.derive_auth_hash(serial_code, &nonce)?;
        trace!(serial_code, "Issued unit credentials");
        Ok(UnitCredentials {
            serial_code: serial_code.to_string(),
            nonce,
            auth_hash,
        })
    }

    fn derive_auth_hash(&self, serial_code: &str, nonce: &str) -> Result<String, SerialError> {
        Ok(keyed_hash_hex(&self.secret, &Self::message(serial_code, nonce))?)
    }

    fn verify_auth_hash(&self, serial_code: &str, nonce: &str, presented: &str) -> bool {
        verify_keyed_hash(&self.secret, &Self::message(serial_code, nonce), presented)
    }
}
