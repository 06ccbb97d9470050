//! # Inbound Ports
//!
//! The serial generator API used by the lifecycle manager and the
//! verification resolver.

use crate::domain::entities::UnitCredentials;
use crate::domain::errors::SerialError;

/// Issues and checks per-unit authentication material.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait SerialGeneratorApi: Send + Sync {
    /// Issue a fresh nonce and auth hash for `serial_code`.
    fn issue(&self, serial_code: &str) -> Result<UnitCredentials, SerialError>;

    /// Recompute the auth hash of a stored unit.
    fn derive_auth_hash(&self, serial_code: &str, nonce: &str) -> Result<String, SerialError>;

    /// Constant-time check of a presented auth hash.
    fn verify_auth_hash(&self, serial_code: &str, nonce: &str, presented: &str) -> bool;
}
