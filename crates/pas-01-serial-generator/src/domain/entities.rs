//! # Serial Entities

use serde::{Deserialize, Serialize};

/// Identity and authentication material issued for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCredentials {
    pub serial_code: String,
    /// Random per-unit salt, persisted with the unit and never exposed.
    pub nonce: String,
    /// `hex(HMAC-SHA256(secret, serial ":" nonce))`.
    pub auth_hash: String,
}

/// What a scanned code refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodeKind {
    Batch {
        batch_number: String,
    },
    Unit {
        serial_code: String,
        batch_number: String,
        sequence: u32,
    },
    Unknown,
}

impl CodeKind {
    pub fn is_batch(&self) -> bool {
        matches!(self, CodeKind::Batch { .. })
    }
}
