//! # Serial/Hash Generator (PAS-01)
//!
//! Issues the identifiers and authentication material of production batches
//! and their units.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): code formats and classification, no I/O
//! - **Ports Layer** (`ports/`): the `SerialGeneratorApi` driving port
//! - **Service Layer** (`service.rs`): HMAC-keyed credential issuing
//!
//! ## Security Notes
//!
//! - The auth hash is `HMAC-SHA256(secret, serial ":" nonce)`. Without the
//!   server secret a forger cannot produce a valid hash for a real serial.
//! - The nonce never leaves the service; the hash only inside QR payloads.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::codes::{
    batch_number, classify, is_batch_number, serial_code, BATCH_PREFIX, MAX_UNIT_SEQUENCE,
};
pub use domain::entities::{CodeKind, UnitCredentials};
pub use domain::errors::SerialError;
pub use ports::inbound::SerialGeneratorApi;
pub use service::{SerialGenerator, NONCE_LEN};
