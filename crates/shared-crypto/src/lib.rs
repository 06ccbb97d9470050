//! # Shared Crypto - Hashing Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Ledger chain hashes |
//! | `keyed` | HMAC-SHA256 | Per-unit authentication hashes |
//!
//! ## Security Properties
//!
//! - **Canonical hashing**: every field is length-prefixed, so no two distinct
//!   field lists serialize to the same byte stream
//! - **HMAC verification**: constant-time comparison via `Mac::verify_slice`
//! - **Secrets**: zeroized on drop and redacted from `Debug` output

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod keyed;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{is_hex_digest, sha256, sha256_hex, CanonicalHasher, Hash};
pub use keyed::{keyed_hash_hex, random_nonce_hex, verify_keyed_hash, AuthSecret};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
