//! # Serial Errors

use shared_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SerialError {
    /// Not of the form `BATCH-YYYYMMDD-NNNN`.
    #[error("Invalid batch number: {0}")]
    InvalidBatchNumber(String),

    /// Daily batch counters start at 1.
    #[error("Batch counter must be at least 1")]
    ZeroBatchCounter,

    /// Unit sequence outside `1..=max`.
    #[error("Unit sequence {sequence} out of range 1..={max}")]
    SequenceOutOfRange { sequence: u32, max: u32 },

    /// A generated serial already exists. Integrity failure, never retried.
    #[error("Duplicate serial code: {0}")]
    DuplicateSerial(String),

    #[error("Auth hash derivation failed: {0}")]
    Crypto(#[from] CryptoError),
}
