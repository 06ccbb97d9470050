//! Storage error types.

use thiserror::Error;

/// Key-value store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },
    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

impl KVStoreError {
    pub(crate) fn io(err: impl std::fmt::Display) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}

/// Errors raised by [`Database`](crate::Database) and
/// [`Transaction`](crate::Transaction).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The underlying key-value backend failed.
    #[error(transparent)]
    Backend(#[from] KVStoreError),

    /// A stored record could not be encoded or decoded.
    #[error("Failed to (de)serialize {table} record: {message}")]
    Serialization { table: &'static str, message: String },

    /// A row lock could not be acquired in time.
    #[error("Timed out after {waited_ms}ms waiting for lock on {resource}")]
    LockTimeout { resource: String, waited_ms: u64 },

    /// A create-only key already exists.
    #[error("Unique constraint {index} violated by {value}")]
    UniqueViolation { index: &'static str, value: String },
}

impl StoreError {
    /// Whether retrying the same operation later can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::LockTimeout { .. } | StoreError::Backend(KVStoreError::IOError { .. })
        )
    }
}
