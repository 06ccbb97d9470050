//! # Ledger Errors

use shared_store::StoreError;
use shared_types::{BatchId, ItemId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Unit {0} not found")]
    UnitNotFound(ItemId),

    #[error("Batch {0} not found")]
    BatchNotFound(BatchId),

    /// The entry was not written; the surrounding transaction must roll back.
    #[error("Ledger append for unit {item_id} failed: {source}")]
    AppendFailed {
        item_id: ItemId,
        #[source]
        source: StoreError,
    },

    #[error("Ledger read failed: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::AppendFailed { source, .. } | LedgerError::Storage(source) => {
                source.is_transient()
            }
            _ => false,
        }
    }
}
