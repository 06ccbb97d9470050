//! # Resolver Errors
//!
//! Internal only. Callers always receive a report; these become a
//! `verified = false` answer and an error log line.

use pas_03_ledger_chain::LedgerError;
use shared_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Storage failure during verification: {0}")]
    Storage(#[from] StoreError),

    #[error("Ledger read failed during verification: {0}")]
    Ledger(#[from] LedgerError),
}
