//! # Inbound Ports
//!
//! The ledger API used by the lifecycle manager, the verification resolver
//! and the audit endpoints.

use crate::domain::entities::{
    BatchAudit, ChainVerification, LedgerFilter, LedgerGroup, LedgerRecord,
};
use crate::domain::errors::LedgerError;
use shared_types::{Actor, BatchId, ItemId, LedgerAction, LedgerEntry};

/// Append-only, per-unit hash chain.
///
/// Implementations must be thread-safe (`Send + Sync`).
pub trait LedgerChainApi: Send + Sync {
    /// Append one entry in its own transaction.
    fn append(
        &self,
        actor: &Actor,
        item_id: ItemId,
        action: LedgerAction,
        location: &str,
    ) -> Result<LedgerEntry, LedgerError>;

    /// The unit's chain in sequence order.
    fn entries(&self, item_id: ItemId) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Re-walk the unit's chain. Never repairs anything.
    fn verify_chain(&self, item_id: ItemId) -> Result<ChainVerification, LedgerError>;

    /// Verify every unit of a batch.
    fn verify_batch(&self, batch_id: BatchId) -> Result<BatchAudit, LedgerError>;

    /// Entries with their unit and batch identity, by batch, unit, sequence.
    fn list(&self, filter: &LedgerFilter) -> Result<Vec<LedgerRecord>, LedgerError>;

    /// [`list`](Self::list) grouped by batch.
    fn list_grouped(&self, filter: &LedgerFilter) -> Result<Vec<LedgerGroup>, LedgerError>;
}
