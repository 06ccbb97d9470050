//! # Ledger Views

use serde::{Deserialize, Serialize};
use shared_types::{BatchId, EntryId, ItemId, LedgerEntry, ParticipantId};

/// Outcome of re-walking one unit's chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub item_id: ItemId,
    pub valid: bool,
    pub entries_checked: u64,
    /// First entry at which the chain stops being trustworthy.
    pub broken_at: Option<EntryId>,
    pub reason: Option<String>,
}

impl ChainVerification {
    pub(crate) fn intact(item_id: ItemId, entries_checked: u64) -> Self {
        Self {
            item_id,
            valid: true,
            entries_checked,
            broken_at: None,
            reason: None,
        }
    }

    pub(crate) fn broken(
        item_id: ItemId,
        entries_checked: u64,
        broken_at: Option<EntryId>,
        reason: String,
    ) -> Self {
        Self {
            item_id,
            valid: false,
            entries_checked,
            broken_at,
            reason: Some(reason),
        }
    }
}

/// Chain verification of every unit in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAudit {
    pub batch_id: BatchId,
    pub batch_number: String,
    pub units_checked: u64,
    pub valid_units: u64,
    pub broken_units: u64,
    pub results: Vec<ChainVerification>,
}

impl BatchAudit {
    pub fn is_intact(&self) -> bool {
        self.broken_units == 0
    }
}

/// Restricts a ledger listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub manufacturer_id: Option<ParticipantId>,
    pub batch_id: Option<BatchId>,
}

/// A ledger entry with the identity of its unit and batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub serial_code: String,
    pub batch_id: BatchId,
    pub batch_number: String,
    #[serde(flatten)]
    pub entry: LedgerEntry,
}

/// Ledger records of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerGroup {
    pub batch_id: BatchId,
    pub batch_number: String,
    pub entries: Vec<LedgerRecord>,
}
