//! # Chain Verification
//!
//! Walks a unit's entries in sequence order and reports the first break:
//!
//! 1. entry belongs to another unit
//! 2. sequence is not contiguous from 1
//! 3. `previous_hash` does not equal the predecessor's `current_hash`
//!    (GENESIS for the first entry)
//! 4. recomputed hash differs from the stored `current_hash`
//!
//! Then compares the tail with the unit's head pointer, which catches
//! entries deleted from the end of the chain.

use super::entities::ChainVerification;
use super::hashing::compute_entry_hash;
use shared_types::{ItemId, LedgerEntry, GENESIS_HASH};

/// The unit's own record of its chain tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHead<'a> {
    pub chain_length: u64,
    pub head_hash: &'a str,
}

pub fn verify_entries(
    item_id: ItemId,
    entries: &[LedgerEntry],
    head: ChainHead<'_>,
) -> ChainVerification {
    let mut expected_prev = GENESIS_HASH;
    let mut checked = 0u64;

    for (index, entry) in entries.iter().enumerate() {
        let expected_seq = index as u64 + 1;
        let reason = if entry.item_id != item_id {
            Some(format!(
                "entry {} belongs to unit {}, not {}",
                entry.entry_id, entry.item_id, item_id
            ))
        } else if entry.sequence != expected_seq {
            Some(format!(
                "expected sequence {}, found {}",
                expected_seq, entry.sequence
            ))
        } else if entry.previous_hash != expected_prev {
            Some(format!(
                "previous_hash of sequence {} does not link to its predecessor",
                entry.sequence
            ))
        } else if compute_entry_hash(entry) != entry.current_hash {
            Some(format!(
                "stored hash of sequence {} does not match its contents",
                entry.sequence
            ))
        } else {
            None
        };

        checked += 1;
        if let Some(reason) = reason {
            return ChainVerification::broken(item_id, checked, Some(entry.entry_id), reason);
        }
        expected_prev = entry.current_hash.as_str();
    }

    let tail = entries.last();
    if head.chain_length != checked {
        return ChainVerification::broken(
            item_id,
            checked,
            tail.map(|e| e.entry_id),
            format!(
                "unit records {} entries but {} are stored",
                head.chain_length, checked
            ),
        );
    }
    if head.head_hash != expected_prev {
        return ChainVerification::broken(
            item_id,
            checked,
            tail.map(|e| e.entry_id),
            "unit head hash does not match the last entry".to_string(),
        );
    }

    ChainVerification::intact(item_id, checked)
}
