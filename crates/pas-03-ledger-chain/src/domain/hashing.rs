//! # Entry Hashing
//!
//! `current_hash = hex(SHA-256(domain, entry_id, item_id, sequence, action,
//! actor_id, actor_name, actor_role, location, previous_hash, created_at_ms))`
//!
//! Every stored field except `current_hash` itself is covered, each one
//! length-prefixed by [`CanonicalHasher`].

use chrono::{DateTime, SubsecRound, Utc};
use shared_crypto::CanonicalHasher;
use shared_types::LedgerEntry;

/// Domain tag of ledger entry hashes.
pub const LEDGER_HASH_DOMAIN: &str = "bess-pas.ledger.v1";

/// Compute the hash an entry should carry.
pub fn compute_entry_hash(entry: &LedgerEntry) -> String {
    CanonicalHasher::new(LEDGER_HASH_DOMAIN)
        .field_u64(entry.entry_id)
        .field_u64(entry.item_id)
        .field_u64(entry.sequence)
        .field_str(entry.action.as_str())
        .field_u64(entry.actor_id)
        .field_str(&entry.actor_name)
        .field_str(entry.actor_role.as_str())
        .field_str(&entry.location)
        .field_str(&entry.previous_hash)
        .field_i64(entry.created_at.timestamp_millis())
        .finalize_hex()
}

/// Timestamps are hashed at millisecond precision, so they are stored at it too.
pub fn ledger_timestamp(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(3)
}
