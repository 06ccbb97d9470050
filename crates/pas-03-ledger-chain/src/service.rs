//! # Ledger Chain Engine
//!
//! Appends hash-linked entries under the unit's row lock and re-verifies
//! stored chains.
//!
//! ## Append Protocol
//!
//! 1. Lock the unit row (held until the transaction ends)
//! 2. Read the unit and its latest entry
//! 3. Link to the latest `current_hash`, or GENESIS for the first entry
//! 4. Allocate the entry id, next sequence and timestamp
//! 5. Hash and stage the entry (its chain position is create-only)
//! 6. Stage the unit's new status, holder and head pointer
//!
//! Nothing is visible until the caller commits; any error leaves the
//! transaction to roll back on drop.

use crate::domain::entities::{
    BatchAudit, ChainVerification, LedgerFilter, LedgerGroup, LedgerRecord,
};
use crate::domain::errors::LedgerError;
use crate::domain::hashing::{compute_entry_hash, ledger_timestamp};
use crate::domain::verification::{verify_entries, ChainHead};
use crate::ports::inbound::LedgerChainApi;
use shared_store::{Database, ReadAccess, RowLock, StoreError, Table, Transaction};
use shared_types::{
    Actor, BatchId, Clock, ItemId, LedgerAction, LedgerEntry, ProductionBatch, GENESIS_HASH,
};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct LedgerChainEngine {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
}

impl LedgerChainEngine {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Append an entry inside the caller's transaction.
    pub fn append_in(
        &self,
        txn: &mut Transaction<'_>,
        actor: &Actor,
        item_id: ItemId,
        action: LedgerAction,
        location: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        let failed = |source: StoreError| LedgerError::AppendFailed { item_id, source };

        txn.lock(RowLock::Unit(item_id)).map_err(failed)?;
        let mut unit = txn
            .unit(item_id)
            .map_err(failed)?
            .ok_or(LedgerError::UnitNotFound(item_id))?;
        let latest = txn.last_ledger_entry(item_id).map_err(failed)?;

        let (previous_hash, sequence) = match latest {
            Some(latest) => (latest.current_hash, latest.sequence + 1),
            None => (GENESIS_HASH.to_string(), 1),
        };

        let mut entry = LedgerEntry {
            entry_id: txn.next_id(Table::LedgerEntry),
            item_id,
            sequence,
            action,
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            actor_role: actor.role,
            location: location.to_string(),
            previous_hash,
            current_hash: String::new(),
            created_at: ledger_timestamp(self.clock.now()),
        };
        entry.current_hash = compute_entry_hash(&entry);
        txn.append_ledger_entry(&entry).map_err(failed)?;

        unit.status = action.resulting_status();
        if action.transfers_custody() {
            unit.holder_id = actor.id;
            unit.holder_name = actor.name.clone();
            unit.holder_role = actor.role;
        }
        unit.chain_length = entry.sequence;
        unit.head_hash = entry.current_hash.clone();
        txn.update_unit(&unit).map_err(failed)?;

        debug!(
            item_id,
            sequence = entry.sequence,
            action = %action,
            actor_id = actor.id,
            "Staged ledger entry"
        );
        Ok(entry)
    }

    fn verify_unit(&self, item_id: ItemId) -> Result<ChainVerification, LedgerError> {
        // Hold the unit lock so the head pointer and entries come from the same commit.
        let mut txn = self.db.begin();
        txn.lock(RowLock::Unit(item_id))?;
        let unit = txn.unit(item_id)?.ok_or(LedgerError::UnitNotFound(item_id))?;
        let entries = txn.ledger_entries(item_id)?;
        drop(txn);

        let result = verify_entries(
            item_id,
            &entries,
            ChainHead {
                chain_length: unit.chain_length,
                head_hash: &unit.head_hash,
            },
        );
        if !result.valid {
            error!(
                item_id,
                serial_code = %unit.serial_code,
                broken_at = ?result.broken_at,
                reason = result.reason.as_deref().unwrap_or_default(),
                "Ledger chain integrity violation"
            );
        }
        Ok(result)
    }

    fn batches_for(&self, filter: &LedgerFilter) -> Result<Vec<ProductionBatch>, LedgerError> {
        let mut batches = match filter.batch_id {
            Some(batch_id) => self.db.batch(batch_id)?.into_iter().collect(),
            None => match filter.manufacturer_id {
                Some(manufacturer_id) => self.db.batches_by_manufacturer(manufacturer_id)?,
                None => self.db.batches()?,
            },
        };
        if let Some(manufacturer_id) = filter.manufacturer_id {
            batches.retain(|b| b.manufacturer_id == manufacturer_id);
        }
        Ok(batches)
    }

    fn records_of(&self, batch: &ProductionBatch) -> Result<Vec<LedgerRecord>, LedgerError> {
        let mut records = Vec::new();
        for unit in self.db.units_in_batch(batch.batch_id)? {
            for entry in self.db.ledger_entries(unit.item_id)? {
                records.push(LedgerRecord {
                    serial_code: unit.serial_code.clone(),
                    batch_id: batch.batch_id,
                    batch_number: batch.batch_number.clone(),
                    entry,
                });
            }
        }
        Ok(records)
    }
}

impl LedgerChainApi for LedgerChainEngine {
    fn append(
        &self,
        actor: &Actor,
        item_id: ItemId,
        action: LedgerAction,
        location: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut txn = self.db.begin();
        let entry = self.append_in(&mut txn, actor, item_id, action, location)?;
        txn.commit()
            .map_err(|source| LedgerError::AppendFailed { item_id, source })?;
        info!(item_id, sequence = entry.sequence, action = %action, "Appended ledger entry");
        Ok(entry)
    }

    fn entries(&self, item_id: ItemId) -> Result<Vec<LedgerEntry>, LedgerError> {
        if self.db.unit(item_id)?.is_none() {
            return Err(LedgerError::UnitNotFound(item_id));
        }
        Ok(self.db.ledger_entries(item_id)?)
    }

    fn verify_chain(&self, item_id: ItemId) -> Result<ChainVerification, LedgerError> {
        self.verify_unit(item_id)
    }

    fn verify_batch(&self, batch_id: BatchId) -> Result<BatchAudit, LedgerError> {
        let batch = self
            .db
            .batch(batch_id)?
            .ok_or(LedgerError::BatchNotFound(batch_id))?;

        let results = self
            .db
            .unit_ids_in_batch(batch_id)?
            .into_iter()
            .map(|item_id| self.verify_unit(item_id))
            .collect::<Result<Vec<_>, _>>()?;

        let valid_units = results.iter().filter(|r| r.valid).count() as u64;
        let audit = BatchAudit {
            batch_id,
            batch_number: batch.batch_number,
            units_checked: results.len() as u64,
            valid_units,
            broken_units: results.len() as u64 - valid_units,
            results,
        };
        info!(
            batch_id,
            units = audit.units_checked,
            broken = audit.broken_units,
            "Audited batch ledger"
        );
        Ok(audit)
    }

    fn list(&self, filter: &LedgerFilter) -> Result<Vec<LedgerRecord>, LedgerError> {
        let mut records = Vec::new();
        for batch in self.batches_for(filter)? {
            records.extend(self.records_of(&batch)?);
        }
        Ok(records)
    }

    fn list_grouped(&self, filter: &LedgerFilter) -> Result<Vec<LedgerGroup>, LedgerError> {
        self.batches_for(filter)?
            .into_iter()
            .map(|batch| {
                Ok(LedgerGroup {
                    entries: self.records_of(&batch)?,
                    batch_id: batch.batch_id,
                    batch_number: batch.batch_number,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
