//! # Transactions
//!
//! A `Transaction` stages writes in an ordered overlay and applies them as a
//! single atomic batch on commit. Reads through the transaction see its own
//! staged writes. Row locks taken through it are held until commit or drop.
//!
//! Dropping an uncommitted transaction discards the overlay and releases its
//! locks, so an early `?` return or a cancelled request leaves no partial
//! state behind.

use crate::database::{decode_u64, Database, RowGuard};
use crate::errors::StoreError;
use crate::keys::{KeyPrefix, RowLock, Table};
use crate::ports::outbound::{BatchOperation, PrefixScan};
use crate::tables::ReadAccess;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Unit of work over a [`Database`].
pub struct Transaction<'db> {
    db: &'db Database,
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    /// Keys that must not exist in committed storage, with the violated index name.
    create_only: BTreeMap<Vec<u8>, (&'static str, String)>,
    id_marks: BTreeMap<Table, u64>,
    guards: HashMap<RowLock, RowGuard>,
    committed: bool,
}

impl<'db> Transaction<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            staged: BTreeMap::new(),
            create_only: BTreeMap::new(),
            id_marks: BTreeMap::new(),
            guards: HashMap::new(),
            committed: false,
        }
    }

    /// Take a row lock, held until this transaction ends. Re-locking a row
    /// this transaction already holds is a no-op.
    pub fn lock(&mut self, resource: RowLock) -> Result<(), StoreError> {
        if self.guards.contains_key(&resource) {
            return Ok(());
        }
        let guard = self.db.lock_row(resource)?;
        self.guards.insert(resource, guard);
        Ok(())
    }

    /// Take several row locks in their canonical order.
    pub fn lock_all(
        &mut self,
        resources: impl IntoIterator<Item = RowLock>,
    ) -> Result<(), StoreError> {
        let mut resources: Vec<RowLock> = resources.into_iter().collect();
        resources.sort();
        resources.dedup();
        for resource in resources {
            self.lock(resource)?;
        }
        Ok(())
    }

    pub fn holds(&self, resource: RowLock) -> bool {
        self.guards.contains_key(&resource)
    }

    /// Allocate the next id of `table`.
    pub fn next_id(&mut self, table: Table) -> u64 {
        let id = self.db.allocate_id(table);
        let mark = self.id_marks.entry(table).or_insert(id);
        *mark = (*mark).max(id);
        id
    }

    pub fn put_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.staged.insert(key, Some(value));
    }

    pub fn delete_raw(&mut self, key: Vec<u8>) {
        self.create_only.remove(&key);
        self.staged.insert(key, None);
    }

    /// Stage `key` as a new row. Fails if it is already present, here or in
    /// committed storage; commit checks again under the store write lock.
    pub fn insert_unique(
        &mut self,
        key: Vec<u8>,
        value: Vec<u8>,
        index: &'static str,
        display: impl Into<String>,
    ) -> Result<(), StoreError> {
        let display = display.into();
        if self.get_raw(&key)?.is_some() {
            return Err(StoreError::UniqueViolation {
                index,
                value: display,
            });
        }
        self.create_only.insert(key.clone(), (index, display));
        self.staged.insert(key, Some(value));
        Ok(())
    }

    /// Number of staged writes.
    pub fn pending_writes(&self) -> usize {
        self.staged.len()
    }

    /// Apply every staged write as one atomic batch, then release all locks.
    pub fn commit(mut self) -> Result<(), StoreError> {
        let staged = std::mem::take(&mut self.staged);
        let create_only = std::mem::take(&mut self.create_only);
        let id_marks = std::mem::take(&mut self.id_marks);

        {
            let mut store = self.db.write_store();

            for (key, (index, value)) in create_only {
                if store.exists(&key)? {
                    return Err(StoreError::UniqueViolation { index, value });
                }
            }

            let mut operations: Vec<BatchOperation> = staged
                .into_iter()
                .map(|(key, value)| match value {
                    Some(value) => BatchOperation::Put { key, value },
                    None => BatchOperation::Delete { key },
                })
                .collect();

            for (table, mark) in id_marks {
                let key = KeyPrefix::next_id_key(table);
                let persisted = match store.get(&key)? {
                    Some(bytes) => decode_u64(&bytes)?,
                    None => 1,
                };
                let next = mark + 1;
                if next > persisted {
                    operations.push(BatchOperation::put(key, next.to_be_bytes().to_vec()));
                }
            }

            let count = operations.len();
            store.atomic_batch_write(operations)?;
            debug!(writes = count, locks = self.guards.len(), "Committed transaction");
        }

        self.committed = true;
        Ok(())
    }
}

impl ReadAccess for Transaction<'_> {
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.staged.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.db.get_committed(key)?),
        }
    }

    fn scan_raw(&self, prefix: &[u8]) -> Result<PrefixScan, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.db.scan_committed(prefix)?.into_iter().collect();

        for (key, value) in self
            .staged
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.staged.is_empty() {
            debug!(
                discarded = self.staged.len(),
                locks = self.guards.len(),
                "Rolled back transaction"
            );
        }
    }
}
