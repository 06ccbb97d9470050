//! # Database Handle
//!
//! The shared, injected storage handle. Wraps a [`KeyValueStore`] with:
//!
//! - a `RwLock` so commits are applied as one atomic batch while reads
//!   proceed concurrently between commits,
//! - a row lock table (named per-record mutexes held by a transaction until
//!   commit or rollback),
//! - per-table id allocators whose high-water marks are persisted on commit.

use crate::adapters::storage::InMemoryKVStore;
use crate::errors::{KVStoreError, StoreError};
use crate::keys::{KeyPrefix, RowLock, Table};
use crate::ports::outbound::{KeyValueStore, PrefixScan};
use crate::transaction::Transaction;
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Guard for one held row lock.
pub(crate) type RowGuard = parking_lot::lock_api::ArcMutexGuard<parking_lot::RawMutex, ()>;

/// Prune idle lock entries once the table grows past this size.
const LOCK_TABLE_PRUNE_THRESHOLD: usize = 4096;

/// Database tuning.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// How long a transaction waits for a row lock before `LockTimeout`.
    pub lock_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared storage handle, passed to services as `Arc<Database>`.
pub struct Database {
    store: RwLock<Box<dyn KeyValueStore>>,
    row_locks: Mutex<HashMap<RowLock, Arc<Mutex<()>>>>,
    next_ids: [AtomicU64; Table::ALL.len()],
    config: DatabaseConfig,
}

impl Database {
    /// Open a database over `store`, restoring id high-water marks.
    pub fn open(store: Box<dyn KeyValueStore>, config: DatabaseConfig) -> Result<Self, StoreError> {
        let next_ids: [AtomicU64; Table::ALL.len()] = std::array::from_fn(|_| AtomicU64::new(1));
        for table in Table::ALL {
            if let Some(bytes) = store.get(&KeyPrefix::next_id_key(table))? {
                let next = decode_u64(&bytes)?;
                debug!(table = table.name(), next, "Restored id allocator");
                next_ids[table.index()].store(next, Ordering::SeqCst);
            }
        }

        Ok(Self {
            store: RwLock::new(store),
            row_locks: Mutex::new(HashMap::new()),
            next_ids,
            config,
        })
    }

    /// Fresh in-memory database.
    pub fn in_memory() -> Self {
        let store: Box<dyn KeyValueStore> = Box::new(InMemoryKVStore::new());
        Self {
            store: RwLock::new(store),
            row_locks: Mutex::new(HashMap::new()),
            next_ids: std::array::from_fn(|_| AtomicU64::new(1)),
            config: DatabaseConfig::default(),
        }
    }

    /// Start a transaction. Dropping it without `commit` rolls back.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub(crate) fn get_committed(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.store.read().get(key)
    }

    pub(crate) fn scan_committed(&self, prefix: &[u8]) -> Result<PrefixScan, KVStoreError> {
        self.store.read().prefix_scan(prefix)
    }

    pub(crate) fn write_store(&self) -> RwLockWriteGuard<'_, Box<dyn KeyValueStore>> {
        self.store.write()
    }

    /// Next id for `table`. Ids of rolled-back transactions are never reused.
    pub(crate) fn allocate_id(&self, table: Table) -> u64 {
        self.next_ids[table.index()].fetch_add(1, Ordering::SeqCst)
    }

    /// Acquire the named row lock, waiting at most `lock_timeout`.
    pub(crate) fn lock_row(&self, resource: RowLock) -> Result<RowGuard, StoreError> {
        let mutex = {
            let mut table = self.row_locks.lock();
            if table.len() > LOCK_TABLE_PRUNE_THRESHOLD {
                table.retain(|_, m| Arc::strong_count(m) > 1);
            }
            table
                .entry(resource)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        mutex
            .try_lock_arc_for(self.config.lock_timeout)
            .ok_or_else(|| StoreError::LockTimeout {
                resource: resource.to_string(),
                waited_ms: self.config.lock_timeout.as_millis() as u64,
            })
    }
}

pub(crate) fn decode_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| StoreError::Serialization {
        table: "meta",
        message: format!("expected 8 bytes, got {}", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(arr))
}
