//! # RocksDB Storage Adapter
//!
//! RocksDB implementation of the shared-store [`KeyValueStore`] port.
//!
//! All tables share the default column family: the key layout already
//! separates them by prefix, and a prefix scan is one forward iteration.
//!
//! Tuned for a write-light, read-mostly workload:
//! - bloom filters (10 bits per key) for point lookups on serial indexes
//! - LRU block cache
//! - Snappy compression
//! - fsync on every batch, since each batch is one committed transaction

use rocksdb::{
    BlockBasedOptions, Cache, DBCompressionType, Direction, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use shared_store::{BatchOperation, KVStoreError, KeyValueStore, PrefixScan};

#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    pub path: String,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    pub max_write_buffer_number: i32,
    /// fsync each committed batch (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/rocksdb".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}

pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
}

fn io_error(context: &str, err: rocksdb::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: format!("RocksDB {} failed: {}", context, err),
    }
}

impl RocksDbStore {
    /// Open or create the database at `config.path`.
    pub fn open(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| io_error("open", e))?;
        Ok(Self { db, config })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(|e| io_error("get", e))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.db
            .put_opt(key, value, &self.write_options())
            .map_err(|e| io_error("put", e))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.db
            .delete_opt(key, &self.write_options())
            .map_err(|e| io_error("delete", e))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => batch.put(&key, &value),
                BatchOperation::Delete { key } => batch.delete(&key),
            }
        }

        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| io_error("batch write", e))
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.db
            .get_pinned(key)
            .map(|v| v.is_some())
            .map_err(|e| io_error("exists check", e))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<PrefixScan, KVStoreError> {
        let mut results = Vec::new();
        for item in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item.map_err(|e| io_error("scan", e))?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_store::{Database, DatabaseConfig, ReadAccess, Table};
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> RocksDbStore {
        RocksDbStore::open(RocksDbConfig::for_testing(
            dir.path().to_string_lossy().to_string(),
        ))
        .unwrap()
    }

    #[test]
    fn test_rocksdb_basic_operations() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open(&temp_dir);

        store.put(b"u:1", b"unit").unwrap();
        assert_eq!(store.get(b"u:1").unwrap(), Some(b"unit".to_vec()));
        assert!(store.exists(b"u:1").unwrap());
        assert!(!store.exists(b"u:2").unwrap());

        store.delete(b"u:1").unwrap();
        assert!(!store.exists(b"u:1").unwrap());
    }

    #[test]
    fn test_rocksdb_prefix_scan_stops_at_prefix_end() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open(&temp_dir);

        store
            .atomic_batch_write(vec![
                BatchOperation::put(b"l:0001".to_vec(), b"e1".to_vec()),
                BatchOperation::put(b"l:0002".to_vec(), b"e2".to_vec()),
                BatchOperation::put(b"m:0001".to_vec(), b"other".to_vec()),
                BatchOperation::put(b"k:0001".to_vec(), b"before".to_vec()),
            ])
            .unwrap();

        let keys: Vec<_> = store
            .prefix_scan(b"l:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"l:0001".to_vec(), b"l:0002".to_vec()]);
    }

    #[test]
    fn test_database_state_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let db = Database::open(Box::new(open(&temp_dir)), DatabaseConfig::default()).unwrap();
            let mut txn = db.begin();
            assert_eq!(txn.next_id(Table::Batch), 1);
            txn.put_raw(b"b:x".to_vec(), b"batch".to_vec());
            txn.commit().unwrap();
        }

        let db = Database::open(Box::new(open(&temp_dir)), DatabaseConfig::default()).unwrap();
        assert_eq!(db.get_raw(b"b:x").unwrap(), Some(b"batch".to_vec()));
        assert_eq!(db.begin().next_id(Table::Batch), 2);
    }
}
