//! # Storage Backends
//!
//! Opens the [`KeyValueStore`] selected by `storage.backend`:
//!
//! | Backend | Store | Location |
//! |---------|-------|----------|
//! | `memory` | `InMemoryKVStore` | none, lost on exit |
//! | `file` | `FileBackedKVStore` | `<data_dir>/pas.db` |
//! | `rocksdb` | `RocksDbStore` (feature `rocksdb`) | `<data_dir>/rocksdb` |
//!
//! Persistent backends take an exclusive lock on the data directory first,
//! so two nodes never write the same files.

pub mod lock;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

pub use lock::DataDirLock;
#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

use crate::container::config::{StorageBackend, StorageConfig};
use anyhow::{Context, Result};
use shared_store::{FileBackedKVStore, InMemoryKVStore, KeyValueStore};
use tracing::info;

/// File name of the file backend inside the data directory.
pub const FILE_STORE_NAME: &str = "pas.db";

/// An opened backend plus the lock that guards its directory.
pub struct OpenedStore {
    pub store: Box<dyn KeyValueStore>,
    pub lock: Option<DataDirLock>,
}

pub fn open_store(config: &StorageConfig) -> Result<OpenedStore> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage, data is lost on exit");
            Ok(OpenedStore {
                store: Box::new(InMemoryKVStore::new()),
                lock: None,
            })
        }
        StorageBackend::File => {
            let lock = DataDirLock::acquire(&config.data_dir)?;
            let path = config.data_dir.join(FILE_STORE_NAME);
            let store = FileBackedKVStore::open(&path)
                .with_context(|| format!("Failed to open file store at {}", path.display()))?;
            info!(path = %path.display(), "Opened file-backed storage");
            Ok(OpenedStore {
                store: Box::new(store),
                lock: Some(lock),
            })
        }
        StorageBackend::RocksDb => open_rocksdb(config),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(config: &StorageConfig) -> Result<OpenedStore> {
    let lock = DataDirLock::acquire(&config.data_dir)?;
    let path = config.data_dir.join("rocksdb");
    let store = RocksDbStore::open(RocksDbConfig {
        path: path.to_string_lossy().to_string(),
        ..RocksDbConfig::default()
    })
    .with_context(|| format!("Failed to open RocksDB at {}", path.display()))?;
    info!(path = %path.display(), "Opened RocksDB storage");
    Ok(OpenedStore {
        store: Box::new(store),
        lock: Some(lock),
    })
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_config: &StorageConfig) -> Result<OpenedStore> {
    anyhow::bail!("storage backend 'rocksdb' requires building with `--features rocksdb`")
}
