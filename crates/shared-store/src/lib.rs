//! # Shared Store - Transactional Key-Value Storage
//!
//! Persistence for the traceability subsystems.
//!
//! ## Layers
//!
//! | Layer | Type | Responsibility |
//! |-------|------|----------------|
//! | Port | [`KeyValueStore`] | get / put / delete / atomic batch / ordered prefix scan |
//! | Adapters | [`InMemoryKVStore`], [`FileBackedKVStore`] | Backends (RocksDB: `node-runtime`) |
//! | Handle | [`Database`] | Shared store, row locks, id allocation |
//! | Unit of work | [`Transaction`] | Staged writes, held locks, atomic commit |
//! | Tables | [`ReadAccess`] + `Transaction` writes | Typed record access and indexes |
//!
//! ## Guarantees
//!
//! - A transaction's writes become visible together or not at all.
//! - Create-only keys (serial codes, batch numbers, ledger positions) are
//!   re-checked under the store write lock at commit.
//! - Row locks are acquired with a timeout and released on commit or drop.

pub mod adapters;
pub mod database;
pub mod errors;
pub mod keys;
pub mod ports;
pub mod tables;
pub mod transaction;

pub use adapters::storage::{FileBackedKVStore, InMemoryKVStore};
pub use database::{Database, DatabaseConfig};
pub use errors::{KVStoreError, StoreError};
pub use keys::{KeyPrefix, RowLock, Table};
pub use ports::outbound::{BatchOperation, KeyValueStore, PrefixScan};
pub use tables::ReadAccess;
pub use transaction::Transaction;
