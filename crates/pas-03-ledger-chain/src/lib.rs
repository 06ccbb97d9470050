//! # Ledger Chain Engine (PAS-03)
//!
//! A per-unit, append-only chain of lifecycle events. Every entry carries the
//! hash of its predecessor, so editing any stored entry breaks the chain at
//! that point.
//!
//! ## Architecture
//!
//! | Layer | Module | Contents |
//! |-------|--------|----------|
//! | Domain | `domain/hashing.rs` | Canonical entry hash |
//! | Domain | `domain/verification.rs` | Chain walk, break detection |
//! | Ports | `ports/inbound.rs` | `LedgerChainApi` |
//! | Service | `service.rs` | Locked append, verification, listings |
//!
//! ## Concurrency
//!
//! Appends to one unit are serialized by its row lock and each chain
//! position is a create-only key, so two writers can never both commit
//! sequence `n` of the same unit. Different units append in parallel.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::entities::{BatchAudit, ChainVerification, LedgerFilter, LedgerGroup, LedgerRecord};
pub use domain::errors::LedgerError;
pub use domain::hashing::{compute_entry_hash, ledger_timestamp, LEDGER_HASH_DOMAIN};
pub use domain::verification::{verify_entries, ChainHead};
pub use ports::inbound::LedgerChainApi;
pub use service::LedgerChainEngine;
