//! # Batch/Unit Lifecycle Manager (PAS-04)
//!
//! Production batches, the unit state machine and everything that moves a
//! unit along it: shipments, receipt, stocking, sales and recalls. Every
//! transition appends a ledger entry in the same transaction.
//!
//! ## Architecture
//!
//! | Layer | Module | Contents |
//! |-------|--------|----------|
//! | Domain | `domain/transitions.rs` | Allowed `(status, action)` pairs |
//! | Domain | `domain/entities.rs` | Requests, summaries, unit views |
//! | Domain | `domain/alerts.rs` | Risk alert staging |
//! | Ports | `ports/inbound.rs` | `BatchLifecycleApi` |
//! | Service | `service.rs` | `BatchLifecycleManager` |
//!
//! ## Atomicity
//!
//! Batch creation inserts the batch, every unit and every Manufactured entry
//! in one transaction. A recall updates the batch, every live unit and
//! raises its alert in one transaction. A failure anywhere leaves nothing.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::alerts::{stage_alert, NewAlert};
pub use domain::entities::{
    AlertFilter, BatchSummary, LabelArchive, NewProduct, ProductionRequest, QrCodeEntry,
    RecallOutcome, ShipmentRequest, StatusCounts, UnitView,
};
pub use domain::errors::LifecycleError;
pub use domain::transitions::{check_transition, is_allowed};
pub use ports::inbound::BatchLifecycleApi;
pub use service::{BatchLifecycleManager, LifecycleConfig};
