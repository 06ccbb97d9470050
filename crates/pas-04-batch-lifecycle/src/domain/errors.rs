//! # Lifecycle Errors

use pas_01_serial_generator::SerialError;
use pas_02_qr_codec::QrError;
use pas_03_ledger_chain::LedgerError;
use shared_store::StoreError;
use shared_types::{
    ActorError, AlertId, BatchId, ItemId, LedgerAction, ProductDefId, ShipmentId, UnitStatus,
};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error(transparent)]
    Actor(#[from] ActorError),

    /// Missing or malformed input. Nothing was written.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product {0} not found")]
    ProductNotFound(ProductDefId),

    #[error("Batch {0} not found")]
    BatchNotFound(BatchId),

    #[error("Unit {0} not found")]
    UnitNotFound(ItemId),

    #[error("Shipment {0} not found")]
    ShipmentNotFound(ShipmentId),

    #[error("Risk alert {0} not found")]
    AlertNotFound(AlertId),

    #[error("Unit {item_id} is {from} and cannot be {action}")]
    InvalidTransition {
        item_id: ItemId,
        from: UnitStatus,
        action: LedgerAction,
    },

    #[error("Batch {0} is already recalled")]
    AlreadyRecalled(BatchId),

    #[error("Shipment {0} was already delivered")]
    ShipmentAlreadyDelivered(ShipmentId),

    #[error("Risk alert {0} is already resolved")]
    AlertAlreadyResolved(AlertId),

    #[error(transparent)]
    Serial(#[from] SerialError),

    #[error(transparent)]
    Qr(#[from] QrError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl LifecycleError {
    /// Retrying later can succeed (lock timeout, backend I/O).
    pub fn is_transient(&self) -> bool {
        match self {
            LifecycleError::Ledger(e) => e.is_transient(),
            LifecycleError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// The stored data contradicts an invariant the service maintains.
    pub fn is_integrity_violation(&self) -> bool {
        match self {
            LifecycleError::Serial(SerialError::DuplicateSerial(_)) => true,
            LifecycleError::Ledger(LedgerError::AppendFailed { source, .. })
            | LifecycleError::Storage(source) => {
                matches!(
                    source,
                    StoreError::UniqueViolation { .. } | StoreError::Serialization { .. }
                )
            }
            _ => false,
        }
    }
}
