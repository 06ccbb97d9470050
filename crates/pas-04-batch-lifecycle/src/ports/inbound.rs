//! # Inbound Ports
//!
//! Every operation takes the calling [`Actor`] and checks its capability
//! before touching storage.

use crate::domain::entities::{
    AlertFilter, BatchSummary, LabelArchive, NewProduct, ProductionRequest, QrCodeEntry,
    RecallOutcome, ShipmentRequest, UnitView,
};
use crate::domain::errors::LifecycleError;
use shared_types::{
    Actor, AlertId, BatchId, ItemId, LedgerAction, LedgerEntry, ProductDefId, ProductDefinition,
    RiskAlert, Shipment, ShipmentId,
};

/// Batch and unit lifecycle.
///
/// Implementations must be thread-safe (`Send + Sync`). Each mutating call is
/// one transaction: it either fully commits or leaves no trace.
pub trait BatchLifecycleApi: Send + Sync {
    fn register_product(&self, actor: &Actor, product: NewProduct)
        -> Result<ProductDefinition, LifecycleError>;

    fn product(&self, product_def_id: ProductDefId) -> Result<ProductDefinition, LifecycleError>;

    /// Create the batch, its units and their Manufactured entries.
    fn create_batch(
        &self,
        actor: &Actor,
        request: ProductionRequest,
    ) -> Result<BatchSummary, LifecycleError>;

    /// Apply one state-machine action to one unit.
    fn advance(
        &self,
        actor: &Actor,
        item_id: ItemId,
        action: LedgerAction,
        location: &str,
    ) -> Result<LedgerEntry, LifecycleError>;

    /// Apply one action to several units, all or nothing.
    fn advance_many(
        &self,
        actor: &Actor,
        item_ids: &[ItemId],
        action: LedgerAction,
        location: &str,
    ) -> Result<Vec<LedgerEntry>, LifecycleError>;

    fn create_shipment(
        &self,
        actor: &Actor,
        request: ShipmentRequest,
    ) -> Result<Shipment, LifecycleError>;

    /// Receive every unit of a shipment addressed to the actor.
    fn confirm_shipment(
        &self,
        actor: &Actor,
        shipment_id: ShipmentId,
        location: Option<String>,
    ) -> Result<Shipment, LifecycleError>;

    fn store_units(
        &self,
        actor: &Actor,
        item_ids: &[ItemId],
        location: &str,
    ) -> Result<Vec<LedgerEntry>, LifecycleError>;

    fn record_sale(
        &self,
        actor: &Actor,
        item_ids: &[ItemId],
        location: &str,
    ) -> Result<Vec<LedgerEntry>, LifecycleError>;

    /// Recall a batch: every unsold unit becomes Recalled and one alert is raised.
    fn recall(
        &self,
        actor: &Actor,
        batch_id: BatchId,
        reason: &str,
    ) -> Result<RecallOutcome, LifecycleError>;

    fn batch_summary(&self, actor: &Actor, batch_id: BatchId)
        -> Result<BatchSummary, LifecycleError>;

    /// Admins see every batch, manufacturers their own.
    fn list_batches(&self, actor: &Actor) -> Result<Vec<BatchSummary>, LifecycleError>;

    fn units_in_batch(&self, actor: &Actor, batch_id: BatchId)
        -> Result<Vec<UnitView>, LifecycleError>;

    /// QR data URLs of every unit, in sequence order.
    fn qr_codes(&self, actor: &Actor, batch_id: BatchId)
        -> Result<Vec<QrCodeEntry>, LifecycleError>;

    /// ZIP of PNG labels of every unit.
    fn qr_archive(&self, actor: &Actor, batch_id: BatchId) -> Result<LabelArchive, LifecycleError>;

    /// Newest first.
    fn risk_alerts(&self, actor: &Actor, filter: &AlertFilter)
        -> Result<Vec<RiskAlert>, LifecycleError>;

    fn resolve_alert(&self, actor: &Actor, alert_id: AlertId) -> Result<RiskAlert, LifecycleError>;
}
