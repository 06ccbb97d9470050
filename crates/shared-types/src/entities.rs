//! # Core Domain Entities
//!
//! The persisted records of the traceability core.
//!
//! ## Clusters
//!
//! - **Production**: `ProductDefinition`, `ProductionBatch`, `ProductUnit`
//! - **Provenance**: `LedgerEntry`, `Shipment`
//! - **Audit**: `ScanRecord`, `RiskAlert`
//!
//! Records are stored as-is. Anything that must not leave the service (the
//! unit nonce and auth hash) is stripped by the view types of the crates that
//! expose records over the API.

use crate::actor::Role;
use crate::status::{
    AlertKind, AlertSeverity, BatchStatus, LedgerAction, ScanChannel, ScanResult, ShipmentStatus,
    UnitStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type ProductDefId = u64;
pub type BatchId = u64;
pub type ItemId = u64;
pub type EntryId = u64;
pub type ScanId = u64;
pub type AlertId = u64;
pub type ShipmentId = u64;
/// Participant id issued by the external auth service.
pub type ParticipantId = u64;

// =============================================================================
// CLUSTER A: PRODUCTION
// =============================================================================

/// A product a manufacturer produces batches of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDefinition {
    pub product_def_id: ProductDefId,
    pub manufacturer_id: ParticipantId,
    pub name: String,
    pub category: String,
    pub description: String,
    /// Default shelf life used when a production request omits the expiry date.
    pub shelf_life_days: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// A single manufacturing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionBatch {
    pub batch_id: BatchId,
    /// Human-readable code, `BATCH-YYYYMMDD-NNNN`.
    pub batch_number: String,
    pub product_def_id: ProductDefId,
    pub manufacturer_id: ParticipantId,
    pub manufacturer_name: String,
    /// Always equals the number of units created for the batch.
    pub quantity: u32,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: BatchStatus,
    pub recall_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductionBatch {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }
}

/// One physical, individually serialized product instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUnit {
    pub item_id: ItemId,
    pub batch_id: BatchId,
    /// 1-based position within the batch.
    pub sequence: u32,
    /// `{batch_number}-{sequence:04}`, unique system-wide.
    pub serial_code: String,
    /// Random nonce mixed into the auth hash. Never exposed.
    pub nonce: String,
    /// HMAC over serial and nonce. Only ever leaves the service inside a QR payload.
    pub auth_hash: String,
    pub status: UnitStatus,
    /// Current custodian (manufacturer, retailer or selling retailer).
    pub holder_id: ParticipantId,
    pub holder_name: String,
    pub holder_role: Role,
    /// Number of ledger entries; the tail pointer used to detect truncation.
    pub chain_length: u64,
    /// `current_hash` of the latest ledger entry.
    pub head_hash: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// CLUSTER B: PROVENANCE
// =============================================================================

/// One immutable lifecycle event of a unit, hash-linked to its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: EntryId,
    pub item_id: ItemId,
    /// 1-based position in the unit's chain. Authoritative ordering key.
    pub sequence: u64,
    pub action: LedgerAction,
    pub actor_id: ParticipantId,
    pub actor_name: String,
    pub actor_role: Role,
    pub location: String,
    pub previous_hash: String,
    pub current_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A set of units moving from a shipper to a retailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: ShipmentId,
    pub shipper_id: ParticipantId,
    pub shipper_name: String,
    pub retailer_id: ParticipantId,
    pub item_ids: Vec<ItemId>,
    pub destination: String,
    pub status: ShipmentStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Units recalled while in transit. They stay with the recall and are
    /// not received.
    pub recalled_item_ids: Vec<ItemId>,
}

// =============================================================================
// CLUSTER C: AUDIT
// =============================================================================

/// Audit record of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan_id: ScanId,
    /// The code as scanned (serial or batch number, without the hash).
    pub code: String,
    pub item_id: Option<ItemId>,
    pub scan_result: ScanResult,
    /// `None` for anonymous public scans.
    pub scanning_user_id: Option<ParticipantId>,
    pub channel: ScanChannel,
    pub location: Option<String>,
    pub scan_time: DateTime<Utc>,
}

/// A signal for retailers and admins that something needs attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub alert_id: AlertId,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub batch_id: Option<BatchId>,
    pub item_id: Option<ItemId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_by: Option<ParticipantId>,
    pub resolved_at: Option<DateTime<Utc>>,
}
