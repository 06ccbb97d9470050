//! # Lifecycle Requests and Views
//!
//! Views never carry a unit's nonce or auth hash. The hash only leaves the
//! service inside a rendered QR code.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{
    AlertKind, BatchId, BatchStatus, ItemId, ParticipantId, ProductDefId, ProductUnit,
    ProductionBatch, RiskAlert, Role, UnitStatus,
};

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shelf_life_days: Option<u32>,
}

/// A production run to record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRequest {
    pub product_def_id: ProductDefId,
    pub quantity: u32,
    /// Defaults to today.
    #[serde(default)]
    pub manufacturing_date: Option<NaiveDate>,
    /// Defaults to the product's shelf life after the manufacturing date.
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    /// Location recorded on the Manufactured entries.
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub item_ids: Vec<ItemId>,
    pub retailer_id: ParticipantId,
    pub destination: String,
    /// Origin recorded on the Shipped entries. Defaults to the shipper's name.
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFilter {
    #[serde(default)]
    pub resolved: Option<bool>,
    #[serde(default)]
    pub kind: Option<AlertKind>,
    #[serde(default)]
    pub batch_id: Option<BatchId>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &RiskAlert) -> bool {
        self.resolved.map_or(true, |r| alert.resolved == r)
            && self.kind.map_or(true, |k| alert.kind == k)
            && self.batch_id.map_or(true, |b| alert.batch_id == Some(b))
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// Unit count per status, keyed by the status wire names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "Manufactured")]
    pub manufactured: u32,
    #[serde(rename = "In_Transit")]
    pub in_transit: u32,
    #[serde(rename = "In_Inventory")]
    pub in_inventory: u32,
    #[serde(rename = "Sold")]
    pub sold: u32,
    #[serde(rename = "Recalled")]
    pub recalled: u32,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = UnitStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.add(status);
        }
        counts
    }

    pub fn add(&mut self, status: UnitStatus) {
        let slot = match status {
            UnitStatus::Manufactured => &mut self.manufactured,
            UnitStatus::InTransit => &mut self.in_transit,
            UnitStatus::InInventory => &mut self.in_inventory,
            UnitStatus::Sold => &mut self.sold,
            UnitStatus::Recalled => &mut self.recalled,
        };
        *slot += 1;
    }

    pub fn get(&self, status: UnitStatus) -> u32 {
        match status {
            UnitStatus::Manufactured => self.manufactured,
            UnitStatus::InTransit => self.in_transit,
            UnitStatus::InInventory => self.in_inventory,
            UnitStatus::Sold => self.sold,
            UnitStatus::Recalled => self.recalled,
        }
    }

    pub fn total(&self) -> u32 {
        self.manufactured + self.in_transit + self.in_inventory + self.sold + self.recalled
    }

    /// Every counted unit is Sold or Recalled.
    pub fn all_terminal(&self) -> bool {
        self.total() > 0 && self.sold + self.recalled == self.total()
    }
}

/// A unit without its authentication material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    pub item_id: ItemId,
    pub batch_id: BatchId,
    pub sequence: u32,
    pub serial_code: String,
    pub status: UnitStatus,
    pub holder_id: ParticipantId,
    pub holder_name: String,
    pub holder_role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&ProductUnit> for UnitView {
    fn from(unit: &ProductUnit) -> Self {
        Self {
            item_id: unit.item_id,
            batch_id: unit.batch_id,
            sequence: unit.sequence,
            serial_code: unit.serial_code.clone(),
            status: unit.status,
            holder_id: unit.holder_id,
            holder_name: unit.holder_name.clone(),
            holder_role: unit.holder_role,
            created_at: unit.created_at,
        }
    }
}

/// A batch with its server-side unit aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: BatchId,
    pub batch_number: String,
    pub product_def_id: ProductDefId,
    pub product_name: Option<String>,
    pub manufacturer_id: ParticipantId,
    pub manufacturer_name: String,
    pub quantity: u32,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub is_expired: bool,
    pub status: BatchStatus,
    pub recall_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub total_items: u32,
    pub status_counts: StatusCounts,
}

impl BatchSummary {
    pub fn new(
        batch: ProductionBatch,
        product_name: Option<String>,
        units: &[ProductUnit],
        today: NaiveDate,
    ) -> Self {
        let status_counts = StatusCounts::tally(units.iter().map(|u| u.status));
        Self {
            is_expired: batch.is_expired(today),
            batch_id: batch.batch_id,
            batch_number: batch.batch_number,
            product_def_id: batch.product_def_id,
            product_name,
            manufacturer_id: batch.manufacturer_id,
            manufacturer_name: batch.manufacturer_name,
            quantity: batch.quantity,
            manufacturing_date: batch.manufacturing_date,
            expiry_date: batch.expiry_date,
            status: batch.status,
            recall_reason: batch.recall_reason,
            created_at: batch.created_at,
            total_items: status_counts.total(),
            status_counts,
        }
    }
}

/// One printable label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrCodeEntry {
    pub serial_code: String,
    /// `data:image/png;base64,...`
    pub qr_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallOutcome {
    pub batch_id: BatchId,
    pub batch_number: String,
    pub units_recalled: u32,
    /// Units already Sold, left as they were.
    pub units_unaffected: u32,
    pub alert: RiskAlert,
}
