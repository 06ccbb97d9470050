//! # Scan Context and Reports

use chrono::{DateTime, NaiveDate, Utc};
use pas_04_batch_lifecycle::StatusCounts;
use serde::{Deserialize, Serialize};
use shared_types::{
    Actor, BatchId, BatchStatus, LedgerAction, LedgerEntry, ParticipantId, ProductDefId, Role,
    ScanChannel, ScanId, ScanRecord, ScanResult, UnitStatus,
};

/// Who scanned, through which entry point, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanContext {
    pub user_id: Option<ParticipantId>,
    pub channel: ScanChannel,
    pub location: Option<String>,
}

impl ScanContext {
    /// A public scan with no signed-in user.
    pub fn anonymous(location: Option<String>) -> Self {
        Self {
            user_id: None,
            channel: ScanChannel::Public,
            location,
        }
    }

    pub fn for_actor(actor: &Actor, location: Option<String>) -> Self {
        Self {
            user_id: Some(actor.id),
            channel: ScanChannel::from(actor.role),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product_def_id: ProductDefId,
    pub name: String,
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub name: String,
    pub role: Role,
}

/// Batch facts, reported for batch codes and unit codes alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub batch_id: BatchId,
    pub batch_number: String,
    pub batch_status: BatchStatus,
    pub manufacturing_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub is_expired: bool,
    pub is_recalled: bool,
    pub recall_reason: Option<String>,
    pub total_items: u32,
    pub status_counts: StatusCounts,
    /// First serial of the batch, for convenience.
    pub sample_serial: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub serial_code: String,
    pub sequence: u32,
    pub status: UnitStatus,
    pub current_holder: ParticipantInfo,
    /// Set while a retailer holds the unit, and after a retailer sold it.
    pub current_retailer: Option<ParticipantInfo>,
}

/// One human-readable ledger step. Hashes are shown, not re-verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub sequence: u64,
    pub action: LedgerAction,
    pub actor_name: String,
    pub actor_role: Role,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: String,
    pub current_hash: String,
}

impl From<LedgerEntry> for TimelineEntry {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            sequence: entry.sequence,
            action: entry.action,
            actor_name: entry.actor_name,
            actor_role: entry.actor_role,
            location: entry.location,
            timestamp: entry.created_at,
            previous_hash: entry.previous_hash,
            current_hash: entry.current_hash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanInfo {
    pub scan_time: DateTime<Utc>,
    pub scan_result: ScanResult,
    pub channel: ScanChannel,
    pub location: Option<String>,
}

impl From<&ScanRecord> for ScanInfo {
    fn from(scan: &ScanRecord) -> Self {
        Self {
            scan_time: scan.scan_time,
            scan_result: scan.scan_result,
            channel: scan.channel,
            location: scan.location.clone(),
        }
    }
}

/// The answer to one scan. Always produced, whatever the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verified: bool,
    pub is_batch: bool,
    pub scan_result: ScanResult,
    /// The code as resolved (without any hash).
    pub code: String,
    pub message: String,
    pub scan_id: Option<ScanId>,
    pub product: Option<ProductInfo>,
    pub manufacturer: Option<ParticipantInfo>,
    #[serde(flatten)]
    pub batch: Option<BatchInfo>,
    pub unit: Option<UnitInfo>,
    #[serde(default)]
    pub blockchain_history: Vec<TimelineEntry>,
    #[serde(default)]
    pub scan_history: Vec<ScanInfo>,
}

impl VerificationReport {
    pub(crate) fn rejected(
        code: impl Into<String>,
        scan_result: ScanResult,
        message: impl Into<String>,
    ) -> Self {
        Self {
            verified: false,
            is_batch: false,
            scan_result,
            code: code.into(),
            message: message.into(),
            scan_id: None,
            product: None,
            manufacturer: None,
            batch: None,
            unit: None,
            blockchain_history: Vec::new(),
            scan_history: Vec::new(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.batch.as_ref().is_some_and(|b| b.is_expired)
    }

    pub fn is_recalled(&self) -> bool {
        self.batch.as_ref().is_some_and(|b| b.is_recalled)
    }
}
