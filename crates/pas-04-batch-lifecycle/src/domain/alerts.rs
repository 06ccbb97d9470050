//! # Risk Alerts
//!
//! Alerts are staged inside the transaction of the event that raised them,
//! so a rolled-back recall or scan leaves no orphan alert.

use chrono::{DateTime, Utc};
use shared_store::{StoreError, Table, Transaction};
use shared_types::{AlertKind, AlertSeverity, BatchId, ItemId, RiskAlert};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub batch_id: Option<BatchId>,
    pub item_id: Option<ItemId>,
    pub message: String,
}

pub fn stage_alert(
    txn: &mut Transaction<'_>,
    now: DateTime<Utc>,
    new: NewAlert,
) -> Result<RiskAlert, StoreError> {
    let alert = RiskAlert {
        alert_id: txn.next_id(Table::Alert),
        kind: new.kind,
        severity: new.severity,
        batch_id: new.batch_id,
        item_id: new.item_id,
        message: new.message,
        created_at: now,
        resolved: false,
        resolved_by: None,
        resolved_at: None,
    };
    txn.put_alert(&alert)?;
    warn!(
        alert_id = alert.alert_id,
        kind = ?alert.kind,
        severity = ?alert.severity,
        batch_id = ?alert.batch_id,
        item_id = ?alert.item_id,
        "Raised risk alert"
    );
    Ok(alert)
}
