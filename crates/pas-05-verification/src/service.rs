//! # Verification Resolver
//!
//! ## Resolution
//!
//! | Input | Outcome |
//! |-------|---------|
//! | Known batch number | Valid, batch aggregates |
//! | Unknown batch number | Fake |
//! | Unknown serial | Fake |
//! | Serial with a wrong hash | Fake + CounterfeitSuspected alert |
//! | Sold serial, other buyer's scan older than the grace window | Duplicate + alert |
//! | Known serial otherwise | Valid, full provenance |
//! | Anything else | Fake |
//!
//! Reads are read-committed and take no row locks, so the duplicate check
//! can miss a scan committed concurrently. The scan record and any alert are
//! written in one transaction.

use crate::domain::duplicate::find_duplicate_origin;
use crate::domain::entities::{
    BatchInfo, ParticipantInfo, ProductInfo, ScanContext, ScanInfo, TimelineEntry, UnitInfo,
    VerificationReport,
};
use crate::domain::errors::VerificationError;
use crate::ports::inbound::VerificationApi;
use chrono::{DateTime, Duration, Utc};
use pas_01_serial_generator::{classify, CodeKind, SerialGeneratorApi};
use pas_02_qr_codec::{decode_payload, PAYLOAD_SEPARATOR};
use pas_03_ledger_chain::LedgerChainApi;
use pas_04_batch_lifecycle::{stage_alert, NewAlert, StatusCounts};
use shared_store::{Database, ReadAccess, Table};
use shared_types::{
    AlertKind, AlertSeverity, BatchStatus, Clock, ItemId, LedgerAction, ProductUnit,
    ProductionBatch, Role, ScanRecord, ScanResult, UnitStatus,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Longest code stored on a scan record.
const MAX_CODE_LEN: usize = 128;

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Minimum age of the earlier scan before a rescan counts as a duplicate.
    pub duplicate_grace_window: Duration,
    /// Scans returned in `scan_history`, newest first.
    pub scan_history_limit: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            duplicate_grace_window: Duration::hours(1),
            scan_history_limit: 10,
        }
    }
}

/// What a scan resolved to, before it is recorded.
struct Resolution {
    report: VerificationReport,
    item_id: Option<ItemId>,
    alert: Option<NewAlert>,
}

impl Resolution {
    fn rejected(code: &str, message: &str) -> Self {
        Self {
            report: VerificationReport::rejected(code, ScanResult::Fake, message),
            item_id: None,
            alert: None,
        }
    }
}

pub struct VerificationResolver {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    serials: Arc<dyn SerialGeneratorApi>,
    ledger: Arc<dyn LedgerChainApi>,
    config: VerificationConfig,
}

impl VerificationResolver {
    pub fn new(
        db: Arc<Database>,
        clock: Arc<dyn Clock>,
        serials: Arc<dyn SerialGeneratorApi>,
        ledger: Arc<dyn LedgerChainApi>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            db,
            clock,
            serials,
            ledger,
            config,
        }
    }

    fn batch_info(&self, batch: &ProductionBatch) -> Result<BatchInfo, VerificationError> {
        let units = self.db.units_in_batch(batch.batch_id)?;
        let status_counts = StatusCounts::tally(units.iter().map(|u| u.status));
        Ok(BatchInfo {
            batch_id: batch.batch_id,
            batch_number: batch.batch_number.clone(),
            batch_status: batch.status,
            manufacturing_date: batch.manufacturing_date,
            expiry_date: batch.expiry_date,
            is_expired: batch.is_expired(self.clock.today()),
            is_recalled: batch.status == BatchStatus::Recalled,
            recall_reason: batch.recall_reason.clone(),
            total_items: status_counts.total(),
            status_counts,
            sample_serial: units.first().map(|u| u.serial_code.clone()),
        })
    }

    /// Report skeleton with product, manufacturer and batch facts filled in.
    fn describe(
        &self,
        code: &str,
        batch: &ProductionBatch,
        scan_result: ScanResult,
        message: String,
    ) -> Result<VerificationReport, VerificationError> {
        let mut report = VerificationReport::rejected(code, scan_result, message);
        report.verified = scan_result == ScanResult::Valid;
        report.product = self.db.product(batch.product_def_id)?.map(|p| ProductInfo {
            product_def_id: p.product_def_id,
            name: p.name,
            category: p.category,
            description: p.description,
        });
        report.manufacturer = Some(ParticipantInfo {
            id: batch.manufacturer_id,
            name: batch.manufacturer_name.clone(),
            role: Role::Manufacturer,
        });
        report.batch = Some(self.batch_info(batch)?);
        Ok(report)
    }

    fn resolve_batch(&self, batch_number: &str) -> Result<Resolution, VerificationError> {
        let Some(batch) = self.db.batch_by_number(batch_number)? else {
            return Ok(Resolution::rejected(batch_number, "Unknown batch code"));
        };

        let message = if batch.status == BatchStatus::Recalled {
            "Genuine batch. This batch has been recalled."
        } else {
            "Genuine batch"
        };
        let mut report =
            self.describe(batch_number, &batch, ScanResult::Valid, message.to_string())?;
        report.is_batch = true;
        Ok(Resolution {
            report,
            item_id: None,
            alert: None,
        })
    }

    fn sold_at(&self, unit: &ProductUnit) -> Result<Option<DateTime<Utc>>, VerificationError> {
        if unit.status != UnitStatus::Sold {
            return Ok(None);
        }
        Ok(self
            .ledger
            .entries(unit.item_id)?
            .into_iter()
            .rev()
            .find(|e| e.action == LedgerAction::Sold)
            .map(|e| e.created_at))
    }

    fn resolve_unit(
        &self,
        serial_code: &str,
        presented_hash: Option<&str>,
        context: &ScanContext,
        now: DateTime<Utc>,
    ) -> Result<Resolution, VerificationError> {
        let Some(unit) = self.db.unit_by_serial(serial_code)? else {
            return Ok(Resolution::rejected(serial_code, "Unknown serial code"));
        };

        if let Some(hash) = presented_hash {
            if !self.serials.verify_auth_hash(&unit.serial_code, &unit.nonce, hash) {
                warn!(
                    serial_code,
                    item_id = unit.item_id,
                    channel = ?context.channel,
                    "QR authentication hash mismatch"
                );
                return Ok(Resolution {
                    report: VerificationReport::rejected(
                        serial_code,
                        ScanResult::Fake,
                        "Authentication failed: this code is not genuine",
                    ),
                    item_id: Some(unit.item_id),
                    alert: Some(NewAlert {
                        kind: AlertKind::CounterfeitSuspected,
                        severity: AlertSeverity::High,
                        batch_id: Some(unit.batch_id),
                        item_id: Some(unit.item_id),
                        message: format!("Forged QR code presented for {}", serial_code),
                    }),
                });
            }
        }

        let batch = self.db.batch(unit.batch_id)?;
        let history = self.db.scans_for_unit(unit.item_id)?;
        let duplicate = match self.sold_at(&unit)? {
            Some(sold_at) => find_duplicate_origin(
                &history,
                sold_at,
                context,
                now,
                self.config.duplicate_grace_window,
            )
            .map(|origin| origin.scan_time),
            None => None,
        };

        let (scan_result, message, alert) = match duplicate {
            Some(first_scanned) => {
                warn!(
                    serial_code,
                    item_id = unit.item_id,
                    first_scanned = %first_scanned,
                    "Sold unit scanned again by another party"
                );
                (
                    ScanResult::Duplicate,
                    "This code was already verified by another buyer. It may be a copy."
                        .to_string(),
                    Some(NewAlert {
                        kind: AlertKind::DuplicateScan,
                        severity: AlertSeverity::Medium,
                        batch_id: Some(unit.batch_id),
                        item_id: Some(unit.item_id),
                        message: format!(
                            "{} rescanned after sale, first verified at {}",
                            serial_code, first_scanned
                        ),
                    }),
                )
            }
            None if batch.as_ref().is_some_and(|b| b.status == BatchStatus::Recalled) => (
                ScanResult::Valid,
                "Genuine product. This batch has been recalled, do not use.".to_string(),
                None,
            ),
            None => (ScanResult::Valid, "Genuine product".to_string(), None),
        };

        let mut report = match &batch {
            Some(batch) => self.describe(serial_code, batch, scan_result, message)?,
            None => {
                let mut report = VerificationReport::rejected(serial_code, scan_result, message);
                report.verified = scan_result == ScanResult::Valid;
                report
            }
        };

        let holder = ParticipantInfo {
            id: unit.holder_id,
            name: unit.holder_name.clone(),
            role: unit.holder_role,
        };
        report.unit = Some(UnitInfo {
            serial_code: unit.serial_code.clone(),
            sequence: unit.sequence,
            status: unit.status,
            current_retailer: (unit.holder_role == Role::Retailer).then(|| holder.clone()),
            current_holder: holder,
        });
        report.blockchain_history = self
            .ledger
            .entries(unit.item_id)?
            .into_iter()
            .map(TimelineEntry::from)
            .collect();

        Ok(Resolution {
            report,
            item_id: Some(unit.item_id),
            alert,
        })
    }

    fn resolve(
        &self,
        code: &str,
        presented_hash: Option<&str>,
        context: &ScanContext,
        now: DateTime<Utc>,
    ) -> Result<Resolution, VerificationError> {
        match classify(code) {
            CodeKind::Batch { batch_number } => self.resolve_batch(&batch_number),
            CodeKind::Unit { serial_code, .. } => {
                self.resolve_unit(&serial_code, presented_hash, context, now)
            }
            CodeKind::Unknown => Ok(Resolution::rejected(code, "Unrecognized code")),
        }
    }

    /// Persist the scan (and alert) and finish the report.
    fn record(
        &self,
        resolution: Resolution,
        context: &ScanContext,
        now: DateTime<Utc>,
    ) -> Result<VerificationReport, VerificationError> {
        let Resolution {
            mut report,
            item_id,
            alert,
        } = resolution;

        let mut txn = self.db.begin();
        let scan = ScanRecord {
            scan_id: txn.next_id(Table::Scan),
            code: report.code.chars().take(MAX_CODE_LEN).collect(),
            item_id,
            scan_result: report.scan_result,
            scanning_user_id: context.user_id,
            channel: context.channel,
            location: context.location.clone(),
            scan_time: now,
        };
        txn.insert_scan(&scan)?;
        if let Some(alert) = alert {
            stage_alert(&mut txn, now, alert)?;
        }

        // Only genuine units get their scan trail back.
        if let (Some(item_id), true) = (item_id, report.unit.is_some()) {
            report.scan_history = txn
                .scans_for_unit(item_id)?
                .iter()
                .rev()
                .take(self.config.scan_history_limit)
                .map(ScanInfo::from)
                .collect();
        }
        txn.commit()?;

        report.scan_id = Some(scan.scan_id);
        Ok(report)
    }
}

/// Split `serial#hash` input. A malformed payload is reported as such.
fn split_payload(raw: &str) -> Result<(String, Option<String>), &'static str> {
    if raw.contains(PAYLOAD_SEPARATOR) {
        let payload = decode_payload(raw).map_err(|_| "Malformed QR payload")?;
        Ok((payload.serial_code, Some(payload.auth_hash)))
    } else {
        Ok((raw.to_string(), None))
    }
}

impl VerificationApi for VerificationResolver {
    fn verify(
        &self,
        code: &str,
        presented_hash: Option<&str>,
        context: &ScanContext,
    ) -> VerificationReport {
        let now = self.clock.now();
        let raw = code.trim();

        let resolution = match split_payload(raw) {
            Ok((code, hash)) => {
                let hash = hash.or_else(|| {
                    presented_hash
                        .map(str::trim)
                        .filter(|h| !h.is_empty())
                        .map(str::to_string)
                });
                self.resolve(&code, hash.as_deref(), context, now)
            }
            Err(message) => Ok(Resolution::rejected(raw, message)),
        };

        let outcome = resolution.and_then(|resolution| self.record(resolution, context, now));
        match outcome {
            Ok(report) => {
                info!(
                    code = %report.code,
                    result = %report.scan_result,
                    channel = ?context.channel,
                    user_id = ?context.user_id,
                    "Verified code"
                );
                report
            }
            Err(e) => {
                error!(code = raw, error = %e, "Verification failed");
                VerificationReport::rejected(
                    raw,
                    ScanResult::Fake,
                    "Verification is temporarily unavailable, please try again",
                )
            }
        }
    }
}
