//! # Batch Lifecycle Manager
//!
//! Drives units through the state machine and records every step on the
//! ledger inside the same transaction.
//!
//! ## Lock Order
//!
//! Rows are locked in [`RowLock`] order: daily counter, shipment, batch,
//! unit. A unit's batch id never changes, so the batch locks of a
//! multi-unit action are picked from committed reads before any lock is
//! taken.

use crate::domain::alerts::{stage_alert, NewAlert};
use crate::domain::entities::{
    AlertFilter, BatchSummary, LabelArchive, NewProduct, ProductionRequest, QrCodeEntry,
    RecallOutcome, ShipmentRequest, StatusCounts, UnitView,
};
use crate::domain::errors::LifecycleError;
use crate::domain::transitions::check_transition;
use crate::ports::inbound::BatchLifecycleApi;
use chrono::{Days, NaiveDate};
use pas_01_serial_generator::{
    batch_number, serial_code, SerialError, SerialGeneratorApi, MAX_UNIT_SEQUENCE,
};
use pas_02_qr_codec::{batch_archive, encode_payload, png_data_url, QrPayload, RenderOptions};
use pas_03_ledger_chain::LedgerChainEngine;
use shared_store::{Database, ReadAccess, RowLock, StoreError, Table, Transaction};
use shared_types::{
    Actor, ActorError, AlertId, AlertKind, AlertSeverity, BatchId, BatchStatus, Capability, Clock,
    ItemId,
    LedgerAction, LedgerEntry, ProductDefId, ProductDefinition, ProductUnit, ProductionBatch,
    RiskAlert, Role, Shipment, ShipmentId, ShipmentStatus, UnitStatus, GENESIS_HASH,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Lifecycle tuning.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Upper bound of `ProductionRequest::quantity`.
    pub max_batch_quantity: u32,
    /// Used when neither the request nor the product gives an expiry.
    pub default_shelf_life_days: u32,
    pub qr: RenderOptions,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            max_batch_quantity: MAX_UNIT_SEQUENCE,
            default_shelf_life_days: 365,
            qr: RenderOptions::default(),
        }
    }
}

pub struct BatchLifecycleManager {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    serials: Arc<dyn SerialGeneratorApi>,
    ledger: Arc<LedgerChainEngine>,
    config: LifecycleConfig,
}

/// A serial-code collision is an integrity failure, not a conflict to retry.
fn map_store(err: StoreError) -> LifecycleError {
    match err {
        StoreError::UniqueViolation {
            index: "serial_code",
            value,
        } => {
            error!(serial_code = %value, "Duplicate serial code generated");
            LifecycleError::Serial(SerialError::DuplicateSerial(value))
        }
        other => LifecycleError::Storage(other),
    }
}

impl BatchLifecycleManager {
    pub fn new(
        db: Arc<Database>,
        clock: Arc<dyn Clock>,
        serials: Arc<dyn SerialGeneratorApi>,
        ledger: Arc<LedgerChainEngine>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            db,
            clock,
            serials,
            ledger,
            config,
        }
    }

    /// Load a batch the actor may view.
    fn visible_batch(
        &self,
        actor: &Actor,
        batch_id: BatchId,
    ) -> Result<ProductionBatch, LifecycleError> {
        actor.require(Capability::ViewBatches)?;
        let batch = self
            .db
            .batch(batch_id)?
            .ok_or(LifecycleError::BatchNotFound(batch_id))?;
        actor.require_owner(
            batch.manufacturer_id,
            format!("batch {}", batch.batch_number),
        )?;
        Ok(batch)
    }

    fn summary_of<R: ReadAccess>(
        &self,
        reader: &R,
        batch: ProductionBatch,
    ) -> Result<BatchSummary, LifecycleError> {
        let product_name = reader.product(batch.product_def_id)?.map(|p| p.name);
        let units = reader.units_in_batch(batch.batch_id)?;
        Ok(BatchSummary::new(batch, product_name, &units, self.clock.today()))
    }

    fn authorize_unit(
        &self,
        txn: &Transaction<'_>,
        actor: &Actor,
        unit: &ProductUnit,
        action: LedgerAction,
    ) -> Result<(), LifecycleError> {
        match action {
            LedgerAction::Shipped | LedgerAction::Stored | LedgerAction::Sold => {
                actor.require_owner(unit.holder_id, format!("unit {}", unit.serial_code))?;
            }
            LedgerAction::Recalled => {
                let batch = txn
                    .batch(unit.batch_id)?
                    .ok_or(LifecycleError::BatchNotFound(unit.batch_id))?;
                actor.require_owner(
                    batch.manufacturer_id,
                    format!("batch {}", batch.batch_number),
                )?;
            }
            LedgerAction::Manufactured | LedgerAction::Received => {}
        }
        Ok(())
    }

    /// Validate and append `action` for every unit inside `txn`.
    fn apply_in(
        &self,
        txn: &mut Transaction<'_>,
        actor: &Actor,
        item_ids: &[ItemId],
        action: LedgerAction,
        location: &str,
    ) -> Result<Vec<LedgerEntry>, LifecycleError> {
        actor.require(action.required_capability())?;

        let ids: BTreeSet<ItemId> = item_ids.iter().copied().collect();
        if ids.is_empty() {
            return Err(LifecycleError::Validation("at least one unit is required".into()));
        }

        let mut batch_ids = BTreeSet::new();
        for id in &ids {
            let unit = txn.unit(*id)?.ok_or(LifecycleError::UnitNotFound(*id))?;
            batch_ids.insert(unit.batch_id);
        }
        txn.lock_all(
            batch_ids
                .iter()
                .map(|b| RowLock::Batch(*b))
                .chain(ids.iter().map(|i| RowLock::Unit(*i))),
        )?;

        let mut entries = Vec::with_capacity(ids.len());
        for id in &ids {
            let unit = txn.unit(*id)?.ok_or(LifecycleError::UnitNotFound(*id))?;
            check_transition(unit.item_id, unit.status, action)?;
            self.authorize_unit(txn, actor, &unit, action)?;
            entries.push(self.ledger.append_in(txn, actor, *id, action, location)?);
        }

        if action.resulting_status().is_terminal() {
            for batch_id in batch_ids {
                self.complete_if_done(txn, batch_id)?;
            }
        }
        Ok(entries)
    }

    /// Mark an active batch Completed once every unit is Sold or Recalled.
    fn complete_if_done(
        &self,
        txn: &mut Transaction<'_>,
        batch_id: BatchId,
    ) -> Result<(), LifecycleError> {
        let Some(mut batch) = txn.batch(batch_id)? else {
            return Ok(());
        };
        if batch.status != BatchStatus::Active {
            return Ok(());
        }
        let counts = StatusCounts::tally(txn.units_in_batch(batch_id)?.iter().map(|u| u.status));
        if counts.all_terminal() {
            batch.status = BatchStatus::Completed;
            txn.update_batch(&batch)?;
            info!(batch_id, batch_number = %batch.batch_number, "Batch completed");
        }
        Ok(())
    }

    fn run_action(
        &self,
        actor: &Actor,
        item_ids: &[ItemId],
        action: LedgerAction,
        location: &str,
    ) -> Result<Vec<LedgerEntry>, LifecycleError> {
        let mut txn = self.db.begin();
        let entries = match self.apply_in(&mut txn, actor, item_ids, action, location) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(actor_id = actor.id, action = %action, error = %e, "Rejected unit action");
                return Err(e);
            }
        };
        txn.commit()?;
        info!(
            actor_id = actor.id,
            action = %action,
            units = entries.len(),
            "Recorded unit action"
        );
        Ok(entries)
    }

    fn validate_production(
        &self,
        request: &ProductionRequest,
        product: &ProductDefinition,
    ) -> Result<(NaiveDate, NaiveDate), LifecycleError> {
        if request.quantity == 0 {
            return Err(LifecycleError::Validation("quantity must be at least 1".into()));
        }
        let max = self.config.max_batch_quantity.min(MAX_UNIT_SEQUENCE);
        if request.quantity > max {
            return Err(LifecycleError::Validation(format!(
                "quantity {} exceeds the maximum of {}",
                request.quantity, max
            )));
        }

        let manufacturing_date = request.manufacturing_date.unwrap_or_else(|| self.clock.today());
        let expiry_date = match request.expiry_date {
            Some(date) => date,
            None => {
                let days = product.shelf_life_days.unwrap_or(self.config.default_shelf_life_days);
                manufacturing_date
                    .checked_add_days(Days::new(u64::from(days)))
                    .ok_or_else(|| LifecycleError::Validation("expiry date out of range".into()))?
            }
        };
        if expiry_date <= manufacturing_date {
            return Err(LifecycleError::Validation(
                "expiry_date must be after manufacturing_date".into(),
            ));
        }
        Ok((manufacturing_date, expiry_date))
    }
}

impl BatchLifecycleApi for BatchLifecycleManager {
    fn register_product(
        &self,
        actor: &Actor,
        product: NewProduct,
    ) -> Result<ProductDefinition, LifecycleError> {
        actor.require(Capability::RegisterProduct)?;
        let name = product.name.trim();
        if name.is_empty() {
            return Err(LifecycleError::Validation("product name is required".into()));
        }
        if product.shelf_life_days == Some(0) {
            return Err(LifecycleError::Validation("shelf_life_days must be positive".into()));
        }

        let mut txn = self.db.begin();
        let definition = ProductDefinition {
            product_def_id: txn.next_id(Table::Product),
            manufacturer_id: actor.id,
            name: name.to_string(),
            category: product.category.trim().to_string(),
            description: product.description,
            shelf_life_days: product.shelf_life_days,
            created_at: self.clock.now(),
        };
        txn.insert_product(&definition)?;
        txn.commit()?;

        info!(
            product_def_id = definition.product_def_id,
            manufacturer_id = actor.id,
            name = %definition.name,
            "Registered product"
        );
        Ok(definition)
    }

    fn product(&self, product_def_id: ProductDefId) -> Result<ProductDefinition, LifecycleError> {
        self.db
            .product(product_def_id)?
            .ok_or(LifecycleError::ProductNotFound(product_def_id))
    }

    fn create_batch(
        &self,
        actor: &Actor,
        request: ProductionRequest,
    ) -> Result<BatchSummary, LifecycleError> {
        actor.require(Capability::CreateBatch)?;
        let product = self.product(request.product_def_id)?;
        actor.require_owner(product.manufacturer_id, format!("product {}", product.name))?;
        let (manufacturing_date, expiry_date) = self.validate_production(&request, &product)?;
        let location = request.location.unwrap_or_else(|| actor.name.clone());
        let now = self.clock.now();

        let mut txn = self.db.begin();
        let counter = txn.next_batch_counter(manufacturing_date)?;
        let batch = ProductionBatch {
            batch_id: txn.next_id(Table::Batch),
            batch_number: batch_number(manufacturing_date, counter)?,
            product_def_id: product.product_def_id,
            manufacturer_id: actor.id,
            manufacturer_name: actor.name.clone(),
            quantity: request.quantity,
            manufacturing_date,
            expiry_date,
            status: BatchStatus::Active,
            recall_reason: None,
            created_at: now,
        };
        txn.insert_batch(&batch).map_err(map_store)?;

        for sequence in 1..=request.quantity {
            let credentials = self
                .serials
                .issue(&serial_code(&batch.batch_number, sequence)?)?;
            let unit = ProductUnit {
                item_id: txn.next_id(Table::Unit),
                batch_id: batch.batch_id,
                sequence,
                serial_code: credentials.serial_code,
                nonce: credentials.nonce,
                auth_hash: credentials.auth_hash,
                status: UnitStatus::Manufactured,
                holder_id: actor.id,
                holder_name: actor.name.clone(),
                holder_role: actor.role,
                chain_length: 0,
                head_hash: GENESIS_HASH.to_string(),
                created_at: now,
            };
            txn.insert_unit(&unit).map_err(map_store)?;
            self.ledger
                .append_in(&mut txn, actor, unit.item_id, LedgerAction::Manufactured, &location)?;
        }

        let summary = self.summary_of(&txn, batch)?;
        txn.commit().map_err(map_store)?;

        info!(
            batch_id = summary.batch_id,
            batch_number = %summary.batch_number,
            quantity = summary.quantity,
            manufacturer_id = actor.id,
            "Created production batch"
        );
        Ok(summary)
    }

    fn advance(
        &self,
        actor: &Actor,
        item_id: ItemId,
        action: LedgerAction,
        location: &str,
    ) -> Result<LedgerEntry, LifecycleError> {
        self.run_action(actor, &[item_id], action, location)?
            .pop()
            .ok_or(LifecycleError::UnitNotFound(item_id))
    }

    fn advance_many(
        &self,
        actor: &Actor,
        item_ids: &[ItemId],
        action: LedgerAction,
        location: &str,
    ) -> Result<Vec<LedgerEntry>, LifecycleError> {
        self.run_action(actor, item_ids, action, location)
    }

    fn create_shipment(
        &self,
        actor: &Actor,
        request: ShipmentRequest,
    ) -> Result<Shipment, LifecycleError> {
        actor.require(Capability::ShipUnits)?;
        let destination = request.destination.trim();
        if destination.is_empty() {
            return Err(LifecycleError::Validation("destination is required".into()));
        }
        if request.retailer_id == actor.id {
            return Err(LifecycleError::Validation("cannot ship units to yourself".into()));
        }
        let location = request.location.unwrap_or_else(|| actor.name.clone());

        let mut txn = self.db.begin();
        let entries = self.apply_in(
            &mut txn,
            actor,
            &request.item_ids,
            LedgerAction::Shipped,
            &location,
        )?;
        let shipment = Shipment {
            shipment_id: txn.next_id(Table::Shipment),
            shipper_id: actor.id,
            shipper_name: actor.name.clone(),
            retailer_id: request.retailer_id,
            item_ids: entries.iter().map(|e| e.item_id).collect(),
            destination: destination.to_string(),
            status: ShipmentStatus::Pending,
            created_at: self.clock.now(),
            delivered_at: None,
            recalled_item_ids: Vec::new(),
        };
        txn.put_shipment(&shipment)?;
        txn.commit()?;

        info!(
            shipment_id = shipment.shipment_id,
            shipper_id = actor.id,
            retailer_id = shipment.retailer_id,
            units = shipment.item_ids.len(),
            "Created shipment"
        );
        Ok(shipment)
    }

    fn confirm_shipment(
        &self,
        actor: &Actor,
        shipment_id: ShipmentId,
        location: Option<String>,
    ) -> Result<Shipment, LifecycleError> {
        actor.require(Capability::ReceiveShipment)?;

        let mut txn = self.db.begin();
        txn.lock(RowLock::Shipment(shipment_id))?;
        let mut shipment = txn
            .shipment(shipment_id)?
            .ok_or(LifecycleError::ShipmentNotFound(shipment_id))?;
        if shipment.retailer_id != actor.id {
            return Err(ActorError::NotOwner {
                actor_id: actor.id,
                resource: format!("shipment {}", shipment_id),
            }
            .into());
        }
        if shipment.status == ShipmentStatus::Delivered {
            return Err(LifecycleError::ShipmentAlreadyDelivered(shipment_id));
        }

        // Units recalled in transit are withheld, the rest are received.
        let mut units = Vec::with_capacity(shipment.item_ids.len());
        for id in &shipment.item_ids {
            units.push(txn.unit(*id)?.ok_or(LifecycleError::UnitNotFound(*id))?);
        }
        txn.lock_all(
            units
                .iter()
                .map(|u| RowLock::Batch(u.batch_id))
                .chain(units.iter().map(|u| RowLock::Unit(u.item_id))),
        )?;
        let mut received = Vec::with_capacity(units.len());
        let mut recalled = Vec::new();
        for id in &shipment.item_ids {
            let unit = txn.unit(*id)?.ok_or(LifecycleError::UnitNotFound(*id))?;
            if unit.status == UnitStatus::Recalled {
                recalled.push(*id);
            } else {
                received.push(*id);
            }
        }

        let location = location.unwrap_or_else(|| actor.name.clone());
        if !received.is_empty() {
            self.apply_in(&mut txn, actor, &received, LedgerAction::Received, &location)?;
        }
        if !recalled.is_empty() {
            warn!(shipment_id, withheld = recalled.len(), "Shipment contains recalled units");
        }
        shipment.status = ShipmentStatus::Delivered;
        shipment.delivered_at = Some(self.clock.now());
        shipment.recalled_item_ids = recalled;
        txn.put_shipment(&shipment)?;
        txn.commit()?;

        info!(shipment_id, retailer_id = actor.id, units = received.len(), "Shipment delivered");
        Ok(shipment)
    }

    fn store_units(
        &self,
        actor: &Actor,
        item_ids: &[ItemId],
        location: &str,
    ) -> Result<Vec<LedgerEntry>, LifecycleError> {
        self.run_action(actor, item_ids, LedgerAction::Stored, location)
    }

    fn record_sale(
        &self,
        actor: &Actor,
        item_ids: &[ItemId],
        location: &str,
    ) -> Result<Vec<LedgerEntry>, LifecycleError> {
        self.run_action(actor, item_ids, LedgerAction::Sold, location)
    }

    fn recall(
        &self,
        actor: &Actor,
        batch_id: BatchId,
        reason: &str,
    ) -> Result<RecallOutcome, LifecycleError> {
        actor.require(Capability::RecallBatch)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LifecycleError::Validation("recall reason is required".into()));
        }

        let mut txn = self.db.begin();
        txn.lock(RowLock::Batch(batch_id))?;
        let mut batch = txn
            .batch(batch_id)?
            .ok_or(LifecycleError::BatchNotFound(batch_id))?;
        actor.require_owner(
            batch.manufacturer_id,
            format!("batch {}", batch.batch_number),
        )?;
        if batch.status == BatchStatus::Recalled {
            return Err(LifecycleError::AlreadyRecalled(batch_id));
        }

        let item_ids = txn.unit_ids_in_batch(batch_id)?;
        txn.lock_all(item_ids.iter().map(|id| RowLock::Unit(*id)))?;

        let (mut units_recalled, mut units_unaffected) = (0u32, 0u32);
        for item_id in item_ids {
            let unit = txn.unit(item_id)?.ok_or(LifecycleError::UnitNotFound(item_id))?;
            if unit.status.is_terminal() {
                units_unaffected += 1;
                continue;
            }
            self.ledger
                .append_in(&mut txn, actor, item_id, LedgerAction::Recalled, &actor.name)?;
            units_recalled += 1;
        }

        batch.status = BatchStatus::Recalled;
        batch.recall_reason = Some(reason.to_string());
        txn.update_batch(&batch)?;

        let alert = stage_alert(
            &mut txn,
            self.clock.now(),
            NewAlert {
                kind: AlertKind::ProductRecall,
                severity: AlertSeverity::Critical,
                batch_id: Some(batch_id),
                item_id: None,
                message: format!("Batch {} recalled: {}", batch.batch_number, reason),
            },
        )?;
        txn.commit()?;

        warn!(
            batch_id,
            batch_number = %batch.batch_number,
            units_recalled,
            units_unaffected,
            reason,
            "Recalled batch"
        );
        Ok(RecallOutcome {
            batch_id,
            batch_number: batch.batch_number,
            units_recalled,
            units_unaffected,
            alert,
        })
    }

    fn batch_summary(
        &self,
        actor: &Actor,
        batch_id: BatchId,
    ) -> Result<BatchSummary, LifecycleError> {
        let batch = self.visible_batch(actor, batch_id)?;
        self.summary_of(self.db.as_ref(), batch)
    }

    fn list_batches(&self, actor: &Actor) -> Result<Vec<BatchSummary>, LifecycleError> {
        actor.require(Capability::ViewBatches)?;
        let batches = if actor.role == Role::Admin {
            self.db.batches()?
        } else {
            self.db.batches_by_manufacturer(actor.id)?
        };
        batches
            .into_iter()
            .map(|batch| self.summary_of(self.db.as_ref(), batch))
            .collect()
    }

    fn units_in_batch(
        &self,
        actor: &Actor,
        batch_id: BatchId,
    ) -> Result<Vec<UnitView>, LifecycleError> {
        self.visible_batch(actor, batch_id)?;
        Ok(self
            .db
            .units_in_batch(batch_id)?
            .iter()
            .map(UnitView::from)
            .collect())
    }

    fn qr_codes(
        &self,
        actor: &Actor,
        batch_id: BatchId,
    ) -> Result<Vec<QrCodeEntry>, LifecycleError> {
        self.visible_batch(actor, batch_id)?;
        self.db
            .units_in_batch(batch_id)?
            .into_iter()
            .map(|unit| {
                let payload = encode_payload(&unit.serial_code, &unit.auth_hash);
                Ok(QrCodeEntry {
                    qr_code: png_data_url(&payload, self.config.qr)?,
                    serial_code: unit.serial_code,
                })
            })
            .collect()
    }

    fn qr_archive(&self, actor: &Actor, batch_id: BatchId) -> Result<LabelArchive, LifecycleError> {
        let batch = self.visible_batch(actor, batch_id)?;
        let payloads: Vec<QrPayload> = self
            .db
            .units_in_batch(batch_id)?
            .into_iter()
            .map(|unit| QrPayload::new(unit.serial_code, unit.auth_hash))
            .collect();
        let bytes = batch_archive(&payloads, self.config.qr)?;
        info!(batch_id, labels = payloads.len(), "Exported QR label archive");
        Ok(LabelArchive {
            file_name: format!("{}-qr-codes.zip", batch.batch_number),
            bytes,
        })
    }

    fn risk_alerts(
        &self,
        actor: &Actor,
        filter: &AlertFilter,
    ) -> Result<Vec<RiskAlert>, LifecycleError> {
        actor.require(Capability::ManageAlerts)?;
        let mut alerts: Vec<RiskAlert> = self
            .db
            .alerts()?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        alerts.reverse();
        Ok(alerts)
    }

    fn resolve_alert(&self, actor: &Actor, alert_id: AlertId) -> Result<RiskAlert, LifecycleError> {
        actor.require(Capability::ManageAlerts)?;

        let mut txn = self.db.begin();
        txn.lock(RowLock::Alert(alert_id))?;
        let mut alert = txn
            .alert(alert_id)?
            .ok_or(LifecycleError::AlertNotFound(alert_id))?;
        if alert.resolved {
            return Err(LifecycleError::AlertAlreadyResolved(alert_id));
        }
        alert.resolved = true;
        alert.resolved_by = Some(actor.id);
        alert.resolved_at = Some(self.clock.now());
        txn.put_alert(&alert)?;
        txn.commit()?;

        info!(alert_id, resolved_by = actor.id, "Resolved risk alert");
        Ok(alert)
    }
}
