//! # Typed Table Access
//!
//! Record encoding (bincode) and the typed reads and writes the services use.
//! Reads are available on both [`Database`] (read committed) and
//! [`Transaction`] (read your writes); writes only on `Transaction`.

use crate::database::Database;
use crate::errors::StoreError;
use crate::keys::{trailing_id, KeyPrefix, RowLock};
use crate::ports::outbound::PrefixScan;
use crate::transaction::Transaction;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{
    BatchId, ItemId, LedgerEntry, ProductDefinition, ProductUnit, ProductionBatch, RiskAlert,
    ScanRecord, Shipment,
};

fn encode<T: Serialize>(table: &'static str, record: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(record).map_err(|e| StoreError::Serialization {
        table,
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(table: &'static str, bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization {
        table,
        message: e.to_string(),
    })
}

fn decode_id(table: &'static str, bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| StoreError::Serialization {
        table,
        message: format!("expected 8-byte id, got {} bytes", bytes.len()),
    })?;
    Ok(u64::from_be_bytes(arr))
}

/// Read access shared by `Database` and `Transaction`.
pub trait ReadAccess {
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Entries under `prefix`, ordered by key.
    fn scan_raw(&self, prefix: &[u8]) -> Result<PrefixScan, StoreError>;

    fn product(&self, product_def_id: u64) -> Result<Option<ProductDefinition>, StoreError> {
        self.get_raw(&KeyPrefix::product_key(product_def_id))?
            .map(|b| decode("product", &b))
            .transpose()
    }

    fn batch(&self, batch_id: BatchId) -> Result<Option<ProductionBatch>, StoreError> {
        self.get_raw(&KeyPrefix::batch_key(batch_id))?
            .map(|b| decode("batch", &b))
            .transpose()
    }

    fn batch_by_number(&self, batch_number: &str) -> Result<Option<ProductionBatch>, StoreError> {
        match self.get_raw(&KeyPrefix::batch_number_index_key(batch_number))? {
            Some(id) => self.batch(decode_id("batch_number_index", &id)?),
            None => Ok(None),
        }
    }

    /// Every batch, by id.
    fn batches(&self) -> Result<Vec<ProductionBatch>, StoreError> {
        self.scan_raw(KeyPrefix::Batch.as_bytes())?
            .into_iter()
            .map(|(_, v)| decode("batch", &v))
            .collect()
    }

    fn batches_by_manufacturer(
        &self,
        manufacturer_id: u64,
    ) -> Result<Vec<ProductionBatch>, StoreError> {
        let mut batches = Vec::new();
        for (key, _) in self.scan_raw(&KeyPrefix::manufacturer_batch_prefix(manufacturer_id))? {
            if let Some(batch) = trailing_id(&key).map(|id| self.batch(id)).transpose()?.flatten() {
                batches.push(batch);
            }
        }
        Ok(batches)
    }

    fn unit(&self, item_id: ItemId) -> Result<Option<ProductUnit>, StoreError> {
        self.get_raw(&KeyPrefix::unit_key(item_id))?
            .map(|b| decode("unit", &b))
            .transpose()
    }

    fn unit_by_serial(&self, serial_code: &str) -> Result<Option<ProductUnit>, StoreError> {
        match self.get_raw(&KeyPrefix::serial_index_key(serial_code))? {
            Some(id) => self.unit(decode_id("serial_index", &id)?),
            None => Ok(None),
        }
    }

    fn unit_ids_in_batch(&self, batch_id: BatchId) -> Result<Vec<ItemId>, StoreError> {
        Ok(self
            .scan_raw(&KeyPrefix::batch_unit_prefix(batch_id))?
            .into_iter()
            .filter_map(|(k, _)| trailing_id(&k))
            .collect())
    }

    /// Units of a batch, by item id (which is also sequence order).
    fn units_in_batch(&self, batch_id: BatchId) -> Result<Vec<ProductUnit>, StoreError> {
        let mut units = Vec::new();
        for item_id in self.unit_ids_in_batch(batch_id)? {
            if let Some(unit) = self.unit(item_id)? {
                units.push(unit);
            }
        }
        Ok(units)
    }

    /// A unit's ledger, by sequence.
    fn ledger_entries(&self, item_id: ItemId) -> Result<Vec<LedgerEntry>, StoreError> {
        self.scan_raw(&KeyPrefix::ledger_prefix(item_id))?
            .into_iter()
            .map(|(_, v)| decode("ledger", &v))
            .collect()
    }

    fn last_ledger_entry(&self, item_id: ItemId) -> Result<Option<LedgerEntry>, StoreError> {
        self.scan_raw(&KeyPrefix::ledger_prefix(item_id))?
            .pop()
            .map(|(_, v)| decode("ledger", &v))
            .transpose()
    }

    fn scan(&self, scan_id: u64) -> Result<Option<ScanRecord>, StoreError> {
        self.get_raw(&KeyPrefix::scan_key(scan_id))?
            .map(|b| decode("scan", &b))
            .transpose()
    }

    /// Scans that resolved to `item_id`, oldest first.
    fn scans_for_unit(&self, item_id: ItemId) -> Result<Vec<ScanRecord>, StoreError> {
        let mut scans = Vec::new();
        for (key, _) in self.scan_raw(&KeyPrefix::unit_scan_prefix(item_id))? {
            if let Some(scan) = trailing_id(&key).map(|id| self.scan(id)).transpose()?.flatten() {
                scans.push(scan);
            }
        }
        Ok(scans)
    }

    fn alert(&self, alert_id: u64) -> Result<Option<RiskAlert>, StoreError> {
        self.get_raw(&KeyPrefix::alert_key(alert_id))?
            .map(|b| decode("alert", &b))
            .transpose()
    }

    fn alerts(&self) -> Result<Vec<RiskAlert>, StoreError> {
        self.scan_raw(KeyPrefix::Alert.as_bytes())?
            .into_iter()
            .map(|(_, v)| decode("alert", &v))
            .collect()
    }

    fn shipment(&self, shipment_id: u64) -> Result<Option<Shipment>, StoreError> {
        self.get_raw(&KeyPrefix::shipment_key(shipment_id))?
            .map(|b| decode("shipment", &b))
            .transpose()
    }

    /// Last batch counter issued on `date` (0 if none).
    fn batch_counter(&self, date: NaiveDate) -> Result<u32, StoreError> {
        match self.get_raw(&KeyPrefix::daily_counter_key(date))? {
            Some(bytes) => {
                let arr: [u8; 4] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| StoreError::Serialization {
                            table: "counter",
                            message: format!("expected 4 bytes, got {}", bytes.len()),
                        })?;
                Ok(u32::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }
}

impl ReadAccess for Database {
    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.get_committed(key)?)
    }

    fn scan_raw(&self, prefix: &[u8]) -> Result<PrefixScan, StoreError> {
        Ok(self.scan_committed(prefix)?)
    }
}

impl Transaction<'_> {
    pub fn insert_product(&mut self, product: &ProductDefinition) -> Result<(), StoreError> {
        let value = encode("product", product)?;
        self.insert_unique(
            KeyPrefix::product_key(product.product_def_id),
            value,
            "product_id",
            product.product_def_id.to_string(),
        )
    }

    /// Insert a new batch and its batch-number and manufacturer indexes.
    pub fn insert_batch(&mut self, batch: &ProductionBatch) -> Result<(), StoreError> {
        self.insert_unique(
            KeyPrefix::batch_number_index_key(&batch.batch_number),
            batch.batch_id.to_be_bytes().to_vec(),
            "batch_number",
            batch.batch_number.clone(),
        )?;
        self.put_raw(
            KeyPrefix::manufacturer_batch_key(batch.manufacturer_id, batch.batch_id),
            Vec::new(),
        );
        let value = encode("batch", batch)?;
        self.insert_unique(
            KeyPrefix::batch_key(batch.batch_id),
            value,
            "batch_id",
            batch.batch_id.to_string(),
        )
    }

    pub fn update_batch(&mut self, batch: &ProductionBatch) -> Result<(), StoreError> {
        let value = encode("batch", batch)?;
        self.put_raw(KeyPrefix::batch_key(batch.batch_id), value);
        Ok(())
    }

    /// Insert a new unit. The serial code is a unique index.
    pub fn insert_unit(&mut self, unit: &ProductUnit) -> Result<(), StoreError> {
        self.insert_unique(
            KeyPrefix::serial_index_key(&unit.serial_code),
            unit.item_id.to_be_bytes().to_vec(),
            "serial_code",
            unit.serial_code.clone(),
        )?;
        self.put_raw(KeyPrefix::batch_unit_key(unit.batch_id, unit.item_id), Vec::new());
        let value = encode("unit", unit)?;
        self.insert_unique(
            KeyPrefix::unit_key(unit.item_id),
            value,
            "item_id",
            unit.item_id.to_string(),
        )
    }

    pub fn update_unit(&mut self, unit: &ProductUnit) -> Result<(), StoreError> {
        let value = encode("unit", unit)?;
        self.put_raw(KeyPrefix::unit_key(unit.item_id), value);
        Ok(())
    }

    /// Stage a ledger entry. `(item_id, sequence)` is create-only, so two
    /// writers can never both commit the same position of a chain.
    pub fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), StoreError> {
        let value = encode("ledger", entry)?;
        self.insert_unique(
            KeyPrefix::ledger_key(entry.item_id, entry.sequence),
            value,
            "ledger_position",
            format!("item {} sequence {}", entry.item_id, entry.sequence),
        )
    }

    /// Insert a scan record, indexed by unit when it resolved to one.
    pub fn insert_scan(&mut self, scan: &ScanRecord) -> Result<(), StoreError> {
        if let Some(item_id) = scan.item_id {
            self.put_raw(KeyPrefix::unit_scan_key(item_id, scan.scan_id), Vec::new());
        }
        let value = encode("scan", scan)?;
        self.put_raw(KeyPrefix::scan_key(scan.scan_id), value);
        Ok(())
    }

    pub fn put_alert(&mut self, alert: &RiskAlert) -> Result<(), StoreError> {
        let value = encode("alert", alert)?;
        self.put_raw(KeyPrefix::alert_key(alert.alert_id), value);
        Ok(())
    }

    pub fn put_shipment(&mut self, shipment: &Shipment) -> Result<(), StoreError> {
        let value = encode("shipment", shipment)?;
        self.put_raw(KeyPrefix::shipment_key(shipment.shipment_id), value);
        Ok(())
    }

    /// Lock the day's counter row and return the next counter value.
    pub fn next_batch_counter(&mut self, date: NaiveDate) -> Result<u32, StoreError> {
        self.lock(RowLock::DailyCounter(date))?;
        let next = self.batch_counter(date)? + 1;
        self.put_raw(KeyPrefix::daily_counter_key(date), next.to_be_bytes().to_vec());
        Ok(next)
    }

    /// Delete a batch with its units, their ledgers and every index row.
    /// Scan records and alerts are kept for audit.
    pub fn delete_batch_cascade(&mut self, batch_id: BatchId) -> Result<bool, StoreError> {
        let Some(batch) = self.batch(batch_id)? else {
            return Ok(false);
        };
        self.lock(RowLock::Batch(batch_id))?;

        let item_ids = self.unit_ids_in_batch(batch_id)?;
        self.lock_all(item_ids.iter().map(|id| RowLock::Unit(*id)))?;

        for item_id in item_ids {
            if let Some(unit) = self.unit(item_id)? {
                self.delete_raw(KeyPrefix::serial_index_key(&unit.serial_code));
            }
            for (key, _) in self.scan_raw(&KeyPrefix::ledger_prefix(item_id))? {
                self.delete_raw(key);
            }
            for (key, _) in self.scan_raw(&KeyPrefix::unit_scan_prefix(item_id))? {
                self.delete_raw(key);
            }
            self.delete_raw(KeyPrefix::batch_unit_key(batch_id, item_id));
            self.delete_raw(KeyPrefix::unit_key(item_id));
        }

        self.delete_raw(KeyPrefix::batch_number_index_key(&batch.batch_number));
        self.delete_raw(KeyPrefix::manufacturer_batch_key(batch.manufacturer_id, batch_id));
        self.delete_raw(KeyPrefix::batch_key(batch_id));
        Ok(true)
    }
}
