//! # Key Layout
//!
//! Tables and indexes are key prefixes in one flat keyspace. Numeric key
//! parts are big-endian so prefix scans return rows in id order.
//!
//! | Prefix | Key | Value |
//! |--------|-----|-------|
//! | `p:` | product id | `ProductDefinition` |
//! | `b:` | batch id | `ProductionBatch` |
//! | `u:` | item id | `ProductUnit` |
//! | `l:` | item id, sequence | `LedgerEntry` |
//! | `s:` | scan id | `ScanRecord` |
//! | `a:` | alert id | `RiskAlert` |
//! | `h:` | shipment id | `Shipment` |
//! | `xs:` | serial code | item id |
//! | `xb:` | batch number | batch id |
//! | `xu:` | batch id, item id | (empty) |
//! | `xm:` | manufacturer id, batch id | (empty) |
//! | `xc:` | item id, scan id | (empty) |
//! | `c:` | `YYYYMMDD` | daily batch counter |
//! | `n:` | table name | next id high-water mark |

use chrono::NaiveDate;
use std::fmt;

/// Tables with allocated surrogate ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Product,
    Batch,
    Unit,
    LedgerEntry,
    Scan,
    Alert,
    Shipment,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Product,
        Table::Batch,
        Table::Unit,
        Table::LedgerEntry,
        Table::Scan,
        Table::Alert,
        Table::Shipment,
    ];

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Table::Product => "product",
            Table::Batch => "batch",
            Table::Unit => "unit",
            Table::LedgerEntry => "ledger",
            Table::Scan => "scan",
            Table::Alert => "alert",
            Table::Shipment => "shipment",
        }
    }
}

/// Key prefix of each table and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    Product,
    Batch,
    Unit,
    Ledger,
    Scan,
    Alert,
    Shipment,
    SerialIndex,
    BatchNumberIndex,
    BatchUnitIndex,
    ManufacturerBatchIndex,
    UnitScanIndex,
    DailyCounter,
    NextId,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Product => b"p:",
            KeyPrefix::Batch => b"b:",
            KeyPrefix::Unit => b"u:",
            KeyPrefix::Ledger => b"l:",
            KeyPrefix::Scan => b"s:",
            KeyPrefix::Alert => b"a:",
            KeyPrefix::Shipment => b"h:",
            KeyPrefix::SerialIndex => b"xs:",
            KeyPrefix::BatchNumberIndex => b"xb:",
            KeyPrefix::BatchUnitIndex => b"xu:",
            KeyPrefix::ManufacturerBatchIndex => b"xm:",
            KeyPrefix::UnitScanIndex => b"xc:",
            KeyPrefix::DailyCounter => b"c:",
            KeyPrefix::NextId => b"n:",
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    fn id_key(&self, id: u64) -> Vec<u8> {
        self.key(&id.to_be_bytes())
    }

    fn pair_key(&self, a: u64, b: u64) -> Vec<u8> {
        let mut key = self.id_key(a);
        key.extend_from_slice(&b.to_be_bytes());
        key
    }

    pub fn product_key(id: u64) -> Vec<u8> {
        KeyPrefix::Product.id_key(id)
    }

    pub fn batch_key(id: u64) -> Vec<u8> {
        KeyPrefix::Batch.id_key(id)
    }

    pub fn unit_key(id: u64) -> Vec<u8> {
        KeyPrefix::Unit.id_key(id)
    }

    pub fn ledger_key(item_id: u64, sequence: u64) -> Vec<u8> {
        KeyPrefix::Ledger.pair_key(item_id, sequence)
    }

    /// Prefix of every ledger entry of one unit.
    pub fn ledger_prefix(item_id: u64) -> Vec<u8> {
        KeyPrefix::Ledger.id_key(item_id)
    }

    pub fn scan_key(id: u64) -> Vec<u8> {
        KeyPrefix::Scan.id_key(id)
    }

    pub fn alert_key(id: u64) -> Vec<u8> {
        KeyPrefix::Alert.id_key(id)
    }

    pub fn shipment_key(id: u64) -> Vec<u8> {
        KeyPrefix::Shipment.id_key(id)
    }

    pub fn serial_index_key(serial_code: &str) -> Vec<u8> {
        KeyPrefix::SerialIndex.key(serial_code.as_bytes())
    }

    pub fn batch_number_index_key(batch_number: &str) -> Vec<u8> {
        KeyPrefix::BatchNumberIndex.key(batch_number.as_bytes())
    }

    pub fn batch_unit_key(batch_id: u64, item_id: u64) -> Vec<u8> {
        KeyPrefix::BatchUnitIndex.pair_key(batch_id, item_id)
    }

    pub fn batch_unit_prefix(batch_id: u64) -> Vec<u8> {
        KeyPrefix::BatchUnitIndex.id_key(batch_id)
    }

    pub fn manufacturer_batch_key(manufacturer_id: u64, batch_id: u64) -> Vec<u8> {
        KeyPrefix::ManufacturerBatchIndex.pair_key(manufacturer_id, batch_id)
    }

    pub fn manufacturer_batch_prefix(manufacturer_id: u64) -> Vec<u8> {
        KeyPrefix::ManufacturerBatchIndex.id_key(manufacturer_id)
    }

    pub fn unit_scan_key(item_id: u64, scan_id: u64) -> Vec<u8> {
        KeyPrefix::UnitScanIndex.pair_key(item_id, scan_id)
    }

    pub fn unit_scan_prefix(item_id: u64) -> Vec<u8> {
        KeyPrefix::UnitScanIndex.id_key(item_id)
    }

    pub fn daily_counter_key(date: NaiveDate) -> Vec<u8> {
        KeyPrefix::DailyCounter.key(date.format("%Y%m%d").to_string().as_bytes())
    }

    pub fn next_id_key(table: Table) -> Vec<u8> {
        KeyPrefix::NextId.key(table.name().as_bytes())
    }
}

/// A lockable row. Ordering is by kind, then id, which is the order
/// multi-row operations acquire locks in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowLock {
    DailyCounter(NaiveDate),
    Shipment(u64),
    Batch(u64),
    Unit(u64),
    Alert(u64),
}

impl fmt::Display for RowLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLock::DailyCounter(date) => write!(f, "counter:{}", date.format("%Y%m%d")),
            RowLock::Shipment(id) => write!(f, "shipment:{}", id),
            RowLock::Batch(id) => write!(f, "batch:{}", id),
            RowLock::Unit(id) => write!(f, "unit:{}", id),
            RowLock::Alert(id) => write!(f, "alert:{}", id),
        }
    }
}

/// Trailing big-endian `u64` of a key (the last id of a pair key).
pub fn trailing_id(key: &[u8]) -> Option<u64> {
    let start = key.len().checked_sub(8)?;
    let bytes: [u8; 8] = key[start..].try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
