//! # Status Enums
//!
//! Lifecycle states of batches and units, ledger actions, scan outcomes and
//! alert classifications.

use crate::actor::{Capability, Role};
use crate::errors::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a single serialized unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitStatus {
    Manufactured,
    #[serde(rename = "In_Transit")]
    InTransit,
    #[serde(rename = "In_Inventory")]
    InInventory,
    Sold,
    Recalled,
}

impl UnitStatus {
    pub const ALL: [UnitStatus; 5] = [
        UnitStatus::Manufactured,
        UnitStatus::InTransit,
        UnitStatus::InInventory,
        UnitStatus::Sold,
        UnitStatus::Recalled,
    ];

    /// Sold and Recalled units accept no further actions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitStatus::Sold | UnitStatus::Recalled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Manufactured => "Manufactured",
            UnitStatus::InTransit => "In_Transit",
            UnitStatus::InInventory => "In_Inventory",
            UnitStatus::Sold => "Sold",
            UnitStatus::Recalled => "Recalled",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a production batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchStatus {
    Active,
    Completed,
    Recalled,
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatchStatus::Active => "Active",
            BatchStatus::Completed => "Completed",
            BatchStatus::Recalled => "Recalled",
        };
        f.write_str(s)
    }
}

/// A lifecycle event recorded on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerAction {
    Manufactured,
    Shipped,
    Received,
    Stored,
    Sold,
    Recalled,
}

impl LedgerAction {
    /// Unit status after this action has been applied.
    pub fn resulting_status(&self) -> UnitStatus {
        match self {
            LedgerAction::Manufactured => UnitStatus::Manufactured,
            LedgerAction::Shipped => UnitStatus::InTransit,
            LedgerAction::Received | LedgerAction::Stored => UnitStatus::InInventory,
            LedgerAction::Sold => UnitStatus::Sold,
            LedgerAction::Recalled => UnitStatus::Recalled,
        }
    }

    /// Capability an actor needs to record this action.
    pub fn required_capability(&self) -> Capability {
        match self {
            LedgerAction::Manufactured => Capability::CreateBatch,
            LedgerAction::Shipped => Capability::ShipUnits,
            LedgerAction::Received => Capability::ReceiveShipment,
            LedgerAction::Stored => Capability::StockUnits,
            LedgerAction::Sold => Capability::SellUnits,
            LedgerAction::Recalled => Capability::RecallBatch,
        }
    }

    /// Whether the actor performing this action takes custody of the unit.
    pub fn transfers_custody(&self) -> bool {
        matches!(
            self,
            LedgerAction::Manufactured | LedgerAction::Received | LedgerAction::Sold
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerAction::Manufactured => "Manufactured",
            LedgerAction::Shipped => "Shipped",
            LedgerAction::Received => "Received",
            LedgerAction::Stored => "Stored",
            LedgerAction::Sold => "Sold",
            LedgerAction::Recalled => "Recalled",
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manufactured" => Ok(LedgerAction::Manufactured),
            "shipped" => Ok(LedgerAction::Shipped),
            "received" => Ok(LedgerAction::Received),
            "stored" => Ok(LedgerAction::Stored),
            "sold" => Ok(LedgerAction::Sold),
            "recalled" => Ok(LedgerAction::Recalled),
            _ => Err(ParseEnumError::new("ledger action", s)),
        }
    }
}

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanResult {
    Valid,
    Fake,
    Duplicate,
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanResult::Valid => "Valid",
            ScanResult::Fake => "Fake",
            ScanResult::Duplicate => "Duplicate",
        };
        f.write_str(s)
    }
}

/// Entry point through which a code was scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanChannel {
    Public,
    Customer,
    Retailer,
    Manufacturer,
    Admin,
}

impl From<Role> for ScanChannel {
    fn from(role: Role) -> Self {
        match role {
            Role::Manufacturer => ScanChannel::Manufacturer,
            Role::Retailer => ScanChannel::Retailer,
            Role::Customer => ScanChannel::Customer,
            Role::Admin => ScanChannel::Admin,
        }
    }
}

/// Classification of a raised risk alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    ProductRecall,
    CounterfeitSuspected,
    DuplicateScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShipmentStatus {
    Pending,
    Delivered,
}
