//! # Actor Capabilities
//!
//! The authenticated caller, resolved once per request by the gateway and
//! passed as a typed value into the lifecycle manager and verification
//! resolver.
//!
//! | Capability | Manufacturer | Retailer | Customer | Admin |
//! |------------|:---:|:---:|:---:|:---:|
//! | RegisterProduct | x | | | |
//! | CreateBatch | x | | | |
//! | ViewBatches | x | | | x |
//! | RecallBatch | x | | | x |
//! | AuditLedger | x | | | x |
//! | ShipUnits | x | x | | |
//! | ReceiveShipment | | x | | |
//! | StockUnits | | x | | |
//! | SellUnits | | x | | |
//! | VerifyCodes | x | x | x | x |
//! | ManageAlerts | | | | x |

use crate::errors::{ActorError, ParseEnumError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Participant role in the supply chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Manufacturer,
    Retailer,
    Customer,
    Admin,
}

impl Role {
    /// Capabilities granted to this role.
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Manufacturer => &[
                RegisterProduct,
                CreateBatch,
                ViewBatches,
                RecallBatch,
                AuditLedger,
                ShipUnits,
                VerifyCodes,
            ],
            Role::Retailer => &[
                ShipUnits,
                ReceiveShipment,
                StockUnits,
                SellUnits,
                VerifyCodes,
            ],
            Role::Customer => &[VerifyCodes],
            Role::Admin => &[
                ViewBatches,
                RecallBatch,
                AuditLedger,
                VerifyCodes,
                ManageAlerts,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manufacturer => "manufacturer",
            Role::Retailer => "retailer",
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manufacturer" => Ok(Role::Manufacturer),
            "retailer" => Ok(Role::Retailer),
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

/// An operation class gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    RegisterProduct,
    CreateBatch,
    ViewBatches,
    RecallBatch,
    AuditLedger,
    ShipUnits,
    ReceiveShipment,
    StockUnits,
    SellUnits,
    VerifyCodes,
    ManageAlerts,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::RegisterProduct => "register products",
            Capability::CreateBatch => "create production batches",
            Capability::ViewBatches => "view batches",
            Capability::RecallBatch => "recall batches",
            Capability::AuditLedger => "audit the ledger",
            Capability::ShipUnits => "ship units",
            Capability::ReceiveShipment => "receive shipments",
            Capability::StockUnits => "stock units",
            Capability::SellUnits => "sell units",
            Capability::VerifyCodes => "verify codes",
            Capability::ManageAlerts => "manage risk alerts",
        };
        f.write_str(s)
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Participant id issued by the auth service.
    pub id: u64,
    /// Display name recorded on ledger entries.
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: u64, name: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }

    /// Whether the actor's role grants `capability`.
    pub fn can(&self, capability: Capability) -> bool {
        self.role.capabilities().contains(&capability)
    }

    /// Fail with [`ActorError::Forbidden`] unless the role grants `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), ActorError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ActorError::Forbidden {
                role: self.role,
                capability,
            })
        }
    }

    /// Admins may act on any record; everyone else only on their own.
    pub fn require_owner(
        &self,
        owner_id: u64,
        resource: impl Into<String>,
    ) -> Result<(), ActorError> {
        if self.role == Role::Admin || self.id == owner_id {
            Ok(())
        } else {
            Err(ActorError::NotOwner {
                actor_id: self.id,
                resource: resource.into(),
            })
        }
    }
}
