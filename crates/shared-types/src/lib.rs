//! # Shared Types Crate
//!
//! This crate contains the persisted records, status enums and actor
//! capabilities shared by every traceability subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every record that crosses a crate boundary
//!   (batches, units, ledger entries, scans, alerts) is defined here.
//! - **Typed Roles**: The caller's role is resolved once per request into an
//!   [`Actor`] and checked through [`Capability`], never re-derived ad hoc.
//! - **Injectable Time**: All timestamps come from a [`Clock`] so tests can
//!   drive grace windows and expiry deterministically.

pub mod actor;
pub mod clock;
pub mod entities;
pub mod errors;
pub mod status;

pub use actor::{Actor, Capability, Role};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::*;
pub use errors::*;
pub use status::*;

/// Previous-hash value of the first ledger entry of every unit.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";
