//! # Verification Resolver (PAS-05)
//!
//! Answers "is this code genuine?" for batch numbers, serial codes and full
//! QR payloads, and leaves an audit trail of every attempt.
//!
//! ## Guarantees
//!
//! - Every call records exactly one `ScanRecord`, whatever the outcome.
//! - Callers never see an error: infrastructure failures become a
//!   `verified = false` report.
//! - Forged hashes and post-sale duplicates raise risk alerts in the same
//!   transaction as their scan record.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::duplicate::find_duplicate_origin;
pub use domain::entities::{
    BatchInfo, ParticipantInfo, ProductInfo, ScanContext, ScanInfo, TimelineEntry, UnitInfo,
    VerificationReport,
};
pub use domain::errors::VerificationError;
pub use ports::inbound::VerificationApi;
pub use service::{VerificationConfig, VerificationResolver};
