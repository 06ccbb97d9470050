//! # Inbound Ports

use crate::domain::entities::{ScanContext, VerificationReport};

/// Resolves a scanned code.
///
/// Implementations must be thread-safe (`Send + Sync`) and infallible from
/// the caller's point of view: every call returns a report and records
/// exactly one scan.
pub trait VerificationApi: Send + Sync {
    /// `code` is a batch number, a serial code or a full `serial#hash` QR
    /// payload. `presented_hash` is used when `code` carries no hash.
    fn verify(
        &self,
        code: &str,
        presented_hash: Option<&str>,
        context: &ScanContext,
    ) -> VerificationReport;
}
