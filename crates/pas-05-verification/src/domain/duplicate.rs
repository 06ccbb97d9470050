//! # Duplicate Detection
//!
//! A sold unit's QR code is expected to be scanned by its buyer. If a
//! different context scans it again, and the earlier valid post-sale scan is
//! older than the grace window, the code has most likely been copied onto
//! another package.
//!
//! Only buyer-side scans (public or signed-in customer) can be the origin of
//! a duplicate. A retailer checking the label at the till is not a buyer.
//!
//! Contexts are told apart by user id. Anonymous scans fall back to their
//! reported location; two anonymous scans without distinct locations count as
//! the same context.

use crate::domain::entities::ScanContext;
use chrono::{DateTime, Duration, Utc};
use shared_types::{ScanChannel, ScanRecord, ScanResult};

fn is_buyer_channel(channel: ScanChannel) -> bool {
    matches!(channel, ScanChannel::Public | ScanChannel::Customer)
}

fn same_context(scan: &ScanRecord, context: &ScanContext) -> bool {
    match (scan.scanning_user_id, context.user_id) {
        (Some(a), Some(b)) => a == b,
        (None, None) => match (scan.location.as_deref(), context.location.as_deref()) {
            (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            _ => true,
        },
        _ => false,
    }
}

/// The earlier scan that makes the current one a duplicate, if any.
pub fn find_duplicate_origin<'a>(
    history: &'a [ScanRecord],
    sold_at: DateTime<Utc>,
    context: &ScanContext,
    now: DateTime<Utc>,
    grace_window: Duration,
) -> Option<&'a ScanRecord> {
    history.iter().find(|scan| {
        scan.scan_result == ScanResult::Valid
            && scan.scan_time >= sold_at
            && is_buyer_channel(scan.channel)
            && !same_context(scan, context)
            && now - scan.scan_time >= grace_window
    })
}
