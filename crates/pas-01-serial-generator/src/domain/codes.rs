//! # Code Formats
//!
//! - Batch number: `BATCH-YYYYMMDD-NNNN` (counter zero-padded to at least 4 digits)
//! - Serial code: `{batch_number}-{sequence:04}` with sequence in `1..=9999`

use super::entities::CodeKind;
use super::errors::SerialError;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

/// Largest unit sequence a four-digit serial suffix can carry.
pub const MAX_UNIT_SEQUENCE: u32 = 9999;

pub const BATCH_PREFIX: &str = "BATCH";

lazy_static! {
    static ref BATCH_PATTERN: Regex =
        Regex::new(r"^BATCH-(\d{8})-(\d{4,})$").expect("batch number pattern is valid");
    static ref UNIT_PATTERN: Regex = Regex::new(r"^(BATCH-\d{8}-\d{4,})-(\d{4})$")
        .expect("serial code pattern is valid");
}

/// Format the batch number for the `counter`-th batch created on `date`.
pub fn batch_number(date: NaiveDate, counter: u32) -> Result<String, SerialError> {
    if counter == 0 {
        return Err(SerialError::ZeroBatchCounter);
    }
    Ok(format!(
        "{}-{}-{:04}",
        BATCH_PREFIX,
        date.format("%Y%m%d"),
        counter
    ))
}

/// Format the serial code of unit `sequence` within `batch_number`.
pub fn serial_code(batch_number: &str, sequence: u32) -> Result<String, SerialError> {
    if !is_batch_number(batch_number) {
        return Err(SerialError::InvalidBatchNumber(batch_number.to_string()));
    }
    if sequence == 0 || sequence > MAX_UNIT_SEQUENCE {
        return Err(SerialError::SequenceOutOfRange {
            sequence,
            max: MAX_UNIT_SEQUENCE,
        });
    }
    Ok(format!("{}-{:04}", batch_number, sequence))
}

pub fn is_batch_number(code: &str) -> bool {
    BATCH_PATTERN.is_match(code)
}

/// Decide whether `code` names a batch, a unit, or nothing we issue.
///
/// A batch number always ends in a counter of at least four digits, so a
/// unit serial is recognised by a second four-digit suffix after it.
pub fn classify(code: &str) -> CodeKind {
    let code = code.trim();

    if let Some(caps) = UNIT_PATTERN.captures(code) {
        let sequence = caps[2].parse::<u32>().unwrap_or(0);
        if sequence >= 1 {
            return CodeKind::Unit {
                serial_code: code.to_string(),
                batch_number: caps[1].to_string(),
                sequence,
            };
        }
        return CodeKind::Unknown;
    }

    if BATCH_PATTERN.is_match(code) {
        return CodeKind::Batch {
            batch_number: code.to_string(),
        };
    }

    CodeKind::Unknown
}
