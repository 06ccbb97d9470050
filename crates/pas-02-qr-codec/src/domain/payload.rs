//! # Payload Format
//!
//! A unit QR code carries `"{serial_code}#{auth_hash}"`. The serial is the
//! public identity of the unit; the hash proves the label was issued by us.

use super::errors::QrError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const PAYLOAD_SEPARATOR: char = '#';

lazy_static! {
    static ref SERIAL_CHARSET: Regex =
        Regex::new(r"^[A-Z0-9-]+$").expect("serial charset is valid");
}

/// Decoded QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub serial_code: String,
    pub auth_hash: String,
}

impl QrPayload {
    pub fn new(serial_code: impl Into<String>, auth_hash: impl Into<String>) -> Self {
        Self {
            serial_code: serial_code.into(),
            auth_hash: auth_hash.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode_payload(&self.serial_code, &self.auth_hash)
    }
}

pub fn encode_payload(serial_code: &str, auth_hash: &str) -> String {
    format!("{}{}{}", serial_code, PAYLOAD_SEPARATOR, auth_hash)
}

/// Parse scanned text. Surrounding whitespace is ignored.
pub fn decode_payload(text: &str) -> Result<QrPayload, QrError> {
    let (serial, hash) = text
        .trim()
        .split_once(PAYLOAD_SEPARATOR)
        .ok_or(QrError::MalformedPayload("missing '#' separator"))?;

    if serial.is_empty() {
        return Err(QrError::MalformedPayload("empty serial"));
    }
    if hash.is_empty() {
        return Err(QrError::MalformedPayload("empty hash"));
    }
    if !SERIAL_CHARSET.is_match(serial) {
        return Err(QrError::MalformedPayload("serial has invalid characters"));
    }
    if !is_lower_hex(hash) {
        return Err(QrError::MalformedPayload("hash is not lowercase hex"));
    }

    Ok(QrPayload::new(serial, hash))
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn test_encode_payload() {
        assert_eq!(
            encode_payload("BATCH-20260112-0001-0002", "ab12"),
            "BATCH-20260112-0001-0002#ab12"
        );
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let payload = decode_payload(&format!("  BATCH-20260112-0001-0002#{}\n", HASH)).unwrap();
        assert_eq!(payload.serial_code, "BATCH-20260112-0001-0002");
        assert_eq!(payload.auth_hash, HASH);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let cases = [
            "BATCH-20260112-0001-0002",
            "#abcd",
            "BATCH-20260112-0001-0002#",
            "batch-20260112-0001-0002#abcd",
            "BATCH 20260112#abcd",
            "BATCH-20260112-0001-0002#ABCD",
            "BATCH-20260112-0001-0002#ab#cd",
        ];
        for text in cases {
            assert!(
                matches!(decode_payload(text), Err(QrError::MalformedPayload(_))),
                "{text}"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(serial in "[A-Z0-9-]{1,40}", hash in "[0-9a-f]{1,64}") {
            let decoded = decode_payload(&encode_payload(&serial, &hash)).unwrap();
            prop_assert_eq!(decoded, QrPayload::new(serial, hash));
        }
    }
}
