//! # QR Errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QrError {
    /// The scanned text is not a `serial#hash` payload.
    #[error("Malformed QR payload: {0}")]
    MalformedPayload(&'static str),

    /// The payload does not fit a QR symbol at the requested level.
    #[error("QR encoding failed: {0}")]
    Encode(String),

    /// PNG encoding failed.
    #[error("Image encoding failed: {0}")]
    Image(String),

    /// Writing the label archive failed.
    #[error("Archive write failed: {0}")]
    Archive(String),
}
