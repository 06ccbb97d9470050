//! # Label Archive
//!
//! ZIP of one PNG label per unit, named `{serial_code}.png`, for bulk
//! printing of a batch.

use crate::domain::errors::QrError;
use crate::domain::payload::QrPayload;
use crate::render::{render_png, RenderOptions};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build the label archive for `payloads`, in the given order.
pub fn batch_archive(payloads: &[QrPayload], options: RenderOptions) -> Result<Vec<u8>, QrError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for payload in payloads {
        let png = render_png(&payload.encode(), options)?;
        zip.start_file(format!("{}.png", payload.serial_code), file_options)
            .map_err(|e| QrError::Archive(e.to_string()))?;
        zip.write_all(&png)
            .map_err(|e| QrError::Archive(e.to_string()))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| QrError::Archive(e.to_string()))?;
    let bytes = cursor.into_inner();
    debug!(labels = payloads.len(), bytes = bytes.len(), "Built label archive");
    Ok(bytes)
}
