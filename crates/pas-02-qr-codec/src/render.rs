//! # QR Rendering
//!
//! Error-correction level High (~30% recoverable) so printed labels survive
//! scuffs and partial occlusion.

use crate::domain::errors::QrError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Minimum width and height of the rendered symbol in pixels.
    pub min_dimension: u32,
    pub quiet_zone: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            min_dimension: 256,
            quiet_zone: true,
        }
    }
}

fn symbol(data: &str) -> Result<QrCode, QrError> {
    QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)
        .map_err(|e| QrError::Encode(e.to_string()))
}

/// Render `data` as a standalone SVG document.
pub fn render_svg(data: &str, options: RenderOptions) -> Result<String, QrError> {
    let code = symbol(data)?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(options.min_dimension, options.min_dimension)
        .quiet_zone(options.quiet_zone)
        .build())
}

/// Render `data` as PNG bytes.
pub fn render_png(data: &str, options: RenderOptions) -> Result<Vec<u8>, QrError> {
    let code = symbol(data)?;
    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(options.min_dimension, options.min_dimension)
        .quiet_zone(options.quiet_zone)
        .build();

    let mut encoded = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .map_err(|e| QrError::Image(e.to_string()))?;
    Ok(encoded)
}

/// Render `data` as a `data:image/png;base64,...` URL for inline display.
pub fn png_data_url(data: &str, options: RenderOptions) -> Result<String, QrError> {
    let png = render_png(data, options)?;
    Ok(format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png)))
}
