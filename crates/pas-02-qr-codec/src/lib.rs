//! # QR Codec (PAS-02)
//!
//! Pure encode/decode of unit QR payloads plus rendering for labels.
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `domain::payload` | `serial#hash` payload format |
//! | `render` | SVG, PNG and data-URL output (error correction level H) |
//! | `archive` | ZIP of per-unit PNG labels |
//!
//! No function here touches storage or the clock.

pub mod archive;
pub mod domain;
pub mod render;

pub use archive::batch_archive;
pub use domain::errors::QrError;
pub use domain::payload::{decode_payload, encode_payload, QrPayload, PAYLOAD_SEPARATOR};
pub use render::{png_data_url, render_png, render_svg, RenderOptions};
