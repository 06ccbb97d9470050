//! # Domain Layer
//!
//! The QR payload format. Pure functions, no I/O.

pub mod errors;
pub mod payload;
