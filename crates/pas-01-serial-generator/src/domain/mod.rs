//! # Domain Layer
//!
//! Code formats and classification. Pure functions, no I/O.

pub mod codes;
pub mod entities;
pub mod errors;
