//! # Domain Layer
//!
//! Entry hashing and chain verification. Pure functions over records.

pub mod entities;
pub mod errors;
pub mod hashing;
pub mod verification;
