//! # Domain Layer

pub mod duplicate;
pub mod entities;
pub mod errors;
