//! # Adapters
//!
//! Storage backends and the data directory lock.

pub mod storage;
