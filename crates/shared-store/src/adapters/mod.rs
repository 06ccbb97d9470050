//! Adapters (hexagonal architecture).

pub mod storage;
