//! Ports (hexagonal architecture).

pub mod inbound;
