//! Ports (hexagonal architecture).

pub mod outbound;
