//! # Service Container
//!
//! Central container holding the shared database and every service, wired
//! by constructor injection.

pub mod config;
pub mod services;

pub use config::{ConfigError, NodeConfig, StorageBackend, StorageConfig};
pub use services::ServiceContainer;
