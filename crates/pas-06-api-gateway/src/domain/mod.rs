//! Gateway domain: configuration and the HTTP error model.

pub mod config;
pub mod error;

pub use config::{ConfigError, CorsConfig, GatewayConfig, HttpConfig, LimitsConfig, TimeoutConfig};
pub use error::{codes, ApiError, GatewayError};
