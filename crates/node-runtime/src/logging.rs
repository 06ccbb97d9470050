//! Global `tracing` subscriber.
//!
//! `RUST_LOG` wins over `logging.filter`. JSON output carries the gateway's
//! per-request span fields on every line.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::container::config::LoggingConfig;

/// `RUST_LOG` if set and valid, else the configured directive.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| anyhow!("Invalid log filter {:?}: {}", config.filter, e)),
    }
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = if config.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
