//! # BESS-PAS Node Runtime
//!
//! Wires the traceability services into one process and serves them over
//! HTTP.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and the service container
//! - `adapters/` - Storage backends and the data directory lock
//! - `logging` - `tracing-subscriber` setup
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (TOML file, then environment)
//! 2. Validate the auth secret is not the zero default (warn in dev mode)
//! 3. Open storage and build the services
//! 4. Serve the gateway until Ctrl+C, letting in-flight requests finish

pub mod adapters;
pub mod container;
pub mod logging;

use std::future::Future;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use pas_06_api_gateway::ApiGatewayService;

pub use crate::container::{ConfigError, NodeConfig, ServiceContainer, StorageBackend};

/// The running node: services plus the HTTP gateway.
pub struct NodeRuntime {
    container: ServiceContainer,
}

impl NodeRuntime {
    /// Validate `config` and build every service.
    pub fn new(config: NodeConfig) -> Result<Self> {
        match config.validate_for_production() {
            Ok(()) => {}
            Err(ConfigError::InsecureAuthSecret) if config.security.dev_mode => {
                warn!("Running with the zero auth secret (dev_mode). QR codes are forgeable.");
            }
            Err(e) => return Err(e).context("Configuration rejected"),
        }

        let container = ServiceContainer::new(config)?;
        Ok(Self { container })
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    fn gateway(&self) -> Result<ApiGatewayService> {
        ApiGatewayService::new(
            self.container.config.gateway.clone(),
            self.container.app_state(),
        )
        .context("Failed to configure HTTP gateway")
    }

    /// Serve on the configured address until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.log_banner();
        self.gateway()?.serve(shutdown).await?;
        info!("Node stopped");
        Ok(())
    }

    /// Serve on an already bound listener.
    pub async fn run_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.log_banner();
        self.gateway()?.serve_on(listener, shutdown).await?;
        info!("Node stopped");
        Ok(())
    }

    fn log_banner(&self) {
        let config = &self.container.config;
        info!(
            version = env!("CARGO_PKG_VERSION"),
            backend = %config.storage.backend,
            data_dir = %config.storage.data_dir.display(),
            addr = %config.gateway.http_addr(),
            "BESS-PAS node starting"
        );
    }
}
